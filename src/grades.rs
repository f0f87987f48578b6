use thiserror::Error;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

/// Inclusive lower bound -> code, highest band first.
const BANDS: [(f64, &str); 5] = [
    (90.0, "6"),
    (80.0, "5"),
    (70.0, "4"),
    (60.0, "3"),
    (50.0, "2"),
];

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    #[error("Score must be a number")]
    NotNumeric,
    #[error("Score must be between 0 and 100")]
    OutOfRange(f64),
    #[error("no grade code is configured for scores below 50 (got {0})")]
    Ungraded(f64),
}

impl GradeError {
    pub fn code(&self) -> &'static str {
        match self {
            GradeError::NotNumeric => "type_error",
            GradeError::OutOfRange(_) => "domain_error",
            GradeError::Ungraded(_) => "ungraded",
        }
    }
}

/// A score that has passed the numeric and range checks.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Score(f64);

impl Score {
    pub fn new(value: f64) -> Result<Self, GradeError> {
        if !value.is_finite() {
            return Err(GradeError::NotNumeric);
        }
        if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
            return Err(GradeError::OutOfRange(value));
        }
        Ok(Score(value))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

/// What to do with in-range scores under the graded floor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GradePolicy {
    pub below_floor_code: Option<String>,
}

pub fn grade_code(score: Score, policy: &GradePolicy) -> Result<String, GradeError> {
    let v = score.value();
    for (lower, code) in BANDS {
        if v >= lower {
            return Ok(code.to_string());
        }
    }
    match policy.below_floor_code.as_deref() {
        Some(code) => Ok(code.to_string()),
        None => Err(GradeError::Ungraded(v)),
    }
}

/// Validate and grade in one step.
pub fn evaluate(value: f64, policy: &GradePolicy) -> Result<String, GradeError> {
    grade_code(Score::new(value)?, policy)
}

/// Only JSON numbers are scores. Numeric-looking strings and booleans are rejected.
pub fn evaluate_json(
    raw: &serde_json::Value,
    policy: &GradePolicy,
) -> Result<String, GradeError> {
    let value = raw.as_f64().ok_or(GradeError::NotNumeric)?;
    evaluate(value, policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn graded(value: f64) -> Result<String, GradeError> {
        evaluate(value, &GradePolicy::default())
    }

    #[test]
    fn band_midpoints() {
        assert_eq!(graded(95.0).unwrap(), "6");
        assert_eq!(graded(85.0).unwrap(), "5");
        assert_eq!(graded(75.0).unwrap(), "4");
        assert_eq!(graded(65.0).unwrap(), "3");
        assert_eq!(graded(55.0).unwrap(), "2");
    }

    #[test]
    fn band_lower_bounds_are_inclusive() {
        assert_eq!(graded(90.0).unwrap(), "6");
        assert_eq!(graded(80.0).unwrap(), "5");
        assert_eq!(graded(70.0).unwrap(), "4");
        assert_eq!(graded(60.0).unwrap(), "3");
        assert_eq!(graded(50.0).unwrap(), "2");
        assert_eq!(graded(100.0).unwrap(), "6");
        assert_eq!(graded(89.0).unwrap(), "5");
        assert_eq!(graded(89.5).unwrap(), "5");
    }

    #[test]
    fn every_integer_from_50_to_100_gets_a_code() {
        for s in 50..=100 {
            let code = graded(s as f64).expect("graded");
            let expected = match s {
                90..=100 => "6",
                80..=89 => "5",
                70..=79 => "4",
                60..=69 => "3",
                _ => "2",
            };
            assert_eq!(code, expected, "score {}", s);
        }
    }

    #[test]
    fn out_of_range_is_domain_error() {
        let e = graded(-1.0).unwrap_err();
        assert_eq!(e, GradeError::OutOfRange(-1.0));
        assert_eq!(e.to_string(), "Score must be between 0 and 100");
        assert_eq!(e.code(), "domain_error");
        assert!(matches!(graded(101.0), Err(GradeError::OutOfRange(_))));
        assert!(matches!(graded(100.01), Err(GradeError::OutOfRange(_))));
    }

    #[test]
    fn non_numeric_json_is_type_error() {
        let policy = GradePolicy::default();
        for raw in [json!("not a number"), json!("95"), json!(true), json!(null), json!([90])] {
            let e = evaluate_json(&raw, &policy).unwrap_err();
            assert_eq!(e, GradeError::NotNumeric, "input {}", raw);
            assert_eq!(e.to_string(), "Score must be a number");
        }
        assert!(matches!(graded(f64::NAN), Err(GradeError::NotNumeric)));
    }

    #[test]
    fn below_floor_follows_policy() {
        assert_eq!(graded(49.0), Err(GradeError::Ungraded(49.0)));
        assert_eq!(graded(0.0), Err(GradeError::Ungraded(0.0)));

        let policy = GradePolicy {
            below_floor_code: Some("1".into()),
        };
        assert_eq!(evaluate_json(&json!(12), &policy).unwrap(), "1");
        assert_eq!(evaluate_json(&json!(50), &policy).unwrap(), "2");
        // Range check still applies with a floor code configured.
        assert!(matches!(
            evaluate_json(&json!(-3), &policy),
            Err(GradeError::OutOfRange(_))
        ));
    }
}
