//! Code tables behind the department, year and course pickers.
//!
//! Stored codes are zero-based indices into these tables; labels are only
//! used when rendering rows.

pub const DEPARTMENTS: &[&str] = &[
    "Mechanical",
    "Civil",
    "Electrical",
    "Electronics and Communication",
    "Computer Science",
    "Information Technology",
];

pub const YEARS: &[&str] = &["1st", "2nd", "3rd", "4th"];

pub const COURSES: &[&str] = &[
    "DBMS",
    "OS",
    "CN",
    "C++",
    "JAVA",
    "PYTHON",
    "THEORY OF AUTOMATA",
    "MICROPROCESSORS",
    "ANALOG ELECTRONICS",
    "DIGITAL ELECTRONICS",
    "CIRCUIT THEORY",
    "MECHANICS",
    "FLUID DYNAMICS",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeTable {
    Department,
    Year,
    Course,
}

impl CodeTable {
    pub fn labels(self) -> &'static [&'static str] {
        match self {
            CodeTable::Department => DEPARTMENTS,
            CodeTable::Year => YEARS,
            CodeTable::Course => COURSES,
        }
    }

    pub fn label(self, code: i64) -> Option<&'static str> {
        usize::try_from(code)
            .ok()
            .and_then(|i| self.labels().get(i).copied())
    }

    pub fn contains(self, code: i64) -> bool {
        self.label(code).is_some()
    }
}
