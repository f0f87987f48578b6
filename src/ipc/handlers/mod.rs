pub mod backup;
pub mod core;
pub mod grades;
pub mod settings;
pub mod students;
