pub mod comparison;
pub mod subject;
pub mod target;
