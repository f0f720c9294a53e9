pub mod assessment;
pub mod dashboard;
