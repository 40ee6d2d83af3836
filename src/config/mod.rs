pub mod credential;
pub mod dashboard;

pub use credential::ServiceCredential;
pub use dashboard::{DashboardConfig, OperatorEntry};
