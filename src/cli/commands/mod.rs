//! CLI command implementations.

mod analyze;
mod config;
mod doctor;
mod serve;

pub use analyze::run_analyze;
pub use config::run_config;
pub use doctor::run_doctor;
pub use serve::{router, run_serve, AppState};
