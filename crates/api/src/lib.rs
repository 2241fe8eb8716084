//! HTTP API for classreg.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

pub use middleware::AppState;
