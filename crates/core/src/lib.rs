//! Core business logic for classreg.

pub mod services;

pub use services::*;
