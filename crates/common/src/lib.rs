//! Common utilities and shared types for classreg.
//!
//! This crate provides foundational components used across all classreg crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Role cache**: Redis-backed permission-role reads via [`RoleCache`]
//!
//! # Example
//!
//! ```no_run
//! use classreg_common::{AppResult, Config, IdGenerator};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod role_cache;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
pub use role_cache::{MemoryRoleStore, RedisRoleStore, RoleCache, RoleStore};
