//! # promptdesk-core
//!
//! Core crate for PromptDesk. Contains configuration schemas, typed
//! identifiers, the operation outcome returned across the engine boundary,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other PromptDesk crates.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;
