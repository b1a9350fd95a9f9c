//! # promptdesk-entity
//!
//! Domain entity models for PromptDesk. Row structs mirror the tables of
//! the shared store and derive `sqlx::FromRow`; snapshot structs mirror the
//! backup file format.

pub mod backup;
pub mod folder;
pub mod prompt;
