//! # promptdesk-database
//!
//! Access to the SQLite store shared with the host application: the
//! single writer handle, the schema compatibility guard, the lock-contention
//! retry policy, and the folder/prompt repositories.

pub mod connection;
pub mod error;
pub mod repositories;
pub mod retry;
pub mod schema;

pub use connection::StoreHandle;
pub use retry::RetryPolicy;
