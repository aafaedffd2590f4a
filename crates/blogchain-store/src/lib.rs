//! # blogchain-store
//!
//! Transactional keyed storage for Blogchain, backed by SQLite.
//!
//! All state lives in one ordered key/value table split into disjoint key
//! namespaces (see [`keys`]). Every service operation runs inside
//! [`Database::transact`], so the primary records, secondary indexes,
//! counters and sequences it touches commit together or not at all.

pub mod comments;
pub mod database;
pub mod follows;
pub mod keys;
pub mod kv;
pub mod migrations;
pub mod pagination;
pub mod posts;
pub mod profiles;
pub mod sequence;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use kv::StoreTx;
