//! # blogchain-shared
//!
//! Types and rules shared by the Blogchain store and server: entity records,
//! the error taxonomy, inbound actions with their shape validation, the
//! address-validation seam and the event-sink seam.

pub mod address;
pub mod constants;
pub mod error;
pub mod events;
pub mod protocol;
pub mod types;
pub mod validation;

pub use error::{BlogError, ErrorKind, Result};
