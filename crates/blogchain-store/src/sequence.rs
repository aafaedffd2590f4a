//! Monotonic per-entity ID sequences.
//!
//! Sequences live in the store like any other state, so an aborted
//! transaction also discards its sequence advance.

use blogchain_shared::constants::SEQUENCE_START;

use crate::error::Result;
use crate::keys;
use crate::kv::StoreTx;

impl StoreTx<'_> {
    /// Return the next value of `name` and advance it.
    pub fn next_sequence(&mut self, name: &str) -> Result<u64> {
        let key = keys::str_key(keys::SEQUENCES, name);
        let value = self.get_u64(&key)?.unwrap_or(SEQUENCE_START);
        self.set_u64(&key, value + 1)?;
        Ok(value)
    }

    /// The value the next call to [`StoreTx::next_sequence`] would return.
    pub fn peek_sequence(&self, name: &str) -> Result<u64> {
        let key = keys::str_key(keys::SEQUENCES, name);
        Ok(self.get_u64(&key)?.unwrap_or(SEQUENCE_START))
    }
}
