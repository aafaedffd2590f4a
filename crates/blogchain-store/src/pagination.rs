//! Cursor pagination over an index namespace.
//!
//! A cursor is the URL-safe base64 form of the next index key with the
//! namespace stripped. When a cursor is given the request offset is ignored.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use blogchain_shared::types::{PageRequest, PageResponse};
use blogchain_shared::{BlogError, Result};

use crate::kv::{Entry, StoreTx};

pub fn encode_cursor(suffix: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(suffix)
}

pub fn decode_cursor(cursor: &str) -> Result<Vec<u8>> {
    URL_SAFE_NO_PAD
        .decode(cursor)
        .map_err(|_| BlogError::InvalidArgument(format!("invalid pagination key: {cursor}")))
}

impl StoreTx<'_> {
    /// One page of raw entries under `prefix` plus the page metadata.
    pub fn page_prefix(
        &self,
        prefix: &[u8],
        request: &PageRequest,
    ) -> Result<(Vec<Entry>, PageResponse)> {
        let limit = request.effective_limit();

        let (from, offset) = match &request.key {
            Some(cursor) => {
                let mut start = prefix.to_vec();
                start.extend_from_slice(&decode_cursor(cursor)?);
                (Some(start), 0)
            }
            None => (None, request.offset),
        };

        let mut entries = self.scan_prefix(prefix, from.as_deref(), offset, Some(limit + 1))?;

        let next_key = if entries.len() as u64 > limit {
            entries
                .pop()
                .map(|(key, _)| encode_cursor(&key[prefix.len()..]))
        } else {
            None
        };

        let total = self.count_prefix(prefix)?;

        tracing::debug!(
            prefix = %String::from_utf8_lossy(prefix),
            returned = entries.len(),
            total,
            has_next = next_key.is_some(),
            "paged index"
        );

        Ok((entries, PageResponse { next_key, total }))
    }
}
