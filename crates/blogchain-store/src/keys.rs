//! Key layout.
//!
//! Every collection owns one namespace prefix. Integer components are
//! fixed-width big-endian so byte order matches numeric order; a trailing
//! string is appended raw; a leading string in a pair key carries a u16
//! big-endian length so a scan over `prefix ++ first` cannot bleed into a
//! longer string sharing the same bytes.

use crate::error::{Result, StoreError};

pub const POSTS: &[u8] = b"posts/";
pub const ACTIVE_POSTS: &[u8] = b"active_posts/";
pub const DELETED_POSTS: &[u8] = b"deleted_posts/";
pub const POST_LIKES: &[u8] = b"liked_by/";
pub const COMMENTS: &[u8] = b"comments/";
pub const ACTIVE_COMMENTS: &[u8] = b"active_comments/";
pub const POST_COMMENTS: &[u8] = b"post_comments/";
pub const CHILD_COMMENTS: &[u8] = b"child_comments/";
pub const COMMENT_LIKES: &[u8] = b"liked_comments/";
pub const PROFILES: &[u8] = b"profiles/";
pub const USERNAMES: &[u8] = b"usernames/";
pub const FOLLOWS: &[u8] = b"follows/";
pub const FOLLOWERS: &[u8] = b"followers/";
pub const SEQUENCES: &[u8] = b"seq/";

/// `ns ++ id`
pub fn id_key(ns: &[u8], id: u64) -> Vec<u8> {
    let mut key = Vec::with_capacity(ns.len() + 8);
    key.extend_from_slice(ns);
    key.extend_from_slice(&id.to_be_bytes());
    key
}

/// `ns ++ a ++ b`, both integers.
pub fn id_pair_key(ns: &[u8], a: u64, b: u64) -> Vec<u8> {
    let mut key = id_key(ns, a);
    key.extend_from_slice(&b.to_be_bytes());
    key
}

/// `ns ++ id ++ s`, used for like records.
pub fn id_str_key(ns: &[u8], id: u64, s: &str) -> Vec<u8> {
    let mut key = id_key(ns, id);
    key.extend_from_slice(s.as_bytes());
    key
}

/// `ns ++ s`
pub fn str_key(ns: &[u8], s: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(ns.len() + s.len());
    key.extend_from_slice(ns);
    key.extend_from_slice(s.as_bytes());
    key
}

/// `ns ++ len(a) ++ a`: the scan prefix for every pair starting with `a`.
pub fn str_prefix(ns: &[u8], a: &str) -> Vec<u8> {
    // Identity strings are bounded well below u16::MAX by address validation.
    let len = u16::try_from(a.len()).unwrap_or(u16::MAX);
    let mut key = Vec::with_capacity(ns.len() + 2 + a.len());
    key.extend_from_slice(ns);
    key.extend_from_slice(&len.to_be_bytes());
    key.extend_from_slice(a.as_bytes());
    key
}

/// `ns ++ len(a) ++ a ++ b`
pub fn str_pair_key(ns: &[u8], a: &str, b: &str) -> Vec<u8> {
    let mut key = str_prefix(ns, a);
    key.extend_from_slice(b.as_bytes());
    key
}

/// Read the trailing big-endian u64 of an index key.
pub fn trailing_id(key: &[u8]) -> Result<u64> {
    key.len()
        .checked_sub(8)
        .and_then(|start| key[start..].try_into().ok())
        .map(u64::from_be_bytes)
        .ok_or_else(|| StoreError::Corrupt(format!("index key too short: {key:?}")))
}

/// The string that follows `prefix` in `key`.
pub fn trailing_str(key: &[u8], prefix: &[u8]) -> Result<String> {
    let rest = key
        .strip_prefix(prefix)
        .ok_or_else(|| StoreError::Corrupt("key outside expected namespace".into()))?;
    String::from_utf8(rest.to_vec())
        .map_err(|_| StoreError::Corrupt("key component is not UTF-8".into()))
}
