//! Entity records and the pagination contract.
//!
//! Records reference each other by ID only; related entities are looked up
//! on demand. Timestamps are unix seconds.

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT, ROOT_PARENT_ID};

pub type PostId = u64;
pub type CommentId = u64;

// ---------------------------------------------------------------------------
// Post
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: PostId,
    pub creator: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub created_at: i64,
    pub updated_at: i64,
    pub likes: u64,
    /// Number of live comments attached to this post.
    pub comment_count: u64,
    pub deleted: bool,
    /// Zero unless `deleted`.
    pub deleted_at: i64,
    /// Opaque reference into external blob storage.
    pub content_blob_id: Option<String>,
    pub media_blob_ids: Vec<String>,
}

/// Fields supplied when a post is created.
#[derive(Debug, Clone, Default)]
pub struct NewPost {
    pub creator: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub content_blob_id: Option<String>,
    pub media_blob_ids: Vec<String>,
}

/// Mutable post fields; an update overwrites all of them.
#[derive(Debug, Clone, Default)]
pub struct PostUpdate {
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub content_blob_id: Option<String>,
    pub media_blob_ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    /// [`ROOT_PARENT_ID`] for top-level comments.
    pub parent_id: CommentId,
    pub creator: String,
    pub content: String,
    /// 0 for root comments, parent depth + 1 for replies.
    pub depth: u32,
    pub created_at: i64,
    pub updated_at: i64,
    pub likes: u64,
    pub deleted: bool,
    pub deleted_at: i64,
}

impl Comment {
    pub fn is_root(&self) -> bool {
        self.parent_id == ROOT_PARENT_ID
    }
}

#[derive(Debug, Clone, Default)]
pub struct NewComment {
    pub post_id: PostId,
    pub parent_id: CommentId,
    pub creator: String,
    pub content: String,
}

/// A comment and its live replies, in index order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<CommentThread>,
}

impl CommentThread {
    /// Total number of comments in this subtree, root included.
    pub fn size(&self) -> usize {
        1 + self.replies.iter().map(CommentThread::size).sum::<usize>()
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub address: String,
    /// Stored lowercase; unique across profiles.
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub avatar_url: String,
    pub website: String,
    pub followers: u64,
    pub following: u64,
    pub post_count: u64,
    pub verified: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default)]
pub struct NewProfile {
    pub address: String,
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub avatar_url: String,
    pub website: String,
}

/// Mutable profile fields. The username cannot change after creation.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub display_name: String,
    pub bio: String,
    pub avatar_url: String,
    pub website: String,
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Page selector. `key` is an opaque cursor from a previous
/// [`PageResponse::next_key`]; when present `offset` is ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PageRequest {
    pub limit: Option<u64>,
    pub offset: u64,
    pub key: Option<String>,
}

impl PageRequest {
    pub fn with_limit(limit: u64) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Effective limit: absent or zero means the default, anything above the
    /// cap is clamped to it.
    pub fn effective_limit(&self) -> u64 {
        match self.limit {
            None | Some(0) => DEFAULT_PAGE_LIMIT,
            Some(n) => n.min(MAX_PAGE_LIMIT),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse {
    pub next_key: Option<String>,
    /// Cardinality of the index that was paged over.
    pub total: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub pagination: PageResponse,
}
