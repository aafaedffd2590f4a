//! Fire-and-forget notifications for committed state transitions.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::types::{CommentId, PostId};

/// One committed state transition. Serialized with a snake_case `type` tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlogEvent {
    PostCreated {
        id: PostId,
        creator: String,
    },
    PostUpdated {
        id: PostId,
        creator: String,
        updated_at: i64,
    },
    PostDeleted {
        id: PostId,
        creator: String,
    },
    PostLiked {
        post_id: PostId,
        liker: String,
    },
    CommentCreated {
        id: CommentId,
        post_id: PostId,
        parent_id: CommentId,
        creator: String,
    },
    CommentUpdated {
        id: CommentId,
        creator: String,
        updated_at: i64,
    },
    CommentDeleted {
        id: CommentId,
        creator: String,
    },
    CommentLiked {
        comment_id: CommentId,
        liker: String,
    },
    ProfileCreated {
        address: String,
        username: String,
    },
    ProfileUpdated {
        address: String,
    },
    UserFollowed {
        follower: String,
        following: String,
    },
    UserUnfollowed {
        follower: String,
        following: String,
    },
}

impl BlogEvent {
    /// The snake_case event name, e.g. `comment_created`.
    pub fn name(&self) -> &'static str {
        match self {
            BlogEvent::PostCreated { .. } => "post_created",
            BlogEvent::PostUpdated { .. } => "post_updated",
            BlogEvent::PostDeleted { .. } => "post_deleted",
            BlogEvent::PostLiked { .. } => "post_liked",
            BlogEvent::CommentCreated { .. } => "comment_created",
            BlogEvent::CommentUpdated { .. } => "comment_updated",
            BlogEvent::CommentDeleted { .. } => "comment_deleted",
            BlogEvent::CommentLiked { .. } => "comment_liked",
            BlogEvent::ProfileCreated { .. } => "profile_created",
            BlogEvent::ProfileUpdated { .. } => "profile_updated",
            BlogEvent::UserFollowed { .. } => "user_followed",
            BlogEvent::UserUnfollowed { .. } => "user_unfollowed",
        }
    }
}

/// Consumer of committed events. No acknowledgment is expected.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BlogEvent);
}

/// Logs every event through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: BlogEvent) {
        let attributes = serde_json::to_string(&event).unwrap_or_default();
        tracing::info!(event = event.name(), %attributes, "event emitted");
    }
}

/// Keeps events in memory, in emission order.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<BlogEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<BlogEvent> {
        match self.events.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.events().iter().map(BlogEvent::name).collect()
    }
}

impl EventSink for MemorySink {
    fn emit(&self, event: BlogEvent) {
        match self.events.lock() {
            Ok(mut guard) => guard.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_tag_matches_name() {
        let event = BlogEvent::CommentCreated {
            id: 3,
            post_id: 1,
            parent_id: 0,
            creator: "blogchain1xyz".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], event.name());
        assert_eq!(json["post_id"], 1);
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemorySink::new();
        sink.emit(BlogEvent::ProfileUpdated {
            address: "a".into(),
        });
        sink.emit(BlogEvent::UserFollowed {
            follower: "a".into(),
            following: "b".into(),
        });
        assert_eq!(sink.names(), vec!["profile_updated", "user_followed"]);
    }
}
