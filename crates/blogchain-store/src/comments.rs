//! Threaded comments.
//!
//! A comment is indexed three ways besides its primary record: the active
//! set, `(post_id, comment_id)` for per-post listing and, for replies,
//! `(parent_id, comment_id)` for thread traversal. Soft delete only removes
//! the active entry; listings filter on the record's own `deleted` flag.

use blogchain_shared::constants::{COMMENT_SEQUENCE, MAX_COMMENT_DEPTH, ROOT_PARENT_ID};
use blogchain_shared::types::{Comment, CommentId, CommentThread, NewComment, PostId};
use blogchain_shared::{BlogError, Result};

use crate::keys;
use crate::kv::StoreTx;

impl StoreTx<'_> {
    pub fn create_comment(&mut self, new: NewComment, now: i64) -> Result<CommentId> {
        let mut post = self.get_post(new.post_id)?;
        if post.deleted {
            return Err(BlogError::InvalidState("cannot comment on deleted post".into()));
        }

        let depth = if new.parent_id == ROOT_PARENT_ID {
            0
        } else {
            let parent = self
                .get_comment(new.parent_id)
                .map_err(|e| e.context("parent comment"))?;
            if parent.deleted {
                return Err(BlogError::InvalidState("cannot reply to deleted comment".into()));
            }
            if parent.depth >= MAX_COMMENT_DEPTH {
                return Err(BlogError::InvalidState(format!(
                    "maximum comment depth ({MAX_COMMENT_DEPTH}) reached"
                )));
            }
            if parent.post_id != new.post_id {
                return Err(BlogError::InvalidArgument(
                    "reply must be on the same post as parent".into(),
                ));
            }
            parent.depth + 1
        };

        let id = self.next_sequence(COMMENT_SEQUENCE)?;
        let comment = Comment {
            id,
            post_id: new.post_id,
            parent_id: new.parent_id,
            creator: new.creator,
            content: new.content,
            depth,
            created_at: now,
            updated_at: now,
            likes: 0,
            deleted: false,
            deleted_at: 0,
        };

        self.set_comment(&comment)?;
        self.set_marker(&keys::id_key(keys::ACTIVE_COMMENTS, id))?;
        self.set_marker(&keys::id_pair_key(keys::POST_COMMENTS, comment.post_id, id))?;
        if !comment.is_root() {
            self.set_marker(&keys::id_pair_key(keys::CHILD_COMMENTS, comment.parent_id, id))?;
        }

        post.comment_count += 1;
        self.set_post(&post)?;

        tracing::info!(
            comment_id = id,
            post_id = comment.post_id,
            parent_id = comment.parent_id,
            depth,
            "comment created"
        );
        Ok(id)
    }

    /// Fetch a comment by ID, deleted or not.
    pub fn get_comment(&self, id: CommentId) -> Result<Comment> {
        self.get_record(&keys::id_key(keys::COMMENTS, id))?
            .ok_or_else(|| BlogError::NotFound(format!("comment not found: {id}")))
    }

    fn set_comment(&mut self, comment: &Comment) -> Result<()> {
        self.set_record(&keys::id_key(keys::COMMENTS, comment.id), comment)?;
        Ok(())
    }

    /// Replace the content. Post, parent, depth, likes and creation time
    /// are carried over from the stored record.
    pub fn update_comment(
        &mut self,
        id: CommentId,
        actor: &str,
        content: String,
        now: i64,
    ) -> Result<Comment> {
        let mut comment = self.get_comment(id)?;
        if comment.creator != actor {
            return Err(BlogError::Unauthorized(
                "only comment creator can update".into(),
            ));
        }
        if comment.deleted {
            return Err(BlogError::InvalidState("cannot update deleted comment".into()));
        }

        comment.content = content;
        comment.updated_at = now;
        self.set_comment(&comment)?;

        tracing::info!(comment_id = id, "comment updated");
        Ok(comment)
    }

    pub fn delete_comment(
        &mut self,
        id: CommentId,
        actor: &str,
        deleted_at: i64,
    ) -> Result<Comment> {
        let mut comment = self.get_comment(id)?;
        if comment.creator != actor {
            return Err(BlogError::Unauthorized(
                "only comment creator can delete".into(),
            ));
        }
        if comment.deleted {
            return Err(BlogError::InvalidState("comment already deleted".into()));
        }

        comment.deleted = true;
        comment.deleted_at = deleted_at;
        self.set_comment(&comment)?;
        self.delete(&keys::id_key(keys::ACTIVE_COMMENTS, id))?;

        // A missing or deleted post keeps its count as is.
        match self.get_post(comment.post_id) {
            Ok(mut post) if !post.deleted && post.comment_count > 0 => {
                post.comment_count -= 1;
                self.set_post(&post)?;
            }
            Ok(_) | Err(BlogError::NotFound(_)) => {}
            Err(e) => return Err(e),
        }

        tracing::info!(comment_id = id, post_id = comment.post_id, "comment deleted");
        Ok(comment)
    }

    /// Record a like. Each identity may like a comment once.
    pub fn like_comment(&mut self, id: CommentId, liker: &str) -> Result<Comment> {
        let mut comment = self.get_comment(id)?;
        if comment.deleted {
            return Err(BlogError::InvalidState("cannot like deleted comment".into()));
        }

        let like_key = keys::id_str_key(keys::COMMENT_LIKES, id, liker);
        if self.has(&like_key)? {
            return Err(BlogError::AlreadyExists(
                "comment already liked by user".into(),
            ));
        }

        comment.likes += 1;
        self.set_comment(&comment)?;
        self.set_marker(&like_key)?;

        tracing::debug!(comment_id = id, liker, likes = comment.likes, "comment liked");
        Ok(comment)
    }

    pub fn has_liked_comment(&self, id: CommentId, address: &str) -> Result<bool> {
        Ok(self.has(&keys::id_str_key(keys::COMMENT_LIKES, id, address))?)
    }

    /// Live comments in index order.
    ///
    /// With `parent_id == 0` these are the top-level comments of `post_id`;
    /// otherwise the direct replies to `parent_id`.
    pub fn list_comments(&self, post_id: PostId, parent_id: CommentId) -> Result<Vec<Comment>> {
        let prefix = if parent_id == ROOT_PARENT_ID {
            keys::id_key(keys::POST_COMMENTS, post_id)
        } else {
            keys::id_key(keys::CHILD_COMMENTS, parent_id)
        };

        let mut comments = Vec::new();
        for id in self.index_ids(&prefix)? {
            match self.get_comment(id) {
                Ok(c) if !c.deleted && (parent_id != ROOT_PARENT_ID || c.is_root()) => {
                    comments.push(c)
                }
                Ok(_) => {}
                Err(BlogError::NotFound(_)) => {
                    tracing::warn!(comment_id = id, "comment index points at missing comment");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(comments)
    }

    /// Build the reply tree under `root_id`.
    ///
    /// Nodes whose depth is at least `max_depth` are not expanded. Replies
    /// that are deleted or cannot be read are left out along with their
    /// subtrees.
    pub fn build_thread(&self, root_id: CommentId, max_depth: u32) -> Result<CommentThread> {
        let root = self.get_comment(root_id)?;

        // Arena of (comment, child slots); a child is always pushed after its
        // parent, so assembling in reverse sees every subtree complete.
        let mut nodes: Vec<(Comment, Vec<usize>)> = vec![(root, Vec::new())];
        let mut pending = vec![0usize];

        while let Some(slot) = pending.pop() {
            let (id, depth) = (nodes[slot].0.id, nodes[slot].0.depth);
            if depth >= max_depth {
                continue;
            }

            for child_id in self.index_ids(&keys::id_key(keys::CHILD_COMMENTS, id))? {
                let child = match self.get_comment(child_id) {
                    Ok(c) if !c.deleted => c,
                    Ok(_) => continue,
                    Err(e) => {
                        tracing::warn!(comment_id = child_id, error = %e, "skipping unreadable reply");
                        continue;
                    }
                };
                let child_slot = nodes.len();
                nodes.push((child, Vec::new()));
                nodes[slot].1.push(child_slot);
                pending.push(child_slot);
            }
        }

        let mut built: Vec<Option<CommentThread>> = (0..nodes.len()).map(|_| None).collect();
        for (slot, (comment, children)) in nodes.into_iter().enumerate().rev() {
            let replies = children
                .iter()
                .filter_map(|&child| built[child].take())
                .collect();
            built[slot] = Some(CommentThread { comment, replies });
        }

        built
            .first_mut()
            .and_then(Option::take)
            .ok_or_else(|| BlogError::NotFound(format!("comment not found: {root_id}")))
    }

    fn index_ids(&self, prefix: &[u8]) -> Result<Vec<u64>> {
        self.keys_with_prefix(prefix)?
            .iter()
            .map(|key| keys::trailing_id(key).map_err(BlogError::from))
            .collect()
    }
}
