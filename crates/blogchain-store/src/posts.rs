use blogchain_shared::constants::{POST_SEQUENCE, SEQUENCE_START};
use blogchain_shared::types::{NewPost, Page, PageRequest, Post, PostId, PostUpdate};
use blogchain_shared::{BlogError, Result};

use crate::keys;
use crate::kv::StoreTx;

impl StoreTx<'_> {
    /// Append a post, index it as active and bump the creator's post count.
    pub fn create_post(&mut self, new: NewPost, now: i64) -> Result<PostId> {
        let id = self.next_sequence(POST_SEQUENCE)?;

        let post = Post {
            id,
            creator: new.creator,
            title: new.title,
            body: new.body,
            tags: new.tags,
            created_at: now,
            updated_at: now,
            likes: 0,
            comment_count: 0,
            deleted: false,
            deleted_at: 0,
            content_blob_id: new.content_blob_id,
            media_blob_ids: new.media_blob_ids,
        };

        self.set_post(&post)?;
        self.set_marker(&keys::id_key(keys::ACTIVE_POSTS, id))?;
        self.increment_post_count(&post.creator)?;

        tracing::info!(post_id = id, creator = %post.creator, "post created");
        Ok(id)
    }

    /// Fetch a post by ID. Soft-deleted posts are returned too.
    pub fn get_post(&self, id: PostId) -> Result<Post> {
        self.get_record(&keys::id_key(keys::POSTS, id))?
            .ok_or_else(|| BlogError::NotFound(format!("post not found: {id}")))
    }

    pub(crate) fn set_post(&mut self, post: &Post) -> Result<()> {
        self.set_record(&keys::id_key(keys::POSTS, post.id), post)?;
        Ok(())
    }

    pub fn update_post(
        &mut self,
        id: PostId,
        actor: &str,
        update: PostUpdate,
        now: i64,
    ) -> Result<Post> {
        let mut post = self.get_post(id)?;
        if post.creator != actor {
            return Err(BlogError::Unauthorized(
                "only the post creator can update the post".into(),
            ));
        }
        if post.deleted {
            return Err(BlogError::InvalidState("cannot update a deleted post".into()));
        }

        post.title = update.title;
        post.body = update.body;
        post.tags = update.tags;
        post.content_blob_id = update.content_blob_id;
        post.media_blob_ids = update.media_blob_ids;
        post.updated_at = now;
        self.set_post(&post)?;

        tracing::info!(post_id = id, "post updated");
        Ok(post)
    }

    /// Soft-delete: flag the record and move it from the active to the
    /// deleted index. The record itself is never removed.
    pub fn delete_post(&mut self, id: PostId, actor: &str, deleted_at: i64) -> Result<Post> {
        let mut post = self.get_post(id)?;
        if post.creator != actor {
            return Err(BlogError::Unauthorized(
                "only the post creator can delete the post".into(),
            ));
        }
        if post.deleted {
            return Err(BlogError::InvalidState("post is already deleted".into()));
        }

        post.deleted = true;
        post.deleted_at = deleted_at;
        self.set_post(&post)?;
        self.delete(&keys::id_key(keys::ACTIVE_POSTS, id))?;
        self.set_marker(&keys::id_key(keys::DELETED_POSTS, id))?;
        self.decrement_post_count(&post.creator)?;

        tracing::info!(post_id = id, "post deleted");
        Ok(post)
    }

    /// Record a like. Each identity may like a post once.
    pub fn like_post(&mut self, id: PostId, liker: &str) -> Result<Post> {
        let mut post = self.get_post(id)?;
        if post.deleted {
            return Err(BlogError::InvalidState("cannot like a deleted post".into()));
        }

        let like_key = keys::id_str_key(keys::POST_LIKES, id, liker);
        if self.has(&like_key)? {
            return Err(BlogError::AlreadyExists(
                "user has already liked this post".into(),
            ));
        }

        post.likes += 1;
        self.set_post(&post)?;
        self.set_marker(&like_key)?;

        tracing::debug!(post_id = id, liker, likes = post.likes, "post liked");
        Ok(post)
    }

    pub fn has_liked_post(&self, id: PostId, address: &str) -> Result<bool> {
        Ok(self.has(&keys::id_str_key(keys::POST_LIKES, id, address))?)
    }

    /// Live posts in ID order.
    pub fn list_active_posts(&self, request: &PageRequest) -> Result<Page<Post>> {
        let (entries, pagination) = self.page_prefix(keys::ACTIVE_POSTS, request)?;

        let mut items = Vec::with_capacity(entries.len());
        for (key, _) in entries {
            let id = keys::trailing_id(&key)?;
            match self.get_post(id) {
                Ok(post) => items.push(post),
                Err(BlogError::NotFound(_)) => {
                    tracing::warn!(post_id = id, "active index points at missing post");
                }
                Err(e) => return Err(e),
            }
        }

        Ok(Page { items, pagination })
    }

    pub fn active_post_count(&self) -> Result<u64> {
        Ok(self.count_prefix(keys::ACTIVE_POSTS)?)
    }

    /// Every post ever created, deleted ones included.
    pub fn total_post_count(&self) -> Result<u64> {
        Ok(self.peek_sequence(POST_SEQUENCE)? - SEQUENCE_START)
    }
}
