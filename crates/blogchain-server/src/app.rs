//! The host side of the chain: action dispatch and read-only queries.
//!
//! Every delivered [`Msg`] is shape-checked, stamped with the block time and
//! applied inside exactly one store transaction. Its event is emitted only
//! after that transaction commits.

use std::sync::{Arc, Mutex, MutexGuard};

use blogchain_shared::address::AddressCodec;
use blogchain_shared::events::{BlogEvent, EventSink};
use blogchain_shared::protocol::{Msg, MsgResponse};
use blogchain_shared::types::{
    Comment, CommentId, CommentThread, NewComment, NewPost, NewProfile, Page, PageRequest, Post,
    PostId, PostUpdate, Profile, ProfileUpdate,
};
use blogchain_shared::{BlogError, Result as BlogResult};
use blogchain_store::{Database, StoreTx};
use serde::Serialize;

use crate::error::ServerError;

pub struct App {
    db: Mutex<Database>,
    codec: Arc<dyn AddressCodec>,
    events: Arc<dyn EventSink>,
    default_thread_depth: u32,
}

/// Index cardinalities reported by the health endpoint.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ChainStats {
    pub active_posts: u64,
    pub total_posts: u64,
}

impl App {
    pub fn new(
        db: Database,
        codec: Arc<dyn AddressCodec>,
        events: Arc<dyn EventSink>,
        default_thread_depth: u32,
    ) -> Self {
        Self {
            db: Mutex::new(db),
            codec,
            events,
            default_thread_depth,
        }
    }

    fn db(&self) -> Result<MutexGuard<'_, Database>, ServerError> {
        self.db
            .lock()
            .map_err(|e| ServerError::Internal(format!("Lock poisoned: {e}")))
    }

    fn query<T>(&self, f: impl FnOnce(&StoreTx<'_>) -> BlogResult<T>) -> Result<T, ServerError> {
        let mut db = self.db()?;
        Ok(db.read(f)?)
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    /// Validate and apply one action.
    pub fn deliver(&self, msg: Msg) -> Result<MsgResponse, ServerError> {
        let signer = msg.signer().to_string();

        if let Err(e) = msg.validate_basic(self.codec.as_ref()) {
            tracing::debug!(%signer, error = %e, "action rejected by shape validation");
            return Err(e.into());
        }

        let now = chrono::Utc::now().timestamp();

        let outcome = {
            let mut db = self.db()?;
            db.transact(|tx| execute(tx, msg, now))
        };

        match outcome {
            Ok((response, event)) => {
                tracing::debug!(%signer, event = event.name(), "action committed");
                self.events.emit(event);
                Ok(response)
            }
            Err(e) => {
                tracing::info!(%signer, error = %e, "action rejected");
                Err(e.into())
            }
        }
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    pub fn posts(&self, page: &PageRequest) -> Result<Page<Post>, ServerError> {
        self.query(|tx| tx.list_active_posts(page))
    }

    pub fn post(&self, id: PostId) -> Result<Post, ServerError> {
        self.query(|tx| tx.get_post(id))
    }

    /// Live comments of a post: top-level ones for `parent_id == 0`, else the
    /// direct replies to `parent_id`.
    pub fn comments(&self, post_id: PostId, parent_id: CommentId) -> Result<Vec<Comment>, ServerError> {
        self.query(|tx| {
            tx.get_post(post_id)?;
            tx.list_comments(post_id, parent_id)
        })
    }

    /// A live comment. Deleted comments read as absent.
    pub fn comment(&self, id: CommentId) -> Result<Comment, ServerError> {
        self.query(|tx| live_comment(tx, id))
    }

    pub fn comment_thread(
        &self,
        id: CommentId,
        max_depth: Option<u32>,
    ) -> Result<CommentThread, ServerError> {
        let max_depth = max_depth.unwrap_or(self.default_thread_depth);
        self.query(|tx| {
            live_comment(tx, id)?;
            tx.build_thread(id, max_depth)
        })
    }

    pub fn profile(&self, address: &str) -> Result<Profile, ServerError> {
        self.query(|tx| tx.get_profile(address))
    }

    pub fn profile_by_username(&self, username: &str) -> Result<Profile, ServerError> {
        self.query(|tx| tx.get_profile_by_username(username))
    }

    pub fn profiles(&self, page: &PageRequest) -> Result<Page<Profile>, ServerError> {
        self.query(|tx| tx.list_profiles(page))
    }

    pub fn followers(&self, address: &str) -> Result<Vec<String>, ServerError> {
        self.query(|tx| {
            tx.get_profile(address)?;
            tx.get_followers(address)
        })
    }

    pub fn following(&self, address: &str) -> Result<Vec<String>, ServerError> {
        self.query(|tx| {
            tx.get_profile(address)?;
            tx.get_following(address)
        })
    }

    pub fn is_following(&self, follower: &str, following: &str) -> Result<bool, ServerError> {
        self.query(|tx| tx.is_following(follower, following))
    }

    pub fn stats(&self) -> Result<ChainStats, ServerError> {
        self.query(|tx| {
            Ok(ChainStats {
                active_posts: tx.active_post_count()?,
                total_posts: tx.total_post_count()?,
            })
        })
    }
}

fn live_comment(tx: &StoreTx<'_>, id: CommentId) -> BlogResult<Comment> {
    let comment = tx.get_comment(id)?;
    if comment.deleted {
        return Err(BlogError::NotFound(format!("comment not found: {id}")));
    }
    Ok(comment)
}

/// Run one action against the open transaction.
fn execute(tx: &mut StoreTx<'_>, msg: Msg, now: i64) -> BlogResult<(MsgResponse, BlogEvent)> {
    let outcome = match msg {
        Msg::CreatePost(m) => {
            let creator = m.creator.clone();
            let id = tx.create_post(
                NewPost {
                    creator: m.creator,
                    title: m.title,
                    body: m.body,
                    tags: m.tags,
                    content_blob_id: m.content_blob_id,
                    media_blob_ids: m.media_blob_ids,
                },
                now,
            )?;
            (MsgResponse::created(id), BlogEvent::PostCreated { id, creator })
        }
        Msg::UpdatePost(m) => {
            let post = tx.update_post(
                m.id,
                &m.creator,
                PostUpdate {
                    title: m.title,
                    body: m.body,
                    tags: m.tags,
                    content_blob_id: m.content_blob_id,
                    media_blob_ids: m.media_blob_ids,
                },
                now,
            )?;
            (
                MsgResponse::empty(),
                BlogEvent::PostUpdated {
                    id: post.id,
                    creator: post.creator,
                    updated_at: post.updated_at,
                },
            )
        }
        Msg::DeletePost(m) => {
            tx.delete_post(m.id, &m.creator, now)?;
            (
                MsgResponse::empty(),
                BlogEvent::PostDeleted {
                    id: m.id,
                    creator: m.creator,
                },
            )
        }
        Msg::LikePost(m) => {
            tx.like_post(m.post_id, &m.liker)?;
            (
                MsgResponse::empty(),
                BlogEvent::PostLiked {
                    post_id: m.post_id,
                    liker: m.liker,
                },
            )
        }

        Msg::CreateComment(m) => {
            let (post_id, parent_id, creator) = (m.post_id, m.parent_id, m.creator.clone());
            let id = tx.create_comment(
                NewComment {
                    post_id: m.post_id,
                    parent_id: m.parent_id,
                    creator: m.creator,
                    content: m.content,
                },
                now,
            )?;
            (
                MsgResponse::created(id),
                BlogEvent::CommentCreated {
                    id,
                    post_id,
                    parent_id,
                    creator,
                },
            )
        }
        Msg::UpdateComment(m) => {
            let comment = tx.update_comment(m.id, &m.creator, m.content, now)?;
            (
                MsgResponse::empty(),
                BlogEvent::CommentUpdated {
                    id: comment.id,
                    creator: comment.creator,
                    updated_at: comment.updated_at,
                },
            )
        }
        Msg::DeleteComment(m) => {
            tx.delete_comment(m.id, &m.creator, now)?;
            (
                MsgResponse::empty(),
                BlogEvent::CommentDeleted {
                    id: m.id,
                    creator: m.creator,
                },
            )
        }
        Msg::LikeComment(m) => {
            tx.like_comment(m.comment_id, &m.liker)?;
            (
                MsgResponse::empty(),
                BlogEvent::CommentLiked {
                    comment_id: m.comment_id,
                    liker: m.liker,
                },
            )
        }

        Msg::CreateProfile(m) => {
            let profile = tx.create_profile(
                NewProfile {
                    address: m.creator,
                    username: m.username,
                    display_name: m.display_name,
                    bio: m.bio,
                    avatar_url: m.avatar_url,
                    website: m.website,
                },
                now,
            )?;
            (
                MsgResponse::empty(),
                BlogEvent::ProfileCreated {
                    address: profile.address,
                    username: profile.username,
                },
            )
        }
        Msg::UpdateProfile(m) => {
            tx.update_profile(
                &m.creator,
                ProfileUpdate {
                    display_name: m.display_name,
                    bio: m.bio,
                    avatar_url: m.avatar_url,
                    website: m.website,
                },
                now,
            )?;
            (
                MsgResponse::empty(),
                BlogEvent::ProfileUpdated { address: m.creator },
            )
        }
        Msg::Follow(m) => {
            tx.follow(&m.follower, &m.following)?;
            (
                MsgResponse::empty(),
                BlogEvent::UserFollowed {
                    follower: m.follower,
                    following: m.following,
                },
            )
        }
        Msg::Unfollow(m) => {
            tx.unfollow(&m.follower, &m.following)?;
            (
                MsgResponse::empty(),
                BlogEvent::UserUnfollowed {
                    follower: m.follower,
                    following: m.following,
                },
            )
        }
    };

    Ok(outcome)
}

#[cfg(test)]
pub(crate) mod tests {
    use blogchain_shared::address::Bech32Codec;
    use blogchain_shared::events::MemorySink;
    use blogchain_shared::protocol::{
        MsgCreateComment, MsgCreatePost, MsgCreateProfile, MsgDeleteComment, MsgDeletePost,
        MsgFollow, MsgLikeComment, MsgLikePost, MsgUnfollow, MsgUpdatePost, MsgUpdateProfile,
    };
    use blogchain_shared::ErrorKind;

    use super::*;

    pub(crate) fn address(seed: u8) -> String {
        Bech32Codec::default().encode(&[seed; 20])
    }

    pub(crate) fn test_app() -> (App, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::new());
        let app = App::new(
            Database::open_in_memory().unwrap(),
            Arc::new(Bech32Codec::default()),
            sink.clone(),
            10,
        );
        (app, sink)
    }

    fn kind(err: ServerError) -> ErrorKind {
        match err {
            ServerError::Blog(e) => e.kind(),
            ServerError::Internal(e) => panic!("unexpected internal error: {e}"),
        }
    }

    fn create_post(app: &App, creator: &str) -> PostId {
        app.deliver(Msg::CreatePost(MsgCreatePost {
            creator: creator.to_string(),
            title: "Hello".into(),
            body: "world".into(),
            ..MsgCreatePost::default()
        }))
        .unwrap()
        .id
        .unwrap()
    }

    fn reply(app: &App, creator: &str, post_id: PostId, parent_id: CommentId) -> Result<MsgResponse, ServerError> {
        app.deliver(Msg::CreateComment(MsgCreateComment {
            creator: creator.to_string(),
            post_id,
            parent_id,
            content: "nice".into(),
        }))
    }

    #[test]
    fn post_lifecycle_emits_events_after_commit() {
        let (app, sink) = test_app();
        let alice = address(1);
        let bob = address(2);

        let id = create_post(&app, &alice);
        assert_eq!(id, 1);

        app.deliver(Msg::UpdatePost(MsgUpdatePost {
            creator: alice.clone(),
            id,
            title: "Edited".into(),
            ..MsgUpdatePost::default()
        }))
        .unwrap();

        app.deliver(Msg::LikePost(MsgLikePost {
            liker: bob.clone(),
            post_id: id,
        }))
        .unwrap();

        let err = app
            .deliver(Msg::DeletePost(MsgDeletePost {
                creator: bob.clone(),
                id,
            }))
            .unwrap_err();
        assert_eq!(kind(err), ErrorKind::Unauthorized);

        app.deliver(Msg::DeletePost(MsgDeletePost {
            creator: alice.clone(),
            id,
        }))
        .unwrap();

        assert_eq!(
            sink.names(),
            vec!["post_created", "post_updated", "post_liked", "post_deleted"]
        );

        let post = app.post(id).unwrap();
        assert!(post.deleted);
        assert_eq!(post.title, "Edited");
        assert_eq!(post.likes, 1);
        assert!(app.posts(&PageRequest::default()).unwrap().items.is_empty());
        assert_eq!(
            app.stats().unwrap(),
            ChainStats {
                active_posts: 0,
                total_posts: 1
            }
        );
    }

    #[test]
    fn posts_accept_empty_title_and_body() {
        let (app, sink) = test_app();
        let alice = address(1);

        let first = app
            .deliver(Msg::CreatePost(MsgCreatePost {
                creator: alice.clone(),
                title: String::new(),
                body: "This is a test post body".into(),
                ..MsgCreatePost::default()
            }))
            .unwrap();
        let second = app
            .deliver(Msg::CreatePost(MsgCreatePost {
                creator: alice.clone(),
                title: "Title only".into(),
                ..MsgCreatePost::default()
            }))
            .unwrap();
        assert_eq!((first.id, second.id), (Some(1), Some(2)));

        app.deliver(Msg::UpdatePost(MsgUpdatePost {
            creator: alice.clone(),
            id: 2,
            ..MsgUpdatePost::default()
        }))
        .unwrap();

        assert_eq!(app.post(1).unwrap().title, "");
        assert_eq!(app.post(2).unwrap().body, "");
        assert_eq!(sink.names(), vec!["post_created", "post_created", "post_updated"]);
    }

    #[test]
    fn comment_limit_counts_bytes() {
        let (app, sink) = test_app();
        let alice = address(1);
        let post_id = create_post(&app, &alice);

        let err = app
            .deliver(Msg::CreateComment(MsgCreateComment {
                creator: alice.clone(),
                post_id,
                parent_id: 0,
                content: "é".repeat(4000),
            }))
            .unwrap_err();
        assert_eq!(kind(err), ErrorKind::InvalidArgument);

        app.deliver(Msg::CreateComment(MsgCreateComment {
            creator: alice.clone(),
            post_id,
            parent_id: 0,
            content: "é".repeat(2500),
        }))
        .unwrap();
        assert_eq!(sink.names(), vec!["post_created", "comment_created"]);
    }

    #[test]
    fn malformed_addresses_never_reach_the_store() {
        let (app, sink) = test_app();

        let err = app
            .deliver(Msg::CreatePost(MsgCreatePost {
                creator: "not-an-address".into(),
                title: "Hello".into(),
                ..MsgCreatePost::default()
            }))
            .unwrap_err();
        assert_eq!(kind(err), ErrorKind::InvalidArgument);

        let other_chain = Bech32Codec::new("cosmos").encode(&[1; 20]);
        let err = app
            .deliver(Msg::CreatePost(MsgCreatePost {
                creator: other_chain,
                title: "Hello".into(),
                ..MsgCreatePost::default()
            }))
            .unwrap_err();
        assert_eq!(kind(err), ErrorKind::InvalidArgument);

        assert!(sink.events().is_empty());
        assert_eq!(app.stats().unwrap().total_posts, 0);
    }

    #[test]
    fn comment_depth_scenario() {
        let (app, sink) = test_app();
        let alice = address(1);
        let post_id = create_post(&app, &alice);

        let mut parent = 0;
        for _ in 0..6 {
            parent = reply(&app, &alice, post_id, parent).unwrap().id.unwrap();
        }
        let err = reply(&app, &alice, post_id, parent).unwrap_err();
        assert_eq!(err.to_string(), "maximum comment depth (5) reached");

        let events = sink.events();
        assert_eq!(events.len(), 7);
        assert!(matches!(
            events.last(),
            Some(BlogEvent::CommentCreated { parent_id, .. }) if *parent_id == parent - 1
        ));

        let thread = app.comment_thread(1, None).unwrap();
        assert_eq!(thread.size(), 6);
        let shallow = app.comment_thread(1, Some(2)).unwrap();
        assert_eq!(shallow.size(), 3);
        assert_eq!(app.post(post_id).unwrap().comment_count, 6);
    }

    #[test]
    fn deleted_comments_read_as_absent() {
        let (app, _) = test_app();
        let alice = address(1);
        let bob = address(2);
        let post_id = create_post(&app, &alice);
        let root = reply(&app, &bob, post_id, 0).unwrap().id.unwrap();
        reply(&app, &alice, post_id, root).unwrap();

        app.deliver(Msg::LikeComment(MsgLikeComment {
            liker: alice.clone(),
            comment_id: root,
        }))
        .unwrap();
        let err = app
            .deliver(Msg::LikeComment(MsgLikeComment {
                liker: alice.clone(),
                comment_id: root,
            }))
            .unwrap_err();
        assert_eq!(kind(err), ErrorKind::AlreadyExists);

        assert_eq!(app.comments(post_id, 0).unwrap().len(), 1);
        assert_eq!(app.comments(post_id, root).unwrap().len(), 1);
        assert_eq!(kind(app.comments(99, 0).unwrap_err()), ErrorKind::NotFound);

        app.deliver(Msg::DeleteComment(MsgDeleteComment {
            creator: bob.clone(),
            id: root,
        }))
        .unwrap();

        assert_eq!(kind(app.comment(root).unwrap_err()), ErrorKind::NotFound);
        assert_eq!(kind(app.comment_thread(root, None).unwrap_err()), ErrorKind::NotFound);
        assert!(app.comments(post_id, 0).unwrap().is_empty());
        assert_eq!(app.post(post_id).unwrap().comment_count, 1);
    }

    #[test]
    fn social_graph_round_trip() {
        let (app, sink) = test_app();
        let alice = address(1);
        let bob = address(2);

        for (who, name) in [(&alice, "alice"), (&bob, "Bob_2")] {
            app.deliver(Msg::CreateProfile(MsgCreateProfile {
                creator: who.clone(),
                username: name.into(),
                website: "https://example.com".into(),
                ..MsgCreateProfile::default()
            }))
            .unwrap();
        }

        let err = app
            .deliver(Msg::CreateProfile(MsgCreateProfile {
                creator: address(3),
                username: "ALICE".into(),
                ..MsgCreateProfile::default()
            }))
            .unwrap_err();
        assert_eq!(kind(err), ErrorKind::AlreadyExists);

        let err = app
            .deliver(Msg::UpdateProfile(MsgUpdateProfile {
                creator: alice.clone(),
                website: "not a url".into(),
                ..MsgUpdateProfile::default()
            }))
            .unwrap_err();
        assert_eq!(kind(err), ErrorKind::InvalidArgument);

        let follow = || {
            app.deliver(Msg::Follow(MsgFollow {
                follower: alice.clone(),
                following: bob.clone(),
            }))
        };
        follow().unwrap();
        assert_eq!(kind(follow().unwrap_err()), ErrorKind::AlreadyExists);

        assert!(app.is_following(&alice, &bob).unwrap());
        assert_eq!(app.followers(&bob).unwrap(), vec![alice.clone()]);
        assert_eq!(app.following(&alice).unwrap(), vec![bob.clone()]);
        assert_eq!(app.profile_by_username("bob_2").unwrap().followers, 1);

        app.deliver(Msg::Unfollow(MsgUnfollow {
            follower: alice.clone(),
            following: bob.clone(),
        }))
        .unwrap();
        assert_eq!(app.profile(&alice).unwrap().following, 0);
        assert_eq!(app.profile(&bob).unwrap().followers, 0);
        assert_eq!(kind(app.followers(&address(9)).unwrap_err()), ErrorKind::NotFound);
        assert_eq!(app.profiles(&PageRequest::default()).unwrap().pagination.total, 2);

        assert_eq!(
            sink.names(),
            vec!["profile_created", "profile_created", "user_followed", "user_unfollowed"]
        );
    }
}
