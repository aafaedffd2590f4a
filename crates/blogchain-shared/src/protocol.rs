use serde::{Deserialize, Serialize};

use crate::address::AddressCodec;
use crate::error::Result;
use crate::types::{CommentId, PostId};
use crate::validation::{
    validate_comment_content, validate_profile_fields, validate_username,
};

/// All inbound actions accepted by the dispatcher
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Msg {
    CreatePost(MsgCreatePost),
    UpdatePost(MsgUpdatePost),
    DeletePost(MsgDeletePost),
    LikePost(MsgLikePost),

    CreateComment(MsgCreateComment),
    UpdateComment(MsgUpdateComment),
    DeleteComment(MsgDeleteComment),
    LikeComment(MsgLikeComment),

    CreateProfile(MsgCreateProfile),
    UpdateProfile(MsgUpdateProfile),
    Follow(MsgFollow),
    Unfollow(MsgUnfollow),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgCreatePost {
    pub creator: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub content_blob_id: Option<String>,
    pub media_blob_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgUpdatePost {
    pub creator: String,
    pub id: PostId,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    pub content_blob_id: Option<String>,
    pub media_blob_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgDeletePost {
    pub creator: String,
    pub id: PostId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgLikePost {
    pub liker: String,
    pub post_id: PostId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgCreateComment {
    pub creator: String,
    pub post_id: PostId,
    /// 0 for a top-level comment
    pub parent_id: CommentId,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgUpdateComment {
    pub creator: String,
    pub id: CommentId,
    pub content: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgDeleteComment {
    pub creator: String,
    pub id: CommentId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgLikeComment {
    pub liker: String,
    pub comment_id: CommentId,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgCreateProfile {
    pub creator: String,
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub avatar_url: String,
    pub website: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgUpdateProfile {
    pub creator: String,
    pub display_name: String,
    pub bio: String,
    pub avatar_url: String,
    pub website: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgFollow {
    pub follower: String,
    pub following: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MsgUnfollow {
    pub follower: String,
    pub following: String,
}

/// Result of a delivered action. `id` is set for creations.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MsgResponse {
    pub id: Option<u64>,
}

impl MsgResponse {
    pub fn created(id: u64) -> Self {
        Self { id: Some(id) }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

impl Msg {
    /// Stateless shape checks: actor addresses and field formats.
    pub fn validate_basic(&self, codec: &dyn AddressCodec) -> Result<()> {
        match self {
            Msg::CreatePost(m) => check_address(codec, &m.creator, "creator"),
            Msg::UpdatePost(m) => check_address(codec, &m.creator, "creator"),
            Msg::DeletePost(m) => check_address(codec, &m.creator, "creator"),
            Msg::LikePost(m) => check_address(codec, &m.liker, "liker"),

            Msg::CreateComment(m) => {
                check_address(codec, &m.creator, "creator")?;
                validate_comment_content(&m.content)
            }
            Msg::UpdateComment(m) => {
                check_address(codec, &m.creator, "creator")?;
                validate_comment_content(&m.content)
            }
            Msg::DeleteComment(m) => check_address(codec, &m.creator, "creator"),
            Msg::LikeComment(m) => check_address(codec, &m.liker, "liker"),

            Msg::CreateProfile(m) => {
                check_address(codec, &m.creator, "creator")?;
                validate_username(&m.username)?;
                validate_profile_fields(&m.display_name, &m.bio, &m.avatar_url, &m.website)
            }
            Msg::UpdateProfile(m) => {
                check_address(codec, &m.creator, "creator")?;
                validate_profile_fields(&m.display_name, &m.bio, &m.avatar_url, &m.website)
            }
            Msg::Follow(m) => {
                check_address(codec, &m.follower, "follower")?;
                check_address(codec, &m.following, "following")
            }
            Msg::Unfollow(m) => {
                check_address(codec, &m.follower, "follower")?;
                check_address(codec, &m.following, "following")
            }
        }
    }

    /// The address acting in this message.
    pub fn signer(&self) -> &str {
        match self {
            Msg::CreatePost(m) => &m.creator,
            Msg::UpdatePost(m) => &m.creator,
            Msg::DeletePost(m) => &m.creator,
            Msg::LikePost(m) => &m.liker,
            Msg::CreateComment(m) => &m.creator,
            Msg::UpdateComment(m) => &m.creator,
            Msg::DeleteComment(m) => &m.creator,
            Msg::LikeComment(m) => &m.liker,
            Msg::CreateProfile(m) => &m.creator,
            Msg::UpdateProfile(m) => &m.creator,
            Msg::Follow(m) => &m.follower,
            Msg::Unfollow(m) => &m.follower,
        }
    }
}

fn check_address(codec: &dyn AddressCodec, address: &str, role: &str) -> Result<()> {
    codec
        .validate(address)
        .map_err(|e| e.context(&format!("invalid {role} address")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::Bech32Codec;
    use crate::error::BlogError;

    fn addr(seed: u8) -> String {
        Bech32Codec::default().encode(&[seed; 20])
    }

    #[test]
    fn test_msg_json_shape() {
        let json = format!(
            r#"{{"type":"create_comment","creator":"{}","postId":4,"content":"hi"}}"#,
            addr(1)
        );
        let msg: Msg = serde_json::from_str(&json).unwrap();
        match msg {
            Msg::CreateComment(m) => {
                assert_eq!(m.post_id, 4);
                assert_eq!(m.parent_id, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_validate_basic_rejects_bad_address() {
        let codec = Bech32Codec::default();
        let msg = Msg::LikePost(MsgLikePost {
            liker: "bogus".into(),
            post_id: 1,
        });
        let err = msg.validate_basic(&codec).unwrap_err();
        assert!(matches!(err, BlogError::InvalidArgument(_)));
        assert!(err.to_string().starts_with("invalid liker address"));
    }

    #[test]
    fn test_validate_basic_profile_rules() {
        let codec = Bech32Codec::default();
        let mut create = MsgCreateProfile {
            creator: addr(2),
            username: "alice".into(),
            ..Default::default()
        };
        assert!(Msg::CreateProfile(create.clone()).validate_basic(&codec).is_ok());

        create.username = "a!".into();
        assert!(Msg::CreateProfile(create.clone()).validate_basic(&codec).is_err());

        create.username = "alice".into();
        create.website = "nope".into();
        assert!(Msg::CreateProfile(create).validate_basic(&codec).is_err());
    }

    #[test]
    fn test_validate_basic_follow_checks_both_sides() {
        let codec = Bech32Codec::default();
        let msg = Msg::Follow(MsgFollow {
            follower: addr(1),
            following: "blogchain1zzzz".into(),
        });
        let err = msg.validate_basic(&codec).unwrap_err();
        assert!(err.to_string().contains("following"));
    }

    #[test]
    fn test_empty_comment_rejected() {
        let codec = Bech32Codec::default();
        let msg = Msg::CreateComment(MsgCreateComment {
            creator: addr(3),
            post_id: 1,
            parent_id: 0,
            content: String::new(),
        });
        assert!(msg.validate_basic(&codec).is_err());
    }
}
