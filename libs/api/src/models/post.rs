//! Post model, like state and post payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{GroupId, Identified, User};
use crate::request::Upload;

pub type PostId = i64;

/// What a post primarily carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    #[default]
    Text,
    Media,
}

/// Kind of media attached to a media post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Photo,
    Video,
    Link,
}

/// Who can see a post
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Audience {
    #[default]
    Everyone,
    /// Members of the groups listed in `audience_groups`
    Groups,
    OnlyMe,
}

impl ContentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Text => "text",
            ContentType::Media => "media",
        }
    }
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Photo => "photo",
            MediaType::Video => "video",
            MediaType::Link => "link",
        }
    }
}

impl Audience {
    pub fn as_str(&self) -> &'static str {
        match self {
            Audience::Everyone => "everyone",
            Audience::Groups => "groups",
            Audience::OnlyMe => "only_me",
        }
    }
}

/// Group id and name embedded in a post
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: GroupId,
    pub name: String,
}

/// Post entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: PostId,
    pub author: User,
    #[serde(default)]
    pub content_type: ContentType,
    #[serde(default)]
    pub text_content: String,
    #[serde(default)]
    pub media_type: Option<MediaType>,
    /// URL of the uploaded photo or video
    #[serde(default)]
    pub media_file: Option<String>,
    /// Target of a link post
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(rename = "audience_type", default)]
    pub audience: Audience,
    #[serde(default)]
    pub audience_groups: Vec<GroupId>,
    #[serde(default)]
    pub audience_groups_detail: Vec<GroupRef>,
    #[serde(default)]
    pub likes_count: u64,
    #[serde(default)]
    pub is_liked: bool,
    #[serde(default)]
    pub recent_likers: Vec<User>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Post {
    /// Like state as currently displayed
    pub fn like_status(&self) -> LikeStatus {
        LikeStatus {
            likes_count: self.likes_count,
            is_liked: self.is_liked,
            recent_likers: self.recent_likers.clone(),
        }
    }

    /// Overwrite the like state
    pub fn apply_like_status(&mut self, status: LikeStatus) {
        self.likes_count = status.likes_count;
        self.is_liked = status.is_liked;
        self.recent_likers = status.recent_likers;
    }
}

impl Identified for Post {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Authoritative like state returned by like and unlike calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LikeStatus {
    pub likes_count: u64,
    pub is_liked: bool,
    #[serde(default)]
    pub recent_likers: Vec<User>,
}

/// Media attached to a new post
#[derive(Debug, Clone, PartialEq)]
pub enum NewMedia {
    Photo(Upload),
    Video(Upload),
    Link(String),
}

impl NewMedia {
    pub fn media_type(&self) -> MediaType {
        match self {
            NewMedia::Photo(_) => MediaType::Photo,
            NewMedia::Video(_) => MediaType::Video,
            NewMedia::Link(_) => MediaType::Link,
        }
    }
}

/// New post creation payload
///
/// Sent as multipart form data since photo and video posts carry a file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewPost {
    pub content_type: ContentType,
    pub text_content: String,
    pub audience: Audience,
    pub audience_groups: Vec<GroupId>,
    /// Only meaningful for [`ContentType::Media`]
    pub media: Option<NewMedia>,
}

/// Post update payload
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UpdatePost {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(rename = "audience_type", skip_serializing_if = "Option::is_none")]
    pub audience: Option<Audience>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audience_groups: Option<Vec<GroupId>>,
}
