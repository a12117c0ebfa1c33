//! API models for request and response payloads

use common::TokenPair;
use serde::{Deserialize, Serialize};

pub mod group;
pub mod page;
pub mod post;
pub mod user;

pub use group::{AddMember, FriendGroup, GroupId, GroupName};
pub use page::{Identified, Page};
pub use post::{
    Audience, ContentType, GroupRef, LikeStatus, MediaType, NewMedia, NewPost, Post, PostId,
    UpdatePost,
};
pub use user::{LoginCredentials, NewUser, UpdateUser, User, UserId};

/// Response for user registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub user: User,
    pub tokens: TokenPair,
}

/// Request for token refresh and logout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh: String,
}

/// Response for token refresh
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenResponse {
    pub access: String,
}
