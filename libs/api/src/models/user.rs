//! User model and related payloads

use serde::{Deserialize, Serialize};

use super::Identified;

pub type UserId = i64;

/// User entity as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    /// URL of the avatar image
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub is_superuser: bool,
}

impl User {
    /// "First Last", or the username when both names are blank
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.last_name);
        let full = full.trim();
        if full.is_empty() {
            self.username.clone()
        } else {
            full.to_string()
        }
    }
}

impl Identified for User {
    fn id(&self) -> i64 {
        self.id
    }
}

/// User registration payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub username: String,
    pub password: String,
    pub password_confirm: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
}

/// Profile update payload; absent fields are left untouched
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct UpdateUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

/// User login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}
