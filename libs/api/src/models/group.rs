//! Friend group model

use serde::{Deserialize, Serialize};

use super::{Identified, User, UserId};

pub type GroupId = i64;

/// A named set of users, used to scope post audiences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub members: Vec<User>,
    #[serde(default)]
    pub members_count: u64,
}

impl Identified for FriendGroup {
    fn id(&self) -> i64 {
        self.id
    }
}

/// Group creation and rename payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupName {
    pub name: String,
}

/// Add-member payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMember {
    pub user_id: UserId,
}
