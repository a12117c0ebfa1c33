//! Domain services mapping user actions to REST calls

use crate::client::ApiClient;

pub mod auth;
pub mod groups;
pub mod posts;
pub mod users;

pub use auth::AuthService;
pub use groups::GroupService;
pub use posts::PostService;
pub use users::UserService;

/// All domain services over one shared client
#[derive(Clone, Debug)]
pub struct Services {
    pub auth: AuthService,
    pub posts: PostService,
    pub groups: GroupService,
    pub users: UserService,
}

impl Services {
    pub fn new(client: ApiClient) -> Self {
        Self {
            auth: AuthService::new(client.clone()),
            posts: PostService::new(client.clone()),
            groups: GroupService::new(client.clone()),
            users: UserService::new(client),
        }
    }
}
