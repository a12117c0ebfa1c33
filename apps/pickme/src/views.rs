//! Pages of the client
//!
//! Each page is a plain struct loaded from the API services and rendered
//! through `Display`. Actions return [`AppResult`](crate::error::AppResult);
//! callers pass the outcome to [`AppState::settle`](crate::state::AppState::settle)
//! to get notices and session handling.

pub mod account;
pub mod create_post;
pub mod groups;
pub mod post_card;
pub mod post_detail;
pub mod post_list;
pub mod profile;
pub mod search;

pub use create_post::{CreatePostForm, CreatePostPage};
pub use groups::{GroupDetailPage, GroupsPage};
pub use post_card::{LikeAction, PendingLike, PostCard};
pub use post_detail::{EditPostForm, PostDetailPage};
pub use post_list::PostList;
pub use profile::{EditProfilePage, ProfileForm, ProfilePage};
pub use search::SearchPage;
