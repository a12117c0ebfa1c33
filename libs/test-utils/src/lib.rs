//! In-process fake of the PickMe REST API for integration tests
//!
//! [`FakeBackend::start`] binds an axum server on a random local port and
//! returns a handle that seeds data, forces failures and inspects the
//! requests the client made.
//!
//! ```no_run
//! # async fn demo() {
//! use test_utils::FakeBackend;
//!
//! let backend = FakeBackend::start().await;
//! let alice = backend.seed_user("alice", "alice@example.com", "password123");
//! let tokens = backend.issue_tokens(alice);
//! backend.expire_access_tokens();
//! # }
//! ```

pub mod routes;
pub mod state;

use std::sync::{Arc, Mutex, MutexGuard};

use common::TokenPair;
use tokio::net::TcpListener;
use tracing::info;

pub use state::{BackendState, FakeGroup, FakePost, FakeUser, RecordedRequest};

/// Handle on a running fake backend
#[derive(Clone)]
pub struct FakeBackend {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    state: Arc<Mutex<BackendState>>,
}

impl FakeBackend {
    /// Start serving on `127.0.0.1` with an OS-assigned port
    pub async fn start() -> Self {
        let state = Arc::new(Mutex::new(BackendState::default()));
        let app = routes::create_router(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");
        info!("Fake backend listening on {}", addr);

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Fake backend stopped");
        });

        Self {
            base_url: format!("http://{}/api", addr),
            state,
        }
    }

    /// Direct access to the backend state
    pub fn state(&self) -> MutexGuard<'_, BackendState> {
        self.state.lock().unwrap()
    }

    pub fn seed_user(&self, username: &str, email: &str, password: &str) -> i64 {
        self.state().add_user(username, email, password)
    }

    /// Issue a fresh access/refresh pair as if the user had logged in
    pub fn issue_tokens(&self, user_id: i64) -> TokenPair {
        let (access, refresh) = self.state().issue_pair(user_id);
        TokenPair { access, refresh }
    }

    pub fn seed_post(&self, author: i64, text: &str) -> i64 {
        self.state().add_post(author, text, "everyone", Vec::new())
    }

    pub fn seed_post_for(&self, author: i64, text: &str, audience: &str, groups: Vec<i64>) -> i64 {
        self.state().add_post(author, text, audience, groups)
    }

    pub fn seed_group(&self, owner: i64, name: &str, members: Vec<i64>) -> i64 {
        self.state().add_group(owner, name, members)
    }

    pub fn set_page_size(&self, size: usize) {
        self.state().page_size = size;
    }

    /// Invalidate every access token issued so far
    pub fn expire_access_tokens(&self) {
        self.state().access_tokens.clear();
    }

    /// Make the refresh endpoint reject every token
    pub fn fail_refresh(&self) {
        self.state().refresh_fails = true;
    }

    /// Reject every access token, including ones issued later
    pub fn reject_all_access(&self) {
        self.state().reject_all_access = true;
    }

    /// Answer `method path` with `status` before routing
    pub fn fail(&self, method: &str, path: &str, status: u16) {
        self.state()
            .failures
            .insert((method.to_string(), path.to_string()), status);
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.state()
            .requests
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }

    pub fn refresh_calls(&self) -> usize {
        self.requests_to("/auth/refresh/").len()
    }

    pub fn post(&self, id: i64) -> Option<FakePost> {
        self.state().posts.get(&id).cloned()
    }

    pub fn group(&self, id: i64) -> Option<FakeGroup> {
        self.state().groups.get(&id).cloned()
    }

    pub fn user(&self, id: i64) -> Option<FakeUser> {
        self.state().users.get(&id).cloned()
    }

    /// Like a post on behalf of `user_id` without going through HTTP
    pub fn like_as(&self, post_id: i64, user_id: i64) {
        if let Some(post) = self.state().posts.get_mut(&post_id) {
            post.likers.retain(|u| *u != user_id);
            post.likers.push(user_id);
        }
    }
}
