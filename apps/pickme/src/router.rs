//! Routes and navigation
//!
//! Public routes (`/login`, `/register`) send a signed-in user to the feed;
//! every other route sends an anonymous user to `/login`. Unknown paths fall
//! back to the feed.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use api::models::{GroupId, PostId, UserId};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Feed,
    Profile(UserId),
    EditProfile,
    Groups,
    GroupDetail(GroupId),
    CreatePost,
    PostDetail(PostId),
    Search,
}

impl Route {
    /// Parse a path; anything unrecognised is the feed
    pub fn parse(path: &str) -> Route {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        match segments.as_slice() {
            ["login"] => Route::Login,
            ["register"] => Route::Register,
            ["profile", "edit"] => Route::EditProfile,
            ["profile", id] => id.parse().map(Route::Profile).unwrap_or(Route::Feed),
            ["groups"] => Route::Groups,
            ["groups", id] => id.parse().map(Route::GroupDetail).unwrap_or(Route::Feed),
            ["create"] => Route::CreatePost,
            ["post", id] => id.parse().map(Route::PostDetail).unwrap_or(Route::Feed),
            ["search"] => Route::Search,
            _ => Route::Feed,
        }
    }

    pub fn is_public(&self) -> bool {
        matches!(self, Route::Login | Route::Register)
    }

    /// Where a user actually lands when asking for this route
    pub fn resolve(self, authenticated: bool) -> Route {
        match (self.is_public(), authenticated) {
            (true, true) => Route::Feed,
            (false, false) => Route::Login,
            _ => self,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
            Route::Feed => write!(f, "/"),
            Route::Profile(id) => write!(f, "/profile/{}", id),
            Route::EditProfile => write!(f, "/profile/edit"),
            Route::Groups => write!(f, "/groups"),
            Route::GroupDetail(id) => write!(f, "/groups/{}", id),
            Route::CreatePost => write!(f, "/create"),
            Route::PostDetail(id) => write!(f, "/post/{}", id),
            Route::Search => write!(f, "/search"),
        }
    }
}

/// Raised by the API client when a refresh fails
#[derive(Debug, Clone, Default)]
pub struct SessionSignal {
    expired: Arc<AtomicBool>,
}

impl SessionSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raise(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    /// Whether the signal was raised since the last call
    pub fn take(&self) -> bool {
        self.expired.swap(false, Ordering::SeqCst)
    }
}

/// The page the client is on
#[derive(Debug)]
pub struct Navigator {
    current: Route,
}

impl Navigator {
    pub fn new(start: Route) -> Self {
        Self { current: start }
    }

    /// Go to `route`, applying the public/private gate
    pub fn navigate(&mut self, route: Route, authenticated: bool) -> Route {
        let target = route.resolve(authenticated);
        if target != route {
            debug!("Redirecting {} to {}", route, target);
        }
        self.current = target;
        target
    }

    /// Leave the current page for the login page
    pub fn to_login(&mut self) {
        info!("Session ended, returning to login");
        self.current = Route::Login;
    }

    pub fn current(&self) -> Route {
        self.current
    }
}
