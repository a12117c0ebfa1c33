//! A single post as shown in lists and on its own page
//!
//! Likes are optimistic. A toggle is three steps so that several toggles can
//! be in flight at once:
//!
//! 1. [`begin_like`] flips the displayed state and returns a [`PendingLike`],
//! 2. [`send_like`] issues the like or unlike call,
//! 3. [`complete_like`] adopts the server's answer, or restores the state
//!    captured in step 1 when the call failed.
//!
//! Toggles are neither debounced nor ordered: whichever answer is completed
//! last is what stays on screen.

use std::fmt;

use api::models::{Audience, LikeStatus, MediaType, Post, PostId, UserId};
use api::{ApiResult, PostService};
use chrono::{DateTime, Utc};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeAction {
    Like,
    Unlike,
}

/// A like toggle whose request has not been completed yet
#[derive(Debug, Clone)]
pub struct PendingLike {
    pub post_id: PostId,
    pub action: LikeAction,
    /// Like state before the toggle
    snapshot: LikeStatus,
}

/// Flip the displayed like state of `post`
pub fn begin_like(post: &mut Post) -> PendingLike {
    let snapshot = post.like_status();
    let action = if post.is_liked {
        LikeAction::Unlike
    } else {
        LikeAction::Like
    };

    post.is_liked = !post.is_liked;
    post.likes_count = match action {
        LikeAction::Like => post.likes_count + 1,
        LikeAction::Unlike => post.likes_count.saturating_sub(1),
    };

    PendingLike {
        post_id: post.id,
        action,
        snapshot,
    }
}

pub async fn send_like(posts: &PostService, pending: &PendingLike) -> ApiResult<LikeStatus> {
    match pending.action {
        LikeAction::Like => posts.like(pending.post_id).await,
        LikeAction::Unlike => posts.unlike(pending.post_id).await,
    }
}

/// Reconcile `post` with the outcome of a toggle
pub fn complete_like(
    post: &mut Post,
    pending: PendingLike,
    result: ApiResult<LikeStatus>,
) -> ApiResult<()> {
    match result {
        Ok(status) => {
            post.apply_like_status(status);
            Ok(())
        }
        Err(e) => {
            warn!("Like toggle on post {} failed, rolling back: {}", post.id, e);
            post.apply_like_status(pending.snapshot);
            Err(e)
        }
    }
}

/// Run a whole toggle on `post`
pub async fn toggle_like(posts: &PostService, post: &mut Post) -> ApiResult<()> {
    let pending = begin_like(post);
    let result = send_like(posts, &pending).await;
    complete_like(post, pending, result)
}

/// "Everyone", "Only me", or the names of the audience groups
pub fn audience_label(post: &Post) -> String {
    match post.audience {
        Audience::Everyone => "Everyone".to_string(),
        Audience::OnlyMe => "Only me".to_string(),
        Audience::Groups => {
            let names: Vec<&str> = post
                .audience_groups_detail
                .iter()
                .map(|g| g.name.as_str())
                .collect();
            if names.is_empty() {
                "Groups".to_string()
            } else {
                names.join(", ")
            }
        }
    }
}

/// Age of a timestamp in words, e.g. "5 minutes ago"
pub fn relative_time(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - at).num_seconds();
    if seconds < 60 {
        return "just now".to_string();
    }

    let (amount, unit) = match seconds {
        s if s < 3600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3600, "hour"),
        s if s < 30 * 86_400 => (s / 86_400, "day"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "month"),
        s => (s / (365 * 86_400), "year"),
    };
    let plural = if amount == 1 { "" } else { "s" };
    format!("{} {}{} ago", amount, unit, plural)
}

/// Display form of a post for a given viewer
pub struct PostCard<'a> {
    post: &'a Post,
    viewer: Option<UserId>,
    now: DateTime<Utc>,
}

impl<'a> PostCard<'a> {
    pub fn new(post: &'a Post, viewer: Option<UserId>) -> Self {
        Self::at(post, viewer, Utc::now())
    }

    pub fn at(post: &'a Post, viewer: Option<UserId>, now: DateTime<Utc>) -> Self {
        Self { post, viewer, now }
    }

    /// Own posts can be edited and deleted
    pub fn is_own(&self) -> bool {
        self.viewer == Some(self.post.author.id)
    }
}

impl fmt::Display for PostCard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let post = self.post;
        writeln!(
            f,
            "#{} {} (@{}) · {} · {}{}",
            post.id,
            post.author.display_name(),
            post.author.username,
            relative_time(post.created_at, self.now),
            audience_label(post),
            if self.is_own() { " · yours" } else { "" },
        )?;

        if !post.text_content.is_empty() {
            writeln!(f, "{}", post.text_content)?;
        }

        let media = match post.media_type {
            Some(MediaType::Link) => post.media_url.as_deref().map(|url| ("link", url)),
            Some(MediaType::Photo) => post.media_file.as_deref().map(|url| ("photo", url)),
            Some(MediaType::Video) => post.media_file.as_deref().map(|url| ("video", url)),
            None => None,
        };
        if let Some((kind, url)) = media {
            writeln!(f, "[{}] {}", kind, url)?;
        }

        write!(
            f,
            "{} {}",
            if post.is_liked { "♥" } else { "♡" },
            post.likes_count
        )?;
        if !post.recent_likers.is_empty() {
            let names: Vec<&str> = post
                .recent_likers
                .iter()
                .map(|u| u.username.as_str())
                .collect();
            write!(f, " · liked by {}", names.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::models::{GroupRef, User};
    use chrono::Duration;

    fn user(id: i64, username: &str) -> User {
        User {
            id,
            username: username.to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            avatar: None,
            bio: String::new(),
            is_superuser: false,
        }
    }

    fn post(id: i64, author: User) -> Post {
        Post {
            id,
            author,
            content_type: Default::default(),
            text_content: "hello".to_string(),
            media_type: None,
            media_file: None,
            media_url: None,
            audience: Audience::Everyone,
            audience_groups: Vec::new(),
            audience_groups_detail: Vec::new(),
            likes_count: 2,
            is_liked: false,
            recent_likers: Vec::new(),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn test_begin_like_flips_state() {
        let mut p = post(1, user(1, "alice"));
        let pending = begin_like(&mut p);
        assert_eq!(pending.action, LikeAction::Like);
        assert!(p.is_liked);
        assert_eq!(p.likes_count, 3);

        let again = begin_like(&mut p);
        assert_eq!(again.action, LikeAction::Unlike);
        assert!(!p.is_liked);
        assert_eq!(p.likes_count, 2);
    }

    #[test]
    fn test_failed_toggle_rolls_back() {
        let mut p = post(1, user(1, "alice"));
        let pending = begin_like(&mut p);
        let result = complete_like(
            &mut p,
            pending,
            Err(api::ApiError::Status {
                status: api::StatusCode::INTERNAL_SERVER_ERROR,
                detail: None,
            }),
        );
        assert!(result.is_err());
        assert!(!p.is_liked);
        assert_eq!(p.likes_count, 2);
    }

    #[test]
    fn test_successful_toggle_adopts_server_state() {
        let mut p = post(1, user(1, "alice"));
        let pending = begin_like(&mut p);
        complete_like(
            &mut p,
            pending,
            Ok(LikeStatus {
                likes_count: 10,
                is_liked: true,
                recent_likers: vec![user(2, "bob")],
            }),
        )
        .unwrap();
        assert_eq!(p.likes_count, 10);
        assert_eq!(p.recent_likers[0].username, "bob");
    }

    #[test]
    fn test_audience_labels() {
        let mut p = post(1, user(1, "alice"));
        assert_eq!(audience_label(&p), "Everyone");
        p.audience = Audience::OnlyMe;
        assert_eq!(audience_label(&p), "Only me");
        p.audience = Audience::Groups;
        assert_eq!(audience_label(&p), "Groups");
        p.audience_groups_detail = vec![
            GroupRef {
                id: 1,
                name: "Family".to_string(),
            },
            GroupRef {
                id: 2,
                name: "Work".to_string(),
            },
        ];
        assert_eq!(audience_label(&p), "Family, Work");
    }

    #[test]
    fn test_relative_time() {
        let now = Utc::now();
        assert_eq!(relative_time(now, now), "just now");
        assert_eq!(relative_time(now + Duration::seconds(5), now), "just now");
        assert_eq!(relative_time(now - Duration::minutes(1), now), "1 minute ago");
        assert_eq!(relative_time(now - Duration::minutes(5), now), "5 minutes ago");
        assert_eq!(relative_time(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(relative_time(now - Duration::days(2), now), "2 days ago");
        assert_eq!(relative_time(now - Duration::days(65), now), "2 months ago");
        assert_eq!(relative_time(now - Duration::days(800), now), "2 years ago");
    }

    #[test]
    fn test_card_marks_own_posts() {
        let p = post(5, user(1, "alice"));
        let card = PostCard::at(&p, Some(1), p.created_at);
        assert!(card.is_own());
        let text = card.to_string();
        assert!(text.starts_with("#5 alice (@alice) · just now · Everyone · yours"));
        assert!(text.ends_with("♡ 2"));
        assert!(!PostCard::at(&p, Some(2), p.created_at).is_own());
    }
}
