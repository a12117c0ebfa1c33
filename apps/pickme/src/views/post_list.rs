//! Paginated post list shared by the feed and profile pages

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use api::models::{LikeStatus, Page, Post, PostId, UserId};
use api::{ApiResult, Paginator, PostService};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::views::post_card::{self, PendingLike, PostCard};

type PageFuture = Pin<Box<dyn Future<Output = ApiResult<Page<Post>>> + Send>>;
type PageFetch = Box<dyn FnMut(u32) -> PageFuture + Send>;

/// Posts loaded page by page from one list endpoint
pub struct PostList {
    posts: PostService,
    pages: Paginator<Post, PageFetch>,
}

impl PostList {
    /// Every post visible to the viewer, newest first
    pub fn feed(posts: PostService) -> Self {
        let service = posts.clone();
        Self::with_fetch(
            posts,
            Box::new(move |page| -> PageFuture {
                let service = service.clone();
                Box::pin(async move { service.list(page).await })
            }),
        )
    }

    /// Posts of a single author
    pub fn by_user(posts: PostService, user_id: UserId) -> Self {
        let service = posts.clone();
        Self::with_fetch(
            posts,
            Box::new(move |page| -> PageFuture {
                let service = service.clone();
                Box::pin(async move { service.list_by_user(user_id, page).await })
            }),
        )
    }

    fn with_fetch(posts: PostService, fetch: PageFetch) -> Self {
        Self {
            posts,
            pages: Paginator::new(fetch),
        }
    }

    /// Load page 1, replacing the list
    pub async fn load(&mut self) -> ApiResult<()> {
        self.pages.load_first().await
    }

    /// Append the next page; `false` when there was none
    pub async fn load_more(&mut self) -> ApiResult<bool> {
        self.pages.load_more().await
    }

    pub fn posts(&self) -> &[Post] {
        self.pages.items()
    }

    pub fn get(&self, post_id: PostId) -> Option<&Post> {
        self.posts().iter().find(|p| p.id == post_id)
    }

    pub fn has_more(&self) -> bool {
        self.pages.has_more()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Flip the like state of a listed post
    pub fn begin_like(&mut self, post_id: PostId) -> Option<PendingLike> {
        self.pages.get_mut(post_id).map(post_card::begin_like)
    }

    /// Apply the outcome of a toggle; a post removed meanwhile is skipped
    pub fn complete_like(
        &mut self,
        pending: PendingLike,
        result: ApiResult<LikeStatus>,
    ) -> ApiResult<()> {
        match self.pages.get_mut(pending.post_id) {
            Some(post) => post_card::complete_like(post, pending, result),
            None => result.map(|_| ()),
        }
    }

    pub async fn toggle_like(&mut self, post_id: PostId) -> AppResult<()> {
        let Some(pending) = self.begin_like(post_id) else {
            return Ok(());
        };
        let result = post_card::send_like(&self.posts, &pending).await;
        Ok(self.complete_like(pending, result)?)
    }

    /// Delete one of the viewer's own posts and drop it from the list
    pub async fn delete(&mut self, post_id: PostId, viewer: UserId) -> AppResult<()> {
        let own = self
            .get(post_id)
            .is_some_and(|p| p.author.id == viewer);
        if !own {
            return Err(AppError::Forbidden("Only your own posts can be deleted"));
        }

        self.posts.delete(post_id).await?;
        self.pages.remove(post_id);
        info!("Post {} deleted", post_id);
        Ok(())
    }

    /// Display form of the list for `viewer`
    pub fn render(&self, viewer: Option<UserId>) -> RenderedList<'_> {
        RenderedList { list: self, viewer }
    }
}

pub struct RenderedList<'a> {
    list: &'a PostList,
    viewer: Option<UserId>,
}

impl fmt::Display for RenderedList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.list.is_empty() {
            return writeln!(f, "No posts to show");
        }
        for post in self.list.posts() {
            writeln!(f, "{}", PostCard::new(post, self.viewer))?;
            writeln!(f)?;
        }
        if self.list.has_more() {
            writeln!(f, "(more posts available)")?;
        }
        Ok(())
    }
}
