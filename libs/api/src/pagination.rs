//! Fetch-more list loading
//!
//! [`Paginator`] wraps any page-fetching function. Page 1 replaces the
//! list, later pages are appended, and "has more" follows the envelope's
//! `next` link. Loads take `&mut self`, so two loads on the same list can
//! never overlap.

use std::collections::HashSet;
use std::future::Future;

use tracing::{debug, error};

use crate::error::ApiResult;
use crate::models::{Identified, Page};

pub struct Paginator<T, F> {
    fetch: F,
    items: Vec<T>,
    /// Page the next `load_more` asks for
    next_page: u32,
    has_more: bool,
    loaded: bool,
}

impl<T, F, Fut> Paginator<T, F>
where
    T: Identified,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = ApiResult<Page<T>>>,
{
    pub fn new(fetch: F) -> Self {
        Self {
            fetch,
            items: Vec::new(),
            next_page: 1,
            has_more: true,
            loaded: false,
        }
    }

    /// Load page 1, replacing whatever is shown
    pub async fn load_first(&mut self) -> ApiResult<()> {
        let page = self.fetch_page(1).await?;
        self.has_more = page.has_next();
        self.items = page.results;
        self.next_page = 2;
        self.loaded = true;
        Ok(())
    }

    /// Append the next page; returns `false` when there was nothing to load
    ///
    /// Items already in the list are skipped, so a post that moved across a
    /// page boundary between two loads is not shown twice.
    pub async fn load_more(&mut self) -> ApiResult<bool> {
        if !self.loaded {
            self.load_first().await?;
            return Ok(true);
        }
        if !self.has_more {
            return Ok(false);
        }

        let page_number = self.next_page;
        let page = self.fetch_page(page_number).await?;
        self.has_more = page.has_next();
        self.next_page = page_number + 1;

        let seen: HashSet<i64> = self.items.iter().map(Identified::id).collect();
        self.items
            .extend(page.results.into_iter().filter(|item| !seen.contains(&item.id())));
        Ok(true)
    }

    async fn fetch_page(&mut self, page: u32) -> ApiResult<Page<T>> {
        debug!("Loading page {}", page);
        (self.fetch)(page).await.inspect_err(|e| {
            error!("Error loading page {}: {}", page, e);
        })
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn get_mut(&mut self, id: i64) -> Option<&mut T> {
        self.items.iter_mut().find(|item| item.id() == id)
    }

    /// Drop an item locally, e.g. after it was deleted on the server
    pub fn remove(&mut self, id: i64) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Whether page 1 has been loaded at least once
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
