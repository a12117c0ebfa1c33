//! Paged response envelope

use serde::{Deserialize, Serialize};

/// Anything with a stable numeric id
pub trait Identified {
    fn id(&self) -> i64;
}

/// One page of a list endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Total number of items across all pages, when the server reports it
    #[serde(default)]
    pub count: Option<u64>,
    /// URL of the next page; `None` on the last page
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub previous: Option<String>,
    #[serde(default = "Vec::new")]
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// Whether the server advertised a following page
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            count: None,
            next: None,
            previous: None,
            results: Vec::new(),
        }
    }
}
