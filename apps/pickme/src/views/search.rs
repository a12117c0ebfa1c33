//! User search page

use std::fmt;

use api::Services;
use api::models::User;
use auth::validation;
use common::FieldErrors;

use crate::error::AppResult;

pub(crate) fn check_search_query(query: &str) -> Result<String, FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check("q", validation::validate_search_query(query));
    errors.into_result()?;
    Ok(query.trim().to_string())
}

/// User search page
#[derive(Default)]
pub struct SearchPage {
    pub query: String,
    pub results: Vec<User>,
    has_searched: bool,
}

impl SearchPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn search(&mut self, services: &Services, query: &str) -> AppResult<&[User]> {
        self.query = check_search_query(query)?;
        self.has_searched = true;
        self.results.clear();
        self.results = services.users.search(&self.query).await?;
        Ok(&self.results)
    }

    pub fn has_searched(&self) -> bool {
        self.has_searched
    }
}

impl fmt::Display for SearchPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.has_searched && self.results.is_empty() {
            return writeln!(f, "Nobody matches \"{}\"", self.query);
        }
        for user in &self.results {
            writeln!(f, "#{} {} (@{})", user.id, user.display_name(), user.username)?;
        }
        Ok(())
    }
}
