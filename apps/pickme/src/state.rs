//! Application state shared across pages

use api::models::User;
use api::{ApiClient, ErrorKind, Services};
use auth::SessionManager;
use common::{ClientConfig, TokenStore};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::notify::Notifications;
use crate::router::{Navigator, Route, SessionSignal};

/// Everything a page needs: the session, navigation and the notice area
pub struct AppState {
    pub session: SessionManager,
    pub navigator: Navigator,
    pub notices: Notifications,
    signal: SessionSignal,
}

impl AppState {
    /// Wire the API client's session-expired hook to the navigator
    pub fn new(config: ClientConfig, tokens: TokenStore) -> AppResult<Self> {
        let signal = SessionSignal::new();
        let hook = signal.clone();
        let client = ApiClient::builder(config, tokens)
            .on_session_expired(move || hook.raise())
            .build()?;

        Ok(Self {
            session: SessionManager::new(client),
            navigator: Navigator::new(Route::Feed),
            notices: Notifications::new(),
            signal,
        })
    }

    /// Restore the session and land on `start`, gated by the result
    pub async fn init(&mut self, start: Route) -> AppResult<Route> {
        self.session.init().await?;
        self.signal.take();
        let route = self.navigator.navigate(start, self.session.is_authenticated());
        info!("Starting at {}", route);
        Ok(route)
    }

    pub fn services(&self) -> &Services {
        self.session.services()
    }

    /// The signed-in user
    pub fn viewer(&self) -> AppResult<&User> {
        self.session.user().ok_or(AppError::NotSignedIn)
    }

    pub fn viewer_id(&self) -> Option<i64> {
        self.session.user_id()
    }

    pub fn navigate(&mut self, route: Route) -> Route {
        self.sync_session();
        self.navigator.navigate(route, self.session.is_authenticated())
    }

    /// Apply a session expiry raised by the client since the last check
    pub fn sync_session(&mut self) -> bool {
        if !self.signal.take() {
            return false;
        }
        self.session.expire();
        self.navigator.to_login();
        self.notices.error("Session expired, please sign in again");
        true
    }

    /// Post-process the outcome of a page action
    ///
    /// Follows a session expiry to the login page and reports any error in
    /// the notice area. A `success` message is shown on `Ok`.
    pub fn settle<T>(
        &mut self,
        result: AppResult<T>,
        success: Option<&str>,
        fallback: &str,
    ) -> AppResult<T> {
        let expired = self.sync_session();
        match &result {
            Ok(_) => {
                if let Some(message) = success {
                    self.notices.success(message);
                }
            }
            Err(e) if expired && e.kind() == ErrorKind::Authorization => {}
            Err(e) => self.notices.report(e, fallback),
        }
        result
    }
}
