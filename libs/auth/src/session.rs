//! Client-side session state
//!
//! [`SessionManager`] owns the signed-in user and the persisted token pair.
//! It is created once at startup, passed explicitly to every page, and only
//! changes through its own methods.

use api::models::{LoginCredentials, NewUser, User};
use api::{ApiClient, Services};
use common::TokenStore;
use tracing::{info, warn};

use crate::error::AuthResult;
use crate::validation;

/// Session manager for the signed-in user
pub struct SessionManager {
    services: Services,
    tokens: TokenStore,
    user: Option<User>,
    loading: bool,
}

impl SessionManager {
    /// Create a session over `client`; call [`init`](Self::init) before use
    pub fn new(client: ApiClient) -> Self {
        Self {
            tokens: client.tokens().clone(),
            services: Services::new(client),
            user: None,
            loading: true,
        }
    }

    /// Restore the session from stored tokens
    ///
    /// A stored access token that no longer yields a user is discarded along
    /// with its refresh token.
    pub async fn init(&mut self) -> AuthResult<()> {
        self.loading = true;
        let result = self.load_user().await;
        self.loading = false;
        result
    }

    async fn load_user(&mut self) -> AuthResult<()> {
        if self.tokens.access_token()?.is_none() {
            self.user = None;
            return Ok(());
        }

        match self.services.auth.current_user().await {
            Ok(user) => {
                info!("Session restored for {}", user.username);
                self.user = Some(user);
            }
            Err(e) => {
                warn!("Failed to load current user, clearing tokens: {}", e);
                self.tokens.clear()?;
                self.user = None;
            }
        }
        Ok(())
    }

    /// Sign in, persist the token pair and load the user
    pub async fn login(&mut self, email: &str, password: &str) -> AuthResult<&User> {
        let credentials = LoginCredentials {
            email: email.trim().to_string(),
            password: password.to_string(),
        };
        validation::login_form(&credentials)?;

        let pair = self.services.auth.login(&credentials).await?;
        self.tokens.save(&pair)?;

        let user = match self.services.auth.current_user().await {
            Ok(user) => user,
            Err(e) => {
                self.tokens.clear()?;
                return Err(e.into());
            }
        };
        info!("Logged in as {}", user.username);
        Ok(&*self.user.insert(user))
    }

    /// Create an account and sign in with the tokens it comes with
    pub async fn register(&mut self, form: &NewUser) -> AuthResult<&User> {
        validation::registration_form(form)?;

        let registration = self.services.auth.register(form).await?;
        self.tokens.save(&registration.tokens)?;

        info!("Registered {}", registration.user.username);
        Ok(&*self.user.insert(registration.user))
    }

    /// Sign out locally; the server-side logout is best effort
    pub async fn logout(&mut self) -> AuthResult<()> {
        if let Some(refresh) = self.tokens.refresh_token()? {
            if let Err(e) = self.services.auth.logout(&refresh).await {
                warn!("Server logout failed, signing out locally: {}", e);
            }
        }
        self.tokens.clear()?;
        if let Some(user) = self.user.take() {
            info!("Logged out {}", user.username);
        }
        Ok(())
    }

    /// Replace the cached user, e.g. after a profile update
    pub fn update_user(&mut self, user: User) {
        self.user = Some(user);
    }

    /// Forget the user after the client ended the session
    pub fn expire(&mut self) {
        if self.user.take().is_some() {
            info!("Session expired");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn services(&self) -> &Services {
        &self.services
    }
}
