//! Authentication endpoints

use common::TokenPair;
use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{LoginCredentials, NewUser, RefreshTokenRequest, Registration, User};
use crate::request::ApiRequest;

/// Authentication service
#[derive(Clone, Debug)]
pub struct AuthService {
    client: ApiClient,
}

impl AuthService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Exchange credentials for a token pair
    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<TokenPair> {
        info!("Login attempt for {}", credentials.email);
        let request = ApiRequest::post("/auth/login/").json(credentials)?;
        self.client.send_json(request).await
    }

    /// Create an account; the response carries the new user and its tokens
    pub async fn register(&self, new_user: &NewUser) -> ApiResult<Registration> {
        info!("Registering {}", new_user.username);
        let request = ApiRequest::post("/auth/register/").json(new_user)?;
        self.client.send_json(request).await
    }

    /// Invalidate a refresh token on the server
    pub async fn logout(&self, refresh_token: &str) -> ApiResult<()> {
        let request = ApiRequest::post("/auth/logout/").json(&RefreshTokenRequest {
            refresh: refresh_token.to_string(),
        })?;
        self.client.send_empty(request).await
    }

    /// The user the stored access token belongs to
    pub async fn current_user(&self) -> ApiResult<User> {
        self.client.send_json(ApiRequest::get("/users/me/")).await
    }
}
