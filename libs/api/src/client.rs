//! Authenticated request pipeline
//!
//! Every request goes out with `Authorization: Bearer <access token>` when a
//! token is stored. A 401 answer triggers exactly one refresh-and-replay:
//!
//! 1. the refresh token is exchanged at `/auth/refresh/` (outside this
//!    pipeline, without a bearer header),
//! 2. on success the new access token is stored and the original request is
//!    sent again once; whatever that replay returns is final,
//! 3. on failure both tokens are cleared and the session-expired hook fires,
//!    and the caller gets the original 401.
//!
//! Concurrent requests that 401 at the same time each refresh on their own;
//! refreshes are not coalesced.

use std::sync::Arc;

use common::{ClientConfig, TokenStore};
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ApiResult};
use crate::models::{RefreshTokenRequest, RefreshTokenResponse};
use crate::request::ApiRequest;

/// Path of the token refresh endpoint, relative to the API base URL
pub const REFRESH_PATH: &str = "/auth/refresh/";

/// Called after a failed refresh has cleared the stored tokens
pub type SessionExpiredHook = Arc<dyn Fn() + Send + Sync>;

struct ClientInner {
    http: Client,
    base_url: String,
    tokens: TokenStore,
    on_session_expired: Option<SessionExpiredHook>,
}

/// REST API client; cheap to clone
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url)
            .finish_non_exhaustive()
    }
}

/// Builder for [`ApiClient`]
pub struct ApiClientBuilder {
    config: ClientConfig,
    tokens: TokenStore,
    on_session_expired: Option<SessionExpiredHook>,
}

impl ApiClientBuilder {
    /// Register the hook that sends the user back to the login entry point
    pub fn on_session_expired(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_session_expired = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> ApiResult<ApiClient> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(self.config.request_timeout())
            .default_headers(headers)
            .build()?;

        info!("API client initialized with base URL: {}", self.config.api_url);

        Ok(ApiClient {
            inner: Arc::new(ClientInner {
                http,
                base_url: self.config.api_url,
                tokens: self.tokens,
                on_session_expired: self.on_session_expired,
            }),
        })
    }
}

impl ApiClient {
    pub fn builder(config: ClientConfig, tokens: TokenStore) -> ApiClientBuilder {
        ApiClientBuilder {
            config,
            tokens,
            on_session_expired: None,
        }
    }

    /// Client without a session-expired hook
    pub fn new(config: ClientConfig, tokens: TokenStore) -> ApiResult<Self> {
        Self::builder(config, tokens).build()
    }

    pub fn tokens(&self) -> &TokenStore {
        &self.inner.tokens
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Send a request through the pipeline, returning the successful response
    pub async fn send(&self, request: ApiRequest) -> ApiResult<Response> {
        let access = self.inner.tokens.access_token()?;
        let response = self.dispatch(&request, access.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED {
            return ensure_success(response).await;
        }

        // The replay below never comes back here, so a request is retried at most once.
        let Some(refresh) = self.inner.tokens.refresh_token()? else {
            debug!("401 without a refresh token for {}", request.path());
            return Err(ApiError::from_response(response).await);
        };

        match self.refresh_access_token(&refresh).await {
            Ok(access) => {
                self.inner.tokens.set_access_token(&access)?;
                debug!("Replaying {} {}", request.method(), request.path());
                let replay = self.dispatch(&request, Some(&access)).await?;
                ensure_success(replay).await
            }
            Err(e) => {
                warn!("Token refresh failed, ending session: {}", e);
                self.inner.tokens.clear()?;
                self.expire_session();
                Err(ApiError::from_response(response).await)
            }
        }
    }

    /// Send a request and decode the JSON body
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> ApiResult<T> {
        let response = self.send(request).await?;
        Ok(response.json::<T>().await?)
    }

    /// Send a request whose response body is irrelevant
    pub async fn send_empty(&self, request: ApiRequest) -> ApiResult<()> {
        self.send(request).await?;
        Ok(())
    }

    async fn dispatch(&self, request: &ApiRequest, access: Option<&str>) -> ApiResult<Response> {
        debug!("{} {}", request.method(), request.path());
        let builder = request.build(&self.inner.http, &self.inner.base_url, access)?;
        Ok(builder.send().await?)
    }

    async fn refresh_access_token(&self, refresh: &str) -> ApiResult<String> {
        info!("Access token rejected, refreshing");

        let response = self
            .inner
            .http
            .post(format!("{}{}", self.inner.base_url, REFRESH_PATH))
            .json(&RefreshTokenRequest {
                refresh: refresh.to_string(),
            })
            .send()
            .await?;
        let response = ensure_success(response).await?;
        let body: RefreshTokenResponse = response.json().await?;

        info!("Access token refreshed");
        Ok(body.access)
    }

    fn expire_session(&self) {
        if let Some(hook) = &self.inner.on_session_expired {
            hook();
        }
    }
}

async fn ensure_success(response: Response) -> ApiResult<Response> {
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(ApiError::from_response(response).await)
    }
}
