//! User profile endpoints

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{Page, UpdateUser, User, UserId};
use crate::request::{ApiRequest, FormField, Upload};

/// User service
#[derive(Clone, Debug)]
pub struct UserService {
    client: ApiClient,
}

impl UserService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn get(&self, user_id: UserId) -> ApiResult<User> {
        self.client
            .send_json(ApiRequest::get(format!("/users/{}/", user_id)))
            .await
    }

    /// Patch profile fields, returning the updated user
    pub async fn update(&self, user_id: UserId, update: &UpdateUser) -> ApiResult<User> {
        let request = ApiRequest::patch(format!("/users/{}/update/", user_id)).json(update)?;
        self.client.send_json(request).await
    }

    /// Replace the avatar image, returning the updated user
    pub async fn upload_avatar(&self, user_id: UserId, avatar: Upload) -> ApiResult<User> {
        let request = ApiRequest::post(format!("/users/{}/avatar/", user_id))
            .multipart(vec![FormField::file("avatar", avatar)]);
        self.client.send_json(request).await
    }

    /// Users whose name or username matches `query`
    pub async fn search(&self, query: &str) -> ApiResult<Vec<User>> {
        let request = ApiRequest::get("/users/search/").query("q", query);
        let page: Page<User> = self.client.send_json(request).await?;
        Ok(page.results)
    }
}
