//! Friend group endpoints

use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{AddMember, FriendGroup, GroupId, GroupName, Page, User, UserId};
use crate::request::ApiRequest;

/// Friend group service
#[derive(Clone, Debug)]
pub struct GroupService {
    client: ApiClient,
}

impl GroupService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Groups owned by the current user
    pub async fn list(&self) -> ApiResult<Vec<FriendGroup>> {
        let page: Page<FriendGroup> = self
            .client
            .send_json(ApiRequest::get("/friend-groups/"))
            .await?;
        Ok(page.results)
    }

    pub async fn get(&self, group_id: GroupId) -> ApiResult<FriendGroup> {
        self.client
            .send_json(ApiRequest::get(format!("/friend-groups/{}/", group_id)))
            .await
    }

    pub async fn create(&self, name: &str) -> ApiResult<FriendGroup> {
        info!("Creating friend group {}", name);
        let request = ApiRequest::post("/friend-groups/").json(&GroupName {
            name: name.to_string(),
        })?;
        self.client.send_json(request).await
    }

    pub async fn rename(&self, group_id: GroupId, name: &str) -> ApiResult<FriendGroup> {
        let request =
            ApiRequest::patch(format!("/friend-groups/{}/", group_id)).json(&GroupName {
                name: name.to_string(),
            })?;
        self.client.send_json(request).await
    }

    pub async fn delete(&self, group_id: GroupId) -> ApiResult<()> {
        info!("Deleting friend group {}", group_id);
        self.client
            .send_empty(ApiRequest::delete(format!("/friend-groups/{}/", group_id)))
            .await
    }

    pub async fn members(&self, group_id: GroupId) -> ApiResult<Vec<User>> {
        let page: Page<User> = self
            .client
            .send_json(ApiRequest::get(format!(
                "/friend-groups/{}/members/",
                group_id
            )))
            .await?;
        Ok(page.results)
    }

    pub async fn add_member(&self, group_id: GroupId, user_id: UserId) -> ApiResult<()> {
        let request = ApiRequest::post(format!("/friend-groups/{}/members/add/", group_id))
            .json(&AddMember { user_id })?;
        self.client.send_empty(request).await
    }

    pub async fn remove_member(&self, group_id: GroupId, user_id: UserId) -> ApiResult<()> {
        self.client
            .send_empty(ApiRequest::delete(format!(
                "/friend-groups/{}/members/{}/",
                group_id, user_id
            )))
            .await
    }
}
