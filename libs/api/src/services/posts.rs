//! Post endpoints

use tracing::info;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::models::{
    ContentType, LikeStatus, NewMedia, NewPost, Page, Post, PostId, UpdatePost, UserId,
};
use crate::request::{ApiRequest, FormField};

/// Post service
#[derive(Clone, Debug)]
pub struct PostService {
    client: ApiClient,
}

impl PostService {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// One page of the feed, 1-based
    pub async fn list(&self, page: u32) -> ApiResult<Page<Post>> {
        self.client
            .send_json(ApiRequest::get("/posts/").query("page", page))
            .await
    }

    /// One page of a single author's posts, 1-based
    pub async fn list_by_user(&self, user_id: UserId, page: u32) -> ApiResult<Page<Post>> {
        self.client
            .send_json(ApiRequest::get(format!("/posts/user/{}/", user_id)).query("page", page))
            .await
    }

    pub async fn get(&self, post_id: PostId) -> ApiResult<Post> {
        self.client
            .send_json(ApiRequest::get(format!("/posts/{}/", post_id)))
            .await
    }

    /// Publish a post as multipart form data
    pub async fn create(&self, post: &NewPost) -> ApiResult<Post> {
        info!(
            "Creating {} post for audience {}",
            post.content_type.as_str(),
            post.audience.as_str()
        );
        let request = ApiRequest::post("/posts/").multipart(new_post_fields(post));
        self.client.send_json(request).await
    }

    pub async fn update(&self, post_id: PostId, update: &UpdatePost) -> ApiResult<Post> {
        let request = ApiRequest::patch(format!("/posts/{}/", post_id)).json(update)?;
        self.client.send_json(request).await
    }

    pub async fn delete(&self, post_id: PostId) -> ApiResult<()> {
        info!("Deleting post {}", post_id);
        self.client
            .send_empty(ApiRequest::delete(format!("/posts/{}/", post_id)))
            .await
    }

    pub async fn like(&self, post_id: PostId) -> ApiResult<LikeStatus> {
        self.client
            .send_json(ApiRequest::post(format!("/posts/{}/like/", post_id)))
            .await
    }

    pub async fn unlike(&self, post_id: PostId) -> ApiResult<LikeStatus> {
        self.client
            .send_json(ApiRequest::delete(format!("/posts/{}/like/", post_id)))
            .await
    }
}

/// Form fields for a new post; `audience_groups` repeats once per group
pub(crate) fn new_post_fields(post: &NewPost) -> Vec<FormField> {
    let mut fields = vec![
        FormField::text("content_type", post.content_type.as_str()),
        FormField::text("text_content", post.text_content.clone()),
        FormField::text("audience_type", post.audience.as_str()),
    ];
    for group_id in &post.audience_groups {
        fields.push(FormField::text("audience_groups", group_id.to_string()));
    }

    if post.content_type == ContentType::Media {
        if let Some(media) = &post.media {
            fields.push(FormField::text("media_type", media.media_type().as_str()));
            match media {
                NewMedia::Link(url) => fields.push(FormField::text("media_url", url.clone())),
                NewMedia::Photo(upload) | NewMedia::Video(upload) => {
                    fields.push(FormField::file("media_file", upload.clone()))
                }
            }
        }
    }

    fields
}
