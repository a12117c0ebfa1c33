//! Single post page with its edit mode

use api::models::{Audience, FriendGroup, GroupId, Post, PostId, UpdatePost, UserId};
use api::Services;
use auth::validation;
use common::FieldErrors;
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::views::post_card;

/// Editable fields of an existing post
#[derive(Debug, Clone, PartialEq)]
pub struct EditPostForm {
    pub text: String,
    pub audience: Audience,
    selected_groups: Vec<GroupId>,
}

impl EditPostForm {
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text_content.clone(),
            audience: post.audience,
            selected_groups: post.audience_groups.clone(),
        }
    }

    pub fn toggle_group(&mut self, group_id: GroupId) {
        match self.selected_groups.iter().position(|g| *g == group_id) {
            Some(index) => {
                self.selected_groups.remove(index);
            }
            None => self.selected_groups.push(group_id),
        }
    }

    pub fn selected_groups(&self) -> &[GroupId] {
        &self.selected_groups
    }

    pub fn to_update(&self, post: &Post) -> Result<UpdatePost, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.check(
            "text_content",
            validation::validate_post_text(post.content_type, &self.text),
        );
        errors.check(
            "audience_groups",
            validation::validate_audience_groups(self.audience, &self.selected_groups),
        );
        errors.into_result()?;

        Ok(UpdatePost {
            text_content: Some(self.text.clone()),
            audience: Some(self.audience),
            audience_groups: Some(self.selected_groups.clone()),
        })
    }
}

pub struct PostDetailPage {
    pub post: Post,
    /// The viewer's groups, offered as audiences while editing
    pub groups: Vec<FriendGroup>,
    editing: Option<EditPostForm>,
}

impl PostDetailPage {
    pub async fn load(services: &Services, post_id: PostId) -> AppResult<Self> {
        let post = services.posts.get(post_id).await?;
        let groups = services.groups.list().await?;
        Ok(Self {
            post,
            groups,
            editing: None,
        })
    }

    pub fn is_own(&self, viewer: Option<UserId>) -> bool {
        viewer == Some(self.post.author.id)
    }

    /// Enter edit mode, starting from the current post
    pub fn start_edit(&mut self, viewer: Option<UserId>) -> AppResult<&mut EditPostForm> {
        if !self.is_own(viewer) {
            return Err(AppError::Forbidden("Only your own posts can be edited"));
        }
        Ok(self.editing.insert(EditPostForm::from_post(&self.post)))
    }

    pub fn editing(&self) -> Option<&EditPostForm> {
        self.editing.as_ref()
    }

    /// Save the edit form; invalid forms never reach the server
    pub async fn save(&mut self, services: &Services) -> AppResult<()> {
        let Some(form) = &self.editing else {
            return Ok(());
        };
        let update = form.to_update(&self.post)?;

        self.post = services.posts.update(self.post.id, &update).await?;
        self.editing = None;
        info!("Post {} updated", self.post.id);
        Ok(())
    }

    pub async fn toggle_like(&mut self, services: &Services) -> AppResult<()> {
        Ok(post_card::toggle_like(&services.posts, &mut self.post).await?)
    }

    pub async fn delete(self, services: &Services, viewer: Option<UserId>) -> AppResult<()> {
        if !self.is_own(viewer) {
            return Err(AppError::Forbidden("Only your own posts can be deleted"));
        }
        services.posts.delete(self.post.id).await?;
        info!("Post {} deleted", self.post.id);
        Ok(())
    }
}
