//! New post form

use std::path::Path;

use api::models::{
    Audience, ContentType, FriendGroup, GroupId, MediaType, NewMedia, NewPost, Post,
};
use api::{ErrorKind, Services, Upload};
use auth::validation;
use common::FieldErrors;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};

/// Form state of the create page
#[derive(Debug, Clone, Default)]
pub struct CreatePostForm {
    pub content_type: ContentType,
    pub text: String,
    pub media_type: Option<MediaType>,
    pub media_url: String,
    pub media_file: Option<Upload>,
    pub audience: Audience,
    selected_groups: Vec<GroupId>,
}

impl CreatePostForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a group, or deselect it when already selected
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

    /// Read the photo or video to upload from disk
    pub fn attach_file(&mut self, path: &Path) -> AppResult<()> {
        let upload = Upload::from_path(path).map_err(|source| AppError::File {
            path: path.display().to_string(),
            source,
        })?;
        self.media_file = Some(upload);
        Ok(())
    }

    /// Check the form and build the payload
    pub fn to_new_post(&self) -> Result<NewPost, FieldErrors> {
        let mut errors = FieldErrors::new();

        let media = match self.content_type {
            ContentType::Text => None,
            ContentType::Media => self.media(&mut errors),
        };

        let post = NewPost {
            content_type: self.content_type,
            text_content: self.text.trim().to_string(),
            audience: self.audience,
            audience_groups: match self.audience {
                Audience::Groups => self.selected_groups.clone(),
                _ => Vec::new(),
            },
            media,
        };

        if let Err(rules) = validation::post_form(&post) {
            for (field, message) in rules.iter() {
                // A chosen type whose file was rejected is reported as media_file
                if field == "media_type" && self.media_type.is_some() {
                    continue;
                }
                errors.add(field, message);
            }
        }

        errors.into_result().map(|_| post)
    }

    fn media(&self, errors: &mut FieldErrors) -> Option<NewMedia> {
        let media_type = self.media_type?;
        if media_type == MediaType::Link {
            return Some(NewMedia::Link(self.media_url.trim().to_string()));
        }

        let Some(upload) = &self.media_file else {
            errors.add("media_file", "Choose a file to upload");
            return None;
        };
        match media_type {
            MediaType::Photo if upload.is_image() => Some(NewMedia::Photo(upload.clone())),
            MediaType::Video if upload.is_video() => Some(NewMedia::Video(upload.clone())),
            MediaType::Photo => {
                errors.add("media_file", "Choose an image file");
                None
            }
            _ => {
                errors.add("media_file", "Choose a video file");
                None
            }
        }
    }
}

/// The create page: the form plus the viewer's groups to pick from
pub struct CreatePostPage {
    pub form: CreatePostForm,
    pub groups: Vec<FriendGroup>,
}

impl CreatePostPage {
    /// Open the page; the group picker stays empty if the groups can't be fetched
    pub async fn load(services: &Services) -> AppResult<Self> {
        let groups = match services.groups.list().await {
            Ok(groups) => groups,
            Err(e) if e.kind() == ErrorKind::Authorization => return Err(e.into()),
            Err(e) => {
                warn!("Failed to load friend groups: {}", e);
                Vec::new()
            }
        };
        Ok(Self {
            form: CreatePostForm::new(),
            groups,
        })
    }

    /// Publish the post; invalid forms never reach the server
    pub async fn submit(&self, services: &Services) -> AppResult<Post> {
        let new_post = self.form.to_new_post()?;
        let post = services.posts.create(&new_post).await?;
        info!("Published post {}", post.id);
        Ok(post)
    }
}
