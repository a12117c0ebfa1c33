//! Profile page and profile editing

use std::fmt;
use std::path::Path;

use api::models::{UpdateUser, User, UserId};
use api::{Services, Upload};
use auth::{SessionManager, validation};
use common::FieldErrors;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::views::post_list::PostList;

/// A user's header plus their posts
pub struct ProfilePage {
    pub user: User,
    pub is_own: bool,
    pub posts: PostList,
}

impl ProfilePage {
    pub async fn load(
        services: &Services,
        user_id: UserId,
        viewer: Option<UserId>,
    ) -> AppResult<Self> {
        let user = services.users.get(user_id).await?;
        let mut posts = PostList::by_user(services.posts.clone(), user_id);
        posts.load().await?;
        Ok(Self {
            is_own: viewer == Some(user.id),
            user,
            posts,
        })
    }
}

impl fmt::Display for ProfilePage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} (@{})", self.user.display_name(), self.user.username)?;
        if !self.user.bio.is_empty() {
            writeln!(f, "{}", self.user.bio)?;
        }
        if let Some(avatar) = &self.user.avatar {
            writeln!(f, "avatar: {}", avatar)?;
        }
        if self.is_own {
            writeln!(f, "(this is you)")?;
        }
        writeln!(f)?;
        write!(f, "{}", self.posts.render(Some(self.user.id).filter(|_| self.is_own)))
    }
}

/// Editable profile fields
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ProfileForm {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
}

impl ProfileForm {
    pub fn from_user(user: &User) -> Self {
        Self {
            username: user.username.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            bio: user.bio.clone(),
        }
    }

    pub fn to_update(&self) -> Result<UpdateUser, FieldErrors> {
        let update = UpdateUser {
            username: Some(self.username.trim().to_string()),
            first_name: Some(self.first_name.trim().to_string()),
            last_name: Some(self.last_name.trim().to_string()),
            bio: Some(self.bio.clone()),
        };
        validation::profile_form(self.username.trim(), &update)?;
        Ok(update)
    }
}

/// Edit page for the signed-in user's own profile
pub struct EditProfilePage {
    pub form: ProfileForm,
    /// Avatar currently shown; a local preview while an upload is running
    avatar: Option<String>,
}

impl EditProfilePage {
    pub fn open(session: &SessionManager) -> AppResult<Self> {
        let user = session.user().ok_or(AppError::NotSignedIn)?;
        Ok(Self {
            form: ProfileForm::from_user(user),
            avatar: user.avatar.clone(),
        })
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    /// Save the form and refresh the session's user
    pub async fn save(&self, session: &mut SessionManager) -> AppResult<User> {
        let user_id = session.user_id().ok_or(AppError::NotSignedIn)?;
        let update = self.form.to_update()?;

        let user = session.services().users.update(user_id, &update).await?;
        info!("Profile of {} updated", user.username);
        session.update_user(user.clone());
        Ok(user)
    }

    /// Upload a new avatar read from `path`
    pub async fn upload_avatar_file(
        &mut self,
        session: &mut SessionManager,
        path: &Path,
    ) -> AppResult<User> {
        let upload = Upload::from_path(path).map_err(|source| AppError::File {
            path: path.display().to_string(),
            source,
        })?;
        self.upload_avatar(session, upload).await
    }

    /// Show `upload` right away; put the previous avatar back if the upload fails
    pub async fn upload_avatar(
        &mut self,
        session: &mut SessionManager,
        upload: Upload,
    ) -> AppResult<User> {
        let user_id = session.user_id().ok_or(AppError::NotSignedIn)?;
        if !upload.is_image() {
            let mut errors = FieldErrors::new();
            errors.add("avatar", "Choose an image file");
            return Err(errors.into());
        }

        let previous = self.avatar.replace(format!("file://{}", upload.file_name));
        match session.services().users.upload_avatar(user_id, upload).await {
            Ok(user) => {
                self.avatar = user.avatar.clone();
                session.update_user(user.clone());
                Ok(user)
            }
            Err(e) => {
                warn!("Avatar upload failed, restoring previous avatar: {}", e);
                self.avatar = previous;
                Err(e.into())
            }
        }
    }
}
