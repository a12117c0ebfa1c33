//! Input validation utilities
//!
//! Field rules return `Err(message)`; form rules collect them into
//! [`FieldErrors`] keyed by the wire field name, so local and server errors
//! are shown the same way.

use api::models::{Audience, ContentType, LoginCredentials, NewMedia, NewPost, NewUser, UpdateUser};
use common::FieldErrors;
use regex::Regex;
use std::sync::OnceLock;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 8;
pub const MAX_BIO_LEN: usize = 500;
pub const MAX_POST_TEXT_LEN: usize = 5000;
pub const MIN_GROUP_NAME_LEN: usize = 2;
pub const MIN_SEARCH_QUERY_LEN: usize = 2;

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Validate email
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.trim().is_empty() {
        return Err("Email is required".to_string());
    }

    static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = EMAIL_REGEX.get_or_init(|| {
        Regex::new(r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$")
            .expect("Failed to compile email regex")
    });

    if !regex.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username is required".to_string());
    }

    if char_len(username) < MIN_USERNAME_LEN {
        return Err(format!(
            "Username must be at least {} characters long",
            MIN_USERNAME_LEN
        ));
    }

    Ok(())
}

/// Validate a new password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if char_len(password) < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {} characters long",
            MIN_PASSWORD_LEN
        ));
    }

    Ok(())
}

pub fn validate_password_confirm(password: &str, confirm: &str) -> Result<(), String> {
    if confirm.is_empty() {
        return Err("Please confirm the password".to_string());
    }
    if password != confirm {
        return Err("Passwords do not match".to_string());
    }
    Ok(())
}

pub fn validate_bio(bio: &str) -> Result<(), String> {
    if char_len(bio) > MAX_BIO_LEN {
        return Err(format!("Bio must be at most {} characters long", MAX_BIO_LEN));
    }
    Ok(())
}

/// Text is mandatory for text posts and optional for media posts
pub fn validate_post_text(content_type: ContentType, text: &str) -> Result<(), String> {
    if content_type == ContentType::Text && text.trim().is_empty() {
        return Err("Post text is required".to_string());
    }
    if char_len(text) > MAX_POST_TEXT_LEN {
        return Err(format!(
            "Post text must be at most {} characters long",
            MAX_POST_TEXT_LEN
        ));
    }
    Ok(())
}

pub fn validate_audience_groups(audience: Audience, groups: &[i64]) -> Result<(), String> {
    if audience == Audience::Groups && groups.is_empty() {
        return Err("Select at least one group".to_string());
    }
    Ok(())
}

pub fn validate_group_name(name: &str) -> Result<(), String> {
    let name = name.trim();
    if name.is_empty() {
        return Err("Group name is required".to_string());
    }
    if char_len(name) < MIN_GROUP_NAME_LEN {
        return Err(format!(
            "Group name must be at least {} characters long",
            MIN_GROUP_NAME_LEN
        ));
    }
    Ok(())
}

pub fn validate_search_query(query: &str) -> Result<(), String> {
    if char_len(query.trim()) < MIN_SEARCH_QUERY_LEN {
        return Err(format!(
            "Enter at least {} characters to search",
            MIN_SEARCH_QUERY_LEN
        ));
    }
    Ok(())
}

/// Login form: only presence and email shape are checked
pub fn login_form(credentials: &LoginCredentials) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check("email", validate_email(&credentials.email));
    if credentials.password.is_empty() {
        errors.add("password", "Password is required");
    }
    errors.into_result()
}

pub fn registration_form(form: &NewUser) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check("email", validate_email(&form.email));
    errors.check("username", validate_username(&form.username));
    errors.check("password", validate_password(&form.password));
    errors.check(
        "password_confirm",
        validate_password_confirm(&form.password, &form.password_confirm),
    );
    errors.into_result()
}

/// Profile form; the username is always submitted, so it is always required
pub fn profile_form(username: &str, update: &UpdateUser) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check("username", validate_username(username));
    if let Some(bio) = &update.bio {
        errors.check("bio", validate_bio(bio));
    }
    errors.into_result()
}

pub fn post_form(post: &NewPost) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.check(
        "text_content",
        validate_post_text(post.content_type, &post.text_content),
    );

    if post.content_type == ContentType::Media {
        match &post.media {
            None => errors.add("media_type", "Select a media type"),
            Some(NewMedia::Link(url)) if url.trim().is_empty() => {
                errors.add("media_url", "Enter a URL")
            }
            Some(_) => {}
        }
    }

    errors.check(
        "audience_groups",
        validate_audience_groups(post.audience, &post.audience_groups),
    );
    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use api::Upload;

    fn registration() -> NewUser {
        NewUser {
            email: "alice@example.com".to_string(),
            username: "alice".to_string(),
            password: "password123".to_string(),
            password_confirm: "password123".to_string(),
            first_name: String::new(),
            last_name: String::new(),
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("alice@example.com").is_ok());
        assert!(validate_email("Alice.B+tag@Mail.Example.ORG").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("alice").is_err());
        assert!(validate_email("alice@example").is_err());
    }

    #[test]
    fn test_validate_username_and_password_lengths() {
        assert!(validate_username("ab").is_err());
        assert!(validate_username("abc").is_ok());
        assert!(validate_password("1234567").is_err());
        assert!(validate_password("12345678").is_ok());
    }

    #[test]
    fn test_registration_collects_every_field() {
        let form = NewUser {
            email: "nope".to_string(),
            username: "al".to_string(),
            password: "short".to_string(),
            password_confirm: "other".to_string(),
            ..registration()
        };

        let errors = registration_form(&form).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert_eq!(errors.get("password_confirm"), Some("Passwords do not match"));

        assert!(registration_form(&registration()).is_ok());
    }

    #[test]
    fn test_login_requires_password() {
        let errors = login_form(&LoginCredentials {
            email: "alice@example.com".to_string(),
            password: String::new(),
        })
        .unwrap_err();
        assert_eq!(errors.get("password"), Some("Password is required"));
        assert!(errors.get("email").is_none());
    }

    #[test]
    fn test_post_text_rules() {
        assert!(validate_post_text(ContentType::Text, "  ").is_err());
        assert!(validate_post_text(ContentType::Media, "").is_ok());
        let long = "x".repeat(MAX_POST_TEXT_LEN + 1);
        assert!(validate_post_text(ContentType::Media, &long).is_err());
        assert!(validate_post_text(ContentType::Text, &long[1..]).is_ok());
    }

    #[test]
    fn test_groups_audience_needs_a_group() {
        let post = NewPost {
            text_content: "hello".to_string(),
            audience: Audience::Groups,
            ..Default::default()
        };
        let errors = post_form(&post).unwrap_err();
        assert_eq!(errors.get("audience_groups"), Some("Select at least one group"));

        let post = NewPost {
            audience_groups: vec![3],
            ..post
        };
        assert!(post_form(&post).is_ok());
    }

    #[test]
    fn test_media_post_rules() {
        let post = NewPost {
            content_type: ContentType::Media,
            ..Default::default()
        };
        assert!(post_form(&post).unwrap_err().get("media_type").is_some());

        let link = NewPost {
            media: Some(NewMedia::Link(String::new())),
            ..post.clone()
        };
        assert!(post_form(&link).unwrap_err().get("media_url").is_some());

        let photo = NewPost {
            media: Some(NewMedia::Photo(Upload::new("a.png", "image/png", vec![1]))),
            ..post
        };
        assert!(post_form(&photo).is_ok());
    }

    #[test]
    fn test_profile_and_group_rules() {
        let update = UpdateUser {
            bio: Some("b".repeat(MAX_BIO_LEN + 1)),
            ..Default::default()
        };
        let errors = profile_form("alice", &update).unwrap_err();
        assert!(errors.get("bio").is_some());
        assert!(profile_form("", &UpdateUser::default()).is_err());

        assert!(validate_group_name(" a ").is_err());
        assert!(validate_group_name("ab").is_ok());
        assert!(validate_search_query("a").is_err());
        assert!(validate_search_query("ab").is_ok());
    }
}
