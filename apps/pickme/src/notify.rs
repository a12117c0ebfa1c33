//! Transient notices shown to the user

use api::ErrorKind;
use tracing::debug;

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

/// Queue of notices waiting to be shown
#[derive(Debug, Default)]
pub struct Notifications {
    queue: Vec<Notice>,
}

impl Notifications {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, level: Level, message: impl Into<String>) {
        let message = message.into();
        debug!("Notice ({:?}): {}", level, message);
        self.queue.push(Notice { level, message });
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Level::Success, message);
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Level::Info, message);
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Level::Error, message);
    }

    /// Surface a failed action
    ///
    /// Field errors become one notice per field, everything else a single
    /// notice with the server's message or `fallback`.
    pub fn report(&mut self, error: &AppError, fallback: &str) {
        match (error.kind(), error.field_errors()) {
            (ErrorKind::Validation, Some(fields)) => {
                for (field, message) in fields.iter() {
                    self.error(format!("{}: {}", field, message));
                }
            }
            _ => self.error(error.user_message(fallback)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notice> {
        self.queue.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Take every pending notice, oldest first
    pub fn drain(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.queue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::FieldErrors;

    #[test]
    fn test_field_errors_become_one_notice_each() {
        let mut fields = FieldErrors::new();
        fields.add("email", "Already taken");
        fields.add("username", "Too short");

        let mut notices = Notifications::new();
        notices.report(&AppError::Validation(fields), "Registration failed");

        let messages: Vec<_> = notices.drain().into_iter().map(|n| n.message).collect();
        assert_eq!(messages, vec!["email: Already taken", "username: Too short"]);
        assert!(notices.is_empty());
    }

    #[test]
    fn test_other_errors_use_fallback() {
        let mut notices = Notifications::new();
        notices.report(
            &AppError::File {
                path: "a.png".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            },
            "Upload failed",
        );
        assert_eq!(
            notices.iter().next(),
            Some(&Notice {
                level: Level::Error,
                message: "Upload failed".to_string(),
            })
        );
    }
}
