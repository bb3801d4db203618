//! Typed inputs for every mutating operation, each with a pure validation step.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

pub const TITLE_MAX_LEN: usize = 256;
pub const NAME_MAX_LEN: usize = 150;
pub const PASSWORD_MIN_LEN: usize = 8;

/// Reasons an input is rejected before it reaches persistence.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} must not be empty")]
    Blank(&'static str),

    #[error("{field} must be at most {max} characters")]
    TooLong { field: &'static str, max: usize },

    #[error("publish date cannot be in the past")]
    PublishDateInPast,

    #[error("username may contain only letters, digits and @/./+/-/_")]
    InvalidUsername,

    #[error("enter a valid email address")]
    InvalidEmail,

    #[error("the two password fields didn't match")]
    PasswordMismatch,

    #[error("password must contain at least {0} characters")]
    PasswordTooShort(usize),

    #[error("password cannot be entirely numeric")]
    PasswordNumeric,

    #[error("password is too similar to the username")]
    PasswordSimilarToUsername,

    #[error("unknown category {0}")]
    UnknownCategory(Uuid),

    #[error("unknown location {0}")]
    UnknownLocation(Uuid),
}

fn non_blank(field: &'static str, value: &str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(ValidationError::Blank(field));
    }
    Ok(value.to_string())
}

fn max_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.chars().count() > max {
        return Err(ValidationError::TooLong { field, max });
    }
    Ok(())
}

fn validate_username(username: &str) -> Result<String, ValidationError> {
    let username = non_blank("username", username)?;
    max_len("username", &username, NAME_MAX_LEN)?;
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(ValidationError::InvalidUsername);
    }
    Ok(username)
}

fn validate_email(email: &str) -> Result<String, ValidationError> {
    let email = email.trim();
    if email.is_empty() {
        return Ok(String::new());
    }
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(email.to_string())
}

/// Data submitted to create or edit a post.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PostInput {
    pub title: String,
    pub text: String,
    pub pub_date: Option<DateTime<Utc>>,
    pub is_published: Option<bool>,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub image: Option<String>,
}

/// A post input that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidPost {
    pub title: String,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub is_published: bool,
    pub category_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub image: Option<String>,
}

impl PostInput {
    /// Validate against the submission time.
    ///
    /// A missing publish date defaults to `submitted_at`; an explicit one
    /// earlier than `submitted_at` is rejected.
    pub fn validate(self, submitted_at: DateTime<Utc>) -> Result<ValidPost, ValidationError> {
        let pub_date = self.pub_date.unwrap_or(submitted_at);
        if pub_date < submitted_at {
            return Err(ValidationError::PublishDateInPast);
        }
        self.validate_fields(pub_date)
    }

    /// Validate an edit. The past-date rule applies only when the publish
    /// date actually changes; a missing date keeps `current_pub_date`.
    pub fn validate_edit(
        self,
        current_pub_date: DateTime<Utc>,
        submitted_at: DateTime<Utc>,
    ) -> Result<ValidPost, ValidationError> {
        let pub_date = self.pub_date.unwrap_or(current_pub_date);
        if pub_date != current_pub_date && pub_date < submitted_at {
            return Err(ValidationError::PublishDateInPast);
        }
        self.validate_fields(pub_date)
    }

    fn validate_fields(self, pub_date: DateTime<Utc>) -> Result<ValidPost, ValidationError> {
        let title = non_blank("title", &self.title)?;
        max_len("title", &title, TITLE_MAX_LEN)?;
        let text = non_blank("text", &self.text)?;
        let image = self
            .image
            .map(|image| image.trim().to_string())
            .filter(|image| !image.is_empty());
        if let Some(image) = &image {
            max_len("image", image, TITLE_MAX_LEN)?;
        }

        Ok(ValidPost {
            title,
            text,
            pub_date,
            is_published: self.is_published.unwrap_or(true),
            category_id: self.category_id,
            location_id: self.location_id,
            image,
        })
    }
}

/// Data submitted to add or edit a comment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentInput {
    pub text: String,
}

impl CommentInput {
    /// Returns the trimmed comment text.
    pub fn validate(self) -> Result<String, ValidationError> {
        non_blank("text", &self.text)
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileInput {
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl ProfileInput {
    pub fn validate(self) -> Result<ValidProfile, ValidationError> {
        let username = validate_username(&self.username)?;
        let first_name = self.first_name.trim().to_string();
        max_len("first_name", &first_name, NAME_MAX_LEN)?;
        let last_name = self.last_name.trim().to_string();
        max_len("last_name", &last_name, NAME_MAX_LEN)?;
        let email = validate_email(&self.email)?;

        Ok(ValidProfile {
            username,
            first_name,
            last_name,
            email,
        })
    }
}

/// Sign-up form: username plus the password typed twice.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationInput {
    pub username: String,
    pub password1: String,
    pub password2: String,
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub username: String,
    pub password: String,
    pub email: String,
}

impl RegistrationInput {
    pub fn validate(self) -> Result<ValidRegistration, ValidationError> {
        let username = validate_username(&self.username)?;
        let email = validate_email(&self.email)?;
        if self.password1 != self.password2 {
            return Err(ValidationError::PasswordMismatch);
        }
        let password = self.password1;
        if password.chars().count() < PASSWORD_MIN_LEN {
            return Err(ValidationError::PasswordTooShort(PASSWORD_MIN_LEN));
        }
        if password.chars().all(|c| c.is_ascii_digit()) {
            return Err(ValidationError::PasswordNumeric);
        }
        if password.to_lowercase() == username.to_lowercase() {
            return Err(ValidationError::PasswordSimilarToUsername);
        }

        Ok(ValidRegistration {
            username,
            password,
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn post_input(pub_date: Option<DateTime<Utc>>) -> PostInput {
        PostInput {
            title: "  Hello  ".to_string(),
            text: "World".to_string(),
            pub_date,
            ..PostInput::default()
        }
    }

    #[test]
    fn test_publish_date_defaults_to_submission_time() {
        let now = Utc::now();
        let post = post_input(None).validate(now).unwrap();
        assert_eq!(post.pub_date, now);
        assert_eq!(post.title, "Hello");
        assert!(post.is_published);
    }

    #[test]
    fn test_publish_date_in_past_rejected() {
        let now = Utc::now();
        let result = post_input(Some(now - TimeDelta::hours(1))).validate(now);
        assert_eq!(result, Err(ValidationError::PublishDateInPast));
    }

    #[test]
    fn test_future_publish_date_accepted() {
        let now = Utc::now();
        let tomorrow = now + TimeDelta::days(1);
        let post = post_input(Some(tomorrow)).validate(now).unwrap();
        assert_eq!(post.pub_date, tomorrow);
    }

    #[test]
    fn test_edit_keeps_existing_past_date() {
        let now = Utc::now();
        let original = now - TimeDelta::days(10);

        assert!(post_input(Some(original)).validate_edit(original, now).is_ok());
        assert!(post_input(None).validate_edit(original, now).is_ok());
        assert_eq!(
            post_input(Some(original + TimeDelta::days(1))).validate_edit(original, now),
            Err(ValidationError::PublishDateInPast)
        );
    }

    #[test]
    fn test_blank_and_oversized_fields() {
        let now = Utc::now();
        let blank = PostInput {
            title: "   ".to_string(),
            text: "x".to_string(),
            ..PostInput::default()
        };
        assert_eq!(blank.validate(now), Err(ValidationError::Blank("title")));

        let long = PostInput {
            title: "a".repeat(TITLE_MAX_LEN + 1),
            text: "x".to_string(),
            ..PostInput::default()
        };
        assert!(matches!(
            long.validate(now),
            Err(ValidationError::TooLong { field: "title", .. })
        ));

        assert_eq!(
            CommentInput {
                text: "\n".to_string()
            }
            .validate(),
            Err(ValidationError::Blank("text"))
        );
    }

    #[test]
    fn test_profile_validation() {
        let ok = ProfileInput {
            username: "jane.doe".to_string(),
            first_name: "Jane".to_string(),
            last_name: "Doe".to_string(),
            email: "jane@example.com".to_string(),
        }
        .validate()
        .unwrap();
        assert_eq!(ok.username, "jane.doe");

        let bad_name = ProfileInput {
            username: "jane doe".to_string(),
            ..ProfileInput::default()
        };
        assert_eq!(bad_name.validate(), Err(ValidationError::InvalidUsername));

        let bad_email = ProfileInput {
            username: "jane".to_string(),
            email: "jane@localhost".to_string(),
            ..ProfileInput::default()
        };
        assert_eq!(bad_email.validate(), Err(ValidationError::InvalidEmail));
    }

    #[test]
    fn test_registration_password_rules() {
        let input = |p1: &str, p2: &str| RegistrationInput {
            username: "writer".to_string(),
            password1: p1.to_string(),
            password2: p2.to_string(),
            email: String::new(),
        };

        assert!(input("correct-horse", "correct-horse").validate().is_ok());
        assert_eq!(
            input("correct-horse", "battery-staple").validate(),
            Err(ValidationError::PasswordMismatch)
        );
        assert_eq!(
            input("short", "short").validate(),
            Err(ValidationError::PasswordTooShort(PASSWORD_MIN_LEN))
        );
        assert_eq!(
            input("12345678", "12345678").validate(),
            Err(ValidationError::PasswordNumeric)
        );
        assert_eq!(
            input("Writer12", "Writer12").validate().map(|r| r.username),
            Ok("writer".to_string())
        );
    }
}
