// src/models/user.rs

use serde::{Deserialize, Serialize};
use url::Url;
use validator::Validate;

/// Identity handed out by the authentication provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,

    #[serde(rename = "displayName")]
    pub display_name: String,

    #[serde(rename = "photoURL", default)]
    pub photo_url: String,

    pub email: String,
}

/// Represents a document in the `users` collection, keyed by uid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserAccount {
    pub uid: String,
    pub email: String,

    #[serde(rename = "displayName")]
    pub display_name: String,

    #[serde(rename = "photoURL", default)]
    pub photo_url: String,

    /// Argon2 password hash.
    #[serde(rename = "passwordHash")]
    pub password_hash: String,

    #[serde(rename = "createdAt")]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl UserAccount {
    pub fn identity(&self) -> Identity {
        Identity {
            uid: self.uid.clone(),
            display_name: self.display_name.clone(),
            photo_url: self.photo_url.clone(),
            email: self.email.clone(),
        }
    }
}

/// Represents a document in the `admins` collection, keyed by uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Admin {
    #[serde(default)]
    pub uid: String,

    #[serde(default)]
    pub email: String,

    #[serde(rename = "displayName", default)]
    pub display_name: String,

    #[serde(rename = "photoURL", default)]
    pub photo_url: String,

    #[serde(rename = "createdAt", default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Admin {
    /// Case-insensitive match on display name or email, as used by the admin directory.
    pub fn matches(&self, search: &str) -> bool {
        let needle = search.to_lowercase();
        self.display_name.to_lowercase().contains(&needle)
            || self.email.to_lowercase().contains(&needle)
    }
}

/// DTO for creating a new account.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,

    #[serde(rename = "displayName")]
    #[validate(length(
        min = 1,
        max = 80,
        message = "Display name must be between 1 and 80 characters."
    ))]
    pub display_name: String,

    #[serde(rename = "photoURL", default)]
    #[validate(custom(function = validate_photo_url))]
    pub photo_url: Option<String>,

    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
}

/// DTO for signing in.
#[derive(Debug, Deserialize, Validate)]
pub struct SignInRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// Validates that an avatar link is a well-formed URL.
fn validate_photo_url(url: &str) -> Result<(), validator::ValidationError> {
    if url.len() > 500 {
        return Err(validator::ValidationError::new("url_too_long"));
    }
    if Url::parse(url).is_err() {
        return Err(validator::ValidationError::new("invalid_url"));
    }
    Ok(())
}
