//! User accounts and linked OAuth identities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// External identity provider for an OAuth-linked account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OauthProvider {
    Github,
    Google,
}

impl OauthProvider {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            OauthProvider::Github => "github",
            OauthProvider::Google => "google",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "github" => Some(OauthProvider::Github),
            "google" => Some(OauthProvider::Google),
            _ => None,
        }
    }
}

/// A registered user; the root of the ownership tree.
///
/// Deleting a user removes every conversation, message, file, OAuth
/// account, and GitHub App installation the user owns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier, assigned by the store
    pub id: i64,
    /// Login email, unique across all users
    pub primary_email: String,
    /// Password hash; absent for users who only sign in via OAuth
    pub hashed_password: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new user
#[derive(Debug, Clone)]
pub struct NewUser {
    pub primary_email: String,
    pub hashed_password: Option<String>,
}

impl NewUser {
    /// Create a new user payload with no password (OAuth-only sign-in)
    pub fn new(primary_email: impl Into<String>) -> Self {
        Self {
            primary_email: primary_email.into(),
            hashed_password: None,
        }
    }

    /// Set the password hash (hashing happens in the application layer)
    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.hashed_password = Some(hash.into());
        self
    }
}

/// An external identity linked to a local user.
///
/// A user may hold multiple accounts across providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OauthAccount {
    pub id: i64,
    pub provider: OauthProvider,
    /// Account identifier at the provider
    pub oauth_user_id: String,
    /// Email reported by the provider
    pub oauth_email: String,
    /// Owning user
    pub chat_user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for linking an OAuth identity to a user
#[derive(Debug, Clone)]
pub struct NewOauthAccount {
    pub provider: OauthProvider,
    pub oauth_user_id: String,
    pub oauth_email: String,
    pub chat_user_id: i64,
}

impl NewOauthAccount {
    pub fn new(
        chat_user_id: i64,
        provider: OauthProvider,
        oauth_user_id: impl Into<String>,
        oauth_email: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            oauth_user_id: oauth_user_id.into(),
            oauth_email: oauth_email.into(),
            chat_user_id,
        }
    }
}
