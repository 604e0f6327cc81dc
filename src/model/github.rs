//! GitHub App installations and the repositories they expose
//!
//! An installation represents one grant of the GitHub App onto a GitHub
//! user or organization; its repositories are nullable mirrors of the
//! upstream metadata, refreshed by the application layer. Field names
//! mirror the upstream columns exactly.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One installation of the GitHub App onto a GitHub user or org
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubAppInstallation {
    pub id: i64,
    /// Account type at GitHub (e.g. `User`, `Organization`)
    pub github_account_type: String,
    pub github_account_avatar_url: String,
    /// Account identifier at GitHub
    pub github_account_id: i64,
    pub github_account_name: Option<String>,
    /// Owning user
    pub chat_user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new installation
#[derive(Debug, Clone)]
pub struct NewGithubAppInstallation {
    pub github_account_type: String,
    pub github_account_avatar_url: String,
    pub github_account_id: i64,
    pub github_account_name: Option<String>,
    pub chat_user_id: i64,
}

impl NewGithubAppInstallation {
    pub fn new(
        chat_user_id: i64,
        github_account_id: i64,
        github_account_type: impl Into<String>,
        github_account_avatar_url: impl Into<String>,
    ) -> Self {
        Self {
            github_account_type: github_account_type.into(),
            github_account_avatar_url: github_account_avatar_url.into(),
            github_account_id,
            github_account_name: None,
            chat_user_id,
        }
    }

    pub fn with_account_name(mut self, name: impl Into<String>) -> Self {
        self.github_account_name = Some(name.into());
        self
    }
}

/// One repository visible to an installation.
///
/// Most fields are nullable mirrors of upstream metadata; only the
/// upstream id, name, URL, privacy flag, and archived flag are required.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubRepository {
    pub id: i64,
    /// Repository identifier at GitHub
    pub github_repository_id: i64,
    pub github_repository_name: String,
    pub github_repository_description: Option<String>,
    /// Size in kilobytes, as reported by GitHub
    pub github_repository_size: Option<i64>,
    pub github_repository_language: Option<String>,
    pub github_repository_license: Option<String>,
    pub github_repository_url: String,
    pub github_repository_website_url: Option<String>,
    pub github_repository_default_branch: Option<String>,
    pub github_repository_is_private: bool,
    pub github_repository_is_fork: Option<bool>,
    pub github_repository_is_template: Option<bool>,
    pub github_repository_is_archived: bool,
    /// Parent installation
    pub chat_github_app_installation_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a repository under an installation
#[derive(Debug, Clone)]
pub struct NewGithubRepository {
    pub github_repository_id: i64,
    pub github_repository_name: String,
    pub github_repository_description: Option<String>,
    pub github_repository_size: Option<i64>,
    pub github_repository_language: Option<String>,
    pub github_repository_license: Option<String>,
    pub github_repository_url: String,
    pub github_repository_website_url: Option<String>,
    pub github_repository_default_branch: Option<String>,
    pub github_repository_is_private: bool,
    pub github_repository_is_fork: Option<bool>,
    pub github_repository_is_template: Option<bool>,
    pub github_repository_is_archived: bool,
    pub chat_github_app_installation_id: i64,
}

impl NewGithubRepository {
    /// Create a repository payload with only the required upstream fields
    pub fn new(
        chat_github_app_installation_id: i64,
        github_repository_id: i64,
        name: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            github_repository_id,
            github_repository_name: name.into(),
            github_repository_description: None,
            github_repository_size: None,
            github_repository_language: None,
            github_repository_license: None,
            github_repository_url: url.into(),
            github_repository_website_url: None,
            github_repository_default_branch: None,
            github_repository_is_private: false,
            github_repository_is_fork: None,
            github_repository_is_template: None,
            github_repository_is_archived: false,
            chat_github_app_installation_id,
        }
    }

    pub fn private(mut self) -> Self {
        self.github_repository_is_private = true;
        self
    }

    pub fn archived(mut self) -> Self {
        self.github_repository_is_archived = true;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.github_repository_description = Some(description.into());
        self
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.github_repository_default_branch = Some(branch.into());
        self
    }
}
