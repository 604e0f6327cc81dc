//! GitHub App installation repository
//!
//! Manages installations and the repository catalog beneath them. The
//! catalog rows are owned by their installation; removing an installation
//! removes its catalog via cascade.

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::model::{
    GithubAppInstallation, GithubRepository, NewGithubAppInstallation, NewGithubRepository,
};
use crate::storage::Database;
use crate::{Error, Result};

const REPOSITORY_COLUMNS: &str = "id, github_repository_id, github_repository_name, \
     github_repository_description, github_repository_size, github_repository_language, \
     github_repository_license, github_repository_url, github_repository_website_url, \
     github_repository_default_branch, github_repository_is_private, github_repository_is_fork, \
     github_repository_is_template, github_repository_is_archived, \
     chat_github_app_installation_id, created_at, updated_at";

/// Installation repository for database operations
pub struct InstallationRepository<'a> {
    db: &'a Database,
}

impl<'a> InstallationRepository<'a> {
    /// Create a new installation repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Record a new installation for a user
    pub async fn create(&self, new: NewGithubAppInstallation) -> Result<GithubAppInstallation> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO chat_github_app_installation
                (github_account_type, github_account_avatar_url, github_account_id, github_account_name, chat_user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.github_account_type)
        .bind(&new.github_account_avatar_url)
        .bind(new.github_account_id)
        .bind(&new.github_account_name)
        .bind(new.chat_user_id)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(GithubAppInstallation {
            id: result.last_insert_rowid(),
            github_account_type: new.github_account_type,
            github_account_avatar_url: new.github_account_avatar_url,
            github_account_id: new.github_account_id,
            github_account_name: new.github_account_name,
            chat_user_id: new.chat_user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get an installation by ID
    pub async fn get(&self, id: i64) -> Result<Option<GithubAppInstallation>> {
        let row = sqlx::query(
            "SELECT id, github_account_type, github_account_avatar_url, github_account_id, github_account_name, chat_user_id, created_at, updated_at FROM chat_github_app_installation WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_installation).transpose()
    }

    /// List all installations owned by a user
    pub async fn list_by_user(&self, chat_user_id: i64) -> Result<Vec<GithubAppInstallation>> {
        let rows = sqlx::query(
            "SELECT id, github_account_type, github_account_avatar_url, github_account_id, github_account_name, chat_user_id, created_at, updated_at FROM chat_github_app_installation WHERE chat_user_id = ? ORDER BY id ASC",
        )
        .bind(chat_user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_installation).collect()
    }

    /// Delete an installation and, via cascade, its repository catalog
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM chat_github_app_installation WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Add a repository to an installation's catalog
    pub async fn add_repository(&self, new: NewGithubRepository) -> Result<GithubRepository> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO chat_github_app_installation_repository
                (github_repository_id, github_repository_name, github_repository_description,
                 github_repository_size, github_repository_language, github_repository_license,
                 github_repository_url, github_repository_website_url, github_repository_default_branch,
                 github_repository_is_private, github_repository_is_fork, github_repository_is_template,
                 github_repository_is_archived, chat_github_app_installation_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.github_repository_id)
        .bind(&new.github_repository_name)
        .bind(&new.github_repository_description)
        .bind(new.github_repository_size)
        .bind(&new.github_repository_language)
        .bind(&new.github_repository_license)
        .bind(&new.github_repository_url)
        .bind(&new.github_repository_website_url)
        .bind(&new.github_repository_default_branch)
        .bind(new.github_repository_is_private)
        .bind(new.github_repository_is_fork)
        .bind(new.github_repository_is_template)
        .bind(new.github_repository_is_archived)
        .bind(new.chat_github_app_installation_id)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(GithubRepository {
            id: result.last_insert_rowid(),
            github_repository_id: new.github_repository_id,
            github_repository_name: new.github_repository_name,
            github_repository_description: new.github_repository_description,
            github_repository_size: new.github_repository_size,
            github_repository_language: new.github_repository_language,
            github_repository_license: new.github_repository_license,
            github_repository_url: new.github_repository_url,
            github_repository_website_url: new.github_repository_website_url,
            github_repository_default_branch: new.github_repository_default_branch,
            github_repository_is_private: new.github_repository_is_private,
            github_repository_is_fork: new.github_repository_is_fork,
            github_repository_is_template: new.github_repository_is_template,
            github_repository_is_archived: new.github_repository_is_archived,
            chat_github_app_installation_id: new.chat_github_app_installation_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a catalog repository by ID
    pub async fn get_repository(&self, id: i64) -> Result<Option<GithubRepository>> {
        let row = sqlx::query(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM chat_github_app_installation_repository WHERE id = ?",
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_repository).transpose()
    }

    /// List the repositories visible to an installation
    pub async fn list_repositories(
        &self,
        chat_github_app_installation_id: i64,
    ) -> Result<Vec<GithubRepository>> {
        let rows = sqlx::query(&format!(
            "SELECT {REPOSITORY_COLUMNS} FROM chat_github_app_installation_repository WHERE chat_github_app_installation_id = ? ORDER BY id ASC",
        ))
        .bind(chat_github_app_installation_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_repository).collect()
    }

    /// Remove a repository from an installation's catalog
    pub async fn delete_repository(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM chat_github_app_installation_repository WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

/// Convert a database row to a GithubAppInstallation
fn row_to_installation(row: SqliteRow) -> Result<GithubAppInstallation> {
    Ok(GithubAppInstallation {
        id: row.try_get("id").map_err(Error::from)?,
        github_account_type: row.try_get("github_account_type").map_err(Error::from)?,
        github_account_avatar_url: row
            .try_get("github_account_avatar_url")
            .map_err(Error::from)?,
        github_account_id: row.try_get("github_account_id").map_err(Error::from)?,
        github_account_name: row.try_get("github_account_name").map_err(Error::from)?,
        chat_user_id: row.try_get("chat_user_id").map_err(Error::from)?,
        created_at: row.try_get("created_at").map_err(Error::from)?,
        updated_at: row.try_get("updated_at").map_err(Error::from)?,
    })
}

/// Convert a database row to a GithubRepository
fn row_to_repository(row: SqliteRow) -> Result<GithubRepository> {
    Ok(GithubRepository {
        id: row.try_get("id").map_err(Error::from)?,
        github_repository_id: row.try_get("github_repository_id").map_err(Error::from)?,
        github_repository_name: row.try_get("github_repository_name").map_err(Error::from)?,
        github_repository_description: row
            .try_get("github_repository_description")
            .map_err(Error::from)?,
        github_repository_size: row.try_get("github_repository_size").map_err(Error::from)?,
        github_repository_language: row
            .try_get("github_repository_language")
            .map_err(Error::from)?,
        github_repository_license: row
            .try_get("github_repository_license")
            .map_err(Error::from)?,
        github_repository_url: row.try_get("github_repository_url").map_err(Error::from)?,
        github_repository_website_url: row
            .try_get("github_repository_website_url")
            .map_err(Error::from)?,
        github_repository_default_branch: row
            .try_get("github_repository_default_branch")
            .map_err(Error::from)?,
        github_repository_is_private: row
            .try_get("github_repository_is_private")
            .map_err(Error::from)?,
        github_repository_is_fork: row
            .try_get("github_repository_is_fork")
            .map_err(Error::from)?,
        github_repository_is_template: row
            .try_get("github_repository_is_template")
            .map_err(Error::from)?,
        github_repository_is_archived: row
            .try_get("github_repository_is_archived")
            .map_err(Error::from)?,
        chat_github_app_installation_id: row
            .try_get("chat_github_app_installation_id")
            .map_err(Error::from)?,
        created_at: row.try_get("created_at").map_err(Error::from)?,
        updated_at: row.try_get("updated_at").map_err(Error::from)?,
    })
}
