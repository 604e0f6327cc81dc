//! User and OAuth account repositories

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::model::{NewOauthAccount, NewUser, OauthAccount, OauthProvider, User};
use crate::storage::Database;
use crate::{Error, Result};

/// User repository for database operations
pub struct UserRepository<'a> {
    db: &'a Database,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert a new user. Fails with a unique violation if the email is
    /// already registered.
    pub async fn create(&self, new: NewUser) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO chat_user (primary_email, hashed_password, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&new.primary_email)
        .bind(&new.hashed_password)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(User {
            id: result.last_insert_rowid(),
            primary_email: new.primary_email,
            hashed_password: new.hashed_password,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a user by ID
    pub async fn get(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, primary_email, hashed_password, created_at, updated_at FROM chat_user WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_user).transpose()
    }

    /// Look a user up by primary email
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, primary_email, hashed_password, created_at, updated_at FROM chat_user WHERE primary_email = ?",
        )
        .bind(email)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_user).transpose()
    }

    /// Replace (or clear) the stored password hash
    pub async fn update_password(&self, id: i64, hashed_password: Option<&str>) -> Result<()> {
        sqlx::query("UPDATE chat_user SET hashed_password = ? WHERE id = ?")
            .bind(hashed_password)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Delete a user and, via cascade, everything the user owns
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM chat_user WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

/// OAuth account repository for database operations
pub struct OauthAccountRepository<'a> {
    db: &'a Database,
}

impl<'a> OauthAccountRepository<'a> {
    /// Create a new OAuth account repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Link an OAuth identity to a user
    pub async fn create(&self, new: NewOauthAccount) -> Result<OauthAccount> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO chat_user_oauth_account (provider, oauth_user_id, oauth_email, chat_user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.provider.as_str())
        .bind(&new.oauth_user_id)
        .bind(&new.oauth_email)
        .bind(new.chat_user_id)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(OauthAccount {
            id: result.last_insert_rowid(),
            provider: new.provider,
            oauth_user_id: new.oauth_user_id,
            oauth_email: new.oauth_email,
            chat_user_id: new.chat_user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get an OAuth account by ID
    pub async fn get(&self, id: i64) -> Result<Option<OauthAccount>> {
        let row = sqlx::query(
            "SELECT id, provider, oauth_user_id, oauth_email, chat_user_id, created_at, updated_at FROM chat_user_oauth_account WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_oauth_account).transpose()
    }

    /// List all OAuth accounts linked to a user
    pub async fn list_by_user(&self, chat_user_id: i64) -> Result<Vec<OauthAccount>> {
        let rows = sqlx::query(
            "SELECT id, provider, oauth_user_id, oauth_email, chat_user_id, created_at, updated_at FROM chat_user_oauth_account WHERE chat_user_id = ? ORDER BY id ASC",
        )
        .bind(chat_user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_oauth_account).collect()
    }

    /// Find the account a provider identity is linked to, if any
    pub async fn find_by_provider_account(
        &self,
        provider: OauthProvider,
        oauth_user_id: &str,
    ) -> Result<Option<OauthAccount>> {
        let row = sqlx::query(
            "SELECT id, provider, oauth_user_id, oauth_email, chat_user_id, created_at, updated_at FROM chat_user_oauth_account WHERE provider = ? AND oauth_user_id = ?",
        )
        .bind(provider.as_str())
        .bind(oauth_user_id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_oauth_account).transpose()
    }

    /// Unlink an OAuth identity
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM chat_user_oauth_account WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

/// Convert a database row to a User
fn row_to_user(row: SqliteRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id").map_err(Error::from)?,
        primary_email: row.try_get("primary_email").map_err(Error::from)?,
        hashed_password: row.try_get("hashed_password").map_err(Error::from)?,
        created_at: row.try_get("created_at").map_err(Error::from)?,
        updated_at: row.try_get("updated_at").map_err(Error::from)?,
    })
}

/// Convert a database row to an OauthAccount
fn row_to_oauth_account(row: SqliteRow) -> Result<OauthAccount> {
    let provider: String = row.try_get("provider").map_err(Error::from)?;
    let provider = OauthProvider::parse(&provider)
        .ok_or_else(|| Error::EnumViolation(format!("unknown provider '{provider}'")))?;

    Ok(OauthAccount {
        id: row.try_get("id").map_err(Error::from)?,
        provider,
        oauth_user_id: row.try_get("oauth_user_id").map_err(Error::from)?,
        oauth_email: row.try_get("oauth_email").map_err(Error::from)?,
        chat_user_id: row.try_get("chat_user_id").map_err(Error::from)?,
        created_at: row.try_get("created_at").map_err(Error::from)?,
        updated_at: row.try_get("updated_at").map_err(Error::from)?,
    })
}
