//! Conversation, message, and file repositories

use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::model::{
    AiModel, Conversation, ConversationFile, Message, MessageActor, NewConversation,
    NewConversationFile, NewMessage,
};
use crate::storage::Database;
use crate::{Error, Result};

/// Conversation repository for database operations
pub struct ConversationRepository<'a> {
    db: &'a Database,
}

impl<'a> ConversationRepository<'a> {
    /// Create a new conversation repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a new conversation owned by a user
    pub async fn create(&self, new: NewConversation) -> Result<Conversation> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO chat_conversation (name, model, chat_user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.name)
        .bind(new.model.as_str())
        .bind(new.chat_user_id)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(Conversation {
            id: result.last_insert_rowid(),
            name: new.name,
            model: new.model,
            chat_user_id: new.chat_user_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a conversation by ID
    pub async fn get(&self, id: i64) -> Result<Option<Conversation>> {
        let row = sqlx::query(
            "SELECT id, name, model, chat_user_id, created_at, updated_at FROM chat_conversation WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_conversation).transpose()
    }

    /// List all conversations owned by a user, newest first
    pub async fn list_by_user(&self, chat_user_id: i64) -> Result<Vec<Conversation>> {
        let rows = sqlx::query(
            "SELECT id, name, model, chat_user_id, created_at, updated_at FROM chat_conversation WHERE chat_user_id = ? ORDER BY id DESC",
        )
        .bind(chat_user_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_conversation).collect()
    }

    /// Rename a conversation; updated_at refreshes via trigger
    pub async fn rename(&self, id: i64, name: &str) -> Result<()> {
        sqlx::query("UPDATE chat_conversation SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }

    /// Delete a conversation and, via cascade, its messages and files
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM chat_conversation WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

/// Message repository for database operations
pub struct MessageRepository<'a> {
    db: &'a Database,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append a message to a conversation
    pub async fn create(&self, new: NewMessage) -> Result<Message> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO chat_conversation_message (message, actor, chat_user_id, chat_conversation_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.message)
        .bind(new.actor.as_str())
        .bind(new.chat_user_id)
        .bind(new.chat_conversation_id)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(Message {
            id: result.last_insert_rowid(),
            message: new.message,
            actor: new.actor,
            chat_user_id: new.chat_user_id,
            chat_conversation_id: new.chat_conversation_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a message by ID
    pub async fn get(&self, id: i64) -> Result<Option<Message>> {
        let row = sqlx::query(
            "SELECT id, message, actor, chat_user_id, chat_conversation_id, created_at, updated_at FROM chat_conversation_message WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_message).transpose()
    }

    /// List all messages in a conversation in insertion order
    pub async fn list_by_conversation(&self, chat_conversation_id: i64) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            "SELECT id, message, actor, chat_user_id, chat_conversation_id, created_at, updated_at FROM chat_conversation_message WHERE chat_conversation_id = ? ORDER BY id ASC",
        )
        .bind(chat_conversation_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_message).collect()
    }

    /// Delete a message and, via cascade, the files attached to it
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM chat_conversation_message WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

/// Conversation file repository for database operations
pub struct FileRepository<'a> {
    db: &'a Database,
}

impl<'a> FileRepository<'a> {
    /// Create a new file repository
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Attach a file to a message
    pub async fn create(&self, new: NewConversationFile) -> Result<ConversationFile> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO chat_conversation_file
                (title, language, file_extension, text, chat_user_id, chat_conversation_id, chat_conversation_message_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.title)
        .bind(&new.language)
        .bind(&new.file_extension)
        .bind(&new.text)
        .bind(new.chat_user_id)
        .bind(new.chat_conversation_id)
        .bind(new.chat_conversation_message_id)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        Ok(ConversationFile {
            id: result.last_insert_rowid(),
            title: new.title,
            language: new.language,
            file_extension: new.file_extension,
            text: new.text,
            chat_user_id: new.chat_user_id,
            chat_conversation_id: new.chat_conversation_id,
            chat_conversation_message_id: new.chat_conversation_message_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Get a file by ID
    pub async fn get(&self, id: i64) -> Result<Option<ConversationFile>> {
        let row = sqlx::query(
            "SELECT id, title, language, file_extension, text, chat_user_id, chat_conversation_id, chat_conversation_message_id, created_at, updated_at FROM chat_conversation_file WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        row.map(row_to_file).transpose()
    }

    /// List the files attached to a message
    pub async fn list_by_message(&self, chat_conversation_message_id: i64) -> Result<Vec<ConversationFile>> {
        let rows = sqlx::query(
            "SELECT id, title, language, file_extension, text, chat_user_id, chat_conversation_id, chat_conversation_message_id, created_at, updated_at FROM chat_conversation_file WHERE chat_conversation_message_id = ? ORDER BY id ASC",
        )
        .bind(chat_conversation_message_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_file).collect()
    }

    /// List every file produced within a conversation
    pub async fn list_by_conversation(&self, chat_conversation_id: i64) -> Result<Vec<ConversationFile>> {
        let rows = sqlx::query(
            "SELECT id, title, language, file_extension, text, chat_user_id, chat_conversation_id, chat_conversation_message_id, created_at, updated_at FROM chat_conversation_file WHERE chat_conversation_id = ? ORDER BY id ASC",
        )
        .bind(chat_conversation_id)
        .fetch_all(self.db.pool())
        .await?;

        rows.into_iter().map(row_to_file).collect()
    }

    /// Delete a file
    pub async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM chat_conversation_file WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}

/// Convert a database row to a Conversation
fn row_to_conversation(row: SqliteRow) -> Result<Conversation> {
    let model: String = row.try_get("model").map_err(Error::from)?;
    let model = AiModel::parse(&model)
        .ok_or_else(|| Error::EnumViolation(format!("unknown model '{model}'")))?;

    Ok(Conversation {
        id: row.try_get("id").map_err(Error::from)?,
        name: row.try_get("name").map_err(Error::from)?,
        model,
        chat_user_id: row.try_get("chat_user_id").map_err(Error::from)?,
        created_at: row.try_get("created_at").map_err(Error::from)?,
        updated_at: row.try_get("updated_at").map_err(Error::from)?,
    })
}

/// Convert a database row to a Message
fn row_to_message(row: SqliteRow) -> Result<Message> {
    let actor: String = row.try_get("actor").map_err(Error::from)?;
    let actor = MessageActor::parse(&actor)
        .ok_or_else(|| Error::EnumViolation(format!("unknown actor '{actor}'")))?;

    Ok(Message {
        id: row.try_get("id").map_err(Error::from)?,
        message: row.try_get("message").map_err(Error::from)?,
        actor,
        chat_user_id: row.try_get("chat_user_id").map_err(Error::from)?,
        chat_conversation_id: row.try_get("chat_conversation_id").map_err(Error::from)?,
        created_at: row.try_get("created_at").map_err(Error::from)?,
        updated_at: row.try_get("updated_at").map_err(Error::from)?,
    })
}

/// Convert a database row to a ConversationFile
fn row_to_file(row: SqliteRow) -> Result<ConversationFile> {
    Ok(ConversationFile {
        id: row.try_get("id").map_err(Error::from)?,
        title: row.try_get("title").map_err(Error::from)?,
        language: row.try_get("language").map_err(Error::from)?,
        file_extension: row.try_get("file_extension").map_err(Error::from)?,
        text: row.try_get("text").map_err(Error::from)?,
        chat_user_id: row.try_get("chat_user_id").map_err(Error::from)?,
        chat_conversation_id: row.try_get("chat_conversation_id").map_err(Error::from)?,
        chat_conversation_message_id: row
            .try_get("chat_conversation_message_id")
            .map_err(Error::from)?,
        created_at: row.try_get("created_at").map_err(Error::from)?,
        updated_at: row.try_get("updated_at").map_err(Error::from)?,
    })
}
