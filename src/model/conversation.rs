//! Conversations, their messages, and attached files

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Assistant model a conversation is pinned to for its lifetime.
///
/// This is a closed set; adding a model means a schema migration so the
/// CHECK constraint and this enum stay in sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AiModel {
    #[serde(rename = "OpenAssistant/oasst-sft-4-pythia-12b-epoch-3.5")]
    OasstSft4Pythia12b,
    #[serde(rename = "mistralai/Mistral-7B-Instruct-v0.1")]
    Mistral7bInstruct,
}

impl AiModel {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            AiModel::OasstSft4Pythia12b => "OpenAssistant/oasst-sft-4-pythia-12b-epoch-3.5",
            AiModel::Mistral7bInstruct => "mistralai/Mistral-7B-Instruct-v0.1",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "OpenAssistant/oasst-sft-4-pythia-12b-epoch-3.5" => Some(AiModel::OasstSft4Pythia12b),
            "mistralai/Mistral-7B-Instruct-v0.1" => Some(AiModel::Mistral7bInstruct),
            _ => None,
        }
    }
}

/// Who authored a message in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageActor {
    #[default]
    User,
    Assistant,
}

impl MessageActor {
    /// Convert to string for database storage
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageActor::User => "user",
            MessageActor::Assistant => "assistant",
        }
    }

    /// Parse from database string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(MessageActor::User),
            "assistant" => Some(MessageActor::Assistant),
            _ => None,
        }
    }
}

/// A named thread of interaction with one fixed model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: i64,
    pub name: String,
    pub model: AiModel,
    /// Owning user
    pub chat_user_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new conversation
#[derive(Debug, Clone)]
pub struct NewConversation {
    pub name: String,
    pub model: AiModel,
    pub chat_user_id: i64,
}

impl NewConversation {
    pub fn new(chat_user_id: i64, name: impl Into<String>, model: AiModel) -> Self {
        Self {
            name: name.into(),
            model,
            chat_user_id,
        }
    }
}

/// One entry in a conversation's append-only message log.
///
/// Ordering is by identifier, which follows insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub message: String,
    pub actor: MessageActor,
    /// Owning user
    pub chat_user_id: i64,
    /// Parent conversation
    pub chat_conversation_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new message
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub message: String,
    pub actor: MessageActor,
    pub chat_user_id: i64,
    pub chat_conversation_id: i64,
}

impl NewMessage {
    /// Create a user-authored message
    pub fn user(chat_user_id: i64, chat_conversation_id: i64, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            actor: MessageActor::User,
            chat_user_id,
            chat_conversation_id,
        }
    }

    /// Create an assistant-authored message
    pub fn assistant(
        chat_user_id: i64,
        chat_conversation_id: i64,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            actor: MessageActor::Assistant,
            chat_user_id,
            chat_conversation_id,
        }
    }
}

/// A file artifact produced within a specific message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationFile {
    pub id: i64,
    pub title: Option<String>,
    /// Syntax/highlighting language, `text` when unspecified
    pub language: String,
    /// File extension without the dot, `txt` when unspecified
    pub file_extension: String,
    /// File body
    pub text: String,
    /// Owning user
    pub chat_user_id: i64,
    /// Parent conversation
    pub chat_conversation_id: i64,
    /// Message the file is attached to
    pub chat_conversation_message_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert payload for a new conversation file
#[derive(Debug, Clone)]
pub struct NewConversationFile {
    pub title: Option<String>,
    pub language: String,
    pub file_extension: String,
    pub text: String,
    pub chat_user_id: i64,
    pub chat_conversation_id: i64,
    pub chat_conversation_message_id: i64,
}

impl NewConversationFile {
    /// Create a file payload with the default language and extension
    pub fn new(
        chat_user_id: i64,
        chat_conversation_id: i64,
        chat_conversation_message_id: i64,
        text: impl Into<String>,
    ) -> Self {
        Self {
            title: None,
            language: "text".to_string(),
            file_extension: "txt".to_string(),
            text: text.into(),
            chat_user_id,
            chat_conversation_id,
            chat_conversation_message_id,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set the language and matching file extension
    pub fn with_language(
        mut self,
        language: impl Into<String>,
        file_extension: impl Into<String>,
    ) -> Self {
        self.language = language.into();
        self.file_extension = file_extension.into();
        self
    }
}
