//! Typed records for the chat store
//!
//! Each table has a full record struct plus a `New*` insert payload; the
//! store assigns identifiers and timestamps at insert. Enum columns are
//! closed sets mirrored as Rust sum types.

pub mod account;
pub mod conversation;
pub mod github;

pub use account::{NewOauthAccount, NewUser, OauthAccount, OauthProvider, User};
pub use conversation::{
    AiModel, Conversation, ConversationFile, Message, MessageActor, NewConversation,
    NewConversationFile, NewMessage,
};
pub use github::{
    GithubAppInstallation, GithubRepository, NewGithubAppInstallation, NewGithubRepository,
};
