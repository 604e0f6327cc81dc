//! Repository implementations
//!
//! Database operations for each entity. Repositories issue plain inserts,
//! reads, and deletes; every integrity rule (foreign keys, cascades,
//! unique email, closed enum sets) is enforced by the engine and surfaced
//! through the crate's error taxonomy.

pub mod accounts;
pub mod conversations;
pub mod github;

pub use accounts::{OauthAccountRepository, UserRepository};
pub use conversations::{ConversationRepository, FileRepository, MessageRepository};
pub use github::InstallationRepository;
