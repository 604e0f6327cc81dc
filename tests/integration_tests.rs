//! Chat store integration tests
//!
//! Exercises the schema's integrity contract end to end: cascade deletes,
//! unique email enforcement, closed enum sets, and foreign key checks,
//! all against an in-memory SQLite database.

use chat_store::model::{
    AiModel, NewConversation, NewConversationFile, NewGithubAppInstallation, NewGithubRepository,
    NewMessage, NewOauthAccount, NewUser, OauthProvider, User,
};
use chat_store::repository::{
    ConversationRepository, FileRepository, InstallationRepository, MessageRepository,
    OauthAccountRepository, UserRepository,
};
use chat_store::storage::{Database, DatabaseConfig};
use chat_store::Error;

async fn test_db() -> Database {
    Database::in_memory().await.expect("Failed to create in-memory database")
}

async fn create_user(db: &Database, email: &str) -> User {
    UserRepository::new(db)
        .create(NewUser::new(email))
        .await
        .expect("Failed to create user")
}

#[tokio::test]
async fn test_user_conversation_message_roundtrip() {
    let db = test_db().await;

    let user = create_user(&db, "a@example.com").await;
    assert_eq!(user.id, 1);

    let conversation = ConversationRepository::new(&db)
        .create(NewConversation::new(user.id, "t", AiModel::Mistral7bInstruct))
        .await
        .unwrap();
    assert_eq!(conversation.id, 1);
    assert_eq!(conversation.model, AiModel::Mistral7bInstruct);

    let messages = MessageRepository::new(&db);
    let first = messages
        .create(NewMessage::user(user.id, conversation.id, "hi"))
        .await
        .unwrap();
    let second = messages
        .create(NewMessage::assistant(user.id, conversation.id, "hello!"))
        .await
        .unwrap();

    let listed = messages.list_by_conversation(conversation.id).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, first.id);
    assert_eq!(listed[1].id, second.id);
    assert_eq!(listed[0].message, "hi");
    assert_eq!(listed[1].message, "hello!");
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let db = test_db().await;
    let users = UserRepository::new(&db);

    let first = users.create(NewUser::new("a@example.com")).await.unwrap();

    let err = users.create(NewUser::new("a@example.com")).await.unwrap_err();
    assert!(matches!(err, Error::UniqueViolation(_)), "got {err:?}");
    assert!(!err.is_retryable());

    // First user row is unaffected
    let found = users.find_by_email("a@example.com").await.unwrap().unwrap();
    assert_eq!(found.id, first.id);
}

#[tokio::test]
async fn test_insert_under_missing_parent_rejected() {
    let db = test_db().await;
    let user = create_user(&db, "fk@example.com").await;

    // Conversation under a nonexistent user
    let err = ConversationRepository::new(&db)
        .create(NewConversation::new(9999, "t", AiModel::OasstSft4Pythia12b))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ForeignKeyViolation(_)), "got {err:?}");

    // Message under a nonexistent conversation
    let err = MessageRepository::new(&db)
        .create(NewMessage::user(user.id, 9999, "hi"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ForeignKeyViolation(_)), "got {err:?}");

    // OAuth account under a nonexistent user
    let err = OauthAccountRepository::new(&db)
        .create(NewOauthAccount::new(9999, OauthProvider::Github, "42", "a@example.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::ForeignKeyViolation(_)), "got {err:?}");
}

#[tokio::test]
async fn test_actor_outside_closed_set_rejected() {
    let db = test_db().await;
    let user = create_user(&db, "enum@example.com").await;
    let conversation = ConversationRepository::new(&db)
        .create(NewConversation::new(user.id, "t", AiModel::Mistral7bInstruct))
        .await
        .unwrap();

    // The typed API cannot produce an out-of-set actor, so go through SQL
    let err = sqlx::query(
        "INSERT INTO chat_conversation_message (message, actor, chat_user_id, chat_conversation_id) VALUES (?, 'moderator', ?, ?)",
    )
    .bind("hi")
    .bind(user.id)
    .bind(conversation.id)
    .execute(db.pool())
    .await
    .unwrap_err();
    assert!(matches!(Error::from(err), Error::EnumViolation(_)));

    // No row was created
    let listed = MessageRepository::new(&db)
        .list_by_conversation(conversation.id)
        .await
        .unwrap();
    assert!(listed.is_empty());
}

#[tokio::test]
async fn test_model_outside_closed_set_rejected() {
    let db = test_db().await;
    let user = create_user(&db, "model@example.com").await;

    let err = sqlx::query("INSERT INTO chat_conversation (name, model, chat_user_id) VALUES (?, 'gpt-4', ?)")
        .bind("t")
        .bind(user.id)
        .execute(db.pool())
        .await
        .unwrap_err();
    assert!(matches!(Error::from(err), Error::EnumViolation(_)));
}

#[tokio::test]
async fn test_missing_required_column_rejected() {
    let db = test_db().await;
    let user = create_user(&db, "notnull@example.com").await;

    // name has no default and may not be NULL
    let err = sqlx::query("INSERT INTO chat_conversation (name, model, chat_user_id) VALUES (NULL, ?, ?)")
        .bind(AiModel::Mistral7bInstruct.as_str())
        .bind(user.id)
        .execute(db.pool())
        .await
        .unwrap_err();
    assert!(matches!(Error::from(err), Error::NotNullViolation(_)));
}

#[tokio::test]
async fn test_user_delete_cascades_to_whole_subtree() {
    let db = test_db().await;
    let users = UserRepository::new(&db);
    let conversations = ConversationRepository::new(&db);
    let messages = MessageRepository::new(&db);
    let files = FileRepository::new(&db);
    let oauth = OauthAccountRepository::new(&db);
    let installations = InstallationRepository::new(&db);

    let user = create_user(&db, "a@example.com").await;
    let conversation = conversations
        .create(NewConversation::new(user.id, "t", AiModel::Mistral7bInstruct))
        .await
        .unwrap();
    let message = messages
        .create(NewMessage::user(user.id, conversation.id, "hi"))
        .await
        .unwrap();
    let file = files
        .create(
            NewConversationFile::new(user.id, conversation.id, message.id, "fn main() {}")
                .with_title("main")
                .with_language("rust", "rs"),
        )
        .await
        .unwrap();
    let account = oauth
        .create(NewOauthAccount::new(user.id, OauthProvider::Google, "g-1", "a@gmail.com"))
        .await
        .unwrap();
    let installation = installations
        .create(NewGithubAppInstallation::new(user.id, 77, "User", "https://avatars.example/1"))
        .await
        .unwrap();
    let repo = installations
        .add_repository(NewGithubRepository::new(
            installation.id,
            4242,
            "demo",
            "https://github.com/acme/demo",
        ))
        .await
        .unwrap();

    users.delete(user.id).await.unwrap();

    // Every descendant is gone, transitively
    assert!(users.get(user.id).await.unwrap().is_none());
    assert!(conversations.get(conversation.id).await.unwrap().is_none());
    assert!(messages.get(message.id).await.unwrap().is_none());
    assert!(files.get(file.id).await.unwrap().is_none());
    assert!(oauth.get(account.id).await.unwrap().is_none());
    assert!(installations.get(installation.id).await.unwrap().is_none());
    assert!(installations.get_repository(repo.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_conversation_delete_cascades_to_messages_and_files() {
    let db = test_db().await;
    let conversations = ConversationRepository::new(&db);
    let messages = MessageRepository::new(&db);
    let files = FileRepository::new(&db);

    let user = create_user(&db, "a@example.com").await;
    let conversation = conversations
        .create(NewConversation::new(user.id, "t", AiModel::Mistral7bInstruct))
        .await
        .unwrap();
    let message = messages
        .create(NewMessage::user(user.id, conversation.id, "hi"))
        .await
        .unwrap();
    let file = files
        .create(NewConversationFile::new(user.id, conversation.id, message.id, "body"))
        .await
        .unwrap();

    conversations.delete(conversation.id).await.unwrap();

    assert!(messages.get(message.id).await.unwrap().is_none());
    assert!(files.get(file.id).await.unwrap().is_none());

    // The owner is untouched
    assert!(UserRepository::new(&db).get(user.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_message_delete_cascades_to_attached_files() {
    let db = test_db().await;
    let messages = MessageRepository::new(&db);
    let files = FileRepository::new(&db);

    let user = create_user(&db, "a@example.com").await;
    let conversation = ConversationRepository::new(&db)
        .create(NewConversation::new(user.id, "t", AiModel::Mistral7bInstruct))
        .await
        .unwrap();
    let keep = messages
        .create(NewMessage::user(user.id, conversation.id, "keep"))
        .await
        .unwrap();
    let doomed = messages
        .create(NewMessage::user(user.id, conversation.id, "drop"))
        .await
        .unwrap();
    let kept_file = files
        .create(NewConversationFile::new(user.id, conversation.id, keep.id, "kept"))
        .await
        .unwrap();
    let dropped_file = files
        .create(NewConversationFile::new(user.id, conversation.id, doomed.id, "dropped"))
        .await
        .unwrap();

    messages.delete(doomed.id).await.unwrap();

    assert!(files.get(dropped_file.id).await.unwrap().is_none());
    assert!(files.get(kept_file.id).await.unwrap().is_some());
    assert_eq!(files.list_by_conversation(conversation.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_installation_delete_cascades_to_catalog() {
    let db = test_db().await;
    let installations = InstallationRepository::new(&db);

    let user = create_user(&db, "a@example.com").await;
    let installation = installations
        .create(NewGithubAppInstallation::new(user.id, 7, "Organization", "https://avatars.example/7")
            .with_account_name("acme"))
        .await
        .unwrap();
    let repo = installations
        .add_repository(
            NewGithubRepository::new(installation.id, 1, "demo", "https://github.com/acme/demo")
                .private()
                .with_description("internal")
                .with_default_branch("main"),
        )
        .await
        .unwrap();
    assert!(repo.github_repository_is_private);
    assert!(!repo.github_repository_is_archived);

    installations.delete(installation.id).await.unwrap();

    assert!(installations.get_repository(repo.id).await.unwrap().is_none());
    assert!(installations.list_repositories(installation.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_identifiers_are_never_reused() {
    let db = test_db().await;
    let users = UserRepository::new(&db);

    let a = users.create(NewUser::new("a@example.com")).await.unwrap();
    let b = users.create(NewUser::new("b@example.com")).await.unwrap();
    assert!(b.id > a.id);

    users.delete(b.id).await.unwrap();

    let c = users.create(NewUser::new("c@example.com")).await.unwrap();
    assert!(c.id > b.id, "Deleted identifiers must not be reassigned");
}

#[tokio::test]
async fn test_defaults_applied_when_columns_omitted() {
    let db = test_db().await;
    let user = create_user(&db, "a@example.com").await;
    let conversation = ConversationRepository::new(&db)
        .create(NewConversation::new(user.id, "t", AiModel::Mistral7bInstruct))
        .await
        .unwrap();

    // Message inserted without an actor defaults to 'user'
    let message_id = sqlx::query(
        "INSERT INTO chat_conversation_message (message, chat_user_id, chat_conversation_id) VALUES (?, ?, ?)",
    )
    .bind("hi")
    .bind(user.id)
    .bind(conversation.id)
    .execute(db.pool())
    .await
    .unwrap()
    .last_insert_rowid();

    let (actor,): (String,) =
        sqlx::query_as("SELECT actor FROM chat_conversation_message WHERE id = ?")
            .bind(message_id)
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(actor, "user");

    // File inserted without language/extension gets 'text'/'txt' and
    // server-side timestamps
    let file_id = sqlx::query(
        "INSERT INTO chat_conversation_file (text, chat_user_id, chat_conversation_id, chat_conversation_message_id) VALUES (?, ?, ?, ?)",
    )
    .bind("body")
    .bind(user.id)
    .bind(conversation.id)
    .bind(message_id)
    .execute(db.pool())
    .await
    .unwrap()
    .last_insert_rowid();

    let (language, file_extension, created_at): (String, String, String) = sqlx::query_as(
        "SELECT language, file_extension, created_at FROM chat_conversation_file WHERE id = ?",
    )
    .bind(file_id)
    .fetch_one(db.pool())
    .await
    .unwrap();
    assert_eq!(language, "text");
    assert_eq!(file_extension, "txt");
    assert!(!created_at.is_empty());
}

#[tokio::test]
async fn test_rename_refreshes_updated_at() {
    let db = test_db().await;
    let user = create_user(&db, "a@example.com").await;

    // Insert with a clearly-stale updated_at so the trigger's refresh is
    // observable without sleeping
    let conversation_id = sqlx::query(
        "INSERT INTO chat_conversation (name, model, chat_user_id, created_at, updated_at) VALUES (?, ?, ?, '2020-01-01 00:00:00', '2020-01-01 00:00:00')",
    )
    .bind("old name")
    .bind(AiModel::Mistral7bInstruct.as_str())
    .bind(user.id)
    .execute(db.pool())
    .await
    .unwrap()
    .last_insert_rowid();

    ConversationRepository::new(&db)
        .rename(conversation_id, "new name")
        .await
        .unwrap();

    let (name, updated_at): (String, String) =
        sqlx::query_as("SELECT name, updated_at FROM chat_conversation WHERE id = ?")
            .bind(conversation_id)
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(name, "new name");
    assert_ne!(updated_at, "2020-01-01 00:00:00");
}

#[tokio::test]
async fn test_oauth_account_lookup_by_provider_identity() {
    let db = test_db().await;
    let oauth = OauthAccountRepository::new(&db);

    let user = create_user(&db, "a@example.com").await;
    oauth
        .create(NewOauthAccount::new(user.id, OauthProvider::Github, "gh-1", "a@example.com"))
        .await
        .unwrap();
    oauth
        .create(NewOauthAccount::new(user.id, OauthProvider::Google, "g-1", "a@gmail.com"))
        .await
        .unwrap();

    let accounts = oauth.list_by_user(user.id).await.unwrap();
    assert_eq!(accounts.len(), 2);

    let found = oauth
        .find_by_provider_account(OauthProvider::Github, "gh-1")
        .await
        .unwrap()
        .expect("Linked account should be found");
    assert_eq!(found.chat_user_id, user.id);

    assert!(oauth
        .find_by_provider_account(OauthProvider::Google, "gh-1")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_racing_delete_and_insert_leave_no_orphan() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db = Database::new(DatabaseConfig::with_path(dir.path().join("chat.db")))
        .await
        .expect("Failed to create database");

    let user = create_user(&db, "race@example.com").await;
    let conversation = ConversationRepository::new(&db)
        .create(NewConversation::new(user.id, "t", AiModel::Mistral7bInstruct))
        .await
        .unwrap();

    // Race a user delete against a child insert on separate pool
    // connections; whichever order the engine picks, no orphan may
    // survive
    let insert_db = db.clone();
    let user_id = user.id;
    let conversation_id = conversation.id;
    let insert = tokio::spawn(async move {
        MessageRepository::new(&insert_db)
            .create(NewMessage::user(user_id, conversation_id, "racing"))
            .await
    });
    let delete_db = db.clone();
    let delete = tokio::spawn(async move { UserRepository::new(&delete_db).delete(user_id).await });

    let insert_result = insert.await.expect("Insert task panicked");
    delete.await.expect("Delete task panicked").unwrap();

    match insert_result {
        // Committed before the delete; the cascade must have taken it
        Ok(_) => {}
        // Rejected because a parent was already gone, or lost the lock race
        Err(err) => assert!(
            matches!(err, Error::ForeignKeyViolation(_) | Error::TransactionConflict(_)),
            "got {err:?}"
        ),
    }

    let (orphans,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM chat_conversation_message WHERE chat_user_id = ?")
            .bind(user_id)
            .fetch_one(db.pool())
            .await
            .unwrap();
    assert_eq!(orphans, 0, "No message may outlive its deleted owner");

    assert!(UserRepository::new(&db).get(user_id).await.unwrap().is_none());
    assert!(ConversationRepository::new(&db).get(conversation_id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reopening_database_is_a_no_op() {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let path = dir.path().join("chat.db");

    let user_id = {
        let db = Database::new(DatabaseConfig::with_path(&path))
            .await
            .expect("Failed to create database");
        let user = UserRepository::new(&db)
            .create(NewUser::new("a@example.com"))
            .await
            .unwrap();
        db.close().await;
        user.id
    };

    // Second open runs the migration check against the already-migrated
    // store; schema and data survive untouched
    let db = Database::new(DatabaseConfig::with_path(&path))
        .await
        .expect("Failed to reopen database");
    let status = db.migration_status().await.unwrap();
    assert!(!status.needs_migration);
    assert_eq!(status.current_version, status.target_version);

    let user = UserRepository::new(&db).get(user_id).await.unwrap();
    assert_eq!(user.expect("User should survive reopen").primary_email, "a@example.com");
}
