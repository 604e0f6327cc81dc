//! Database migrations
//!
//! This module manages SQLite schema migrations for the chat store.
//! Each migration is one atomic, independently recorded structural change;
//! applying the full set to an already-migrated store is a no-op, and a
//! partially applied store is detectable through `migration_status`.

use sqlx::SqlitePool;

/// Current schema version
pub const CURRENT_VERSION: i32 = 4;

/// SQL for creating the migrations tracking table
const CREATE_MIGRATIONS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS _migrations (
        version INTEGER PRIMARY KEY NOT NULL,
        applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );
"#;

/// Migration 1: User accounts and linked OAuth identities
///
/// `chat_user` is the root of the ownership tree; every other table
/// hangs off it directly or transitively with ON DELETE CASCADE.
const MIGRATION_V1: &str = r#"
    -- Users table
    CREATE TABLE IF NOT EXISTS chat_user (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        primary_email TEXT NOT NULL UNIQUE,
        hashed_password TEXT,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    -- OAuth identities linked to a user; one user may hold several
    CREATE TABLE IF NOT EXISTS chat_user_oauth_account (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        provider TEXT NOT NULL CHECK (provider IN ('github', 'google')),
        oauth_user_id TEXT NOT NULL,
        oauth_email TEXT NOT NULL,
        chat_user_id INTEGER NOT NULL REFERENCES chat_user(id) ON DELETE CASCADE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_chat_user_oauth_account_chat_user_id
        ON chat_user_oauth_account(chat_user_id);
    CREATE INDEX IF NOT EXISTS idx_chat_user_oauth_account_provider
        ON chat_user_oauth_account(provider, oauth_user_id);
"#;

/// Migration 2: Conversations, messages, and attached files
const MIGRATION_V2: &str = r#"
    -- Conversation threads, pinned to one model for their lifetime
    CREATE TABLE IF NOT EXISTS chat_conversation (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        model TEXT NOT NULL CHECK (model IN (
            'OpenAssistant/oasst-sft-4-pythia-12b-epoch-3.5',
            'mistralai/Mistral-7B-Instruct-v0.1'
        )),
        chat_user_id INTEGER NOT NULL REFERENCES chat_user(id) ON DELETE CASCADE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_chat_conversation_chat_user_id
        ON chat_conversation(chat_user_id);

    -- Append-only message log; ordering follows the identifier
    CREATE TABLE IF NOT EXISTS chat_conversation_message (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        message TEXT NOT NULL,
        actor TEXT NOT NULL DEFAULT 'user' CHECK (actor IN ('user', 'assistant')),
        chat_user_id INTEGER NOT NULL REFERENCES chat_user(id) ON DELETE CASCADE,
        chat_conversation_id INTEGER NOT NULL REFERENCES chat_conversation(id) ON DELETE CASCADE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_chat_conversation_message_chat_user_id
        ON chat_conversation_message(chat_user_id);
    CREATE INDEX IF NOT EXISTS idx_chat_conversation_message_chat_conversation_id
        ON chat_conversation_message(chat_conversation_id);

    -- File artifacts produced within a specific message
    CREATE TABLE IF NOT EXISTS chat_conversation_file (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT,
        language TEXT NOT NULL DEFAULT 'text',
        file_extension TEXT NOT NULL DEFAULT 'txt',
        text TEXT NOT NULL,
        chat_user_id INTEGER NOT NULL REFERENCES chat_user(id) ON DELETE CASCADE,
        chat_conversation_id INTEGER NOT NULL REFERENCES chat_conversation(id) ON DELETE CASCADE,
        chat_conversation_message_id INTEGER NOT NULL REFERENCES chat_conversation_message(id) ON DELETE CASCADE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_chat_conversation_file_chat_user_id
        ON chat_conversation_file(chat_user_id);
    CREATE INDEX IF NOT EXISTS idx_chat_conversation_file_chat_conversation_id
        ON chat_conversation_file(chat_conversation_id);
    CREATE INDEX IF NOT EXISTS idx_chat_conversation_file_chat_conversation_message_id
        ON chat_conversation_file(chat_conversation_message_id);
"#;

/// Migration 3: GitHub App installations and their repositories
const MIGRATION_V3: &str = r#"
    -- One installation of the GitHub App onto a GitHub user or org
    CREATE TABLE IF NOT EXISTS chat_github_app_installation (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        github_account_type TEXT NOT NULL,
        github_account_avatar_url TEXT NOT NULL,
        github_account_id INTEGER NOT NULL,
        github_account_name TEXT,
        chat_user_id INTEGER NOT NULL REFERENCES chat_user(id) ON DELETE CASCADE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_chat_github_app_installation_chat_user_id
        ON chat_github_app_installation(chat_user_id);

    -- Repositories visible to an installation; mostly nullable mirrors
    -- of the upstream metadata
    CREATE TABLE IF NOT EXISTS chat_github_app_installation_repository (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        github_repository_id INTEGER NOT NULL,
        github_repository_name TEXT NOT NULL,
        github_repository_description TEXT,
        github_repository_size INTEGER,
        github_repository_language TEXT,
        github_repository_license TEXT,
        github_repository_url TEXT NOT NULL,
        github_repository_website_url TEXT,
        github_repository_default_branch TEXT,
        github_repository_is_private INTEGER NOT NULL,
        github_repository_is_fork INTEGER,
        github_repository_is_template INTEGER,
        github_repository_is_archived INTEGER NOT NULL,
        chat_github_app_installation_id INTEGER NOT NULL
            REFERENCES chat_github_app_installation(id) ON DELETE CASCADE,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
    );

    CREATE INDEX IF NOT EXISTS idx_chat_github_app_installation_repository_installation_id
        ON chat_github_app_installation_repository(chat_github_app_installation_id);
"#;

/// Migration 4: updated_at refresh triggers
///
/// Each trigger only fires when the statement did not set updated_at
/// itself, so an explicit caller-supplied value wins. Recursive triggers
/// are off by default in SQLite, so the inner UPDATE does not re-fire.
const MIGRATION_V4: &str = r#"
    CREATE TRIGGER IF NOT EXISTS chat_user_touch_updated_at
    AFTER UPDATE ON chat_user
    FOR EACH ROW WHEN NEW.updated_at = OLD.updated_at
    BEGIN
        UPDATE chat_user SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
    END;

    CREATE TRIGGER IF NOT EXISTS chat_user_oauth_account_touch_updated_at
    AFTER UPDATE ON chat_user_oauth_account
    FOR EACH ROW WHEN NEW.updated_at = OLD.updated_at
    BEGIN
        UPDATE chat_user_oauth_account SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
    END;

    CREATE TRIGGER IF NOT EXISTS chat_conversation_touch_updated_at
    AFTER UPDATE ON chat_conversation
    FOR EACH ROW WHEN NEW.updated_at = OLD.updated_at
    BEGIN
        UPDATE chat_conversation SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
    END;

    CREATE TRIGGER IF NOT EXISTS chat_conversation_message_touch_updated_at
    AFTER UPDATE ON chat_conversation_message
    FOR EACH ROW WHEN NEW.updated_at = OLD.updated_at
    BEGIN
        UPDATE chat_conversation_message SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
    END;

    CREATE TRIGGER IF NOT EXISTS chat_conversation_file_touch_updated_at
    AFTER UPDATE ON chat_conversation_file
    FOR EACH ROW WHEN NEW.updated_at = OLD.updated_at
    BEGIN
        UPDATE chat_conversation_file SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
    END;

    CREATE TRIGGER IF NOT EXISTS chat_github_app_installation_touch_updated_at
    AFTER UPDATE ON chat_github_app_installation
    FOR EACH ROW WHEN NEW.updated_at = OLD.updated_at
    BEGIN
        UPDATE chat_github_app_installation SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
    END;

    CREATE TRIGGER IF NOT EXISTS chat_github_app_installation_repository_touch_updated_at
    AFTER UPDATE ON chat_github_app_installation_repository
    FOR EACH ROW WHEN NEW.updated_at = OLD.updated_at
    BEGIN
        UPDATE chat_github_app_installation_repository SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
    END;
"#;

/// Get the current schema version from the database
async fn get_current_version(pool: &SqlitePool) -> anyhow::Result<i32> {
    // Ensure migrations table exists
    sqlx::raw_sql(CREATE_MIGRATIONS_TABLE).execute(pool).await?;

    // Get the latest version
    let row: Option<(i32,)> = sqlx::query_as("SELECT MAX(version) FROM _migrations")
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|(v,)| v).unwrap_or(0))
}

/// Record that a migration has been applied
async fn record_migration(pool: &SqlitePool, version: i32) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO _migrations (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;
    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
    let current_version = get_current_version(pool).await?;

    tracing::info!(
        current_version = current_version,
        target_version = CURRENT_VERSION,
        "Checking database migrations"
    );

    if current_version >= CURRENT_VERSION {
        tracing::debug!("Database is up to date");
        return Ok(());
    }

    // Apply migrations in order
    if current_version < 1 {
        tracing::info!("Applying migration v1: Users and OAuth accounts");
        sqlx::raw_sql(MIGRATION_V1).execute(pool).await?;
        record_migration(pool, 1).await?;
    }

    if current_version < 2 {
        tracing::info!("Applying migration v2: Conversations, messages, and files");
        sqlx::raw_sql(MIGRATION_V2).execute(pool).await?;
        record_migration(pool, 2).await?;
    }

    if current_version < 3 {
        tracing::info!("Applying migration v3: GitHub App installations");
        sqlx::raw_sql(MIGRATION_V3).execute(pool).await?;
        record_migration(pool, 3).await?;
    }

    if current_version < 4 {
        tracing::info!("Applying migration v4: updated_at refresh triggers");
        sqlx::raw_sql(MIGRATION_V4).execute(pool).await?;
        record_migration(pool, 4).await?;
    }

    tracing::info!("Database migrations completed");
    Ok(())
}

/// Check if the database needs migrations
pub async fn needs_migration(pool: &SqlitePool) -> anyhow::Result<bool> {
    let current_version = get_current_version(pool).await?;
    Ok(current_version < CURRENT_VERSION)
}

/// Get migration status information
pub async fn migration_status(pool: &SqlitePool) -> anyhow::Result<MigrationStatus> {
    let current_version = get_current_version(pool).await?;
    Ok(MigrationStatus {
        current_version,
        target_version: CURRENT_VERSION,
        needs_migration: current_version < CURRENT_VERSION,
    })
}

/// Migration status information
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Current schema version in the database
    pub current_version: i32,
    /// Target schema version (latest)
    pub target_version: i32,
    /// Whether migrations need to be run
    pub needs_migration: bool,
}
