//! SQLite schema definition.

/// Complete database schema for the client store.
pub const SCHEMA: &str = r#"
-- ============================================================================
-- Client Storage (namespaced key-value pairs, last writer wins)
-- ============================================================================

CREATE TABLE IF NOT EXISTS client_storage (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,                         -- JSON or opaque token
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// Storage key holding the bounded diagnosis history (JSON array).
pub const HISTORY_KEY: &str = "medidiagnose_history";

/// Storage key holding the bearer token for the API layer.
pub const TOKEN_KEY: &str = "medidiagnose_token";

/// Storage key holding the signed-in user profile (JSON object).
pub const USER_KEY: &str = "medidiagnose_user";
