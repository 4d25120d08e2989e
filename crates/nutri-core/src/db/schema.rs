//! SQLite schema definition.

/// Complete database schema for nutri-core.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Documents (one row per document, body stored as a JSON object)
-- ============================================================================

CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    doc_id TEXT NOT NULL,
    data TEXT NOT NULL DEFAULT '{}' CHECK (json_valid(data) AND json_type(data) = 'object'),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (collection, doc_id)
);

CREATE INDEX IF NOT EXISTS idx_documents_collection ON documents(collection);

-- ============================================================================
-- Authentication
-- ============================================================================

CREATE TABLE IF NOT EXISTS auth_accounts (
    uid TEXT PRIMARY KEY,
    email TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password_hash TEXT NOT NULL,                 -- hex PBKDF2-HMAC-SHA256
    salt TEXT NOT NULL,                          -- hex
    hash_iterations INTEGER NOT NULL,            -- PBKDF2 rounds used for password_hash
    display_name TEXT,
    disabled INTEGER NOT NULL DEFAULT 0,
    failed_attempts INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,                    -- RFC 3339
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- Outbox of reset emails to be delivered
CREATE TABLE IF NOT EXISTS password_reset_requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    uid TEXT NOT NULL REFERENCES auth_accounts(uid) ON DELETE CASCADE,
    email TEXT NOT NULL,
    requested_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_password_resets_uid ON password_reset_requests(uid);

-- Persisted session (single row, uid NULL when signed out)
CREATE TABLE IF NOT EXISTS auth_session (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    uid TEXT REFERENCES auth_accounts(uid) ON DELETE SET NULL,
    signed_in_at TEXT
);

INSERT OR IGNORE INTO auth_session (id, uid, signed_in_at) VALUES (1, NULL, NULL);
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_schema_valid() {
        let conn = Connection::open_in_memory().unwrap();
        let result = conn.execute_batch(SCHEMA);
        assert!(result.is_ok(), "Schema should be valid SQL: {:?}", result);
    }

    #[test]
    fn test_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM auth_session", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_document_body_must_be_object() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute(
            "INSERT INTO documents (collection, doc_id, data) VALUES ('users', 'u1', '[1,2]')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO documents (collection, doc_id, data) VALUES ('users', 'u1', 'not json')",
            [],
        );
        assert!(result.is_err());

        let result = conn.execute(
            "INSERT INTO documents (collection, doc_id, data) VALUES ('users', 'u1', '{\"userType\":\"doctor\"}')",
            [],
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_session_single_row() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(SCHEMA).unwrap();

        let result = conn.execute("INSERT INTO auth_session (id, uid) VALUES (2, NULL)", []);
        assert!(result.is_err());
    }
}
