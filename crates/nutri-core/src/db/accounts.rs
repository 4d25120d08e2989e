//! Auth account database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};

/// A stored auth account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountRow {
    pub uid: String,
    pub email: String,
    /// Hex PBKDF2-HMAC-SHA256 of the password
    pub password_hash: String,
    /// Hex-encoded salt
    pub salt: String,
    /// PBKDF2 rounds the hash was derived with
    pub hash_iterations: u32,
    pub display_name: Option<String>,
    pub disabled: bool,
    /// Consecutive failed sign-ins
    pub failed_attempts: u32,
    /// RFC 3339
    pub created_at: String,
}

/// Persisted sign-in state.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRow {
    pub uid: Option<String>,
    /// RFC 3339; refreshed on re-authentication
    pub signed_in_at: Option<String>,
}

fn account_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok(AccountRow {
        uid: row.get(0)?,
        email: row.get(1)?,
        password_hash: row.get(2)?,
        salt: row.get(3)?,
        hash_iterations: row.get(4)?,
        display_name: row.get(5)?,
        disabled: row.get::<_, i64>(6)? != 0,
        failed_attempts: row.get::<_, i64>(7)? as u32,
        created_at: row.get(8)?,
    })
}

impl Database {
    /// Insert a new account. Fails with a constraint error if the email is taken.
    pub fn insert_account(&self, account: &AccountRow) -> DbResult<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO auth_accounts (
                    uid, email, password_hash, salt, hash_iterations,
                    display_name, disabled, failed_attempts, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    account.uid,
                    account.email,
                    account.password_hash,
                    account.salt,
                    account.hash_iterations,
                    account.display_name,
                    account.disabled as i64,
                    account.failed_attempts as i64,
                    account.created_at,
                ],
            )
            .map_err(|e| match e {
                rusqlite::Error::SqliteFailure(err, _)
                    if err.code == rusqlite::ErrorCode::ConstraintViolation =>
                {
                    DbError::Constraint(format!("account already exists: {}", account.email))
                }
                other => DbError::Sqlite(other),
            })?;
        Ok(())
    }

    /// Get an account by uid.
    pub fn get_account(&self, uid: &str) -> DbResult<Option<AccountRow>> {
        self.conn
            .query_row(
                r#"
                SELECT uid, email, password_hash, salt, hash_iterations,
                       display_name, disabled, failed_attempts, created_at
                FROM auth_accounts
                WHERE uid = ?
                "#,
                [uid],
                account_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get an account by email (case-insensitive).
    pub fn get_account_by_email(&self, email: &str) -> DbResult<Option<AccountRow>> {
        self.conn
            .query_row(
                r#"
                SELECT uid, email, password_hash, salt, hash_iterations,
                       display_name, disabled, failed_attempts, created_at
                FROM auth_accounts
                WHERE email = ?
                "#,
                [email],
                account_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    pub fn set_failed_attempts(&self, uid: &str, attempts: u32) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE auth_accounts SET failed_attempts = ?2, updated_at = datetime('now') WHERE uid = ?1",
            params![uid, attempts as i64],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn set_account_disabled(&self, uid: &str, disabled: bool) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE auth_accounts SET disabled = ?2, updated_at = datetime('now') WHERE uid = ?1",
            params![uid, disabled as i64],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn update_account_display_name(&self, uid: &str, display_name: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE auth_accounts SET display_name = ?2, updated_at = datetime('now') WHERE uid = ?1",
            params![uid, display_name],
        )?;
        Ok(rows_affected > 0)
    }

    pub fn update_account_password(
        &self,
        uid: &str,
        password_hash: &str,
        salt: &str,
        hash_iterations: u32,
    ) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE auth_accounts SET
                password_hash = ?2,
                salt = ?3,
                hash_iterations = ?4,
                failed_attempts = 0,
                updated_at = datetime('now')
            WHERE uid = ?1
            "#,
            params![uid, password_hash, salt, hash_iterations],
        )?;
        Ok(rows_affected > 0)
    }

    /// Queue a password reset email.
    pub fn record_password_reset(&self, uid: &str, email: &str) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO password_reset_requests (uid, email) VALUES (?1, ?2)",
            params![uid, email],
        )?;
        Ok(())
    }

    pub fn count_password_resets(&self, uid: &str) -> DbResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM password_reset_requests WHERE uid = ?",
            [uid],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Read the persisted session.
    pub fn get_session(&self) -> DbResult<SessionRow> {
        self.conn
            .query_row(
                "SELECT uid, signed_in_at FROM auth_session WHERE id = 1",
                [],
                |row| {
                    Ok(SessionRow {
                        uid: row.get(0)?,
                        signed_in_at: row.get(1)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| DbError::NotFound("auth_session".into()))
    }

    /// Persist the signed-in uid (or `None` to sign out).
    pub fn set_session(&self, uid: Option<&str>, signed_in_at: Option<&str>) -> DbResult<()> {
        self.conn.execute(
            "UPDATE auth_session SET uid = ?1, signed_in_at = ?2 WHERE id = 1",
            params![uid, signed_in_at],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn account(uid: &str, email: &str) -> AccountRow {
        AccountRow {
            uid: uid.into(),
            email: email.into(),
            password_hash: "hash".into(),
            salt: "salt".into(),
            hash_iterations: 1,
            display_name: None,
            disabled: false,
            failed_attempts: 0,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();
        db.insert_account(&account("u1", "ana@example.com")).unwrap();

        let by_uid = db.get_account("u1").unwrap().unwrap();
        assert_eq!(by_uid.email, "ana@example.com");

        // Email lookup ignores case
        let by_email = db.get_account_by_email("ANA@example.com").unwrap().unwrap();
        assert_eq!(by_email.uid, "u1");
    }

    #[test]
    fn test_duplicate_email() {
        let db = setup_db();
        db.insert_account(&account("u1", "ana@example.com")).unwrap();
        let result = db.insert_account(&account("u2", "Ana@Example.com"));
        assert!(matches!(result, Err(DbError::Constraint(_))));
    }

    #[test]
    fn test_password_update_resets_failures() {
        let db = setup_db();
        db.insert_account(&account("u1", "ana@example.com")).unwrap();
        db.set_failed_attempts("u1", 3).unwrap();

        db.update_account_password("u1", "new-hash", "new-salt", 20_000).unwrap();

        let row = db.get_account("u1").unwrap().unwrap();
        assert_eq!(row.password_hash, "new-hash");
        assert_eq!(row.hash_iterations, 20_000);
        assert_eq!(row.failed_attempts, 0);
    }

    #[test]
    fn test_session_round_trip() {
        let db = setup_db();
        db.insert_account(&account("u1", "ana@example.com")).unwrap();

        assert_eq!(db.get_session().unwrap().uid, None);

        db.set_session(Some("u1"), Some("2024-03-15T09:30:00+00:00")).unwrap();
        assert_eq!(db.get_session().unwrap().uid, Some("u1".into()));

        db.set_session(None, None).unwrap();
        assert_eq!(db.get_session().unwrap().uid, None);
    }

    #[test]
    fn test_password_resets() {
        let db = setup_db();
        db.insert_account(&account("u1", "ana@example.com")).unwrap();
        db.record_password_reset("u1", "ana@example.com").unwrap();
        db.record_password_reset("u1", "ana@example.com").unwrap();
        assert_eq!(db.count_password_resets("u1").unwrap(), 2);
    }
}
