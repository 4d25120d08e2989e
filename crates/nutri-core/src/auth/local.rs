//! Auth provider backed by the embedded database.

use chrono::{DateTime, Duration, Utc};
use pbkdf2::pbkdf2_hmac;
use rand::RngCore;
use sha2::Sha256;
use subtle::ConstantTimeEq;
use uuid::Uuid;

use super::{AuthError, AuthProvider, AuthResult, AuthUser};
use crate::config::CoreConfig;
use crate::db::{AccountRow, Database, DbError};
use crate::validation;

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Window after sign-in during which a password change is allowed.
const RECENT_LOGIN_MINUTES: i64 = 5;

/// Hex PBKDF2-HMAC-SHA256 of the password.
fn hash_password(salt: &str, password: &str, iterations: u32) -> String {
    let mut key = [0u8; HASH_LEN];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt.as_bytes(), iterations, &mut key);
    hex::encode(key)
}

/// Constant-time check against the stored hash, using the row's own parameters.
fn verify_password(row: &AccountRow, password: &str) -> bool {
    let candidate = hash_password(&row.salt, password, row.hash_iterations);
    candidate.as_bytes().ct_eq(row.password_hash.as_bytes()).into()
}

fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

fn to_user(row: AccountRow) -> AuthUser {
    AuthUser {
        uid: row.uid,
        email: row.email,
        display_name: row.display_name,
        created_at: row.created_at,
    }
}

/// Email/password accounts stored in `auth_accounts`, session in `auth_session`.
pub struct LocalAuth<'a> {
    db: &'a Database,
    config: &'a CoreConfig,
}

impl<'a> LocalAuth<'a> {
    pub fn new(db: &'a Database, config: &'a CoreConfig) -> Self {
        Self { db, config }
    }

    /// Account of the signed-in user.
    fn session_account(&self) -> AuthResult<AccountRow> {
        let session = self.db.get_session()?;
        let uid = session.uid.ok_or(AuthError::NoCurrentUser)?;
        self.db.get_account(&uid)?.ok_or(AuthError::NoCurrentUser)
    }

    fn start_session(&self, uid: &str) -> AuthResult<()> {
        let now = Utc::now().to_rfc3339();
        self.db.set_session(Some(uid), Some(&now))?;
        Ok(())
    }

    fn check_email(email: &str) -> AuthResult<()> {
        if validation::is_valid_email(email) {
            Ok(())
        } else {
            Err(AuthError::InvalidEmail)
        }
    }

    fn check_strength(&self, password: &str) -> AuthResult<()> {
        validation::validate_password_length(password, self.config.min_password_length())
            .map_err(|_| AuthError::WeakPassword)
    }
}

impl AuthProvider for LocalAuth<'_> {
    fn sign_up(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let email = email.trim();
        Self::check_email(email)?;
        self.check_strength(password)?;

        let salt = generate_salt();
        let iterations = self.config.password_hash_iterations();
        let row = AccountRow {
            uid: Uuid::new_v4().simple().to_string(),
            email: email.to_string(),
            password_hash: hash_password(&salt, password, iterations),
            salt,
            hash_iterations: iterations,
            display_name: None,
            disabled: false,
            failed_attempts: 0,
            created_at: Utc::now().to_rfc3339(),
        };

        self.db.insert_account(&row).map_err(|e| match e {
            DbError::Constraint(_) => AuthError::EmailAlreadyInUse,
            other => other.into(),
        })?;
        self.start_session(&row.uid)?;

        tracing::info!(uid = %row.uid, "account created");
        Ok(to_user(row))
    }

    fn sign_in(&self, email: &str, password: &str) -> AuthResult<AuthUser> {
        let email = email.trim();
        Self::check_email(email)?;

        let row = self
            .db
            .get_account_by_email(email)?
            .ok_or(AuthError::UserNotFound)?;

        if row.disabled {
            return Err(AuthError::UserDisabled);
        }
        if row.failed_attempts >= self.config.max_failed_sign_ins() {
            return Err(AuthError::TooManyRequests);
        }

        if !verify_password(&row, password) {
            let attempts = row.failed_attempts + 1;
            self.db.set_failed_attempts(&row.uid, attempts)?;
            tracing::debug!(uid = %row.uid, attempts, "sign-in rejected");
            return Err(if attempts >= self.config.max_failed_sign_ins() {
                AuthError::TooManyRequests
            } else {
                AuthError::WrongPassword
            });
        }

        if row.failed_attempts > 0 {
            self.db.set_failed_attempts(&row.uid, 0)?;
        }
        self.start_session(&row.uid)?;
        Ok(to_user(AccountRow {
            failed_attempts: 0,
            ..row
        }))
    }

    fn sign_out(&self) -> AuthResult<()> {
        self.db.set_session(None, None)?;
        Ok(())
    }

    fn current_user(&self) -> AuthResult<Option<AuthUser>> {
        match self.session_account() {
            Ok(row) => Ok(Some(to_user(row))),
            Err(AuthError::NoCurrentUser) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn send_password_reset(&self, email: &str) -> AuthResult<()> {
        let email = email.trim();
        Self::check_email(email)?;

        let row = self
            .db
            .get_account_by_email(email)?
            .ok_or(AuthError::UserNotFound)?;

        self.db.record_password_reset(&row.uid, &row.email)?;
        // A recorded reset lifts the sign-in lockout.
        self.db.set_failed_attempts(&row.uid, 0)?;
        tracing::info!(uid = %row.uid, "password reset requested");
        Ok(())
    }

    fn reauthenticate(&self, password: &str) -> AuthResult<()> {
        let row = self.session_account()?;
        if !verify_password(&row, password) {
            return Err(AuthError::WrongPassword);
        }
        self.start_session(&row.uid)
    }

    fn update_display_name(&self, display_name: &str) -> AuthResult<AuthUser> {
        let row = self.session_account()?;
        self.db.update_account_display_name(&row.uid, display_name)?;
        Ok(to_user(AccountRow {
            display_name: Some(display_name.to_string()),
            ..row
        }))
    }

    fn update_password(&self, new_password: &str) -> AuthResult<()> {
        let row = self.session_account()?;
        self.check_strength(new_password)?;

        let session = self.db.get_session()?;
        let recent = session
            .signed_in_at
            .as_deref()
            .and_then(|at| DateTime::parse_from_rfc3339(at).ok())
            .map(|at| Utc::now() - at.with_timezone(&Utc) <= Duration::minutes(RECENT_LOGIN_MINUTES))
            .unwrap_or(false);
        if !recent {
            return Err(AuthError::RequiresRecentLogin);
        }

        let salt = generate_salt();
        let iterations = self.config.password_hash_iterations();
        self.db.update_account_password(
            &row.uid,
            &hash_password(&salt, new_password, iterations),
            &salt,
            iterations,
        )?;
        tracing::info!(uid = %row.uid, "password changed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (Database, CoreConfig) {
        let config = CoreConfig::default().with_password_hash_iterations(1_000);
        (Database::open_in_memory().unwrap(), config)
    }

    #[test]
    fn test_sign_up_signs_in() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);

        let user = auth.sign_up("ana@example.com", "secret1").unwrap();
        assert_eq!(user.email, "ana@example.com");
        assert_eq!(user.uid.len(), 32);

        let current = auth.current_user().unwrap().unwrap();
        assert_eq!(current.uid, user.uid);
    }

    #[test]
    fn test_sign_up_errors() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);

        assert_eq!(auth.sign_up("not-an-email", "secret1"), Err(AuthError::InvalidEmail));
        assert_eq!(auth.sign_up("ana@example.com", "12345"), Err(AuthError::WeakPassword));

        auth.sign_up("ana@example.com", "secret1").unwrap();
        assert_eq!(
            auth.sign_up("ANA@example.com", "secret2"),
            Err(AuthError::EmailAlreadyInUse)
        );
    }

    #[test]
    fn test_sign_in() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);
        let created = auth.sign_up("ana@example.com", "secret1").unwrap();
        auth.sign_out().unwrap();
        assert!(auth.current_user().unwrap().is_none());

        assert_eq!(auth.sign_in("ana@example.com", "wrong!!"), Err(AuthError::WrongPassword));
        assert_eq!(auth.sign_in("bob@example.com", "secret1"), Err(AuthError::UserNotFound));

        let user = auth.sign_in("ana@example.com", "secret1").unwrap();
        assert_eq!(user.uid, created.uid);
        assert_eq!(db.get_account(&user.uid).unwrap().unwrap().failed_attempts, 0);
    }

    #[test]
    fn test_lockout_until_reset() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);
        auth.sign_up("ana@example.com", "secret1").unwrap();

        for _ in 0..4 {
            assert_eq!(auth.sign_in("ana@example.com", "nope"), Err(AuthError::WrongPassword));
        }
        assert_eq!(auth.sign_in("ana@example.com", "nope"), Err(AuthError::TooManyRequests));
        // Locked even with the right password
        assert_eq!(auth.sign_in("ana@example.com", "secret1"), Err(AuthError::TooManyRequests));

        auth.send_password_reset("ana@example.com").unwrap();
        assert!(auth.sign_in("ana@example.com", "secret1").is_ok());
    }

    #[test]
    fn test_disabled_account() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);
        let user = auth.sign_up("ana@example.com", "secret1").unwrap();
        db.set_account_disabled(&user.uid, true).unwrap();

        assert_eq!(auth.sign_in("ana@example.com", "secret1"), Err(AuthError::UserDisabled));
    }

    #[test]
    fn test_password_reset_unknown_email() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);
        assert_eq!(auth.send_password_reset("ghost@example.com"), Err(AuthError::UserNotFound));
    }

    #[test]
    fn test_change_password_flow() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);
        auth.sign_up("ana@example.com", "secret1").unwrap();

        assert_eq!(auth.reauthenticate("wrong!!"), Err(AuthError::WrongPassword));
        auth.reauthenticate("secret1").unwrap();
        assert_eq!(auth.update_password("123"), Err(AuthError::WeakPassword));
        auth.update_password("secret2").unwrap();

        auth.sign_out().unwrap();
        assert_eq!(auth.sign_in("ana@example.com", "secret1"), Err(AuthError::WrongPassword));
        assert!(auth.sign_in("ana@example.com", "secret2").is_ok());
    }

    #[test]
    fn test_stale_session_requires_recent_login() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);
        let user = auth.sign_up("ana@example.com", "secret1").unwrap();

        let stale = (Utc::now() - Duration::hours(1)).to_rfc3339();
        db.set_session(Some(&user.uid), Some(&stale)).unwrap();

        assert_eq!(auth.update_password("secret2"), Err(AuthError::RequiresRecentLogin));
    }

    #[test]
    fn test_signed_out_operations() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);

        assert_eq!(auth.reauthenticate("secret1"), Err(AuthError::NoCurrentUser));
        assert_eq!(auth.update_display_name("Ana"), Err(AuthError::NoCurrentUser));
        assert_eq!(auth.update_password("secret2"), Err(AuthError::NoCurrentUser));
    }

    #[test]
    fn test_update_display_name() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);
        auth.sign_up("ana@example.com", "secret1").unwrap();

        let user = auth.update_display_name("Dra. Ana").unwrap();
        assert_eq!(user.display_name.as_deref(), Some("Dra. Ana"));
        let current = auth.current_user().unwrap().unwrap();
        assert_eq!(current.display_name.as_deref(), Some("Dra. Ana"));
    }

    #[test]
    fn test_hash_is_iterated_and_salted() {
        let once = hash_password("abcd", "secret1", 1);
        assert_eq!(once.len(), HASH_LEN * 2);
        assert_ne!(once, hash_password("abcd", "secret1", 2));
        assert_ne!(once, hash_password("abce", "secret1", 1));
        assert_eq!(once, hash_password("abcd", "secret1", 1));
    }

    #[test]
    fn test_stored_rounds_used_for_verification() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);
        let user = auth.sign_up("ana@example.com", "secret1").unwrap();
        auth.sign_out().unwrap();

        let row = db.get_account(&user.uid).unwrap().unwrap();
        assert_eq!(row.hash_iterations, 1_000);
        assert_eq!(row.password_hash, hash_password(&row.salt, "secret1", 1_000));

        // Raising the configured rounds must not lock out existing accounts
        let stronger = CoreConfig::default().with_password_hash_iterations(2_000);
        let auth = LocalAuth::new(&db, &stronger);
        assert!(auth.sign_in("ana@example.com", "secret1").is_ok());

        auth.update_password("secret2").unwrap();
        let row = db.get_account(&user.uid).unwrap().unwrap();
        assert_eq!(row.hash_iterations, 2_000);
    }

    #[test]
    fn test_verify_rejects_truncated_hash() {
        let (db, config) = setup();
        let auth = LocalAuth::new(&db, &config);
        let user = auth.sign_up("ana@example.com", "secret1").unwrap();

        let mut row = db.get_account(&user.uid).unwrap().unwrap();
        assert!(verify_password(&row, "secret1"));
        assert!(!verify_password(&row, "secret2"));

        row.password_hash.truncate(10);
        assert!(!verify_password(&row, "secret1"));
    }
}
