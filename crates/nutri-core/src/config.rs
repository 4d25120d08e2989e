//! Core runtime configuration.
//!
//! Resolved once at startup and passed by reference into every service. Nothing in the
//! crate reads environment variables after construction.

use std::path::{Path, PathBuf};

use crate::validation::{ValidationError, ValidationResult};

/// Collection holding patient records.
pub const DEFAULT_PATIENTS_COLLECTION: &str = "pacientes";
/// Collection holding user profiles (document id = auth uid).
pub const DEFAULT_USERS_COLLECTION: &str = "users";
/// PBKDF2-HMAC-SHA256 rounds for new password hashes.
pub const DEFAULT_PASSWORD_HASH_ITERATIONS: u32 = 600_000;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    database_path: Option<PathBuf>,
    patients_collection: String,
    users_collection: String,
    min_password_length: usize,
    max_failed_sign_ins: u32,
    weight_chart_points: usize,
    password_hash_iterations: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            patients_collection: DEFAULT_PATIENTS_COLLECTION.to_string(),
            users_collection: DEFAULT_USERS_COLLECTION.to_string(),
            min_password_length: 6,
            max_failed_sign_ins: 5,
            weight_chart_points: 4,
            password_hash_iterations: DEFAULT_PASSWORD_HASH_ITERATIONS,
        }
    }
}

impl CoreConfig {
    /// Create a config for an on-disk database, other settings default.
    pub fn with_database_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            database_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Override collection names. Both must be non-empty.
    pub fn with_collections(
        mut self,
        patients: impl Into<String>,
        users: impl Into<String>,
    ) -> ValidationResult<Self> {
        let patients = patients.into();
        let users = users.into();
        if patients.trim().is_empty() {
            return Err(ValidationError::MissingField("patients_collection"));
        }
        if users.trim().is_empty() {
            return Err(ValidationError::MissingField("users_collection"));
        }
        self.patients_collection = patients;
        self.users_collection = users;
        Ok(self)
    }

    /// Override the PBKDF2 round count used when hashing new passwords.
    /// Existing hashes keep the count they were created with.
    pub fn with_password_hash_iterations(mut self, iterations: u32) -> Self {
        self.password_hash_iterations = iterations.max(1);
        self
    }

    /// Build from `NUTRI_DB_PATH`, `NUTRI_PATIENTS_COLLECTION` and `NUTRI_USERS_COLLECTION`.
    pub fn from_env() -> ValidationResult<Self> {
        let mut config = Self::default();
        if let Ok(path) = std::env::var("NUTRI_DB_PATH") {
            if !path.trim().is_empty() {
                config.database_path = Some(PathBuf::from(path));
            }
        }

        let patients = std::env::var("NUTRI_PATIENTS_COLLECTION")
            .unwrap_or_else(|_| DEFAULT_PATIENTS_COLLECTION.to_string());
        let users = std::env::var("NUTRI_USERS_COLLECTION")
            .unwrap_or_else(|_| DEFAULT_USERS_COLLECTION.to_string());

        config.with_collections(patients, users)
    }

    /// `None` means in-memory.
    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    pub fn patients_collection(&self) -> &str {
        &self.patients_collection
    }

    pub fn users_collection(&self) -> &str {
        &self.users_collection
    }

    pub fn min_password_length(&self) -> usize {
        self.min_password_length
    }

    /// Consecutive failed sign-ins before an account answers `too-many-requests`.
    pub fn max_failed_sign_ins(&self) -> u32 {
        self.max_failed_sign_ins
    }

    /// Number of most recent consultations plotted in the weight chart.
    pub fn weight_chart_points(&self) -> usize {
        self.weight_chart_points
    }

    pub fn password_hash_iterations(&self) -> u32 {
        self.password_hash_iterations
    }
}
