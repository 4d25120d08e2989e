//! Nutri Core Library
//!
//! Shared core for a nutritionist-practice mobile app. Doctors manage patients,
//! consultations and suggested menus; patients follow their menu, weight
//! evolution and personal tasks, and contact their doctor over WhatsApp.
//!
//! # Architecture
//!
//! ```text
//!            Mobile UI (Swift / Kotlin)
//!                      │  UniFFI
//!              ┌───────▼────────┐
//!              │   NutriCore    │  Arc<Mutex<Database>> + CoreConfig
//!              └───────┬────────┘
//!                      │
//!    ┌─────────────────┼──────────────────────┐
//!    ▼                 ▼                      ▼
//! AccountService   PatientService      TaskService / doctors / stats
//!    │                 │                      │
//!    ▼                 └──────────┬───────────┘
//! AuthProvider               DocumentStore
//! (LocalAuth)          ("pacientes", "users")
//!    │                            │
//!    └─────────────┬──────────────┘
//!                  ▼
//!           SQLite (Database)
//! ```
//!
//! # Modules
//!
//! - [`db`]: SQLite database layer (documents, auth accounts, session)
//! - [`store`]: Document store boundary and typed collections
//! - [`auth`]: Authentication boundary and the local provider
//! - [`models`]: Domain types (Patient, Consultation, Menu, UserProfile, Task)
//! - [`services`]: Application operations and the statistics aggregator
//! - [`notify`]: User-facing notification texts
//! - [`validation`], [`dates`], [`config`]: Input rules, date strings, settings

pub mod auth;
pub mod config;
pub mod dates;
pub mod db;
pub mod models;
pub mod notify;
pub mod services;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use auth::{AuthError, AuthProvider, AuthUser, LocalAuth};
pub use config::CoreConfig;
pub use db::Database;
pub use models::{
    Consultation, Doctor, HomeRoute, Meal, MealSlot, Menu, NewConsultation, Patient, Role, Task,
    UserProfile,
};
pub use notify::{Action, Notification, NotificationKind};
pub use services::{
    aggregate, fetch_doctors, AccountService, PatientService, RegistrationForm, ServiceError,
    SignedIn, Statistics, StatisticsAggregator, TaskService, WeightPoint,
};
pub use store::{Collection, DocumentStore, StoreError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when the caller passes none or an unparsable one.
pub const DEFAULT_LOG_FILTER: &str = "nutri_core=info";

// =========================================================================
// FFI Error Type
// =========================================================================

/// Errors crossing the FFI boundary. Titles and messages are ready to show.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum NutriError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {message}")]
    NotFound { title: String, message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { title: String, message: String },

    #[error("Authentication failed ({code}): {message}")]
    AuthFailed {
        code: String,
        title: String,
        message: String,
    },

    #[error("Storage error: {message}")]
    StorageError { title: String, message: String },
}

impl NutriError {
    /// Attach the user-facing text for `action` to a service failure.
    pub fn from_service(action: Action, error: ServiceError) -> Self {
        let Notification { title, message, .. } = Notification::failed(action, &error);
        match error {
            ServiceError::NotFound { .. } => NutriError::NotFound { title, message },
            ServiceError::Validation(_) => NutriError::InvalidInput { title, message },
            ServiceError::Auth(e) => NutriError::AuthFailed {
                code: e.code().to_string(),
                title,
                message,
            },
            ServiceError::Store(_) => NutriError::StorageError { title, message },
        }
    }
}

impl From<db::DbError> for NutriError {
    fn from(e: db::DbError) -> Self {
        NutriError::DatabaseError(e.to_string())
    }
}

impl From<validation::ValidationError> for NutriError {
    fn from(e: validation::ValidationError) -> Self {
        NutriError::InvalidInput {
            title: "Error".to_string(),
            message: e.to_string(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for NutriError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        NutriError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

fn fail(action: Action) -> impl Fn(ServiceError) -> NutriError {
    move |e| NutriError::from_service(action, e)
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Install the log subscriber. Returns false if one was already installed.
#[uniffi::export]
pub fn init_logging(filter: Option<String>) -> bool {
    let filter = filter
        .as_deref()
        .and_then(|f| EnvFilter::try_new(f).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<NutriCore>, NutriError> {
    NutriCore::open(CoreConfig::with_database_path(path))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<NutriCore>, NutriError> {
    NutriCore::open(CoreConfig::default())
}

/// Open using `NUTRI_DB_PATH` and the collection overrides from the environment.
#[uniffi::export]
pub fn open_database_from_env() -> Result<Arc<NutriCore>, NutriError> {
    NutriCore::open(CoreConfig::from_env()?)
}

/// Confirmation text for a successful action.
#[uniffi::export]
pub fn success_notification(action: Action) -> FfiNotification {
    Notification::succeeded(action).into()
}

/// Confirmation text after a password reset email was requested.
#[uniffi::export]
pub fn password_reset_notification(email: String) -> FfiNotification {
    Notification::password_reset_sent(&email).into()
}

#[uniffi::export]
pub fn is_valid_whatsapp(number: String) -> bool {
    validation::validate_whatsapp(&number).is_ok()
}

/// Placeholder menu a doctor starts from.
#[uniffi::export]
pub fn suggested_menu() -> FfiMenu {
    Menu::suggested().into()
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
///
/// Each call holds the lock for its whole read-modify-write, so calls from one
/// process never interleave. Other processes sharing the file can still race.
#[derive(uniffi::Object)]
pub struct NutriCore {
    db: Arc<Mutex<Database>>,
    config: CoreConfig,
}

impl NutriCore {
    /// Open the database named by `config` (in memory when it names none).
    pub fn open(config: CoreConfig) -> Result<Arc<Self>, NutriError> {
        let db = match config.database_path() {
            Some(path) => Database::open(path)?,
            None => Database::open_in_memory()?,
        };
        tracing::info!(
            path = ?config.database_path(),
            patients = config.patients_collection(),
            users = config.users_collection(),
            "core opened"
        );
        Ok(Arc::new(Self {
            db: Arc::new(Mutex::new(db)),
            config,
        }))
    }
}

#[uniffi::export]
impl NutriCore {
    // =========================================================================
    // Account Operations
    // =========================================================================

    /// Create an account and its user profile, then sign in.
    pub fn register(&self, form: FfiRegistrationForm) -> Result<FfiSession, NutriError> {
        let db = self.db.lock()?;
        let auth = LocalAuth::new(&db, &self.config);
        let accounts = AccountService::new(&auth, &*db, &self.config);
        let session = accounts
            .register(&form.into())
            .map_err(fail(Action::Register))?;
        Ok(session.into())
    }

    pub fn login(&self, email: String, password: String) -> Result<FfiSession, NutriError> {
        let db = self.db.lock()?;
        let auth = LocalAuth::new(&db, &self.config);
        let accounts = AccountService::new(&auth, &*db, &self.config);
        let session = accounts
            .login(&email, &password)
            .map_err(fail(Action::Login))?;
        Ok(session.into())
    }

    pub fn logout(&self) -> Result<(), NutriError> {
        let db = self.db.lock()?;
        let auth = LocalAuth::new(&db, &self.config);
        AccountService::new(&auth, &*db, &self.config)
            .logout()
            .map_err(fail(Action::Logout))
    }

    /// Restore the persisted session, if any.
    pub fn current_session(&self) -> Result<Option<FfiSession>, NutriError> {
        let db = self.db.lock()?;
        let auth = LocalAuth::new(&db, &self.config);
        let session = AccountService::new(&auth, &*db, &self.config)
            .current_session()
            .map_err(fail(Action::Login))?;
        Ok(session.map(Into::into))
    }

    pub fn request_password_reset(&self, email: String) -> Result<(), NutriError> {
        let db = self.db.lock()?;
        let auth = LocalAuth::new(&db, &self.config);
        AccountService::new(&auth, &*db, &self.config)
            .request_password_reset(&email)
            .map_err(fail(Action::PasswordReset))
    }

    pub fn update_profile(
        &self,
        display_name: String,
        whatsapp_number: String,
    ) -> Result<FfiUserProfile, NutriError> {
        let db = self.db.lock()?;
        let auth = LocalAuth::new(&db, &self.config);
        let profile = AccountService::new(&auth, &*db, &self.config)
            .update_profile(&display_name, &whatsapp_number)
            .map_err(fail(Action::UpdateProfile))?;
        Ok(profile.into())
    }

    pub fn change_password(
        &self,
        current_password: String,
        new_password: String,
    ) -> Result<(), NutriError> {
        let db = self.db.lock()?;
        let auth = LocalAuth::new(&db, &self.config);
        AccountService::new(&auth, &*db, &self.config)
            .change_password(&current_password, &new_password)
            .map_err(fail(Action::ChangePassword))
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    pub fn add_patient(
        &self,
        name: String,
        email: String,
        birth_date: String,
    ) -> Result<FfiPatient, NutriError> {
        let db = self.db.lock()?;
        let patient = PatientService::new(&*db, &self.config)
            .add_patient(&name, &email, &birth_date)
            .map_err(fail(Action::AddPatient))?;
        Ok(patient.into())
    }

    pub fn list_patients(&self) -> Result<Vec<FfiPatient>, NutriError> {
        let db = self.db.lock()?;
        let patients = PatientService::new(&*db, &self.config)
            .list_patients()
            .map_err(fail(Action::LoadPatients))?;
        Ok(patients.into_iter().map(Into::into).collect())
    }

    /// Search patients by name.
    pub fn search_patients(&self, query: String) -> Result<Vec<FfiPatient>, NutriError> {
        let db = self.db.lock()?;
        let patients = PatientService::new(&*db, &self.config)
            .search_patients(&query)
            .map_err(fail(Action::LoadPatients))?;
        Ok(patients.into_iter().map(Into::into).collect())
    }

    pub fn get_patient(&self, patient_id: String) -> Result<Option<FfiPatient>, NutriError> {
        let db = self.db.lock()?;
        let patient = PatientService::new(&*db, &self.config)
            .get_patient(&patient_id)
            .map_err(fail(Action::LoadPatient))?;
        Ok(patient.map(Into::into))
    }

    /// The patient record linked to a patient user's email.
    pub fn get_patient_by_email(&self, email: String) -> Result<Option<FfiPatient>, NutriError> {
        let db = self.db.lock()?;
        let patient = PatientService::new(&*db, &self.config)
            .get_patient_by_email(&email)
            .map_err(fail(Action::LoadPatient))?;
        Ok(patient.map(Into::into))
    }

    pub fn update_patient(
        &self,
        patient_id: String,
        name: String,
        email: String,
        birth_date: String,
    ) -> Result<FfiPatient, NutriError> {
        let db = self.db.lock()?;
        let patient = PatientService::new(&*db, &self.config)
            .update_patient(&patient_id, &name, &email, &birth_date)
            .map_err(fail(Action::UpdatePatient))?;
        Ok(patient.into())
    }

    pub fn delete_patient(&self, patient_id: String) -> Result<(), NutriError> {
        let db = self.db.lock()?;
        PatientService::new(&*db, &self.config)
            .delete_patient(&patient_id)
            .map_err(fail(Action::DeletePatient))
    }

    // =========================================================================
    // Consultation Operations
    // =========================================================================

    pub fn add_consultation(
        &self,
        patient_id: String,
        input: FfiNewConsultation,
    ) -> Result<FfiConsultation, NutriError> {
        let db = self.db.lock()?;
        let consultation = PatientService::new(&*db, &self.config)
            .add_consultation(&patient_id, input.into())
            .map_err(fail(Action::AddConsultation))?;
        Ok(consultation.into())
    }

    pub fn get_consultation(
        &self,
        patient_id: String,
        consultation_id: String,
    ) -> Result<Option<FfiConsultation>, NutriError> {
        let db = self.db.lock()?;
        let consultation = PatientService::new(&*db, &self.config)
            .get_consultation(&patient_id, &consultation_id)
            .map_err(fail(Action::LoadPatient))?;
        Ok(consultation.map(Into::into))
    }

    pub fn delete_consultation(
        &self,
        patient_id: String,
        consultation_id: String,
    ) -> Result<(), NutriError> {
        let db = self.db.lock()?;
        PatientService::new(&*db, &self.config)
            .delete_consultation(&patient_id, &consultation_id)
            .map_err(fail(Action::DeleteConsultation))?;
        Ok(())
    }

    /// Delete by position in the patient's consultation list.
    pub fn delete_consultation_at(&self, patient_id: String, index: u32) -> Result<(), NutriError> {
        let db = self.db.lock()?;
        PatientService::new(&*db, &self.config)
            .delete_consultation_at(&patient_id, index as usize)
            .map_err(fail(Action::DeleteConsultation))?;
        Ok(())
    }

    // =========================================================================
    // Menu and Weight Chart
    // =========================================================================

    pub fn set_menu(&self, patient_id: String, menu: FfiMenu) -> Result<(), NutriError> {
        let db = self.db.lock()?;
        PatientService::new(&*db, &self.config)
            .set_menu(&patient_id, &menu.into())
            .map_err(fail(Action::SaveMenu))
    }

    pub fn get_menu(&self, patient_id: String) -> Result<Option<FfiMenu>, NutriError> {
        let db = self.db.lock()?;
        let menu = PatientService::new(&*db, &self.config)
            .get_menu(&patient_id)
            .map_err(fail(Action::LoadPatient))?;
        Ok(menu.map(Into::into))
    }

    /// Latest weights of the patient registered under `email`, oldest first.
    pub fn weight_evolution(&self, email: String) -> Result<Vec<FfiWeightPoint>, NutriError> {
        let db = self.db.lock()?;
        let points = PatientService::new(&*db, &self.config)
            .weight_evolution(&email)
            .map_err(fail(Action::LoadPatient))?;
        Ok(points.into_iter().map(Into::into).collect())
    }

    // =========================================================================
    // Task Operations
    // =========================================================================

    pub fn list_tasks(&self, user_id: String) -> Result<Vec<FfiTask>, NutriError> {
        let db = self.db.lock()?;
        let tasks = TaskService::new(&*db, &self.config)
            .list_tasks(&user_id)
            .map_err(fail(Action::LoadTasks))?;
        Ok(tasks.into_iter().map(Into::into).collect())
    }

    /// Tasks whose title contains `query` (case-insensitive).
    pub fn search_tasks(&self, user_id: String, query: String) -> Result<Vec<FfiTask>, NutriError> {
        let db = self.db.lock()?;
        let tasks = TaskService::new(&*db, &self.config)
            .search_tasks(&user_id, &query)
            .map_err(fail(Action::LoadTasks))?;
        Ok(tasks.into_iter().map(Into::into).collect())
    }

    pub fn add_task(
        &self,
        user_id: String,
        title: String,
        description: String,
    ) -> Result<FfiTask, NutriError> {
        let db = self.db.lock()?;
        let task = TaskService::new(&*db, &self.config)
            .add_task(&user_id, &title, &description)
            .map_err(fail(Action::AddTask))?;
        Ok(task.into())
    }

    pub fn update_task(&self, user_id: String, task: FfiTask) -> Result<FfiTask, NutriError> {
        let db = self.db.lock()?;
        let task = TaskService::new(&*db, &self.config)
            .update_task(&user_id, &task.into())
            .map_err(fail(Action::UpdateTask))?;
        Ok(task.into())
    }

    pub fn toggle_task(&self, user_id: String, task_id: String) -> Result<FfiTask, NutriError> {
        let db = self.db.lock()?;
        let task = TaskService::new(&*db, &self.config)
            .toggle_task(&user_id, &task_id)
            .map_err(fail(Action::UpdateTask))?;
        Ok(task.into())
    }

    pub fn delete_task(&self, user_id: String, task_id: String) -> Result<(), NutriError> {
        let db = self.db.lock()?;
        TaskService::new(&*db, &self.config)
            .delete_task(&user_id, &task_id)
            .map_err(fail(Action::DeleteTask))?;
        Ok(())
    }

    // =========================================================================
    // Doctors and Statistics
    // =========================================================================

    pub fn fetch_doctors(&self) -> Result<Vec<FfiDoctor>, NutriError> {
        let db = self.db.lock()?;
        let doctors = fetch_doctors(&*db, &self.config).map_err(fail(Action::LoadDoctors))?;
        Ok(doctors.into_iter().map(Into::into).collect())
    }

    /// Dashboard statistics; `None` when they could not be computed.
    pub fn statistics(&self) -> Result<Option<FfiStatistics>, NutriError> {
        let db = self.db.lock()?;
        Ok(StatisticsAggregator::new(&*db, &self.config)
            .compute()
            .map(Into::into))
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatient {
    pub id: String,
    pub name: String,
    pub email: String,
    pub birth_date: String,
    pub consultations: Vec<FfiConsultation>,
    pub menu: Option<FfiMenu>,
}

impl From<Patient> for FfiPatient {
    fn from(patient: Patient) -> Self {
        Self {
            id: patient.id,
            name: patient.name,
            email: patient.email,
            birth_date: patient.birth_date,
            consultations: patient.consultations.into_iter().map(Into::into).collect(),
            menu: patient.menu.map(Into::into),
        }
    }
}

/// FFI-safe consultation.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiConsultation {
    pub id: String,
    /// `DD-MM-YYYY HH:mm`
    pub date: String,
    pub reason: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub blood_pressure: String,
    pub waist_cm: f64,
    pub hip_cm: f64,
    pub chest_cm: f64,
    pub notes: String,
}

impl From<Consultation> for FfiConsultation {
    fn from(c: Consultation) -> Self {
        Self {
            id: c.id,
            date: c.date,
            reason: c.reason,
            weight_kg: c.weight_kg,
            height_cm: c.height_cm,
            blood_pressure: c.blood_pressure,
            waist_cm: c.waist_cm,
            hip_cm: c.hip_cm,
            chest_cm: c.chest_cm,
            notes: c.notes,
        }
    }
}

/// FFI-safe consultation form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewConsultation {
    pub reason: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub blood_pressure: String,
    pub waist_cm: f64,
    pub hip_cm: f64,
    pub chest_cm: f64,
    pub notes: String,
}

impl From<FfiNewConsultation> for NewConsultation {
    fn from(input: FfiNewConsultation) -> Self {
        NewConsultation {
            reason: input.reason,
            weight_kg: input.weight_kg,
            height_cm: input.height_cm,
            blood_pressure: input.blood_pressure,
            waist_cm: input.waist_cm,
            hip_cm: input.hip_cm,
            chest_cm: input.chest_cm,
            notes: input.notes,
        }
    }
}

/// FFI-safe meal slot.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMealSlot {
    pub options: Vec<String>,
    pub description: String,
}

impl From<MealSlot> for FfiMealSlot {
    fn from(slot: MealSlot) -> Self {
        Self {
            options: slot.options,
            description: slot.description,
        }
    }
}

impl From<FfiMealSlot> for MealSlot {
    fn from(slot: FfiMealSlot) -> Self {
        MealSlot {
            options: slot.options,
            description: slot.description,
        }
    }
}

/// FFI-safe daily menu.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMenu {
    pub breakfast: FfiMealSlot,
    pub morning_snack: FfiMealSlot,
    pub lunch: FfiMealSlot,
    pub afternoon_snack: FfiMealSlot,
    pub dinner: FfiMealSlot,
}

impl From<Menu> for FfiMenu {
    fn from(menu: Menu) -> Self {
        Self {
            breakfast: menu.breakfast.into(),
            morning_snack: menu.morning_snack.into(),
            lunch: menu.lunch.into(),
            afternoon_snack: menu.afternoon_snack.into(),
            dinner: menu.dinner.into(),
        }
    }
}

impl From<FfiMenu> for Menu {
    fn from(menu: FfiMenu) -> Self {
        Menu {
            breakfast: menu.breakfast.into(),
            morning_snack: menu.morning_snack.into(),
            lunch: menu.lunch.into(),
            afternoon_snack: menu.afternoon_snack.into(),
            dinner: menu.dinner.into(),
        }
    }
}

/// FFI-safe weight chart point.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiWeightPoint {
    /// `YYYY-MM-DD`
    pub label: String,
    pub weight_kg: f64,
}

impl From<WeightPoint> for FfiWeightPoint {
    fn from(point: WeightPoint) -> Self {
        Self {
            label: point.label,
            weight_kg: point.weight_kg,
        }
    }
}

/// FFI-safe task.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTask {
    pub id: String,
    pub title: String,
    pub description: String,
    pub completed: bool,
}

impl From<Task> for FfiTask {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            completed: task.completed,
        }
    }
}

impl From<FfiTask> for Task {
    fn from(task: FfiTask) -> Self {
        Task {
            id: task.id,
            title: task.title,
            description: task.description,
            completed: task.completed,
        }
    }
}

/// FFI-safe doctor directory entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDoctor {
    pub id: String,
    pub name: String,
    pub whatsapp: String,
    /// `https://wa.me/...`, absent when no number is on file
    pub contact_link: Option<String>,
}

impl From<Doctor> for FfiDoctor {
    fn from(doctor: Doctor) -> Self {
        let contact_link = doctor.contact_link();
        Self {
            id: doctor.id,
            name: doctor.name,
            whatsapp: doctor.whatsapp,
            contact_link,
        }
    }
}

/// FFI-safe dashboard statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStatistics {
    pub total_patients: u64,
    /// `DD-MM-YYYY HH:mm`
    pub last_consultation: String,
    /// `YYYY-MM-DDTHH:MM:SS.sssZ`
    pub last_consultation_iso: String,
    pub total_users: u64,
    pub total_doctors: u64,
    pub total_patient_users: u64,
}

impl From<Statistics> for FfiStatistics {
    fn from(stats: Statistics) -> Self {
        Self {
            total_patients: stats.total_patients,
            last_consultation: dates::format_date_time(&stats.last_consultation, true),
            last_consultation_iso: stats.last_consultation_iso(),
            total_users: stats.total_users,
            total_doctors: stats.total_doctors,
            total_patient_users: stats.total_patient_users,
        }
    }
}

/// FFI-safe user profile.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiUserProfile {
    pub id: String,
    pub user_id: String,
    pub role: Option<Role>,
    pub display_name: String,
    pub whatsapp_number: String,
    pub tasks: Vec<FfiTask>,
    pub created_at: String,
}

impl From<UserProfile> for FfiUserProfile {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            user_id: profile.user_id,
            role: profile.role,
            display_name: profile.display_name,
            whatsapp_number: profile.whatsapp_number,
            tasks: profile.tasks.into_iter().map(Into::into).collect(),
            created_at: profile.created_at,
        }
    }
}

/// FFI-safe registration form.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub display_name: String,
    pub whatsapp_number: String,
    pub role: Role,
}

impl From<FfiRegistrationForm> for RegistrationForm {
    fn from(form: FfiRegistrationForm) -> Self {
        RegistrationForm {
            email: form.email,
            password: form.password,
            confirm_password: form.confirm_password,
            display_name: form.display_name,
            whatsapp_number: form.whatsapp_number,
            role: form.role,
        }
    }
}

/// FFI-safe signed-in session.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiSession {
    pub uid: String,
    pub email: String,
    pub display_name: Option<String>,
    pub role: Role,
    pub home: HomeRoute,
    pub profile: FfiUserProfile,
}

impl From<SignedIn> for FfiSession {
    fn from(session: SignedIn) -> Self {
        Self {
            uid: session.user.uid,
            email: session.user.email,
            display_name: session.user.display_name,
            role: session.role,
            home: session.home,
            profile: session.profile.into(),
        }
    }
}

/// FFI-safe notification.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNotification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

impl From<Notification> for FfiNotification {
    fn from(n: Notification) -> Self {
        Self {
            kind: n.kind,
            title: n.title,
            message: n.message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn consultation_form(weight_kg: f64) -> FfiNewConsultation {
        FfiNewConsultation {
            reason: "Control".into(),
            weight_kg,
            height_cm: 165.0,
            blood_pressure: "120/80".into(),
            waist_cm: 80.0,
            hip_cm: 95.0,
            chest_cm: 90.0,
            notes: String::new(),
        }
    }

    #[test]
    fn test_core_patient_flow() {
        let core = open_database_in_memory().unwrap();
        let patient = core
            .add_patient("Ana".into(), "ana@example.com".into(), "12-05-1988".into())
            .unwrap();

        let consultation = core
            .add_consultation(patient.id.clone(), consultation_form(70.0))
            .unwrap();
        assert!(dates::parse_date_time(&consultation.date).is_ok());

        let loaded = core.get_patient(patient.id.clone()).unwrap().unwrap();
        assert_eq!(loaded.consultations.len(), 1);

        core.delete_consultation(patient.id.clone(), consultation.id.clone())
            .unwrap();
        let err = core
            .delete_consultation(patient.id.clone(), consultation.id)
            .unwrap_err();
        match err {
            NutriError::NotFound { message, .. } => assert_eq!(message, "Consulta no encontrada."),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_core_errors_carry_user_text() {
        let core = open_database_in_memory().unwrap();
        let err = core
            .register(FfiRegistrationForm {
                email: "ana@example.com".into(),
                password: "secret1".into(),
                confirm_password: "secret2".into(),
                display_name: "Ana".into(),
                whatsapp_number: "595978654321".into(),
                role: Role::Patient,
            })
            .unwrap_err();
        match err {
            NutriError::InvalidInput { message, .. } => {
                assert_eq!(message, "Las contraseñas no coinciden.")
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = core
            .login("ghost@example.com".into(), "secret1".into())
            .unwrap_err();
        match err {
            NutriError::AuthFailed { code, title, .. } => {
                assert_eq!(code, "auth/user-not-found");
                assert_eq!(title, "Usuario no encontrado");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_core_session_and_statistics() {
        let core = open_database_in_memory().unwrap();
        let session = core
            .register(FfiRegistrationForm {
                email: "dra@example.com".into(),
                password: "secret1".into(),
                confirm_password: "secret1".into(),
                display_name: "Dra. López".into(),
                whatsapp_number: "595981111111".into(),
                role: Role::Doctor,
            })
            .unwrap();
        assert_eq!(session.home, HomeRoute::DoctorHome);

        let restored = core.current_session().unwrap().unwrap();
        assert_eq!(restored.uid, session.uid);

        let doctors = core.fetch_doctors().unwrap();
        assert_eq!(doctors.len(), 1);
        assert_eq!(
            doctors[0].contact_link.as_deref(),
            Some("https://wa.me/595981111111")
        );

        let stats = core.statistics().unwrap().unwrap();
        assert_eq!(stats.total_users, 1);
        assert_eq!(stats.total_doctors, 1);
        assert_eq!(stats.last_consultation_iso, "1970-01-01T00:00:00.000Z");

        core.logout().unwrap();
        assert!(core.current_session().unwrap().is_none());
    }

    #[test]
    fn test_core_task_search() {
        let core = NutriCore::open(CoreConfig::default().with_password_hash_iterations(1_000)).unwrap();
        let session = core
            .register(FfiRegistrationForm {
                email: "ana@example.com".into(),
                password: "secret1".into(),
                confirm_password: "secret1".into(),
                display_name: "Ana".into(),
                whatsapp_number: "595978654321".into(),
                role: Role::Patient,
            })
            .unwrap();
        core.add_task(session.uid.clone(), "Beber agua".into(), String::new())
            .unwrap();
        core.add_task(session.uid.clone(), "Caminar".into(), String::new())
            .unwrap();

        let found = core.search_tasks(session.uid.clone(), "AGUA".into()).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "Beber agua");
        assert_eq!(core.search_tasks(session.uid, String::new()).unwrap().len(), 2);
    }

    #[test]
    fn test_on_disk_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nutri.db").to_string_lossy().into_owned();

        {
            let core = open_database(path.clone()).unwrap();
            core.register(FfiRegistrationForm {
                email: "ana@example.com".into(),
                password: "secret1".into(),
                confirm_password: "secret1".into(),
                display_name: "Ana".into(),
                whatsapp_number: "595978654321".into(),
                role: Role::Patient,
            })
            .unwrap();
        }

        let core = open_database(path).unwrap();
        let session = core.current_session().unwrap().unwrap();
        assert_eq!(session.email, "ana@example.com");
        assert_eq!(session.home, HomeRoute::PatientHome);
    }

    #[test]
    fn test_notifications_and_helpers() {
        assert_eq!(success_notification(Action::AddPatient).title, "Paciente agregado");
        assert!(is_valid_whatsapp("595978654321".into()));
        assert!(!is_valid_whatsapp("123456".into()));
        assert_eq!(suggested_menu().lunch.options, vec!["Sin restricciones".to_string()]);
    }
}
