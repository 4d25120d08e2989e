//! User profiles, roles and personal tasks.

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use super::{null_as_default, skip_falsy_entries};
use crate::validation::{self, ValidationResult};

/// Title shown for tasks stored without one.
pub const UNTITLED_TASK: &str = "Sin título";

/// Who a user is in the practice.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, uniffi::Enum)]
pub enum Role {
    #[serde(rename = "doctor")]
    Doctor,
    #[serde(rename = "paciente", alias = "patient")]
    Patient,
}

/// Landing area after sign-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum HomeRoute {
    /// Dashboard, patient list and consultations
    DoctorHome,
    /// Menu, weight evolution, tasks and contact
    PatientHome,
}

impl Role {
    /// Stored `userType` value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Patient => "paciente",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "doctor" => Some(Role::Doctor),
            "paciente" | "patient" => Some(Role::Patient),
            _ => None,
        }
    }

    pub fn home(&self) -> HomeRoute {
        match self {
            Role::Doctor => HomeRoute::DoctorHome,
            Role::Patient => HomeRoute::PatientHome,
        }
    }
}

/// Unknown or missing `userType` values read as "no role".
fn lenient_role<'de, D>(deserializer: D) -> Result<Option<Role>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(|value| {
        let role = Role::parse(value);
        if role.is_none() {
            tracing::warn!(user_type = value, "unrecognized userType in user document");
        }
        role
    }))
}

/// A user document in the `users` collection. Document ID = auth uid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct UserProfile {
    /// Document ID
    #[serde(skip)]
    pub id: String,
    /// Auth uid, duplicated into the body
    #[serde(rename = "userId", default, deserialize_with = "null_as_default")]
    pub user_id: String,
    /// Role; `None` when the stored value is missing or not recognized
    #[serde(
        rename = "userType",
        default,
        deserialize_with = "lenient_role",
        skip_serializing_if = "Option::is_none"
    )]
    pub role: Option<Role>,
    #[serde(rename = "displayName", default, deserialize_with = "null_as_default")]
    pub display_name: String,
    /// Country-code-prefixed digits
    #[serde(rename = "whatsappNumber", default, deserialize_with = "null_as_default")]
    pub whatsapp_number: String,
    /// Personal task list
    #[serde(rename = "tareas", default, deserialize_with = "skip_falsy_entries")]
    pub tasks: Vec<Task>,
    /// Account creation timestamp (RFC 3339)
    #[serde(rename = "createdAt", default, deserialize_with = "null_as_default")]
    pub created_at: String,
}

impl UserProfile {
    /// Profile written right after sign-up.
    pub fn new(uid: String, role: Role, display_name: String, whatsapp_number: String) -> Self {
        Self {
            id: uid.clone(),
            user_id: uid,
            role: Some(role),
            display_name,
            whatsapp_number,
            tasks: Vec::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn is_doctor(&self) -> bool {
        self.role == Some(Role::Doctor)
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }
}

fn untitled() -> String {
    UNTITLED_TASK.to_string()
}

/// Empty or `null` titles read as [`UNTITLED_TASK`].
fn title_or_untitled<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let title = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
    Ok(if title.is_empty() { untitled() } else { title })
}

/// A personal task embedded in the user's `tareas` array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// Unique within the owning user
    #[serde(default)]
    pub id: String,
    #[serde(default = "untitled", deserialize_with = "title_or_untitled")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub completed: bool,
}

impl Task {
    /// New open task with a generated ID. The title is required.
    pub fn new(title: String, description: String) -> ValidationResult<Self> {
        validation::require(&title, "title")?;
        Ok(Self {
            id: generate_task_id(),
            title,
            description,
            completed: false,
        })
    }

    /// Case-insensitive substring match on the title.
    pub fn title_matches(&self, query: &str) -> bool {
        self.title.to_lowercase().contains(&query.to_lowercase())
    }
}

/// `<unix-millis>-<0..9999>`.
pub fn generate_task_id() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..10_000);
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), suffix)
}

/// Fallback shown when a doctor has no display name.
pub const UNKNOWN_DOCTOR_NAME: &str = "Nombre no disponible";
/// Fallback shown when a doctor has no WhatsApp number.
pub const UNKNOWN_DOCTOR_NUMBER: &str = "Número no disponible";

/// Doctor entry in the patient's contact directory.
#[derive(Debug, Clone, PartialEq)]
pub struct Doctor {
    pub id: String,
    pub name: String,
    pub whatsapp: String,
}

impl From<UserProfile> for Doctor {
    fn from(profile: UserProfile) -> Self {
        let name = if profile.display_name.is_empty() {
            UNKNOWN_DOCTOR_NAME.to_string()
        } else {
            profile.display_name
        };
        let whatsapp = if profile.whatsapp_number.is_empty() {
            UNKNOWN_DOCTOR_NUMBER.to_string()
        } else {
            profile.whatsapp_number
        };
        Self {
            id: profile.id,
            name,
            whatsapp,
        }
    }
}

impl Doctor {
    /// `https://wa.me/...` link, or `None` when no number is on file.
    pub fn contact_link(&self) -> Option<String> {
        if self.whatsapp == UNKNOWN_DOCTOR_NUMBER {
            None
        } else {
            Some(validation::whatsapp_link(&self.whatsapp))
        }
    }
}
