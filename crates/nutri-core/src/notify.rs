//! User-facing notifications (toasts and alerts).
//!
//! Every failure reaching the UI is turned into a title and message for the
//! action the user attempted. Texts are the app's Spanish copy.

use crate::auth::AuthError;
use crate::services::ServiceError;
use crate::validation::{ValidationError, WHATSAPP_EXAMPLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum NotificationKind {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
}

/// What the user was doing when the notification was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum Action {
    Login,
    Register,
    Logout,
    PasswordReset,
    UpdateProfile,
    ChangePassword,
    LoadPatients,
    LoadPatient,
    AddPatient,
    UpdatePatient,
    DeletePatient,
    AddConsultation,
    DeleteConsultation,
    SaveMenu,
    LoadTasks,
    AddTask,
    UpdateTask,
    DeleteTask,
    LoadDoctors,
}

const UNEXPECTED: &str = "Se produjo un error inesperado. Por favor, intenta de nuevo.";

impl Notification {
    pub fn new(kind: NotificationKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title, message)
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title, message)
    }

    /// Confirmation shown after a successful action.
    pub fn succeeded(action: Action) -> Self {
        let (title, message) = match action {
            Action::Login => ("Login exitoso", "Has iniciado sesión correctamente."),
            Action::Register => ("Registro exitoso", "Tu cuenta ha sido creada correctamente."),
            Action::Logout => ("Sesión cerrada", "Has cerrado sesión con éxito."),
            Action::PasswordReset => (
                "Correo enviado",
                "Revisa tu bandeja de entrada para restablecer tu contraseña.",
            ),
            Action::UpdateProfile => ("Perfil actualizado con éxito", ""),
            Action::ChangePassword => ("Contraseña actualizada con éxito", ""),
            Action::AddPatient => (
                "Paciente agregado",
                "El paciente ha sido agregado exitosamente! 🎉",
            ),
            Action::UpdatePatient => ("Paciente Actualizado", "El paciente fue actualizado con éxito."),
            Action::DeletePatient => ("Paciente eliminado", "El paciente ha sido eliminado con éxito."),
            Action::AddConsultation => ("Éxito", "Consulta agregada exitosamente."),
            Action::DeleteConsultation => (
                "Consulta eliminada",
                "La consulta ha sido eliminada con éxito.",
            ),
            Action::SaveMenu => ("Éxito", "Menú sugerido agregado exitosamente."),
            Action::AddTask => ("OK", "Tarea agregada."),
            Action::UpdateTask => ("OK", "Tarea actualizada."),
            Action::DeleteTask => ("OK", "Tarea eliminada."),
            Action::LoadPatients | Action::LoadPatient | Action::LoadTasks | Action::LoadDoctors => {
                return Self::new(NotificationKind::Info, "OK", "");
            }
        };
        Self::success(title, message)
    }

    /// Confirmation for a password reset, naming the address.
    pub fn password_reset_sent(email: &str) -> Self {
        Self::success(
            "Correo enviado",
            format!(
                "Revisa la bandeja de entrada de {} para restablecer tu contraseña.",
                email
            ),
        )
    }

    /// Error shown when `action` fails.
    pub fn failed(action: Action, error: &ServiceError) -> Self {
        match error {
            ServiceError::Validation(e) => Self::invalid_input(action, e),
            ServiceError::Auth(e) => Self::auth_failed(action, e),
            ServiceError::NotFound { entity, .. } => Self::not_found(action, entity),
            ServiceError::Store(_) => Self::store_failed(action),
        }
    }

    fn invalid_input(action: Action, error: &ValidationError) -> Self {
        let message = match error {
            ValidationError::PasswordMismatch => "Las contraseñas no coinciden.".to_string(),
            ValidationError::InvalidWhatsApp(_) => {
                format!("Formato aceptado para WhatsApp: {}", WHATSAPP_EXAMPLE)
            }
            ValidationError::PasswordTooShort(min) => {
                format!("La contraseña debe tener al menos {} caracteres.", min)
            }
            ValidationError::MissingField(_) if action == Action::AddTask || action == Action::UpdateTask => {
                "Se debe ingresar un título para la tarea.".to_string()
            }
            ValidationError::MissingField(_) => "Todos los campos son obligatorios.".to_string(),
            ValidationError::InvalidDate(_) => {
                "La fecha debe tener el formato DD-MM-YYYY.".to_string()
            }
            ValidationError::IndexOutOfRange { .. } => "Consulta no encontrada.".to_string(),
            ValidationError::InvalidRole(_) => "Tipo de usuario no válido.".to_string(),
        };
        Self::error("Error", message)
    }

    fn auth_failed(action: Action, error: &AuthError) -> Self {
        match action {
            Action::Login => {
                let (title, message) = match error {
                    AuthError::UserNotFound => (
                        "Usuario no encontrado",
                        "No hay ninguna cuenta registrada con este correo electrónico.",
                    ),
                    AuthError::WrongPassword => (
                        "Contraseña incorrecta",
                        "La contraseña que has ingresado es incorrecta. Por favor, inténtalo de nuevo.",
                    ),
                    AuthError::InvalidEmail => (
                        "Correo electrónico inválido",
                        "El formato del correo electrónico ingresado es incorrecto.",
                    ),
                    AuthError::TooManyRequests => (
                        "Demasiados intentos fallidos",
                        "Has realizado demasiados intentos de inicio de sesión. Intenta de nuevo más tarde.",
                    ),
                    AuthError::UserDisabled => (
                        "Usuario deshabilitado",
                        "Tu cuenta ha sido deshabilitada. Comunícate con el soporte para más información.",
                    ),
                    AuthError::InvalidCredential => (
                        "Credenciales inválidas",
                        "Las credenciales proporcionadas son inválidas. Por favor, verifica tu correo y contraseña.",
                    ),
                    _ => (
                        "Error al iniciar sesión",
                        "Ocurrió un error inesperado. Por favor, intenta nuevamente.",
                    ),
                };
                Self::error(title, message)
            }
            Action::Register => {
                let message = match error {
                    AuthError::EmailAlreadyInUse => "El correo electrónico ya está en uso por otra cuenta.",
                    AuthError::InvalidEmail => "El correo electrónico proporcionado no es válido.",
                    AuthError::OperationNotAllowed => {
                        "El registro de usuarios está deshabilitado temporalmente."
                    }
                    AuthError::WeakPassword => {
                        "La contraseña es demasiado débil. Debe tener al menos 6 caracteres."
                    }
                    _ => UNEXPECTED,
                };
                Self::error("Error", message)
            }
            Action::PasswordReset => {
                let message = match error {
                    AuthError::InvalidEmail => {
                        "El formato del correo electrónico no es válido. Verifica la dirección ingresada."
                    }
                    AuthError::UserNotFound => {
                        "No existe ningún usuario registrado con este correo electrónico."
                    }
                    AuthError::TooManyRequests => {
                        "Has intentado demasiadas veces en un corto período. Intenta nuevamente más tarde."
                    }
                    _ => UNEXPECTED,
                };
                Self::error("Error al enviar correo", message)
            }
            Action::ChangePassword
                if matches!(error, AuthError::WrongPassword | AuthError::InvalidCredential) =>
            {
                Self::error(
                    "Error",
                    "La reautenticación falló. Verifica tu contraseña actual.",
                )
            }
            Action::Logout => Self::error("Error", "No se pudo cerrar sesión. Intenta de nuevo."),
            _ => match error {
                AuthError::NoCurrentUser => Self::error("Error", "No hay usuario autenticado."),
                AuthError::WeakPassword => Self::error(
                    "Error",
                    "La contraseña debe tener al menos 6 caracteres.",
                ),
                other => Self::error("Error", other.to_string()),
            },
        }
    }

    fn not_found(action: Action, entity: &str) -> Self {
        let message = match (entity, action) {
            ("consultation", _) => "Consulta no encontrada.",
            ("patient", _) => "Paciente no encontrado.",
            ("task", _) => "Tarea no encontrada.",
            (_, Action::Login) => "No se encontró el usuario.",
            _ => "No se encontró el usuario autenticado.",
        };
        Self::error("Error", message)
    }

    fn store_failed(action: Action) -> Self {
        let (title, message) = match action {
            Action::AddPatient => ("Error al agregar paciente", "Hubo un problema al agregar el paciente. 😢"),
            Action::UpdatePatient => (
                "Error al actualizar paciente",
                "Hubo un problema al actualizar el paciente. 😢",
            ),
            Action::DeletePatient => ("Error al eliminar paciente", "Hubo un problema al eliminar el paciente. 😢"),
            Action::DeleteConsultation => (
                "Error al eliminar consulta",
                "Hubo un problema al eliminar la consulta. 😢",
            ),
            Action::AddConsultation => ("Error", "No se pudo agregar la consulta."),
            Action::SaveMenu => ("Error", "No se pudo agregar el menú sugerido."),
            Action::LoadPatients => ("Error", "No se pudo cargar la lista de pacientes."),
            Action::LoadPatient => ("Error", "No se pudo obtener los detalles del paciente."),
            Action::Login | Action::LoadTasks | Action::LoadDoctors => {
                ("Error", "Ocurrió un error al obtener los datos del usuario.")
            }
            _ => ("Error", UNEXPECTED),
        };
        Self::error(title, message)
    }
}
