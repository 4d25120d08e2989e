//! Registration, sign-in, session restore and profile changes.

use serde_json::json;

use super::{fields, log_store_error, log_validation_error, ServiceError, ServiceResult};
use crate::auth::{AuthError, AuthProvider, AuthUser};
use crate::config::CoreConfig;
use crate::models::{HomeRoute, Role, UserProfile};
use crate::store::{Collection, DocumentStore};
use crate::validation::{self, ValidationError};

const USER: &str = "user";

/// Sign-up form as entered on the registration screen.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrationForm {
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub display_name: String,
    pub whatsapp_number: String,
    pub role: Role,
}

impl RegistrationForm {
    /// Checks that need no backend: matching passwords and a well-formed number.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validation::validate_password_confirmation(&self.password, &self.confirm_password)?;
        validation::validate_whatsapp(&self.whatsapp_number)
    }
}

/// A signed-in user, their profile and where the app should land.
#[derive(Debug, Clone, PartialEq)]
pub struct SignedIn {
    pub user: AuthUser,
    pub profile: UserProfile,
    pub role: Role,
    pub home: HomeRoute,
}

pub struct AccountService<'a> {
    auth: &'a dyn AuthProvider,
    users: Collection<'a, UserProfile>,
    config: &'a CoreConfig,
}

impl<'a> AccountService<'a> {
    pub fn new(auth: &'a dyn AuthProvider, store: &'a dyn DocumentStore, config: &'a CoreConfig) -> Self {
        Self {
            auth,
            users: Collection::new(store, config.users_collection()),
            config,
        }
    }

    /// Create the account and its user document. Nothing is sent to the
    /// backend unless the form validates.
    pub fn register(&self, form: &RegistrationForm) -> ServiceResult<SignedIn> {
        form.validate().map_err(log_validation_error("register"))?;

        self.auth
            .sign_up(form.email.trim(), &form.password)
            .map_err(log_auth_error("register"))?;
        let user = self
            .auth
            .update_display_name(&form.display_name)
            .map_err(log_auth_error("register"))?;

        let profile = UserProfile::new(
            user.uid.clone(),
            form.role,
            form.display_name.clone(),
            form.whatsapp_number.clone(),
        );
        self.users
            .set(&user.uid, &profile)
            .map_err(log_store_error("register"))?;

        tracing::info!(uid = %user.uid, role = form.role.as_str(), "user registered");
        Ok(SignedIn {
            user,
            profile,
            role: form.role,
            home: form.role.home(),
        })
    }

    /// Sign in and resolve the user's role and home screen.
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<SignedIn> {
        let user = self
            .auth
            .sign_in(email.trim(), password)
            .map_err(log_auth_error("login"))?;
        self.resolve(user)
    }

    pub fn logout(&self) -> ServiceResult<()> {
        self.auth.sign_out().map_err(log_auth_error("logout"))?;
        Ok(())
    }

    /// The persisted session, if a user is still signed in.
    pub fn current_session(&self) -> ServiceResult<Option<SignedIn>> {
        match self.auth.current_user().map_err(log_auth_error("current_session"))? {
            Some(user) => self.resolve(user).map(Some),
            None => Ok(None),
        }
    }

    pub fn request_password_reset(&self, email: &str) -> ServiceResult<()> {
        validation::require(email, "email").map_err(log_validation_error("request_password_reset"))?;
        self.auth
            .send_password_reset(email.trim())
            .map_err(log_auth_error("request_password_reset"))?;
        Ok(())
    }

    /// Update the signed-in user's display name and WhatsApp number.
    pub fn update_profile(&self, display_name: &str, whatsapp_number: &str) -> ServiceResult<UserProfile> {
        validation::validate_whatsapp(whatsapp_number)
            .map_err(log_validation_error("update_profile"))?;

        let user = self
            .auth
            .update_display_name(display_name)
            .map_err(log_auth_error("update_profile"))?;

        let changes = fields(json!({
            "displayName": display_name,
            "whatsappNumber": whatsapp_number,
        }));
        self.users
            .merge_fields(&user.uid, changes)
            .map_err(log_store_error("update_profile"))?;

        self.users
            .require(&user.uid)
            .map_err(log_store_error("update_profile"))
    }

    /// Re-authenticate with the current password, then set the new one.
    pub fn change_password(&self, current_password: &str, new_password: &str) -> ServiceResult<()> {
        validation::validate_password_length(new_password, self.config.min_password_length())
            .map_err(log_validation_error("change_password"))?;

        self.auth
            .reauthenticate(current_password)
            .map_err(log_auth_error("change_password"))?;
        self.auth
            .update_password(new_password)
            .map_err(log_auth_error("change_password"))?;
        Ok(())
    }

    fn resolve(&self, user: AuthUser) -> ServiceResult<SignedIn> {
        let profile = self
            .users
            .get(&user.uid)
            .map_err(log_store_error("load_profile"))?
            .ok_or_else(|| {
                tracing::warn!(uid = %user.uid, "signed-in user has no user document");
                ServiceError::not_found(USER, user.uid.as_str())
            })?;

        let role = profile.role.ok_or_else(|| {
            tracing::warn!(uid = %user.uid, "user document has no valid userType");
            ServiceError::Validation(ValidationError::InvalidRole(user.uid.clone()))
        })?;

        Ok(SignedIn {
            user,
            profile,
            role,
            home: role.home(),
        })
    }
}

fn log_auth_error(operation: &'static str) -> impl Fn(AuthError) -> ServiceError {
    move |e| {
        match &e {
            AuthError::Backend(_) | AuthError::Other { .. } => {
                tracing::error!(operation, code = e.code(), error = %e, "auth call failed")
            }
            _ => tracing::debug!(operation, code = e.code(), "auth call rejected"),
        }
        ServiceError::Auth(e)
    }
}
