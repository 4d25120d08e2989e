//! Doctor directory shown on the patient's contact screen.

use super::{log_store_error, ServiceResult};
use crate::config::CoreConfig;
use crate::models::{Doctor, Role, UserProfile};
use crate::store::{Collection, DocumentStore};

/// Every user whose role is doctor, with display fallbacks applied.
pub fn fetch_doctors(store: &dyn DocumentStore, config: &CoreConfig) -> ServiceResult<Vec<Doctor>> {
    let doctors = Collection::<UserProfile>::new(store, config.users_collection())
        .find_by("userType", Role::Doctor.as_str())
        .map_err(log_store_error("fetch_doctors"))?;
    Ok(doctors.into_iter().map(Doctor::from).collect())
}
