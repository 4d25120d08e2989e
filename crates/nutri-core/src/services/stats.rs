//! Practice statistics for the doctor dashboard.
//!
//! A single pass over every patient and user document: patient count, the most
//! recent consultation timestamp, and user counts by role.

use chrono::NaiveDateTime;

use crate::config::CoreConfig;
use crate::dates;
use crate::models::{Patient, Role, UserProfile};
use crate::store::{Collection, DocumentStore, StoreResult};

/// Dashboard summary.
#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub total_patients: u64,
    /// Latest consultation across all patients; the Unix epoch when there is none
    pub last_consultation: NaiveDateTime,
    pub total_users: u64,
    pub total_doctors: u64,
    pub total_patient_users: u64,
}

impl Statistics {
    /// `last_consultation` as `YYYY-MM-DDTHH:MM:SS.sssZ`.
    pub fn last_consultation_iso(&self) -> String {
        dates::to_iso_string(&self.last_consultation)
    }
}

/// Reduce already-loaded documents to a summary.
///
/// Consultations whose date does not parse are ignored.
pub fn aggregate(patients: &[Patient], users: &[UserProfile]) -> Statistics {
    let last_consultation = patients
        .iter()
        .flat_map(|p| p.consultations.iter())
        .filter_map(|c| match c.recorded_at() {
            Ok(at) => Some(at),
            Err(e) => {
                tracing::debug!(consultation_id = %c.id, error = %e, "skipping undated consultation");
                None
            }
        })
        .fold(dates::epoch(), NaiveDateTime::max);

    let count_role = |role: Role| users.iter().filter(|u| u.role == Some(role)).count() as u64;

    Statistics {
        total_patients: patients.len() as u64,
        last_consultation,
        total_users: users.len() as u64,
        total_doctors: count_role(Role::Doctor),
        total_patient_users: count_role(Role::Patient),
    }
}

/// Loads both collections and aggregates them.
pub struct StatisticsAggregator<'a> {
    store: &'a dyn DocumentStore,
    config: &'a CoreConfig,
}

impl<'a> StatisticsAggregator<'a> {
    pub fn new(store: &'a dyn DocumentStore, config: &'a CoreConfig) -> Self {
        Self { store, config }
    }

    /// Current statistics, or `None` if any read fails.
    pub fn compute(&self) -> Option<Statistics> {
        match self.load() {
            Ok((patients, users)) => Some(aggregate(&patients, &users)),
            Err(e) => {
                tracing::error!(error = %e, "failed to compute statistics");
                None
            }
        }
    }

    fn load(&self) -> StoreResult<(Vec<Patient>, Vec<UserProfile>)> {
        let patients = Collection::<Patient>::new(self.store, self.config.patients_collection()).list()?;
        let users = Collection::<UserProfile>::new(self.store, self.config.users_collection()).list()?;
        Ok((patients, users))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Consultation;

    fn consultation(date: &str, weight_kg: f64) -> Consultation {
        Consultation {
            id: date.into(),
            date: date.into(),
            weight_kg,
            ..Consultation::default()
        }
    }

    fn user(role: Option<Role>) -> UserProfile {
        UserProfile {
            role,
            ..UserProfile::default()
        }
    }

    #[test]
    fn test_empty() {
        let stats = aggregate(&[], &[]);
        assert_eq!(stats.total_patients, 0);
        assert_eq!(stats.last_consultation, dates::epoch());
        assert_eq!(stats.last_consultation_iso(), "1970-01-01T00:00:00.000Z");
    }

    #[test]
    fn test_latest_consultation() {
        let patient = Patient {
            consultations: vec![
                consultation("01-01-2024 10:00", 70.0),
                consultation("15-03-2024 09:30", 68.0),
            ],
            ..Patient::default()
        };
        let stats = aggregate(&[patient, Patient::default()], &[]);
        assert_eq!(stats.total_patients, 2);
        assert_eq!(dates::format_date_time(&stats.last_consultation, true), "15-03-2024 09:30");
        assert_eq!(
            stats.last_consultation_iso(),
            dates::to_iso_string(&dates::parse_date_time("15-03-2024 09:30").unwrap())
        );
    }

    #[test]
    fn test_undated_consultations_ignored() {
        let patient = Patient {
            consultations: vec![consultation("", 70.0), consultation("2024-03-15", 70.0)],
            ..Patient::default()
        };
        let stats = aggregate(&[patient], &[]);
        assert_eq!(stats.last_consultation, dates::epoch());
    }

    #[test]
    fn test_role_counts() {
        let users = [
            user(Some(Role::Doctor)),
            user(Some(Role::Patient)),
            user(Some(Role::Patient)),
            user(None),
        ];
        let stats = aggregate(&[], &users);
        assert_eq!(stats.total_users, 4);
        assert_eq!(stats.total_doctors, 1);
        assert_eq!(stats.total_patient_users, 2);
    }
}
