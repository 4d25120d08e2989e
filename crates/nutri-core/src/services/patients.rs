//! Patient records, consultations, menus and the weight chart.

use chrono::NaiveDateTime;
use serde_json::json;

use super::{fields, log_store_error, log_validation_error, ServiceError, ServiceResult};
use crate::config::CoreConfig;
use crate::dates;
use crate::models::{Consultation, Menu, NewConsultation, Patient};
use crate::store::{Collection, DocumentData, DocumentStore, StoreError};
use crate::validation::ValidationError;

const PATIENT: &str = "patient";
const CONSULTATION: &str = "consultation";

/// One point on the weight evolution chart.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightPoint {
    /// `YYYY-MM-DD`, or the stored date text when it does not parse
    pub label: String,
    pub weight_kg: f64,
}

/// Patient operations over the patients collection.
pub struct PatientService<'a> {
    patients: Collection<'a, Patient>,
    config: &'a CoreConfig,
}

impl<'a> PatientService<'a> {
    pub fn new(store: &'a dyn DocumentStore, config: &'a CoreConfig) -> Self {
        Self {
            patients: Collection::new(store, config.patients_collection()),
            config,
        }
    }

    /// Create a patient. Name and email are required.
    pub fn add_patient(&self, name: &str, email: &str, birth_date: &str) -> ServiceResult<Patient> {
        let mut patient = Patient::new(
            name.trim().to_string(),
            email.trim().to_string(),
            birth_date.trim().to_string(),
        );
        patient
            .validate()
            .map_err(log_validation_error("add_patient"))?;

        patient.id = self
            .patients
            .add(&patient)
            .map_err(log_store_error("add_patient"))?;
        tracing::info!(patient_id = %patient.id, "patient created");
        Ok(patient)
    }

    pub fn list_patients(&self) -> ServiceResult<Vec<Patient>> {
        self.patients.list().map_err(log_store_error("list_patients"))
    }

    /// Patients whose name contains `query`, ignoring case. An empty query matches all.
    pub fn search_patients(&self, query: &str) -> ServiceResult<Vec<Patient>> {
        let query = query.trim();
        let mut patients = self.list_patients()?;
        if !query.is_empty() {
            patients.retain(|p| p.name_matches(query));
        }
        Ok(patients)
    }

    pub fn get_patient(&self, patient_id: &str) -> ServiceResult<Option<Patient>> {
        self.patients
            .get(patient_id)
            .map_err(log_store_error("get_patient"))
    }

    /// First patient registered under `email`.
    pub fn get_patient_by_email(&self, email: &str) -> ServiceResult<Option<Patient>> {
        let matches = self
            .patients
            .find_by("email", email.trim())
            .map_err(log_store_error("get_patient_by_email"))?;
        Ok(matches.into_iter().next())
    }

    /// Replace the patient's personal data, keeping consultations and menu.
    pub fn update_patient(
        &self,
        patient_id: &str,
        name: &str,
        email: &str,
        birth_date: &str,
    ) -> ServiceResult<Patient> {
        let mut patient = self.require_patient(patient_id)?;
        patient.name = name.trim().to_string();
        patient.email = email.trim().to_string();
        patient.birth_date = birth_date.trim().to_string();
        patient
            .validate()
            .map_err(log_validation_error("update_patient"))?;

        let changes = fields(json!({
            "nombre": patient.name,
            "email": patient.email,
            "fechaNacimiento": patient.birth_date,
        }));
        self.write_fields(patient_id, changes, "update_patient")?;
        Ok(patient)
    }

    pub fn delete_patient(&self, patient_id: &str) -> ServiceResult<()> {
        self.patients
            .delete(patient_id)
            .map_err(log_store_error("delete_patient"))?;
        tracing::info!(patient_id, "patient deleted");
        Ok(())
    }

    /// Record a consultation stamped with the current local time.
    pub fn add_consultation(
        &self,
        patient_id: &str,
        input: NewConsultation,
    ) -> ServiceResult<Consultation> {
        self.add_consultation_at(patient_id, input, &dates::now_local())
    }

    /// Record a consultation stamped with `recorded_at`.
    pub fn add_consultation_at(
        &self,
        patient_id: &str,
        input: NewConsultation,
        recorded_at: &NaiveDateTime,
    ) -> ServiceResult<Consultation> {
        input
            .validate()
            .map_err(log_validation_error("add_consultation"))?;

        let mut patient = self.require_patient(patient_id)?;
        let id = self.patients.generate_child_id(patient_id, "consultas");
        let consultation = Consultation::from_input(id, recorded_at, input);
        patient.consultations.push(consultation.clone());

        self.write_consultations(&patient, "add_consultation")?;
        tracing::info!(patient_id, consultation_id = %consultation.id, "consultation added");
        Ok(consultation)
    }

    /// A consultation of an existing patient, if present.
    pub fn get_consultation(
        &self,
        patient_id: &str,
        consultation_id: &str,
    ) -> ServiceResult<Option<Consultation>> {
        let patient = self.require_patient(patient_id)?;
        Ok(patient.consultation(consultation_id).cloned())
    }

    pub fn delete_consultation(
        &self,
        patient_id: &str,
        consultation_id: &str,
    ) -> ServiceResult<Consultation> {
        let mut patient = self.require_patient(patient_id)?;
        let removed = patient
            .remove_consultation(consultation_id)
            .ok_or_else(|| ServiceError::not_found(CONSULTATION, consultation_id))?;

        self.write_consultations(&patient, "delete_consultation")?;
        tracing::info!(patient_id, consultation_id, "consultation deleted");
        Ok(removed)
    }

    /// Delete by position in the `consultas` list.
    pub fn delete_consultation_at(&self, patient_id: &str, index: usize) -> ServiceResult<Consultation> {
        let mut patient = self.require_patient(patient_id)?;
        let len = patient.consultations.len();
        if index >= len {
            return Err(log_validation_error("delete_consultation_at")(
                ValidationError::IndexOutOfRange { index, len },
            ));
        }
        let removed = patient.consultations.remove(index);

        self.write_consultations(&patient, "delete_consultation_at")?;
        tracing::info!(patient_id, index, "consultation deleted");
        Ok(removed)
    }

    /// Replace the patient's daily menu.
    pub fn set_menu(&self, patient_id: &str, menu: &Menu) -> ServiceResult<()> {
        let changes = fields(json!({ "menuDiario": menu }));
        self.write_fields(patient_id, changes, "set_menu")
    }

    /// The stored menu; `None` when the patient or the menu is missing.
    pub fn get_menu(&self, patient_id: &str) -> ServiceResult<Option<Menu>> {
        Ok(self.get_patient(patient_id)?.and_then(|p| p.menu))
    }

    /// Weights of the latest consultations of the patient registered under `email`,
    /// oldest first. Empty when no such patient exists.
    pub fn weight_evolution(&self, email: &str) -> ServiceResult<Vec<WeightPoint>> {
        let Some(patient) = self.get_patient_by_email(email)? else {
            tracing::debug!("no patient record for weight chart");
            return Ok(Vec::new());
        };

        Ok(patient
            .recent_consultations(self.config.weight_chart_points())
            .iter()
            .map(|c| WeightPoint {
                label: dates::chart_label(&c.date).unwrap_or_else(|| c.date.clone()),
                weight_kg: c.weight_kg,
            })
            .collect())
    }

    fn require_patient(&self, patient_id: &str) -> ServiceResult<Patient> {
        self.get_patient(patient_id)?
            .ok_or_else(|| ServiceError::not_found(PATIENT, patient_id))
    }

    fn write_consultations(&self, patient: &Patient, operation: &'static str) -> ServiceResult<()> {
        let changes = fields(json!({ "consultas": patient.consultations }));
        self.write_fields(&patient.id, changes, operation)
    }

    fn write_fields(
        &self,
        patient_id: &str,
        changes: DocumentData,
        operation: &'static str,
    ) -> ServiceResult<()> {
        match self.patients.update_fields(patient_id, changes) {
            Ok(()) => Ok(()),
            Err(StoreError::NotFound { .. }) => Err(ServiceError::not_found(PATIENT, patient_id)),
            Err(e) => Err(log_store_error(operation)(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;

    fn setup() -> (Database, CoreConfig) {
        (Database::open_in_memory().unwrap(), CoreConfig::default())
    }

    fn input(weight_kg: f64) -> NewConsultation {
        NewConsultation {
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

    fn at(value: &str) -> NaiveDateTime {
        dates::parse_date_time(value).unwrap()
    }

    #[test]
    fn test_falsy_entries_gone_after_write() {
        let (db, config) = setup();
        db.set(
            "pacientes",
            "p1",
            fields(json!({
                "nombre": "Luis",
                "consultas": [null, {"id": "c1", "fecha": "01-01-2024 10:00"}]
            })),
            false,
        )
        .unwrap();
        let service = PatientService::new(&db, &config);

        let raw = db.get_document("pacientes", "p1").unwrap().unwrap();
        assert_eq!(raw.data["consultas"].as_array().unwrap().len(), 2);

        service
            .add_consultation_at("p1", input(80.0), &at("02-01-2024 10:00"))
            .unwrap();
        let raw = db.get_document("pacientes", "p1").unwrap().unwrap();
        let stored = raw.data["consultas"].as_array().unwrap();
        assert_eq!(stored.len(), 2);
        assert!(stored.iter().all(|entry| entry.is_object()));
    }

    #[test]
    fn test_add_and_get_patient() {
        let (db, config) = setup();
        let service = PatientService::new(&db, &config);

        let created = service.add_patient("Ana Pérez", "ana@example.com", "12-05-1988").unwrap();
        assert_eq!(created.id.len(), 20);

        let loaded = service.get_patient(&created.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Ana Pérez");
        assert!(loaded.consultations.is_empty());

        assert!(service.get_patient("missing").unwrap().is_none());
    }

    #[test]
    fn test_add_patient_requires_name_and_email() {
        let (db, config) = setup();
        let service = PatientService::new(&db, &config);

        let result = service.add_patient("", "ana@example.com", "");
        assert!(matches!(
            result,
            Err(ServiceError::Validation(ValidationError::MissingField("nombre")))
        ));
        let result = service.add_patient("Ana", "  ", "");
        assert!(matches!(
            result,
            Err(ServiceError::Validation(ValidationError::MissingField("email")))
        ));
        let result = service.add_patient("Ana", "ana@example.com", "1988-05-12");
        assert!(matches!(
            result,
            Err(ServiceError::Validation(ValidationError::InvalidDate(_)))
        ));
        assert!(service.list_patients().unwrap().is_empty());
    }

    #[test]
    fn test_search_patients() {
        let (db, config) = setup();
        let service = PatientService::new(&db, &config);
        service.add_patient("Ana Pérez", "ana@example.com", "").unwrap();
        service.add_patient("Mariana Gómez", "mari@example.com", "").unwrap();
        service.add_patient("Luis Benítez", "luis@example.com", "").unwrap();

        let names: Vec<_> = service
            .search_patients("ANA")
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Ana Pérez", "Mariana Gómez"]);

        assert_eq!(service.search_patients("").unwrap().len(), 3);
    }

    #[test]
    fn test_get_patient_by_email() {
        let (db, config) = setup();
        let service = PatientService::new(&db, &config);
        let created = service.add_patient("Ana", "ana@example.com", "").unwrap();

        let found = service.get_patient_by_email("ana@example.com").unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(service.get_patient_by_email("bob@example.com").unwrap().is_none());
    }

    #[test]
    fn test_update_patient_keeps_consultations() {
        let (db, config) = setup();
        let service = PatientService::new(&db, &config);
        let created = service.add_patient("Ana", "ana@example.com", "").unwrap();
        service
            .add_consultation_at(&created.id, input(70.0), &at("01-01-2024 10:00"))
            .unwrap();

        service
            .update_patient(&created.id, "Ana María", "ana@example.com", "12-05-1988")
            .unwrap();

        let loaded = service.get_patient(&created.id).unwrap().unwrap();
        assert_eq!(loaded.name, "Ana María");
        assert_eq!(loaded.birth_date, "12-05-1988");
        assert_eq!(loaded.consultations.len(), 1);

        let missing = service.update_patient("ghost", "X", "x@example.com", "");
        assert!(matches!(missing, Err(ServiceError::NotFound { entity: "patient", .. })));
    }

    #[test]
    fn test_add_consultation() {
        let (db, config) = setup();
        let service = PatientService::new(&db, &config);
        let patient = service.add_patient("Ana", "ana@example.com", "").unwrap();

        let consultation = service
            .add_consultation_at(&patient.id, input(70.0), &at("01-01-2024 10:00"))
            .unwrap();
        assert_eq!(consultation.date, "01-01-2024 10:00");
        assert_eq!(consultation.id.len(), 20);

        let loaded = service
            .get_consultation(&patient.id, &consultation.id)
            .unwrap()
            .unwrap();
        assert_eq!(loaded.weight_kg, 70.0);
        assert!(service.get_consultation(&patient.id, "nope").unwrap().is_none());
    }

    #[test]
    fn test_add_consultation_validation_and_missing_patient() {
        let (db, config) = setup();
        let service = PatientService::new(&db, &config);
        let patient = service.add_patient("Ana", "ana@example.com", "").unwrap();

        let mut bad = input(70.0);
        bad.reason.clear();
        assert!(matches!(
            service.add_consultation(&patient.id, bad),
            Err(ServiceError::Validation(ValidationError::MissingField("detalle")))
        ));

        assert!(matches!(
            service.add_consultation("ghost", input(70.0)),
            Err(ServiceError::NotFound { entity: "patient", .. })
        ));
    }

    #[test]
    fn test_delete_consultation_twice() {
        let (db, config) = setup();
        let service = PatientService::new(&db, &config);
        let patient = service.add_patient("Ana", "ana@example.com", "").unwrap();
        let first = service
            .add_consultation_at(&patient.id, input(70.0), &at("01-01-2024 10:00"))
            .unwrap();
        service
            .add_consultation_at(&patient.id, input(68.0), &at("15-03-2024 09:30"))
            .unwrap();

        service.delete_consultation(&patient.id, &first.id).unwrap();
        let second = service.delete_consultation(&patient.id, &first.id);
        assert!(matches!(
            second,
            Err(ServiceError::NotFound { entity: "consultation", .. })
        ));

        let loaded = service.get_patient(&patient.id).unwrap().unwrap();
        assert_eq!(loaded.consultations.len(), 1);
        assert_eq!(loaded.consultations[0].weight_kg, 68.0);
    }

    #[test]
    fn test_delete_consultation_at() {
        let (db, config) = setup();
        let service = PatientService::new(&db, &config);
        let patient = service.add_patient("Ana", "ana@example.com", "").unwrap();
        service
            .add_consultation_at(&patient.id, input(70.0), &at("01-01-2024 10:00"))
            .unwrap();

        assert!(matches!(
            service.delete_consultation_at(&patient.id, 3),
            Err(ServiceError::Validation(ValidationError::IndexOutOfRange { index: 3, len: 1 }))
        ));
        let removed = service.delete_consultation_at(&patient.id, 0).unwrap();
        assert_eq!(removed.weight_kg, 70.0);
    }

    #[test]
    fn test_menu() {
        let (db, config) = setup();
        let service = PatientService::new(&db, &config);
        let patient = service.add_patient("Ana", "ana@example.com", "").unwrap();
        assert!(service.get_menu(&patient.id).unwrap().is_none());

        let mut menu = Menu::suggested();
        menu.lunch.options = vec!["Ensalada".into(), "Pollo".into()];
        service.set_menu(&patient.id, &menu).unwrap();

        assert_eq!(service.get_menu(&patient.id).unwrap(), Some(menu.clone()));
        assert!(service.get_menu("ghost").unwrap().is_none());
        assert!(matches!(
            service.set_menu("ghost", &menu),
            Err(ServiceError::NotFound { .. })
        ));
    }

    #[test]
    fn test_weight_evolution_last_four() {
        let (db, config) = setup();
        let service = PatientService::new(&db, &config);
        let patient = service.add_patient("Ana", "ana@example.com", "").unwrap();

        let visits = [
            ("01-01-2024 10:00", 72.0),
            ("01-02-2024 10:00", 71.0),
            ("01-03-2024 10:00", 70.5),
            ("15-03-2024 09:30", 70.0),
            ("01-04-2024 10:00", 69.0),
        ];
        for (date, weight) in visits {
            service
                .add_consultation_at(&patient.id, input(weight), &at(date))
                .unwrap();
        }

        let points = service.weight_evolution("ana@example.com").unwrap();
        assert_eq!(points.len(), 4);
        assert_eq!(points[0].label, "2024-02-01");
        assert_eq!(points[3], WeightPoint { label: "2024-04-01".into(), weight_kg: 69.0 });

        assert!(service.weight_evolution("bob@example.com").unwrap().is_empty());
    }
}
