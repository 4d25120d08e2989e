//! Patient and consultation models.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::menu::Menu;
use super::{null_as_default, skip_falsy_entries};
use crate::dates::{self, DateError};
use crate::validation::{self, ValidationError, ValidationResult};

/// A patient record in the `pacientes` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Patient {
    /// Document ID (lives outside the document body)
    #[serde(skip)]
    pub id: String,
    /// Full name
    #[serde(rename = "nombre", default, deserialize_with = "null_as_default")]
    pub name: String,
    /// Contact email, also used to link the patient's own account
    #[serde(default, deserialize_with = "null_as_default")]
    pub email: String,
    /// Birth date, `DD-MM-YYYY` with an optional ` HH:mm`
    #[serde(rename = "fechaNacimiento", default, deserialize_with = "null_as_default")]
    pub birth_date: String,
    /// Consultations in entry order
    #[serde(rename = "consultas", default, deserialize_with = "skip_falsy_entries")]
    pub consultations: Vec<Consultation>,
    /// Suggested daily menu
    #[serde(rename = "menuDiario", default, skip_serializing_if = "Option::is_none")]
    pub menu: Option<Menu>,
}

impl Patient {
    /// Create a patient that has not been stored yet.
    pub fn new(name: String, email: String, birth_date: String) -> Self {
        Self {
            id: String::new(),
            name,
            email,
            birth_date,
            consultations: Vec::new(),
            menu: None,
        }
    }

    /// Name and email are required; a non-empty birth date must parse.
    pub fn validate(&self) -> ValidationResult<()> {
        validation::require(&self.name, "nombre")?;
        validation::require(&self.email, "email")?;
        validation::validate_optional_date(&self.birth_date)
    }

    pub fn consultation(&self, consultation_id: &str) -> Option<&Consultation> {
        self.consultations.iter().find(|c| c.id == consultation_id)
    }

    /// Remove a consultation by ID, returning it if present.
    pub fn remove_consultation(&mut self, consultation_id: &str) -> Option<Consultation> {
        let index = self
            .consultations
            .iter()
            .position(|c| c.id == consultation_id)?;
        Some(self.consultations.remove(index))
    }

    /// Most recent consultations, oldest first.
    pub fn recent_consultations(&self, count: usize) -> &[Consultation] {
        let start = self.consultations.len().saturating_sub(count);
        &self.consultations[start..]
    }

    /// Case-insensitive substring match on the name.
    pub fn name_matches(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(&query.to_lowercase())
    }
}

/// A consultation embedded in its patient's `consultas` array.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Consultation {
    /// Unique within the parent patient
    #[serde(default)]
    pub id: String,
    /// Write time, `DD-MM-YYYY HH:mm`
    #[serde(rename = "fecha", default, deserialize_with = "null_as_default")]
    pub date: String,
    /// Reason for the visit
    #[serde(rename = "detalle", default, deserialize_with = "null_as_default")]
    pub reason: String,
    /// Weight in kg
    #[serde(rename = "peso", default, deserialize_with = "null_as_default")]
    pub weight_kg: f64,
    /// Height in cm
    #[serde(rename = "altura", default, deserialize_with = "null_as_default")]
    pub height_cm: f64,
    /// Blood pressure as entered (e.g. "120/80")
    #[serde(rename = "presionArterial", default, deserialize_with = "null_as_default")]
    pub blood_pressure: String,
    /// Waist circumference in cm
    #[serde(rename = "cintura", default, deserialize_with = "null_as_default")]
    pub waist_cm: f64,
    /// Hip circumference in cm
    #[serde(rename = "cadera", default, deserialize_with = "null_as_default")]
    pub hip_cm: f64,
    /// Chest circumference in cm
    #[serde(rename = "torax", default, deserialize_with = "null_as_default")]
    pub chest_cm: f64,
    /// Free-text notes
    #[serde(rename = "notas", default, deserialize_with = "null_as_default")]
    pub notes: String,
}

impl Consultation {
    /// Build the stored consultation from form input.
    pub fn from_input(id: String, recorded_at: &NaiveDateTime, input: NewConsultation) -> Self {
        Self {
            id,
            date: dates::format_date_time(recorded_at, true),
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

    /// Parsed `fecha`.
    pub fn recorded_at(&self) -> Result<NaiveDateTime, DateError> {
        dates::parse_date_time(&self.date)
    }
}

/// Consultation form input. The date and ID are assigned on write.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NewConsultation {
    pub reason: String,
    pub weight_kg: f64,
    pub height_cm: f64,
    pub blood_pressure: String,
    pub waist_cm: f64,
    pub hip_cm: f64,
    pub chest_cm: f64,
    pub notes: String,
}

impl NewConsultation {
    /// Every field except notes is mandatory.
    pub fn validate(&self) -> ValidationResult<()> {
        validation::require(&self.reason, "detalle")?;
        validation::require(&self.blood_pressure, "presionArterial")?;

        let measurements = [
            (self.weight_kg, "peso"),
            (self.height_cm, "altura"),
            (self.waist_cm, "cintura"),
            (self.hip_cm, "cadera"),
            (self.chest_cm, "torax"),
        ];
        for (value, field) in measurements {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::MissingField(field));
            }
        }
        Ok(())
    }
}
