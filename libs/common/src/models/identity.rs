//! Student identity model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::gateway::Record;

/// Display name candidates, in preference order
pub const NAME_FIELDS: &[&str] = &["Name", "name", "Nom", "Nom complet"];

const EMAIL_FIELDS: &[&str] = &["Email", "email", "E-mail", "Mail"];
const AGE_FIELDS: &[&str] = &["Age", "Âge", "age"];
const GENDER_FIELDS: &[&str] = &["Sexe", "Genre", "Gender"];
const BIRTH_DATE_FIELDS: &[&str] = &["Date de naissance", "Date de Naissance", "BirthDate"];
const PROFESSION_FIELDS: &[&str] = &["Profession", "Métier"];
const INITIAL_WEIGHT_FIELDS: &[&str] = &["Poids Initial", "Poids initial", "Poids de départ", "InitialWeight"];
const TARGET_WEIGHT_FIELDS: &[&str] = &["Poids Cible", "Poids cible", "Poids Objectif", "TargetWeight"];
const HEIGHT_FIELDS: &[&str] = &["Taille", "Taille (cm)", "Height"];
const ACTIVITY_FIELDS: &[&str] = &["Niveau d'activité", "Niveau d'Activité", "ActivityLevel"];
const DIET_FIELDS: &[&str] = &["Régime", "Régime alimentaire", "Diet"];
const MOTIVATION_FIELDS: &[&str] = &["Motivation", "Motivations"];
const OBJECTIVE_FIELDS: &[&str] = &["Objectif", "Objectifs", "Objectif principal", "Objectives"];
const MEAL_FREQUENCY_FIELDS: &[&str] = &["Nombre de repas", "Fréquence des repas", "MealFrequency"];
const EATING_HABITS_FIELDS: &[&str] = &["Habitudes alimentaires", "EatingHabits"];
const MEDICAL_FIELDS: &[&str] = &["Antécédents médicaux", "Antécédents", "MedicalHistory"];
const STATUS_FIELDS: &[&str] = &["Statut", "Status"];

/// An authenticated student
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub name: String,
    /// The code supplied at login
    pub access_token: String,
    pub email: Option<String>,
    pub age: Option<f64>,
    pub gender: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub profession: Option<String>,
    pub initial_weight: Option<f64>,
    pub target_weight: Option<f64>,
    pub height: Option<f64>,
    pub activity_level: Option<String>,
    pub diet: Option<String>,
    pub motivation: Option<String>,
    pub objectives: Option<String>,
    pub meal_frequency: Option<String>,
    pub eating_habits: Option<String>,
    pub medical_history: Option<String>,
    /// Follow-up status ("Actif", "En attente", "Pause")
    pub status: Option<String>,
}

impl Identity {
    /// Identity with only the mandatory attributes set
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            access_token: access_token.into(),
            email: None,
            age: None,
            gender: None,
            birth_date: None,
            profession: None,
            initial_weight: None,
            target_weight: None,
            height: None,
            activity_level: None,
            diet: None,
            motivation: None,
            objectives: None,
            meal_frequency: None,
            eating_habits: None,
            medical_history: None,
            status: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Map a student record; the access token is the one used to find it
    pub fn from_record(record: &Record, access_token: &str) -> Self {
        Self {
            id: record.id.clone(),
            name: record.text(NAME_FIELDS).unwrap_or_default(),
            access_token: access_token.to_string(),
            email: record.text(EMAIL_FIELDS),
            age: record.number(AGE_FIELDS),
            gender: record.text(GENDER_FIELDS),
            birth_date: record.date(BIRTH_DATE_FIELDS),
            profession: record.text(PROFESSION_FIELDS),
            initial_weight: record.number(INITIAL_WEIGHT_FIELDS),
            target_weight: record.number(TARGET_WEIGHT_FIELDS),
            height: record.number(HEIGHT_FIELDS),
            activity_level: record.text(ACTIVITY_FIELDS),
            diet: record.text(DIET_FIELDS),
            motivation: record.text(MOTIVATION_FIELDS),
            objectives: record.text(OBJECTIVE_FIELDS),
            meal_frequency: record.text(MEAL_FREQUENCY_FIELDS),
            eating_habits: record.text(EATING_HABITS_FIELDS),
            medical_history: record.text(MEDICAL_FIELDS),
            status: record.text(STATUS_FIELDS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identity_from_record() {
        let record = Record::new(
            "recStudent0000001",
            json!({
                "Nom": "Féline Faure",
                "code": "F3L1N3",
                "Email": "feline.faure@example.com",
                "Poids Initial": "72,5",
                "Poids Cible": 64,
                "Taille": [168],
                "Date de naissance": "1990-05-12",
                "Statut": "Actif"
            }),
        );

        let identity = Identity::from_record(&record, "F3L1N3");
        assert_eq!(identity.id, "recStudent0000001");
        assert_eq!(identity.name, "Féline Faure");
        assert_eq!(identity.access_token, "F3L1N3");
        assert_eq!(identity.email.as_deref(), Some("feline.faure@example.com"));
        assert_eq!(identity.initial_weight, Some(72.5));
        assert_eq!(identity.target_weight, Some(64.0));
        assert_eq!(identity.height, Some(168.0));
        assert_eq!(identity.birth_date, NaiveDate::from_ymd_opt(1990, 5, 12));
        assert_eq!(identity.status.as_deref(), Some("Actif"));
        assert_eq!(identity.diet, None);
    }

    #[test]
    fn test_identity_without_name_is_still_mapped() {
        let record = Record::new("recX", json!({"code": "abc"}));
        let identity = Identity::from_record(&record, "abc");
        assert_eq!(identity.name, "");
        assert_eq!(identity, Identity::new("recX", "", "abc"));
    }
}
