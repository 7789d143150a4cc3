//! Goal model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::gateway::Record;

const DESCRIPTION_FIELDS: &[&str] = &["Description", "Objectif", "Intitulé", "Name"];
const TARGET_VALUE_FIELDS: &[&str] = &["Valeur Cible", "Cible", "TargetValue"];
const TARGET_DATE_FIELDS: &[&str] = &["TargetDate", "Date Cible", "Échéance"];
const STATUS_FIELDS: &[&str] = &["Status", "Statut"];

/// Progress state of a goal
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GoalStatus {
    #[default]
    Pending,
    InProgress,
    Achieved,
}

impl GoalStatus {
    /// Parse an English or French status label, unknown labels are pending
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "in-progress" | "inprogress" | "en-cours" | "active" | "actif" => GoalStatus::InProgress,
            "achieved" | "done" | "completed" | "atteint" | "réussi" | "terminé" => {
                GoalStatus::Achieved
            }
            _ => GoalStatus::Pending,
        }
    }
}

/// A student objective
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub description: String,
    pub target_value: Option<f64>,
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
}

impl Goal {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            description: record.text(DESCRIPTION_FIELDS).unwrap_or_default(),
            target_value: record.number(TARGET_VALUE_FIELDS),
            target_date: record.date(TARGET_DATE_FIELDS),
            status: record
                .text(STATUS_FIELDS)
                .map(|raw| GoalStatus::parse(&raw))
                .unwrap_or_default(),
        }
    }
}
