//! Workout model
//!
//! The backend stores one row per exercise; rows sharing a week, day and
//! block form one workout session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::fields::parse_date;
use crate::gateway::Record;

const WEEK_FIELDS: &[&str] = &["Semaine", "Week"];
const DAY_FIELDS: &[&str] = &["Jour", "Day"];
const BLOCK_FIELDS: &[&str] = &["Bloc", "Block"];
const PART_FIELDS: &[&str] = &["Partie", "Part"];
const NAME_FIELDS: &[&str] = &["Exercice", "Exercise", "Name"];
const FORMAT_FIELDS: &[&str] = &["Format de Travail", "Format"];
const REST_FIELDS: &[&str] = &["Rest", "Repos"];
const LOAD_FIELDS: &[&str] = &["Charge (Kg)", "Charge", "Load"];
const NOTES_FIELDS: &[&str] = &["Notes", "Note"];

/// One exercise row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: String,
    pub name: String,
    /// Set/rep scheme, e.g. "4x10"
    pub format: Option<String>,
    pub rest: Option<String>,
    pub load: Option<String>,
    pub notes: Option<String>,
}

impl Exercise {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            name: record.text(NAME_FIELDS).unwrap_or_default(),
            format: record.text(FORMAT_FIELDS),
            rest: record.text(REST_FIELDS),
            load: record.text(LOAD_FIELDS),
            notes: record.text(NOTES_FIELDS),
        }
    }
}

/// Exercises of one (week, day, block)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workout {
    /// `week-day-block`
    pub id: String,
    pub week: String,
    pub day: String,
    pub block: String,
    pub part: Option<String>,
    pub exercises: Vec<Exercise>,
}

impl Workout {
    /// Week label read as a date, when it is one
    pub fn week_date(&self) -> Option<NaiveDate> {
        parse_date(&self.week)
    }
}

/// Group exercise rows into workouts, most recent week first
pub fn group_workouts(records: &[Record]) -> Vec<Workout> {
    let mut workouts: Vec<Workout> = Vec::new();

    for record in records {
        let week = record.text(WEEK_FIELDS).unwrap_or_default();
        let day = record.text(DAY_FIELDS).unwrap_or_default();
        let block = record.text(BLOCK_FIELDS).unwrap_or_default();
        let id = format!("{}-{}-{}", week, day, block);

        let exercise = Exercise::from_record(record);
        match workouts.iter_mut().find(|w| w.id == id) {
            Some(workout) => workout.exercises.push(exercise),
            None => workouts.push(Workout {
                id,
                week,
                day,
                block,
                part: record.text(PART_FIELDS),
                exercises: vec![exercise],
            }),
        }
    }

    workouts.sort_by(|a, b| match (a.week_date(), b.week_date()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (a, b) => b.is_some().cmp(&a.is_some()),
    });
    workouts
}
