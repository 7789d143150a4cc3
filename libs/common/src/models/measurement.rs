//! Body measurement model and derived progress figures

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::gateway::Record;

const DATE_FIELDS: &[&str] = &["Date de Mesure", "Date", "date"];
const WEIGHT_FIELDS: &[&str] = &["Weight", "Poids", "Poids (kg)"];
const HEIGHT_FIELDS: &[&str] = &["Height", "Taille"];
const BODY_FAT_FIELDS: &[&str] = &["BodyFat", "Masse Grasse (%)", "Masse Grasse"];
const MUSCLE_FIELDS: &[&str] = &["MusclePercentage", "Masse Musulaire", "Masse Musculaire"];
const WATER_FIELDS: &[&str] = &["Water", "Eau", "Eau (%)"];
const VISCERAL_FIELDS: &[&str] = &["VisceralFat", "Graisse Viscérale"];
const THIGH_LEFT_FIELDS: &[&str] = &["Tour de Cuisses G", "Tour de Cuisse G"];
const THIGH_RIGHT_FIELDS: &[&str] = &["Tour de Cuisses D", "Tour de Cuisse D"];
const HIP_FIELDS: &[&str] = &["Tour de Hanches", "Tour de Hanche"];
const WAIST_FIELDS: &[&str] = &["Tour de Taille"];
const CHEST_FIELDS: &[&str] = &["Tour de Poitrine"];
const ARM_LEFT_FIELDS: &[&str] = &["Tour de Bras G"];
const ARM_RIGHT_FIELDS: &[&str] = &["Tour de Bras D"];
const WEIGHT_LOST_FIELDS: &[&str] = &["Poids Perdu"];
const WEIGHT_REMAINING_FIELDS: &[&str] = &["Perte Restant", "Perte Restante"];
const INITIAL_WEIGHT_FIELDS: &[&str] = &["Poids Initial", "Poids initial (from Élève)"];
const TARGET_WEIGHT_FIELDS: &[&str] = &["Poids Cible", "Poids Cible (from Élève)"];

/// A dated snapshot of body metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub weight: Option<f64>,
    pub height: Option<f64>,
    pub body_fat: Option<f64>,
    pub muscle_percentage: Option<f64>,
    pub water: Option<f64>,
    pub visceral_fat: Option<f64>,
    pub thigh_left: Option<f64>,
    pub thigh_right: Option<f64>,
    pub hip: Option<f64>,
    pub waist: Option<f64>,
    pub chest: Option<f64>,
    pub arm_left: Option<f64>,
    pub arm_right: Option<f64>,
    /// Computed by the backend
    pub weight_lost: Option<f64>,
    /// Computed by the backend
    pub weight_remaining: Option<f64>,
    /// Student's starting weight, looked up from the student record
    pub initial_weight: Option<f64>,
    /// Student's target weight, looked up from the student record
    pub target_weight: Option<f64>,
}

impl Measurement {
    pub fn from_record(record: &Record) -> Self {
        Self {
            id: record.id.clone(),
            date: record.date(DATE_FIELDS),
            weight: record.number(WEIGHT_FIELDS),
            height: record.number(HEIGHT_FIELDS),
            body_fat: record.number(BODY_FAT_FIELDS),
            muscle_percentage: record.number(MUSCLE_FIELDS),
            water: record.number(WATER_FIELDS),
            visceral_fat: record.number(VISCERAL_FIELDS),
            thigh_left: record.number(THIGH_LEFT_FIELDS),
            thigh_right: record.number(THIGH_RIGHT_FIELDS),
            hip: record.number(HIP_FIELDS),
            waist: record.number(WAIST_FIELDS),
            chest: record.number(CHEST_FIELDS),
            arm_left: record.number(ARM_LEFT_FIELDS),
            arm_right: record.number(ARM_RIGHT_FIELDS),
            weight_lost: record.number(WEIGHT_LOST_FIELDS),
            weight_remaining: record.number(WEIGHT_REMAINING_FIELDS),
            initial_weight: record.number(INITIAL_WEIGHT_FIELDS),
            target_weight: record.number(TARGET_WEIGHT_FIELDS),
        }
    }
}

/// Most recent first, undated measurements last (stable among themselves)
pub fn sort_latest_first(measurements: &mut [Measurement]) {
    measurements.sort_by(|a, b| latest_first(a.date, b.date));
}

fn latest_first(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Latest and previous measurement of an unsorted list
pub fn latest_pair(measurements: &[Measurement]) -> (Option<&Measurement>, Option<&Measurement>) {
    let mut sorted: Vec<&Measurement> = measurements.iter().collect();
    sorted.sort_by(|a, b| latest_first(a.date, b.date));
    (sorted.first().copied(), sorted.get(1).copied())
}

/// `latest - previous` when both readings exist
pub fn difference(latest: Option<f64>, previous: Option<f64>) -> Option<f64> {
    Some(latest? - previous?)
}

/// Share of the planned weight loss already achieved, clamped to 0..=100
pub fn weight_progress_percent(initial: f64, current: f64, target: f64) -> Option<f64> {
    let planned = initial - target;
    if planned == 0.0 || !planned.is_finite() {
        return None;
    }
    let percent = (initial - current) / planned * 100.0;
    percent.is_finite().then(|| percent.clamp(0.0, 100.0))
}
