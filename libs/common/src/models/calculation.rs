//! Nutrition calculation model (BMR, daily caloric need, macro split)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::gateway::Record;

/// kcal per gram of protein and of carbohydrate
pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;
/// kcal per gram of fat
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;

const DATE_FIELDS: &[&str] = &["Date", "Semaine"];
const BMR_FIELDS: &[&str] = &["BMR", "BMR (kcal)"];
const BCJ_FIELDS: &[&str] = &["BCJ", "BCJ (kcal)"];
const OBJECTIVE_FIELDS: &[&str] = &["BCJ / Obj (kcal)", "Objectif (kcal)"];
const PROTEIN_FIELDS: &[&str] = &["Protein", "Protéines (g)"];
const CARBS_FIELDS: &[&str] = &["Carbs", "Glucides (g)"];
const FAT_FIELDS: &[&str] = &["Fat", "Lipides (g)"];
const PROTEIN_KCAL_FIELDS: &[&str] = &["Protéines (kcal)", "ProteinKcal"];
const CARBS_KCAL_FIELDS: &[&str] = &["Glucides (kcal)", "CarbsKcal"];
const FAT_KCAL_FIELDS: &[&str] = &["Lipides (kcal)", "FatKcal"];
const PROTEIN_PERCENT_FIELDS: &[&str] = &["Protéines (%)", "ProteinPercentage"];
const CARBS_PERCENT_FIELDS: &[&str] = &["Glucides (%)", "CarbsPercentage"];
const FAT_PERCENT_FIELDS: &[&str] = &["Lipides (%)", "FatPercentage"];
const TOTAL_GRAMS_FIELDS: &[&str] = &["Total (g)", "TotalGrams"];
const TOTAL_KCAL_FIELDS: &[&str] = &["Total (kcal)", "TotalKcal"];

/// A dated nutrition computation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calculation {
    pub id: String,
    pub date: Option<NaiveDate>,
    pub bmr: f64,
    /// Daily caloric need
    pub bcj: f64,
    /// Caloric objective
    pub objective_kcal: Option<f64>,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
    pub protein_kcal: f64,
    pub carbs_kcal: f64,
    pub fat_kcal: f64,
    pub protein_percent: f64,
    pub carbs_percent: f64,
    pub fat_percent: f64,
    pub total_g: f64,
    pub total_kcal: f64,
}

impl Calculation {
    pub fn from_record(record: &Record) -> Self {
        let protein_g = record.number(PROTEIN_FIELDS).unwrap_or(0.0);
        let carbs_g = record.number(CARBS_FIELDS).unwrap_or(0.0);
        let fat_g = record.number(FAT_FIELDS).unwrap_or(0.0);

        let protein_kcal = record
            .number(PROTEIN_KCAL_FIELDS)
            .unwrap_or(protein_g * KCAL_PER_GRAM_PROTEIN);
        let carbs_kcal = record
            .number(CARBS_KCAL_FIELDS)
            .unwrap_or(carbs_g * KCAL_PER_GRAM_CARBS);
        let fat_kcal = record
            .number(FAT_KCAL_FIELDS)
            .unwrap_or(fat_g * KCAL_PER_GRAM_FAT);

        let total_kcal = record
            .number(TOTAL_KCAL_FIELDS)
            .unwrap_or_else(|| macro_kcal(protein_g, carbs_g, fat_g));
        let total_g = record
            .number(TOTAL_GRAMS_FIELDS)
            .unwrap_or(protein_g + carbs_g + fat_g);

        Self {
            id: record.id.clone(),
            date: record.date(DATE_FIELDS),
            bmr: record.number(BMR_FIELDS).unwrap_or(0.0),
            bcj: record.number(BCJ_FIELDS).unwrap_or(0.0),
            objective_kcal: record.number(OBJECTIVE_FIELDS),
            protein_g,
            carbs_g,
            fat_g,
            protein_kcal,
            carbs_kcal,
            fat_kcal,
            protein_percent: record
                .number(PROTEIN_PERCENT_FIELDS)
                .unwrap_or_else(|| share(protein_kcal, total_kcal)),
            carbs_percent: record
                .number(CARBS_PERCENT_FIELDS)
                .unwrap_or_else(|| share(carbs_kcal, total_kcal)),
            fat_percent: record
                .number(FAT_PERCENT_FIELDS)
                .unwrap_or_else(|| share(fat_kcal, total_kcal)),
            total_g,
            total_kcal,
        }
    }
}

/// Energy of a macro split
pub fn macro_kcal(protein_g: f64, carbs_g: f64, fat_g: f64) -> f64 {
    protein_g * KCAL_PER_GRAM_PROTEIN + carbs_g * KCAL_PER_GRAM_CARBS + fat_g * KCAL_PER_GRAM_FAT
}

fn share(part: f64, total: f64) -> f64 {
    if total > 0.0 { part / total * 100.0 } else { 0.0 }
}

/// Most recent first, undated last
pub fn sort_latest_first(calculations: &mut [Calculation]) {
    calculations.sort_by(|a, b| match (a.date, b.date) {
        (Some(a), Some(b)) => b.cmp(&a),
        (a, b) => b.is_some().cmp(&a.is_some()),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_total_kcal_derived_from_grams() {
        let record = Record::new(
            "recCalc",
            json!({"Protéines (g)": 160, "Glucides (g)": 240, "Lipides (g)": 80}),
        );
        let calculation = Calculation::from_record(&record);
        assert_eq!(calculation.total_kcal, 160.0 * 4.0 + 240.0 * 4.0 + 80.0 * 9.0);
        assert_eq!(calculation.total_g, 480.0);
        assert_eq!(calculation.protein_kcal, 640.0);
        assert_eq!(calculation.fat_kcal, 720.0);
        assert!((calculation.protein_percent - 640.0 / 2320.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_supplied_total_is_kept() {
        let record = Record::new(
            "recCalc",
            json!({"Protein": 150, "Carbs": 200, "Fat": 70, "Total (kcal)": 2000, "BMR (kcal)": 1650}),
        );
        let calculation = Calculation::from_record(&record);
        assert_eq!(calculation.total_kcal, 2000.0);
        assert_eq!(calculation.bmr, 1650.0);
        assert_eq!(calculation.bcj, 0.0);
    }

    #[test]
    fn test_empty_record_defaults_to_zero() {
        let calculation = Calculation::from_record(&Record::new("recCalc", json!({})));
        assert_eq!(calculation.total_kcal, 0.0);
        assert_eq!(calculation.protein_percent, 0.0);
        assert_eq!(calculation.objective_kcal, None);
        assert_eq!(calculation.date, None);
    }

    #[test]
    fn test_week_used_as_date() {
        let record = Record::new("recCalc", json!({"Semaine": "2024-04-08"}));
        assert_eq!(
            Calculation::from_record(&record).date,
            NaiveDate::from_ymd_opt(2024, 4, 8)
        );
    }

    #[test]
    fn test_sort_latest_first() {
        let mut list: Vec<Calculation> = [None, Some("2024-01-01"), Some("2024-02-01")]
            .iter()
            .enumerate()
            .map(|(i, date)| {
                let fields = match date {
                    Some(d) => json!({"Date": d}),
                    None => json!({}),
                };
                Calculation::from_record(&Record::new(format!("rec{}", i), fields))
            })
            .collect();
        sort_latest_first(&mut list);
        let ids: Vec<&str> = list.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["rec2", "rec1", "rec0"]);
    }
}
