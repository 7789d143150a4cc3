//! API models for response payloads

use serde::Serialize;

use common::models::{
    Calculation, Goal, Identity, Macros, Meal, MealDay, MealPlan, Measurement, Workout,
    measurement,
};

/// One data category of the dashboard
///
/// A category that could not be loaded is reported as unavailable with a
/// notice, it never fails the whole response.
#[derive(Debug, Serialize)]
pub struct Section<T> {
    pub available: bool,
    pub items: Vec<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<String>,
}

impl<T> Section<T> {
    pub fn loaded(items: Vec<T>) -> Self {
        Self {
            available: true,
            items,
            notice: None,
        }
    }

    pub fn unavailable(category: &str) -> Self {
        Self {
            available: false,
            items: Vec::new(),
            notice: Some(format!("No {} data available", category)),
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Section<U> {
        Section {
            available: self.available,
            items: self.items.into_iter().map(f).collect(),
            notice: self.notice,
        }
    }
}

/// Latest readings and their evolution
#[derive(Debug, Default, Serialize)]
pub struct MeasurementSummary {
    pub latest: Option<Measurement>,
    pub previous: Option<Measurement>,
    pub weight_change: Option<f64>,
    pub body_fat_change: Option<f64>,
    pub muscle_change: Option<f64>,
    /// Share of the planned weight loss achieved, 0 to 100
    pub weight_progress_percent: Option<f64>,
}

impl MeasurementSummary {
    /// Summarize `measurements`, falling back on the student profile for
    /// initial and target weights
    pub fn new(measurements: &[Measurement], student: &Identity) -> Self {
        let (latest, previous) = measurement::latest_pair(measurements);
        let Some(latest) = latest else {
            return Self::default();
        };

        let initial = latest.initial_weight.or(student.initial_weight);
        let target = latest.target_weight.or(student.target_weight);
        let progress = match (initial, latest.weight, target) {
            (Some(initial), Some(current), Some(target)) => {
                measurement::weight_progress_percent(initial, current, target)
            }
            _ => None,
        };

        Self {
            weight_change: measurement::difference(latest.weight, previous.and_then(|p| p.weight)),
            body_fat_change: measurement::difference(
                latest.body_fat,
                previous.and_then(|p| p.body_fat),
            ),
            muscle_change: measurement::difference(
                latest.muscle_percentage,
                previous.and_then(|p| p.muscle_percentage),
            ),
            weight_progress_percent: progress,
            latest: Some(latest.clone()),
            previous: previous.cloned(),
        }
    }
}

/// Measurements section with its summary
#[derive(Debug, Serialize)]
pub struct MeasurementsResponse {
    #[serde(flatten)]
    pub section: Section<Measurement>,
    pub summary: MeasurementSummary,
}

/// Meals of one day with their totals
#[derive(Debug, Serialize)]
pub struct MealDayView {
    pub day: String,
    pub meals: Vec<Meal>,
    pub totals: Macros,
}

impl From<MealDay<'_>> for MealDayView {
    fn from(day: MealDay<'_>) -> Self {
        Self {
            day: day.day,
            meals: day.meals.into_iter().cloned().collect(),
            totals: day.totals,
        }
    }
}

/// Meal plan grouped by day
#[derive(Debug, Serialize)]
pub struct MealPlanView {
    #[serde(flatten)]
    pub plan: MealPlan,
    pub days: Vec<MealDayView>,
    pub weekly_totals: Macros,
}

impl From<MealPlan> for MealPlanView {
    fn from(plan: MealPlan) -> Self {
        let days = plan.days().into_iter().map(MealDayView::from).collect();
        let weekly_totals = plan.weekly_totals();
        Self {
            plan,
            days,
            weekly_totals,
        }
    }
}

/// Everything the dashboard shows for a student
#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    pub student: Identity,
    pub goals: Section<Goal>,
    pub measurements: MeasurementsResponse,
    pub calculations: Section<Calculation>,
    pub workouts: Section<Workout>,
    pub meal_plans: Section<MealPlanView>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::gateway::Record;
    use serde_json::json;

    fn reading(id: &str, date: &str, weight: f64, body_fat: Option<f64>) -> Measurement {
        let mut fields = json!({"Date de Mesure": date, "Poids": weight});
        if let Some(body_fat) = body_fat {
            fields["Masse Grasse (%)"] = json!(body_fat);
        }
        Measurement::from_record(&Record::new(id, fields))
    }

    #[test]
    fn test_summary_uses_profile_weights() {
        let mut student = Identity::new("recA", "Féline Faure", "F3L1N3");
        student.initial_weight = Some(90.0);
        student.target_weight = Some(80.0);

        let measurements = vec![
            reading("m1", "2024-01-01", 88.0, Some(25.0)),
            reading("m2", "2024-02-01", 85.0, None),
        ];

        let summary = MeasurementSummary::new(&measurements, &student);
        assert_eq!(summary.latest.as_ref().map(|m| m.id.as_str()), Some("m2"));
        assert_eq!(summary.previous.as_ref().map(|m| m.id.as_str()), Some("m1"));
        assert_eq!(summary.weight_change, Some(-3.0));
        assert_eq!(summary.body_fat_change, None);
        assert_eq!(summary.weight_progress_percent, Some(50.0));
    }

    #[test]
    fn test_summary_of_nothing() {
        let student = Identity::new("recA", "Féline Faure", "F3L1N3");
        let summary = MeasurementSummary::new(&[], &student);
        assert!(summary.latest.is_none());
        assert!(summary.weight_progress_percent.is_none());
    }

    #[test]
    fn test_unavailable_section() {
        let section: Section<Goal> = Section::unavailable("goals");
        assert!(!section.available);
        assert_eq!(section.notice.as_deref(), Some("No goals data available"));

        let value = serde_json::to_value(Section::loaded(vec![1, 2])).unwrap();
        assert_eq!(value, json!({"available": true, "items": [1, 2]}));
    }
}
