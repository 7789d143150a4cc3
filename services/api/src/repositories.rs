//! Per-category student data on the record store
//!
//! Category rows point at their student through a link field whose exact
//! name and rendering (record ids or display names) vary between bases. Each
//! table candidate is first queried with a broad filter per link field, and
//! the rows are then checked locally. When no filtered query turns up a row of
//! the student, every table candidate is scanned and checked the same way.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use common::backend::BackendConfig;
use common::error::RecordResult;
use common::formula;
use common::gateway::{Record, RecordGateway, RecordQuery};
use common::models::{
    Calculation, Goal, Identity, MealPlan, Measurement, Workout, calculation, measurement,
    workout,
};
use common::schema::{CategorySchema, Schema};

use crate::fixtures;

/// Student data categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Goals,
    Measurements,
    Calculations,
    Workouts,
    MealPlans,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Category::Goals => "goals",
            Category::Measurements => "measurements",
            Category::Calculations => "calculations",
            Category::Workouts => "workouts",
            Category::MealPlans => "meal plans",
        }
    }

    fn schema<'a>(&self, schema: &'a Schema) -> &'a CategorySchema {
        match self {
            Category::Goals => &schema.goals,
            Category::Measurements => &schema.measurements,
            Category::Calculations => &schema.calculations,
            Category::Workouts => &schema.workouts,
            Category::MealPlans => &schema.meal_plans,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Student data repository
#[derive(Clone)]
pub struct StudentDataRepository {
    gateway: Arc<dyn RecordGateway>,
    schema: Schema,
}

impl StudentDataRepository {
    /// Create a new student data repository
    pub fn new(gateway: Arc<dyn RecordGateway>, schema: Schema) -> Self {
        Self { gateway, schema }
    }

    pub async fn goals(&self, config: &BackendConfig, student: &Identity) -> RecordResult<Vec<Goal>> {
        let records = self.records(config, student, Category::Goals).await?;
        Ok(records.iter().map(Goal::from_record).collect())
    }

    /// Measurements, latest first
    pub async fn measurements(
        &self,
        config: &BackendConfig,
        student: &Identity,
    ) -> RecordResult<Vec<Measurement>> {
        let records = self.records(config, student, Category::Measurements).await?;
        let mut measurements: Vec<Measurement> =
            records.iter().map(Measurement::from_record).collect();
        measurement::sort_latest_first(&mut measurements);
        Ok(measurements)
    }

    /// Calculations, latest first
    pub async fn calculations(
        &self,
        config: &BackendConfig,
        student: &Identity,
    ) -> RecordResult<Vec<Calculation>> {
        let records = self.records(config, student, Category::Calculations).await?;
        let mut calculations: Vec<Calculation> =
            records.iter().map(Calculation::from_record).collect();
        calculation::sort_latest_first(&mut calculations);
        Ok(calculations)
    }

    /// Workouts grouped by week, day and block, latest week first
    pub async fn workouts(
        &self,
        config: &BackendConfig,
        student: &Identity,
    ) -> RecordResult<Vec<Workout>> {
        let records = self.records(config, student, Category::Workouts).await?;
        Ok(workout::group_workouts(&records))
    }

    /// Meal plans, latest first
    pub async fn meal_plans(
        &self,
        config: &BackendConfig,
        student: &Identity,
    ) -> RecordResult<Vec<MealPlan>> {
        let records = self.records(config, student, Category::MealPlans).await?;
        let mut plans: Vec<MealPlan> = records.iter().map(MealPlan::from_record).collect();
        plans.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(plans)
    }

    /// Raw rows of `category` belonging to `student`
    pub async fn records(
        &self,
        config: &BackendConfig,
        student: &Identity,
        category: Category,
    ) -> RecordResult<Vec<Record>> {
        if !config.is_configured() {
            if student.id == fixtures::DEMO_STUDENT_ID {
                debug!("Serving demo {} for {}", category, student.id);
                return Ok(fixtures::records(category));
            }
            return Ok(Vec::new());
        }

        let schema = category.schema(&self.schema);
        let links: Vec<&str> = schema.link_fields.iter().map(String::as_str).collect();

        let answered = match self.filtered(config, student, category, schema, &links).await? {
            Lookup::Found(records) => return Ok(records),
            Lookup::Empty => true,
            Lookup::Unanswered => false,
        };

        info!("No filtered {} query found rows of {}, scanning tables", category, student.id);
        match self.scan(config, student, category, schema, &links).await {
            Err(e) if answered && !e.is_configuration() => {
                warn!("Scan for {} failed after empty filtered queries: {}", category, e);
                Ok(Vec::new())
            }
            result => result,
        }
    }

    async fn filtered(
        &self,
        config: &BackendConfig,
        student: &Identity,
        category: Category,
        schema: &CategorySchema,
        links: &[&str],
    ) -> RecordResult<Lookup> {
        let mut answered = false;

        for table in &schema.tables {
            for link in links {
                let query = RecordQuery::filtered(link_formula(link, student));
                match self.gateway.fetch(config, table, &query).await {
                    Ok(records) => {
                        answered = true;
                        let owned = belonging(records, student, links);
                        if !owned.is_empty() {
                            debug!(
                                "Found {} {} rows in {} through {}",
                                owned.len(),
                                category,
                                table,
                                link
                            );
                            return Ok(Lookup::Found(owned));
                        }
                    }
                    Err(e) if e.is_configuration() => return Err(e),
                    Err(e) => {
                        warn!("Filtered {} query on {}.{} failed: {}", category, table, link, e);
                    }
                }
            }
        }

        Ok(if answered {
            Lookup::Empty
        } else {
            Lookup::Unanswered
        })
    }

    async fn scan(
        &self,
        config: &BackendConfig,
        student: &Identity,
        category: Category,
        schema: &CategorySchema,
        links: &[&str],
    ) -> RecordResult<Vec<Record>> {
        let mut last_error = None;
        let mut answered = false;
        let mut owned = Vec::new();

        for table in &schema.tables {
            match self.gateway.fetch(config, table, &RecordQuery::scan()).await {
                Ok(records) => {
                    answered = true;
                    owned.extend(belonging(records, student, links));
                }
                Err(e) if e.is_configuration() => return Err(e),
                Err(e) => {
                    warn!("Scan of {} for {} failed: {}", table, category, e);
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if !answered => Err(e),
            _ => Ok(owned),
        }
    }
}

/// Outcome of the filtered queries of a category
enum Lookup {
    Found(Vec<Record>),
    /// Some query was answered, none returned a row of the student
    Empty,
    Unanswered,
}

/// Broad filter: the link field mentions the student id or name
fn link_formula(link: &str, student: &Identity) -> String {
    let mut formulas = vec![formula::field_contains(link, &student.id)];
    if !student.name.trim().is_empty() {
        formulas.push(formula::field_contains(link, &student.name));
    }
    formula::any_of(&formulas)
}

/// Rows whose link fields hold the student id or name, without duplicates
fn belonging(records: Vec<Record>, student: &Identity, links: &[&str]) -> Vec<Record> {
    let mut seen = HashSet::new();
    records
        .into_iter()
        .filter(|record| {
            record.links_contain(links, &student.id) || record.links_contain(links, &student.name)
        })
        .filter(|record| seen.insert(record.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::error::RecordError;
    use common::testing::{ScriptedGateway, configured, record};
    use serde_json::json;

    fn student() -> Identity {
        Identity::new("recStudent", "Féline Faure", "F3L1N3")
    }

    fn repository(gateway: Arc<ScriptedGateway>) -> StudentDataRepository {
        StudentDataRepository::new(gateway, Schema::default())
    }

    #[tokio::test]
    async fn test_unconfigured_serves_demo_fixtures_only() {
        let gateway = Arc::new(ScriptedGateway::new());
        let repo = repository(gateway.clone());
        let config = BackendConfig::default();

        let demo = Identity::new(fixtures::DEMO_STUDENT_ID, "Utilisateur Démo", "access123");
        let goals = repo.goals(&config, &demo).await.unwrap();
        assert_eq!(goals.len(), 2);

        let goals = repo.goals(&config, &student()).await.unwrap();
        assert!(goals.is_empty());
        assert_eq!(gateway.call_count(), 0);
    }

    #[tokio::test]
    async fn test_filtered_rows_are_checked_locally() {
        let gateway = Arc::new(ScriptedGateway::new().on_any_filter(
            "Goals",
            Ok(vec![
                record("recG1", json!({"Description": "Perdre 5kg", "Élève": ["recStudent"]})),
                record("recG2", json!({"Description": "Autre", "Élève": ["recOther"]})),
                record("recG3", json!({"Description": "Courir", "Élève": "Féline Faure"})),
            ]),
        ));
        let repo = repository(gateway.clone());

        let goals = repo.goals(&configured(), &student()).await.unwrap();
        let ids: Vec<&str> = goals.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["recG1", "recG3"]);

        let calls = gateway.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].table, "Goals");
        assert_eq!(
            calls[0].filter.as_deref(),
            Some("OR(FIND('recStudent', {Élève} & '') > 0, FIND('Féline Faure', {Élève} & '') > 0)")
        );
    }

    #[tokio::test]
    async fn test_scan_when_no_filtered_query_answers() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .on_any_filter("BCJ", Err(RecordError::NotFound("formula".into())))
                .on_scan(
                    "BCJ",
                    Ok(vec![
                        record("recC1", json!({"Date": "2024-01-01", "BMR": 1500, "Élève": ["recStudent"]})),
                        record("recC2", json!({"Date": "2024-02-01", "BMR": 1600, "Élève": ["recStudent"]})),
                        record("recC3", json!({"Date": "2024-03-01", "BMR": 1700, "Élève": ["recOther"]})),
                    ]),
                ),
        );
        let repo = repository(gateway.clone());

        let calculations = repo.calculations(&configured(), &student()).await.unwrap();
        let ids: Vec<&str> = calculations.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["recC2", "recC1"]);

        // three link fields on two tables, then one scan per table
        assert_eq!(gateway.call_count(), 8);
        assert!(gateway.calls()[6..].iter().all(|call| call.filter.is_none()));
    }

    #[tokio::test]
    async fn test_answered_filter_without_match_still_scans() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .on_any_filter("Mesures", Ok(vec![]))
                .on_scan("Mesures", Ok(vec![record("recM1", json!({"Élève": ["recStudent"]}))])),
        );
        let repo = repository(gateway.clone());

        let measurements = repo.measurements(&configured(), &student()).await.unwrap();
        let ids: Vec<&str> = measurements.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["recM1"]);
        assert!(gateway.calls().iter().any(|call| call.filter.is_none()));
    }

    #[tokio::test]
    async fn test_link_formula_miss_found_by_scan() {
        // filtered queries come back empty although the table holds a row
        let gateway = Arc::new(
            ScriptedGateway::new()
                .on_any_filter("BCJ", Ok(vec![]))
                .on_any_filter("Calculations", Ok(vec![]))
                .on_scan("BCJ", Ok(vec![record("recC1", json!({"IDU Élève": "recStudent", "BMR": 1500}))]))
                .on_scan("Calculations", Ok(vec![])),
        );
        let repo = repository(gateway.clone());

        let calculations = repo.calculations(&configured(), &student()).await.unwrap();
        assert_eq!(calculations.len(), 1);
        assert_eq!(calculations[0].id, "recC1");
    }

    #[tokio::test]
    async fn test_failed_scan_after_empty_filters_is_empty() {
        let gateway = Arc::new(
            ScriptedGateway::new()
                .on_any_filter("Goals", Ok(vec![]))
                .on_scan("Goals", Err(RecordError::Transient("503".into()))),
        );
        let repo = repository(gateway);

        let goals = repo.goals(&configured(), &student()).await.unwrap();
        assert!(goals.is_empty());
    }

    #[tokio::test]
    async fn test_failure_surfaces_when_nothing_answers() {
        let gateway = Arc::new(ScriptedGateway::new());
        let repo = repository(gateway);

        let result = repo.workouts(&configured(), &student()).await;
        assert!(matches!(result, Err(RecordError::NotFound(_))));
    }

    #[test]
    fn test_link_formula_without_name() {
        let nameless = Identity::new("recStudent", "  ", "F3L1N3");
        assert_eq!(
            link_formula("StudentId", &nameless),
            "FIND('recStudent', {StudentId} & '') > 0"
        );
    }
}
