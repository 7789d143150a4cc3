//! Backend schema: table and field names
//!
//! Table and column names of the record store are not fixed. They are read
//! from an optional TOML file (`SCHEMA_FILE`, default `schema.toml`) layered
//! with `SCHEMA__<SECTION>__<KEY>` environment variables, lists being comma
//! separated, e.g. `SCHEMA__IDENTITY__TABLES=Eleves,Students`.

use config::{Config, ConfigError, Environment, File, Source};
use serde::Deserialize;
use tracing::info;

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

/// Where student identities live
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct IdentitySchema {
    /// Table candidates, tried in order
    pub tables: Vec<String>,
    /// Field spellings holding the access code
    pub access_fields: Vec<String>,
    /// Field spellings holding the display name
    pub name_fields: Vec<String>,
}

impl Default for IdentitySchema {
    fn default() -> Self {
        Self {
            tables: strings(&["Eleves", "Élèves", "Students"]),
            access_fields: strings(&["code", "Code", "AccessCode", "Code d'accès", "access_code"]),
            name_fields: strings(crate::models::identity::NAME_FIELDS),
        }
    }
}

/// Where one data category lives and how its rows point at a student
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategorySchema {
    pub tables: Vec<String>,
    /// Fields linking a row to its student (record ids or name)
    #[serde(default = "default_link_fields")]
    pub link_fields: Vec<String>,
}

impl CategorySchema {
    fn new(tables: &[&str]) -> Self {
        Self {
            tables: strings(tables),
            link_fields: default_link_fields(),
        }
    }
}

fn default_link_fields() -> Vec<String> {
    strings(&["Élève", "IDU Élève", "StudentId"])
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Schema {
    pub identity: IdentitySchema,
    pub goals: CategorySchema,
    pub measurements: CategorySchema,
    pub calculations: CategorySchema,
    pub workouts: CategorySchema,
    pub meal_plans: CategorySchema,
}

impl Default for Schema {
    fn default() -> Self {
        Self {
            identity: IdentitySchema::default(),
            goals: CategorySchema::new(&["Goals", "Objectifs"]),
            measurements: CategorySchema::new(&["Mesures", "Measurements"]),
            calculations: CategorySchema::new(&["BCJ", "Calculations"]),
            workouts: CategorySchema::new(&["Workout", "Workouts"]),
            meal_plans: CategorySchema::new(&["MealPlans", "Plans Alimentaires"]),
        }
    }
}

const LIST_KEYS: [&str; 13] = [
    "identity.tables",
    "identity.access_fields",
    "identity.name_fields",
    "goals.tables",
    "goals.link_fields",
    "measurements.tables",
    "measurements.link_fields",
    "calculations.tables",
    "calculations.link_fields",
    "workouts.tables",
    "workouts.link_fields",
    "meal_plans.tables",
    "meal_plans.link_fields",
];

impl Schema {
    /// Load the schema from `SCHEMA_FILE` and `SCHEMA__*` overrides
    pub fn from_env() -> Result<Self, ConfigError> {
        let path = std::env::var("SCHEMA_FILE").unwrap_or_else(|_| "schema.toml".to_string());
        let schema = Self::load(File::with_name(&path).required(false))?;
        info!(file = %path, identity_tables = ?schema.identity.tables, "Backend schema loaded");
        Ok(schema)
    }

    /// Layer `file` under the environment overrides
    pub fn load<S>(file: S) -> Result<Self, ConfigError>
    where
        S: Source + Send + Sync + 'static,
    {
        let environment = LIST_KEYS.iter().fold(
            Environment::with_prefix("SCHEMA")
                .separator("__")
                .list_separator(",")
                .try_parsing(true),
            |env, key| env.with_list_parse_key(key),
        );

        Config::builder()
            .add_source(file)
            .add_source(environment)
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            std::env::remove_var("SCHEMA__IDENTITY__TABLES");
            std::env::remove_var("SCHEMA__MEASUREMENTS__TABLES");
        }
    }

    #[test]
    #[serial]
    fn test_missing_file_yields_defaults() {
        clear_env();
        let schema = Schema::load(File::with_name("does-not-exist.toml").required(false)).unwrap();
        assert_eq!(schema, Schema::default());
        assert_eq!(schema.identity.tables[0], "Eleves");
        assert_eq!(schema.calculations.tables[0], "BCJ");
        assert_eq!(schema.workouts.link_fields[0], "Élève");
    }

    #[test]
    #[serial]
    fn test_partial_file_keeps_other_defaults() {
        clear_env();
        let toml = r#"
            [identity]
            tables = ["Clients"]

            [goals]
            tables = ["Objectifs"]
        "#;
        let schema = Schema::load(File::from_str(toml, FileFormat::Toml)).unwrap();
        assert_eq!(schema.identity.tables, vec!["Clients".to_string()]);
        assert_eq!(schema.identity.access_fields, IdentitySchema::default().access_fields);
        assert_eq!(schema.goals.tables, vec!["Objectifs".to_string()]);
        assert_eq!(schema.goals.link_fields, default_link_fields());
        assert_eq!(schema.measurements, Schema::default().measurements);
    }

    #[test]
    #[serial]
    fn test_env_overrides_lists() {
        clear_env();
        unsafe {
            std::env::set_var("SCHEMA__IDENTITY__TABLES", "Membres,Eleves");
        }

        let schema = Schema::load(File::with_name("does-not-exist.toml").required(false)).unwrap();
        assert_eq!(
            schema.identity.tables,
            vec!["Membres".to_string(), "Eleves".to_string()]
        );

        clear_env();
    }
}
