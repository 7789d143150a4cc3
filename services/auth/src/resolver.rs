//! Access code resolution
//!
//! An access code is turned into a student identity by trying, in order:
//!
//! 1. the fixed demo directory (no backend call);
//! 2. a filtered lookup per identity table and access field spelling;
//! 3. for codes shaped like a record id, the record itself and then the
//!    profile sharing its display name;
//! 4. an unfiltered scan of each identity table, matched locally.
//!
//! Backend failures inside a strategy are recorded in the attempt log and
//! resolution moves on; the caller only ever sees `Resolved` or `Exhausted`.

use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use common::backend::BackendConfig;
use common::error::RecordError;
use common::formula;
use common::gateway::{Record, RecordGateway, RecordQuery};
use common::models::Identity;
use common::schema::IdentitySchema;

use crate::demo::DemoDirectory;
use crate::validation::looks_like_record_id;

/// Resolution strategies, in the order they are tried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Demo,
    FilteredLookup,
    NameIndirection,
    TableScan,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Strategy::Demo => "demo",
            Strategy::FilteredLookup => "filtered lookup",
            Strategy::NameIndirection => "name indirection",
            Strategy::TableScan => "table scan",
        };
        f.write_str(name)
    }
}

/// Result of one strategy
#[derive(Debug, Clone, PartialEq)]
pub enum StrategyOutcome {
    Matched(Identity),
    /// Every query ran, none matched
    NoMatch,
    /// The strategy does not apply to this code or configuration
    Skipped(String),
    /// No query of the strategy could be answered
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyAttempt {
    pub strategy: Strategy,
    pub outcome: StrategyOutcome,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Resolved {
        identity: Identity,
        strategy: Strategy,
    },
    Exhausted {
        attempts: Vec<StrategyAttempt>,
    },
}

impl Resolution {
    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Resolution::Resolved { identity, .. } => Some(identity),
            Resolution::Exhausted { .. } => None,
        }
    }

    /// True when the backend never answered
    ///
    /// At least one backend strategy failed and none of them got an answer
    /// without a match. Such an outcome says nothing about the access code.
    pub fn is_inconclusive(&self) -> bool {
        let Resolution::Exhausted { attempts } = self else {
            return false;
        };
        let backend = || attempts.iter().filter(|a| a.strategy != Strategy::Demo);

        backend().any(|a| matches!(a.outcome, StrategyOutcome::Failed(_)))
            && !backend().any(|a| a.outcome == StrategyOutcome::NoMatch)
    }
}

/// Collects gateway failures of a strategy that queries several times
#[derive(Default)]
struct Failures {
    answered: usize,
    errors: Vec<String>,
}

impl Failures {
    fn answered(&mut self) {
        self.answered += 1;
    }

    fn record(&mut self, table: &str, error: &RecordError) {
        self.errors.push(format!("{}: {}", table, error));
    }

    fn into_outcome(self) -> StrategyOutcome {
        if self.answered == 0 && !self.errors.is_empty() {
            StrategyOutcome::Failed(self.errors.join("; "))
        } else {
            StrategyOutcome::NoMatch
        }
    }
}

/// Resolves access codes against the demo directory and the record store
#[derive(Clone)]
pub struct AccessResolver {
    gateway: Arc<dyn RecordGateway>,
    schema: IdentitySchema,
    demo: DemoDirectory,
}

impl AccessResolver {
    pub fn new(
        gateway: Arc<dyn RecordGateway>,
        schema: IdentitySchema,
        demo: DemoDirectory,
    ) -> Self {
        Self {
            gateway,
            schema,
            demo,
        }
    }

    /// Resolve `token` with the backend described by `config`
    pub async fn resolve(&self, config: &BackendConfig, token: &str) -> Resolution {
        let token = token.trim();
        let mut attempts = Vec::new();

        let outcome = match self.demo.lookup(token) {
            Some(identity) => StrategyOutcome::Matched(identity),
            None => StrategyOutcome::NoMatch,
        };
        if let Some(resolution) = Self::settle(Strategy::Demo, outcome, &mut attempts) {
            return resolution;
        }

        let backend_strategies = [
            Strategy::FilteredLookup,
            Strategy::NameIndirection,
            Strategy::TableScan,
        ];

        if token.is_empty() || !config.is_configured() {
            let reason = if token.is_empty() {
                "empty access code"
            } else {
                "record store not configured"
            };
            for strategy in backend_strategies {
                attempts.push(StrategyAttempt {
                    strategy,
                    outcome: StrategyOutcome::Skipped(reason.to_string()),
                });
            }
            info!(reason, "Access code not resolved");
            return Resolution::Exhausted { attempts };
        }

        for strategy in backend_strategies {
            let outcome = match strategy {
                Strategy::FilteredLookup => self.filtered_lookup(config, token).await,
                Strategy::NameIndirection => self.name_indirection(config, token).await,
                Strategy::TableScan => self.table_scan(config, token).await,
                Strategy::Demo => continue,
            };
            if let Some(resolution) = Self::settle(strategy, outcome, &mut attempts) {
                return resolution;
            }
        }

        info!(attempts = attempts.len(), "Access code not resolved, all strategies exhausted");
        Resolution::Exhausted { attempts }
    }

    /// Record the outcome, returning the resolution when it matched
    fn settle(
        strategy: Strategy,
        outcome: StrategyOutcome,
        attempts: &mut Vec<StrategyAttempt>,
    ) -> Option<Resolution> {
        match outcome {
            StrategyOutcome::Matched(identity) => {
                info!(%strategy, student = %identity.id, "Access code resolved");
                Some(Resolution::Resolved { identity, strategy })
            }
            outcome => {
                match &outcome {
                    StrategyOutcome::Failed(reason) => {
                        warn!(%strategy, reason = %reason, "Resolution strategy failed")
                    }
                    other => debug!(%strategy, outcome = ?other, "Resolution strategy did not match"),
                }
                attempts.push(StrategyAttempt { strategy, outcome });
                None
            }
        }
    }

    fn access_fields(&self) -> Vec<&str> {
        self.schema.access_fields.iter().map(String::as_str).collect()
    }

    fn name_fields(&self) -> Vec<&str> {
        self.schema.name_fields.iter().map(String::as_str).collect()
    }

    /// First record of a lookup, warning when the token is ambiguous
    fn first_match(records: Vec<Record>, table: &str, how: &str) -> Option<Record> {
        if records.len() > 1 {
            warn!(
                table,
                lookup = how,
                count = records.len(),
                "Several student records match one access code, using the first"
            );
        }
        records.into_iter().next()
    }

    async fn filtered_lookup(&self, config: &BackendConfig, token: &str) -> StrategyOutcome {
        let mut failures = Failures::default();

        for table in &self.schema.tables {
            for field in &self.schema.access_fields {
                let query = RecordQuery::filtered(formula::field_equals(field, token));
                match self.gateway.fetch(config, table, &query).await {
                    Ok(records) => {
                        failures.answered();
                        if let Some(record) = Self::first_match(records, table, field) {
                            return StrategyOutcome::Matched(Identity::from_record(&record, token));
                        }
                    }
                    Err(e @ RecordError::Unauthorized(_)) => {
                        // The key cannot read this table at all
                        failures.record(table, &e);
                        break;
                    }
                    Err(e) => failures.record(table, &e),
                }
            }
        }

        failures.into_outcome()
    }

    async fn name_indirection(&self, config: &BackendConfig, token: &str) -> StrategyOutcome {
        if !looks_like_record_id(token) {
            return StrategyOutcome::Skipped("access code is not a record id".to_string());
        }

        let name_fields = self.name_fields();
        let mut failures = Failures::default();

        for table in &self.schema.tables {
            let query = RecordQuery::filtered(formula::record_id_equals(token));
            let id_record = match self.gateway.fetch(config, table, &query).await {
                Ok(records) => {
                    failures.answered();
                    match Self::first_match(records, table, "record id") {
                        Some(record) => record,
                        None => continue,
                    }
                }
                Err(e) => {
                    failures.record(table, &e);
                    continue;
                }
            };

            let Some(name) = id_record.text(&name_fields) else {
                return StrategyOutcome::Matched(Identity::from_record(&id_record, token));
            };

            for field in &name_fields {
                let query = RecordQuery::filtered(formula::field_equals(field, &name));
                match self.gateway.fetch(config, table, &query).await {
                    Ok(records) => {
                        if let Some(profile) = Self::first_match(records, table, field) {
                            return StrategyOutcome::Matched(Identity::from_record(&profile, token));
                        }
                    }
                    Err(e) => debug!(table = %table, field, error = %e, "Name lookup failed"),
                }
            }

            return StrategyOutcome::Matched(Identity::from_record(&id_record, token));
        }

        failures.into_outcome()
    }

    async fn table_scan(&self, config: &BackendConfig, token: &str) -> StrategyOutcome {
        let access_fields = self.access_fields();
        let mut failures = Failures::default();

        for table in &self.schema.tables {
            match self.gateway.fetch(config, table, &RecordQuery::scan()).await {
                Ok(records) => {
                    failures.answered();
                    let matching: Vec<Record> = records
                        .into_iter()
                        .filter(|record| {
                            record.id == token
                                || access_fields
                                    .iter()
                                    .any(|field| record.text(&[*field]).as_deref() == Some(token))
                        })
                        .collect();
                    if let Some(record) = Self::first_match(matching, table, "scan") {
                        return StrategyOutcome::Matched(Identity::from_record(&record, token));
                    }
                }
                Err(e) => failures.record(table, &e),
            }
        }

        failures.into_outcome()
    }
}
