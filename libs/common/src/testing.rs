//! In-process record gateway for tests
//!
//! Replies are scripted per table: an exact filter formula, any filtered
//! query, or the unfiltered scan. Unscripted reads fail with `NotFound`.
//! Every call is recorded so tests can assert on what was (not) fetched.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::backend::{BackendConfig, BackendCredentials};
use crate::error::{RecordError, RecordResult};
use crate::gateway::{Record, RecordGateway, RecordQuery};

/// One observed gateway call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub table: String,
    pub filter: Option<String>,
}

#[derive(Debug, Clone)]
enum Matcher {
    Filter(String),
    AnyFilter,
    Scan,
}

#[derive(Debug, Clone)]
struct Rule {
    table: String,
    matcher: Matcher,
    reply: RecordResult<Vec<Record>>,
}

impl Rule {
    fn matches(&self, table: &str, query: &RecordQuery) -> bool {
        if self.table != table {
            return false;
        }
        match (&self.matcher, &query.filter) {
            (Matcher::Filter(expected), Some(filter)) => expected == filter,
            (Matcher::AnyFilter, Some(_)) => true,
            (Matcher::Scan, None) => true,
            _ => false,
        }
    }
}

/// Scripted `RecordGateway`
#[derive(Debug, Default)]
pub struct ScriptedGateway {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(self, table: &str, matcher: Matcher, reply: RecordResult<Vec<Record>>) -> Self {
        if let Ok(mut rules) = self.rules.lock() {
            rules.push(Rule {
                table: table.to_string(),
                matcher,
                reply,
            });
        }
        self
    }

    /// Reply to exactly this filter formula on `table`
    pub fn on_filter(self, table: &str, filter: &str, reply: RecordResult<Vec<Record>>) -> Self {
        self.push(table, Matcher::Filter(filter.to_string()), reply)
    }

    /// Reply to any filtered query on `table`
    pub fn on_any_filter(self, table: &str, reply: RecordResult<Vec<Record>>) -> Self {
        self.push(table, Matcher::AnyFilter, reply)
    }

    /// Reply to the unfiltered read of `table`
    pub fn on_scan(self, table: &str, reply: RecordResult<Vec<Record>>) -> Self {
        self.push(table, Matcher::Scan, reply)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls().len()
    }
}

#[async_trait]
impl RecordGateway for ScriptedGateway {
    async fn fetch(
        &self,
        config: &BackendConfig,
        table: &str,
        query: &RecordQuery,
    ) -> RecordResult<Vec<Record>> {
        config.credentials()?;

        if let Ok(mut calls) = self.calls.lock() {
            calls.push(RecordedCall {
                table: table.to_string(),
                filter: query.filter.clone(),
            });
        }

        let rules = self
            .rules
            .lock()
            .map_err(|e| RecordError::Transient(e.to_string()))?;

        rules
            .iter()
            .find(|rule| rule.matches(table, query))
            .map(|rule| rule.reply.clone())
            .unwrap_or_else(|| Err(RecordError::NotFound(format!("no script for {}", table))))
    }
}

/// A configured backend pointing nowhere
pub fn configured() -> BackendConfig {
    BackendConfig::default().with_credentials(BackendCredentials::new("appTest", "patTest"))
}

/// Shorthand for a record built from JSON fields
pub fn record(id: &str, fields: serde_json::Value) -> Record {
    Record::new(id, fields)
}
