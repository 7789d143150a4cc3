//! Common library for the coaching dashboard backend
//!
//! This crate provides what both services share: the record store gateway
//! and its configuration, tolerant field resolution and the domain models
//! mapped from backend records, the backend schema, and sessions kept in
//! the key-value state store.
//!
//! ```rust,no_run
//! use common::backend::BackendConfig;
//! use common::gateway::{HttpRecordGateway, RecordGateway, RecordQuery};
//! use common::formula;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = BackendConfig::from_env();
//!     let gateway = HttpRecordGateway::new();
//!     let query = RecordQuery::filtered(formula::field_equals("code", "access123"));
//!     let records = gateway.fetch(&config, "Eleves", &query).await?;
//!     println!("{} matching students", records.len());
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod fields;
pub mod formula;
pub mod gateway;
pub mod models;
pub mod schema;
pub mod session;
pub mod store;

#[cfg(feature = "testing")]
pub mod testing;
