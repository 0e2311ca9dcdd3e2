//! Multi-tenant Lead Dashboard API Library
//!
//! This library provides the core functionality for the lead dashboard
//! service: ingestion of tenant lead feeds, the canonicalization pipeline
//! (dates, status taxonomy, qualification), range filtering, metric and
//! series aggregation, the tenant/user registries, and HTTP handlers.
//!
//! # Modules
//!
//! - `auth`: Login, bearer sessions, access checks.
//! - `config`: Configuration management.
//! - `dashboard`: Dashboard session controller (filter, aggregate, payload).
//! - `dates`: Locale-tolerant creation-date parsing.
//! - `db`: Database connection, pool, and schema bootstrap.
//! - `errors`: Error handling types.
//! - `filters`: Date-range presets and filtering.
//! - `handlers`: HTTP request handlers.
//! - `ingest`: Lead source fetch and canonicalization.
//! - `metrics`: KPI aggregation.
//! - `models`: Core data models.
//! - `series`: Daily / campaign / source bucketing.
//! - `taxonomy`: Status normalization and qualification rules.
//! - `tenant_store`: Tenant registry (`clients_config`).
//! - `user_store`: Operator accounts and tenant grants.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod db;
pub mod errors;
pub mod filters;
pub mod handlers;
pub mod ingest;
pub mod metrics;
pub mod models;
pub mod series;
pub mod taxonomy;
pub mod tenant_store;
pub mod user_store;
