#![forbid(unsafe_code)]

//! Core domain model and business logic for the lift log.
//!
//! This crate provides:
//! - Domain types (workouts, sets, chart series, nutrition facts)
//! - Record decoding with typed numeric coercion
//! - Per-exercise series aggregation for the dashboard charts
//! - Nutrition fact extraction from meal-photo completions
//! - Exercise categories, workout logging, credentials
//! - Backend and vision API clients

pub mod types;
pub mod error;
pub mod decode;
pub mod series;
pub mod nutrition;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod credentials;
pub mod workout;
pub mod client;
pub mod vision;
pub mod dashboard;
pub mod export;

// Re-export commonly used types
pub use error::{AggregationError, Error, ParseError, Result};
pub use types::*;
pub use catalog::{build_default_categories, get_default_categories, Categories};
pub use config::Config;
pub use series::{aggregate, SeriesMap};
pub use nutrition::parse as parse_nutrition;
pub use credentials::{CredentialStore, FileCredentialStore, UserCredential};
pub use client::{BackendClient, CatalogSource, HistorySource, WorkoutSink};
pub use vision::{analyze_meal, OpenAiVision, VisionSource};
pub use dashboard::Dashboard;
pub use workout::WorkoutSubmission;
