//! Core domain types for the lift log.
//!
//! This module defines the fundamental types used throughout the system:
//! - Workout records and their sets
//! - Per-exercise chart series
//! - Nutrition facts extracted from a meal photo analysis
//! - Exercise categories

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// Workout Types
// ============================================================================

/// One logged set. `weight` has already been coerced to a finite number.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetEntry {
    pub weight: f64,
    pub reps: Option<f64>,
}

/// All sets of one exercise within a workout, in logged order.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseLog {
    pub name: String,
    pub sets: Vec<SetEntry>,
}

/// One day's logged session.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutRecord {
    pub date: NaiveDate,
    pub exercises: Vec<ExerciseLog>,
    /// `false` for a workout that was saved but not yet finished
    pub submitted: bool,
}

// ============================================================================
// Chart Series
// ============================================================================

/// Date-ordered weight statistics for one exercise.
///
/// The three vectors are always the same length; index `i` of each belongs
/// to the same workout.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExerciseSeries {
    pub dates: Vec<NaiveDate>,
    pub max_weights: Vec<f64>,
    pub avg_weights: Vec<f64>,
}

impl ExerciseSeries {
    pub(crate) fn push(&mut self, date: NaiveDate, max_weight: f64, avg_weight: f64) {
        self.dates.push(date);
        self.max_weights.push(max_weight);
        self.avg_weights.push(avg_weight);
    }

    /// Number of data points
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

// ============================================================================
// Nutrition Types
// ============================================================================

/// Nutrition label values for one photographed meal.
///
/// Numeric fields accept either JSON numbers or numeric strings; anything
/// else fails the whole decode.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NutritionFacts {
    pub serving_size: String,
    #[serde(deserialize_with = "crate::decode::lenient_f64")]
    pub calories: f64,
    #[serde(deserialize_with = "crate::decode::lenient_f64")]
    pub total_fat: f64,
    #[serde(deserialize_with = "crate::decode::lenient_f64")]
    pub saturated_fat: f64,
    #[serde(deserialize_with = "crate::decode::lenient_f64")]
    pub trans_fat: f64,
    #[serde(deserialize_with = "crate::decode::lenient_f64")]
    pub cholesterol: f64,
    #[serde(deserialize_with = "crate::decode::lenient_f64")]
    pub sodium: f64,
    #[serde(deserialize_with = "crate::decode::lenient_f64")]
    pub total_carbohydrate: f64,
    #[serde(deserialize_with = "crate::decode::lenient_f64")]
    pub dietary_fiber: f64,
    #[serde(deserialize_with = "crate::decode::lenient_f64")]
    pub total_sugars: f64,
    #[serde(deserialize_with = "crate::decode::lenient_f64")]
    pub added_sugars: f64,
    #[serde(deserialize_with = "crate::decode::lenient_f64")]
    pub protein: f64,
}

/// Structured facts plus the untouched response they came from.
#[derive(Clone, Debug, PartialEq)]
pub struct NutritionAnalysis {
    pub facts: NutritionFacts,
    /// The full completion text, kept for display next to the label
    pub explanation: String,
}

// ============================================================================
// Catalog Types
// ============================================================================

/// A named group of exercises, e.g. "Chest".
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub name: String,
    pub exercises: Vec<String>,
}

/// A user-defined exercise as returned by the catalog source.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomExercise {
    #[serde(rename = "ExerciseName")]
    pub name: String,
    #[serde(rename = "ExerciseCategory")]
    pub category: String,
}
