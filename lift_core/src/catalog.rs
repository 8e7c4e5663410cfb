//! Exercise categories used to filter the dashboard charts.
//!
//! The built-in machine exercises are merged with the user's custom
//! exercises fetched from the backend.

use crate::types::{Category, CustomExercise};
use crate::Result;
use once_cell::sync::Lazy;
use serde::Deserialize;
use std::collections::HashSet;

/// Cached built-in categories
static DEFAULT_CATEGORIES: Lazy<Categories> = Lazy::new(build_default_categories);

/// Get a reference to the cached built-in categories
pub fn get_default_categories() -> &'static Categories {
    &DEFAULT_CATEGORIES
}

/// Ordered list of categories. Order is display order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Categories {
    pub categories: Vec<Category>,
}

/// Builds the built-in categories
pub fn build_default_categories() -> Categories {
    let table: [(&str, &[&str]); 5] = [
        ("Chest", &["InclineChest", "ChestPress", "Flys", "ShoulderPress"]),
        (
            "Arms",
            &["Bis", "TriPress", "TriPullDown", "TriExtension", "LateralRaise"],
        ),
        ("Back", &["PullDown", "RearDelt", "Rows"]),
        (
            "Legs",
            &[
                "HipAbductor",
                "SeatedLegCurl",
                "LegExtension",
                "HipAdductor",
                "LegPress",
            ],
        ),
        ("Abs", &["Abdominal", "BackExtension", "TorsoRotation"]),
    ];

    Categories {
        categories: table
            .iter()
            .map(|(name, exercises)| Category {
                name: (*name).into(),
                exercises: exercises.iter().map(|e| (*e).into()).collect(),
            })
            .collect(),
    }
}

/// Body of the custom-exercise endpoint
#[derive(Debug, Deserialize)]
struct CustomExercisesResponse {
    #[serde(default)]
    exercises: Vec<CustomExercise>,
}

/// Decode `{ "exercises": [ { "ExerciseName", "ExerciseCategory" } ] }`
pub fn decode_custom_exercises(body: &str) -> Result<Vec<CustomExercise>> {
    let response: CustomExercisesResponse = serde_json::from_str(body)?;
    Ok(response.exercises)
}

impl Categories {
    pub fn get(&self, name: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    /// Add custom exercises. Unknown categories are appended at the end;
    /// exercises already listed in their category are not duplicated.
    pub fn merge_custom(&mut self, custom: &[CustomExercise]) {
        for exercise in custom {
            let idx = match self
                .categories
                .iter()
                .position(|c| c.name == exercise.category)
            {
                Some(idx) => idx,
                None => {
                    self.categories.push(Category {
                        name: exercise.category.clone(),
                        exercises: Vec::new(),
                    });
                    self.categories.len() - 1
                }
            };

            let category = &mut self.categories[idx];
            if !category.exercises.contains(&exercise.name) {
                category.exercises.push(exercise.name.clone());
            }
        }
        tracing::debug!(
            "Merged {} custom exercises into {} categories",
            custom.len(),
            self.categories.len()
        );
    }

    /// Exercise names belonging to `category`
    pub fn allow_list(&self, category: &str) -> Option<HashSet<String>> {
        self.get(category)
            .map(|c| c.exercises.iter().cloned().collect())
    }

    /// `selected` if it still exists, otherwise the first category.
    pub fn resolve<'a>(&'a self, selected: Option<&str>) -> Option<&'a str> {
        selected
            .and_then(|s| self.get(s))
            .or_else(|| self.categories.first())
            .map(|c| c.name.as_str())
    }

    /// Validate the categories for consistency
    ///
    /// Returns a list of validation errors, or empty Vec if valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen_categories = HashSet::new();

        if self.categories.is_empty() {
            errors.push("No categories defined".to_string());
        }

        for category in &self.categories {
            if category.name.trim().is_empty() {
                errors.push("Category has empty name".to_string());
            }
            if !seen_categories.insert(category.name.as_str()) {
                errors.push(format!("Duplicate category '{}'", category.name));
            }

            let mut seen_exercises = HashSet::new();
            for exercise in &category.exercises {
                if exercise.trim().is_empty() {
                    errors.push(format!("Category '{}' has an empty exercise name", category.name));
                }
                if !seen_exercises.insert(exercise.as_str()) {
                    errors.push(format!(
                        "Category '{}' lists '{}' twice",
                        category.name, exercise
                    ));
                }
            }
        }

        errors
    }
}
