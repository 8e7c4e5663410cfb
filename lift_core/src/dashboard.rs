//! Dashboard state: fetched workouts, categories and the selected category.
//!
//! The dashboard owns its state and recomputes chart series on demand; the
//! aggregation itself stays a pure function in [`crate::series`].

use crate::catalog::{get_default_categories, Categories};
use crate::client::{CatalogSource, HistorySource};
use crate::series::{aggregate, find_in_progress, SeriesMap};
use crate::{CustomExercise, Error, Result, WorkoutRecord};
use chrono::NaiveDate;

#[derive(Clone, Debug)]
pub struct Dashboard {
    records: Vec<WorkoutRecord>,
    categories: Categories,
    selected: Option<String>,
}

impl Dashboard {
    /// Built-in categories, no records, `preferred` selected if it exists.
    pub fn new(preferred: Option<&str>) -> Self {
        let categories = get_default_categories().clone();
        let selected = categories.resolve(preferred).map(str::to_string);
        Self {
            records: Vec::new(),
            categories,
            selected,
        }
    }

    /// Re-fetch workouts and custom exercises for `email`.
    pub fn refresh<H, C>(&mut self, history: &H, catalog: &C, email: &str) -> Result<()>
    where
        H: HistorySource + ?Sized,
        C: CatalogSource + ?Sized,
    {
        let records = history.fetch_history(email)?;
        let custom = catalog.fetch_custom_exercises(email)?;
        self.set_records(records);
        self.merge_custom(&custom);
        Ok(())
    }

    pub fn set_records(&mut self, records: Vec<WorkoutRecord>) {
        self.records = records;
    }

    /// Merge custom exercises; keeps the selection if it still exists.
    pub fn merge_custom(&mut self, custom: &[CustomExercise]) {
        self.categories.merge_custom(custom);
        self.selected = self
            .categories
            .resolve(self.selected.as_deref())
            .map(str::to_string);
    }

    pub fn select_category(&mut self, name: &str) -> Result<()> {
        if self.categories.get(name).is_none() {
            let known: Vec<&str> = self.categories.names().collect();
            return Err(Error::Catalog(format!(
                "unknown category '{}' (known: {})",
                name,
                known.join(", ")
            )));
        }
        self.selected = Some(name.to_string());
        Ok(())
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn categories(&self) -> &Categories {
        &self.categories
    }

    pub fn records(&self) -> &[WorkoutRecord] {
        &self.records
    }

    /// Chart series for the selected category
    pub fn graph_data(&self) -> SeriesMap {
        let allow = self
            .selected
            .as_deref()
            .and_then(|name| self.categories.allow_list(name))
            .unwrap_or_default();
        aggregate(&self.records, &allow)
    }

    pub fn in_progress(&self, today: NaiveDate) -> Option<&WorkoutRecord> {
        find_in_progress(&self.records, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ExerciseLog, SetEntry};
    use std::cell::Cell;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn workout(d: &str, name: &str, weights: &[f64], submitted: bool) -> WorkoutRecord {
        WorkoutRecord {
            date: date(d),
            exercises: vec![ExerciseLog {
                name: name.into(),
                sets: weights
                    .iter()
                    .map(|w| SetEntry {
                        weight: *w,
                        reps: Some(8.0),
                    })
                    .collect(),
            }],
            submitted,
        }
    }

    struct FakeBackend {
        records: Vec<WorkoutRecord>,
        custom: Vec<CustomExercise>,
        calls: Cell<usize>,
    }

    impl HistorySource for FakeBackend {
        fn fetch_history(&self, email: &str) -> Result<Vec<WorkoutRecord>> {
            assert_eq!(email, "nick@example.com");
            self.calls.set(self.calls.get() + 1);
            Ok(self.records.clone())
        }
    }

    impl CatalogSource for FakeBackend {
        fn fetch_custom_exercises(&self, _email: &str) -> Result<Vec<CustomExercise>> {
            Ok(self.custom.clone())
        }
    }

    struct DownBackend;

    impl HistorySource for DownBackend {
        fn fetch_history(&self, _email: &str) -> Result<Vec<WorkoutRecord>> {
            Err(Error::Api {
                status: 503,
                message: "maintenance".into(),
            })
        }
    }

    #[test]
    fn test_new_selects_first_category() {
        let dashboard = Dashboard::new(None);
        assert_eq!(dashboard.selected_category(), Some("Chest"));
        assert!(dashboard.graph_data().is_empty());

        let dashboard = Dashboard::new(Some("Legs"));
        assert_eq!(dashboard.selected_category(), Some("Legs"));
    }

    #[test]
    fn test_refresh_and_chart_custom_exercise() {
        let backend = FakeBackend {
            records: vec![
                workout("2024-04-02", "Sled", &[90.0, 110.0], true),
                workout("2024-04-01", "Sled", &[80.0], true),
                workout("2024-04-01", "Bis", &[20.0], true),
            ],
            custom: vec![CustomExercise {
                name: "Sled".into(),
                category: "Conditioning".into(),
            }],
            calls: Cell::new(0),
        };

        let mut dashboard = Dashboard::new(None);
        dashboard
            .refresh(&backend, &backend, "nick@example.com")
            .unwrap();
        assert_eq!(backend.calls.get(), 1);
        assert_eq!(dashboard.records().len(), 3);

        dashboard.select_category("Conditioning").unwrap();
        let series = dashboard.graph_data();
        assert_eq!(series.keys().collect::<Vec<_>>(), vec!["Sled"]);

        let sled = series.get("Sled").unwrap();
        assert_eq!(sled.dates, vec![date("2024-04-01"), date("2024-04-02")]);
        assert_eq!(sled.max_weights, vec![80.0, 110.0]);
        assert_eq!(sled.avg_weights, vec![80.0, 100.0]);

        dashboard.select_category("Arms").unwrap();
        assert_eq!(dashboard.graph_data().keys().collect::<Vec<_>>(), vec!["Bis"]);
    }

    #[test]
    fn test_refresh_error_propagates() {
        let catalog = FakeBackend {
            records: vec![],
            custom: vec![],
            calls: Cell::new(0),
        };
        let mut dashboard = Dashboard::new(None);
        let result = dashboard.refresh(&DownBackend, &catalog, "nick@example.com");
        assert!(matches!(result, Err(Error::Api { status: 503, .. })));
    }

    #[test]
    fn test_unknown_category_rejected() {
        let mut dashboard = Dashboard::new(None);
        assert!(matches!(
            dashboard.select_category("Cardio"),
            Err(Error::Catalog(_))
        ));
        assert_eq!(dashboard.selected_category(), Some("Chest"));
    }

    #[test]
    fn test_in_progress() {
        let mut dashboard = Dashboard::new(None);
        dashboard.set_records(vec![
            workout("2024-04-01", "Rows", &[60.0], true),
            workout("2024-04-02", "Rows", &[62.5], false),
        ]);

        assert!(dashboard.in_progress(date("2024-04-02")).is_some());
        assert!(dashboard.in_progress(date("2024-04-01")).is_none());
    }
}
