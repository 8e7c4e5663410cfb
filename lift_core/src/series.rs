//! Aggregation of workout records into per-exercise chart series.
//!
//! For every exercise in the selected category, each workout contributes one
//! data point: the heaviest set and the mean set weight for that day.

use crate::{ExerciseSeries, SetEntry, WorkoutRecord};
use chrono::NaiveDate;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::HashSet;

/// Exercise name to series, in first-seen order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SeriesMap {
    entries: Vec<(String, ExerciseSeries)>,
}

impl SeriesMap {
    pub fn get(&self, exercise: &str) -> Option<&ExerciseSeries> {
        self.entries
            .iter()
            .find(|(name, _)| name == exercise)
            .map(|(_, series)| series)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExerciseSeries)> {
        self.entries
            .iter()
            .map(|(name, series)| (name.as_str(), series))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn entry(&mut self, exercise: &str) -> &mut ExerciseSeries {
        let idx = match self.entries.iter().position(|(name, _)| name == exercise) {
            Some(idx) => idx,
            None => {
                self.entries
                    .push((exercise.to_string(), ExerciseSeries::default()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[idx].1
    }
}

impl Serialize for SeriesMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, series) in &self.entries {
            map.serialize_entry(name, series)?;
        }
        map.end()
    }
}

/// Max and mean weight of a non-empty list of sets.
fn weight_stats(sets: &[SetEntry]) -> Option<(f64, f64)> {
    if sets.is_empty() {
        return None;
    }
    let max = sets
        .iter()
        .map(|s| s.weight)
        .fold(f64::NEG_INFINITY, f64::max);
    let avg = sets.iter().map(|s| s.weight).sum::<f64>() / sets.len() as f64;
    Some((max, avg))
}

/// Build chart series for the exercises in `category_exercises`.
///
/// Records are visited in ascending date order (stable for equal dates);
/// the caller's slice is left untouched. Exercises outside the allow-list
/// are skipped, as are exercises logged with no sets.
pub fn aggregate(records: &[WorkoutRecord], category_exercises: &HashSet<String>) -> SeriesMap {
    let mut ordered: Vec<&WorkoutRecord> = records.iter().collect();
    ordered.sort_by_key(|record| record.date);

    let mut series = SeriesMap::default();
    for record in ordered {
        for log in &record.exercises {
            if !category_exercises.contains(&log.name) {
                continue;
            }
            let Some((max, avg)) = weight_stats(&log.sets) else {
                tracing::debug!("Skipping {} on {}: no sets logged", log.name, record.date);
                continue;
            };
            series.entry(&log.name).push(record.date, max, avg);
        }
    }

    tracing::debug!(
        "Aggregated {} records into {} series",
        records.len(),
        series.len()
    );
    series
}

/// X-axis labels for a series: at most about `max_labels` dates are shown
/// (as "Jan 5"), the rest are blank so the axis stays readable.
pub fn chart_labels(dates: &[NaiveDate], max_labels: usize) -> Vec<String> {
    if dates.is_empty() {
        return Vec::new();
    }
    let stride = dates.len().div_ceil(max_labels.max(1)).max(1);
    dates
        .iter()
        .enumerate()
        .map(|(i, date)| {
            if i % stride == 0 {
                date.format("%b %-d").to_string()
            } else {
                String::new()
            }
        })
        .collect()
}

/// The unfinished workout for `today`, if any.
pub fn find_in_progress(records: &[WorkoutRecord], today: NaiveDate) -> Option<&WorkoutRecord> {
    records
        .iter()
        .find(|record| record.date == today && !record.submitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExerciseLog;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn sets(weights: &[f64]) -> Vec<SetEntry> {
        weights
            .iter()
            .map(|w| SetEntry {
                weight: *w,
                reps: Some(10.0),
            })
            .collect()
    }

    fn record(d: &str, exercises: &[(&str, &[f64])]) -> WorkoutRecord {
        WorkoutRecord {
            date: date(d),
            exercises: exercises
                .iter()
                .map(|(name, weights)| ExerciseLog {
                    name: name.to_string(),
                    sets: sets(weights),
                })
                .collect(),
            submitted: true,
        }
    }

    fn names(list: &[&str]) -> HashSet<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_records_give_empty_map() {
        assert!(aggregate(&[], &names(&["Bis"])).is_empty());
    }

    #[test]
    fn test_two_workouts_of_curls() {
        let records = vec![
            record("2024-01-01", &[("Bis", &[10.0, 20.0])]),
            record("2024-01-03", &[("Bis", &[15.0])]),
        ];

        let series = aggregate(&records, &names(&["Bis"]));
        assert_eq!(series.len(), 1);

        let bis = series.get("Bis").unwrap();
        assert_eq!(bis.dates, vec![date("2024-01-01"), date("2024-01-03")]);
        assert_eq!(bis.max_weights, vec![20.0, 15.0]);
        assert_eq!(bis.avg_weights, vec![15.0, 15.0]);
    }

    #[test]
    fn test_records_sorted_without_touching_input() {
        let records = vec![
            record("2024-03-10", &[("Rows", &[80.0])]),
            record("2024-03-01", &[("Rows", &[70.0])]),
            record("2024-03-05", &[("Rows", &[75.0])]),
        ];
        let before = records.clone();

        let series = aggregate(&records, &names(&["Rows"]));
        let rows = series.get("Rows").unwrap();

        assert!(rows.dates.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(rows.max_weights, vec![70.0, 75.0, 80.0]);
        assert_eq!(records, before);
    }

    #[test]
    fn test_equal_dates_keep_input_order() {
        let records = vec![
            record("2024-03-01", &[("Rows", &[70.0])]),
            record("2024-03-01", &[("Rows", &[90.0])]),
        ];
        let rows = aggregate(&records, &names(&["Rows"]));
        assert_eq!(rows.get("Rows").unwrap().max_weights, vec![70.0, 90.0]);
    }

    #[test]
    fn test_exercises_outside_category_are_excluded() {
        let records = vec![
            record("2024-01-01", &[("Bis", &[10.0]), ("LegPress", &[200.0])]),
            record("2024-01-02", &[("LegPress", &[210.0])]),
        ];

        let series = aggregate(&records, &names(&["Bis", "TriPress"]));
        assert!(series.get("LegPress").is_none());
        assert!(series.get("TriPress").is_none());
        assert_eq!(series.keys().collect::<Vec<_>>(), vec!["Bis"]);
    }

    #[test]
    fn test_series_lengths_always_match() {
        let records = vec![
            record("2024-01-05", &[("Bis", &[12.0, 14.0]), ("TriPress", &[40.0])]),
            record("2024-01-01", &[("TriPress", &[35.0, 37.5, 40.0])]),
            record("2024-01-09", &[("Bis", &[15.0])]),
        ];

        let series = aggregate(&records, &names(&["Bis", "TriPress"]));
        for (_, s) in series.iter() {
            assert_eq!(s.dates.len(), s.max_weights.len());
            assert_eq!(s.dates.len(), s.avg_weights.len());
        }
        assert_eq!(series.get("TriPress").unwrap().len(), 2);
    }

    #[test]
    fn test_first_seen_order_follows_sorted_records() {
        let records = vec![
            record("2024-01-05", &[("Bis", &[12.0])]),
            record("2024-01-01", &[("TriPress", &[35.0])]),
        ];

        let series = aggregate(&records, &names(&["Bis", "TriPress"]));
        assert_eq!(series.keys().collect::<Vec<_>>(), vec!["TriPress", "Bis"]);
    }

    #[test]
    fn test_empty_set_list_contributes_no_point() {
        let records = vec![
            record("2024-01-01", &[("Bis", &[])]),
            record("2024-01-02", &[("Bis", &[10.0])]),
        ];

        let bis = aggregate(&records, &names(&["Bis"]));
        let bis = bis.get("Bis").unwrap();
        assert_eq!(bis.dates, vec![date("2024-01-02")]);
    }

    #[test]
    fn test_aggregate_is_deterministic() {
        let records = vec![
            record("2024-01-05", &[("Bis", &[12.0, 14.0]), ("TriPress", &[40.0])]),
            record("2024-01-01", &[("TriPress", &[35.0])]),
        ];
        let allow = names(&["Bis", "TriPress"]);
        assert_eq!(aggregate(&records, &allow), aggregate(&records, &allow));
    }

    #[test]
    fn test_series_map_serializes_as_object() {
        let records = vec![record("2024-01-01", &[("Bis", &[10.0, 20.0])])];
        let json = serde_json::to_value(aggregate(&records, &names(&["Bis"]))).unwrap();
        assert_eq!(json["Bis"]["dates"][0], "2024-01-01");
        assert_eq!(json["Bis"]["maxWeights"][0], 20.0);
        assert_eq!(json["Bis"]["avgWeights"][0], 15.0);
    }

    #[test]
    fn test_chart_labels_thin_out_long_series() {
        let dates: Vec<NaiveDate> = (1..=12)
            .map(|d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap())
            .collect();

        let labels = chart_labels(&dates, 6);
        assert_eq!(labels.len(), 12);
        assert_eq!(labels[0], "Jan 1");
        assert_eq!(labels[1], "");
        assert_eq!(labels[2], "Jan 3");
        assert_eq!(labels.iter().filter(|l| !l.is_empty()).count(), 6);
    }

    #[test]
    fn test_chart_labels_short_series_all_shown() {
        let dates = vec![date("2024-02-01"), date("2024-02-15")];
        assert_eq!(chart_labels(&dates, 6), vec!["Feb 1", "Feb 15"]);
        assert!(chart_labels(&[], 6).is_empty());
    }

    #[test]
    fn test_find_in_progress() {
        let mut draft = record("2024-05-02", &[("Bis", &[10.0])]);
        draft.submitted = false;
        let records = vec![record("2024-05-02", &[("Rows", &[50.0])]), draft.clone()];

        assert_eq!(find_in_progress(&records, date("2024-05-02")), Some(&draft));
        assert_eq!(find_in_progress(&records, date("2024-05-03")), None);
    }
}
