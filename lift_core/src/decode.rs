//! Ingestion of workout history as served by the backend.
//!
//! The backend stores weights and reps as whatever the user typed, so a set
//! may carry `"42.5"`, `" 40 "` or `40`. All numeric coercion happens here,
//! once, with a typed failure. Nothing downstream sees an unparsed value.

use crate::{AggregationError, ExerciseLog, Result, SetEntry, WorkoutRecord};
use chrono::NaiveDate;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Workout as it appears on the wire.
#[derive(Debug, Deserialize)]
pub struct RawWorkout {
    #[serde(rename = "WorkoutDate")]
    pub workout_date: String,

    #[serde(rename = "Exercises", default, deserialize_with = "ordered_exercises")]
    pub exercises: Vec<(String, Vec<RawSet>)>,

    #[serde(rename = "Submitted", default)]
    pub submitted: bool,
}

/// Set as it appears on the wire; both fields may be strings or numbers.
#[derive(Debug, Deserialize)]
pub struct RawSet {
    #[serde(default)]
    pub weight: Value,
    #[serde(default)]
    pub reps: Value,
}

/// Keeps exercises in document order, one entry per name.
fn ordered_exercises<'de, D>(
    deserializer: D,
) -> std::result::Result<Vec<(String, Vec<RawSet>)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedVisitor;

    impl<'de> Visitor<'de> for OrderedVisitor {
        type Value = Vec<(String, Vec<RawSet>)>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a map of exercise name to a list of sets")
        }

        fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut exercises: Vec<(String, Vec<RawSet>)> =
                Vec::with_capacity(map.size_hint().unwrap_or(0));
            while let Some((name, sets)) = map.next_entry::<String, Vec<RawSet>>()? {
                // A repeated key replaces the earlier sets but keeps its position.
                match exercises.iter_mut().find(|(existing, _)| *existing == name) {
                    Some((_, slot)) => *slot = sets,
                    None => exercises.push((name, sets)),
                }
            }
            Ok(exercises)
        }

        fn visit_unit<E: de::Error>(self) -> std::result::Result<Self::Value, E> {
            Ok(Vec::new())
        }
    }

    deserializer.deserialize_any(OrderedVisitor)
}

/// Coerce a JSON number or numeric string to a finite `f64`.
///
/// Strings are trimmed first. Empty strings, non-numeric text, `NaN` and
/// infinities all yield `None`.
pub fn coerce_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|n| n.is_finite()),
        Value::String(s) => coerce_str(s),
        _ => None,
    }
}

/// String half of [`coerce_number`], for values typed by hand.
pub fn coerce_str(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

/// serde adapter for fields that must be numeric but may arrive as strings.
pub fn lenient_f64<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    coerce_number(&value).ok_or_else(|| {
        de::Error::custom(format!("expected a number or numeric string, got {}", value))
    })
}

/// Parse a workout date. Accepts `YYYY-MM-DD` and full timestamps whose
/// date part is `YYYY-MM-DD`.
pub fn parse_workout_date(raw: &str) -> std::result::Result<NaiveDate, AggregationError> {
    let trimmed = raw.trim();
    let date_part = trimmed.split_once('T').map_or(trimmed, |(d, _)| d);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").map_err(|_| {
        AggregationError::InvalidDate {
            raw: raw.to_string(),
        }
    })
}

fn display_raw(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Convert one wire workout into a validated record.
pub fn decode_record(raw: RawWorkout) -> std::result::Result<WorkoutRecord, AggregationError> {
    let date = parse_workout_date(&raw.workout_date)?;

    let mut exercises = Vec::with_capacity(raw.exercises.len());
    for (name, raw_sets) in raw.exercises {
        let mut sets = Vec::with_capacity(raw_sets.len());
        for raw_set in raw_sets {
            let weight = coerce_number(&raw_set.weight).ok_or_else(|| {
                AggregationError::InvalidWeight {
                    exercise: name.clone(),
                    date: date.to_string(),
                    raw: display_raw(&raw_set.weight),
                }
            })?;

            let reps = if is_blank(&raw_set.reps) {
                None
            } else {
                Some(coerce_number(&raw_set.reps).ok_or_else(|| {
                    AggregationError::InvalidReps {
                        exercise: name.clone(),
                        date: date.to_string(),
                        raw: display_raw(&raw_set.reps),
                    }
                })?)
            };

            sets.push(SetEntry { weight, reps });
        }
        exercises.push(ExerciseLog { name, sets });
    }

    Ok(WorkoutRecord {
        date,
        exercises,
        submitted: raw.submitted,
    })
}

/// Convert every wire workout; the first bad value fails the whole batch.
pub fn decode_records(
    raw: Vec<RawWorkout>,
) -> std::result::Result<Vec<WorkoutRecord>, AggregationError> {
    raw.into_iter().map(decode_record).collect()
}

/// Decode a history response body (a JSON array of workouts).
pub fn decode_history_json(body: &str) -> Result<Vec<WorkoutRecord>> {
    let raw: Vec<RawWorkout> = serde_json::from_str(body)?;
    let records = decode_records(raw)?;
    tracing::debug!("Decoded {} workout records", records.len());
    Ok(records)
}
