//! Workout logging form.
//!
//! A submission is what the log form posts to the backend. Saving with
//! `submitted = false` keeps the workout open so it shows up as
//! "in progress" on the dashboard later the same day.

use crate::decode::coerce_str;
use crate::{Error, Result, WorkoutRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One weight/reps pair as entered on the form
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SetPair {
    pub weight: f64,
    #[serde(default)]
    pub reps: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ExerciseEntry {
    pub name: String,
    pub pairs: Vec<SetPair>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct WorkoutSubmission {
    pub date: NaiveDate,
    pub exercises: Vec<ExerciseEntry>,
    pub submitted: bool,
}

impl WorkoutSubmission {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            exercises: Vec::new(),
            submitted: true,
        }
    }

    /// Reopen an in-progress workout so more sets can be added.
    pub fn from_record(record: &WorkoutRecord) -> Self {
        Self {
            date: record.date,
            exercises: record
                .exercises
                .iter()
                .map(|log| ExerciseEntry {
                    name: log.name.clone(),
                    pairs: log
                        .sets
                        .iter()
                        .map(|set| SetPair {
                            weight: set.weight,
                            reps: set.reps,
                        })
                        .collect(),
                })
                .collect(),
            submitted: record.submitted,
        }
    }

    /// Append sets, merging into an existing entry with the same name.
    pub fn add_exercise(&mut self, entry: ExerciseEntry) {
        match self.exercises.iter_mut().find(|e| e.name == entry.name) {
            Some(existing) => existing.pairs.extend(entry.pairs),
            None => self.exercises.push(entry),
        }
    }

    /// Check the form before it is posted.
    ///
    /// Drafts may leave reps blank; a finished workout may not.
    pub fn validate(&self) -> Result<()> {
        if self.exercises.is_empty() {
            return Err(Error::Workout("no exercises entered".into()));
        }

        for entry in &self.exercises {
            if entry.name.trim().is_empty() {
                return Err(Error::Workout("exercise name is empty".into()));
            }
            if entry.pairs.is_empty() {
                return Err(Error::Workout(format!("'{}' has no sets", entry.name)));
            }
            for pair in &entry.pairs {
                if pair.weight < 0.0 {
                    return Err(Error::Workout(format!(
                        "'{}' has a negative weight",
                        entry.name
                    )));
                }
                match pair.reps {
                    Some(reps) if reps <= 0.0 => {
                        return Err(Error::Workout(format!(
                            "'{}' has a set with {} reps",
                            entry.name, reps
                        )));
                    }
                    None if self.submitted => {
                        return Err(Error::Workout(format!(
                            "'{}' has a set without reps",
                            entry.name
                        )));
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }
}

/// Parse `NAME=WEIGHTxREPS,WEIGHTxREPS,...`, e.g. `Bis=20x12,22.5x10`.
///
/// Reps may be left off (`Bis=20`) for a draft.
pub fn parse_exercise_arg(arg: &str) -> Result<ExerciseEntry> {
    let (name, sets) = arg
        .split_once('=')
        .ok_or_else(|| Error::Workout(format!("expected NAME=WEIGHTxREPS,..., got {:?}", arg)))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::Workout(format!("missing exercise name in {:?}", arg)));
    }

    let mut pairs = Vec::new();
    for set in sets.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let (weight, reps) = match set.split_once(['x', 'X']) {
            Some((w, r)) => (w, Some(r)),
            None => (set, None),
        };

        let weight = coerce_str(weight).ok_or_else(|| {
            Error::Workout(format!("{}: weight {:?} is not a number", name, weight.trim()))
        })?;
        let reps = reps
            .map(|r| {
                coerce_str(r).ok_or_else(|| {
                    Error::Workout(format!("{}: reps {:?} is not a number", name, r.trim()))
                })
            })
            .transpose()?;

        pairs.push(SetPair { weight, reps });
    }

    if pairs.is_empty() {
        return Err(Error::Workout(format!("{}: no sets given", name)));
    }

    Ok(ExerciseEntry {
        name: name.to_string(),
        pairs,
    })
}
