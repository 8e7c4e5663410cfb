//! Workout backend client.
//!
//! The backend identifies the user by the email in the stored credential.
//! Every call is a JSON POST; non-2xx answers become [`Error::Api`].

use crate::catalog::decode_custom_exercises;
use crate::config::ServerConfig;
use crate::decode::decode_history_json;
use crate::workout::WorkoutSubmission;
use crate::{CustomExercise, Error, Result, WorkoutRecord};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Source of the user's logged workouts
pub trait HistorySource {
    fn fetch_history(&self, email: &str) -> Result<Vec<WorkoutRecord>>;
}

/// Source of the user's custom exercises
pub trait CatalogSource {
    fn fetch_custom_exercises(&self, email: &str) -> Result<Vec<CustomExercise>>;
}

/// Destination for new workouts and custom exercises
pub trait WorkoutSink {
    /// Returns the server's confirmation message, if it sent one
    fn log_workout(&self, email: &str, workout: &WorkoutSubmission) -> Result<Option<String>>;
    fn add_exercise(&self, email: &str, exercise: &CustomExercise) -> Result<()>;
}

#[derive(Serialize)]
struct UserRef<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct UserBody<'a> {
    user: UserRef<'a>,
}

#[derive(Serialize)]
struct LogWorkoutBody<'a> {
    user: UserRef<'a>,
    #[serde(flatten)]
    workout: &'a WorkoutSubmission,
}

#[derive(Serialize)]
struct AddExerciseBody<'a> {
    user: UserRef<'a>,
    name: &'a str,
    category: &'a str,
}

#[derive(Deserialize)]
struct MessageBody {
    message: Option<String>,
    error: Option<String>,
}

/// Best human-readable message from an error body
fn api_message(body: &str) -> String {
    serde_json::from_str::<MessageBody>(body)
        .ok()
        .and_then(|b| b.error.or(b.message))
        .unwrap_or_else(|| body.trim().chars().take(200).collect())
}

/// HTTP client for the workout backend
pub struct BackendClient {
    base_url: String,
    http: Client,
}

impl BackendClient {
    pub fn new(config: &ServerConfig) -> Result<Self> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<String> {
        let url = self.url(path);
        tracing::debug!("POST {}", url);

        let response = self.http.post(&url).json(body).send()?;
        let status = response.status();
        let text = response.text()?;

        check_response(status, text).inspect_err(|_| {
            tracing::warn!("POST {} failed with {}", url, status);
        })
    }
}

/// Response body on success, [`Error::Api`] for any non-2xx status.
fn check_response(status: StatusCode, body: String) -> Result<String> {
    if !status.is_success() {
        return Err(Error::Api {
            status: status.as_u16(),
            message: api_message(&body),
        });
    }
    Ok(body)
}

impl HistorySource for BackendClient {
    fn fetch_history(&self, email: &str) -> Result<Vec<WorkoutRecord>> {
        let body = self.post(
            "/dashboard-load/mobile",
            &UserBody {
                user: UserRef { email },
            },
        )?;
        let records = decode_history_json(&body)?;
        tracing::info!("Fetched {} workouts", records.len());
        Ok(records)
    }
}

impl CatalogSource for BackendClient {
    fn fetch_custom_exercises(&self, email: &str) -> Result<Vec<CustomExercise>> {
        let body = self.post(
            "/load-exercises/mobile",
            &UserBody {
                user: UserRef { email },
            },
        )?;
        decode_custom_exercises(&body)
    }
}

impl WorkoutSink for BackendClient {
    fn log_workout(&self, email: &str, workout: &WorkoutSubmission) -> Result<Option<String>> {
        workout.validate()?;
        let body = self.post(
            "/log-workout",
            &LogWorkoutBody {
                user: UserRef { email },
                workout,
            },
        )?;
        let message = serde_json::from_str::<MessageBody>(&body)
            .ok()
            .and_then(|b| b.message);
        tracing::info!("Logged workout for {}", workout.date);
        Ok(message)
    }

    fn add_exercise(&self, email: &str, exercise: &CustomExercise) -> Result<()> {
        if exercise.name.trim().is_empty() || exercise.category.trim().is_empty() {
            return Err(Error::Workout(
                "custom exercise needs both a name and a category".into(),
            ));
        }
        self.post(
            "/add-exercise",
            &AddExerciseBody {
                user: UserRef { email },
                name: exercise.name.trim(),
                category: exercise.category.trim(),
            },
        )?;
        tracing::info!(
            "Added custom exercise {} to {}",
            exercise.name,
            exercise.category
        );
        Ok(())
    }
}
