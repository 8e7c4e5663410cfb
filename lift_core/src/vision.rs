//! Meal photo analysis through a chat-completions vision model.

use crate::config::VisionConfig;
use crate::nutrition::{self, NUTRITION_PROMPT};
use crate::{Error, NutritionAnalysis, Result};
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Anything that can turn a photo into completion text
pub trait VisionSource {
    fn complete(&self, image: &[u8], mime_type: &str) -> Result<String>;
}

/// Photograph-to-nutrition pipeline: ask the model, then parse its answer.
pub fn analyze_meal<V: VisionSource + ?Sized>(
    vision: &V,
    image: &[u8],
    mime_type: &str,
) -> Result<NutritionAnalysis> {
    let text = vision.complete(image, mime_type)?;
    match nutrition::parse(&text) {
        Ok(analysis) => Ok(analysis),
        Err(e) => {
            tracing::warn!("Could not read nutrition data from response: {}", e);
            Err(e.into())
        }
    }
}

/// MIME type for a photo, from its extension
pub fn mime_type_for(path: &Path) -> Result<&'static str> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("jpg") | Some("jpeg") => Ok("image/jpeg"),
        Some("png") => Ok("image/png"),
        Some("webp") => Ok("image/webp"),
        Some("gif") => Ok("image/gif"),
        _ => Err(Error::Other(format!(
            "unsupported image type: {}",
            path.display()
        ))),
    }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: Vec<MessageContent>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum MessageContent {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
    detail: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// OpenAI-compatible chat-completions client
pub struct OpenAiVision {
    endpoint: String,
    model: String,
    detail: String,
    api_key: String,
    http: Client,
}

impl OpenAiVision {
    pub fn new(config: &VisionConfig) -> Result<Self> {
        let api_key = config.api_key()?;
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            detail: config.detail.clone(),
            api_key,
            http,
        })
    }

    fn build_request(&self, image: &[u8], mime_type: &str) -> ChatCompletionRequest {
        let data_url = format!(
            "data:{};base64,{}",
            mime_type,
            BASE64_STANDARD.encode(image)
        );

        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: vec![
                    MessageContent::Text {
                        text: NUTRITION_PROMPT.to_string(),
                    },
                    MessageContent::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url,
                            detail: self.detail.clone(),
                        },
                    },
                ],
            }],
        }
    }
}

fn extract_text_response(response: ChatCompletionResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| Error::Other("vision API returned no content".into()))
}

impl VisionSource for OpenAiVision {
    fn complete(&self, image: &[u8], mime_type: &str) -> Result<String> {
        let request = self.build_request(image, mime_type);
        tracing::info!(
            "Sending {} byte image to {} ({})",
            image.len(),
            self.endpoint,
            self.model
        );

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        read_completion(status, &body)
    }
}

/// Completion text from a chat-completions response.
///
/// Non-2xx answers become [`Error::Api`] carrying the API's own error
/// message when the body has one.
fn read_completion(status: StatusCode, body: &str) -> Result<String> {
    if !status.is_success() {
        let message = serde_json::from_str::<ErrorResponse>(body)
            .map(|wrapper| wrapper.error.message)
            .unwrap_or_else(|_| body.to_string());
        return Err(Error::Api {
            status: status.as_u16(),
            message,
        });
    }

    let parsed: ChatCompletionResponse = serde_json::from_str(body)?;
    extract_text_response(parsed)
}
