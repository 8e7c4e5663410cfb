//! Nutrition facts from a meal-photo completion response.
//!
//! The vision model is asked for a prose explanation followed by a JSON
//! object inside a ```json fence. Only the first fenced block is read; any
//! later blocks are ignored.

use crate::{NutritionAnalysis, NutritionFacts, ParseError};
use std::fmt;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";
const BOLD: &str = "**";

/// Instruction sent alongside the photo.
pub const NUTRITION_PROMPT: &str = r#"Analyze the food in this image and provide an explanation of the nutrition facts followed by a JSON object in the following format:
{
  "servingSize": "string",
  "calories": "number",
  "totalFat": "number",
  "saturatedFat": "number",
  "transFat": "number",
  "cholesterol": "number",
  "sodium": "number",
  "totalCarbohydrate": "number",
  "dietaryFiber": "number",
  "totalSugars": "number",
  "addedSugars": "number",
  "protein": "number"
}"#;

/// Text between the first "```json" and the next "```", trimmed.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find(FENCE_OPEN)? + FENCE_OPEN.len();
    let len = text[start..].find(FENCE_CLOSE)?;
    Some(text[start..start + len].trim())
}

/// Parse a completion response into nutrition facts.
///
/// The returned explanation is the full, unmodified `text`.
pub fn parse(text: &str) -> Result<NutritionAnalysis, ParseError> {
    let block = extract_json_block(text).ok_or(ParseError::NoJsonBlock)?;
    tracing::debug!("Found fenced JSON block ({} bytes)", block.len());

    let facts: NutritionFacts =
        serde_json::from_str(block).map_err(|e| ParseError::MalformedJson(e.to_string()))?;

    Ok(NutritionAnalysis {
        facts,
        explanation: text.to_string(),
    })
}

/// A run of explanation text with its display style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Plain(String),
    /// `**bold**` on a single line, markers removed
    Bold(String),
    /// ```json fenced block, markers removed
    Code(String),
}

/// Find the next complete bold run or fenced block at or after `from`.
fn next_markup(text: &str, mut from: usize) -> Option<(usize, usize, Segment)> {
    loop {
        let rest = &text[from..];
        let bold_at = rest.find(BOLD).map(|i| i + from);
        let fence_at = rest.find(FENCE_OPEN).map(|i| i + from);

        let at = match (bold_at, fence_at) {
            (Some(b), Some(f)) => b.min(f),
            (Some(b), None) => b,
            (None, Some(f)) => f,
            (None, None) => return None,
        };

        if Some(at) == fence_at {
            let inner_start = at + FENCE_OPEN.len();
            if let Some(len) = text[inner_start..].find(FENCE_CLOSE) {
                let end = inner_start + len + FENCE_CLOSE.len();
                let inner = &text[inner_start..inner_start + len];
                return Some((at, end, Segment::Code(inner.to_string())));
            }
        } else {
            let inner_start = at + BOLD.len();
            let line_end = text[inner_start..]
                .find('\n')
                .map_or(text.len(), |i| inner_start + i);
            if let Some(len) = text[inner_start..line_end].find(BOLD) {
                let end = inner_start + len + BOLD.len();
                let inner = &text[inner_start..inner_start + len];
                return Some((at, end, Segment::Bold(inner.to_string())));
            }
        }

        // Unterminated marker: it is plain text, keep looking past it.
        from = at + 1;
    }
}

/// Split an explanation into plain, bold and code runs for display.
pub fn explanation_segments(text: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    while let Some((start, end, segment)) = next_markup(text, cursor) {
        if start > cursor {
            segments.push(Segment::Plain(text[cursor..start].to_string()));
        }
        segments.push(segment);
        cursor = end;
    }

    if cursor < text.len() {
        segments.push(Segment::Plain(text[cursor..].to_string()));
    }
    segments
}

impl fmt::Display for NutritionFacts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Nutrition Facts")?;
        writeln!(f, "Serving Size: {}", self.serving_size)?;
        writeln!(f, "Calories {}", self.calories)?;
        writeln!(f, "Total Fat {}g", self.total_fat)?;
        writeln!(f, "  Saturated Fat {}g", self.saturated_fat)?;
        writeln!(f, "  Trans Fat {}g", self.trans_fat)?;
        writeln!(f, "Cholesterol {}mg", self.cholesterol)?;
        writeln!(f, "Sodium {}mg", self.sodium)?;
        writeln!(f, "Total Carbohydrate {}g", self.total_carbohydrate)?;
        writeln!(f, "  Dietary Fiber {}g", self.dietary_fiber)?;
        writeln!(f, "  Total Sugars {}g", self.total_sugars)?;
        writeln!(f, "    Includes {}g Added Sugars", self.added_sugars)?;
        write!(f, "Protein {}g", self.protein)
    }
}
