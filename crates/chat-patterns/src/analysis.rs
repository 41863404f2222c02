//! Decoding of customer-inquiry analyses returned by a model.
//!
//! Model output is untrusted text. [`parse`] never panics on it: anything
//! that is not a complete, well-typed analysis comes back as a [`ParseError`].

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Kind of customer inquiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Technical,
    Billing,
    General,
    Complaint,
}

/// How soon the inquiry needs attention.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

/// Customer's apparent mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

/// A fully validated inquiry analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StructuredAnalysis {
    pub category: Category,
    pub urgency: Urgency,
    pub sentiment: Sentiment,
    /// Always within `[0.0, 1.0]`.
    pub confidence: f64,
}

/// Why a response could not be decoded.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("response is not valid JSON: {0}")]
    NotJson(String),

    #[error("field `{field}` {reason}")]
    SchemaViolation { field: String, reason: String },
}

impl ParseError {
    fn violation(field: &str, reason: impl Into<String>) -> Self {
        ParseError::SchemaViolation {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Short label for the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::NotJson(_) => "not_json",
            ParseError::SchemaViolation { .. } => "schema_violation",
        }
    }
}

/// Parse a model response into a [`StructuredAnalysis`].
///
/// The whole text (ignoring surrounding whitespace) must be one JSON object.
/// Fields are checked in declaration order and the first problem is returned.
/// Extra keys are ignored. Text the JSON decoder itself refuses, including
/// numbers outside `f64` range and nesting past its recursion limit, is
/// `NotJson`.
pub fn parse(raw: &str) -> Result<StructuredAnalysis, ParseError> {
    let value: Value =
        serde_json::from_str(raw.trim()).map_err(|e| ParseError::NotJson(e.to_string()))?;

    let fields = match value {
        Value::Object(fields) => fields,
        other => {
            return Err(ParseError::violation(
                "$",
                format!("must be a JSON object, got {}", type_name(&other)),
            ));
        }
    };

    Ok(StructuredAnalysis {
        category: literal(&fields, "category")?,
        urgency: literal(&fields, "urgency")?,
        sentiment: literal(&fields, "sentiment")?,
        confidence: confidence(&fields)?,
    })
}

fn required<'a>(fields: &'a Map<String, Value>, name: &str) -> Result<&'a Value, ParseError> {
    fields
        .get(name)
        .ok_or_else(|| ParseError::violation(name, "is missing"))
}

/// Decode one of the lowercase enum literals.
fn literal<T>(fields: &Map<String, Value>, name: &str) -> Result<T, ParseError>
where
    T: for<'de> Deserialize<'de>,
{
    let value = required(fields, name)?;
    let Value::String(text) = value else {
        return Err(ParseError::violation(
            name,
            format!("must be a string, got {}", type_name(value)),
        ));
    };
    T::deserialize(value)
        .map_err(|_| ParseError::violation(name, format!("has unsupported value \"{text}\"")))
}

fn confidence(fields: &Map<String, Value>) -> Result<f64, ParseError> {
    let value = required(fields, "confidence")?;
    let number = value.as_f64().ok_or_else(|| {
        ParseError::violation(
            "confidence",
            format!("must be a number, got {}", type_name(value)),
        )
    })?;
    if !(0.0..=1.0).contains(&number) {
        return Err(ParseError::violation(
            "confidence",
            format!("must be between 0.0 and 1.0, got {number}"),
        ));
    }
    Ok(number)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Technical => "technical",
            Category::Billing => "billing",
            Category::General => "general",
            Category::Complaint => "complaint",
        }
    }
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        }
    }
}

impl Sentiment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Neutral => "neutral",
            Sentiment::Negative => "negative",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
