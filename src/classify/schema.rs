// src/classify/schema.rs
//! Typed response contract for the tariff classifier and the JSON schema sent
//! to the structured-output endpoint.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const SCHEMA_NAME: &str = "tariff_analysis";

/// Stance the post takes on tariffs. Anything the model invents beyond the
/// three known labels is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stance {
    Threat,
    Official,
    Unknown,
    #[serde(untagged)]
    Other(String),
}

impl Stance {
    pub fn as_str(&self) -> &str {
        match self {
            Stance::Threat => "threat",
            Stance::Official => "official",
            Stance::Unknown => "unknown",
            Stance::Other(s) => s,
        }
    }
}

/// The eight-field structured result. Every field must be present in the
/// response; nullable fields must be spelled out as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TariffAnalysis {
    pub tariffs_related: bool,
    #[serde(deserialize_with = "Option::deserialize")]
    pub affected_country: Option<String>,
    #[serde(deserialize_with = "Option::deserialize")]
    pub affected_region: Option<String>,
    pub products: Vec<String>,
    pub published_time: String,
    #[serde(deserialize_with = "Option::deserialize")]
    pub tariff_rate: Option<String>,
    pub classification: Stance,
    #[serde(deserialize_with = "Option::deserialize")]
    pub media_analysis: Option<String>,
}

/// Either a full analysis or an error marker. Never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassificationResult {
    Analysis(TariffAnalysis),
    Error { error: String },
}

impl ClassificationResult {
    pub fn error(message: impl Into<String>) -> Self {
        ClassificationResult::Error {
            error: message.into(),
        }
    }

    pub fn analysis(&self) -> Option<&TariffAnalysis> {
        match self {
            ClassificationResult::Analysis(a) => Some(a),
            ClassificationResult::Error { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ClassificationResult::Analysis(_) => None,
            ClassificationResult::Error { error } => Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error_message().is_some()
    }
}

/// `text.format` payload for the structured-output request.
#[derive(Debug, Clone, Serialize)]
pub struct ResponseFormat {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub name: &'static str,
    pub schema: Value,
    pub strict: bool,
}

pub fn tariff_analysis_format() -> ResponseFormat {
    let nullable_string = json!({"anyOf": [{"type": "string"}, {"type": "null"}]});
    ResponseFormat {
        kind: "json_schema",
        name: SCHEMA_NAME,
        schema: json!({
            "type": "object",
            "properties": {
                "tariffs_related": {"type": "boolean"},
                "affected_country": nullable_string,
                "affected_region": nullable_string,
                "products": {"type": "array", "items": {"type": "string"}},
                "published_time": {"type": "string"},
                "tariff_rate": nullable_string,
                "classification": {"type": "string"},
                "media_analysis": nullable_string
            },
            "required": [
                "tariffs_related",
                "affected_country",
                "affected_region",
                "products",
                "published_time",
                "tariff_rate",
                "classification",
                "media_analysis"
            ],
            "additionalProperties": false
        }),
        strict: true,
    }
}
