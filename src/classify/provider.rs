//! Structured-output providers: the OpenAI Responses adapter and a mock.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::schema::ResponseFormat;

pub const OPENAI_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Provider error codes that mean the request exceeded the model's input budget.
const OVERSIZE_CODES: &[&str] = &["context_length_exceeded", "string_above_max_length"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    #[error("input too long: {0}")]
    InputTooLong(String),
    #[error("provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
    #[error("transport error: {0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("missing API key")]
    MissingApiKey,
}

impl ClassifyError {
    pub fn is_oversize(&self) -> bool {
        matches!(self, ClassifyError::InputTooLong(_))
    }
}

pub type ProviderFuture<'a> = Pin<Box<dyn Future<Output = Result<String, ClassifyError>> + Send + 'a>>;

/// One remote structured-output call. Returns the raw JSON text the model produced.
pub trait Provider: Send + Sync + 'static {
    fn create<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        format: &'a ResponseFormat,
    ) -> ProviderFuture<'a>;
    fn name(&self) -> &'static str;
}

// ------------------------------------------------------------
// OpenAI Responses API
// ------------------------------------------------------------

pub struct OpenAiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: String, model: Option<&str>, timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("tariff-post-classifier/0.1")
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            base_url: OPENAI_BASE_URL.to_string(),
            api_key,
            model: model.unwrap_or(DEFAULT_MODEL).to_string(),
        })
    }

    /// Point at a compatible endpoint (proxies, local test servers).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn create_impl(
        &self,
        system: &str,
        user: &str,
        format: &ResponseFormat,
    ) -> Result<String, ClassifyError> {
        if self.api_key.is_empty() {
            return Err(ClassifyError::MissingApiKey);
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct TextOpts<'a> {
            format: &'a ResponseFormat,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            input: Vec<Msg<'a>>,
            text: TextOpts<'a>,
        }

        let req = Req {
            model: &self.model,
            input: vec![
                Msg {
                    role: "system",
                    content: system,
                },
                Msg {
                    role: "user",
                    content: user,
                },
            ],
            text: TextOpts { format },
        };

        let resp = self
            .http
            .post(format!("{}/v1/responses", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ClassifyError::Transport(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }
        output_text(&body)
    }
}

impl Provider for OpenAiProvider {
    fn create<'a>(
        &'a self,
        system: &'a str,
        user: &'a str,
        format: &'a ResponseFormat,
    ) -> ProviderFuture<'a> {
        Box::pin(self.create_impl(system, user, format))
    }
    fn name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

/// Map a non-2xx response to a typed error. Oversize is recognised by error
/// code or HTTP 413; the message check only covers gateways that strip codes.
pub(crate) fn error_from_body(status: u16, body: &str) -> ClassifyError {
    let (message, code) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(env) => (env.error.message, env.error.code),
        Err(_) => (body.trim().to_string(), None),
    };
    let oversize = status == 413
        || code.as_deref().is_some_and(|c| OVERSIZE_CODES.contains(&c))
        || message.to_ascii_lowercase().contains("too long");
    if oversize {
        ClassifyError::InputTooLong(message)
    } else {
        ClassifyError::Http { status, message }
    }
}

/// Pull the model text out of a Responses API body.
pub(crate) fn output_text(body: &str) -> Result<String, ClassifyError> {
    let v: Value =
        serde_json::from_str(body).map_err(|e| ClassifyError::Malformed(e.to_string()))?;
    if let Some(s) = v.get("output_text").and_then(Value::as_str) {
        return Ok(s.to_string());
    }
    let mut out = String::new();
    for item in v.get("output").and_then(Value::as_array).into_iter().flatten() {
        for part in item.get("content").and_then(Value::as_array).into_iter().flatten() {
            if part.get("type").and_then(Value::as_str) == Some("output_text") {
                if let Some(t) = part.get("text").and_then(Value::as_str) {
                    out.push_str(t);
                }
            }
        }
    }
    if out.is_empty() {
        Err(ClassifyError::Malformed("response has no output_text".into()))
    } else {
        Ok(out)
    }
}

// ------------------------------------------------------------
// Mock provider
// ------------------------------------------------------------

type Responder = Arc<dyn Fn(&str) -> Result<String, ClassifyError> + Send + Sync>;

/// Deterministic provider for tests and `AI_TEST_MODE=mock` runs.
/// Scripted outcomes are consumed first; afterwards the responder answers.
pub struct MockProvider {
    script: Mutex<VecDeque<Result<String, ClassifyError>>>,
    responder: Responder,
    calls: Mutex<Vec<String>>,
}

impl MockProvider {
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<String, ClassifyError> + Send + Sync + 'static,
    {
        Self {
            script: Mutex::new(VecDeque::new()),
            responder: Arc::new(f),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn fixed(json: impl Into<String>) -> Self {
        let json = json.into();
        Self::from_fn(move |_| Ok(json.clone()))
    }

    /// Answers with a keyword heuristic: a post mentioning "tariff" is related.
    pub fn keyword() -> Self {
        Self::from_fn(|prompt| Ok(keyword_answer(prompt)))
    }

    pub fn with_script(self, outcomes: Vec<Result<String, ClassifyError>>) -> Self {
        *self.script.lock().unwrap_or_else(|e| e.into_inner()) = outcomes.into();
        self
    }

    /// User prompts received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Provider for MockProvider {
    fn create<'a>(
        &'a self,
        _system: &'a str,
        user: &'a str,
        _format: &'a ResponseFormat,
    ) -> ProviderFuture<'a> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(user.to_string());
        let scripted = self
            .script
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        let out = scripted.unwrap_or_else(|| (self.responder)(user));
        Box::pin(async move { out })
    }
    fn name(&self) -> &'static str {
        "mock"
    }
}

fn keyword_answer(prompt: &str) -> String {
    let published = prompt
        .lines()
        .find_map(|l| l.strip_prefix("Published time: "))
        .unwrap_or_default();
    let content = prompt
        .lines()
        .find_map(|l| l.strip_prefix("Content: "))
        .unwrap_or_default();
    let related = content.to_ascii_lowercase().contains("tariff");
    let rate = content
        .split_whitespace()
        .map(|w| w.trim_matches(|c: char| !c.is_ascii_digit() && c != '%'))
        .find(|w| w.len() > 1 && w.ends_with('%'));
    serde_json::json!({
        "tariffs_related": related,
        "affected_country": null,
        "affected_region": null,
        "products": [],
        "published_time": published,
        "tariff_rate": if related { rate } else { None },
        "classification": if related { "threat" } else { "unknown" },
        "media_analysis": null
    })
    .to_string()
}
