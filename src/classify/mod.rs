//! Classifier: one structured-output call per post, with a single
//! truncate-and-retry when the provider reports the input as too long.
//!
//! The retry policy is a two-step state machine:
//! `First` -> (`InputTooLong`) -> `Truncated` -> `Done`. Any other failure,
//! and any failure of the truncated attempt, ends in an error-result.

pub mod provider;
pub mod schema;

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};

pub use provider::{ClassifyError, MockProvider, OpenAiProvider, Provider};
pub use schema::{tariff_analysis_format, ClassificationResult, ResponseFormat, Stance, TariffAnalysis};

/// Which call the classifier is about to make.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attempt {
    First,
    Truncated(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Next(Attempt),
    Done(ClassificationResult),
}

impl Attempt {
    /// Prompt text sent for this attempt.
    pub fn input<'a>(&'a self, prompt: &'a str) -> &'a str {
        match self {
            Attempt::First => prompt,
            Attempt::Truncated(t) => t,
        }
    }

    /// Transition on the outcome of this attempt's call.
    pub fn on_outcome(self, prompt: &str, outcome: Result<TariffAnalysis, ClassifyError>) -> Step {
        match (self, outcome) {
            (_, Ok(analysis)) => Step::Done(ClassificationResult::Analysis(analysis)),
            (Attempt::First, Err(e)) if e.is_oversize() => {
                Step::Next(Attempt::Truncated(truncate_prompt(prompt)))
            }
            (_, Err(e)) => Step::Done(ClassificationResult::error(e.to_string())),
        }
    }
}

/// Keep the first 90% of the prompt, counted in characters.
pub fn truncate_prompt(prompt: &str) -> String {
    let keep = prompt.chars().count() * 9 / 10;
    prompt.chars().take(keep).collect()
}

pub struct Classifier {
    provider: Arc<dyn Provider>,
    format: ResponseFormat,
}

impl Classifier {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            format: tariff_analysis_format(),
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    /// Classify one prompt. Never fails: errors come back as an error-result.
    pub async fn classify(&self, prompt: &str, system_instruction: &str) -> ClassificationResult {
        let mut attempt = Attempt::First;
        loop {
            let outcome = self.call(system_instruction, attempt.input(prompt)).await;
            match attempt.on_outcome(prompt, outcome) {
                Step::Next(next) => {
                    counter!("classify_truncated_retries_total").increment(1);
                    tracing::warn!(
                        original_chars = prompt.chars().count(),
                        truncated_chars = next.input(prompt).chars().count(),
                        "prompt too long, retrying truncated"
                    );
                    attempt = next;
                }
                Step::Done(result) => {
                    if let Some(err) = result.error_message() {
                        counter!("classify_errors_total").increment(1);
                        tracing::warn!(error = err, "classification failed");
                    }
                    return result;
                }
            }
        }
    }

    async fn call(&self, system: &str, user: &str) -> Result<TariffAnalysis, ClassifyError> {
        counter!("classify_calls_total").increment(1);
        let t0 = Instant::now();
        let raw = self.provider.create(system, user, &self.format).await;
        histogram!("classify_call_ms").record(t0.elapsed().as_secs_f64() * 1_000.0);
        let text = raw?;
        serde_json::from_str(&text).map_err(|e| ClassifyError::Malformed(e.to_string()))
    }
}
