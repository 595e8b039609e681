//! Vision-model invocation: package the extraction request and fetch the
//! raw reply text.
//!
//! This stage is intentionally thin — the instruction text lives in
//! [`crate::prompts`] and all reply interpretation lives in
//! [`crate::pipeline::parse`], so retry and transport concerns here can
//! change without touching the extraction contract.
//!
//! ## Retry Strategy
//!
//! HTTP 429 / 503 errors from hosted model APIs are transient and common.
//! Exponential backoff (`retry_backoff_ms * 2^attempt`) keeps a flaky
//! endpoint from failing a document on the first blip: with the 500 ms
//! default and 2 retries the wait sequence is 500 ms → 1 s, under 2 s of
//! back-off per document.

use crate::config::ExtractionConfig;
use crate::error::DocumentError;
use crate::prompts::EXTRACTION_PROMPT;
use edgequake_llm::{ChatMessage, CompletionOptions, ImageData, LLMProvider};
use std::sync::Arc;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// Send the extraction request for one document and return the raw reply.
///
/// The request is one user turn: the instruction text followed by one
/// image segment per rendered page, in page order. The reply text is
/// returned untouched (the parser treats it as untrusted input); a
/// provider that returns no content yields an empty string, which the
/// parser will reject with the raw text preserved.
pub async fn request_extraction(
    provider: &Arc<dyn LLMProvider>,
    filename: &str,
    pages: Vec<ImageData>,
    config: &ExtractionConfig,
) -> Result<String, DocumentError> {
    let prompt = config.prompt.as_deref().unwrap_or(EXTRACTION_PROMPT);
    let messages = vec![ChatMessage::user_with_images(prompt, pages)];
    let options = build_options(config);

    let mut last_err: Option<String> = None;

    for attempt in 0..=config.max_retries {
        if attempt > 0 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 1);
            warn!(
                "{}: retry {}/{} after {}ms",
                filename, attempt, config.max_retries, backoff
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        match provider.chat(&messages, Some(&options)).await {
            Ok(response) => {
                debug!(
                    "{}: {} input tokens, {} output tokens",
                    filename, response.prompt_tokens, response.completion_tokens
                );
                return Ok(response.content.trim().to_string());
            }
            Err(e) => {
                let err_msg = format!("{}", e);
                warn!("{}: attempt {} failed — {}", filename, attempt + 1, err_msg);
                last_err = Some(err_msg);
            }
        }
    }

    Err(DocumentError::Provider {
        detail: last_err.unwrap_or_else(|| "Unknown error".to_string()),
    })
}

/// Build `CompletionOptions` from the extraction config.
///
/// Bounded output length and low temperature: field extraction wants the
/// most deterministic reading of the page, not creativity.
fn build_options(config: &ExtractionConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = ExtractionConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.1));
        assert_eq!(opts.max_tokens, Some(1024));
    }
}
