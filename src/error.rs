//! Error types for the dvac-donations library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DonationError`] — **Fatal**: the batch cannot proceed at all
//!   (too many files, missing credential, export I/O failure). Returned as
//!   `Err(DonationError)` from the top-level entry points before any
//!   per-document work begins.
//!
//! * [`DocumentError`] — **Non-fatal**: a single document failed (corrupt
//!   PDF, provider outage, unparseable reply) but the rest of the batch is
//!   fine. Recorded as an [`crate::output::ExtractionFailure`] inside the
//!   result collection so callers see partial success rather than losing
//!   the whole batch to one bad scan.
//!
//! The separation mirrors the calling protocol's expectations: batch-level
//! preconditions short-circuit with a single error payload, while anything
//! that happens after the first document starts surfaces as data.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the dvac-donations library.
///
/// Document-level failures use [`DocumentError`] and are stored in
/// [`crate::output::ExtractionFailure`] entries rather than propagated here.
#[derive(Debug, Error)]
pub enum DonationError {
    // ── Batch preconditions ───────────────────────────────────────────────
    /// The batch exceeds the configured size cap.
    ///
    /// The cap exists because the calling protocol enforces a response-time
    /// ceiling per invocation; oversized batches risk truncated delivery.
    /// The message wording is part of the tool contract.
    #[error("Too many files. Please process a maximum of {max} files at a time to avoid timeouts.")]
    BatchTooLarge { given: usize, max: usize },

    /// The extraction credential is absent from the process environment.
    #[error("{var} environment variable not set")]
    MissingCredential { var: &'static str },

    /// A provider was named but could not be constructed.
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Export errors ─────────────────────────────────────────────────────
    /// Could not create or write the CSV output file.
    #[error("Failed to write output file '{path}': {source}")]
    ExportFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single document.
///
/// Converted into an [`crate::output::ExtractionFailure`] entry so the
/// batch continues; never propagated past the orchestrator.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum DocumentError {
    /// The PDF could not be opened, decoded, or rasterised.
    #[error("{detail}")]
    Render { detail: String },

    /// The vision provider call failed after all retries.
    #[error("{detail}")]
    Provider { detail: String },

    /// No parseable JSON object was found in the model reply.
    ///
    /// `raw` preserves the reply verbatim for diagnostics. The message
    /// wording is part of the tool contract.
    #[error("Could not parse JSON from API response")]
    Parse { raw: String },
}

impl DocumentError {
    /// The raw model text, present only for parse failures.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            DocumentError::Parse { raw } => Some(raw),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_too_large_message_matches_contract() {
        let e = DonationError::BatchTooLarge { given: 6, max: 5 };
        assert_eq!(
            e.to_string(),
            "Too many files. Please process a maximum of 5 files at a time to avoid timeouts."
        );
    }

    #[test]
    fn missing_credential_display() {
        let e = DonationError::MissingCredential {
            var: "OPENROUTER_API_KEY",
        };
        assert_eq!(
            e.to_string(),
            "OPENROUTER_API_KEY environment variable not set"
        );
    }

    #[test]
    fn parse_error_message_is_fixed() {
        let e = DocumentError::Parse {
            raw: "I could not read the image".into(),
        };
        assert_eq!(e.to_string(), "Could not parse JSON from API response");
        assert_eq!(e.raw_response(), Some("I could not read the image"));
    }

    #[test]
    fn render_and_provider_carry_detail() {
        let r = DocumentError::Render {
            detail: "corrupt xref table".into(),
        };
        assert_eq!(r.to_string(), "corrupt xref table");
        assert_eq!(r.raw_response(), None);

        let p = DocumentError::Provider {
            detail: "HTTP 503".into(),
        };
        assert_eq!(p.to_string(), "HTTP 503");
    }
}
