//! Output types: donation records, per-document outcomes, and batch stats.
//!
//! The JSON shapes here are the tool contract: a batch call returns an
//! array with one entry per input document, each entry either a
//! [`DonationRecord`] or an [`ExtractionFailure`]. Both carry `filename` so
//! the caller can merge results from several batch calls without tracking
//! input order itself.

use crate::error::DocumentError;
use serde::{Deserialize, Serialize};

/// One extracted donor transaction.
///
/// All fields except `filename` are optional: absent fields stay `None`
/// (serialised as JSON `null`) until CSV export, which writes them as empty
/// cells. Invariant: `address`, when present, contains no line-break
/// characters — the parser collapses them to `", "`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationRecord {
    /// Base name of the source PDF.
    pub filename: String,
    /// Donor name(s); organisational names are excluded by the prompt.
    pub name: Option<String>,
    /// Single-line mailing address.
    pub address: Option<String>,
    /// Donation amount as a decimal string, e.g. "25.00".
    pub amount: Option<String>,
    /// Donation date as MM/DD/YYYY.
    pub date: Option<String>,
}

impl DonationRecord {
    /// A record with every extracted field absent.
    ///
    /// This is also what the parser produces when the model returns a valid
    /// JSON object containing none of the four expected keys — a
    /// deliberately preserved quirk (see the parser docs).
    pub fn empty(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            name: None,
            address: None,
            amount: None,
            date: None,
        }
    }
}

/// Typed failure outcome for a single document.
///
/// Coexists with successful records in the same result collection.
/// `raw_response` is populated only for parse failures, preserving the
/// model reply verbatim; it is omitted from JSON when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionFailure {
    pub filename: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

impl ExtractionFailure {
    /// Build a failure entry from a per-document error.
    pub fn from_error(filename: impl Into<String>, error: &DocumentError) -> Self {
        Self {
            filename: filename.into(),
            error: error.to_string(),
            raw_response: error.raw_response().map(str::to_owned),
        }
    }
}

/// One per-document outcome: a record or a typed failure.
///
/// `Failed` is listed first so untagged deserialisation tries the
/// error shape (which requires an `error` key) before falling back to the
/// record shape, whose fields are all optional and would otherwise match
/// any object carrying a `filename`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentOutcome {
    Failed(ExtractionFailure),
    Record(DonationRecord),
}

impl DocumentOutcome {
    /// Base name of the source PDF, regardless of outcome.
    pub fn filename(&self) -> &str {
        match self {
            DocumentOutcome::Record(r) => &r.filename,
            DocumentOutcome::Failed(f) => &f.filename,
        }
    }

    /// True for successfully parsed records.
    pub fn is_record(&self) -> bool {
        matches!(self, DocumentOutcome::Record(_))
    }
}

/// Timing and accounting for one batch call.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchStats {
    /// Documents processed (equals the input length when the batch ran).
    pub documents: usize,
    /// Documents that produced a record.
    pub extracted: usize,
    /// Documents that produced a failure entry.
    pub failed: usize,
    /// Wall-clock time spent rasterising and normalising pages.
    pub render_duration_ms: u64,
    /// Wall-clock time spent in vision-model calls.
    pub llm_duration_ms: u64,
    /// Total wall-clock time for the batch.
    pub total_duration_ms: u64,
}

/// Result of one batch call: ordered outcomes plus stats.
///
/// Outcomes preserve input order; callers accumulating several batches can
/// simply concatenate the `outcomes` vectors — batch boundaries are
/// invisible in the final aggregate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchReport {
    pub outcomes: Vec<DocumentOutcome>,
    pub stats: BatchStats,
}
