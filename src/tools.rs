//! Tool-dispatch surface: string-in/string-out entry points.
//!
//! These two functions are what the hosting protocol calls; the transport
//! itself is out of scope. Their return-type asymmetry is deliberate and
//! part of the contract:
//!
//! * [`extract_and_parse_donations`] always returns a **JSON string** — an
//!   array of per-document outcomes, or a single `{"error": …}` object for
//!   batch-level failures.
//! * [`save_results_to_csv`] always returns a **plain human-readable
//!   string** — a success summary, "No data to save.", or an error
//!   message.
//!
//! Neither function ever panics or returns a transport error: the calling
//! protocol expects a response payload regardless of outcome, so every
//! failure is folded into the payload.

use crate::batch::extract_batch;
use crate::config::ExtractionConfig;
use crate::export::{write_csv, ExportOutcome};
use crate::output::DocumentOutcome;
use serde_json::json;
use std::path::Path;
use tracing::error;

/// Extract donation data from up to `max_batch_size` PDF files.
///
/// Returns a JSON array with one entry per input path, in input order:
/// either a donation record (with `filename` added) or
/// `{"filename", "error", optionally "raw_response"}`. Batches larger than
/// the cap, or a missing credential, return one `{"error": …}` object as
/// the entire payload instead.
///
/// `max_pages` limits rendering per file; pass 1 (the default elsewhere)
/// for single-page receipts.
pub async fn extract_and_parse_donations(
    file_paths: &[String],
    max_pages: usize,
    config: &ExtractionConfig,
) -> String {
    let config = ExtractionConfig {
        max_pages: max_pages.max(1),
        ..config.clone()
    };

    match extract_batch(file_paths, &config).await {
        Ok(report) => serde_json::to_string_pretty(&report.outcomes)
            .unwrap_or_else(|e| error_payload(&format!("Failed to serialize results: {e}"))),
        Err(e) => error_payload(&e.to_string()),
    }
}

/// Save extracted donation data to a CSV file.
///
/// Returns a plain success or error string, never structured JSON:
/// * `Successfully saved {n} records to {path}`
/// * `No data to save.`
/// * `Error saving CSV: {detail}`
pub fn save_results_to_csv(data: &[DocumentOutcome], output_file: &Path) -> String {
    match write_csv(data, output_file) {
        Ok(ExportOutcome::NothingToSave) => "No data to save.".to_string(),
        Ok(ExportOutcome::Written { count }) => {
            format!(
                "Successfully saved {} records to {}",
                count,
                output_file.display()
            )
        }
        Err(e) => {
            error!("CSV export failed: {e}");
            format!("Error saving CSV: {e}")
        }
    }
}

/// Fold a batch-level failure into the single-object error payload.
fn error_payload(message: &str) -> String {
    json!({ "error": message }).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::DonationRecord;

    #[tokio::test]
    async fn six_files_return_the_error_object_and_no_entries() {
        let config = ExtractionConfig::default();
        let paths: Vec<String> = (0..6).map(|i| format!("/tmp/f{i}.pdf")).collect();

        let payload = extract_and_parse_donations(&paths, 1, &config).await;
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "error": "Too many files. Please process a maximum of 5 files at a time to avoid timeouts."
            })
        );
    }

    #[test]
    fn save_empty_collection_reports_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let msg = save_results_to_csv(&[], &dir.path().join("out.csv"));
        assert_eq!(msg, "No data to save.");
    }

    #[test]
    fn save_reports_count_and_destination() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let data = vec![DocumentOutcome::Record(DonationRecord::empty("a.pdf"))];

        let msg = save_results_to_csv(&data, &path);
        assert!(msg.starts_with("Successfully saved 1 records to "));
        assert!(msg.ends_with("out.csv"));
    }

    #[test]
    fn save_failure_is_a_string_not_a_panic() {
        let data = vec![DocumentOutcome::Record(DonationRecord::empty("a.pdf"))];
        let msg = save_results_to_csv(&data, Path::new("/proc/nope/out.csv"));
        assert!(msg.starts_with("Error saving CSV: "));
    }
}
