//! CSV export: serialize a result collection to a fixed-schema table.
//!
//! The schema is exactly five columns — `filename, name, address, amount,
//! date` — regardless of what an outcome carries. Failure entries
//! contribute a row with only `filename` populated; their `error` and
//! `raw_response` keys are dropped, never serialized as extra columns.
//! Absent fields become empty cells, not the literal word "null".
//!
//! Address line-break collapsing is re-applied here even though the parser
//! already normalizes it: records can reach the exporter without passing
//! through the parser (deserialized from an earlier run's JSON, built by a
//! caller), and the single-line invariant belongs to the file format.

use crate::error::DonationError;
use crate::output::DocumentOutcome;
use crate::pipeline::parse::normalize_address;
use std::path::Path;
use tracing::{debug, info};

/// The fixed CSV header, in column order.
pub const CSV_COLUMNS: [&str; 5] = ["filename", "name", "address", "amount", "date"];

/// What an export call did.
#[derive(Debug, PartialEq, Eq)]
pub enum ExportOutcome {
    /// `count` rows written to the target path.
    Written { count: usize },
    /// The collection was empty; no file was created or touched.
    NothingToSave,
}

/// Write a result collection to `output_file` as CSV.
///
/// Creates missing parent directories; overwrites an existing file. An
/// empty collection is a no-op success, distinct from the written case so
/// callers can report "no data to save" instead of a zero count.
///
/// # Errors
/// [`DonationError::ExportFailed`] when the target cannot be created or
/// written.
pub fn write_csv(
    outcomes: &[DocumentOutcome],
    output_file: &Path,
) -> Result<ExportOutcome, DonationError> {
    if outcomes.is_empty() {
        debug!("Export skipped: empty result collection");
        return Ok(ExportOutcome::NothingToSave);
    }

    if let Some(parent) = output_file.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| DonationError::ExportFailed {
                path: output_file.to_path_buf(),
                source: e,
            })?;
        }
    }

    let io_err = |e: csv::Error| DonationError::ExportFailed {
        path: output_file.to_path_buf(),
        source: std::io::Error::other(e),
    };

    let mut writer = csv::Writer::from_path(output_file).map_err(io_err)?;
    writer.write_record(CSV_COLUMNS).map_err(io_err)?;

    for outcome in outcomes {
        writer.write_record(row_fields(outcome)).map_err(io_err)?;
    }

    writer
        .flush()
        .map_err(|e| DonationError::ExportFailed {
            path: output_file.to_path_buf(),
            source: e,
        })?;

    info!(
        "Saved {} records to {}",
        outcomes.len(),
        output_file.display()
    );
    Ok(ExportOutcome::Written {
        count: outcomes.len(),
    })
}

/// Project an outcome onto the five fixed columns.
fn row_fields(outcome: &DocumentOutcome) -> [String; 5] {
    match outcome {
        DocumentOutcome::Record(r) => [
            r.filename.clone(),
            r.name.clone().unwrap_or_default(),
            r.address
                .as_deref()
                .map(normalize_address)
                .unwrap_or_default(),
            r.amount.clone().unwrap_or_default(),
            r.date.clone().unwrap_or_default(),
        ],
        // error / raw_response are dropped, not exported
        DocumentOutcome::Failed(f) => [
            f.filename.clone(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::{DonationRecord, ExtractionFailure};

    fn record(filename: &str, address: Option<&str>) -> DocumentOutcome {
        DocumentOutcome::Record(DonationRecord {
            filename: filename.into(),
            name: Some("J Doe".into()),
            address: address.map(Into::into),
            amount: Some("25.00".into()),
            date: Some("11/06/2025".into()),
        })
    }

    #[test]
    fn empty_collection_is_a_distinct_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let result = write_csv(&[], &path).unwrap();
        assert_eq!(result, ExportOutcome::NothingToSave);
        assert!(!path.exists(), "no file should be created");
    }

    #[test]
    fn worked_example_row_with_multiline_address() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let outcomes = vec![record("a.pdf", Some("123 Main St\nAnytown, NY"))];
        let result = write_csv(&outcomes, &path).unwrap();
        assert_eq!(result, ExportOutcome::Written { count: 1 });

        let contents = std::fs::read_to_string(&path).unwrap();
        let mut lines = contents.lines();
        assert_eq!(lines.next(), Some("filename,name,address,amount,date"));
        assert_eq!(
            lines.next(),
            Some("a.pdf,J Doe,\"123 Main St, Anytown, NY\",25.00,11/06/2025")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn failure_entry_exports_filename_and_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let outcomes = vec![DocumentOutcome::Failed(ExtractionFailure {
            filename: "bad.pdf".into(),
            error: "Could not parse JSON from API response".into(),
            raw_response: Some("garbage".into()),
        })];
        write_csv(&outcomes, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let row = contents.lines().nth(1).unwrap();
        assert_eq!(row, "bad.pdf,,,,");
        assert!(!contents.contains("garbage"));
        assert!(!contents.contains("Could not parse"));
    }

    #[test]
    fn absent_fields_are_empty_cells_not_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let outcomes = vec![DocumentOutcome::Record(DonationRecord::empty("x.pdf"))];
        write_csv(&outcomes, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().nth(1), Some("x.pdf,,,,"));
        assert!(!contents.contains("null"));
    }

    #[test]
    fn parent_directories_are_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep/nested/out.csv");

        write_csv(&[record("a.pdf", None)], &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn rows_preserve_input_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let outcomes = vec![
            record("first.pdf", None),
            DocumentOutcome::Failed(ExtractionFailure {
                filename: "second.pdf".into(),
                error: "boom".into(),
                raw_response: None,
            }),
            record("third.pdf", None),
        ];
        write_csv(&outcomes, &path).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let files: Vec<&str> = contents
            .lines()
            .skip(1)
            .map(|l| l.split(',').next().unwrap())
            .collect();
        assert_eq!(files, vec!["first.pdf", "second.pdf", "third.pdf"]);
    }

    #[test]
    fn unwritable_target_is_an_export_error() {
        let result = write_csv(
            &[record("a.pdf", None)],
            Path::new("/proc/definitely/not/writable/out.csv"),
        );
        assert!(matches!(result, Err(DonationError::ExportFailed { .. })));
    }
}
