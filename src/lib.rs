//! # dvac-donations
//!
//! Extract structured donation records from scanned PDF documents using
//! Vision Language Models (VLMs).
//!
//! ## Why this crate?
//!
//! Donation paperwork — cheques, pledge cards, receipt scans — defeats
//! text-layer extraction: most of it is handwriting or flattened scans
//! with no text layer at all. Instead this crate rasterises each document
//! into a compact grayscale JPEG and lets a VLM read it as a human would,
//! returning the donor name, mailing address, amount, and date as one
//! structured record per document, ready for CSV export.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDFs (≤ 5 per batch)
//!  │
//!  ├─ 1. Input   resolve local file or download from URL
//!  ├─ 2. Render  rasterise the first page(s) via pdfium (spawn_blocking)
//!  ├─ 3. Encode  downscale → grayscale → JPEG q50 → base64
//!  ├─ 4. VLM     one vision call per document, sequential
//!  ├─ 5. Parse   brace-balance scan of the untrusted reply → record
//!  └─ 6. Export  outcomes accumulated across batches → fixed-schema CSV
//! ```
//!
//! Documents are processed strictly sequentially and each batch call is
//! stateless; failures surface as typed per-document entries in the result
//! collection, never as a lost batch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dvac_donations::{extract_batch, save_results_to_csv, ExtractionConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Credential read from OPENROUTER_API_KEY at call time
//!     let config = ExtractionConfig::default();
//!     let paths = vec!["scans/donation_001.pdf".to_string()];
//!     let report = extract_batch(&paths, &config).await?;
//!     println!("{}", save_results_to_csv(&report.outcomes, Path::new("out/donations.csv")));
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `dvac-donations` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! dvac-donations = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod batch;
pub mod config;
pub mod error;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;
pub mod tools;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use batch::{extract_batch, extract_batch_sync, extract_batch_with_progress};
pub use config::{ExtractionConfig, ExtractionConfigBuilder, CREDENTIAL_ENV_VAR, DEFAULT_MODEL};
pub use error::{DocumentError, DonationError};
pub use export::{write_csv, ExportOutcome, CSV_COLUMNS};
pub use output::{BatchReport, BatchStats, DocumentOutcome, DonationRecord, ExtractionFailure};
pub use progress::{BatchProgressCallback, NoopProgressCallback, ProgressCallback};
pub use tools::{extract_and_parse_donations, save_results_to_csv};
