//! Batch orchestration: the primary entry point for extraction.
//!
//! One batch call takes a bounded list of document references and returns
//! one outcome per reference, in input order. The orchestrator enforces
//! exactly two batch-level preconditions before any document work begins:
//!
//! 1. **Size cap** — the calling protocol enforces a response-time ceiling
//!    per invocation; batches over [`ExtractionConfig::max_batch_size`]
//!    risk truncated delivery and are rejected outright with a single
//!    error, not per-file errors.
//! 2. **Credential** — the provider is resolved (and the credential
//!    validated) once, up front; a missing credential aborts the whole
//!    batch since every document would fail identically.
//!
//! After that, every failure is per-document data: rendering, the model
//! call, and parsing each map to one [`ExtractionFailure`] entry and
//! processing continues with the next document. Documents are processed
//! strictly sequentially — the batch cap, not concurrency, is the
//! protection against overlong calls — and the core holds no state across
//! calls.

use crate::config::{ExtractionConfig, CREDENTIAL_ENV_VAR};
use crate::error::{DocumentError, DonationError};
use crate::output::{BatchReport, BatchStats, DocumentOutcome, ExtractionFailure};
use crate::pipeline::{encode, input, llm, parse, render};
use crate::progress::ProgressCallback;
use edgequake_llm::{ImageData, LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Process one batch of document references.
///
/// # Returns
/// `Ok(BatchReport)` with one [`DocumentOutcome`] per input reference, in
/// input order, even when every document failed.
///
/// # Errors
/// Returns `Err(DonationError)` only for batch-level preconditions:
/// - more than `config.max_batch_size` references
/// - missing/unconfigured credential
pub async fn extract_batch(
    file_paths: &[String],
    config: &ExtractionConfig,
) -> Result<BatchReport, DonationError> {
    extract_batch_with_progress(file_paths, config, None).await
}

/// [`extract_batch`] with optional per-document progress events.
pub async fn extract_batch_with_progress(
    file_paths: &[String],
    config: &ExtractionConfig,
    progress: Option<ProgressCallback>,
) -> Result<BatchReport, DonationError> {
    let total_start = Instant::now();

    if file_paths.len() > config.max_batch_size {
        return Err(DonationError::BatchTooLarge {
            given: file_paths.len(),
            max: config.max_batch_size,
        });
    }

    // One provider for the whole batch; a missing credential surfaces here,
    // before any rendering, even when the input list is empty.
    let provider = resolve_provider(config)?;

    let total = file_paths.len();
    info!("Starting batch: {} documents", total);
    if let Some(ref cb) = progress {
        cb.on_batch_start(total);
    }

    let mut outcomes = Vec::with_capacity(total);
    let mut render_duration_ms = 0u64;
    let mut llm_duration_ms = 0u64;

    for (i, reference) in file_paths.iter().enumerate() {
        let filename = input::display_name(reference);
        debug!("Processing {} ({}/{})", filename, i + 1, total);
        if let Some(ref cb) = progress {
            cb.on_document_start(i + 1, total, &filename);
        }

        let timings = process_document(&provider, reference, &filename, config).await;
        render_duration_ms += timings.render_ms;
        llm_duration_ms += timings.llm_ms;

        match timings.result {
            Ok(record) => {
                if let Some(ref cb) = progress {
                    cb.on_document_complete(i + 1, total, &filename);
                }
                outcomes.push(DocumentOutcome::Record(record));
            }
            Err(err) => {
                warn!("{}: {}", filename, err);
                if let Some(ref cb) = progress {
                    cb.on_document_error(i + 1, total, &filename, &err.to_string());
                }
                outcomes.push(DocumentOutcome::Failed(ExtractionFailure::from_error(
                    &filename, &err,
                )));
            }
        }
    }

    let extracted = outcomes.iter().filter(|o| o.is_record()).count();
    let stats = BatchStats {
        documents: total,
        extracted,
        failed: total - extracted,
        render_duration_ms,
        llm_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Batch complete: {}/{} records in {}ms",
        extracted, total, stats.total_duration_ms
    );
    if let Some(ref cb) = progress {
        cb.on_batch_complete(total, extracted);
    }

    Ok(BatchReport { outcomes, stats })
}

/// Synchronous wrapper around [`extract_batch`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_batch_sync(
    file_paths: &[String],
    config: &ExtractionConfig,
) -> Result<BatchReport, DonationError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| DonationError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_batch(file_paths, config))
}

/// Per-document result plus stage timings for the batch stats.
struct DocumentTimings {
    result: Result<crate::output::DonationRecord, DocumentError>,
    render_ms: u64,
    llm_ms: u64,
}

/// Run one document through resolve → render → encode → model → parse.
///
/// Any stage failure becomes this document's outcome; the batch moves on.
async fn process_document(
    provider: &Arc<dyn LLMProvider>,
    reference: &str,
    filename: &str,
    config: &ExtractionConfig,
) -> DocumentTimings {
    let mut timings = DocumentTimings {
        result: Err(DocumentError::Render {
            detail: String::new(),
        }),
        render_ms: 0,
        llm_ms: 0,
    };

    let render_start = Instant::now();
    let pages = match resolve_and_render(reference, config).await {
        Ok(pages) => pages,
        Err(e) => {
            timings.render_ms = render_start.elapsed().as_millis() as u64;
            timings.result = Err(e);
            return timings;
        }
    };
    timings.render_ms = render_start.elapsed().as_millis() as u64;

    let llm_start = Instant::now();
    let raw = match llm::request_extraction(provider, filename, pages, config).await {
        Ok(raw) => raw,
        Err(e) => {
            timings.llm_ms = llm_start.elapsed().as_millis() as u64;
            timings.result = Err(e);
            return timings;
        }
    };
    timings.llm_ms = llm_start.elapsed().as_millis() as u64;

    timings.result = parse::parse_response(filename, &raw);
    timings
}

/// Resolve the reference and produce normalized, encoded pages.
async fn resolve_and_render(
    reference: &str,
    config: &ExtractionConfig,
) -> Result<Vec<ImageData>, DocumentError> {
    let resolved = input::resolve_input(reference, config.download_timeout_secs).await?;
    let images = render::render_document(resolved.path(), config).await?;

    images
        .iter()
        .map(|img| encode::encode_page(img, config))
        .collect()
}

/// Resolve the vision provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`) — the caller constructed
///    and configured the provider entirely; no ambient credential is
///    consulted. This is the seam tests and embedders use.
///
/// 2. **Named provider + model** (`config.provider_name`) — handed to
///    [`ProviderFactory::create_llm_provider`], which reads that
///    provider's own API-key variable from the environment.
///
/// 3. **Default** — the openrouter credential (`OPENROUTER_API_KEY`) is
///    checked explicitly; when present the openrouter provider is built
///    with the configured model. Its absence is the batch-level
///    configuration error the tool contract requires, not a crash.
fn resolve_provider(config: &ExtractionConfig) -> Result<Arc<dyn LLMProvider>, DonationError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        return create_vision_provider(name, config.model_or_default());
    }

    match std::env::var(CREDENTIAL_ENV_VAR) {
        Ok(key) if !key.is_empty() => {
            create_vision_provider("openrouter", config.model_or_default())
        }
        _ => Err(DonationError::MissingCredential {
            var: CREDENTIAL_ENV_VAR,
        }),
    }
}

/// Instantiate a named provider with the given model.
fn create_vision_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, DonationError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DonationError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}
