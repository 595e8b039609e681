//! Progress-callback trait for per-document batch events.
//!
//! Inject an `Arc<dyn BatchProgressCallback>` into
//! [`crate::batch::extract_batch_with_progress`] to receive events as the
//! orchestrator works through a batch.
//!
//! # Why callbacks instead of channels?
//!
//! The callback approach is the least-invasive integration point: callers
//! can forward events to a terminal progress bar, a log sink, or a
//! host-protocol notification without the library knowing anything about
//! how the host application communicates. Documents are processed strictly
//! sequentially, but the trait is still `Send + Sync` so one callback can
//! be shared across consecutive batch calls from different tasks.

use std::sync::Arc;

/// Called by the orchestrator as it processes each document in a batch.
///
/// All methods have default no-op implementations so callers only override
/// what they care about.
pub trait BatchProgressCallback: Send + Sync {
    /// Called once after the batch passes its preconditions.
    fn on_batch_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called just before a document enters the pipeline.
    ///
    /// `index` is 1-based position within the batch.
    fn on_document_start(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called when a document yields a record.
    fn on_document_complete(&self, index: usize, total: usize, filename: &str) {
        let _ = (index, total, filename);
    }

    /// Called when a document yields a failure entry.
    fn on_document_error(&self, index: usize, total: usize, filename: &str, error: &str) {
        let _ = (index, total, filename, error);
    }

    /// Called once after every document has been attempted.
    fn on_batch_complete(&self, total: usize, extracted: usize) {
        let _ = (total, extracted);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl BatchProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback handle.
pub type ProgressCallback = Arc<dyn BatchProgressCallback>;
