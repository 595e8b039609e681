//! Pipeline stages for document-to-record extraction.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap implementations (e.g. switch rendering backend) without touching
//! other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ render ──▶ encode ──▶ llm ──▶ parse
//! (path/URL)  (pdfium)  (jpeg+b64) (VLM)  (record)
//! ```
//!
//! 1. [`input`]  — canonicalise the document reference to a local file
//! 2. [`render`] — rasterise up to `max_pages` pages; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`encode`] — normalize each page (downscale, grayscale, JPEG) and
//!    base64-wrap it for the multimodal request body
//! 4. [`llm`]    — drive the vision-model call with retry/backoff; the only
//!    stage with network I/O
//! 5. [`parse`]  — recover a [`crate::output::DonationRecord`] from the
//!    untrusted model reply, with a typed fallback outcome

pub mod encode;
pub mod input;
pub mod llm;
pub mod parse;
pub mod render;
