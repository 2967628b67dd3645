//! # docbundle
//!
//! Turns an archive of mixed documents into one merged output: a single PDF,
//! or a single delimited plain-text file.
//!
//! ## How a run works
//!
//! 1. The archive is fetched (URL), copied (local path) or written (upload)
//!    into a private scratch directory.
//! 2. The root archive is expanded; a failure here ends the run.
//! 3. Nested archives (ZIP, RAR, TAR, TAR.GZ) are expanded in place until
//!    none remain. A bad nested archive is logged and skipped.
//! 4. Every eligible file (PDF, images, DOC/DOCX/RTF/ODT/TXT) is normalized
//!    to the run's output mode. One broken file never stops its siblings.
//! 5. The artifacts are merged into `final.pdf` or `final.txt`.
//!
//! Progress is published as [`Event`]s on a broadcast channel.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docbundle::{Config, DocumentExtractor, OutputMode, Source};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let extractor = DocumentExtractor::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = extractor.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let summary = extractor
//!         .extract(Source::Path("bundle.zip".into()), OutputMode::Pdf)
//!         .await?;
//!     println!("merged output at {}", summary.output_path.display());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Merging artifacts into the final output
pub mod aggregation;
/// REST API module
pub mod api;
/// Configuration types
pub mod config;
/// Per-file format normalization and external tools
pub mod conversion;
/// Error types
pub mod error;
/// Archive extraction
pub mod extraction;
/// File classification
pub mod inspector;
/// Run orchestration
pub mod pipeline;
/// Task tracking service
pub mod service;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::Config;
pub use conversion::{OcrEngine, OfficeConverter, PageRasterizer, Toolchain};
pub use error::{
    ApiError, ConversionError, Error, ErrorDetail, ExtractionError, PipelineError, Result,
    TaskError, ToHttpStatus,
};
pub use pipeline::{Pipeline, RunSummary, Source};
pub use service::{DocumentExtractor, TaskStore};
pub use types::{
    Capabilities, Event, OutputMode, RunStats, Stage, TaskId, TaskRecord, TaskStatus,
};
