//! Result types returned by a finished conversion.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Summary of one successful fragment → PDF conversion.
///
/// Serialisable so the CLI can print it with `--json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionReport {
    /// The fragment file that was read.
    pub fragment: PathBuf,
    /// Where the PDF was written.
    pub output: PathBuf,
    /// `file://` URI relative resources were resolved against.
    pub base_uri: String,
    /// Size of the wrapped HTML document handed to the engine.
    pub html_bytes: usize,
    /// Size of the PDF written to disk.
    pub pdf_bytes: usize,
    /// Wall-clock time spent inside the rendering engine.
    pub render_duration_ms: u64,
    /// Wall-clock time for the whole conversion.
    pub total_duration_ms: u64,
}
