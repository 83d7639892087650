//! Error types for the help2pdf library.
//!
//! Every failure a conversion can hit is a variant of [`Help2PdfError`],
//! grouped by the pipeline stage that produces it: reading the fragment,
//! rendering it, or writing the PDF. The library always returns these as
//! `Err(..)`; deciding whether a failure should change the process exit
//! status is left to the caller (the CLI logs and carries on unless
//! `--strict` is given).

use std::path::PathBuf;
use thiserror::Error;

/// All errors returned by the help2pdf library.
#[derive(Debug, Error)]
pub enum Help2PdfError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Fragment file was not found at the given path.
    #[error("Help fragment not found: '{path}'\nCheck --root and --resource-dir.")]
    FragmentNotFound { path: PathBuf },

    /// Process does not have read permission on the fragment.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The fragment exists but could not be read as UTF-8 text.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is already a full HTML document, not a body fragment.
    #[error("'{path}' is a complete HTML document ({found}), expected a body fragment")]
    NotAFragment { path: PathBuf, found: &'static str },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// No browser executable could be found to render with.
    #[error("Rendering engine not available: {0}")]
    EngineNotFound(#[from] chrome_locate::ChromeLocateError),

    /// The browser was found but could not be started or connected to.
    #[error("Failed to launch '{path}': {reason}\nIn containers running as root, try --no-sandbox.")]
    BrowserLaunchFailed { path: PathBuf, reason: String },

    /// The engine reported a failure while loading or printing the page.
    #[error("Rendering failed: {0}")]
    RenderFailed(String),

    /// The engine did not finish within the configured time.
    #[error("Rendering timed out after {secs}s\nIncrease --timeout.")]
    RenderTimeout { secs: u64 },

    /// The engine returned bytes that are not a PDF.
    #[error("Rendering engine returned non-PDF output; first bytes: {magic:?}")]
    NotAPdf { magic: Vec<u8> },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write the output PDF.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A page dimension could not be parsed.
    #[error("Invalid length '{value}': expected a positive number with unit in, cm, mm, px or pt")]
    InvalidLength { value: String },

    /// The base directory for relative resources does not exist.
    #[error("Base directory '{path}' is not accessible: {source}")]
    BaseDirUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Help2PdfError {
    /// Which pipeline stage produced this error.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::FragmentNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::ReadFailed { .. }
            | Self::NotAFragment { .. } => "input",
            Self::EngineNotFound(_)
            | Self::BrowserLaunchFailed { .. }
            | Self::RenderFailed(_)
            | Self::RenderTimeout { .. }
            | Self::NotAPdf { .. } => "render",
            Self::OutputWriteFailed { .. } => "output",
            Self::InvalidConfig(_) | Self::InvalidLength { .. } | Self::BaseDirUnavailable { .. } => {
                "config"
            }
            Self::Internal(_) => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_not_found_display() {
        let e = Help2PdfError::FragmentNotFound {
            path: PathBuf::from("static_text/peak_manager_help.xml"),
        };
        let msg = e.to_string();
        assert!(msg.contains("peak_manager_help.xml"), "got: {msg}");
        assert_eq!(e.stage(), "input");
    }

    #[test]
    fn timeout_display() {
        let e = Help2PdfError::RenderTimeout { secs: 30 };
        assert!(e.to_string().contains("30s"));
        assert_eq!(e.stage(), "render");
    }

    #[test]
    fn invalid_length_display() {
        let e = Help2PdfError::InvalidLength {
            value: "ten inches".into(),
        };
        assert!(e.to_string().contains("ten inches"));
        assert_eq!(e.stage(), "config");
    }

    #[test]
    fn output_write_keeps_source() {
        use std::error::Error as _;
        let e = Help2PdfError::OutputWriteFailed {
            path: PathBuf::from("/ro/out.pdf"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        };
        assert!(e.source().is_some());
        assert_eq!(e.stage(), "output");
    }
}
