//! Progress-callback trait for conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::ConversionConfigBuilder::progress_callback`] to observe a
//! conversion as it moves through its stages. The final event is always
//! exactly one of [`on_conversion_complete`] or [`on_conversion_error`], and
//! it fires before `convert` returns, so the caller never has to wait on
//! anything beyond the future it already awaits.
//!
//! [`on_conversion_complete`]: ConversionProgressCallback::on_conversion_complete
//! [`on_conversion_error`]: ConversionProgressCallback::on_conversion_error
//!
//! # Example
//!
//! ```rust
//! use help2pdf::{ConversionConfig, ConversionProgressCallback, ConversionReport};
//! use std::sync::Arc;
//!
//! struct Announce;
//!
//! impl ConversionProgressCallback for Announce {
//!     fn on_conversion_complete(&self, report: &ConversionReport) {
//!         eprintln!("wrote {}", report.output.display());
//!     }
//! }
//!
//! let config = ConversionConfig::builder()
//!     .progress_callback(Arc::new(Announce) as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use crate::error::Help2PdfError;
use crate::output::ConversionReport;
use std::path::Path;
use std::sync::Arc;

/// Called by the conversion pipeline as it progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Implementations must be `Send + Sync`: rendering
/// happens on Tokio's blocking pool and the config is shared across tasks.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, before the fragment is read.
    fn on_conversion_start(&self, fragment: &Path) {
        let _ = fragment;
    }

    /// Called after the fragment was read.
    ///
    /// # Arguments
    /// * `bytes` — size of the fragment in bytes
    fn on_fragment_read(&self, bytes: usize) {
        let _ = bytes;
    }

    /// Called just before the wrapped document is handed to the engine.
    fn on_render_start(&self, html_len: usize) {
        let _ = html_len;
    }

    /// Called when the engine returned a PDF.
    fn on_render_complete(&self, pdf_len: usize) {
        let _ = pdf_len;
    }

    /// Called once the PDF is on disk.
    fn on_conversion_complete(&self, report: &ConversionReport) {
        let _ = report;
    }

    /// Called once if any stage failed. No further events follow.
    fn on_conversion_error(&self, error: &Help2PdfError) {
        let _ = error;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::ConversionConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        read_bytes: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_conversion_start(&self, _fragment: &Path) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_fragment_read(&self, bytes: usize) {
            self.read_bytes.store(bytes, Ordering::SeqCst);
        }

        fn on_conversion_complete(&self, _report: &ConversionReport) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_conversion_error(&self, _error: &Help2PdfError) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start(Path::new("topic.xml"));
        cb.on_fragment_read(10);
        cb.on_render_start(200);
        cb.on_render_complete(4096);
        cb.on_conversion_error(&Help2PdfError::RenderTimeout { secs: 1 });
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_conversion_start(Path::new("topic.xml"));
        tracker.on_fragment_read(321);
        tracker.on_conversion_error(&Help2PdfError::FragmentNotFound {
            path: PathBuf::from("topic.xml"),
        });

        assert_eq!(tracker.starts.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.read_bytes.load(Ordering::SeqCst), 321);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 0);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_render_start(10);
        cb.on_render_complete(20);
    }
}
