//! Output: name the PDF after its fragment and put it on disk atomically.

use crate::error::Help2PdfError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Derive the PDF file name from the fragment file name.
///
/// Everything after the last `.` is swapped for `pdf` (`foo.xml` →
/// `foo.pdf`, `.xml` → `.pdf`); a name without a dot gets `.pdf` appended.
pub fn output_file_name(fragment: &str) -> String {
    match fragment.rfind('.') {
        Some(dot) => format!("{}pdf", &fragment[..=dot]),
        None => format!("{fragment}.pdf"),
    }
}

/// Write `pdf` to `dir/name` via a temp file + rename, so a failed write
/// never leaves a truncated PDF behind.
pub async fn write_pdf(dir: &Path, name: &str, pdf: &[u8]) -> Result<PathBuf, Help2PdfError> {
    let path = dir.join(name);
    let write_failed = |source: std::io::Error| Help2PdfError::OutputWriteFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_failed)?;

    let tmp_path = dir.join(format!(".{name}.tmp"));
    if let Err(e) = tokio::fs::write(&tmp_path, pdf).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, &path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_failed(e));
    }

    debug!("Wrote {} ({} bytes)", path.display(), pdf.len());
    Ok(path)
}
