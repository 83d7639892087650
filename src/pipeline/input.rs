//! Input resolution: read the fragment and pin down the base directory.
//!
//! Both are resolved against explicit paths from the config. The process
//! working directory is never changed, so a pending render can never observe
//! a different directory than the one it was configured with.

use crate::error::Help2PdfError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;
use url::Url;

/// Read the whole fragment as UTF-8 text.
pub async fn read_fragment(path: &Path) -> Result<String, Help2PdfError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => Help2PdfError::FragmentNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => Help2PdfError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Help2PdfError::ReadFailed {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    let text = String::from_utf8(bytes).map_err(|e| Help2PdfError::ReadFailed {
        path: path.to_path_buf(),
        source: std::io::Error::new(ErrorKind::InvalidData, e),
    })?;

    debug!("Read fragment {} ({} bytes)", path.display(), text.len());
    Ok(text)
}

/// Canonicalise `dir` and express it as a `file://` URI with a trailing
/// slash, so relative hrefs resolve *inside* the directory.
pub async fn resolve_base_uri(dir: &Path) -> Result<String, Help2PdfError> {
    let canonical = tokio::fs::canonicalize(dir)
        .await
        .map_err(|e| Help2PdfError::BaseDirUnavailable {
            path: dir.to_path_buf(),
            source: e,
        })?;

    let url = Url::from_directory_path(&canonical).map_err(|_| {
        Help2PdfError::Internal(format!(
            "cannot express '{}' as a file URI",
            canonical.display()
        ))
    })?;

    Ok(url.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_utf8_fragment_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("topic.xml");
        std::fs::write(&path, "<div>µ-counts ≥ 5</div>\n").unwrap();

        let text = read_fragment(&path).await.unwrap();
        assert_eq!(text, "<div>µ-counts ≥ 5</div>\n");
    }

    #[tokio::test]
    async fn missing_fragment_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_fragment(&dir.path().join("nope.xml")).await.unwrap_err();
        assert!(matches!(err, Help2PdfError::FragmentNotFound { .. }));
    }

    #[tokio::test]
    async fn invalid_utf8_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.xml");
        std::fs::write(&path, [0x3c, 0x70, 0x3e, 0xe9, 0xff]).unwrap();
        let err = read_fragment(&path).await.unwrap_err();
        assert!(matches!(err, Help2PdfError::ReadFailed { .. }));
    }

    #[tokio::test]
    async fn base_uri_is_absolute_with_trailing_slash() {
        let dir = tempfile::tempdir().unwrap();
        let uri = resolve_base_uri(dir.path()).await.unwrap();
        assert!(uri.starts_with("file:///"), "got {uri}");
        assert!(uri.ends_with('/'), "got {uri}");
    }

    #[tokio::test]
    async fn base_uri_of_missing_dir_fails() {
        let err = resolve_base_uri(Path::new("/definitely/not/here"))
            .await
            .unwrap_err();
        assert!(matches!(err, Help2PdfError::BaseDirUnavailable { .. }));
    }
}
