//! Inlining of local images as `data:` URIs.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use base64::Engine;
use base64::prelude::BASE64_STANDARD;

/// Reads local images relative to a base directory, caching encoded results.
#[derive(Debug)]
pub(crate) struct DataUriResolver {
    base: PathBuf,
    cache: HashMap<String, String>,
}

impl DataUriResolver {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self {
            base: base.into(),
            cache: HashMap::new(),
        }
    }

    /// Encode the image at `target` (relative to the base unless absolute).
    pub fn resolve(&mut self, target: &str) -> std::io::Result<String> {
        if let Some(uri) = self.cache.get(target) {
            return Ok(uri.clone());
        }
        let path = Path::new(target);
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base.join(path)
        };
        let bytes = std::fs::read(&path)?;
        let uri = format!(
            "data:{};base64,{}",
            mime_type(target),
            BASE64_STANDARD.encode(&bytes)
        );
        self.cache.insert(target.to_owned(), uri.clone());
        Ok(uri)
    }
}

/// Image MIME type guessed from the file extension.
fn mime_type(target: &str) -> String {
    let Some(extension) = Path::new(target).extension().and_then(|e| e.to_str()) else {
        return "application/octet-stream".to_owned();
    };
    match extension.to_ascii_lowercase().as_str() {
        "svg" => "image/svg+xml".to_owned(),
        "jpg" | "jpeg" => "image/jpeg".to_owned(),
        "ico" => "image/x-icon".to_owned(),
        other => format!("image/{other}"),
    }
}

/// Targets that are never read from disk.
pub(crate) fn is_remote(target: &str) -> bool {
    target.starts_with("data:") || target.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_local_image() {
        let temp_dir = tempfile::tempdir().unwrap();
        std::fs::write(temp_dir.path().join("dot.png"), b"png").unwrap();

        let mut resolver = DataUriResolver::new(temp_dir.path());
        assert_eq!(resolver.resolve("dot.png").unwrap(), "data:image/png;base64,cG5n");
    }

    #[test]
    fn test_resolve_is_cached() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("a.svg");
        std::fs::write(&path, b"<svg/>").unwrap();

        let mut resolver = DataUriResolver::new(temp_dir.path());
        let first = resolver.resolve("a.svg").unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(resolver.resolve("a.svg").unwrap(), first);
        assert!(first.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_missing_image_fails() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut resolver = DataUriResolver::new(temp_dir.path());
        assert!(resolver.resolve("missing.png").is_err());
    }

    #[test]
    fn test_mime_type() {
        assert_eq!(mime_type("photo.JPG"), "image/jpeg");
        assert_eq!(mime_type("icon.gif"), "image/gif");
        assert_eq!(mime_type("blob"), "application/octet-stream");
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.com/a.png"));
        assert!(is_remote("data:image/png;base64,AA=="));
        assert!(!is_remote("images/a.png"));
    }
}
