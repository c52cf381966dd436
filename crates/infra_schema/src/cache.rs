//! On-disk schema cache
//!
//! Plain files under the cache directory. Every I/O failure here is logged
//! and treated as a cache miss.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

/// Cached schema text read back from disk
#[derive(Debug, Clone)]
pub struct CachedSchema {
    pub text: String,
    /// Time since the file was last written
    pub age: Duration,
}

impl CachedSchema {
    pub fn is_fresh(&self, ttl: Duration) -> bool {
        self.age < ttl
    }
}

/// Reads a cached schema file, if present and readable
pub async fn read(path: &Path) -> Option<CachedSchema> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot stat cached schema");
            return None;
        }
    };
    let age = metadata
        .modified()
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .unwrap_or_default();

    match tokio::fs::read_to_string(path).await {
        Ok(text) => {
            debug!(path = %path.display(), age_secs = age.as_secs(), "Read cached schema");
            Some(CachedSchema { text, age })
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot read cached schema");
            None
        }
    }
}

/// Writes schema text, creating the cache directory; returns whether it succeeded
pub async fn write(path: &Path, text: &str) -> bool {
    if let Some(dir) = path.parent() {
        if let Err(e) = tokio::fs::create_dir_all(dir).await {
            warn!(dir = %dir.display(), error = %e, "Cannot create schema cache directory");
            return false;
        }
    }
    match tokio::fs::write(path, text).await {
        Ok(()) => {
            debug!(path = %path.display(), bytes = text.len(), "Schema written to cache");
            true
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Cannot write schema to cache");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("tiss_3.05.00.xsd");

        assert!(read(&path).await.is_none());
        assert!(write(&path, "<xs:schema/>").await);

        let cached = read(&path).await.unwrap();
        assert_eq!(cached.text, "<xs:schema/>");
        assert!(cached.is_fresh(Duration::from_secs(60)));
        assert!(!cached.is_fresh(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_write_into_a_file_fails_quietly() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().join("tiss.xsd");
        assert!(!write(&path, "<xs:schema/>").await);
    }
}
