//! Line-per-link file store.

use std::collections::HashSet;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs::{self, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt};
use tracing::debug;

use crate::error::StoreError;
use crate::traits::LinkStore;

/// Stores one link per line in a plain text file.
///
/// Appends open the file in append mode, so existing lines are never
/// rewritten. A missing file is treated as an empty store.
#[derive(Debug, Clone)]
pub struct FileLinkStore {
    path: PathBuf,
}

impl FileLinkStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }

    /// Whether the existing file ends without a trailing newline.
    async fn needs_separator(&self) -> Result<bool, std::io::Error> {
        let mut file = match fs::File::open(&self.path).await {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if file.metadata().await?.len() == 0 {
            return Ok(false);
        }
        file.seek(SeekFrom::End(-1)).await?;
        let mut last = [0u8; 1];
        file.read_exact(&mut last).await?;
        Ok(last[0] != b'\n')
    }
}

#[async_trait]
impl LinkStore for FileLinkStore {
    async fn load_all(&self) -> Result<HashSet<String>, StoreError> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "link store does not exist yet");
                return Ok(HashSet::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        Ok(content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    async fn append_links(&self, links: &[String]) -> Result<(), StoreError> {
        if links.is_empty() {
            return Ok(());
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_err(e))?;
        }

        let mut buf = String::new();
        if self.needs_separator().await.map_err(|e| self.write_err(e))? {
            buf.push('\n');
        }
        for link in links {
            buf.push_str(link);
            buf.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| self.write_err(e))?;
        file.write_all(buf.as_bytes())
            .await
            .map_err(|e| self.write_err(e))?;
        file.flush().await.map_err(|e| self.write_err(e))?;

        debug!(path = %self.path.display(), count = links.len(), "appended links");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("file:{}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn links(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLinkStore::new(dir.path().join("jobs.txt"));
        assert!(store.load_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appends_accumulate_across_calls() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLinkStore::new(dir.path().join("jobs.txt"));

        store.append_links(&links(&["https://a", "https://b"])).await.unwrap();
        store.append_links(&links(&["https://c"])).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert_eq!(loaded.len(), 3);
        assert!(loaded.contains("https://a"));
        assert!(loaded.contains("https://c"));

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, "https://a\nhttps://b\nhttps://c\n");
    }

    #[tokio::test]
    async fn append_after_unterminated_line_keeps_lines_separate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.txt");
        std::fs::write(&path, "https://old").unwrap();

        let store = FileLinkStore::new(&path);
        store.append_links(&links(&["https://new"])).await.unwrap();

        let loaded = store.load_all().await.unwrap();
        assert!(loaded.contains("https://old"));
        assert!(loaded.contains("https://new"));
    }

    #[tokio::test]
    async fn blank_lines_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("jobs.txt");
        std::fs::write(&path, "a\n\n  \nb\n").unwrap();

        let loaded = FileLinkStore::new(&path).load_all().await.unwrap();
        assert_eq!(loaded.len(), 2);
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileLinkStore::new(dir.path().join("state/nested/jobs.txt"));
        store.append_links(&links(&["x"])).await.unwrap();
        assert!(store.load_all().await.unwrap().contains("x"));
    }

    #[tokio::test]
    async fn unreadable_path_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a file.
        let store = FileLinkStore::new(dir.path());
        let err = store.load_all().await.unwrap_err();
        assert!(matches!(err, StoreError::Read { .. }));
    }
}
