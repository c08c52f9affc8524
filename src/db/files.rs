use crate::error::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Owns the bytes of files a course references (currently its PDFs).
#[async_trait]
pub trait FileStore: Send + Sync {
    /// Copies `src` into `dest_dir` under a unique name and returns the new path.
    async fn copy_file(&self, src: &Path, dest_dir: &Path) -> Result<PathBuf>;

    /// Removes `path`. A file that is already gone is not an error.
    async fn delete_file(&self, path: &Path) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct LocalFileStore;

/// Prefix separating the copy timestamp from the original file name.
pub const TIMESTAMP_SEPARATOR: char = '_';

pub fn timestamped_file_name(original: &str, now_millis: i64) -> String {
    format!("{}{}{}", now_millis, TIMESTAMP_SEPARATOR, original)
}

/// Inverse of [`timestamped_file_name`]; names without a numeric prefix
/// are returned unchanged.
pub fn strip_timestamp_prefix(file_name: &str) -> &str {
    match file_name.split_once(TIMESTAMP_SEPARATOR) {
        Some((prefix, rest))
            if !prefix.is_empty() && !rest.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) =>
        {
            rest
        }
        _ => file_name,
    }
}

#[async_trait]
impl FileStore for LocalFileStore {
    async fn copy_file(&self, src: &Path, dest_dir: &Path) -> Result<PathBuf> {
        let file_name = src
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| Error::Validation(format!("not a file path: {}", src.display())))?;

        tokio::fs::create_dir_all(dest_dir).await?;

        let mut now = chrono::Utc::now().timestamp_millis();
        let mut dest = dest_dir.join(timestamped_file_name(&file_name, now));
        while tokio::fs::try_exists(&dest).await? {
            now += 1;
            dest = dest_dir.join(timestamped_file_name(&file_name, now));
        }

        tokio::fs::copy(src, &dest).await?;
        Ok(dest)
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
