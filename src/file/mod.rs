//! JSON-on-filesystem backend: one document per key under a root directory

mod path;
mod read_cache;

pub use path::{document_path, process_root, DOCUMENT_EXTENSION};

use async_trait::async_trait;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::backend::CacheBackend;
use crate::config::{CacheConfig, FILE_CACHE};
use crate::error::{Error, Issues, Result};
use crate::value::CacheValue;

/// File backend
pub struct FileBackend {
  default_root: PathBuf,
}

impl FileBackend {
  /// `default_root` is used whenever an operation's root is empty
  pub fn new(default_root: impl AsRef<Path>) -> Self {
    Self {
      default_root: default_root.as_ref().to_path_buf(),
    }
  }

  pub fn default_root(&self) -> &Path {
    &self.default_root
  }

  fn locate(&self, key: &str, root: &str) -> Result<PathBuf> {
    document_path(&process_root(root, &self.default_root)?, key)
  }

  /// Read and parse the document for `key`
  pub async fn read(&self, key: &str, root: &str) -> Result<Value> {
    if key.is_empty() {
      return Err(Error::validation("file get missing parameter: key"));
    }
    let path = self.locate(key, root)?;
    let miss = || Error::cache(format!("Could not find cached file with key \"{}\"", key), key);

    let metadata = fs::metadata(&path).await.map_err(|_| miss())?;
    if let Some(value) = read_cache::lookup(&path, &metadata) {
      tracing::trace!("read cache hit for {}", path.display());
      return Ok(value);
    }

    let content = fs::read_to_string(&path).await.map_err(|_| miss())?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
      Error::cache(
        format!("Could not parse cached file with key \"{}\": {}", key, e),
        key,
      )
    })?;

    read_cache::store(path, &metadata, value.clone());
    Ok(value)
  }

  /// Write `data` as the document for `key`. Strings are written verbatim,
  /// everything else as JSON.
  pub async fn write(&self, key: &str, data: &Value, root: &str, overwrite: bool) -> Result<()> {
    let mut issues = Issues::new();
    issues.check(!key.is_empty(), "file set missing parameter: key");
    issues.check(!data.is_null(), "file set missing parameter: data");
    issues.into_result()?;

    let content = match data {
      Value::String(s) => s.clone(),
      other => serde_json::to_string(other).map_err(|e| {
        Error::cache_with_data(
          format!("Could not serialize data for key \"{}\": {}", key, e),
          key,
          other.clone(),
        )
      })?,
    };

    let path = self.locate(key, root)?;

    // Not atomic with the write below; concurrent writers to one key may race.
    if !overwrite && matches!(fs::try_exists(&path).await, Ok(true)) {
      return Err(Error::cache_with_data(
        format!(
          "Attempting to overwrite key \"{}\" with protections enabled",
          key
        ),
        key,
        data.clone(),
      ));
    }

    if let Some(parent) = path.parent() {
      fs::create_dir_all(parent).await?;
    }

    let written = fs::write(&path, content).await;
    read_cache::invalidate(&path);
    written.map_err(|e| {
      Error::cache_with_data(
        format!("Error saving \"{}\" to file: {}", key, e),
        key,
        data.clone(),
      )
    })
  }

  /// Delete the document for `key`, or every file under the root when `key`
  /// is empty. Deleting a single absent document fails with the OS not-found error.
  pub async fn remove(&self, key: &str, root: &str) -> Result<()> {
    if !key.is_empty() {
      let path = self.locate(key, root)?;
      let removed = fs::remove_file(&path).await;
      read_cache::invalidate(&path);
      return Ok(removed?);
    }

    let root = process_root(root, &self.default_root)?;
    let removed = remove_files_under(&root).await;
    read_cache::invalidate_under(&root);
    let count = removed?;
    tracing::debug!("removed {} cached files under {}", count, root.display());
    Ok(())
  }
}

/// Delete every non-directory entry below `root`, keeping the directories.
/// A missing root holds nothing to delete.
async fn remove_files_under(root: &Path) -> Result<usize> {
  match fs::metadata(root).await {
    Ok(_) => {}
    Err(e) if e.kind() == ErrorKind::NotFound => return Ok(0),
    Err(e) => return Err(e.into()),
  }

  let mut removed = 0;
  let mut pending = vec![root.to_path_buf()];
  while let Some(dir) = pending.pop() {
    let mut entries = fs::read_dir(&dir).await?;
    while let Some(entry) = entries.next_entry().await? {
      if entry.file_type().await?.is_dir() {
        pending.push(entry.path());
      } else {
        fs::remove_file(entry.path()).await?;
        removed += 1;
      }
    }
  }
  Ok(removed)
}

#[async_trait]
impl CacheBackend for FileBackend {
  async fn get(&self, key: &str, config: &CacheConfig) -> Result<CacheValue> {
    tracing::debug!("file get \"{}\"", key);
    let value = FileBackend::read(self, key, &config.file.root).await?;
    Ok(CacheValue::new(value))
  }

  async fn set(&self, key: &str, data: &CacheValue, config: &CacheConfig) -> Result<()> {
    tracing::debug!("file set \"{}\"", key);
    let data = data.snapshot();
    FileBackend::write(
      self,
      key,
      &data,
      &config.file.root,
      config.general.overwrite,
    )
    .await
  }

  async fn clear(&self, key: &str, config: &CacheConfig) -> Result<()> {
    tracing::debug!("file clear \"{}\"", key);
    FileBackend::remove(self, key, &config.file.root).await
  }

  fn name(&self) -> &'static str {
    FILE_CACHE
  }

  fn validate_key(&self, key: &str) -> Result<()> {
    document_path(&self.default_root, key).map(|_| ())
  }
}
