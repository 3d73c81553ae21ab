//! In-process memory backend

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::backend::{CacheBackend, WriteOptions};
use crate::config::{CacheConfig, MEMORY_CACHE};
use crate::error::{Error, Issues, Result};
use crate::value::CacheValue;

static SHARED_TABLE: OnceLock<MemoryTable> = OnceLock::new();

/// Key to value table. Cloning the table shares it.
#[derive(Clone, Default)]
pub struct MemoryTable {
  entries: Arc<RwLock<HashMap<String, CacheValue>>>,
}

impl MemoryTable {
  /// Private, empty table
  pub fn new() -> Self {
    Self::default()
  }

  /// The process-wide table, created on first request
  pub fn shared() -> Self {
    SHARED_TABLE.get_or_init(MemoryTable::new).clone()
  }

  /// Look up `key`. With `mutable` the stored handle itself is returned,
  /// otherwise a deep copy.
  pub fn get(&self, key: &str, mutable: bool) -> Result<CacheValue> {
    if key.is_empty() {
      return Err(Error::validation("memory get missing parameter: key"));
    }

    let entries = self.entries.read();
    let value = entries
      .get(key)
      .ok_or_else(|| Error::cache(format!("Key \"{}\" not present in memory", key), key))?;

    Ok(if mutable {
      value.clone()
    } else {
      value.deep_clone()
    })
  }

  /// Store `data` under `key`
  pub fn set(&self, key: &str, data: &CacheValue, opts: WriteOptions) -> Result<()> {
    let mut issues = Issues::new();
    issues.check(!key.is_empty(), "memory set missing parameter: key");
    issues.check(!data.is_missing(), "memory set missing parameter: data");
    issues.into_result()?;

    let mut entries = self.entries.write();
    if !opts.overwrite && entries.contains_key(key) {
      return Err(Error::cache_with_data(
        format!("Refusing to overwrite key \"{}\" in memory", key),
        key,
        data.snapshot(),
      ));
    }

    let stored = if opts.mutable {
      data.clone()
    } else {
      data.deep_clone()
    };
    entries.insert(key.to_string(), stored);
    Ok(())
  }

  /// Remove `key`, or every key when `key` is empty. Removing an absent key is not an error.
  pub fn clear(&self, key: &str) -> Result<()> {
    let mut entries = self.entries.write();
    if key.is_empty() {
      entries.clear();
    } else {
      entries.remove(key);
    }
    Ok(())
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.entries.read().contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.read().is_empty()
  }

  /// Whether both handles refer to the same table
  pub fn same_table(&self, other: &MemoryTable) -> bool {
    Arc::ptr_eq(&self.entries, &other.entries)
  }
}

impl std::fmt::Debug for MemoryTable {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("MemoryTable")
      .field("keys", &self.len())
      .finish()
  }
}

/// Memory backend bound to one table
pub struct MemoryBackend {
  table: MemoryTable,
}

impl MemoryBackend {
  pub fn new(table: MemoryTable) -> Self {
    Self { table }
  }

  pub fn table(&self) -> &MemoryTable {
    &self.table
  }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
  async fn get(&self, key: &str, config: &CacheConfig) -> Result<CacheValue> {
    tracing::debug!("memory get \"{}\"", key);
    self.table.get(key, config.memory.mutable)
  }

  async fn set(&self, key: &str, data: &CacheValue, config: &CacheConfig) -> Result<()> {
    tracing::debug!("memory set \"{}\"", key);
    self.table.set(key, data, WriteOptions::from(config))
  }

  async fn clear(&self, key: &str, _config: &CacheConfig) -> Result<()> {
    tracing::debug!("memory clear \"{}\"", key);
    self.table.clear(key)
  }

  fn name(&self) -> &'static str {
    MEMORY_CACHE
  }
}
