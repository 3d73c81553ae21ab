//! Backend trait shared by the memory and file caches

use async_trait::async_trait;

use crate::config::CacheConfig;
use crate::error::Result;
use crate::value::CacheValue;

/// A storage backend the orchestrator can fan requests out to.
///
/// Each call receives the fully merged configuration of the operation, so a
/// backend reads whichever sections it cares about.
#[async_trait]
pub trait CacheBackend: Send + Sync {
  /// Read `key`. A miss is an [`Error::Cache`](crate::Error::Cache).
  async fn get(&self, key: &str, config: &CacheConfig) -> Result<CacheValue>;

  /// Write `data` under `key`, honouring `general.overwrite`
  async fn set(&self, key: &str, data: &CacheValue, config: &CacheConfig) -> Result<()>;

  /// Remove `key`, or everything when `key` is empty
  async fn clear(&self, key: &str, config: &CacheConfig) -> Result<()>;

  /// Identifier used in `general.caches` and as the registry key
  fn name(&self) -> &'static str;

  /// Reject keys this backend cannot store. Runs before any backend does work.
  fn validate_key(&self, _key: &str) -> Result<()> {
    Ok(())
  }
}

/// Flags for a single write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
  /// Replace an existing key instead of failing
  pub overwrite: bool,
  /// Store the caller's handle (aliased) instead of a deep copy
  pub mutable: bool,
}

impl From<&CacheConfig> for WriteOptions {
  fn from(config: &CacheConfig) -> Self {
    Self {
      overwrite: config.general.overwrite,
      mutable: config.memory.mutable,
    }
  }
}
