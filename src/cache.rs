//! Cache orchestrator: merges options and fans operations out over the
//! configured backends

use futures_util::future::join_all;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::backend::CacheBackend;
use crate::config::{merge_opts, process_config, CacheConfig, CacheOptions, ProcessConfig};
use crate::error::{Error, ErrorKind, Issues, Result};
use crate::file::FileBackend;
use crate::memory::{MemoryBackend, MemoryTable};
use crate::value::CacheValue;

/// Cache instance.
///
/// Holds its merged instance options and the memory table chosen by
/// `memory.static` at construction. Every operation merges per-call options
/// over the instance options (call options win) before dispatching.
pub struct SimplyCaching {
  opts: Value,
  config: CacheConfig,
  memory: MemoryTable,
  backends: HashMap<String, Arc<dyn CacheBackend>>,
}

impl SimplyCaching {
  /// Create an instance layered over the process configuration
  pub fn new(opts: CacheOptions) -> Result<Self> {
    Self::with_process_config(opts, process_config())
  }

  /// Create an instance layered over an explicit process configuration
  pub fn with_process_config(opts: CacheOptions, base: &ProcessConfig) -> Result<Self> {
    let opts = merge_opts(&[&opts.to_layer(), base.layer()]);
    let config = CacheConfig::from_layers(&[&opts])?;

    let memory = if config.memory.shared {
      MemoryTable::shared()
    } else {
      MemoryTable::new()
    };

    let mut backends: HashMap<String, Arc<dyn CacheBackend>> = HashMap::new();
    let builtin: [Arc<dyn CacheBackend>; 2] = [
      Arc::new(MemoryBackend::new(memory.clone())),
      Arc::new(FileBackend::new(base.default_root())),
    ];
    for backend in builtin {
      backends.insert(backend.name().to_string(), backend);
    }

    tracing::debug!(
      "cache instance created with caches [{}]",
      config.general.caches.join(", ")
    );

    Ok(Self {
      opts,
      config,
      memory,
      backends,
    })
  }

  /// Register an additional backend under its [`CacheBackend::name`],
  /// returning any backend it replaces
  pub fn register_backend(
    &mut self,
    backend: Arc<dyn CacheBackend>,
  ) -> Option<Arc<dyn CacheBackend>> {
    self.backends.insert(backend.name().to_string(), backend)
  }

  /// Instance configuration (without per-call overrides)
  pub fn config(&self) -> &CacheConfig {
    &self.config
  }

  /// The memory table this instance reads and writes
  pub fn memory(&self) -> &MemoryTable {
    &self.memory
  }

  /// Error kinds operations can fail with
  pub fn errors() -> &'static [ErrorKind] {
    &ErrorKind::ALL
  }

  pub async fn set_cache(&self, key: &str, data: impl Into<CacheValue>) -> Result<()> {
    self.set_cache_with(key, data, &CacheOptions::default()).await
  }

  /// Write `data` to every configured backend concurrently. Fails if any
  /// backend fails; writes that succeeded are kept.
  pub async fn set_cache_with(
    &self,
    key: &str,
    data: impl Into<CacheValue>,
    opts: &CacheOptions,
  ) -> Result<()> {
    let config = self.resolve(opts)?;
    let backends = self.backends_for(&config)?;
    let data = data.into();

    let mut issues = Issues::new();
    issues.check(!key.is_empty(), "set_cache missing parameter: key");
    issues.check(!data.is_missing(), "set_cache missing parameter: data");
    issues.into_result()?;
    check_key(key, &backends)?;

    tracing::debug!("set \"{}\" on [{}]", key, config.general.caches.join(", "));
    let results = join_all(
      backends
        .iter()
        .map(|backend| backend.set(key, &data, &config)),
    )
    .await;
    results.into_iter().collect()
  }

  pub async fn get_cache(&self, key: &str) -> Result<CacheValue> {
    self.get_cache_with(key, &CacheOptions::default()).await
  }

  /// Try each configured backend in order and return the first hit
  pub async fn get_cache_with(&self, key: &str, opts: &CacheOptions) -> Result<CacheValue> {
    if key.is_empty() {
      return Err(Error::validation("get_cache missing parameter: key"));
    }

    let config = self.resolve(opts)?;
    let backends = self.backends_for(&config)?;
    check_key(key, &backends)?;
    let caches = &config.general.caches;

    for (name, backend) in caches.iter().zip(&backends) {
      match backend.get(key, &config).await {
        Ok(value) => {
          tracing::debug!("get \"{}\" hit in {}", key, name);
          return Ok(value);
        }
        Err(e) => tracing::debug!("get \"{}\" missed in {}: {}", key, name, e),
      }
    }

    Err(Error::cache(
      format!(
        "Could not find key \"{}\" in the following caches: {}",
        key,
        caches.join(", ")
      ),
      key,
    ))
  }

  pub async fn clear_cache(&self, key: &str) -> Result<()> {
    self.clear_cache_with(key, &CacheOptions::default()).await
  }

  /// Clear `key` (or everything, for an empty key) in every configured backend concurrently
  pub async fn clear_cache_with(&self, key: &str, opts: &CacheOptions) -> Result<()> {
    let config = self.resolve(opts)?;
    let backends = self.backends_for(&config)?;
    if !key.is_empty() {
      check_key(key, &backends)?;
    }

    tracing::debug!("clear \"{}\" on [{}]", key, config.general.caches.join(", "));
    let results = join_all(backends.iter().map(|backend| backend.clear(key, &config))).await;
    results.into_iter().collect()
  }

  fn resolve(&self, opts: &CacheOptions) -> Result<CacheConfig> {
    CacheConfig::from_layers(&[&opts.to_layer(), &self.opts])
  }

  /// Backends for `general.caches`, in list order
  fn backends_for(&self, config: &CacheConfig) -> Result<Vec<Arc<dyn CacheBackend>>> {
    let mut found = Vec::with_capacity(config.general.caches.len());
    let mut unknown = Vec::new();
    for name in &config.general.caches {
      match self.backends.get(name) {
        Some(backend) => found.push(Arc::clone(backend)),
        None => unknown.push(format!("unknown cache \"{}\"", name)),
      }
    }

    if unknown.is_empty() {
      Ok(found)
    } else {
      Err(Error::validation_issues(unknown))
    }
  }
}

/// Every backend must accept `key` before any of them is called
fn check_key(key: &str, backends: &[Arc<dyn CacheBackend>]) -> Result<()> {
  let mut issues = Issues::new();
  for backend in backends {
    match backend.validate_key(key) {
      Ok(()) => {}
      Err(e) if e.is_validation() => {
        for issue in e.issues() {
          issues.check(false, issue.as_str());
        }
      }
      Err(e) => return Err(e),
    }
  }
  issues.into_result()
}

impl std::fmt::Debug for SimplyCaching {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    let mut backends: Vec<_> = self.backends.keys().collect();
    backends.sort();
    f.debug_struct("SimplyCaching")
      .field("config", &self.config)
      .field("memory", &self.memory)
      .field("backends", &backends)
      .finish()
  }
}
