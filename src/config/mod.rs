//! Cache configuration: typed sections, partial options and layering

mod loader;
mod merge;

pub use loader::{process_config, ProcessConfig, CONFIG_ENV, CONFIG_FILES};
pub use merge::merge_opts;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Issues, Result};

/// Identifier of the in-process memory backend
pub const MEMORY_CACHE: &str = "memory";
/// Identifier of the JSON file backend
pub const FILE_CACHE: &str = "file";
/// Default file root, relative to the working directory at first load
pub const DEFAULT_ROOT: &str = ".cache";

/// Fully resolved configuration for one operation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
  #[serde(default)]
  pub general: GeneralSection,
  #[serde(default)]
  pub memory: MemorySection,
  #[serde(default)]
  pub file: FileSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneralSection {
  /// Backends in read precedence; every one of them receives writes and clears
  #[serde(default = "default_caches")]
  pub caches: Vec<String>,
  /// When false, writing a key that already exists is rejected
  #[serde(default = "default_true")]
  pub overwrite: bool,
}

fn default_caches() -> Vec<String> {
  vec![MEMORY_CACHE.to_string(), FILE_CACHE.to_string()]
}

fn default_true() -> bool {
  true
}

impl Default for GeneralSection {
  fn default() -> Self {
    Self {
      caches: default_caches(),
      overwrite: true,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySection {
  /// Share the process-wide table instead of a per-instance one
  #[serde(rename = "static", default)]
  pub shared: bool,
  /// Store and return the caller's handle instead of deep copies
  #[serde(default)]
  pub mutable: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSection {
  /// Directory holding one JSON document per key. Empty means the process
  /// default root; relative paths resolve against the working directory.
  #[serde(default = "default_root")]
  pub root: String,
}

fn default_root() -> String {
  DEFAULT_ROOT.into()
}

impl Default for FileSection {
  fn default() -> Self {
    Self {
      root: default_root(),
    }
  }
}

impl CacheConfig {
  /// Merge layers (highest precedence first) and resolve them into a config
  pub fn from_layers(layers: &[&Value]) -> Result<Self> {
    let merged = merge_opts(layers);
    let config: CacheConfig = serde_json::from_value(merged)
      .map_err(|e| Error::validation(format!("invalid configuration: {}", e)))?;
    config.validate()?;
    Ok(config)
  }

  pub fn validate(&self) -> Result<()> {
    let mut issues = Issues::new();
    issues.check(
      !self.general.caches.is_empty(),
      "general.caches must name at least one cache",
    );
    issues.check(
      self.general.caches.iter().all(|name| !name.is_empty()),
      "general.caches contains an empty cache name",
    );
    issues.into_result()
  }

  /// This config as a merge layer
  pub fn to_layer(&self) -> Value {
    serde_json::to_value(self).unwrap_or_default()
  }
}

/// Partial options supplied per instance or per call.
///
/// Unset fields fall through to lower layers. The flat top-level fields are
/// deprecated spellings that [`CacheOptions::normalize`] moves into their
/// sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub general: Option<GeneralOptions>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub memory: Option<MemoryOptions>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file: Option<FileOptions>,

  /// Deprecated: use `memory.static`
  #[serde(default, alias = "useStaticMemory", skip_serializing_if = "Option::is_none")]
  pub use_static_memory: Option<bool>,
  /// Deprecated: use `general.overwrite` (inverted)
  #[serde(default, alias = "preventOverwrite", skip_serializing_if = "Option::is_none")]
  pub prevent_overwrite: Option<bool>,
  /// Deprecated: use `file.root`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub root: Option<String>,
  /// Deprecated: use `general.caches`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub caches: Option<Vec<String>>,
  /// Deprecated: use `memory.mutable`
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub mutable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GeneralOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub caches: Option<Vec<String>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub overwrite: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryOptions {
  #[serde(rename = "static", default, skip_serializing_if = "Option::is_none")]
  pub shared: Option<bool>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub mutable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileOptions {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub root: Option<String>,
}

impl CacheOptions {
  pub fn new() -> Self {
    Self::default()
  }

  /// Parse options from a JSON value (e.g. a config file layer)
  pub fn from_value(value: Value) -> Result<Self> {
    if value.is_null() {
      return Ok(Self::default());
    }
    serde_json::from_value(value).map_err(|e| Error::validation(format!("invalid options: {}", e)))
  }

  pub fn caches<I, S>(mut self, caches: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<String>,
  {
    self.general_mut().caches = Some(caches.into_iter().map(Into::into).collect());
    self
  }

  pub fn overwrite(mut self, overwrite: bool) -> Self {
    self.general_mut().overwrite = Some(overwrite);
    self
  }

  pub fn static_memory(mut self, shared: bool) -> Self {
    self.memory_mut().shared = Some(shared);
    self
  }

  pub fn mutable_memory(mut self, mutable: bool) -> Self {
    self.memory_mut().mutable = Some(mutable);
    self
  }

  pub fn root(mut self, root: impl Into<String>) -> Self {
    self.file.get_or_insert_with(FileOptions::default).root = Some(root.into());
    self
  }

  fn general_mut(&mut self) -> &mut GeneralOptions {
    self.general.get_or_insert_with(GeneralOptions::default)
  }

  fn memory_mut(&mut self) -> &mut MemoryOptions {
    self.memory.get_or_insert_with(MemoryOptions::default)
  }

  /// Move deprecated flat keys into their sections, overriding the sectioned value
  pub fn normalize(mut self) -> Self {
    if let Some(shared) = self.use_static_memory.take() {
      tracing::warn!("Deprecated option `use_static_memory`, use `memory.static` instead");
      self.memory_mut().shared = Some(shared);
    }
    if let Some(prevent) = self.prevent_overwrite.take() {
      tracing::warn!("Deprecated option `prevent_overwrite`, use `general.overwrite` instead");
      self.general_mut().overwrite = Some(!prevent);
    }
    if let Some(root) = self.root.take() {
      tracing::warn!("Deprecated option `root`, use `file.root` instead");
      self.file.get_or_insert_with(FileOptions::default).root = Some(root);
    }
    if let Some(caches) = self.caches.take() {
      tracing::warn!("Deprecated option `caches`, use `general.caches` instead");
      self.general_mut().caches = Some(caches);
    }
    if let Some(mutable) = self.mutable.take() {
      tracing::warn!("Deprecated option `mutable`, use `memory.mutable` instead");
      self.memory_mut().mutable = Some(mutable);
    }
    self
  }

  /// Normalized options as a merge layer containing only the keys that are set
  pub fn to_layer(&self) -> Value {
    serde_json::to_value(self.clone().normalize()).unwrap_or_default()
  }
}
