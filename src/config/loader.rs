//! Process-scope configuration: built-in defaults plus an optional local
//! override file, resolved once and shared by every cache instance.

use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::{CacheConfig, CacheOptions, DEFAULT_ROOT};
use crate::error::{Error, Result};

/// Environment variable naming an explicit override file
pub const CONFIG_ENV: &str = "SIMPLY_CACHING_CONFIG";

/// Override files looked up in the working directory, in order
pub const CONFIG_FILES: [&str; 2] = [".simplycaching.yaml", ".simplycaching.yml"];

static PROCESS_CONFIG: OnceLock<ProcessConfig> = OnceLock::new();

/// Process configuration, initialized on first use
pub fn process_config() -> &'static ProcessConfig {
  PROCESS_CONFIG.get_or_init(ProcessConfig::find_and_load)
}

/// Defaults merged with the local override file
#[derive(Debug, Clone)]
pub struct ProcessConfig {
  layer: Value,
  default_root: PathBuf,
}

impl ProcessConfig {
  /// Build from an optional override layer. `file.root` is made absolute
  /// against the current working directory.
  pub fn load(override_layer: Option<Value>) -> Result<Self> {
    let overrides = match override_layer {
      Some(value) => CacheOptions::from_value(value)?.to_layer(),
      None => Value::Null,
    };
    let defaults = CacheConfig::default().to_layer();
    let mut config = CacheConfig::from_layers(&[&overrides, &defaults])?;

    let root = if config.file.root.is_empty() {
      DEFAULT_ROOT
    } else {
      config.file.root.as_str()
    };
    let default_root = absolutize(Path::new(root))?;
    config.file.root = default_root.to_string_lossy().into_owned();

    Ok(Self {
      layer: config.to_layer(),
      default_root,
    })
  }

  /// Build from a YAML override file
  pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;
    let expanded = expand_env_vars(&content);
    if expanded.trim().is_empty() {
      return Self::load(None);
    }
    let layer: Value = serde_yaml::from_str(&expanded).map_err(|e| {
      Error::validation(format!(
        "invalid config file {}: {}",
        path.display(),
        e
      ))
    })?;
    Self::load(Some(layer))
  }

  /// Locate the override file (explicit env var first, then the working
  /// directory). Problems with the file are logged and the defaults are used.
  pub fn find_and_load() -> Self {
    let candidate = match std::env::var(CONFIG_ENV) {
      Ok(path) if !path.is_empty() => Some(PathBuf::from(path)),
      _ => CONFIG_FILES
        .iter()
        .map(PathBuf::from)
        .find(|p| p.exists()),
    };

    if let Some(path) = candidate {
      match Self::from_file(&path) {
        Ok(config) => {
          tracing::info!("Loading cache config from {}", path.display());
          return config;
        }
        Err(e) => {
          tracing::warn!("Ignoring cache config {}: {}", path.display(), e);
        }
      }
    }

    Self::load(None).unwrap_or_else(|e| {
      tracing::warn!("Falling back to relative cache root: {}", e);
      Self {
        layer: CacheConfig::default().to_layer(),
        default_root: PathBuf::from(DEFAULT_ROOT),
      }
    })
  }

  /// Complete configuration layer, lowest precedence under instance options
  pub fn layer(&self) -> &Value {
    &self.layer
  }

  /// Root used when an operation's `file.root` is empty
  pub fn default_root(&self) -> &Path {
    &self.default_root
  }

  pub fn config(&self) -> Result<CacheConfig> {
    CacheConfig::from_layers(&[&self.layer])
  }
}

fn absolutize(path: &Path) -> Result<PathBuf> {
  if path.is_absolute() {
    Ok(path.to_path_buf())
  } else {
    Ok(std::env::current_dir()?.join(path))
  }
}

/// Expand `$VAR` and `${VAR}` references. Unset variables expand to nothing;
/// an unterminated `${` is left as written.
fn expand_env_vars(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut rest = input;

  while let Some(pos) = rest.find('$') {
    out.push_str(&rest[..pos]);
    let after = &rest[pos + 1..];

    if let Some(braced) = after.strip_prefix('{') {
      if let Some(end) = braced.find('}') {
        out.push_str(&std::env::var(&braced[..end]).unwrap_or_default());
        rest = &braced[end + 1..];
      } else {
        out.push('$');
        rest = after;
      }
      continue;
    }

    let len = after
      .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
      .unwrap_or(after.len());
    if len == 0 {
      out.push('$');
    } else {
      out.push_str(&std::env::var(&after[..len]).unwrap_or_default());
    }
    rest = &after[len..];
  }

  out.push_str(rest);
  out
}
