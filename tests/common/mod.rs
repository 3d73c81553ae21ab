#![allow(dead_code)]

use serde_json::json;
use simply_caching::{CacheOptions, ProcessConfig, SimplyCaching};
use std::path::Path;
use tempfile::TempDir;

pub fn init_tracing() {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
}

/// Process configuration whose default file root is `root`
pub fn process_config(root: &Path) -> ProcessConfig {
  ProcessConfig::load(Some(json!({"file": {"root": root.to_string_lossy()}}))).unwrap()
}

/// Cache instance writing files under `dir`
pub fn cache_in(dir: &TempDir, opts: CacheOptions) -> SimplyCaching {
  init_tracing();
  SimplyCaching::with_process_config(opts, &process_config(dir.path())).unwrap()
}

pub fn sample_data() -> serde_json::Value {
  json!({
    "string": "string",
    "number": 123,
    "object": {"some": "object"},
    "array": ["an", "array", 1234]
  })
}
