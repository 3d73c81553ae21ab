//! Process-wide cache of parsed documents keyed by absolute path.
//!
//! Entries are only served while the file's length and modification time still
//! match, and writers invalidate the paths they touch.

use lru::LruCache;
use parking_lot::Mutex;
use serde_json::Value;
use std::fs::Metadata;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::SystemTime;

const CAPACITY: usize = 256;

struct CachedDocument {
  len: u64,
  modified: Option<SystemTime>,
  value: Value,
}

impl CachedDocument {
  fn matches(&self, metadata: &Metadata) -> bool {
    self.len == metadata.len() && self.modified == metadata.modified().ok()
  }
}

static READ_CACHE: OnceLock<Mutex<LruCache<PathBuf, CachedDocument>>> = OnceLock::new();

fn documents() -> &'static Mutex<LruCache<PathBuf, CachedDocument>> {
  READ_CACHE.get_or_init(|| {
    let capacity = NonZeroUsize::new(CAPACITY).unwrap_or(NonZeroUsize::MIN);
    Mutex::new(LruCache::new(capacity))
  })
}

pub(crate) fn lookup(path: &Path, metadata: &Metadata) -> Option<Value> {
  let mut cache = documents().lock();
  let key = path.to_path_buf();
  let fresh = cache
    .get(&key)
    .map(|doc| doc.matches(metadata).then(|| doc.value.clone()));
  match fresh {
    Some(Some(value)) => Some(value),
    Some(None) => {
      cache.pop(&key);
      None
    }
    None => None,
  }
}

pub(crate) fn store(path: PathBuf, metadata: &Metadata, value: Value) {
  let doc = CachedDocument {
    len: metadata.len(),
    modified: metadata.modified().ok(),
    value,
  };
  documents().lock().put(path, doc);
}

pub(crate) fn invalidate(path: &Path) {
  documents().lock().pop(&path.to_path_buf());
}

/// Drop every entry located under `root`
pub(crate) fn invalidate_under(root: &Path) {
  let mut cache = documents().lock();
  let stale: Vec<PathBuf> = cache
    .iter()
    .filter(|(path, _)| path.starts_with(root))
    .map(|(path, _)| path.clone())
    .collect();
  for path in stale {
    cache.pop(&path);
  }
}

#[cfg(test)]
pub(crate) fn contains(path: &Path) -> bool {
  documents().lock().contains(&path.to_path_buf())
}
