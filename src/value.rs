//! Cached value handle

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a JSON value.
///
/// Cloning the handle aliases the same value; use [`CacheValue::deep_clone`]
/// for an independent copy. The memory backend stores the caller's handle as-is
/// when `memory.mutable` is on, and a deep clone otherwise.
#[derive(Clone, Default)]
pub struct CacheValue(Arc<RwLock<Value>>);

impl CacheValue {
  pub fn new(value: Value) -> Self {
    Self(Arc::new(RwLock::new(value)))
  }

  pub fn read(&self) -> RwLockReadGuard<'_, Value> {
    self.0.read()
  }

  pub fn write(&self) -> RwLockWriteGuard<'_, Value> {
    self.0.write()
  }

  /// Copy of the current value
  pub fn snapshot(&self) -> Value {
    self.read().clone()
  }

  /// New handle holding a structural copy of the current value
  pub fn deep_clone(&self) -> Self {
    Self::new(self.snapshot())
  }

  /// Whether both handles point at the same value
  pub fn ptr_eq(&self, other: &CacheValue) -> bool {
    Arc::ptr_eq(&self.0, &other.0)
  }

  /// JSON `null` is treated as "no data"
  pub fn is_missing(&self) -> bool {
    self.read().is_null()
  }
}

impl From<Value> for CacheValue {
  fn from(value: Value) -> Self {
    Self::new(value)
  }
}

impl From<&CacheValue> for CacheValue {
  fn from(value: &CacheValue) -> Self {
    value.clone()
  }
}

impl From<&str> for CacheValue {
  fn from(value: &str) -> Self {
    Self::new(Value::String(value.to_string()))
  }
}

impl From<String> for CacheValue {
  fn from(value: String) -> Self {
    Self::new(Value::String(value))
  }
}

impl fmt::Debug for CacheValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("CacheValue").field(&*self.read()).finish()
  }
}

impl PartialEq<Value> for CacheValue {
  fn eq(&self, other: &Value) -> bool {
    *self.read() == *other
  }
}
