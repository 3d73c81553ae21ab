//! Error types shared by the merger, the backends and the orchestrator

use serde_json::Value;
use std::fmt;

/// Result type for cache operations
pub type Result<T> = std::result::Result<T, Error>;

/// Cache error
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// A required parameter was missing or malformed. Raised before any I/O.
  #[error("{}", .issues.join("\n"))]
  Validation { issues: Vec<String> },

  /// A backend could not satisfy the request (miss, overwrite rejected, write failure)
  #[error("{message}")]
  Cache {
    message: String,
    key: String,
    /// Data that was being written, if any
    data: Option<Value>,
  },

  /// Raw filesystem failure that is propagated unwrapped
  #[error(transparent)]
  Io(#[from] std::io::Error),
}

/// Error kinds callers can match caught failures against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
  Validation,
  Cache,
  Io,
}

impl ErrorKind {
  pub const ALL: [ErrorKind; 3] = [ErrorKind::Validation, ErrorKind::Cache, ErrorKind::Io];

  pub fn name(&self) -> &'static str {
    match self {
      ErrorKind::Validation => "ValidationError",
      ErrorKind::Cache => "CacheError",
      ErrorKind::Io => "IoError",
    }
  }
}

impl fmt::Display for ErrorKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl Error {
  pub fn validation(issue: impl Into<String>) -> Self {
    Error::Validation {
      issues: vec![issue.into()],
    }
  }

  pub fn validation_issues(issues: Vec<String>) -> Self {
    Error::Validation { issues }
  }

  pub fn cache(message: impl Into<String>, key: impl Into<String>) -> Self {
    Error::Cache {
      message: message.into(),
      key: key.into(),
      data: None,
    }
  }

  pub fn cache_with_data(message: impl Into<String>, key: impl Into<String>, data: Value) -> Self {
    Error::Cache {
      message: message.into(),
      key: key.into(),
      data: Some(data),
    }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::Validation { .. } => ErrorKind::Validation,
      Error::Cache { .. } => ErrorKind::Cache,
      Error::Io(_) => ErrorKind::Io,
    }
  }

  pub fn is_validation(&self) -> bool {
    self.kind() == ErrorKind::Validation
  }

  pub fn is_cache(&self) -> bool {
    self.kind() == ErrorKind::Cache
  }

  /// Validation issues, empty for other kinds
  pub fn issues(&self) -> &[String] {
    match self {
      Error::Validation { issues } => issues,
      _ => &[],
    }
  }

  /// Key the failing cache operation was using
  pub fn key(&self) -> Option<&str> {
    match self {
      Error::Cache { key, .. } => Some(key),
      _ => None,
    }
  }

  pub fn data(&self) -> Option<&Value> {
    match self {
      Error::Cache { data, .. } => data.as_ref(),
      _ => None,
    }
  }
}

/// Collects validation issues and turns them into a single error
#[derive(Debug, Default)]
pub(crate) struct Issues(Vec<String>);

impl Issues {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn check(&mut self, ok: bool, issue: impl Into<String>) {
    if !ok {
      self.0.push(issue.into());
    }
  }

  pub fn into_result(self) -> Result<()> {
    if self.0.is_empty() {
      Ok(())
    } else {
      Err(Error::validation_issues(self.0))
    }
  }
}
