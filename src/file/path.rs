//! Root and key path resolution

use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Suffix every cached document carries
pub const DOCUMENT_EXTENSION: &str = ".json";

/// Resolve a configured root: empty uses `default_root`, absolute paths are
/// used as given, anything else is relative to the current working directory
/// at call time. `.` and `..` components are folded away lexically so one
/// directory always resolves to one path.
pub fn process_root(root: &str, default_root: &Path) -> Result<PathBuf> {
  if root.is_empty() {
    return Ok(normalize_lexically(default_root));
  }

  let root = Path::new(root);
  if root.is_absolute() {
    Ok(normalize_lexically(root))
  } else {
    Ok(normalize_lexically(&std::env::current_dir()?.join(root)))
  }
}

/// Drop `.` components and fold `..` into its parent without touching the
/// filesystem. `..` at the root stays at the root.
fn normalize_lexically(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => match normalized.components().next_back() {
        Some(Component::Normal(_)) => {
          normalized.pop();
        }
        Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
        _ => normalized.push(component),
      },
      other => normalized.push(other),
    }
  }
  normalized
}

/// Location of the document for `key` under `root`.
///
/// Separators inside the key produce nested directories. Keys may not leave
/// the root: `..` components are rejected and leading separators dropped.
pub fn document_path(root: &Path, key: &str) -> Result<PathBuf> {
  if key.is_empty() {
    return Err(Error::validation("file key must not be empty"));
  }

  let name = if key.ends_with(DOCUMENT_EXTENSION) {
    key.to_string()
  } else {
    format!("{}{}", key, DOCUMENT_EXTENSION)
  };

  let trimmed = name.trim_start_matches(|c| c == '/' || c == '\\');
  let mut relative = PathBuf::new();
  for component in Path::new(trimmed).components() {
    match component {
      Component::Normal(part) => relative.push(part),
      Component::CurDir => {}
      Component::ParentDir => {
        return Err(Error::validation(format!(
          "file key \"{}\" may not contain '..'",
          key
        )));
      }
      Component::RootDir | Component::Prefix(_) => {
        return Err(Error::validation(format!(
          "file key \"{}\" must be relative",
          key
        )));
      }
    }
  }

  if relative.as_os_str().is_empty() {
    return Err(Error::validation(format!(
      "file key \"{}\" does not name a document",
      key
    )));
  }

  Ok(root.join(relative))
}
