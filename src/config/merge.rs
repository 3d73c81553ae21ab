//! Layered option merging.
//!
//! Layers are folded left to right and the **earlier** layer wins on every
//! conflicting key, so callers pass the highest-precedence layer first:
//!
//! ```
//! use serde_json::json;
//! use simply_caching::config::merge_opts;
//!
//! let call = json!({"general": {"caches": ["file"]}});
//! let instance = json!({"general": {"caches": ["memory"], "overwrite": false}});
//! let merged = merge_opts(&[&call, &instance]);
//! assert_eq!(merged, json!({"general": {"caches": ["file"], "overwrite": false}}));
//! ```
//!
//! Arrays and scalars are replaced whole, objects are filled in recursively with
//! the keys the accumulator is still missing. Inputs are never modified; the
//! result shares nothing with them.

use serde_json::{Map, Value};

/// Merge option layers, earliest layer first in precedence.
///
/// A single layer yields an independent copy of it. Layers that are not JSON
/// objects contribute nothing.
pub fn merge_opts(layers: &[&Value]) -> Value {
  if let [single] = layers {
    return (*single).clone();
  }

  let mut combined = Map::new();
  for layer in layers {
    let Value::Object(entries) = layer else {
      continue;
    };
    for (key, value) in entries {
      match combined.get_mut(key) {
        Some(existing) if !existing.is_null() => fill_missing(existing, value),
        _ => {
          combined.insert(key.clone(), value.clone());
        }
      }
    }
  }

  Value::Object(combined)
}

/// Copy keys from `lower` that `target` does not set yet
fn fill_missing(target: &mut Value, lower: &Value) {
  let (Value::Object(target), Value::Object(lower)) = (target, lower) else {
    return;
  };

  for (key, value) in lower {
    match target.get_mut(key) {
      Some(existing) if !existing.is_null() => fill_missing(existing, value),
      _ => {
        target.insert(key.clone(), value.clone());
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn test_earlier_layer_wins() {
    let first = json!({
      "general": {"caches": ["memory"], "overwrite": false},
      "memory": {"static": true}
    });
    let second = json!({
      "general": {"caches": ["file"]},
      "memory": {"mutable": true, "static": false},
      "file": {"root": "some/root"}
    });

    let merged = merge_opts(&[&first, &second]);
    assert_eq!(
      merged,
      json!({
        "general": {"caches": ["memory"], "overwrite": false},
        "memory": {"static": true, "mutable": true},
        "file": {"root": "some/root"}
      })
    );
  }

  #[test]
  fn test_precedence_direction_is_pinned() {
    let high = json!({"general": {"overwrite": true}});
    let low = json!({"general": {"overwrite": false}});
    assert_eq!(merge_opts(&[&high, &low])["general"]["overwrite"], json!(true));
    assert_eq!(merge_opts(&[&low, &high])["general"]["overwrite"], json!(false));
  }

  #[test]
  fn test_arrays_are_replaced_not_concatenated() {
    let high = json!({"general": {"caches": ["file"]}});
    let low = json!({"general": {"caches": ["memory", "file"]}});
    assert_eq!(
      merge_opts(&[&high, &low])["general"]["caches"],
      json!(["file"])
    );
  }

  #[test]
  fn test_nested_objects_merge_recursively() {
    let high = json!({"a": {"b": {"c": 1}}});
    let low = json!({"a": {"b": {"c": 2, "d": 3}, "e": 4}});
    assert_eq!(
      merge_opts(&[&high, &low]),
      json!({"a": {"b": {"c": 1, "d": 3}, "e": 4}})
    );
  }

  #[test]
  fn test_null_is_filled_from_lower_layer() {
    let high = json!({"file": null, "general": {"overwrite": null}});
    let low = json!({"file": {"root": "/tmp"}, "general": {"overwrite": false}});
    assert_eq!(
      merge_opts(&[&high, &low]),
      json!({"file": {"root": "/tmp"}, "general": {"overwrite": false}})
    );
  }

  #[test]
  fn test_inputs_are_not_modified() {
    let first = json!({"mutable": false, "memory": {"static": true}});
    let second = json!({"mutable": true, "newKey": true, "memory": {"mutable": true}});
    let first_before = first.clone();
    let second_before = second.clone();

    let mut merged = merge_opts(&[&first, &second]);
    merged["memory"]["static"] = json!(false);

    assert_eq!(first, first_before);
    assert_eq!(second, second_before);
  }

  #[test]
  fn test_single_layer_is_an_independent_copy() {
    let original = json!({"cloned": {"data": [1, 2, 3]}});
    let mut copy = merge_opts(&[&original]);
    assert_eq!(copy, original);

    copy["cloned"]["data"] = json!([]);
    assert_eq!(original["cloned"]["data"], json!([1, 2, 3]));
  }

  #[test]
  fn test_non_object_layers_are_skipped() {
    let layer = json!({"a": 1});
    assert_eq!(merge_opts(&[&Value::Null, &layer]), json!({"a": 1}));
    assert_eq!(merge_opts(&[]), json!({}));
  }
}
