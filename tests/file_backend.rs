//! File backend tests against temporary roots

mod common;

use serde_json::{json, Value};
use simply_caching::{CacheBackend, CacheConfig, CacheValue, Error, FileBackend};
use std::path::Path;
use tempfile::TempDir;

fn backend() -> (TempDir, FileBackend) {
  common::init_tracing();
  let dir = TempDir::new().unwrap();
  let backend = FileBackend::new(dir.path());
  (dir, backend)
}

fn read_raw(path: impl AsRef<Path>) -> String {
  std::fs::read_to_string(path).unwrap()
}

#[tokio::test]
async fn test_validation() {
  let (_dir, backend) = backend();

  let err = backend.write("", &Value::Null, "", true).await.unwrap_err();
  assert!(err.is_validation());
  assert_eq!(err.issues().len(), 2);

  assert!(backend.read("", "").await.unwrap_err().is_validation());
  assert!(backend
    .write("../escape", &json!(1), "", true)
    .await
    .unwrap_err()
    .is_validation());
}

#[tokio::test]
async fn test_save_writes_json_document() {
  let (dir, backend) = backend();
  backend
    .write("document", &common::sample_data(), "", true)
    .await
    .unwrap();

  let raw = read_raw(dir.path().join("document.json"));
  assert_eq!(serde_json::from_str::<Value>(&raw).unwrap(), common::sample_data());
  assert_eq!(backend.read("document", "").await.unwrap(), common::sample_data());
}

#[tokio::test]
async fn test_strings_written_verbatim() {
  let (dir, backend) = backend();

  backend
    .write("preEncoded", &json!(r#"{"a":1}"#), "", true)
    .await
    .unwrap();
  assert_eq!(read_raw(dir.path().join("preEncoded.json")), r#"{"a":1}"#);
  assert_eq!(backend.read("preEncoded", "").await.unwrap(), json!({"a": 1}));

  backend.write("plain", &json!("hello"), "", true).await.unwrap();
  assert_eq!(read_raw(dir.path().join("plain.json")), "hello");
  assert!(backend.read("plain", "").await.unwrap_err().is_cache());
}

#[tokio::test]
async fn test_overwrite_protection() {
  let (dir, backend) = backend();
  backend.write("guarded", &json!({"v": 1}), "", false).await.unwrap();

  let err = backend
    .write("guarded", &json!({"v": 2}), "", false)
    .await
    .unwrap_err();
  assert!(err.is_cache());
  assert_eq!(err.key(), Some("guarded"));
  assert_eq!(err.data(), Some(&json!({"v": 2})));
  assert_eq!(
    serde_json::from_str::<Value>(&read_raw(dir.path().join("guarded.json"))).unwrap(),
    json!({"v": 1})
  );

  backend.write("guarded", &json!({"v": 3}), "", true).await.unwrap();
  assert_eq!(backend.read("guarded", "").await.unwrap(), json!({"v": 3}));
}

#[tokio::test]
async fn test_nested_keys_create_directories() {
  let (dir, backend) = backend();
  backend
    .write("testDir/testSubDir/testKey", &json!([1, 2]), "", true)
    .await
    .unwrap();

  assert!(dir.path().join("testDir/testSubDir/testKey.json").is_file());
  assert_eq!(
    backend.read("testDir/testSubDir/testKey", "").await.unwrap(),
    json!([1, 2])
  );
}

#[tokio::test]
async fn test_explicit_root() {
  let (default_dir, backend) = backend();
  let other = TempDir::new().unwrap();
  let root = other.path().to_string_lossy().into_owned();

  backend.write("rooted", &json!(1), &root, true).await.unwrap();
  assert!(other.path().join("rooted.json").exists());
  assert!(!default_dir.path().join("rooted.json").exists());
  assert!(backend.read("rooted", "").await.unwrap_err().is_cache());
  assert_eq!(backend.read("rooted", &root).await.unwrap(), json!(1));
}

#[tokio::test]
async fn test_missing_and_malformed_documents() {
  let (dir, backend) = backend();

  let err = backend.read("absent", "").await.unwrap_err();
  assert!(err.is_cache());
  assert_eq!(err.key(), Some("absent"));

  std::fs::write(dir.path().join("broken.json"), "{not json").unwrap();
  assert!(backend.read("broken", "").await.unwrap_err().is_cache());
}

#[tokio::test]
async fn test_clear_single_key() {
  let (dir, backend) = backend();
  backend.write("gone", &json!(1), "", true).await.unwrap();
  backend.write("kept", &json!(2), "", true).await.unwrap();

  backend.remove("gone", "").await.unwrap();
  assert!(!dir.path().join("gone.json").exists());
  assert!(dir.path().join("kept.json").exists());
}

#[tokio::test]
async fn test_clear_absent_key_fails_with_io() {
  let (_dir, backend) = backend();
  match backend.remove("neverWritten", "").await {
    Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::NotFound),
    other => panic!("expected not-found error, got {:?}", other),
  }
}

#[tokio::test]
async fn test_clear_all_keeps_directories() {
  let (dir, backend) = backend();
  backend.write("top", &json!(1), "", true).await.unwrap();
  backend.write("a/b/deep", &json!(2), "", true).await.unwrap();
  std::fs::write(dir.path().join("a/stray.txt"), "stray").unwrap();

  backend.remove("", "").await.unwrap();

  assert!(!dir.path().join("top.json").exists());
  assert!(!dir.path().join("a/b/deep.json").exists());
  assert!(!dir.path().join("a/stray.txt").exists());
  assert!(dir.path().join("a/b").is_dir());
  assert!(backend.read("a/b/deep", "").await.unwrap_err().is_cache());
}

#[tokio::test]
async fn test_clear_all_on_empty_or_missing_root() {
  let (dir, backend) = backend();
  backend.remove("", "").await.unwrap();

  let missing = dir.path().join("does/not/exist");
  backend
    .remove("", &missing.to_string_lossy())
    .await
    .unwrap();
  assert!(!missing.exists());
}

#[tokio::test]
async fn test_trait_uses_config_root_and_overwrite() {
  let (_dir, backend) = backend();
  let other = TempDir::new().unwrap();

  let mut config = CacheConfig::default();
  config.file.root = other.path().to_string_lossy().into_owned();
  config.general.overwrite = false;

  let data = CacheValue::new(json!({"via": "trait"}));
  CacheBackend::set(&backend, "traitKey", &data, &config).await.unwrap();
  assert!(other.path().join("traitKey.json").exists());
  assert!(CacheBackend::set(&backend, "traitKey", &data, &config)
    .await
    .unwrap_err()
    .is_cache());

  let value = CacheBackend::get(&backend, "traitKey", &config).await.unwrap();
  assert_eq!(value, json!({"via": "trait"}));
  assert!(!value.ptr_eq(&data));

  CacheBackend::clear(&backend, "traitKey", &config).await.unwrap();
  assert_eq!(backend.name(), "file");
}
