//! Uniform get/set/clear over interchangeable cache backends.
//!
//! A [`SimplyCaching`] instance owns an ordered list of backends (an in-process
//! memory table and a JSON-on-filesystem store out of the box). Writes and
//! clears go to every listed backend concurrently; reads try them in order and
//! return the first hit.
//!
//! ```no_run
//! use serde_json::json;
//! use simply_caching::{CacheOptions, SimplyCaching};
//!
//! # async fn run() -> simply_caching::Result<()> {
//! let cache = SimplyCaching::new(CacheOptions::new().caches(["memory", "file"]))?;
//! cache.set_cache("users/42", json!({"name": "Ada"})).await?;
//! let user = cache.get_cache("users/42").await?;
//! assert_eq!(user, json!({"name": "Ada"}));
//! cache.clear_cache("").await?;
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod value;

pub use backend::{CacheBackend, WriteOptions};
pub use cache::SimplyCaching;
pub use config::{CacheConfig, CacheOptions, ProcessConfig};
pub use error::{Error, ErrorKind, Result};
pub use file::FileBackend;
pub use memory::{MemoryBackend, MemoryTable};
pub use value::CacheValue;
