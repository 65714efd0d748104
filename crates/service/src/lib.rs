//! Service layer for the document cache.
//! - `storage`: concurrent key-value primitives over opaque string values.
//! - `merge`: recursive JSON merge used by the patch flow.
//! - `cache_service`: create/read/replace/patch/delete flows composed from the two.

pub mod errors;
pub mod storage;
pub mod merge;
pub mod cache_service;

pub use cache_service::DocumentService;
pub use merge::merge_patch::{merge, merge_text, MergeOutcome};
pub use storage::kv_store::{InMemoryStore, KvStore};
