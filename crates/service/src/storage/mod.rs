//! Storage abstractions for the service layer.
//!
//! `KvStore` is the seam the document service talks to; `InMemoryStore`
//! is the process-local implementation backed by a sharded concurrent map.

pub mod kv_store;
