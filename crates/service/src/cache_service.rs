use std::sync::Arc;

use configs::{PatchMode, StoreConfig};
use tracing::{debug, info, warn};

use crate::errors::ServiceError;
use crate::merge::merge_patch::{merge_text, MergeOutcome};
use crate::storage::kv_store::KvStore;

/// Document CRUD on top of a shared `KvStore`.
///
/// Keys are validated here so the store only ever sees non-blank keys.
/// The patch flow is read, merge, write; see [`PatchMode`] for how the write
/// back behaves under concurrent patches on the same key.
#[derive(Clone)]
pub struct DocumentService {
    store: Arc<dyn KvStore>,
    patch_mode: PatchMode,
    max_patch_retries: u32,
}

impl DocumentService {
    pub fn new(store: Arc<dyn KvStore>, config: &StoreConfig) -> Self {
        Self {
            store,
            patch_mode: config.patch_mode,
            max_patch_retries: config.max_patch_retries.max(1),
        }
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Store `body` under a new key. Fails with `Conflict` if the key is taken.
    pub fn create(&self, key: &str, body: String) -> Result<(), ServiceError> {
        let key = validate_key(key)?;
        if self.store.create_if_absent(key, body) {
            info!(%key, "document created");
            Ok(())
        } else {
            debug!(%key, "create rejected: key exists");
            Err(ServiceError::conflict(key))
        }
    }

    pub fn read(&self, key: &str) -> Result<String, ServiceError> {
        let key = validate_key(key)?;
        self.store.get(key).ok_or_else(|| ServiceError::not_found(key))
    }

    pub fn exists(&self, key: &str) -> Result<bool, ServiceError> {
        let key = validate_key(key)?;
        Ok(self.store.exists(key))
    }

    /// Upsert.
    pub fn replace(&self, key: &str, body: String) -> Result<(), ServiceError> {
        let key = validate_key(key)?;
        self.store.set(key, body);
        info!(%key, "document replaced");
        Ok(())
    }

    /// Merge `patch` into the stored document and write the result back.
    pub fn patch(&self, key: &str, patch: &str) -> Result<MergeOutcome, ServiceError> {
        let key = validate_key(key)?;
        let outcome = match self.patch_mode {
            PatchMode::LastWriteWins => {
                let current = self.store.get(key).ok_or_else(|| ServiceError::not_found(key))?;
                let outcome = merge_text(&current, patch);
                self.store.set(key, outcome.stored_text());
                outcome
            }
            PatchMode::CompareAndSwap => self.patch_with_cas(key, patch)?,
        };
        if !outcome.is_merged() {
            debug!(%key, "patch fell back to whole-value replacement");
        }
        info!(%key, "document patched");
        Ok(outcome)
    }

    fn patch_with_cas(&self, key: &str, patch: &str) -> Result<MergeOutcome, ServiceError> {
        for attempt in 1..=self.max_patch_retries {
            let current = self.store.get(key).ok_or_else(|| ServiceError::not_found(key))?;
            let outcome = merge_text(&current, patch);
            if self.store.compare_and_set(key, &current, outcome.stored_text()) {
                return Ok(outcome);
            }
            debug!(%key, attempt, "concurrent write during patch; retrying");
        }

        warn!(
            %key,
            retries = self.max_patch_retries,
            "patch retries exhausted; writing last merge unconditionally"
        );
        let current = self.store.get(key).ok_or_else(|| ServiceError::not_found(key))?;
        let outcome = merge_text(&current, patch);
        self.store.set(key, outcome.stored_text());
        Ok(outcome)
    }

    pub fn delete(&self, key: &str) -> Result<(), ServiceError> {
        let key = validate_key(key)?;
        if self.store.delete(key) {
            info!(%key, "document deleted");
            Ok(())
        } else {
            Err(ServiceError::not_found(key))
        }
    }
}

fn validate_key(key: &str) -> Result<&str, ServiceError> {
    if key.trim().is_empty() {
        return Err(ServiceError::Validation("key must not be blank".into()));
    }
    Ok(key)
}
