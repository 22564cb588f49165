//! Draft snapshots — the form document plus wizard step, one per mode.
//!
//! Stored as JSON `{"formData": {...}, "step": n}` under `{prefix}:{mode}`.
//! Reads never fail: anything unreadable is logged and treated as "no
//! draft".

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::document::{FormDocument, Mode};
use crate::error::StorageError;
use crate::store::traits::KeyValueStore;
use crate::wizard::WizardStep;

/// Persisted draft of one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub form_data: FormDocument,
    pub step: WizardStep,
}

/// Reads and writes [`Snapshot`]s through a [`KeyValueStore`].
#[derive(Clone)]
pub struct SnapshotStore {
    store: Arc<dyn KeyValueStore>,
    key_prefix: String,
}

impl SnapshotStore {
    pub fn new(store: Arc<dyn KeyValueStore>, key_prefix: impl Into<String>) -> Self {
        Self {
            store,
            key_prefix: key_prefix.into(),
        }
    }

    /// Storage key for `mode`.
    pub fn key(&self, mode: Mode) -> String {
        format!("{}:{}", self.key_prefix, mode.as_str())
    }

    pub async fn save(
        &self,
        mode: Mode,
        document: &FormDocument,
        step: WizardStep,
    ) -> Result<(), StorageError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct SnapshotRef<'a> {
            form_data: &'a FormDocument,
            step: WizardStep,
        }

        let key = self.key(mode);
        let json = serde_json::to_string(&SnapshotRef {
            form_data: document,
            step,
        })?;
        self.store.set(&key, &json).await?;
        debug!(key = %key, step = step.number(), "Draft saved");
        Ok(())
    }

    /// The saved draft for `mode`, if there is a readable one.
    pub async fn load(&self, mode: Mode) -> Option<Snapshot> {
        let key = self.key(mode);
        let raw = match self.store.get(&key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to read draft");
                return None;
            }
        };

        match serde_json::from_str::<Snapshot>(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(key = %key, error = %e, "Ignoring unreadable draft");
                None
            }
        }
    }

    pub async fn clear(&self, mode: Mode) -> Result<(), StorageError> {
        let key = self.key(mode);
        if self.store.remove(&key).await? {
            debug!(key = %key, "Draft cleared");
        }
        Ok(())
    }
}
