//! Bundle persistence seam.
//!
//! Persistence is an opaque write operation: (bundle identifier, serialised
//! document, creation timestamp) in, success or a [`StoreError`] out. The
//! store is append/replace-by-id: saving an existing identifier overwrites
//! the previous row, and no version history is kept. Writes are synchronous
//! and never retried by the core; a failure surfaces to the boundary as a
//! distinguishable server-side error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use medex_uuid::CanonicalId;

/// Errors raised by bundle stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid bundle identifier: {0}")]
    InvalidId(String),

    #[error("failed to create storage directory: {0}")]
    DirCreation(std::io::Error),

    #[error("failed to write bundle row: {0}")]
    FileWrite(std::io::Error),

    #[error("failed to serialise bundle row: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// One stored row: the document plus its creation timestamp as an audit trail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredRow {
    pub document: String,
    pub created_at: String,
}

/// The opaque persistence collaborator.
pub trait BundleStore: Send + Sync {
    /// Durably store `document` under `bundle_id`, replacing any previous row
    /// with the same identifier.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the row could not be written.
    fn save(&self, bundle_id: &str, document: &str, created_at: &str) -> Result<(), StoreError>;
}

/// File-backed store writing one JSON row per bundle.
///
/// Rows live under sharded directories derived from the identifier's trailing
/// canonical UUID: `<root>/<s1>/<s2>/<bundle_id>.json` where `s1`/`s2` are the
/// first four hex characters. Sharding prevents very large fan-out in a single
/// directory as bundles accumulate.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `<root>/<s1>/<s2>/<bundle_id>.json` for a well-formed identifier.
    fn row_path(&self, bundle_id: &str) -> Result<PathBuf, StoreError> {
        // Generated identifiers are `bundle-<32hex>`; shard on the hex tail.
        let hex = bundle_id.rsplit('-').next().unwrap_or(bundle_id);
        let canonical = CanonicalId::parse(hex)
            .map_err(|_| StoreError::InvalidId(bundle_id.to_owned()))?
            .to_string();
        Ok(self
            .root
            .join(&canonical[0..2])
            .join(&canonical[2..4])
            .join(format!("{bundle_id}.json")))
    }
}

impl BundleStore for FileStore {
    fn save(&self, bundle_id: &str, document: &str, created_at: &str) -> Result<(), StoreError> {
        let path = self.row_path(bundle_id)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(StoreError::DirCreation)?;
        }

        // Mirror of the original single-table schema: id, json, created_at.
        let row = serde_json::json!({
            "id": bundle_id,
            "json": document,
            "created_at": created_at,
        });
        std::fs::write(&path, serde_json::to_vec(&row)?).map_err(StoreError::FileWrite)?;

        tracing::debug!(bundle_id, path = %path.display(), "bundle row written");
        Ok(())
    }
}

/// In-memory store for tests and ephemeral runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, StoredRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored row for `bundle_id`, if any.
    pub fn get(&self, bundle_id: &str) -> Option<StoredRow> {
        self.rows
            .lock()
            .expect("store mutex poisoned")
            .get(bundle_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("store mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BundleStore for MemoryStore {
    fn save(&self, bundle_id: &str, document: &str, created_at: &str) -> Result<(), StoreError> {
        self.rows.lock().expect("store mutex poisoned").insert(
            bundle_id.to_owned(),
            StoredRow {
                document: document.to_owned(),
                created_at: created_at.to_owned(),
            },
        );
        Ok(())
    }
}

/// Allow boundaries to hold the store behind a shared pointer.
impl<S: BundleStore + ?Sized> BundleStore for std::sync::Arc<S> {
    fn save(&self, bundle_id: &str, document: &str, created_at: &str) -> Result<(), StoreError> {
        (**self).save(bundle_id, document, created_at)
    }
}
