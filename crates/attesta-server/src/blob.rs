//! Blob publisher port and adapters.
//!
//! Rendered artifacts are opaque byte blobs to the engine: it publishes them
//! under a stable key and records the returned locator on the certificate
//! row. Publishing is idempotent per key, which is what makes the
//! artifact-retry path safe — republishing after a timeout overwrites the
//! same object and yields the same locator.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::AppError;

/// Durable storage for rendered certificate artifacts.
pub trait BlobPublisher: Clone + Send + Sync + 'static {
    /// Stores `bytes` under `key` and returns the public locator.
    /// Idempotent: publishing the same key twice overwrites in place.
    fn publish(
        &self,
        key: &str,
        bytes: &[u8],
    ) -> impl Future<Output = Result<String, AppError>> + Send;

    /// Returns the public locator for `key` if a blob exists there.
    fn resolve(&self, key: &str) -> impl Future<Output = Result<Option<String>, AppError>> + Send;
}

/// Blob storage on the local filesystem, served back under a public base URL.
///
/// Keys map to paths under the artifact directory; the locator is
/// `{public_base_url}/artifacts/{key}`. Key segments are restricted to a
/// conservative character set so a key can never escape the root.
#[derive(Clone)]
pub struct FsBlobPublisher {
    root: Arc<PathBuf>,
    public_base_url: String,
}

impl FsBlobPublisher {
    pub fn new(root: impl Into<PathBuf>, public_base_url: &str) -> Self {
        Self {
            root: Arc::new(root.into()),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn locator(&self, key: &str) -> String {
        format!("{}/artifacts/{key}", self.public_base_url)
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '/'))
            || key.split('/').any(|segment| {
                segment.is_empty() || segment == "." || segment == ".."
            })
        {
            return Err(AppError::Storage(format!("invalid blob key: {key:?}")));
        }
        Ok(self.root.join(Path::new(key)))
    }
}

impl BlobPublisher for FsBlobPublisher {
    async fn publish(&self, key: &str, bytes: &[u8]) -> Result<String, AppError> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("creating {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, bytes)
            .await
            .map_err(|e| AppError::Storage(format!("writing {}: {e}", path.display())))?;
        Ok(self.locator(key))
    }

    async fn resolve(&self, key: &str) -> Result<Option<String>, AppError> {
        let path = self.path_for(key)?;
        match tokio::fs::try_exists(&path).await {
            Ok(true) => Ok(Some(self.locator(key))),
            Ok(false) => Ok(None),
            Err(e) => Err(AppError::Storage(format!(
                "checking {}: {e}",
                path.display()
            ))),
        }
    }
}

/// In-memory blob storage for tests, with a switchable outage mode.
///
/// `set_available(false)` makes every call fail with [`AppError::Storage`],
/// which is how the artifact-pending and retry paths get exercised without a
/// real storage outage.
#[derive(Clone, Default)]
pub struct MemoryBlobPublisher {
    blobs: Arc<std::sync::Mutex<std::collections::HashMap<String, Vec<u8>>>>,
    available: Arc<AtomicBool>,
}

impl MemoryBlobPublisher {
    pub fn new() -> Self {
        Self {
            blobs: Arc::default(),
            available: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Switches the simulated storage outage on (`false`) or off (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns the stored bytes for `key`, if published.
    pub fn bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().ok()?.get(key).cloned()
    }

    fn check_available(&self) -> Result<(), AppError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::Storage("blob storage unavailable".to_string()))
        }
    }
}

impl BlobPublisher for MemoryBlobPublisher {
    async fn publish(&self, key: &str, bytes: &[u8]) -> Result<String, AppError> {
        self.check_available()?;
        let mut blobs = self
            .blobs
            .lock()
            .map_err(|_| AppError::Internal("blob store mutex poisoned".to_string()))?;
        blobs.insert(key.to_string(), bytes.to_vec());
        Ok(format!("memory://{key}"))
    }

    async fn resolve(&self, key: &str) -> Result<Option<String>, AppError> {
        self.check_available()?;
        let blobs = self
            .blobs
            .lock()
            .map_err(|_| AppError::Internal("blob store mutex poisoned".to_string()))?;
        Ok(blobs.contains_key(key).then(|| format!("memory://{key}")))
    }
}
