//! Local-file counter backend: one pretty-printed JSON file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::warn;

use super::{CounterDocument, CounterStore, StoreError, VersionToken};

pub struct FileCounterStore {
    path: PathBuf,
}

impl FileCounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_doc(&self, doc: &CounterDocument) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(doc)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;
        fs::write(&self.path, json).await?;
        Ok(())
    }
}

#[async_trait]
impl CounterStore for FileCounterStore {
    async fn load(&self) -> Result<(CounterDocument, Option<VersionToken>), StoreError> {
        if !fs::try_exists(&self.path).await? {
            // First access creates the zeroed document on disk.
            let doc = CounterDocument::zero();
            self.write_doc(&doc).await?;
            return Ok((doc, None));
        }

        let raw = fs::read_to_string(&self.path).await?;
        match serde_json::from_str::<CounterDocument>(&raw) {
            Ok(doc) => Ok((doc, None)),
            Err(err) => {
                // Unreadable content counts as no data rather than an outage.
                warn!(
                    "counter file {} is corrupt ({}), treating as zero",
                    self.path.display(),
                    err
                );
                Ok((CounterDocument::zero(), None))
            }
        }
    }

    async fn save(
        &self,
        doc: &CounterDocument,
        _token: Option<&VersionToken>,
    ) -> Result<(), StoreError> {
        self.write_doc(doc).await
    }
}
