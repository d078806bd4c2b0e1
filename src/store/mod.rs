//! Counter persistence.
//!
//! One JSON document `{"count": n}` lives in exactly one place: a local
//! file, or a file in a GitHub repository written through the contents API.
//! Both backends implement [`CounterStore`]; the backend is chosen once at
//! startup from configuration.

pub mod file;
pub mod github;

pub use file::FileCounterStore;
pub use github::GithubCounterStore;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// The single persisted record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterDocument {
    pub count: u64,
}

impl CounterDocument {
    pub fn zero() -> Self {
        Self { count: 0 }
    }
}

/// Opaque revision id for the remote backend's conditional writes.
/// The file backend never produces one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionToken(pub String);

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid counter document: {0}")]
    Corrupt(String),
    #[error("store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("store api error: {0}")]
    Api(String),
    #[error("version token no longer current")]
    Conflict,
}

/// Load/save capability over the counter document.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Returns the current document and, for backends that version their
    /// content, the token required to write it back. A missing document
    /// reads as `{count: 0}` with no token.
    async fn load(&self) -> Result<(CounterDocument, Option<VersionToken>), StoreError>;

    /// Persists the document. When a token is supplied the write must fail
    /// with [`StoreError::Conflict`] if the stored revision has moved on.
    async fn save(
        &self,
        doc: &CounterDocument,
        token: Option<&VersionToken>,
    ) -> Result<(), StoreError>;
}

/// How many times the load-mutate-save sequence is attempted when the
/// remote backend reports a conflict.
pub const CONFLICT_RETRY_ATTEMPTS: u32 = 3;
