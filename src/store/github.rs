//! Remote counter backend: a single file in a GitHub repository, read and
//! written through the contents API.
//!
//! Reads return the file's blob sha as the version token; writes send it
//! back so a concurrent external edit fails the PUT instead of being
//! clobbered. A miss (404) reads as zero without creating anything.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{CounterDocument, CounterStore, StoreError, VersionToken};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";

const COMMIT_MESSAGE: &str = "update counter";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

pub struct GithubCounterStore {
    client: reqwest::Client,
    api_base: String,
    token: String,
    owner: String,
    repo: String,
    file_path: String,
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    content: Option<String>,
    sha: String,
}

#[derive(Debug, Serialize)]
struct PutContentsRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
}

impl GithubCounterStore {
    pub fn new(token: String, owner: String, repo: String, file_path: String) -> Self {
        Self::with_api_base(token, owner, repo, file_path, DEFAULT_API_BASE.to_string())
    }

    pub fn with_api_base(
        token: String,
        owner: String,
        repo: String,
        file_path: String,
        api_base: String,
    ) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            api_base: api_base.trim_end_matches('/').to_string(),
            token,
            owner,
            repo,
            file_path,
        }
    }

    fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base, self.owner, self.repo, self.file_path
        )
    }

    fn request(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/vnd.github+json")
            .header("User-Agent", "pillbot")
    }

    fn decode_document(raw: &str) -> Result<CounterDocument, StoreError> {
        // The contents API wraps base64 with embedded newlines.
        let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(cleaned.as_bytes())
            .map_err(|err| StoreError::Api(format!("invalid base64 content: {}", err)))?;
        let text = String::from_utf8(bytes)
            .map_err(|err| StoreError::Api(format!("invalid UTF-8 content: {}", err)))?;
        serde_json::from_str(&text).map_err(|err| StoreError::Corrupt(err.to_string()))
    }
}

#[async_trait]
impl CounterStore for GithubCounterStore {
    async fn load(&self) -> Result<(CounterDocument, Option<VersionToken>), StoreError> {
        let response = self
            .request(self.client.get(self.contents_url()))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok((CounterDocument::zero(), None));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Api(format!("GET {}: {}", status, body)));
        }

        let contents: ContentsResponse = response
            .json()
            .await
            .map_err(|err| StoreError::Api(format!("unparseable contents response: {}", err)))?;
        let token = VersionToken(contents.sha);

        let raw = match contents.content {
            Some(raw) => raw,
            None => return Err(StoreError::Api("contents response without content".into())),
        };

        match Self::decode_document(&raw) {
            Ok(doc) => Ok((doc, Some(token))),
            Err(StoreError::Corrupt(err)) => {
                // Keep the sha so the next save still replaces this revision.
                warn!(
                    "remote counter document {} is corrupt ({}), treating as zero",
                    self.file_path, err
                );
                Ok((CounterDocument::zero(), Some(token)))
            }
            Err(other) => Err(other),
        }
    }

    async fn save(
        &self,
        doc: &CounterDocument,
        token: Option<&VersionToken>,
    ) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(doc)
            .map_err(|err| StoreError::Corrupt(err.to_string()))?;
        let body = PutContentsRequest {
            message: COMMIT_MESSAGE,
            content: BASE64.encode(json.as_bytes()),
            sha: token.map(|t| t.0.as_str()),
        };

        let response = self
            .request(self.client.put(self.contents_url()))
            .json(&body)
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY => Err(StoreError::Conflict),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(StoreError::Api(format!("PUT {}: {}", status, body)))
            }
        }
    }
}
