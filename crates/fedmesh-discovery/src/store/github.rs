//! GitHub contents API as a versioned document store.
//!
//! The blob `sha` of each file is its version tag. GitHub answers a stale
//! `sha` with 409, and a create (no `sha`) over an existing file with 422.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ContentStore, RemoteDocument, RemoteDocumentHandle};
use crate::error::StoreError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const API_VERSION: &str = "2022-11-28";

/// Connection settings for a GitHub repository.
#[derive(Debug, Clone)]
pub struct GitHubStoreConfig {
    /// API base URL (e.g., "<https://api.github.com>").
    pub api_base: String,
    /// Repository slug, "owner/name".
    pub repo: String,
    pub token: String,
    /// Branch to read and commit to; the default branch when `None`.
    pub branch: Option<String>,
}

#[derive(Debug)]
pub struct GitHubContentStore {
    http: reqwest::Client,
    base_url: String,
    repo: String,
    branch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContentsFile {
    sha: String,
    #[serde(default)]
    content: String,
}

#[derive(Debug, Deserialize)]
struct ContentsEntry {
    name: String,
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct PutContents<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    content: PutResponseContent,
}

#[derive(Debug, Deserialize)]
struct PutResponseContent {
    sha: String,
}

impl GitHubContentStore {
    pub fn new(config: &GitHubStoreConfig) -> Result<Self, StoreError> {
        if config.repo.split_once('/').is_none() {
            return Err(StoreError::Config(format!(
                "repository must be \"owner/name\", got {:?}",
                config.repo
            )));
        }
        if config.token.is_empty() {
            return Err(StoreError::Config("token is empty".into()));
        }

        let mut headers = HeaderMap::new();
        let token_val = HeaderValue::from_str(&format!("Bearer {}", config.token))
            .map_err(|_| StoreError::Config("Invalid token format".into()))?;
        headers.insert(AUTHORIZATION, token_val);
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        crate::ensure_crypto_provider();

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("fedmesh/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base.trim_end_matches('/').to_string(),
            repo: config.repo.clone(),
            branch: config.branch.clone(),
        })
    }

    /// Contents API URL for `path`, pinned to the configured branch.
    pub(crate) fn contents_url(&self, path: &str) -> Result<Url, StoreError> {
        let raw = format!(
            "{}/repos/{}/contents/{}",
            self.base_url,
            self.repo,
            path.trim_start_matches('/')
        );
        let mut url = Url::parse(&raw).map_err(|e| StoreError::Config(format!("{raw}: {e}")))?;
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        Ok(url)
    }

    async fn error_from(resp: reqwest::Response) -> StoreError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        StoreError::transport(Some(status), &body)
    }
}

fn decode_content(encoded: &str) -> Result<String, StoreError> {
    let compact: String = encoded.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact)
        .map_err(|e| StoreError::Decode(format!("content is not base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| StoreError::Decode(format!("content is not UTF-8: {e}")))
}

#[async_trait]
impl ContentStore for GitHubContentStore {
    async fn fetch(&self, path: &str) -> Result<Option<RemoteDocument>, StoreError> {
        let url = self.contents_url(path)?;
        debug!(%url, "GET contents");
        let resp = self.http.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let text = resp.text().await?;
        let file: ContentsFile = serde_json::from_str(&text)
            .map_err(|e| StoreError::Decode(format!("{path} is not a file: {e}")))?;
        Ok(Some(RemoteDocument {
            body: decode_content(&file.content)?,
            handle: RemoteDocumentHandle {
                path: path.to_string(),
                current_version_tag: Some(file.sha),
            },
        }))
    }

    async fn update(
        &self,
        handle: &RemoteDocumentHandle,
        body: &str,
        message: &str,
    ) -> Result<RemoteDocumentHandle, StoreError> {
        let mut url = self.contents_url(&handle.path)?;
        url.set_query(None);
        let payload = PutContents {
            message,
            content: STANDARD.encode(body.as_bytes()),
            sha: handle.current_version_tag.as_deref(),
            branch: self.branch.as_deref(),
        };

        debug!(%url, sha = ?payload.sha, "PUT contents");
        let resp = self.http.put(url).json(&payload).send().await?;
        let status = resp.status();
        let lost_race = status == StatusCode::CONFLICT
            || (status == StatusCode::UNPROCESSABLE_ENTITY && handle.current_version_tag.is_none());
        if lost_race {
            return Err(StoreError::Conflict {
                path: handle.path.clone(),
            });
        }
        if !status.is_success() {
            return Err(Self::error_from(resp).await);
        }

        let text = resp.text().await?;
        let written: PutResponse = serde_json::from_str(&text)
            .map_err(|e| StoreError::Decode(format!("unexpected PUT response: {e}")))?;
        Ok(RemoteDocumentHandle {
            path: handle.path.clone(),
            current_version_tag: Some(written.content.sha),
        })
    }

    async fn list_dirs(&self, dir: &str) -> Result<Vec<String>, StoreError> {
        let url = self.contents_url(dir)?;
        let resp = self.http.get(url).send().await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !resp.status().is_success() {
            return Err(Self::error_from(resp).await);
        }

        let text = resp.text().await?;
        let entries: Vec<ContentsEntry> = serde_json::from_str(&text)
            .map_err(|e| StoreError::Decode(format!("{dir} is not a directory: {e}")))?;
        Ok(entries
            .into_iter()
            .filter(|e| e.kind == "dir")
            .map(|e| e.name)
            .collect())
    }
}
