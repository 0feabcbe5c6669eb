//! HTTP client for the chat server's registration token admin API.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, TokenError};
use crate::session::AdminSession;
use crate::token::RegistrationToken;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const TOKENS_PATH: [&str; 4] = ["_synapse", "admin", "v1", "registration_tokens"];

/// Body of a token creation request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateTokenRequest {
    pub length: u32,
    /// Serialized as `null` for unlimited.
    pub uses_allowed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_time: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenList {
    #[serde(default)]
    registration_tokens: Vec<RegistrationToken>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: Option<String>,
}

pub struct AdminClient {
    http: reqwest::Client,
    base_url: Url,
}

impl AdminClient {
    pub fn new(server_url: &str, access_token: &str) -> Result<Self> {
        if access_token.trim().is_empty() {
            return Err(TokenError::CredentialMissing);
        }
        let base_url = Url::parse(server_url).map_err(|e| TokenError::InvalidUrl {
            url: server_url.to_string(),
            reason: e.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(TokenError::InvalidUrl {
                url: server_url.to_string(),
                reason: "not a base URL".into(),
            });
        }

        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Bearer {}", access_token.trim()))
            .map_err(|_| TokenError::CredentialMissing)?;
        headers.insert(AUTHORIZATION, auth);

        crate::ensure_crypto_provider();
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!("fedmesh/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { http, base_url })
    }

    pub fn from_session(session: &AdminSession) -> Result<Self> {
        Self::new(&session.server_url, &session.access_token)
    }

    /// Admin API URL for the token collection plus `extra` path segments.
    ///
    /// Segments are percent-encoded, so a token cannot escape its path.
    pub(crate) fn tokens_url(&self, extra: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(TOKENS_PATH).extend(extra);
        }
        url
    }

    pub async fn create_token(&self, request: &CreateTokenRequest) -> Result<RegistrationToken> {
        let url = self.tokens_url(&["new"]);
        self.send(Method::POST, url, Some(request)).await
    }

    pub async fn list_tokens(&self) -> Result<Vec<RegistrationToken>> {
        let url = self.tokens_url(&[]);
        let list: TokenList = self.send(Method::GET, url, None::<&()>).await?;
        Ok(list.registration_tokens)
    }

    pub async fn delete_token(&self, token: &str) -> Result<()> {
        let url = self.tokens_url(&[token]);
        let _: serde_json::Value = self.send(Method::DELETE, url, None::<&()>).await?;
        Ok(())
    }

    async fn send<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T> {
        debug!(%method, url = %url, "Admin API request");
        let mut req = self.http.request(method, url);
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(TokenError::Api {
                status: status.as_u16(),
                message: error_message(&text),
            });
        }
        if text.trim().is_empty() {
            return Ok(serde_json::from_str("{}")?);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// The `error` field of a JSON error body, or the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| body.trim().to_string())
}
