//! Token operations with the lifecycle rules applied.

use std::time::SystemTime;

use tracing::info;

use crate::client::{AdminClient, CreateTokenRequest};
use crate::duration::{expiry_deadline, now_millis};
use crate::error::Result;
use crate::session::AdminSession;
use crate::token::{RegistrationToken, TokenStatus};

/// Length of generated tokens.
pub const TOKEN_LENGTH: u32 = 16;

/// A listed token with its status at listing time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenListing {
    pub token: RegistrationToken,
    pub status: TokenStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    Revoked,
    /// The operator declined; nothing was sent.
    Cancelled,
}

pub struct TokenManager {
    client: AdminClient,
}

impl TokenManager {
    pub const fn new(client: AdminClient) -> Self {
        Self { client }
    }

    pub fn from_session(session: &AdminSession) -> Result<Self> {
        Ok(Self::new(AdminClient::from_session(session)?))
    }

    /// Create a token.
    ///
    /// `uses` defaults to a single use and `Some(0)` means unlimited.
    /// `expires` is a duration such as `7d`, counted from now.
    pub async fn create(&self, uses: Option<u32>, expires: Option<&str>) -> Result<RegistrationToken> {
        let request = create_request(uses, expires, SystemTime::now())?;
        let token = self.client.create_token(&request).await?;
        info!(
            token = %token.abbreviated(),
            uses_allowed = ?token.uses_allowed,
            expiry_time = ?token.expiry_time,
            "Created registration token"
        );
        Ok(token)
    }

    /// All tokens with their status; only active ones when `active_only`.
    pub async fn list(&self, active_only: bool) -> Result<Vec<TokenListing>> {
        let tokens = self.client.list_tokens().await?;
        Ok(classify(tokens, now_millis(), active_only))
    }

    /// Delete `token` once `confirm` approves it.
    pub async fn revoke(
        &self,
        token: &str,
        confirm: impl FnOnce(&str) -> bool + Send,
    ) -> Result<RevokeOutcome> {
        if !confirm(token) {
            return Ok(RevokeOutcome::Cancelled);
        }
        self.client.delete_token(token).await?;
        info!(token = %token, "Revoked registration token");
        Ok(RevokeOutcome::Revoked)
    }
}

fn create_request(
    uses: Option<u32>,
    expires: Option<&str>,
    now: SystemTime,
) -> Result<CreateTokenRequest> {
    let uses_allowed = match uses {
        None => Some(1),
        Some(0) => None,
        Some(n) => Some(n),
    };
    let expiry_time = expires.map(|d| expiry_deadline(d, now)).transpose()?;
    Ok(CreateTokenRequest {
        length: TOKEN_LENGTH,
        uses_allowed,
        expiry_time,
    })
}

/// Derive every status first, then filter.
fn classify(tokens: Vec<RegistrationToken>, now_ms: i64, active_only: bool) -> Vec<TokenListing> {
    tokens
        .into_iter()
        .map(|token| {
            let status = token.status(now_ms);
            TokenListing { token, status }
        })
        .filter(|l| !active_only || l.status == TokenStatus::Active)
        .collect()
}
