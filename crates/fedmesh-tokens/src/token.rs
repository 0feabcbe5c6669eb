//! Registration tokens as reported by the admin API.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One registration token.
///
/// Status is never stored; see [`RegistrationToken::status`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationToken {
    pub token: String,
    /// `None` means unlimited.
    #[serde(default)]
    pub uses_allowed: Option<u32>,
    #[serde(default)]
    pub completed: u32,
    /// Registrations started with this token but not yet finished.
    #[serde(default)]
    pub pending: u32,
    /// Epoch milliseconds; `None` never expires.
    #[serde(default)]
    pub expiry_time: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenStatus {
    Active,
    Expired,
    Exhausted,
}

impl fmt::Display for TokenStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Exhausted => "exhausted",
        })
    }
}

impl RegistrationToken {
    /// Status at `now_ms`. Expiry wins over exhaustion.
    pub fn status(&self, now_ms: i64) -> TokenStatus {
        if self.expiry_time.is_some_and(|t| t < now_ms) {
            TokenStatus::Expired
        } else if self.uses_allowed.is_some_and(|allowed| self.completed >= allowed) {
            TokenStatus::Exhausted
        } else {
            TokenStatus::Active
        }
    }

    /// `completed/allowed`, e.g. `2/5` or `2/unlimited`.
    pub fn uses_summary(&self) -> String {
        match self.uses_allowed {
            Some(allowed) => format!("{}/{allowed}", self.completed),
            None => format!("{}/unlimited", self.completed),
        }
    }

    /// First eight characters followed by `...`.
    pub fn abbreviated(&self) -> String {
        let head: String = self.token.chars().take(8).collect();
        format!("{head}...")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn token(uses_allowed: Option<u32>, completed: u32, expiry_time: Option<i64>) -> RegistrationToken {
        RegistrationToken {
            token: "abcdefghijklmnop".into(),
            uses_allowed,
            completed,
            pending: 0,
            expiry_time,
        }
    }

    #[test]
    fn expired_regardless_of_counts() {
        assert_eq!(token(Some(3), 3, Some(NOW - 1)).status(NOW), TokenStatus::Expired);
        assert_eq!(token(Some(3), 0, Some(NOW - 1)).status(NOW), TokenStatus::Expired);
        assert_eq!(token(None, 0, Some(NOW - 1)).status(NOW), TokenStatus::Expired);
    }

    #[test]
    fn used_up_without_expiry_is_exhausted() {
        assert_eq!(token(Some(3), 3, None).status(NOW), TokenStatus::Exhausted);
        assert_eq!(token(Some(3), 4, Some(NOW + 1)).status(NOW), TokenStatus::Exhausted);
    }

    #[test]
    fn unlimited_is_never_exhausted() {
        assert_eq!(token(None, 10_000, None).status(NOW), TokenStatus::Active);
    }

    #[test]
    fn expiry_exactly_now_is_still_active() {
        assert_eq!(token(Some(1), 0, Some(NOW)).status(NOW), TokenStatus::Active);
    }

    #[test]
    fn display_helpers() {
        assert_eq!(token(Some(5), 2, None).uses_summary(), "2/5");
        assert_eq!(token(None, 2, None).uses_summary(), "2/unlimited");
        assert_eq!(token(None, 0, None).abbreviated(), "abcdefgh...");
        assert_eq!(TokenStatus::Exhausted.to_string(), "exhausted");
    }

    #[test]
    fn missing_counts_default_to_zero() {
        let t: RegistrationToken =
            serde_json::from_str(r#"{"token": "abc", "uses_allowed": null}"#).unwrap();
        assert_eq!(t.completed, 0);
        assert_eq!(t.pending, 0);
        assert_eq!(t.uses_allowed, None);
        assert_eq!(t.expiry_time, None);
    }
}
