//! Reachability verifier.
//!
//! `Stale` and `Unreachable` mean different things to an operator: a stale
//! URL no longer resolves because the tunnel rotated away (restart the
//! tunnel), an unreachable one resolves but the server behind it does not
//! answer the health probe (investigate the server).

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use tracing::debug;

/// Path of the chat server's health probe under a node URL.
pub const HEALTH_PATH: &str = "/_matrix/client/versions";

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const RESOLVE_TIMEOUT: Duration = Duration::from_secs(5);

/// Verdict for one published URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationResult {
    /// The health probe answered 200.
    Live,
    /// The host resolves but the probe failed; carries the status or error.
    Unreachable(String),
    /// DNS has no answer for the host any more.
    Stale,
}

impl VerificationResult {
    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live)
    }

    /// What an operator should do about this verdict.
    pub const fn remedy(&self) -> Option<&'static str> {
        match self {
            Self::Live => None,
            Self::Unreachable(_) => Some("the tunnel resolves; check the server behind it"),
            Self::Stale => Some("the tunnel URL is stale; run `fedmesh tunnel restart`"),
        }
    }
}

impl fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Live => write!(f, "LIVE"),
            Self::Unreachable(reason) => write!(f, "UNREACHABLE ({reason})"),
            Self::Stale => write!(f, "STALE (DNS lookup failed)"),
        }
    }
}

/// Verdict plus the addresses the host resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verification {
    pub addresses: Vec<IpAddr>,
    pub result: VerificationResult,
}

/// DNS resolution, injectable for tests.
#[async_trait]
pub trait HostResolver: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl HostResolver for SystemResolver {
    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Vec<IpAddr>> {
        let lookup = tokio::net::lookup_host((host, port));
        let addrs = tokio::time::timeout(RESOLVE_TIMEOUT, lookup)
            .await
            .map_err(|_| {
                std::io::Error::new(std::io::ErrorKind::TimedOut, "DNS lookup timed out")
            })??;
        let mut ips: Vec<IpAddr> = addrs.map(|a| a.ip()).collect();
        ips.sort();
        ips.dedup();
        Ok(ips)
    }
}

pub struct Verifier<R = SystemResolver> {
    http: reqwest::Client,
    resolver: R,
}

impl Verifier<SystemResolver> {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_resolver(SystemResolver)
    }
}

impl<R: HostResolver> Verifier<R> {
    pub fn with_resolver(resolver: R) -> Result<Self, reqwest::Error> {
        crate::ensure_crypto_provider();
        let http = reqwest::Client::builder()
            .user_agent(concat!("fedmesh/", env!("CARGO_PKG_VERSION")))
            .timeout(PROBE_TIMEOUT)
            .build()?;
        Ok(Self { http, resolver })
    }

    /// Classify `url` as live, unreachable or stale.
    pub async fn verify(&self, url: &str) -> VerificationResult {
        self.verify_detailed(url).await.result
    }

    /// Like [`Self::verify`], also reporting the resolved addresses.
    pub async fn verify_detailed(&self, url: &str) -> Verification {
        let unreachable = |reason: String| Verification {
            addresses: Vec::new(),
            result: VerificationResult::Unreachable(reason),
        };

        let parsed = match Url::parse(url.trim()) {
            Ok(u) => u,
            Err(e) => return unreachable(format!("invalid URL {url:?}: {e}")),
        };
        let (Some(host), Some(port)) = (parsed.host_str(), parsed.port_or_known_default()) else {
            return unreachable(format!("invalid URL {url:?}: no host"));
        };
        let host = host.trim_start_matches('[').trim_end_matches(']');

        let addresses = match self.resolver.resolve(host, port).await {
            Ok(addrs) if !addrs.is_empty() => addrs,
            Ok(_) => {
                debug!(%host, "DNS returned no addresses");
                return Verification {
                    addresses: Vec::new(),
                    result: VerificationResult::Stale,
                };
            }
            Err(e) => {
                debug!(%host, error = %e, "DNS resolution failed");
                return Verification {
                    addresses: Vec::new(),
                    result: VerificationResult::Stale,
                };
            }
        };

        let result = self.probe(&health_url(url)).await;
        Verification { addresses, result }
    }

    async fn probe(&self, health_url: &str) -> VerificationResult {
        debug!(url = %health_url, "Probing health endpoint");
        match self.http.get(health_url).send().await {
            Ok(resp) if resp.status() == StatusCode::OK => VerificationResult::Live,
            Ok(resp) => VerificationResult::Unreachable(format!("HTTP {}", resp.status().as_u16())),
            Err(e) => VerificationResult::Unreachable(e.to_string()),
        }
    }
}

/// Health probe URL under a node base URL.
pub fn health_url(base: &str) -> String {
    format!("{}{HEALTH_PATH}", base.trim().trim_end_matches('/'))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct NoAnswer;

    #[async_trait]
    impl HostResolver for NoAnswer {
        async fn resolve(&self, _host: &str, _port: u16) -> std::io::Result<Vec<IpAddr>> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn health_url_strips_trailing_slash() {
        assert_eq!(
            health_url("https://a.trycloudflare.com/"),
            "https://a.trycloudflare.com/_matrix/client/versions"
        );
    }

    #[test]
    fn remedies_distinguish_stale_from_unreachable() {
        assert!(VerificationResult::Live.remedy().is_none());
        assert!(
            VerificationResult::Stale
                .remedy()
                .unwrap()
                .contains("tunnel restart")
        );
        assert!(
            VerificationResult::Unreachable("HTTP 502".into())
                .remedy()
                .unwrap()
                .contains("server")
        );
    }

    #[tokio::test]
    async fn empty_dns_answer_is_stale() {
        let verifier = Verifier::with_resolver(NoAnswer).unwrap();
        assert_eq!(
            verifier.verify("https://gone.trycloudflare.com").await,
            VerificationResult::Stale
        );
    }

    #[tokio::test]
    async fn unparseable_url_is_unreachable_not_stale() {
        let verifier = Verifier::with_resolver(NoAnswer).unwrap();
        assert!(matches!(
            verifier.verify("not a url").await,
            VerificationResult::Unreachable(_)
        ));
    }
}
