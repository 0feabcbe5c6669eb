//! `fedmesh status`: diagnostics per subsystem.
//!
//! Sections never fail the command; problems are reported inline.

use std::io::{self, Write};
use std::time::Duration;

use anyhow::Result;
use fedmesh_core::{Config, TunnelRecord};
use fedmesh_discovery::store::document_path;
use fedmesh_discovery::verifier::{HEALTH_PATH, health_url};
use fedmesh_discovery::{Directory, UrlSource, Verifier};
use serde::Deserialize;

use super::Global;
use crate::compose::ServiceController;
use crate::context::{NodeArgs, content_store, resolve_config, url_source};

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);
const BODY_PREVIEW_LEN: usize = 500;
const LOG_PREVIEW_LINES: usize = 10;

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    /// Running services
    Docker,
    /// Local chat server and web client
    Localhost,
    /// Current tunnel URL and its reachability
    Tunnel,
    /// This node's record on the published static site
    Pages,
    /// Every node in the shared directory
    Federation,
}

impl Section {
    const ALL: [Self; 5] = [
        Self::Docker,
        Self::Localhost,
        Self::Tunnel,
        Self::Pages,
        Self::Federation,
    ];

    const fn title(self) -> &'static str {
        match self {
            Self::Docker => "Services",
            Self::Localhost => "Localhost",
            Self::Tunnel => "Tunnel",
            Self::Pages => "Published site",
            Self::Federation => "Federation",
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct StatusArgs {
    /// Only check one section
    #[arg(value_enum)]
    pub section: Option<Section>,

    /// One line per check instead of full detail
    #[arg(short, long)]
    pub quiet: bool,

    #[command(flatten)]
    pub node: NodeArgs,
}

/// Result of one HTTP GET.
#[derive(Debug, Clone, Default)]
pub struct HttpCheck {
    pub url: String,
    pub status: Option<u16>,
    pub body: String,
    pub error: Option<String>,
}

impl HttpCheck {
    pub fn is_ok(&self) -> bool {
        self.status == Some(200)
    }

    fn write(&self, w: &mut impl Write, verbose: bool) -> io::Result<()> {
        if !verbose {
            let status = self
                .status
                .map_or_else(|| "UNREACHABLE".to_string(), |s| s.to_string());
            let error = self
                .error
                .as_deref()
                .map_or_else(String::new, |e| format!(" ({e})"));
            return writeln!(w, "  {} -> {status}{error}", self.url);
        }
        writeln!(w, "  GET {}", self.url)?;
        if let Some(status) = self.status {
            writeln!(w, "  HTTP {status}")?;
        }
        if !self.body.is_empty() {
            let preview: String = self.body.chars().take(BODY_PREVIEW_LEN).collect();
            if preview.len() < self.body.len() {
                writeln!(w, "  Body: {preview}... ({} bytes total)", self.body.len())?;
            } else {
                writeln!(w, "  Body: {preview}")?;
            }
        }
        if let Some(error) = &self.error {
            writeln!(w, "  ERROR: {error}")?;
        }
        Ok(())
    }
}

pub async fn http_check(client: &reqwest::Client, url: &str) -> HttpCheck {
    let mut check = HttpCheck {
        url: url.to_string(),
        ..HttpCheck::default()
    };
    match client.get(url).send().await {
        Ok(resp) => {
            let status = resp.status();
            check.status = Some(status.as_u16());
            if !status.is_success() {
                check.error = Some(format!("HTTP {status}"));
            }
            match resp.text().await {
                Ok(body) => check.body = body,
                Err(e) => check.error = Some(e.to_string()),
            }
        }
        Err(e) => check.error = Some(e.to_string()),
    }
    check
}

#[derive(Debug, Deserialize)]
struct VersionsBody {
    #[serde(default)]
    versions: Vec<String>,
}

/// `"<count> (<first> .. <last>)"` for a client versions body.
pub fn summarize_versions(body: &str) -> Option<String> {
    let parsed: VersionsBody = serde_json::from_str(body).ok()?;
    let first = parsed.versions.first()?;
    let last = parsed.versions.last()?;
    Some(format!("{} ({first} .. {last})", parsed.versions.len()))
}

fn section_header(w: &mut impl Write, title: &str) -> io::Result<()> {
    let rule = "=".repeat(60);
    writeln!(w, "\n{rule}\n  {title}\n{rule}\n")
}

pub async fn run(args: &StatusArgs, global: &Global) -> Result<()> {
    let config = resolve_config(&global.project_dir, &args.node).await?;
    let verbose = !args.quiet;
    let sections = args.section.map_or_else(|| Section::ALL.to_vec(), |s| vec![s]);

    let http = reqwest::Client::builder()
        .user_agent(concat!("fedmesh/", env!("CARGO_PKG_VERSION")))
        .timeout(PROBE_TIMEOUT)
        .build()?;
    let services = ServiceController::detect(&config.tunnel.service).await.ok();

    let mut out = io::stdout();
    for section in sections {
        section_header(&mut out, section.title())?;
        match section {
            Section::Docker => check_services(&mut out, services.as_ref(), verbose).await?,
            Section::Localhost => check_localhost(&mut out, &http, &config, verbose).await?,
            Section::Tunnel => check_tunnel(&mut out, &config, services.as_ref()).await?,
            Section::Pages => check_pages(&mut out, &http, &config, services.as_ref()).await?,
            Section::Federation => check_federation(&mut out, &config).await?,
        }
    }
    Ok(())
}

async fn check_services(
    w: &mut impl Write,
    services: Option<&ServiceController>,
    verbose: bool,
) -> Result<()> {
    let Some(services) = services else {
        writeln!(
            w,
            "  No compose command found (docker compose, docker-compose, podman compose)."
        )?;
        return Ok(());
    };
    match services.ps().await {
        Some(ps) => writeln!(w, "{ps}")?,
        None => writeln!(w, "  compose ps failed; is the project directory correct?")?,
    }
    if verbose {
        writeln!(
            w,
            "\n--- Recent {} logs (last {LOG_PREVIEW_LINES}) ---",
            services.tunnel_service()
        )?;
        if let Some(logs) = services.tunnel_logs(LOG_PREVIEW_LINES).await {
            writeln!(w, "{logs}")?;
        }
    }
    Ok(())
}

async fn check_localhost(
    w: &mut impl Write,
    http: &reqwest::Client,
    config: &Config,
    verbose: bool,
) -> Result<()> {
    let server = config.local.server_url.trim_end_matches('/');
    writeln!(w, "--- Chat server ({server}) ---")?;
    let versions = http_check(http, &format!("{server}{HEALTH_PATH}")).await;
    versions.write(w, verbose)?;
    if versions.is_ok() {
        match summarize_versions(&versions.body) {
            Some(summary) => writeln!(w, "  Client API versions: {summary}")?,
            None => writeln!(w, "  Response has no version list")?,
        }
    }

    let web = config.local.web_url.trim_end_matches('/');
    writeln!(w, "\n--- Web client ({web}) ---")?;
    let page = http_check(http, web).await;
    page.write(w, verbose)?;
    if page.is_ok() {
        writeln!(w, "  Web client is being served")?;
    }
    Ok(())
}

async fn check_tunnel(
    w: &mut impl Write,
    config: &Config,
    services: Option<&ServiceController>,
) -> Result<()> {
    let source = match url_source(config, services) {
        Ok(source) => source,
        Err(e) => {
            writeln!(w, "  Cannot read the tunnel URL: {e:#}")?;
            return Ok(());
        }
    };
    let Some(url) = source.current_url().await else {
        writeln!(w, "  No tunnel URL found ({}).", source.describe())?;
        writeln!(
            w,
            "  Is the tunnel running? Check the `{}` service logs.",
            config.tunnel.service
        )?;
        return Ok(());
    };
    writeln!(w, "  Tunnel URL: {url}")?;

    let verifier = Verifier::new()?;
    let verification = verifier.verify_detailed(&url).await;
    if !verification.addresses.is_empty() {
        let addrs: Vec<String> = verification.addresses.iter().map(ToString::to_string).collect();
        writeln!(w, "  Resolved to: {}", addrs.join(", "))?;
    }
    writeln!(w, "  {}: {}", health_url(&url), verification.result)?;
    if let Some(remedy) = verification.result.remedy() {
        writeln!(w, "  Hint: {remedy}")?;
    }
    Ok(())
}

async fn check_pages(
    w: &mut impl Write,
    http: &reqwest::Client,
    config: &Config,
    services: Option<&ServiceController>,
) -> Result<()> {
    let Some(base) = config.pages_base() else {
        writeln!(w, "  No store repository configured; set GITHUB_REPO or log in with `gh`.")?;
        return Ok(());
    };
    let Ok(node) = config.node_name() else {
        writeln!(w, "  No node name configured; set NODE_NAME.")?;
        return Ok(());
    };
    writeln!(w, "  Site: {base}")?;

    let record_url = format!("{base}/{}", document_path(&config.store.documents_dir, node));
    let check = http_check(http, &record_url).await;
    check.write(w, false)?;
    if !check.is_ok() {
        return Ok(());
    }
    let record = match TunnelRecord::from_document(&check.body) {
        Ok(record) => record,
        Err(e) => {
            writeln!(w, "  Published record is unreadable: {e}")?;
            return Ok(());
        }
    };
    writeln!(w, "  Node name: {}", record.node_name)?;
    writeln!(w, "  Published tunnel URL: {}", record.url)?;

    let current = match url_source(config, services) {
        Ok(source) => source.current_url().await,
        Err(_) => None,
    };
    match current {
        Some(url) if url == record.url => writeln!(w, "  Matches the current tunnel URL")?,
        Some(url) => writeln!(
            w,
            "  Differs from the current tunnel URL {url}; the site may not be redeployed yet"
        )?,
        None => {}
    }
    Ok(())
}

async fn check_federation(w: &mut impl Write, config: &Config) -> Result<()> {
    let store = match content_store(config) {
        Ok(store) => store,
        Err(e) => {
            writeln!(w, "  Cannot open the shared directory: {e:#}")?;
            return Ok(());
        }
    };
    let records = match Directory::new(&store, &config.store.documents_dir)
        .records()
        .await
    {
        Ok(records) => records,
        Err(e) => {
            writeln!(w, "  Cannot list nodes: {e}")?;
            return Ok(());
        }
    };
    if records.is_empty() {
        writeln!(w, "  No nodes have published a record yet.")?;
        return Ok(());
    }

    let verifier = Verifier::new()?;
    for record in records {
        let result = verifier.verify(&record.url).await;
        writeln!(w, "  {:<20} {:<48} {result}", record.node_name, record.url)?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn render(check: &HttpCheck, verbose: bool) -> String {
        let mut buf = Vec::new();
        check.write(&mut buf, verbose).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn versions_summary() {
        assert_eq!(
            summarize_versions(r#"{"versions": ["r0.6.1", "v1.1", "v1.11"]}"#).as_deref(),
            Some("3 (r0.6.1 .. v1.11)")
        );
        assert_eq!(summarize_versions(r#"{"versions": []}"#), None);
        assert_eq!(summarize_versions("<html>"), None);
    }

    #[test]
    fn quiet_line_for_unreachable() {
        let check = HttpCheck {
            url: "http://localhost:8008".into(),
            error: Some("connection refused".into()),
            ..HttpCheck::default()
        };
        assert_eq!(
            render(&check, false),
            "  http://localhost:8008 -> UNREACHABLE (connection refused)\n"
        );
    }

    #[test]
    fn verbose_body_is_truncated() {
        let check = HttpCheck {
            url: "http://x".into(),
            status: Some(200),
            body: "a".repeat(BODY_PREVIEW_LEN + 10),
            error: None,
        };
        let out = render(&check, true);
        assert!(out.contains("HTTP 200"));
        assert!(out.contains(&format!("... ({} bytes total)", BODY_PREVIEW_LEN + 10)));
    }

    #[tokio::test]
    async fn http_check_records_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_matrix/client/versions"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"versions":["v1.11"]}"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        crate::install_crypto_provider();
        let client = reqwest::Client::new();
        let ok = http_check(&client, &format!("{}/_matrix/client/versions", server.uri())).await;
        assert!(ok.is_ok());
        assert_eq!(summarize_versions(&ok.body).as_deref(), Some("1 (v1.11 .. v1.11)"));

        let missing = http_check(&client, &format!("{}/missing", server.uri())).await;
        assert_eq!(missing.status, Some(404));
        assert!(missing.error.is_some());
    }

    #[test]
    fn all_sections_in_display_order() {
        assert_eq!(Section::ALL[0], Section::Docker);
        assert_eq!(Section::ALL[4].title(), "Federation");
    }
}
