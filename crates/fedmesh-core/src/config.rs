//! Configuration resolution for fedmesh.
//!
//! Implements hierarchical config resolution:
//! 1. Built-in defaults
//! 2. Global config (~/.config/fedmesh/settings.json)
//! 3. Project config (.fedmesh/settings.json)
//! 4. Environment variables
//! 5. CLI arguments (highest priority, applied by the binary)

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Complete fedmesh configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub tunnel: TunnelSourceConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub local: LocalConfig,
}

/// Identity of this federation node.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeConfig {
    /// Unique node name; defaults to the owner of the store repository.
    pub name: Option<String>,
}

/// Remote content store (GitHub repository backing the static site).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Repository slug, e.g. "david-wolgemuth/frederick-matrix".
    pub repo: Option<String>,
    /// Branch to commit to; the repository default branch when unset.
    pub branch: Option<String>,
    pub api_base: String,
    /// API token. Never written back to disk.
    #[serde(skip_serializing)]
    pub token: Option<String>,
    /// Directory under which each node's `server.json` lives.
    pub documents_dir: String,
    /// Base URL of the published static site; derived from `repo` when unset.
    pub pages_base: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            repo: None,
            branch: None,
            api_base: "https://api.github.com".to_string(),
            token: None,
            documents_dir: "servers".to_string(),
            pages_base: None,
        }
    }
}

/// Which tunnel URL source strategy to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Poll the shared file the tunnel sidecar writes.
    #[default]
    File,
    /// Scrape the tunnel daemon's recent log output.
    Log,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Log => write!(f, "log"),
        }
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "file" => Ok(Self::File),
            "log" => Ok(Self::Log),
            other => Err(format!("unknown source: {other} (expected 'file' or 'log')")),
        }
    }
}

/// Tunnel URL source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TunnelSourceConfig {
    pub source: SourceKind,
    pub url_file: PathBuf,
    /// Orchestrated service name of the tunnel daemon.
    pub service: String,
    pub host_suffix: String,
    pub tail_lines: usize,
    /// Deadline for `tunnel restart` to observe a fresh URL (seconds).
    pub restart_timeout_secs: u64,
}

impl Default for TunnelSourceConfig {
    fn default() -> Self {
        Self {
            source: SourceKind::File,
            url_file: PathBuf::from("runtime/tunnel-url"),
            service: "cloudflared".to_string(),
            host_suffix: "trycloudflare.com".to_string(),
            tail_lines: 100,
            restart_timeout_secs: 60,
        }
    }
}

/// Watcher loop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherConfig {
    pub poll_interval_secs: u64,
    /// Local copy of the last document the publisher attempted to write.
    pub mirror_path: Option<PathBuf>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 60,
            mirror_path: Some(PathBuf::from("server.json")),
        }
    }
}

impl WatcherConfig {
    /// Poll interval, never shorter than one second.
    pub const fn poll_interval(&self) -> Duration {
        if self.poll_interval_secs == 0 {
            Duration::from_secs(1)
        } else {
            Duration::from_secs(self.poll_interval_secs)
        }
    }
}

/// Locally served endpoints probed by `status localhost`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalConfig {
    pub server_url: String,
    pub web_url: String,
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8008".to_string(),
            web_url: "http://localhost:8080".to_string(),
        }
    }
}

impl Config {
    /// This node's name, or `ConfigMissing` with guidance.
    pub fn node_name(&self) -> Result<&str> {
        self.node.name.as_deref().ok_or(Error::ConfigMissing {
            setting: "node.name",
            hint: "set NODE_NAME or pass --node",
        })
    }

    pub fn store_repo(&self) -> Result<&str> {
        self.store.repo.as_deref().ok_or(Error::ConfigMissing {
            setting: "store.repo",
            hint: "set GITHUB_REPO or pass --repo",
        })
    }

    pub fn store_token(&self) -> Result<&str> {
        self.store.token.as_deref().ok_or(Error::ConfigMissing {
            setting: "store.token",
            hint: "set GITHUB_TOKEN or run `gh auth login`",
        })
    }

    /// Static site base URL, e.g. `https://owner.github.io/repo`.
    pub fn pages_base(&self) -> Option<String> {
        if let Some(base) = &self.store.pages_base {
            return Some(base.trim_end_matches('/').to_string());
        }
        let (owner, repo) = self.store.repo.as_deref()?.split_once('/')?;
        Some(format!("https://{owner}.github.io/{repo}"))
    }
}

/// Load configuration with hierarchical resolution.
pub fn load_config(project_dir: Option<&Path>) -> Result<Config> {
    let mut layers = Vec::new();

    if let Some(global_path) = global_config_path()
        && global_path.exists()
    {
        layers.push(load_config_file(&global_path)?);
    }

    if let Some(dir) = project_dir {
        let project_path = dir.join(".fedmesh").join("settings.json");
        if project_path.exists() {
            layers.push(load_config_file(&project_path)?);
        }
    }

    let mut config = config_from_layers(layers)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    Ok(config)
}

/// Get the global config file path.
pub fn global_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("fedmesh").join("settings.json"))
}

/// Parse one settings file without applying defaults, so absent keys stay
/// absent and lower layers show through.
fn load_config_file(path: &Path) -> Result<Value> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
    })?;
    let value: Value = serde_json::from_str(&content).map_err(|e| {
        Error::Config(format!("Failed to parse config file {}: {}", path.display(), e))
    })?;
    if !value.is_object() {
        return Err(Error::Config(format!(
            "Config file {} must contain a JSON object",
            path.display()
        )));
    }
    Ok(value)
}

/// Merge `overlay` into `base` key by key; nested objects merge recursively,
/// everything else is replaced.
fn merge_config(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_config(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Fold settings layers (lowest priority first) over the built-in defaults.
fn config_from_layers(layers: impl IntoIterator<Item = Value>) -> Result<Config> {
    let mut merged = Value::Object(Map::new());
    for layer in layers {
        merge_config(&mut merged, layer);
    }
    serde_json::from_value(merged)
        .map_err(|e| Error::Config(format!("Invalid configuration: {e}")))
}

/// Apply environment overrides using `lookup` to read variables.
pub fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    let lookup = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(val) = lookup("NODE_NAME") {
        config.node.name = Some(val);
    }
    if let Some(val) = lookup("GITHUB_REPO") {
        config.store.repo = Some(val);
    }
    if let Some(val) = lookup("GITHUB_TOKEN") {
        config.store.token = Some(val);
    }
    if let Some(val) = lookup("GITHUB_BRANCH") {
        config.store.branch = Some(val);
    }
    if let Some(val) = lookup("POLL_INTERVAL") {
        match val.parse() {
            Ok(n) => config.watcher.poll_interval_secs = n,
            Err(_) => tracing::warn!(value = %val, "ignoring non-numeric POLL_INTERVAL"),
        }
    }
    if let Some(val) = lookup("FEDMESH_TUNNEL_URL_FILE") {
        config.tunnel.url_file = PathBuf::from(val);
    }
    if let Some(val) = lookup("FEDMESH_TUNNEL_SOURCE") {
        match val.parse() {
            Ok(kind) => config.tunnel.source = kind,
            Err(e) => tracing::warn!("ignoring FEDMESH_TUNNEL_SOURCE: {e}"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_poll_interval_is_one_minute() {
        let config = Config::default();
        assert_eq!(config.watcher.poll_interval(), Duration::from_secs(60));
    }

    #[test]
    fn env_overrides_watcher_settings() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[
                ("NODE_NAME", "alice"),
                ("GITHUB_REPO", "alice/mesh"),
                ("GITHUB_TOKEN", " ghp_abc \n"),
                ("POLL_INTERVAL", "15"),
                ("FEDMESH_TUNNEL_SOURCE", "log"),
            ]),
        );
        assert_eq!(config.node_name().unwrap(), "alice");
        assert_eq!(config.store_repo().unwrap(), "alice/mesh");
        assert_eq!(config.store_token().unwrap(), "ghp_abc");
        assert_eq!(config.watcher.poll_interval_secs, 15);
        assert_eq!(config.tunnel.source, SourceKind::Log);
    }

    #[test]
    fn blank_and_invalid_env_values_are_ignored() {
        let mut config = Config::default();
        apply_env_overrides(
            &mut config,
            env(&[("NODE_NAME", "   "), ("POLL_INTERVAL", "soon")]),
        );
        assert!(config.node.name.is_none());
        assert_eq!(config.watcher.poll_interval_secs, 60);
    }

    #[test]
    fn missing_node_name_is_config_missing() {
        let config = Config::default();
        assert!(matches!(
            config.node_name(),
            Err(Error::ConfigMissing { setting: "node.name", .. })
        ));
    }

    #[test]
    fn pages_base_derived_from_repo() {
        let mut config = Config::default();
        config.store.repo = Some("alice/mesh".into());
        assert_eq!(
            config.pages_base().as_deref(),
            Some("https://alice.github.io/mesh")
        );
        config.store.pages_base = Some("https://mesh.example.org/".into());
        assert_eq!(
            config.pages_base().as_deref(),
            Some("https://mesh.example.org")
        );
    }

    fn write_settings(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn project_file_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings_dir = dir.path().join(".fedmesh");
        std::fs::create_dir_all(&settings_dir).unwrap();
        let path = write_settings(
            &settings_dir,
            "settings.json",
            r#"{"node": {"name": "bob"}, "watcher": {"poll_interval_secs": 30}}"#,
        );

        let config = config_from_layers([load_config_file(&path).unwrap()]).unwrap();
        assert_eq!(config.node.name.as_deref(), Some("bob"));
        assert_eq!(config.watcher.poll_interval_secs, 30);
        assert_eq!(
            config.watcher.mirror_path.as_deref(),
            Some(Path::new("server.json"))
        );
        assert_eq!(config.tunnel.service, "cloudflared");
    }

    #[test]
    fn project_file_keeps_unset_global_settings() {
        let dir = tempfile::tempdir().unwrap();
        let global = write_settings(
            dir.path(),
            "global.json",
            r#"{
                "store": {"api_base": "https://ghe.example/api/v3", "documents_dir": "nodes"},
                "tunnel": {"source": "log", "host_suffix": "tunnel.example"},
                "watcher": {"poll_interval_secs": 15}
            }"#,
        );
        let project = write_settings(
            dir.path(),
            "project.json",
            r#"{"node": {"name": "bob"}, "tunnel": {"tail_lines": 50}}"#,
        );

        let config = config_from_layers([
            load_config_file(&global).unwrap(),
            load_config_file(&project).unwrap(),
        ])
        .unwrap();
        assert_eq!(config.node.name.as_deref(), Some("bob"));
        assert_eq!(config.tunnel.source, SourceKind::Log);
        assert_eq!(config.tunnel.host_suffix, "tunnel.example");
        assert_eq!(config.tunnel.tail_lines, 50);
        assert_eq!(config.tunnel.service, "cloudflared");
        assert_eq!(config.store.api_base, "https://ghe.example/api/v3");
        assert_eq!(config.store.documents_dir, "nodes");
        assert_eq!(config.watcher.poll_interval_secs, 15);
    }

    #[test]
    fn later_layer_wins_for_the_same_key() {
        let config = config_from_layers([
            serde_json::json!({"tunnel": {"source": "log"}, "node": {"name": "alice"}}),
            serde_json::json!({"tunnel": {"source": "file"}}),
        ])
        .unwrap();
        assert_eq!(config.tunnel.source, SourceKind::File);
        assert_eq!(config.node.name.as_deref(), Some("alice"));
    }

    #[test]
    fn non_object_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_settings(dir.path(), "settings.json", "[1, 2]");
        assert!(matches!(load_config_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn unparseable_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(load_config_file(&path), Err(Error::Config(_))));
    }

    #[test]
    fn token_is_never_serialized() {
        let mut config = Config::default();
        config.store.token = Some("secret".into());
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("secret"));
    }
}
