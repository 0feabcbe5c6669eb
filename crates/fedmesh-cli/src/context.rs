//! Resolved configuration plus the collaborators built from it.

use std::path::Path;

use anyhow::{Context as _, Result};
use fedmesh_core::Config;
use fedmesh_core::config::{SourceKind, load_config};
use fedmesh_discovery::store::GitHubStoreConfig;
use fedmesh_discovery::{FileSource, GitHubContentStore, LogSource, Publisher, UrlSource};

use crate::compose::ServiceController;
use crate::github_env::{self, GhIdentity};

/// Command-line overrides for the configuration file and environment.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct NodeArgs {
    /// Node name (defaults to the repository owner)
    #[arg(long)]
    pub node: Option<String>,

    /// Store repository as owner/name
    #[arg(long)]
    pub repo: Option<String>,

    /// Store branch (defaults to the repository default branch)
    #[arg(long)]
    pub branch: Option<String>,
}

impl NodeArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(node) = &self.node {
            config.node.name = Some(node.clone());
        }
        if let Some(repo) = &self.repo {
            config.store.repo = Some(repo.clone());
        }
        if let Some(branch) = &self.branch {
            config.store.branch = Some(branch.clone());
        }
    }
}

/// Load configuration for `project_dir`, apply CLI overrides, then fill
/// whatever is still missing from `gh`.
pub async fn resolve_config(project_dir: &Path, args: &NodeArgs) -> Result<Config> {
    let mut config = load_config(Some(project_dir)).context("failed to load configuration")?;
    args.apply(&mut config);
    if github_env::needs_gh(&config) {
        github_env::apply(&mut config, GhIdentity::query().await);
    }
    Ok(config)
}

/// GitHub-backed content store for the configured repository.
pub fn content_store(config: &Config) -> Result<GitHubContentStore> {
    let store = GitHubContentStore::new(&GitHubStoreConfig {
        api_base: config.store.api_base.clone(),
        repo: config.store_repo()?.to_string(),
        token: config.store_token()?.to_string(),
        branch: config.store.branch.clone(),
    })?;
    Ok(store)
}

pub fn publisher(config: &Config) -> Result<Publisher<GitHubContentStore>> {
    Ok(
        Publisher::new(content_store(config)?, config.store.documents_dir.clone())
            .with_mirror(config.watcher.mirror_path.clone()),
    )
}

/// The configured tunnel URL source.
///
/// The log source needs the orchestrator; the file source does not.
pub fn url_source(
    config: &Config,
    services: Option<&ServiceController>,
) -> Result<Box<dyn UrlSource>> {
    match config.tunnel.source {
        SourceKind::File => Ok(Box::new(FileSource::new(&config.tunnel.url_file))),
        SourceKind::Log => {
            let services = services.context("the log tunnel source needs a compose command")?;
            let source = LogSource::new(
                Box::new(services.log_feed()),
                &config.tunnel.host_suffix,
                config.tunnel.tail_lines,
            )
            .context("invalid tunnel host suffix")?;
            Ok(Box::new(source))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_loaded_values() {
        let mut config = Config::default();
        config.node.name = Some("from-env".into());
        NodeArgs {
            node: Some("from-flag".into()),
            repo: None,
            branch: Some("pages".into()),
        }
        .apply(&mut config);
        assert_eq!(config.node.name.as_deref(), Some("from-flag"));
        assert_eq!(config.store.branch.as_deref(), Some("pages"));
        assert!(config.store.repo.is_none());
    }

    #[test]
    fn store_requires_token() {
        let mut config = Config::default();
        config.store.repo = Some("alice/mesh".into());
        let err = content_store(&config).unwrap_err();
        assert!(err.to_string().contains("store.token"), "{err}");
    }

    #[test]
    fn log_source_requires_services() {
        let mut config = Config::default();
        config.tunnel.source = SourceKind::Log;
        assert!(url_source(&config, None).is_err());

        let services =
            ServiceController::new(vec!["docker".into(), "compose".into()], "cloudflared");
        let source = url_source(&config, Some(&services)).unwrap();
        assert!(source.describe().starts_with("log pattern"));
    }

    #[test]
    fn file_source_is_the_default() {
        let source = url_source(&Config::default(), None).unwrap();
        assert!(source.describe().contains("runtime/tunnel-url"));
    }
}
