//! Fill store credentials from the `gh` CLI when they are not configured.

use fedmesh_core::Config;

use crate::cmd::run_cmd_output;

/// What the local `gh` login knows about the current repository.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GhIdentity {
    pub token: Option<String>,
    /// `owner/name` of the repository in the working directory.
    pub repo: Option<String>,
}

impl GhIdentity {
    /// Ask `gh`; a missing or unauthenticated `gh` yields empty fields.
    pub async fn query() -> Self {
        let token = run_cmd_output("gh", &["auth", "token"]).await;
        let repo = run_cmd_output(
            "gh",
            &["repo", "view", "--json", "nameWithOwner", "-q", ".nameWithOwner"],
        )
        .await;
        Self {
            token: token.filter(|t| !t.is_empty()),
            repo: repo.filter(|r| r.contains('/')),
        }
    }
}

/// Owner part of an `owner/name` slug.
pub fn repo_owner(repo: &str) -> Option<&str> {
    repo.split_once('/')
        .map(|(owner, _)| owner)
        .filter(|o| !o.is_empty())
}

/// Whether any setting `gh` could provide is still missing.
pub fn needs_gh(config: &Config) -> bool {
    config.store.token.is_none() || config.store.repo.is_none() || config.node.name.is_none()
}

/// Fill unset token and repo from `identity`; the node name then defaults to
/// the repository owner.
pub fn apply(config: &mut Config, identity: GhIdentity) {
    if config.store.token.is_none() {
        config.store.token = identity.token;
    }
    if config.store.repo.is_none() {
        config.store.repo = identity.repo;
    }
    if config.node.name.is_none() {
        config.node.name = config
            .store
            .repo
            .as_deref()
            .and_then(repo_owner)
            .map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> GhIdentity {
        GhIdentity {
            token: Some("gho_cli".into()),
            repo: Some("alice/mesh".into()),
        }
    }

    #[test]
    fn fills_everything_from_gh() {
        let mut config = Config::default();
        assert!(needs_gh(&config));
        apply(&mut config, identity());
        assert_eq!(config.store.token.as_deref(), Some("gho_cli"));
        assert_eq!(config.store.repo.as_deref(), Some("alice/mesh"));
        assert_eq!(config.node.name.as_deref(), Some("alice"));
        assert!(!needs_gh(&config));
    }

    #[test]
    fn configured_values_win() {
        let mut config = Config::default();
        config.store.repo = Some("bob/other".into());
        config.node.name = Some("bobs-node".into());
        apply(&mut config, identity());
        assert_eq!(config.store.repo.as_deref(), Some("bob/other"));
        assert_eq!(config.node.name.as_deref(), Some("bobs-node"));
        assert_eq!(config.store.token.as_deref(), Some("gho_cli"));
    }

    #[test]
    fn node_defaults_to_configured_repo_owner() {
        let mut config = Config::default();
        config.store.repo = Some("carol/mesh".into());
        apply(&mut config, GhIdentity::default());
        assert_eq!(config.node.name.as_deref(), Some("carol"));
        assert!(config.store.token.is_none());
    }

    #[test]
    fn repo_owner_requires_slash() {
        assert_eq!(repo_owner("alice/mesh"), Some("alice"));
        assert_eq!(repo_owner("mesh"), None);
        assert_eq!(repo_owner("/mesh"), None);
    }
}
