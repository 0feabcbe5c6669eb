//! Container orchestration through the compose CLI.

use std::io;

use anyhow::{Result, bail};
use async_trait::async_trait;
use fedmesh_discovery::TunnelDaemon;
use fedmesh_discovery::source::CommandLogFeed;

use crate::cmd::{command_exists, run_cmd, run_cmd_env, run_cmd_output};

/// Detect a container compose command. Checks in order:
/// `docker compose`, `docker-compose`, `podman compose`.
/// Returns the full command as a vector of strings.
pub async fn detect_compose_command() -> Result<Vec<String>> {
    // Try `docker compose` (v2 plugin)
    if command_exists("docker").await
        && run_cmd_output("docker", &["compose", "version"]).await.is_some()
    {
        tracing::debug!("detected: docker compose (v2 plugin)");
        return Ok(vec!["docker".into(), "compose".into()]);
    }

    // Try `docker-compose` (standalone v1/v2)
    if command_exists("docker-compose").await {
        tracing::debug!("detected: docker-compose (standalone)");
        return Ok(vec!["docker-compose".into()]);
    }

    // Try `podman compose`
    if command_exists("podman").await
        && run_cmd_output("podman", &["compose", "version"]).await.is_some()
    {
        tracing::debug!("detected: podman compose");
        return Ok(vec!["podman".into(), "compose".into()]);
    }

    bail!(
        "no container compose command found. \
         Install Docker (with compose plugin) or Podman (with podman-compose)."
    );
}

/// Starts, stops and inspects the node's services.
#[derive(Debug, Clone)]
pub struct ServiceController {
    compose: Vec<String>,
    tunnel_service: String,
}

impl ServiceController {
    pub fn new(compose: Vec<String>, tunnel_service: impl Into<String>) -> Self {
        Self {
            compose,
            tunnel_service: tunnel_service.into(),
        }
    }

    pub async fn detect(tunnel_service: &str) -> Result<Self> {
        Ok(Self::new(detect_compose_command().await?, tunnel_service))
    }

    pub fn tunnel_service(&self) -> &str {
        &self.tunnel_service
    }

    /// Program plus leading arguments, e.g. `("docker", ["compose", ...rest])`.
    fn split<'a>(&'a self, rest: &[&'a str]) -> (&'a str, Vec<&'a str>) {
        let (program, base) = self
            .compose
            .split_first()
            .map_or(("docker", &[][..]), |(p, b)| (p.as_str(), b));
        let mut args: Vec<&str> = base.iter().map(String::as_str).collect();
        args.extend_from_slice(rest);
        (program, args)
    }

    /// Start all services detached, with `env` added to their environment.
    pub async fn up(&self, env: &[(&str, &str)]) -> Result<()> {
        let (program, args) = self.split(&["up", "-d"]);
        run_cmd_env("Starting services", program, &args, env).await
    }

    pub async fn down(&self) -> Result<()> {
        let (program, args) = self.split(&["down"]);
        run_cmd("Stopping services", program, &args).await
    }

    /// Output of `compose ps`, or `None` when it fails.
    pub async fn ps(&self) -> Option<String> {
        let (program, args) = self.split(&["ps"]);
        run_cmd_output(program, &args).await
    }

    /// The last `lines` lines of the tunnel service's log.
    pub async fn tunnel_logs(&self, lines: usize) -> Option<String> {
        let tail = lines.to_string();
        let (program, args) =
            self.split(&["logs", "--no-color", &self.tunnel_service, "--tail", &tail]);
        run_cmd_output(program, &args).await
    }

    /// Log feed for the log-scraping URL source.
    pub fn log_feed(&self) -> CommandLogFeed {
        let (program, args) = self.split(&["logs", "--no-color", &self.tunnel_service]);
        CommandLogFeed::new(program, args.into_iter().map(str::to_string).collect())
    }

    pub async fn recreate_tunnel(&self) -> Result<()> {
        let (program, args) = self.split(&["up", "-d", "--force-recreate", &self.tunnel_service]);
        run_cmd("Recreating tunnel service", program, &args).await
    }
}

#[async_trait]
impl TunnelDaemon for ServiceController {
    async fn recreate(&self) -> io::Result<()> {
        self.recreate_tunnel()
            .await
            .map_err(|e| io::Error::other(format!("{e:#}")))
    }
}
