use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use super::UrlSource;

/// Timeout for one log fetch.
const LOG_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Provides the most recent output lines of the tunnel daemon.
#[async_trait]
pub trait LogFeed: Send + Sync {
    async fn recent_lines(&self, lines: usize) -> std::io::Result<String>;
}

/// Runs a command and appends `--tail <n>`, e.g.
/// `docker compose logs cloudflared --tail 100`.
#[derive(Debug, Clone)]
pub struct CommandLogFeed {
    program: String,
    args: Vec<String>,
}

impl CommandLogFeed {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

#[async_trait]
impl LogFeed for CommandLogFeed {
    async fn recent_lines(&self, lines: usize) -> std::io::Result<String> {
        let cmd_line = format!("{} {} --tail {lines}", self.program, self.args.join(" "));
        debug!("exec (capture): {cmd_line}");

        let output = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg("--tail")
            .arg(lines.to_string())
            .kill_on_drop(true)
            .output();
        let output = tokio::time::timeout(LOG_FETCH_TIMEOUT, output)
            .await
            .map_err(|_| {
                std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("{cmd_line} timed out after {}s", LOG_FETCH_TIMEOUT.as_secs()),
                )
            })??;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(std::io::Error::other(format!(
                "{cmd_line} failed (exit {}): {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Scrapes the tunnel URL out of the daemon's log output.
///
/// The daemon may print several URLs while reconnecting; the most recent
/// one wins.
pub struct LogSource {
    feed: Box<dyn LogFeed>,
    pattern: Regex,
    tail_lines: usize,
}

impl LogSource {
    /// Match `https://<label>.<host_suffix>` in the last `tail_lines` lines.
    pub fn new(
        feed: Box<dyn LogFeed>,
        host_suffix: &str,
        tail_lines: usize,
    ) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(
            r"https://[a-zA-Z0-9-]+\.{}",
            regex::escape(host_suffix)
        ))?;
        Ok(Self {
            feed,
            pattern,
            tail_lines,
        })
    }
}

/// Last URL in `text` matching `pattern`.
pub fn last_tunnel_url(pattern: &Regex, text: &str) -> Option<String> {
    pattern.find_iter(text).last().map(|m| m.as_str().to_string())
}

#[async_trait]
impl UrlSource for LogSource {
    async fn current_url(&self) -> Option<String> {
        match self.feed.recent_lines(self.tail_lines).await {
            Ok(text) => last_tunnel_url(&self.pattern, &text),
            Err(e) => {
                warn!(error = %e, "Cannot read tunnel daemon logs");
                None
            }
        }
    }

    fn describe(&self) -> String {
        format!("log pattern {}", self.pattern.as_str())
    }
}
