use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::process::Command;

/// Execute a command with logging. Logs the full command line at debug level
/// and a human-friendly description at info level.
pub async fn run_cmd(description: &str, program: &str, args: &[&str]) -> Result<()> {
    run_cmd_env(description, program, args, &[]).await
}

/// Like [`run_cmd`], with extra environment variables for the child.
pub async fn run_cmd_env(
    description: &str,
    program: &str,
    args: &[&str],
    env: &[(&str, &str)],
) -> Result<()> {
    let cmd_line = format!("{program} {}", args.join(" "));
    tracing::info!("{description}");
    tracing::debug!("exec: {cmd_line}");

    let output = Command::new(program)
        .args(args)
        .envs(env.iter().copied())
        .stdin(Stdio::null())
        .output()
        .await
        .with_context(|| format!("failed to execute: {cmd_line}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::error!("command failed: {cmd_line}\nstderr: {stderr}");
        bail!("{description} failed (exit {}): {}", output.status, stderr.trim());
    }
    Ok(())
}

/// Execute a command and return its trimmed stdout; `None` when it fails.
pub async fn run_cmd_output(program: &str, args: &[&str]) -> Option<String> {
    let cmd_line = format!("{program} {}", args.join(" "));
    tracing::debug!("exec (capture): {cmd_line}");

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .inspect_err(|e| tracing::debug!("failed to execute {cmd_line}: {e}"))
        .ok()?;

    if !output.status.success() {
        tracing::debug!(status = %output.status, "{cmd_line} failed");
        return None;
    }
    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Check whether a program exists on PATH.
pub async fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .is_ok_and(|s| s.success())
}
