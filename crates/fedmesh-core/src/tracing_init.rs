//! Shared tracing/logging initialization.
//!
//! Every `fedmesh` subcommand, including the long-running watcher, logs
//! through one subscriber. Log lines always go to stderr: stdout carries the
//! command's own output (token tables, URLs, status reports) and must stay
//! parseable when piped.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialise the global tracing subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset or invalid (e.g.
/// `"fedmesh_cli=info,fedmesh_discovery=info"`). `log_json` switches from the
/// human-readable format to one JSON object per line.
pub fn init_tracing(default_filter: &str, log_json: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let json_layer = log_json.then(|| fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!log_json).then(|| fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();
}
