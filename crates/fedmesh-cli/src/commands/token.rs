//! `fedmesh token`: registration token lifecycle.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use fedmesh_tokens::{AdminSession, RevokeOutcome, SessionFlags, TokenManager, configure};

use super::Global;
use crate::prompt;
use crate::token_fmt::{write_created, write_table};

#[derive(clap::Args, Debug)]
pub struct TokenArgs {
    /// Admin session file (defaults to ~/.fedmesh/admin.json)
    #[arg(long, env = "FEDMESH_ADMIN_SESSION")]
    pub session: Option<PathBuf>,

    #[command(subcommand)]
    pub action: TokenAction,
}

#[derive(Subcommand, Debug)]
pub enum TokenAction {
    /// Create a registration token
    Create {
        /// Number of registrations allowed; 0 means unlimited
        #[arg(long)]
        uses: Option<u32>,
        /// Lifetime such as 12h, 7d or 2w
        #[arg(long)]
        expires: Option<String>,
    },
    /// List registration tokens
    List {
        /// Only show tokens that can still be used
        #[arg(long)]
        active: bool,
    },
    /// Delete a registration token
    Revoke {
        token: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Save the admin server address and access token
    Configure {
        /// Chat server URL
        #[arg(long)]
        server: Option<String>,
        /// Web client URL, used to build registration links
        #[arg(long)]
        element: Option<String>,
        /// Admin access token
        #[arg(long)]
        token: Option<String>,
    },
}

pub async fn run(args: TokenArgs, global: &Global) -> Result<()> {
    let path = match args.session {
        Some(path) => path,
        None => AdminSession::default_path()?,
    };
    let mut out = io::stdout();

    match args.action {
        TokenAction::Create { uses, expires } => {
            let session = AdminSession::load(&path)?;
            let manager = TokenManager::from_session(&session)?;
            let token = manager.create(uses, expires.as_deref()).await?;
            write_created(&mut out, &token, &session.registration_url())?;
        }
        TokenAction::List { active } => {
            let session = AdminSession::load(&path)?;
            let listings = TokenManager::from_session(&session)?.list(active).await?;
            if listings.is_empty() {
                let msg = if active {
                    "No active tokens."
                } else {
                    "No registration tokens."
                };
                writeln!(out, "{msg}")?;
            } else {
                write_table(&mut out, &listings)?;
            }
        }
        TokenAction::Revoke { token, yes } => {
            let session = AdminSession::load(&path)?;
            let manager = TokenManager::from_session(&session)?;
            let non_interactive = global.non_interactive;
            let outcome = manager
                .revoke(&token, |t| {
                    yes || prompt::confirm(non_interactive, &format!("Revoke token {t}?"))
                        .unwrap_or(false)
                })
                .await?;
            match outcome {
                RevokeOutcome::Revoked => writeln!(out, "Revoked {token}")?,
                RevokeOutcome::Cancelled => writeln!(out, "Cancelled.")?,
            }
        }
        TokenAction::Configure {
            server,
            element,
            token,
        } => {
            let existing = AdminSession::load_optional(&path)?;
            let flags = SessionFlags {
                server_url: server,
                element_url: element,
                access_token: token,
            };
            let non_interactive = global.non_interactive;
            let session = configure(flags, existing.as_ref(), |field, fallback| {
                prompt::session_value(non_interactive, field, fallback)
            })?;
            session.save(&path)?;
            writeln!(out, "Saved admin session to {}", path.display())?;
        }
    }
    Ok(())
}
