//! Admin credentials persisted at `~/.fedmesh/admin.json`.

use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenError};

pub const DEFAULT_SERVER_URL: &str = "http://localhost:8008";
pub const DEFAULT_ELEMENT_URL: &str = "http://localhost:8080";

/// Where the chat server lives and how to authenticate as its admin.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminSession {
    pub server_url: String,
    pub element_url: String,
    pub access_token: String,
}

impl fmt::Debug for AdminSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdminSession")
            .field("server_url", &self.server_url)
            .field("element_url", &self.element_url)
            .field("access_token", &"<redacted>")
            .finish()
    }
}

impl AdminSession {
    /// `~/.fedmesh/admin.json`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|h| h.join(".fedmesh").join("admin.json"))
            .ok_or(TokenError::NoHomeDir)
    }

    /// Load the session; a missing file is [`TokenError::ConfigMissing`].
    pub fn load(path: &Path) -> Result<Self> {
        let session = Self::load_optional(path)?
            .ok_or_else(|| TokenError::ConfigMissing(path.to_path_buf()))?;
        if session.access_token.trim().is_empty() {
            return Err(TokenError::CredentialMissing);
        }
        Ok(session)
    }

    /// Load the session if the file exists.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Write the session, readable and writable by the owner only.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');

        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path)?;

        // `mode` only applies on creation; tighten a file that already existed.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }
        file.write_all(json.as_bytes())?;
        Ok(())
    }

    /// Where new users sign up with a registration token.
    pub fn registration_url(&self) -> String {
        format!("{}/#/register", self.element_url.trim_end_matches('/'))
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct SessionFlags {
    pub server_url: Option<String>,
    pub element_url: Option<String>,
    pub access_token: Option<String>,
}

/// A value `configure` may ask the operator for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionField {
    ServerUrl,
    ElementUrl,
    AccessToken,
}

/// Build a session from flags, then the prompt, then the existing session.
///
/// `prompt` is only called for fields without a flag. It receives the value
/// that will be used if it answers `None` (the existing value, or the
/// built-in default for the URLs). A non-interactive caller answers `None`
/// to everything.
pub fn configure(
    flags: SessionFlags,
    existing: Option<&AdminSession>,
    mut prompt: impl FnMut(SessionField, Option<&str>) -> Option<String>,
) -> Result<AdminSession> {
    let mut resolve = |flag: Option<String>, field: SessionField, fallback: Option<&str>| {
        flag.or_else(|| prompt(field, fallback))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| fallback.map(str::to_string))
    };

    let server_url = resolve(
        flags.server_url,
        SessionField::ServerUrl,
        Some(existing.map_or(DEFAULT_SERVER_URL, |s| s.server_url.as_str())),
    )
    .unwrap_or_else(|| DEFAULT_SERVER_URL.to_string());

    let element_url = resolve(
        flags.element_url,
        SessionField::ElementUrl,
        Some(existing.map_or(DEFAULT_ELEMENT_URL, |s| s.element_url.as_str())),
    )
    .unwrap_or_else(|| DEFAULT_ELEMENT_URL.to_string());

    let access_token = resolve(
        flags.access_token,
        SessionField::AccessToken,
        existing
            .map(|s| s.access_token.as_str())
            .filter(|t| !t.trim().is_empty()),
    )
    .ok_or(TokenError::CredentialMissing)?;

    Ok(AdminSession {
        server_url,
        element_url,
        access_token,
    })
}
