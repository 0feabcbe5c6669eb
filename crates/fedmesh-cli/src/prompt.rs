use anyhow::Result;
use dialoguer::{Confirm, Input, Password};
use fedmesh_tokens::SessionField;

/// Ask a yes/no question, defaulting to no. Non-interactive runs answer no.
pub fn confirm(non_interactive: bool, prompt: &str) -> Result<bool> {
    if non_interactive {
        return Ok(false);
    }
    let answer = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    Ok(answer)
}

/// Prompt for one admin session value.
///
/// Returns `None` to keep `fallback`: in non-interactive mode, on empty
/// input, or when the terminal is unavailable.
pub fn session_value(
    non_interactive: bool,
    field: SessionField,
    fallback: Option<&str>,
) -> Option<String> {
    if non_interactive {
        return None;
    }
    let answer = match field {
        SessionField::ServerUrl => prompt_url("Chat server URL", fallback),
        SessionField::ElementUrl => prompt_url("Web client URL", fallback),
        SessionField::AccessToken => {
            let prompt = if fallback.is_some() {
                "Admin access token (empty keeps the saved one)"
            } else {
                "Admin access token"
            };
            Password::new()
                .with_prompt(prompt)
                .allow_empty_password(true)
                .interact()
        }
    };
    match answer {
        Ok(value) => Some(value).filter(|v| !v.trim().is_empty()),
        Err(e) => {
            tracing::warn!("prompt failed: {e}");
            None
        }
    }
}

fn prompt_url(prompt: &str, fallback: Option<&str>) -> dialoguer::Result<String> {
    let mut input = Input::<String>::new().with_prompt(prompt);
    if let Some(default) = fallback {
        input = input.default(default.to_string());
    }
    input.interact_text()
}
