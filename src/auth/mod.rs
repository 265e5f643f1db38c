//! Personal access token resolution.

pub mod token_store;

use dialoguer::{theme::ColorfulTheme, Confirm, Password};
use tracing::debug;

use crate::config::Settings;
use crate::error::Result;

/// Where the token came from, so the caller can say so.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Config,
    Keyring,
    Prompt,
}

/// Configured `pat` (including `PBILINK_PAT`), then the keyring, then a
/// hidden prompt with an offer to save.
pub fn resolve_pat(settings: &Settings) -> Result<(String, TokenSource)> {
    if let Some(pat) = settings.pat.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
        return Ok((pat.to_string(), TokenSource::Config));
    }

    match token_store::load_token(settings.org_base()) {
        Ok(token) => return Ok((token, TokenSource::Keyring)),
        Err(e) => debug!(error = %e, "no stored token"),
    }

    let token: String = Password::with_theme(&ColorfulTheme::default())
        .with_prompt("Azure DevOps Personal Access Token (PAT)")
        .interact()?;

    let save = Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt("Save this token to the system keyring?")
        .default(true)
        .interact()?;

    if save {
        token_store::save_token(settings.org_base(), &token)?;
        println!("✅ Token saved securely!");
    }

    Ok((token, TokenSource::Prompt))
}
