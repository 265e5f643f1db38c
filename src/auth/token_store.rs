use keyring::Entry;

use crate::error::Result;

const SERVICE: &str = "pbilink";

/// Tokens are stored per organization URL.
fn entry(org_url: &str) -> Result<Entry> {
    Ok(Entry::new(SERVICE, org_url)?)
}

pub fn save_token(org_url: &str, token: &str) -> Result<()> {
    Ok(entry(org_url)?.set_password(token)?)
}

pub fn load_token(org_url: &str) -> Result<String> {
    Ok(entry(org_url)?.get_password()?)
}

pub fn delete_token(org_url: &str) -> Result<()> {
    Ok(entry(org_url)?.delete_password()?)
}
