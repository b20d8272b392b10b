use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::config_dir;

/// Non-secret token metadata stored in ~/.config/newsletter_digest/tokens.json
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokensFile {
    pub access_token: Option<String>,
    pub expires_at_epoch: Option<i64>, // epoch seconds
}

impl TokensFile {
    /// The cached access token, if present and not yet expired at `now`.
    pub fn live_token(&self, now: i64) -> Option<&str> {
        match (&self.access_token, self.expires_at_epoch) {
            (Some(at), Some(exp)) if now < exp => Some(at.as_str()),
            _ => None,
        }
    }
}

pub fn default_tokens_path() -> Result<PathBuf> {
    let p = config_dir()?;
    fs::create_dir_all(&p)?;
    Ok(p.join("tokens.json"))
}

pub fn save_tokens(path: &Path, tokens: &TokensFile) -> Result<()> {
    let s = serde_json::to_string_pretty(tokens)?;
    fs::write(path, s)?;
    Ok(())
}

/// Load tokens file if present
pub fn load_tokens(path: &Path) -> Result<Option<TokensFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path)?;
    let tf: TokensFile = serde_json::from_str(&s)?;
    Ok(Some(tf))
}
