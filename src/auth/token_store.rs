use anyhow::{Result, anyhow};
use keyring::{Entry, Error as KeyringError};

use crate::config::APP_DIR;

fn entry(account: &str) -> Result<Entry> {
    Entry::new(APP_DIR, account).map_err(|e| anyhow!("keyring entry for {account}: {e}"))
}

fn load(account: &str) -> Result<Option<String>> {
    match entry(account)?.get_password() {
        Ok(v) => Ok(Some(v)),
        Err(KeyringError::NoEntry) => Ok(None),
        Err(e) => Err(anyhow!(e.to_string())),
    }
}

fn save(account: &str, secret: &str) -> Result<()> {
    entry(account)?
        .set_password(secret)
        .map_err(|e| anyhow!(e.to_string()))
}

/// Save a refresh token into the OS keyring for the given mailbox user
pub fn save_refresh_token(username: &str, refresh_token: &str) -> Result<()> {
    save(username, refresh_token)
}

pub fn load_refresh_token(username: &str) -> Result<Option<String>> {
    load(username)
}

/// Save a client secret into the keyring, keyed by client_id
pub fn save_client_secret(client_id: &str, client_secret: &str) -> Result<()> {
    save(client_id, client_secret)
}

pub fn load_client_secret(client_id: &str) -> Result<Option<String>> {
    load(client_id)
}
