use anyhow::{Result, bail};
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::auth::oauth::{self, GMAIL_SCOPE, Tokens};
use crate::auth::tokens_file::{self, TokensFile};
use crate::auth::{CredentialProvider, CredentialState, token_store};
use crate::config::Config;

/// Assumed lifetime when the provider omits `expires_in`.
const FALLBACK_TTL_SECS: i64 = 3500;

#[derive(Debug, Clone)]
pub struct TokenManager {
    pub client_id: String,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub user_email: String,
    pub tokens_path: PathBuf,
    /// When false, missing credentials are an error instead of a browser sign-in.
    pub interactive: bool,
}

impl TokenManager {
    pub fn from_config(cfg: &Config) -> Result<Self> {
        let client_id = cfg.client_id.clone();
        let client_secret = token_store::load_client_secret(&client_id)
            .unwrap_or_else(|e| {
                log::warn!("keyring lookup for client secret failed: {e}");
                None
            })
            .or_else(|| std::env::var("OAUTH_CLIENT_SECRET").ok());

        Ok(Self {
            client_id,
            client_secret,
            redirect_uri: cfg.redirect_uri(),
            user_email: cfg.user_email()?,
            tokens_path: tokens_file::default_tokens_path()?,
            interactive: true,
        })
    }

    /// For callers that own the terminal and cannot hand it to the consent flow.
    pub fn without_consent(mut self) -> Self {
        self.interactive = false;
        self
    }

    fn refresh_token(&self) -> Option<String> {
        token_store::load_refresh_token(&self.user_email).unwrap_or_else(|e| {
            log::warn!("keyring lookup for refresh token failed: {e}");
            None
        })
    }

    fn cached(&self) -> Option<TokensFile> {
        tokens_file::load_tokens(&self.tokens_path).unwrap_or_else(|e| {
            log::warn!(
                "ignoring unreadable token cache {}: {e}",
                self.tokens_path.display()
            );
            None
        })
    }

    /// Persists what the provider handed back. Failures only cost a re-auth next run.
    fn persist(&self, tokens: &Tokens, now: i64) {
        if let Some(rt) = &tokens.refresh_token {
            match token_store::save_refresh_token(&self.user_email, rt) {
                Ok(()) => log::info!("saved refresh token for {}", self.user_email),
                Err(e) => log::warn!("couldn't save refresh token to keyring: {e}"),
            }
        }

        let ttl = tokens
            .expires_in
            .map_or(FALLBACK_TTL_SECS, |s| s as i64);
        let tf = TokensFile {
            access_token: Some(tokens.access_token.clone()),
            expires_at_epoch: Some(now + ttl),
        };
        if let Err(e) = tokens_file::save_tokens(&self.tokens_path, &tf) {
            log::warn!("couldn't save token cache: {e}");
        }
    }

    fn consent(&self) -> Result<Tokens> {
        if !self.interactive {
            bail!("sign-in required; restart to authorize in the browser");
        }
        log::info!("no usable credentials; running interactive consent flow");
        oauth::perform_pkce_flow(
            &self.client_id,
            self.client_secret.as_deref(),
            &self.redirect_uri,
            GMAIL_SCOPE,
        )
    }
}

impl CredentialProvider for TokenManager {
    fn state(&self) -> Result<CredentialState> {
        let now = now_epoch()?;
        let cached = self.cached();
        Ok(credential_state(
            cached.as_ref(),
            self.refresh_token().is_some(),
            now,
        ))
    }

    /// Returns a valid access token; refreshes or runs the consent flow if needed.
    fn access_token(&self) -> Result<String> {
        let now = now_epoch()?;

        if let Some(at) = self.cached().as_ref().and_then(|tf| tf.live_token(now)) {
            log::debug!("using cached access token");
            return Ok(at.to_string());
        }

        let tokens = match self.refresh_token() {
            Some(rt) => {
                log::info!("access token expired; refreshing");
                match oauth::refresh_access_token(&self.client_id, self.client_secret.as_deref(), &rt)
                {
                    Ok(t) => t,
                    Err(e) => {
                        log::warn!("refresh failed: {e}; falling back to interactive auth");
                        self.consent()?
                    }
                }
            }
            None => self.consent()?,
        };

        self.persist(&tokens, now);
        Ok(tokens.access_token)
    }
}

fn now_epoch() -> Result<i64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64)
}

pub fn credential_state(
    cached: Option<&TokensFile>,
    has_refresh_token: bool,
    now: i64,
) -> CredentialState {
    if cached.and_then(|tf| tf.live_token(now)).is_some() {
        CredentialState::Valid
    } else if has_refresh_token {
        CredentialState::ExpiredRefreshable
    } else {
        CredentialState::Absent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_interactive_manager_never_opens_consent() {
        let dir = tempfile::tempdir().unwrap();
        let mgr = TokenManager {
            client_id: "test-client.apps.googleusercontent.com".into(),
            client_secret: None,
            redirect_uri: "http://127.0.0.1:1/callback".into(),
            user_email: "no-such-user@invalid.test".into(),
            tokens_path: dir.path().join("tokens.json"),
            interactive: true,
        }
        .without_consent();

        let err = mgr.access_token().unwrap_err();
        assert!(err.to_string().contains("sign-in required"));
    }

    #[test]
    fn live_cached_token_is_used_without_consent() {
        let dir = tempfile::tempdir().unwrap();
        let tokens_path = dir.path().join("tokens.json");
        tokens_file::save_tokens(
            &tokens_path,
            &TokensFile {
                access_token: Some("cached".into()),
                expires_at_epoch: Some(i64::MAX),
            },
        )
        .unwrap();
        let mgr = TokenManager {
            client_id: "test-client.apps.googleusercontent.com".into(),
            client_secret: None,
            redirect_uri: "http://127.0.0.1:1/callback".into(),
            user_email: "no-such-user@invalid.test".into(),
            tokens_path,
            interactive: false,
        };

        assert_eq!(mgr.access_token().unwrap(), "cached");
    }

    fn cache(expires_at: i64) -> TokensFile {
        TokensFile {
            access_token: Some("at".into()),
            expires_at_epoch: Some(expires_at),
        }
    }

    #[test]
    fn live_cache_is_valid_regardless_of_refresh_token() {
        assert_eq!(
            credential_state(Some(&cache(200)), false, 100),
            CredentialState::Valid
        );
    }

    #[test]
    fn expired_cache_with_refresh_token_is_refreshable() {
        assert_eq!(
            credential_state(Some(&cache(50)), true, 100),
            CredentialState::ExpiredRefreshable
        );
        assert_eq!(
            credential_state(None, true, 100),
            CredentialState::ExpiredRefreshable
        );
    }

    #[test]
    fn nothing_stored_is_absent() {
        assert_eq!(credential_state(None, false, 100), CredentialState::Absent);
        assert_eq!(
            credential_state(Some(&cache(50)), false, 100),
            CredentialState::Absent
        );
    }
}
