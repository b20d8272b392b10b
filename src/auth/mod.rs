pub mod oauth;
pub mod token_manager;
pub mod token_store;
pub mod tokens_file;

use anyhow::{Context, Result};

/// Where the stored credential material stands before a call is made.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialState {
    /// A cached access token that has not expired.
    Valid,
    /// The access token is gone or stale but a refresh token is stored.
    ExpiredRefreshable,
    /// Nothing usable; the interactive consent flow must run.
    Absent,
}

/// Supplies bearer tokens for the mailbox session.
pub trait CredentialProvider {
    fn state(&self) -> Result<CredentialState>;

    /// A token usable right now. May refresh or trigger interactive consent.
    fn access_token(&self) -> Result<String>;
}

/// Obtains a token before any mailbox call so auth problems show up on their own.
pub fn authenticate(provider: &dyn CredentialProvider) -> Result<()> {
    let state = provider.state()?;
    log::info!("credential state: {state:?}");
    provider
        .access_token()
        .map(|_| ())
        .context("Authentication failed")
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    struct Denied;

    impl CredentialProvider for Denied {
        fn state(&self) -> Result<CredentialState> {
            Ok(CredentialState::Absent)
        }

        fn access_token(&self) -> Result<String> {
            Err(anyhow!("sign-in required"))
        }
    }

    #[test]
    fn failure_is_labelled_as_authentication() {
        let err = authenticate(&Denied).unwrap_err();
        assert_eq!(format!("{err:#}"), "Authentication failed: sign-in required");
    }
}
