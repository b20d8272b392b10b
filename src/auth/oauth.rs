use anyhow::{Result, anyhow};
use oauth2::TokenResponse;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::reqwest::http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    RedirectUrl, RefreshToken, Scope, TokenUrl,
};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::{Duration, Instant};
use tiny_http::{Response, Server};
use url::Url;

pub const GMAIL_SCOPE: &str = "https://mail.google.com/";
const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const CONSENT_TIMEOUT: Duration = Duration::from_secs(120);

/// Tokens returned by the oauth flow (in-memory)
#[derive(Debug, Clone)]
pub struct Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: Option<u64>,
}

fn google_client(client_id: &str, client_secret: Option<&str>) -> Result<BasicClient> {
    let client_id = ClientId::new(client_id.to_string());
    let client_secret = client_secret.map(|s| ClientSecret::new(s.to_string()));
    let auth_url = AuthUrl::new(GOOGLE_AUTH_URL.to_string())?;
    let token_url = TokenUrl::new(GOOGLE_TOKEN_URL.to_string())?;
    Ok(BasicClient::new(
        client_id,
        client_secret,
        auth_url,
        Some(token_url),
    ))
}

fn into_tokens(token: &BasicTokenResponse) -> Tokens {
    Tokens {
        access_token: token.access_token().secret().to_string(),
        refresh_token: token.refresh_token().map(|r| r.secret().to_string()),
        expires_in: token.expires_in().map(|d| d.as_secs()),
    }
}

/// Exchange a refresh token for a new access token.
pub fn refresh_access_token(
    client_id: &str,
    client_secret: Option<&str>,
    refresh_token: &str,
) -> Result<Tokens> {
    let oauth_client = google_client(client_id, client_secret)?;
    let rt = RefreshToken::new(refresh_token.to_string());
    let token = oauth_client
        .exchange_refresh_token(&rt)
        .request(http_client)
        .map_err(|e| anyhow!("refresh token exchange failed: {e}"))?;
    Ok(into_tokens(&token))
}

/// Parses the redirect URI into the loopback address the callback server binds to.
fn callback_addr(redirect_uri: &str) -> Result<(String, SocketAddr)> {
    let redirect = Url::parse(redirect_uri)
        .map_err(|e| anyhow!("Invalid redirect_uri '{redirect_uri}': {e}"))?;

    let host = redirect
        .host_str()
        .ok_or_else(|| anyhow!("redirect_uri missing host: {redirect_uri}"))?
        .to_string();

    let port = redirect
        .port_or_known_default()
        .ok_or_else(|| anyhow!("redirect_uri missing/unknown port: {redirect_uri}"))?;

    let bind_ip: IpAddr = match host.as_str() {
        "localhost" | "127.0.0.1" => IpAddr::V4(Ipv4Addr::LOCALHOST),
        other => other.parse::<IpAddr>().map_err(|_| {
            anyhow!("redirect_uri host must be localhost/127.0.0.1 or an IP: {other}")
        })?,
    };

    Ok((host, SocketAddr::new(bind_ip, port)))
}

/// Pulls the `code` query parameter out of a callback request path.
fn code_from_callback(host: &str, port: u16, path_and_query: &str) -> Option<String> {
    let full = format!("http://{host}:{port}{path_and_query}");
    let parsed = Url::parse(&full).ok()?;
    parsed
        .query_pairs()
        .find(|(k, _)| k == "code")
        .map(|(_, v)| v.into_owned())
}

/// Authorization Code + PKCE flow. Opens the system browser and captures the code
/// with a loopback server bound to the redirect URI.
pub fn perform_pkce_flow(
    client_id: &str,
    client_secret: Option<&str>,
    redirect_uri: &str,
    scope: &str,
) -> Result<Tokens> {
    let (host, bind_addr) = callback_addr(redirect_uri)?;

    // listen before the browser can redirect
    let server = Server::http(bind_addr)
        .map_err(|e| anyhow!("Failed to bind OAuth callback server on {bind_addr}: {e:?}"))?;

    let oauth_client = google_client(client_id, client_secret)?
        .set_redirect_uri(RedirectUrl::new(redirect_uri.to_string())?);

    let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

    let (auth_url, _csrf_token) = oauth_client
        .authorize_url(CsrfToken::new_random)
        .add_scope(Scope::new(scope.to_string()))
        .set_pkce_challenge(pkce_challenge)
        .url();

    println!("Open this URL in your browser:\n{auth_url}");
    if let Err(e) = open::that(auth_url.as_str()) {
        log::warn!("could not open browser automatically: {e}");
    }

    let mut code_opt: Option<String> = None;
    let wait_until = Instant::now() + CONSENT_TIMEOUT;

    while Instant::now() < wait_until {
        let Ok(Some(request)) = server.recv_timeout(Duration::from_millis(500)) else {
            continue;
        };

        match code_from_callback(&host, bind_addr.port(), request.url()) {
            Some(code) => {
                let _ = request.respond(Response::from_string(
                    "Authorization received. You can close this tab.",
                ));
                code_opt = Some(code);
                break;
            }
            None => {
                let _ = request.respond(Response::from_string(
                    "No code found in redirect. You can close this tab.",
                ));
            }
        }
    }

    let code = code_opt.ok_or_else(|| anyhow!("No code received within timeout"))?;

    let token = oauth_client
        .exchange_code(AuthorizationCode::new(code))
        .set_pkce_verifier(pkce_verifier)
        .request(http_client)
        .map_err(|e| {
            log::debug!("token exchange error: {e:#?}");
            anyhow!("Token exchange failed: {e}")
        })?;

    Ok(into_tokens(&token))
}
