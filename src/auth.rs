use std::collections::HashSet;
use std::fs;
use std::time::Instant;

use anyhow::Result;
use chrono::{DateTime, Utc};

use librespot::core::{authentication::Credentials, cache::Cache};
use rspotify::Token;

const SPOTIFY_CLIENT_ID: &str = "492e1e45ea814fa3ac555fe1576aaf5b";
const SPOTIFY_REDIRECT_URI: &str = "http://127.0.0.1:8898/login";
pub const SCOPES: &str = "streaming user-read-playback-state user-modify-playback-state user-read-currently-playing user-read-recently-played user-library-modify user-library-read";

const RESPONSE: &str = r#"
<!doctype html>
<html>
<head><title>Success</title></head>
<body><h1>Authentication Successful!</h1><script>window.close();</script></body>
</html>
"#;
const CACHE: &str = ".cache";
const CACHE_FILES: &str = ".cache/files";
const REFRESH_TOKEN_FILE: &str = ".cache/refresh_token";

#[derive(Clone)]
pub struct AuthResult {
    pub librespot_credentials: Credentials,
    pub rspotify_token: Token,
    pub refresh_token: String,
    pub cache: Cache,
}

/// Fresh access token obtained from a refresh token
pub struct RefreshedToken {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

fn oauth_client_builder() -> librespot_oauth::OAuthClientBuilder {
    librespot_oauth::OAuthClientBuilder::new(
        SPOTIFY_CLIENT_ID,
        SPOTIFY_REDIRECT_URI,
        SCOPES.split_whitespace().collect(),
    )
}

fn expiry_from(expires_at: Instant) -> DateTime<Utc> {
    let remaining = expires_at.saturating_duration_since(Instant::now());
    let remaining = chrono::Duration::from_std(remaining).unwrap_or_else(|_| chrono::Duration::seconds(3600));
    Utc::now() + remaining
}

fn store_refresh_token(refresh_token: &str) {
    match fs::create_dir_all(CACHE).and_then(|_| fs::write(REFRESH_TOKEN_FILE, refresh_token)) {
        Ok(()) => tracing::debug!("Saved refresh token to disk"),
        Err(e) => tracing::warn!(error = %e, "Failed to save refresh token"),
    }
}

async fn perform_browser_auth() -> Result<(Credentials, RefreshedToken)> {
    tracing::info!("Starting browser-based OAuth flow");
    let client = oauth_client_builder()
        .open_in_browser()
        .with_custom_message(RESPONSE)
        .build()?;

    let token = client.get_access_token_async().await?;
    store_refresh_token(&token.refresh_token);

    let credentials = Credentials::with_access_token(token.access_token.clone());
    tracing::info!("Browser authentication completed successfully");
    Ok((
        credentials,
        RefreshedToken {
            expires_at: expiry_from(token.expires_at),
            access_token: token.access_token,
            refresh_token: token.refresh_token,
        },
    ))
}

/// Exchange a refresh token for a new access token.
pub async fn refresh_access_token(refresh_token: &str) -> Result<RefreshedToken> {
    let client = oauth_client_builder().build()?;
    let token = client.refresh_token_async(refresh_token).await?;
    store_refresh_token(&token.refresh_token);

    Ok(RefreshedToken {
        expires_at: expiry_from(token.expires_at),
        access_token: token.access_token,
        refresh_token: token.refresh_token,
    })
}

pub async fn perform_oauth_flow() -> Result<AuthResult> {
    let cache = Cache::new(Some(CACHE), Some(CACHE), Some(CACHE_FILES), None)?;

    let stored_refresh_token = fs::read_to_string(REFRESH_TOKEN_FILE).ok();

    let (credentials, token) =
        if let (Some(creds), Some(refresh_token)) = (cache.credentials(), stored_refresh_token) {
            tracing::info!("Found cached librespot credentials and refresh token");

            match refresh_access_token(refresh_token.trim()).await {
                Ok(token) => {
                    tracing::debug!("Token refreshed successfully");
                    (creds, token)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Cached refresh token failed, re-authenticating");
                    perform_browser_auth().await?
                }
            }
        } else {
            tracing::info!("No cached credentials found, starting browser authentication");
            perform_browser_auth().await?
        };

    Ok(AuthResult {
        librespot_credentials: credentials,
        rspotify_token: Token {
            access_token: token.access_token,
            expires_in: chrono::Duration::seconds(3600),
            expires_at: Some(token.expires_at),
            scopes: SCOPES
                .split_whitespace()
                .map(|s| s.to_string())
                .collect::<HashSet<String>>(),
            refresh_token: None,
        },
        refresh_token: token.refresh_token,
        cache,
    })
}
