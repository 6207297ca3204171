//! Access token acquisition
//!
//! Tokens come from `GOOGLE_OAUTH_ACCESS_TOKEN` when set, otherwise from a
//! service-account key exchanged through the JWT bearer grant.

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use vmprov_common::{Error, Result};

/// Environment variable holding a ready-made bearer token
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Scope requested for service-account tokens
pub const COMPUTE_SCOPE: &str = "https://www.googleapis.com/auth/compute";

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Fields of a service-account key file this tool needs
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    pub client_email: String,
    pub private_key: String,
    #[serde(default)]
    pub private_key_id: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Auth(format!("cannot read key file {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            Error::Auth(format!("invalid key file {}: {}", path.display(), e))
        })
    }
}

#[derive(Debug, Serialize)]
struct Claims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Where bearer tokens come from
#[derive(Debug, Clone)]
pub enum TokenSource {
    Static(String),
    ServiceAccount(ServiceAccountKey),
}

impl TokenSource {
    /// Pick a source from the environment and the configured key file
    pub fn discover(credentials: Option<&Path>) -> Result<Self> {
        let env_token = std::env::var(ACCESS_TOKEN_ENV).ok();
        Self::resolve(env_token, credentials)
    }

    fn resolve(env_token: Option<String>, credentials: Option<&Path>) -> Result<Self> {
        if let Some(token) = env_token.filter(|t| !t.trim().is_empty()) {
            debug!("Using access token from {}", ACCESS_TOKEN_ENV);
            return Ok(TokenSource::Static(token.trim().to_string()));
        }
        match credentials {
            Some(path) => {
                debug!(path = %path.display(), "Using service-account key");
                Ok(TokenSource::ServiceAccount(ServiceAccountKey::load(path)?))
            }
            None => Err(Error::Auth(format!(
                "no credentials found (set {} or GOOGLE_APPLICATION_CREDENTIALS)",
                ACCESS_TOKEN_ENV
            ))),
        }
    }

    /// Obtain a bearer token, exchanging the key if needed
    pub async fn access_token(&self, http: &reqwest::Client) -> Result<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::ServiceAccount(key) => exchange(http, key).await,
        }
    }
}

/// Signed JWT assertion for `key`
fn assertion(key: &ServiceAccountKey, now: i64) -> Result<String> {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = key.private_key_id.clone();

    let claims = Claims {
        iss: &key.client_email,
        scope: COMPUTE_SCOPE,
        aud: &key.token_uri,
        iat: now,
        exp: now + ASSERTION_LIFETIME_SECS,
    };

    let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
        .map_err(|e| Error::Auth(format!("invalid private key for {}: {}", key.client_email, e)))?;
    encode(&header, &claims, &signing_key)
        .map_err(|e| Error::Auth(format!("cannot sign token request: {}", e)))
}

async fn exchange(http: &reqwest::Client, key: &ServiceAccountKey) -> Result<String> {
    let jwt = assertion(key, chrono::Utc::now().timestamp())?;

    debug!(token_uri = %key.token_uri, account = %key.client_email, "Exchanging service-account assertion");
    let response = http
        .post(&key.token_uri)
        .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", jwt.as_str())])
        .send()
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| Error::Transport(e.to_string()))?;
    if !status.is_success() {
        return Err(Error::Auth(format!("token exchange rejected ({}): {}", status, text)));
    }

    let token: TokenResponse = serde_json::from_str(&text)?;
    Ok(token.access_token)
}
