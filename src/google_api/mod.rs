//! Native Google API client for the O2D sheet.
//!
//! Direct HTTP via reqwest. Token format is compatible with the token.json
//! written by Python's google-auth library, so an existing token keeps working.
//!
//! Modules:
//! - auth: OAuth2 browser consent flow
//! - sheets: Sheets API v4 `values.get`
//! - token_store: token.json persistence

pub mod auth;
pub mod sheets;
pub mod token_store;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Read-only access is all the dashboard needs.
pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/spreadsheets.readonly"];

/// Tokens this close to expiry are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 60;

// ============================================================================
// Token types — must be compatible with Python's google-auth token format
// ============================================================================

/// OAuth2 token payload persisted in token.json.
///
/// Field names match what Python's `google.oauth2.credentials.Credentials.to_json()`
/// produces. Both `token` and `access_token` are accepted on read for compat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleToken {
    /// The access token (Python writes this as "token")
    #[serde(alias = "access_token")]
    pub token: String,
    /// The refresh token (long-lived, used to get new access tokens)
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Token expiry time (ISO 8601)
    #[serde(default)]
    pub expiry: Option<String>,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub universe_domain: Option<String>,
}

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// OAuth2 client credentials from credentials.json.
///
/// Desktop clients are keyed `installed`; web clients (`web`) carry the same
/// fields and work with the loopback flow too.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientCredentials {
    #[serde(alias = "web")]
    pub installed: InstalledAppCredentials,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InstalledAppCredentials {
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
}

// ============================================================================
// Error type
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GoogleApiError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token expired or revoked")]
    AuthExpired,
    #[error("Credentials not found at {0}")]
    CredentialsNotFound(PathBuf),
    #[error("Token not found at {0}")]
    TokenNotFound(PathBuf),
    #[error("Token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("OAuth flow cancelled")]
    FlowCancelled,
    #[error("Invalid credentials format: {0}")]
    InvalidCredentials(String),
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

// ============================================================================
// Credentials I/O
// ============================================================================

/// Load the OAuth client secret file.
pub fn load_credentials(path: &Path) -> Result<ClientCredentials, GoogleApiError> {
    if !path.exists() {
        return Err(GoogleApiError::CredentialsNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| GoogleApiError::InvalidCredentials(format!("{}: {}", path.display(), e)))
}

// ============================================================================
// Token refresh
// ============================================================================

/// Check if a token is expired based on its expiry field.
///
/// A token without an expiry never expires, matching google-auth. One whose
/// expiry can't be read is treated as expired so it gets refreshed.
pub fn is_token_expired(token: &GoogleToken) -> bool {
    let Some(raw) = token.expiry.as_deref() else {
        return false;
    };
    match parse_expiry(raw) {
        None => true,
        Some(expiry) => {
            expiry <= chrono::Utc::now() + chrono::Duration::seconds(EXPIRY_SKEW_SECS)
        }
    }
}

/// Python writes "2023-08-09T12:00:00.000000Z"; older files drop the zone.
fn parse_expiry(raw: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    if let Ok(parsed) = chrono::DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&chrono::Utc));
    }
    chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// Refresh an access token using the refresh token and persist the result.
pub async fn refresh_access_token(
    client: &reqwest::Client,
    token: &GoogleToken,
    token_path: &Path,
) -> Result<GoogleToken, GoogleApiError> {
    let refresh_token = token
        .refresh_token
        .as_deref()
        .ok_or(GoogleApiError::AuthExpired)?;

    let mut form = vec![
        ("client_id", token.client_id.as_str()),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];
    if let Some(secret) = token.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let resp = client.post(&token.token_uri).form(&form).send().await?;
    let status = resp.status();
    let body_text = resp.text().await.unwrap_or_default();
    if !status.is_success() {
        return Err(map_refresh_error(status.as_u16(), &body_text));
    }
    let body: serde_json::Value = serde_json::from_str(&body_text)?;

    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| GoogleApiError::RefreshFailed("No access_token in response".into()))?;
    let expires_in = body["expires_in"].as_u64().unwrap_or(3600);
    let expiry = chrono::Utc::now() + chrono::Duration::seconds(expires_in as i64);

    let mut new_token = token.clone();
    new_token.token = access_token.to_string();
    new_token.expiry = Some(expiry.to_rfc3339());
    // Google only rotates the refresh token occasionally.
    if let Some(rotated) = body["refresh_token"].as_str() {
        new_token.refresh_token = Some(rotated.to_string());
    }

    token_store::save_token(token_path, &new_token)?;

    Ok(new_token)
}

fn map_refresh_error(status: u16, body: &str) -> GoogleApiError {
    let lowered = body.to_lowercase();
    if (status == 400 || status == 401)
        && (lowered.contains("invalid_grant") || lowered.contains("token has been expired"))
    {
        return GoogleApiError::AuthExpired;
    }
    GoogleApiError::RefreshFailed(format!("HTTP {}: {}", status, body))
}

/// Produce a usable token: stored, refreshed, or freshly consented.
///
/// 1. token.json present and unexpired: use it as is
/// 2. expired with a refresh token: refresh and persist
/// 3. anything else: run the browser consent flow and persist
pub async fn ensure_credentials(
    client: &reqwest::Client,
    credentials_path: &Path,
    token_path: &Path,
) -> Result<GoogleToken, GoogleApiError> {
    let stored = match token_store::load_token(token_path) {
        Ok(token) => Some(token),
        Err(GoogleApiError::TokenNotFound(_)) => None,
        Err(e) => return Err(e),
    };

    if let Some(token) = stored {
        if !is_token_expired(&token) {
            log::debug!("Using stored Google token from {}", token_path.display());
            return Ok(token);
        }
        if token.refresh_token.is_some() {
            log::info!("Google token expired, refreshing");
            return refresh_access_token(client, &token, token_path).await;
        }
    }

    log::info!(
        "No usable Google token at {}, starting consent flow",
        token_path.display()
    );
    auth::run_consent_flow(client, credentials_path, token_path).await
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn token_with_expiry(expiry: Option<String>) -> GoogleToken {
        GoogleToken {
            token: "test".to_string(),
            refresh_token: None,
            token_uri: default_token_uri(),
            client_id: "c".to_string(),
            client_secret: Some("s".to_string()),
            scopes: vec![],
            expiry,
            account: None,
            universe_domain: None,
        }
    }

    #[test]
    fn test_google_token_python_compat() {
        let python_json = r#"{
            "token": "ya29.python-token",
            "refresh_token": "1//python-refresh",
            "token_uri": "https://oauth2.googleapis.com/token",
            "client_id": "client.apps.googleusercontent.com",
            "client_secret": "secret",
            "scopes": ["https://www.googleapis.com/auth/spreadsheets.readonly"],
            "universe_domain": "googleapis.com",
            "account": "",
            "expiry": "2023-08-09T12:00:00.000000Z"
        }"#;

        let token: GoogleToken = serde_json::from_str(python_json).unwrap();
        assert_eq!(token.token, "ya29.python-token");
        assert_eq!(token.refresh_token.as_deref(), Some("1//python-refresh"));
        assert_eq!(token.scopes, vec![SCOPES[0].to_string()]);
        assert!(is_token_expired(&token));
    }

    #[test]
    fn test_google_token_access_token_alias() {
        let json = r#"{
            "access_token": "ya29.alias-token",
            "refresh_token": "1//refresh",
            "client_id": "client"
        }"#;

        let token: GoogleToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.token, "ya29.alias-token");
        assert_eq!(token.token_uri, "https://oauth2.googleapis.com/token");
        assert!(token.client_secret.is_none());
    }

    #[test]
    fn test_is_token_expired_no_expiry() {
        assert!(!is_token_expired(&token_with_expiry(None)));
    }

    #[test]
    fn test_is_token_expired_unparseable() {
        assert!(is_token_expired(&token_with_expiry(Some("soon".into()))));
    }

    #[test]
    fn test_is_token_expired_future() {
        let future = chrono::Utc::now() + chrono::Duration::hours(1);
        assert!(!is_token_expired(&token_with_expiry(Some(future.to_rfc3339()))));
    }

    #[test]
    fn test_is_token_expired_within_skew() {
        let nearly = chrono::Utc::now() + chrono::Duration::seconds(30);
        assert!(is_token_expired(&token_with_expiry(Some(nearly.to_rfc3339()))));
    }

    #[test]
    fn test_is_token_expired_naive_timestamp() {
        let future = chrono::Utc::now() + chrono::Duration::hours(2);
        let naive = future.naive_utc().format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
        assert!(!is_token_expired(&token_with_expiry(Some(naive))));
    }

    #[test]
    fn test_map_refresh_error_invalid_grant() {
        let err = map_refresh_error(400, r#"{"error":"invalid_grant"}"#);
        assert!(matches!(err, GoogleApiError::AuthExpired));

        let err = map_refresh_error(500, "backend error");
        assert!(matches!(err, GoogleApiError::RefreshFailed(_)));
    }

    #[test]
    fn test_credentials_json_parsing() {
        let json = r#"{
            "installed": {
                "client_id": "12345.apps.googleusercontent.com",
                "client_secret": "secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth",
                "token_uri": "https://oauth2.googleapis.com/token",
                "redirect_uris": ["http://localhost"]
            }
        }"#;

        let creds: ClientCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.installed.client_id, "12345.apps.googleusercontent.com");
        assert_eq!(creds.installed.client_secret.as_deref(), Some("secret"));
        assert_eq!(creds.installed.redirect_uris, vec!["http://localhost"]);
    }

    #[test]
    fn test_credentials_json_web_client() {
        let json = r#"{
            "web": {
                "client_id": "web.apps.googleusercontent.com",
                "client_secret": "secret",
                "auth_uri": "https://accounts.google.com/o/oauth2/auth"
            }
        }"#;

        let creds: ClientCredentials = serde_json::from_str(json).unwrap();
        assert_eq!(creds.installed.client_id, "web.apps.googleusercontent.com");
        assert_eq!(creds.installed.token_uri, "https://oauth2.googleapis.com/token");
    }

    #[test]
    fn test_load_credentials_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        let err = load_credentials(&path).unwrap_err();
        assert!(matches!(err, GoogleApiError::CredentialsNotFound(p) if p == path));
    }

    #[test]
    fn test_load_credentials_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "{\"installed\": 3}").unwrap();
        let err = load_credentials(&path).unwrap_err();
        assert!(matches!(err, GoogleApiError::InvalidCredentials(_)));
    }
}
