//! OAuth2 browser consent flow for Google APIs.
//!
//! Opens the user's browser for consent, captures the redirect on a
//! localhost TcpListener, exchanges the auth code for tokens and saves them.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;

use super::{
    load_credentials, token_store, GoogleApiError, GoogleToken, InstalledAppCredentials, SCOPES,
};

/// Run the full OAuth2 consent flow.
///
/// 1. Load credentials.json
/// 2. Start TcpListener on a random port
/// 3. Open browser with auth URL
/// 4. Wait for redirect with auth code
/// 5. Exchange code for tokens
/// 6. Save token
pub async fn run_consent_flow(
    client: &reqwest::Client,
    credentials_path: &Path,
    token_path: &Path,
) -> Result<GoogleToken, GoogleApiError> {
    let creds = load_credentials(credentials_path)?;
    let installed = &creds.installed;

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    let redirect_uri = format!("http://localhost:{}/", port);

    let auth_url = build_auth_url(&installed.auth_uri, &installed.client_id, &redirect_uri);

    log::info!("Opening browser for Google OAuth consent...");
    if let Err(e) = open::that(&auth_url) {
        log::warn!("Failed to open browser: {}. URL: {}", e, auth_url);
    }
    println!("Please visit this URL to authorize this application: {}", auth_url);

    let auth_code = wait_for_auth_code(&listener)?;

    exchange_code(client, installed, &auth_code, &redirect_uri, token_path).await
}

/// Exchange an authorization code at the token endpoint and save the token.
pub async fn exchange_code(
    client: &reqwest::Client,
    installed: &InstalledAppCredentials,
    code: &str,
    redirect_uri: &str,
    token_path: &Path,
) -> Result<GoogleToken, GoogleApiError> {
    let mut form = vec![
        ("code", code),
        ("client_id", installed.client_id.as_str()),
        ("redirect_uri", redirect_uri),
        ("grant_type", "authorization_code"),
    ];
    if let Some(secret) = installed.client_secret.as_deref() {
        form.push(("client_secret", secret));
    }

    let resp = client.post(&installed.token_uri).form(&form).send().await?;
    if !resp.status().is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(GoogleApiError::RefreshFailed(format!(
            "Token exchange failed: {}",
            body
        )));
    }

    let body: serde_json::Value = resp.json().await?;

    let access_token = body["access_token"]
        .as_str()
        .ok_or_else(|| GoogleApiError::RefreshFailed("No access_token in response".into()))?
        .to_string();
    let refresh_token = body["refresh_token"].as_str().map(|s| s.to_string());
    let expires_in = body["expires_in"].as_u64().unwrap_or(3600);
    let expiry = chrono::Utc::now() + chrono::Duration::seconds(expires_in as i64);

    let token = GoogleToken {
        token: access_token,
        refresh_token,
        token_uri: installed.token_uri.clone(),
        client_id: installed.client_id.clone(),
        client_secret: installed.client_secret.clone(),
        scopes: SCOPES.iter().map(|s| s.to_string()).collect(),
        expiry: Some(expiry.to_rfc3339()),
        account: None,
        universe_domain: Some("googleapis.com".to_string()),
    };

    token_store::save_token(token_path, &token)?;
    log::info!("Google consent complete, token saved to {}", token_path.display());

    Ok(token)
}

/// Authorization URL for the installed-app loopback flow.
fn build_auth_url(auth_uri: &str, client_id: &str, redirect_uri: &str) -> String {
    let query: String = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("response_type", "code")
        .append_pair("client_id", client_id)
        .append_pair("redirect_uri", redirect_uri)
        .append_pair("scope", &SCOPES.join(" "))
        .append_pair("access_type", "offline")
        .append_pair("prompt", "consent")
        .finish();
    format!("{}?{}", auth_uri, query)
}

/// Wait for the OAuth redirect and extract the auth code from the URL.
fn wait_for_auth_code(listener: &TcpListener) -> Result<String, GoogleApiError> {
    let (mut stream, _) = listener.accept()?;

    let mut buffer = [0u8; 4096];
    let n = stream.read(&mut buffer)?;
    let request = String::from_utf8_lossy(&buffer[..n]);

    match parse_redirect(&request) {
        Some(code) => {
            send_response(
                &mut stream,
                "The authentication flow has completed. You may close this window.",
            );
            Ok(code)
        }
        None => {
            send_response(&mut stream, "Authorization denied. You can close this tab.");
            Err(GoogleApiError::FlowCancelled)
        }
    }
}

/// Pull `code` out of `GET /?code=xxx&scope=... HTTP/1.1`.
///
/// Returns None when the user denied access or the code is missing.
fn parse_redirect(request: &str) -> Option<String> {
    let path = request.lines().next()?.split_whitespace().nth(1)?;
    let query = path.split_once('?')?.1;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "code")
        .map(|(_, value)| value.into_owned())
        .filter(|code| !code.is_empty())
}

/// Send an HTTP response to the browser.
fn send_response(stream: &mut impl Write, message: &str) {
    let body = format!(
        "<html><body style=\"font-family: system-ui; text-align: center; padding: 40px;\">\
         <h2>{}</h2></body></html>",
        message
    );
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: {}\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
