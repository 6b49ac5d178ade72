//! OAuth2 client-credentials token acquisition
//!
//! The management API authenticates with a bearer token. Operators either
//! pass a pre-issued token directly or provide client credentials that are
//! exchanged once, up front, before any migration work starts.

use log::debug;
use serde::Deserialize;

use super::error::ApiError;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Exchange client credentials for an access token at the given OAuth2
/// token endpoint.
pub async fn fetch_token(
    http: &reqwest::Client,
    oauth2_server_uri: &str,
    client_id: &str,
    client_secret: &str,
    scope: &str,
) -> Result<String, ApiError> {
    debug!("Fetching access token from {}", oauth2_server_uri);

    let response = http
        .post(oauth2_server_uri)
        .form(&[
            ("grant_type", "client_credentials"),
            ("scope", scope),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::Auth(format!(
            "could not fetch access token ({}): {}",
            status, body
        )));
    }

    let token: TokenResponse = response
        .json()
        .await
        .map_err(|e| ApiError::Auth(format!("could not parse token response: {e}")))?;

    Ok(token.access_token)
}
