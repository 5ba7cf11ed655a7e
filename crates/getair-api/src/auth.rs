// Token acquisition
//
// The getAir cloud uses an OAuth2 password grant: one POST against the
// configured auth endpoint yields a bearer token for the API endpoint.
// Refresh is handled by reconnecting with the same credentials — the
// backend re-reads the credentials file, which is why it must stay on
// disk for the lifetime of a session (see `credentials`).

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::Error;

/// Client id the vendor app registers with; overridable per profile.
pub const DEFAULT_CLIENT_ID: &str = "smartcontrol-app";

/// Connection secrets for one getAir account.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Token endpoint, e.g. `https://auth.getair.eu/oauth/token`.
    pub auth_url: Url,
    /// API root, e.g. `https://api.getair.eu/`.
    pub api_url: Url,
    pub client_id: String,
    pub username: String,
    pub password: SecretString,
}

/// A granted session token.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub access_token: String,
    /// Lifetime in seconds as reported by the auth endpoint.
    pub expires_in: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: u64,
}

/// Perform the password grant and return the session token.
///
/// An empty or missing `access_token` field is treated as an
/// authentication failure, not a success with no token.
pub(crate) async fn password_grant(
    http: &reqwest::Client,
    credentials: &Credentials,
) -> Result<SessionToken, Error> {
    debug!("requesting token from {}", credentials.auth_url);

    let resp = http
        .post(credentials.auth_url.clone())
        .form(&[
            ("grant_type", "password"),
            ("client_id", credentials.client_id.as_str()),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.expose_secret()),
        ])
        .send()
        .await
        .map_err(Error::Transport)?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(Error::Authentication {
            message: format!("token grant failed (HTTP {status}): {body}"),
        });
    }

    let token: TokenResponse = resp.json().await.map_err(|e| Error::Deserialization {
        message: format!("token response: {e}"),
    })?;

    if token.access_token.is_empty() {
        return Err(Error::Authentication {
            message: "token grant returned no token".into(),
        });
    }

    debug!("token granted (expires in {}s)", token.expires_in);
    Ok(SessionToken {
        access_token: token.access_token,
        expires_in: token.expires_in,
    })
}
