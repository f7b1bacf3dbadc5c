//! Authentication strategies for outgoing requests

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use std::fmt;
use tracing::warn;

pub const CF_ACCESS_CLIENT_ID: &str = "CF-Access-Client-Id";
pub const CF_ACCESS_CLIENT_SECRET: &str = "CF-Access-Client-Secret";

/// Authentication mode without its credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthType {
    NoAuth,
    CloudflareAccess,
    BearerToken,
    BasicAuth,
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthType::NoAuth => "NoAuth",
            AuthType::CloudflareAccess => "CloudflareAccess",
            AuthType::BearerToken => "BearerToken",
            AuthType::BasicAuth => "BasicAuth",
        };
        f.write_str(name)
    }
}

/// Authentication mode with the credentials it needs
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    #[default]
    None,
    CloudflareAccess {
        client_id: String,
        client_secret: String,
    },
    BearerToken {
        token: String,
    },
    BasicAuth {
        username: String,
        password: String,
    },
}

impl AuthConfig {
    pub fn auth_type(&self) -> AuthType {
        match self {
            AuthConfig::None => AuthType::NoAuth,
            AuthConfig::CloudflareAccess { .. } => AuthType::CloudflareAccess,
            AuthConfig::BearerToken { .. } => AuthType::BearerToken,
            AuthConfig::BasicAuth { .. } => AuthType::BasicAuth,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, AuthConfig::None)
    }

    /// Stamp the headers with this mode's credentials.
    ///
    /// Existing values are replaced, so applying twice is the same as once.
    /// An empty bearer token adds no header; Cloudflare Access headers are
    /// always set, even when a credential is empty.
    pub fn apply(&self, headers: &mut HeaderMap) {
        match self {
            AuthConfig::None => {}
            AuthConfig::BearerToken { token } if token.is_empty() => {}
            AuthConfig::BearerToken { token } => {
                set_header(headers, AUTHORIZATION, format!("Bearer {}", token));
            }
            AuthConfig::CloudflareAccess {
                client_id,
                client_secret,
            } => {
                set_header(
                    headers,
                    HeaderName::from_static("cf-access-client-id"),
                    client_id.clone(),
                );
                set_header(
                    headers,
                    HeaderName::from_static("cf-access-client-secret"),
                    client_secret.clone(),
                );
            }
            AuthConfig::BasicAuth { username, password } => {
                let encoded = STANDARD.encode(format!("{}:{}", username, password));
                set_header(headers, AUTHORIZATION, format!("Basic {}", encoded));
            }
        }
    }
}

fn set_header(headers: &mut HeaderMap, name: HeaderName, value: String) {
    match HeaderValue::from_str(&value) {
        Ok(mut value) => {
            value.set_sensitive(true);
            headers.insert(name, value);
        }
        Err(_) => warn!(header = %name, "Credential is not a valid header value, skipping"),
    }
}

// Credentials stay out of logs and panic messages.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::None => f.write_str("None"),
            AuthConfig::CloudflareAccess { client_id, .. } => f
                .debug_struct("CloudflareAccess")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
            AuthConfig::BearerToken { .. } => f
                .debug_struct("BearerToken")
                .field("token", &"<redacted>")
                .finish(),
            AuthConfig::BasicAuth { username, .. } => f
                .debug_struct("BasicAuth")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
        }
    }
}
