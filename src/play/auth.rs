//! Service-account authentication (OAuth2 JWT-bearer grant).

use crate::error::ServiceError;
use base64::Engine as _;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use ring::rand::SystemRandom;
use ring::signature::{RSA_PKCS1_SHA256, RsaKeyPair};
use serde::Deserialize;
use std::path::Path;
use std::sync::Mutex;

use super::ServiceResult;

/// OAuth scope for the Android Publisher API
const PUBLISHER_SCOPE: &str = "https://www.googleapis.com/auth/androidpublisher";

/// Token endpoint used when the key file names none
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Lifetime requested for each assertion
const ASSERTION_LIFETIME_SECS: i64 = 3600;

/// Tokens this close to expiry are refreshed
const EXPIRY_MARGIN_SECS: i64 = 60;

/// Service-account JSON key as downloaded from the cloud console
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceAccountKey {
    /// Account e-mail, the assertion issuer
    pub client_email: String,
    /// PKCS#8 private key in PEM form
    pub private_key: String,
    /// Key id, sent as the JWT `kid`
    #[serde(default)]
    pub private_key_id: Option<String>,
    /// OAuth token endpoint
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

impl ServiceAccountKey {
    /// Load a key file
    pub fn from_file(path: &Path) -> ServiceResult<Self> {
        log::info!("Loading account credentials...");
        let content = std::fs::read_to_string(path).map_err(|e| ServiceError::Credentials {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;
        Self::from_json(&content)
    }

    /// Parse key JSON
    pub fn from_json(content: &str) -> ServiceResult<Self> {
        let key: ServiceAccountKey =
            serde_json::from_str(content).map_err(|e| ServiceError::Credentials {
                reason: format!("not a service-account key: {}", e),
            })?;
        if key.client_email.is_empty() {
            return Err(ServiceError::Credentials {
                reason: "client_email is empty".to_string(),
            });
        }
        Ok(key)
    }

    fn key_pair(&self) -> ServiceResult<RsaKeyPair> {
        let der = pem_to_der(&self.private_key)?;
        RsaKeyPair::from_pkcs8(&der).map_err(|e| ServiceError::Credentials {
            reason: format!("private key rejected: {}", e),
        })
    }
}

/// Decode the base64 body of a PEM block
pub(crate) fn pem_to_der(pem: &str) -> ServiceResult<Vec<u8>> {
    let body: String = pem
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("-----"))
        .collect();

    if body.is_empty() {
        return Err(ServiceError::Credentials {
            reason: "private key is empty".to_string(),
        });
    }

    STANDARD.decode(body).map_err(|e| ServiceError::Credentials {
        reason: format!("private key is not valid PEM: {}", e),
    })
}

/// Base64url-encode JSON, as used for JWT segments
pub(crate) fn encode_segment(value: &serde_json::Value) -> String {
    URL_SAFE_NO_PAD.encode(value.to_string())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges signed assertions for access tokens and caches them
pub struct AccessTokenProvider {
    key: ServiceAccountKey,
    key_pair: RsaKeyPair,
    rng: SystemRandom,
    http: reqwest::Client,
    cached: Mutex<Option<CachedToken>>,
}

impl AccessTokenProvider {
    /// Create a provider; fails fast if the private key is unusable
    pub fn new(key: ServiceAccountKey, http: reqwest::Client) -> ServiceResult<Self> {
        let key_pair = key.key_pair()?;
        Ok(Self {
            key,
            key_pair,
            rng: SystemRandom::new(),
            http,
            cached: Mutex::new(None),
        })
    }

    /// Return a valid access token, requesting a new one when needed
    pub async fn access_token(&self) -> ServiceResult<String> {
        let now = Utc::now();
        if let Some(token) = self.cached_token(now) {
            return Ok(token);
        }

        let assertion = self.sign_assertion(now)?;
        let response = self
            .http
            .post(&self.key.token_uri)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| ServiceError::Authentication {
                reason: format!("token request failed: {}", e),
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| ServiceError::Authentication {
            reason: format!("failed to read token response: {}", e),
        })?;

        if !status.is_success() {
            let reason = serde_json::from_str::<TokenErrorResponse>(&body)
                .map(|e| match e.error_description {
                    Some(description) => format!("{}: {}", e.error, description),
                    None => e.error,
                })
                .unwrap_or(body);
            return Err(ServiceError::Authentication {
                reason: format!("HTTP {}: {}", status.as_u16(), reason),
            });
        }

        let token: TokenResponse =
            serde_json::from_str(&body).map_err(|e| ServiceError::Authentication {
                reason: format!("unexpected token response: {}", e),
            })?;

        let lifetime = token.expires_in.unwrap_or(ASSERTION_LIFETIME_SECS);
        let cached = CachedToken {
            value: token.access_token.clone(),
            expires_at: now + Duration::seconds(lifetime),
        };
        *self.cached.lock().unwrap_or_else(|e| e.into_inner()) = Some(cached);

        Ok(token.access_token)
    }

    fn cached_token(&self, now: DateTime<Utc>) -> Option<String> {
        let guard = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        guard
            .as_ref()
            .filter(|t| t.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS) > now)
            .map(|t| t.value.clone())
    }

    fn sign_assertion(&self, now: DateTime<Utc>) -> ServiceResult<String> {
        let mut header = serde_json::json!({ "alg": "RS256", "typ": "JWT" });
        if let Some(kid) = &self.key.private_key_id {
            header["kid"] = serde_json::Value::String(kid.clone());
        }
        let issued_at = now.timestamp();
        let claims = serde_json::json!({
            "iss": self.key.client_email,
            "scope": PUBLISHER_SCOPE,
            "aud": self.key.token_uri,
            "iat": issued_at,
            "exp": issued_at + ASSERTION_LIFETIME_SECS,
        });

        let signing_input = format!("{}.{}", encode_segment(&header), encode_segment(&claims));
        let mut signature = vec![0u8; self.key_pair.public().modulus_len()];
        self.key_pair
            .sign(&RSA_PKCS1_SHA256, &self.rng, signing_input.as_bytes(), &mut signature)
            .map_err(|_| ServiceError::Credentials {
                reason: "failed to sign token assertion".to_string(),
            })?;

        Ok(format!("{}.{}", signing_input, URL_SAFE_NO_PAD.encode(signature)))
    }
}
