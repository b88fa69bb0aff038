//! Authentication extractors.
//!
//! - `AuthUser` - learner authentication via JWT
//! - `ServiceAuth` - service-to-service authentication via API key
//! - `AdminAuth` - admin authentication for privileged endpoints

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use ml_rewards_core::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// How long to cache JWKS keys before refreshing.
const JWKS_CACHE_DURATION: Duration = Duration::from_secs(3600);

/// Timeout for JWKS fetch requests.
const JWKS_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// An authenticated learner extracted from a JWT bearer token.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user ID.
    pub user_id: UserId,
    /// The raw subject claim from the JWT.
    pub subject: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(ApiError::Unauthorized)?;

        // Test tokens are only honored when explicitly enabled in config,
        // never in a default deployment.
        if state.config.allow_test_tokens {
            if let Some(user_id_str) = token.strip_prefix("test-token:") {
                let user_id = user_id_str
                    .parse::<UserId>()
                    .map_err(|_| ApiError::Unauthorized)?;

                return Ok(AuthUser {
                    user_id,
                    subject: user_id_str.to_string(),
                });
            }
        }

        let claims = validate_jwt(token, state).await?;

        let user_id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser {
            user_id,
            subject: claims.sub,
        })
    }
}

/// Service authentication via API key.
///
/// Used for requests from sibling services such as the exercise runner.
#[derive(Debug, Clone)]
pub struct ServiceAuth {
    /// The service name or identifier.
    pub service_name: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for ServiceAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let api_key = parts
            .headers
            .get("x-api-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let expected_key = state
            .config
            .service_api_key
            .as_ref()
            .ok_or(ApiError::Unauthorized)?;

        if api_key != expected_key {
            return Err(ApiError::Unauthorized);
        }

        let service_name = parts
            .headers
            .get("x-service-name")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown")
            .to_string();

        Ok(ServiceAuth { service_name })
    }
}

/// Admin authentication via API key with admin scope.
///
/// Used for admin-only endpoints like manual coin grants. Requires the
/// `X-Admin-Key` header to match the configured admin key.
#[derive(Debug, Clone)]
pub struct AdminAuth {
    /// Admin identifier (for audit logging).
    pub admin_id: String,
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let admin_key = parts
            .headers
            .get("x-admin-key")
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::Unauthorized)?;

        let expected_key = state
            .config
            .admin_api_key
            .as_ref()
            .ok_or(ApiError::Unauthorized)?;

        if admin_key != expected_key {
            return Err(ApiError::Unauthorized);
        }

        let admin_id = parts
            .headers
            .get("x-admin-id")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("admin")
            .to_string();

        tracing::info!(admin_id = %admin_id, "Admin authenticated");

        Ok(AdminAuth { admin_id })
    }
}

/// JWT claims structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtClaims {
    /// Subject (user ID).
    pub sub: String,
    /// Audience (can be string or array).
    #[serde(default)]
    pub aud: Option<serde_json::Value>,
    /// Issuer.
    pub iss: String,
    /// Expiration time.
    pub exp: i64,
    /// Issued at.
    pub iat: i64,
}

/// JWKS (JSON Web Key Set) response structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwks {
    /// List of JWK keys.
    pub keys: Vec<Jwk>,
}

/// Single JSON Web Key.
#[derive(Debug, Clone, Deserialize)]
pub struct Jwk {
    /// Key type (e.g., "RSA").
    pub kty: String,
    /// Key ID.
    pub kid: Option<String>,
    /// Algorithm (e.g., "RS256").
    pub alg: Option<String>,
    /// RSA public key modulus (base64url encoded).
    pub n: Option<String>,
    /// RSA public key exponent (base64url encoded).
    pub e: Option<String>,
    /// Key use (e.g., "sig" for signature).
    #[serde(rename = "use")]
    pub key_use: Option<String>,
}

/// JWKS cache entry.
struct JwksCache {
    /// Reusable HTTP client for JWKS fetches; reusing it allows
    /// connection pooling.
    client: reqwest::Client,
    /// Cached keys mapped by kid.
    keys: HashMap<String, DecodingKey>,
    /// Default key (for tokens without kid).
    default_key: Option<DecodingKey>,
    /// When the cache was last updated.
    last_updated: Instant,
}

impl JwksCache {
    fn new() -> Self {
        let client = reqwest::Client::builder()
            .timeout(JWKS_FETCH_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            keys: HashMap::new(),
            default_key: None,
            // Force an initial fetch by backdating last_updated
            last_updated: Instant::now()
                .checked_sub(JWKS_CACHE_DURATION)
                .unwrap_or_else(Instant::now),
        }
    }

    fn is_expired(&self) -> bool {
        self.last_updated.elapsed() >= JWKS_CACHE_DURATION
    }
}

/// Global JWKS cache (lazily initialized).
static JWKS_CACHE: std::sync::OnceLock<RwLock<JwksCache>> = std::sync::OnceLock::new();

fn get_jwks_cache() -> &'static RwLock<JwksCache> {
    JWKS_CACHE.get_or_init(|| RwLock::new(JwksCache::new()))
}

/// Validate a JWT token against the JWKS.
async fn validate_jwt(token: &str, state: &AppState) -> Result<JwtClaims, ApiError> {
    let header = decode_header(token).map_err(|e| {
        tracing::debug!(error = %e, "Failed to decode JWT header");
        ApiError::Unauthorized
    })?;

    let decoding_key = get_decoding_key(header.kid.as_deref(), state).await?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&[&state.config.auth_audience]);
    validation.set_issuer(&[&state.config.auth_base_url]);

    let token_data = decode::<JwtClaims>(token, &decoding_key, &validation).map_err(|e| {
        tracing::debug!(error = %e, "JWT validation failed");
        ApiError::Unauthorized
    })?;

    Ok(token_data.claims)
}

/// Get a decoding key from cache or fetch JWKS.
async fn get_decoding_key(kid: Option<&str>, state: &AppState) -> Result<DecodingKey, ApiError> {
    let cache = get_jwks_cache();

    {
        let cache_read = cache.read().await;
        if !cache_read.is_expired() {
            if let Some(kid) = kid {
                if let Some(key) = cache_read.keys.get(kid) {
                    return Ok(key.clone());
                }
            } else if let Some(key) = &cache_read.default_key {
                return Ok(key.clone());
            }
        }
    }

    // Cache miss or expired - fetch JWKS
    let jwks = fetch_jwks(state).await?;

    let mut cache_write = cache.write().await;
    cache_write.keys.clear();
    cache_write.default_key = None;
    cache_write.last_updated = Instant::now();

    for jwk in &jwks.keys {
        if let Some(decoding_key) = jwk_to_decoding_key(jwk) {
            if let Some(ref key_kid) = jwk.kid {
                cache_write
                    .keys
                    .insert(key_kid.clone(), decoding_key.clone());
            }
            if cache_write.default_key.is_none() {
                cache_write.default_key = Some(decoding_key);
            }
        }
    }

    if let Some(kid) = kid {
        cache_write
            .keys
            .get(kid)
            .cloned()
            .ok_or(ApiError::Unauthorized)
    } else {
        cache_write
            .default_key
            .clone()
            .ok_or(ApiError::Unauthorized)
    }
}

/// Fetch JWKS from the auth provider.
async fn fetch_jwks(state: &AppState) -> Result<Jwks, ApiError> {
    let jwks_url = format!("{}/.well-known/jwks.json", state.config.auth_base_url);

    tracing::debug!(url = %jwks_url, "Fetching JWKS");

    let client = {
        let cache_read = get_jwks_cache().read().await;
        cache_read.client.clone()
    };

    let response = client.get(&jwks_url).send().await.map_err(|e| {
        tracing::error!(error = %e, url = %jwks_url, "Failed to fetch JWKS");
        ApiError::ExternalService("Failed to fetch authentication keys".into())
    })?;

    if !response.status().is_success() {
        tracing::error!(
            status = %response.status(),
            url = %jwks_url,
            "JWKS fetch returned non-success status"
        );
        return Err(ApiError::ExternalService(
            "Failed to fetch authentication keys".into(),
        ));
    }

    let jwks: Jwks = response.json().await.map_err(|e| {
        tracing::error!(error = %e, "Failed to parse JWKS response");
        ApiError::ExternalService("Failed to parse authentication keys".into())
    })?;

    tracing::info!(keys_count = %jwks.keys.len(), "JWKS fetched successfully");

    Ok(jwks)
}

/// Convert a JWK to a `DecodingKey`.
fn jwk_to_decoding_key(jwk: &Jwk) -> Option<DecodingKey> {
    // RSA only
    if jwk.kty != "RSA" {
        tracing::debug!(kty = %jwk.kty, "Skipping non-RSA JWK");
        return None;
    }

    let n = jwk.n.as_ref()?;
    let e = jwk.e.as_ref()?;

    DecodingKey::from_rsa_components(n, e).ok()
}
