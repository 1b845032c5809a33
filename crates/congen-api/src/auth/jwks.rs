//! RS256/ES256 signature verification against a JWKS endpoint
//!
//! Optional: enabled when `CLERK_JWKS_URL` is configured. Keys are cached per
//! `kid` and refetched after the cache TTL or when an unknown `kid` shows up.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::AuthError;

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwks {
    pub keys: Vec<Jwk>,
}

/// JSON Web Key structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Jwk {
    #[serde(rename = "kty")]
    pub key_type: String,
    #[serde(rename = "kid")]
    pub key_id: Option<String>,
    #[serde(rename = "alg")]
    pub algorithm: Option<String>,
    #[serde(rename = "n")]
    pub modulus: Option<String>, // RSA
    #[serde(rename = "e")]
    pub exponent: Option<String>, // RSA
    #[serde(rename = "x")]
    pub x_coordinate: Option<String>, // EC
    #[serde(rename = "y")]
    pub y_coordinate: Option<String>, // EC
    #[serde(rename = "crv")]
    pub curve: Option<String>, // EC
}

#[derive(Clone)]
struct CachedKey {
    key: DecodingKey,
    expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct VerifiedClaims {
    sub: String,
}

pub struct JwksVerifier {
    client: reqwest::Client,
    jwks_url: String,
    cache: Arc<RwLock<HashMap<String, CachedKey>>>,
    cache_ttl_seconds: i64,
    algorithms: Vec<Algorithm>,
}

impl JwksVerifier {
    pub fn new(client: reqwest::Client, jwks_url: String, cache_ttl_seconds: Option<i64>) -> Self {
        Self {
            client,
            jwks_url,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl_seconds: cache_ttl_seconds.unwrap_or(3600),
            algorithms: vec![Algorithm::RS256, Algorithm::ES256],
        }
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AuthError> {
        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AuthError::Timeout("JWKS fetch".to_string())
                } else {
                    AuthError::Provider(format!("failed to fetch JWKS: {}", e))
                }
            })?;

        if !response.status().is_success() {
            return Err(AuthError::Provider(format!(
                "JWKS endpoint returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("failed to parse JWKS: {}", e)))
    }

    fn jwk_to_decoding_key(jwk: &Jwk) -> Result<DecodingKey, AuthError> {
        let missing = |what: &str| AuthError::InvalidSignature(format!("JWK missing {}", what));

        match jwk.key_type.as_str() {
            "RSA" => {
                let n = jwk.modulus.as_ref().ok_or_else(|| missing("modulus"))?;
                let e = jwk.exponent.as_ref().ok_or_else(|| missing("exponent"))?;
                DecodingKey::from_rsa_components(n, e)
                    .map_err(|e| AuthError::InvalidSignature(format!("bad RSA key: {}", e)))
            }
            "EC" => {
                let x = jwk.x_coordinate.as_ref().ok_or_else(|| missing("x coordinate"))?;
                let y = jwk.y_coordinate.as_ref().ok_or_else(|| missing("y coordinate"))?;
                let curve = jwk.curve.as_ref().ok_or_else(|| missing("curve"))?;
                if curve != "P-256" {
                    return Err(AuthError::InvalidSignature(format!(
                        "unsupported EC curve {} (only P-256)",
                        curve
                    )));
                }
                DecodingKey::from_ec_components(x, y)
                    .map_err(|e| AuthError::InvalidSignature(format!("bad EC key: {}", e)))
            }
            other => Err(AuthError::InvalidSignature(format!(
                "unsupported key type {}",
                other
            ))),
        }
    }

    async fn get_decoding_key(&self, kid: Option<&str>) -> Result<DecodingKey, AuthError> {
        let cache_key = kid.unwrap_or("default").to_string();

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&cache_key) {
                if cached.expires_at > Utc::now() {
                    return Ok(cached.key.clone());
                }
            }
        }

        let jwks = self.fetch_jwks().await?;

        let jwk = match kid {
            Some(kid) => jwks
                .keys
                .iter()
                .find(|k| k.key_id.as_deref() == Some(kid))
                .ok_or_else(|| {
                    AuthError::InvalidSignature(format!("key id {} not found in JWKS", kid))
                })?,
            None => jwks
                .keys
                .first()
                .ok_or_else(|| AuthError::InvalidSignature("JWKS has no keys".to_string()))?,
        };

        let decoding_key = Self::jwk_to_decoding_key(jwk)?;

        self.cache.write().await.insert(
            cache_key,
            CachedKey {
                key: decoding_key.clone(),
                expires_at: Utc::now() + chrono::Duration::seconds(self.cache_ttl_seconds),
            },
        );

        Ok(decoding_key)
    }

    /// Verify signature, `exp` and `nbf`. Returns the verified `sub`.
    pub async fn verify(&self, token: &str) -> Result<String, AuthError> {
        let header = jsonwebtoken::decode_header(token)
            .map_err(|e| AuthError::InvalidSignature(format!("invalid token header: {}", e)))?;

        if !self.algorithms.contains(&header.alg) {
            return Err(AuthError::InvalidSignature(format!(
                "unsupported algorithm {:?}",
                header.alg
            )));
        }

        let decoding_key = self.get_decoding_key(header.kid.as_deref()).await?;

        let mut validation = Validation::new(header.alg);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;
        // The key family is fixed by the header, so only that algorithm may validate.
        validation.algorithms = vec![header.alg];

        let token_data = decode::<VerifiedClaims>(token, &decoding_key, &validation).map_err(|e| {
            tracing::debug!(error = %e, "JWT validation failed");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    AuthError::InvalidSignature("token has expired".to_string())
                }
                jsonwebtoken::errors::ErrorKind::ImmatureSignature => {
                    AuthError::InvalidSignature("token is not yet valid (nbf)".to_string())
                }
                _ => AuthError::InvalidSignature(e.to_string()),
            }
        })?;

        Ok(token_data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    fn token_with_header(header: &str) -> String {
        format!(
            "{}.{}.c2lnbmF0dXJl",
            URL_SAFE_NO_PAD.encode(header),
            URL_SAFE_NO_PAD.encode(r#"{"sub":"user_1","exp":4102444800}"#)
        )
    }

    fn verifier(url: String) -> JwksVerifier {
        JwksVerifier::new(reqwest::Client::new(), url, None)
    }

    #[tokio::test]
    async fn test_garbage_token_rejected_without_fetching_keys() {
        let verifier = verifier("http://127.0.0.1:9/jwks".to_string());
        let err = verifier.verify("not-a-token").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature(_)));
    }

    #[tokio::test]
    async fn test_symmetric_algorithm_rejected() {
        let verifier = verifier("http://127.0.0.1:9/jwks".to_string());
        let token = token_with_header(r#"{"alg":"HS256","typ":"JWT"}"#);
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature(_)));
    }

    #[tokio::test]
    async fn test_unknown_key_id_rejected() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/.well-known/jwks.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"keys":[{"kty":"RSA","kid":"other","n":"AQAB","e":"AQAB"}]}"#)
            .create_async()
            .await;

        let verifier = verifier(format!("{}/.well-known/jwks.json", server.url()));
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT","kid":"k1"}"#);
        let err = verifier.verify(&token).await.unwrap_err();

        mock.assert_async().await;
        assert!(matches!(err, AuthError::InvalidSignature(_)));
    }

    const TEST_KEY_PEM: &str = include_str!("../../tests/fixtures/rs256_test_key.pem");
    const TEST_KEY_MODULUS: &str = "uCpm5sZkoVV707K-IL6WPsib_ItQT0vnnlUVSCpA0NbTZ3zr2c4VG1uW93HzsCaIXQRUHk92sMtUaBz-w27_oVwTVF1EGgV5qTCr-A_7uenqvnJyBzxmu74Z1pVgWIWkZ5WbpP3ME7T2kj1CrE25CsvclEgQVVYYpykU_Ii7CyW9dxVjoDx5nXjuN4jORHvkdz9bXve_WEtu6ttQN7zDRMcpjTyJdvKtMXHesAalELOrt95vhYnRvXYRROAf2jsQoAEHIj7xxxsSH_xu4UahPbTIoNgU_N1eiDFnmkoE420z1Fv9sSF-KPGMMyJrc8me6n_PIZ2nUfehusMqw5CnCQ";

    fn signed_token(claims: serde_json::Value) -> String {
        let mut header = jsonwebtoken::Header::new(Algorithm::RS256);
        header.kid = Some("k1".to_string());
        let key = jsonwebtoken::EncodingKey::from_rsa_pem(TEST_KEY_PEM.as_bytes()).unwrap();
        jsonwebtoken::encode(&header, &claims, &key).unwrap()
    }

    async fn jwks_server() -> (mockito::ServerGuard, mockito::Mock) {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/jwks")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                serde_json::json!({
                    "keys": [{
                        "kty": "RSA",
                        "kid": "k1",
                        "alg": "RS256",
                        "n": TEST_KEY_MODULUS,
                        "e": "AQAB"
                    }]
                })
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;
        (server, mock)
    }

    #[tokio::test]
    async fn test_valid_rs256_token_yields_subject() {
        let (server, mock) = jwks_server().await;
        let verifier = verifier(format!("{}/jwks", server.url()));

        let token = signed_token(serde_json::json!({ "sub": "user_1", "exp": 4102444800u64 }));
        assert_eq!(verifier.verify(&token).await.unwrap(), "user_1");

        // Second verification is served from the key cache
        assert_eq!(verifier.verify(&token).await.unwrap(), "user_1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_expired_rs256_token_rejected() {
        let (server, _mock) = jwks_server().await;
        let verifier = verifier(format!("{}/jwks", server.url()));

        let token = signed_token(serde_json::json!({ "sub": "user_1", "exp": 1000000000u64 }));
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature(_)));
    }

    #[tokio::test]
    async fn test_tampered_rs256_token_rejected() {
        let (server, _mock) = jwks_server().await;
        let verifier = verifier(format!("{}/jwks", server.url()));

        let token = signed_token(serde_json::json!({ "sub": "user_1", "exp": 4102444800u64 }));
        let mut segments: Vec<&str> = token.split('.').collect();
        let forged = URL_SAFE_NO_PAD.encode(r#"{"sub":"user_2","exp":4102444800}"#);
        segments[1] = &forged;
        let err = verifier.verify(&segments.join(".")).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidSignature(_)));
    }

    #[tokio::test]
    async fn test_jwks_outage_is_provider_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/jwks")
            .with_status(502)
            .create_async()
            .await;

        let verifier = verifier(format!("{}/jwks", server.url()));
        let token = token_with_header(r#"{"alg":"RS256","typ":"JWT","kid":"k1"}"#);
        let err = verifier.verify(&token).await.unwrap_err();
        assert!(matches!(err, AuthError::Provider(_)));
    }

    #[test]
    fn test_unsupported_curve() {
        let jwk = Jwk {
            key_type: "EC".to_string(),
            key_id: None,
            algorithm: None,
            modulus: None,
            exponent: None,
            x_coordinate: Some("x".to_string()),
            y_coordinate: Some("y".to_string()),
            curve: Some("P-384".to_string()),
        };
        assert!(matches!(
            JwksVerifier::jwk_to_decoding_key(&jwk),
            Err(AuthError::InvalidSignature(_))
        ));
    }
}
