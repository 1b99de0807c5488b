use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared_error::ApiError;
use uuid::Uuid;

/// Claims carried by an access token
///
/// Both auth providers (local and external IdP) produce this same shape so
/// everything downstream of token validation is provider-agnostic.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AccessClaims {
    /// Principal ID
    pub sub: Uuid,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Random token id
    pub jti: String,

    /// Principal ID (duplicated for clients that read custom claims only)
    pub user_id: Uuid,

    /// Principal email
    pub email: String,

    /// Display name
    pub name: String,

    /// System roles at issuance time
    #[serde(default)]
    pub roles: Vec<String>,
}

impl AccessClaims {
    /// Create claims for a new access token
    pub fn new(
        user_id: Uuid,
        email: String,
        name: String,
        roles: Vec<String>,
        ttl_seconds: i64,
    ) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: user_id,
            iat: now,
            exp: now + ttl_seconds,
            jti: Uuid::new_v4().to_string(),
            user_id,
            email,
            name,
            roles,
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Encode claims into a signed HS256 JWT
pub fn encode_access_token(claims: &AccessClaims, secret: &str) -> Result<String, ApiError> {
    let key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::new(Algorithm::HS256), claims, &key)
        .map_err(|e| ApiError::internal(format!("failed to encode JWT: {}", e)))
}

/// Decode and validate an access token
///
/// Only HS256 is accepted; expired tokens map to `expired_token`, every
/// other invalidity to `invalid_token`.
pub fn decode_access_token(token: &str, secret: &str) -> Result<AccessClaims, ApiError> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);

    decode::<AccessClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                ApiError::unauthorized("expired_token")
            }
            _ => ApiError::unauthorized("invalid_token"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_round_trip() {
        let user_id = Uuid::new_v4();
        let secret = "test_secret";

        let claims = AccessClaims::new(
            user_id,
            "ada@x.io".to_string(),
            "Ada".to_string(),
            vec!["user".to_string()],
            900,
        );
        let token = encode_access_token(&claims, secret).unwrap();

        let decoded = decode_access_token(&token, secret).unwrap();
        assert_eq!(decoded.sub, user_id);
        assert_eq!(decoded.user_id, user_id);
        assert_eq!(decoded.email, "ada@x.io");
        assert_eq!(decoded.name, "Ada");
        assert_eq!(decoded.roles, vec!["user".to_string()]);
        assert_eq!(decoded.jti, claims.jti);
    }

    #[test]
    fn test_expired_token_maps_to_expired() {
        let claims = AccessClaims {
            sub: Uuid::new_v4(),
            iat: 0,
            exp: 1, // long past
            jti: Uuid::new_v4().to_string(),
            user_id: Uuid::new_v4(),
            email: "a@b.c".to_string(),
            name: "A".to_string(),
            roles: vec![],
        };
        let token = encode_access_token(&claims, "s").unwrap();
        let err = decode_access_token(&token, "s").unwrap_err();
        assert_eq!(err.message(), "expired_token");
    }

    #[test]
    fn test_wrong_secret_maps_to_invalid() {
        let claims = AccessClaims::new(
            Uuid::new_v4(),
            "a@b.c".to_string(),
            "A".to_string(),
            vec![],
            900,
        );
        let token = encode_access_token(&claims, "secret_one").unwrap();
        let err = decode_access_token(&token, "secret_two").unwrap_err();
        assert_eq!(err.message(), "invalid_token");
    }

    #[test]
    fn test_non_hmac_algorithm_rejected() {
        // A token whose header claims RS256 must fail closed even if the
        // payload is well-formed.
        let claims = AccessClaims::new(
            Uuid::new_v4(),
            "a@b.c".to_string(),
            "A".to_string(),
            vec![],
            900,
        );
        let token = encode_access_token(&claims, "s").unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        // {"alg":"RS256","typ":"JWT"} base64url, no padding
        let forged_header = "eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9";
        parts[0] = forged_header;
        let forged = parts.join(".");
        let err = decode_access_token(&forged, "s").unwrap_err();
        assert_eq!(err.message(), "invalid_token");
    }

    #[test]
    fn test_fresh_jti_per_token() {
        let a = AccessClaims::new(
            Uuid::new_v4(),
            "a@b.c".to_string(),
            "A".to_string(),
            vec![],
            900,
        );
        let b = AccessClaims::new(
            Uuid::new_v4(),
            "a@b.c".to_string(),
            "A".to_string(),
            vec![],
            900,
        );
        assert_ne!(a.jti, b.jti);
    }
}
