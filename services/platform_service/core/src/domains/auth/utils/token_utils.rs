use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// SHA-256 hex digest of a token, the only form that reaches storage
pub fn sha256_hex(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn random_bytes() -> [u8; 32] {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    bytes
}

/// Opaque refresh token: 32 random bytes, URL-safe base64 on the wire
///
/// Returns `(raw, digest)`; only the digest is persisted.
pub fn generate_refresh_token() -> (String, String) {
    let raw = URL_SAFE_NO_PAD.encode(random_bytes());
    let digest = sha256_hex(&raw);
    (raw, digest)
}

/// One-shot credential token (verification / reset): 32 random bytes,
/// hex-encoded for the email link
pub fn generate_credential_token() -> (String, String) {
    let raw = hex::encode(random_bytes());
    let digest = sha256_hex(&raw);
    (raw, digest)
}

/// Random state value for the OAuth authorization round trip
pub fn generate_state_token() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_token_shape() {
        let (raw, digest) = generate_refresh_token();
        // 32 bytes -> 43 chars of unpadded base64url
        assert_eq!(raw.len(), 43);
        assert_eq!(digest.len(), 64);
        assert_eq!(digest, sha256_hex(&raw));
    }

    #[test]
    fn test_credential_token_shape() {
        let (raw, digest) = generate_credential_token();
        assert_eq!(raw.len(), 64);
        assert!(raw.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(digest, sha256_hex(&raw));
    }

    #[test]
    fn test_tokens_are_unique() {
        let (a, _) = generate_refresh_token();
        let (b, _) = generate_refresh_token();
        assert_ne!(a, b);

        assert_ne!(generate_state_token(), generate_state_token());
    }

    #[test]
    fn test_digest_is_stable() {
        assert_eq!(
            sha256_hex("hello"),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }
}
