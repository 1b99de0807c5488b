pub mod auth;
pub mod cors;
pub mod csrf;
pub mod entitlements;
pub mod error_envelope;
pub mod logger;
pub mod org;
pub mod request_id;
pub mod security_headers;
