use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use shared_error::ApiError;
use std::time::Duration;

/// External identity provider settings
#[derive(Debug, Clone)]
pub struct IdpConfig {
    /// Base URL of the provider's auth API
    pub base_url: String,
    /// Service API key sent on every call
    pub api_key: String,
}

/// User record as the provider returns it
#[derive(Debug, Clone, Deserialize)]
pub struct IdpUser {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    #[serde(default)]
    pub user_metadata: serde_json::Value,
    pub email_confirmed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

impl IdpUser {
    pub fn display_name(&self) -> String {
        self.user_metadata
            .get("name")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }

    pub fn avatar_url(&self) -> Option<String> {
        self.user_metadata
            .get("avatar_url")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }
}

/// Token bundle returned by signup / token endpoints
#[derive(Debug, Clone, Deserialize)]
pub struct IdpTokenBundle {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub user: IdpUser,
}

#[derive(Debug, Deserialize)]
struct IdpErrorBody {
    #[serde(alias = "error_description", alias = "msg")]
    error: Option<String>,
}

/// REST client for the hosted identity provider
///
/// Registration, login and refresh are proxied here; token validation stays
/// local against the shared HS256 secret.
#[derive(Clone)]
pub struct IdpClient {
    config: IdpConfig,
    http: reqwest::Client,
}

impl IdpClient {
    pub fn new(config: IdpConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<IdpTokenBundle, ApiError> {
        let response = self
            .http
            .post(self.url("/signup"))
            .header("apikey", &self.config.api_key)
            .json(&json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            status if status == reqwest::StatusCode::CONFLICT
                || status == reqwest::StatusCode::UNPROCESSABLE_ENTITY =>
            {
                Err(ApiError::conflict("email already registered"))
            }
            status if status.is_client_error() => {
                let message = Self::error_message(response).await;
                Err(ApiError::bad_request(message))
            }
            status => Err(ApiError::internal(format!(
                "identity provider signup failed with {}",
                status
            ))),
        }
    }

    pub async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdpTokenBundle, ApiError> {
        let response = self
            .http
            .post(self.url("/token?grant_type=password"))
            .header("apikey", &self.config.api_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            // Credential failures are uniform regardless of cause
            status if status.is_client_error() => {
                Err(ApiError::unauthorized("invalid_credentials"))
            }
            status => Err(ApiError::internal(format!(
                "identity provider login failed with {}",
                status
            ))),
        }
    }

    pub async fn refresh(&self, refresh_token: &str) -> Result<IdpTokenBundle, ApiError> {
        let response = self
            .http
            .post(self.url("/token?grant_type=refresh_token"))
            .header("apikey", &self.config.api_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(response.json().await?),
            status if status.is_client_error() => Err(ApiError::unauthorized("invalid_token")),
            status => Err(ApiError::internal(format!(
                "identity provider refresh failed with {}",
                status
            ))),
        }
    }

    /// Best-effort logout against the admin API
    ///
    /// A 4xx means the session is already gone and is tolerated; a 5xx is
    /// surfaced so callers can decide.
    pub async fn admin_logout(&self, user_id: &str) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.url(&format!("/admin/users/{}/logout", user_id)))
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
            .send()
            .await?;

        let status = response.status();
        if status.is_server_error() {
            return Err(ApiError::internal(format!(
                "identity provider logout failed with {}",
                status
            )));
        }
        if status.is_client_error() {
            tracing::debug!(user_id = %user_id, status = %status, "idp logout tolerated client error");
        }
        Ok(())
    }

    async fn error_message(response: reqwest::Response) -> String {
        response
            .json::<IdpErrorBody>()
            .await
            .ok()
            .and_then(|b| b.error)
            .unwrap_or_else(|| "identity provider rejected the request".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn bundle_json() -> serde_json::Value {
        json!({
            "access_token": "at",
            "refresh_token": "rt",
            "expires_in": 900,
            "user": {
                "id": "7e57d004-2b97-44e7-8f6c-f25cf8b8d1a9",
                "email": "ada@x.io",
                "role": "user",
                "user_metadata": { "name": "Ada" },
                "email_confirmed_at": "2026-01-01T00:00:00Z",
                "created_at": "2026-01-01T00:00:00Z"
            }
        })
    }

    async fn client_for(server: &MockServer) -> IdpClient {
        IdpClient::new(IdpConfig {
            base_url: server.uri(),
            api_key: "service-key".to_string(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_sign_in_parses_bundle() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(header("apikey", "service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(bundle_json()))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let bundle = client
            .sign_in_with_password("ada@x.io", "pw")
            .await
            .unwrap();

        assert_eq!(bundle.access_token, "at");
        assert_eq!(bundle.user.display_name(), "Ada");
        assert!(bundle.user.email_confirmed_at.is_some());
    }

    #[tokio::test]
    async fn test_sign_in_client_error_is_uniform() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .sign_in_with_password("ghost@x.io", "pw")
            .await
            .unwrap_err();
        assert_eq!(err.message(), "invalid_credentials");
    }

    #[tokio::test]
    async fn test_sign_up_conflict() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/signup"))
            .respond_with(ResponseTemplate::new(422))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.sign_up("ada@x.io", "pw", "Ada").await.unwrap_err();
        assert_eq!(err.code(), "CONFLICT");
    }

    #[tokio::test]
    async fn test_admin_logout_tolerates_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/users/u1/logout"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.admin_logout("u1").await.is_ok());
    }

    #[tokio::test]
    async fn test_admin_logout_surfaces_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/users/u1/logout"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.admin_logout("u1").await.is_err());
    }
}
