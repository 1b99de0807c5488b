use platform_service_core::domains::auth::dto::oauth_dto::FederatedProfile;
use serde::Deserialize;
use shared_config::Config;
use shared_error::ApiError;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Endpoints and credentials of one OAuth provider
#[derive(Debug, Clone)]
pub struct OAuthProviderConfig {
    pub name: String,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub scopes: String,
}

impl OAuthProviderConfig {
    fn google(client_id: String, client_secret: String) -> Self {
        Self {
            name: "google".to_string(),
            client_id,
            client_secret,
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            profile_url: "https://www.googleapis.com/oauth2/v2/userinfo".to_string(),
            scopes: "openid email profile".to_string(),
        }
    }

    fn github(client_id: String, client_secret: String) -> Self {
        Self {
            name: "github".to_string(),
            client_id,
            client_secret,
            auth_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: "https://github.com/login/oauth/access_token".to_string(),
            profile_url: "https://api.github.com/user".to_string(),
            scopes: "read:user user:email".to_string(),
        }
    }
}

/// Enabled providers, keyed by name
#[derive(Clone, Default)]
pub struct OAuthRegistry {
    providers: HashMap<String, OAuthProviderConfig>,
}

impl OAuthRegistry {
    pub fn from_config(config: &Config) -> Self {
        let mut providers = HashMap::new();

        if config.oauth_google_enabled {
            if let (Some(id), Some(secret)) = (
                config.oauth_google_client_id.clone(),
                config.oauth_google_client_secret.clone(),
            ) {
                providers.insert("google".to_string(), OAuthProviderConfig::google(id, secret));
            } else {
                tracing::warn!("google OAuth enabled without client credentials, skipping");
            }
        }

        if config.oauth_github_enabled {
            if let (Some(id), Some(secret)) = (
                config.oauth_github_client_id.clone(),
                config.oauth_github_client_secret.clone(),
            ) {
                providers.insert("github".to_string(), OAuthProviderConfig::github(id, secret));
            } else {
                tracing::warn!("github OAuth enabled without client credentials, skipping");
            }
        }

        Self { providers }
    }

    pub fn get(&self, name: &str) -> Option<&OAuthProviderConfig> {
        self.providers.get(name)
    }
}

#[derive(Debug, Deserialize)]
struct TokenExchangeResp {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct GoogleProfile {
    id: String,
    email: Option<String>,
    verified_email: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubProfile {
    id: i64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubEmail {
    email: String,
    primary: bool,
    verified: bool,
}

/// Authorization-code client for the registered providers
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new() -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .user_agent("platform-service")
            .build()
            .map_err(|e| ApiError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    /// Consent URL carrying the state value
    pub fn authorize_url(
        &self,
        provider: &OAuthProviderConfig,
        state: &str,
        redirect_uri: &str,
    ) -> Result<String, ApiError> {
        let mut url = Url::parse(&provider.auth_url)
            .map_err(|e| ApiError::internal(format!("bad provider auth url: {}", e)))?;

        url.query_pairs_mut()
            .append_pair("client_id", &provider.client_id)
            .append_pair("redirect_uri", redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", &provider.scopes)
            .append_pair("state", state);

        Ok(url.to_string())
    }

    /// Exchange the authorization code for an access token
    pub async fn exchange_code(
        &self,
        provider: &OAuthProviderConfig,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, ApiError> {
        let response = self
            .http
            .post(&provider.token_url)
            .header("Accept", "application/json")
            .form(&[
                ("client_id", provider.client_id.as_str()),
                ("client_secret", provider.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::warn!(provider = %provider.name, status = %status, "code exchange failed");
            return Err(ApiError::unauthorized("oauth_exchange_failed"));
        }

        let token: TokenExchangeResp = response
            .json()
            .await
            .map_err(|_| ApiError::unauthorized("oauth_exchange_failed"))?;
        Ok(token.access_token)
    }

    /// Fetch and normalize the provider profile
    pub async fn fetch_profile(
        &self,
        provider: &OAuthProviderConfig,
        access_token: &str,
    ) -> Result<FederatedProfile, ApiError> {
        match provider.name.as_str() {
            "google" => self.fetch_google_profile(provider, access_token).await,
            "github" => self.fetch_github_profile(provider, access_token).await,
            other => Err(ApiError::internal(format!("unknown oauth provider: {}", other))),
        }
    }

    async fn fetch_google_profile(
        &self,
        provider: &OAuthProviderConfig,
        access_token: &str,
    ) -> Result<FederatedProfile, ApiError> {
        let profile: GoogleProfile = self
            .http
            .get(&provider.profile_url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()
            .map_err(|_| ApiError::unauthorized("oauth_profile_failed"))?
            .json()
            .await
            .map_err(|_| ApiError::unauthorized("oauth_profile_failed"))?;

        // Unverified addresses never link accounts
        let email = match profile.verified_email {
            Some(true) => profile.email,
            _ => None,
        };

        Ok(FederatedProfile {
            provider: provider.name.clone(),
            provider_user_id: profile.id,
            email,
            name: profile.name,
            avatar_url: profile.picture,
        })
    }

    async fn fetch_github_profile(
        &self,
        provider: &OAuthProviderConfig,
        access_token: &str,
    ) -> Result<FederatedProfile, ApiError> {
        let profile: GithubProfile = self
            .http
            .get(&provider.profile_url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()
            .map_err(|_| ApiError::unauthorized("oauth_profile_failed"))?
            .json()
            .await
            .map_err(|_| ApiError::unauthorized("oauth_profile_failed"))?;

        // The profile may hide the email; fall back to the emails endpoint
        // and take the primary verified address, else the first verified.
        let email = match profile.email {
            Some(email) => Some(email),
            None => self.fetch_github_email(provider, access_token).await?,
        };

        Ok(FederatedProfile {
            provider: provider.name.clone(),
            provider_user_id: profile.id.to_string(),
            email,
            name: profile.name.or(Some(profile.login)),
            avatar_url: profile.avatar_url,
        })
    }

    async fn fetch_github_email(
        &self,
        provider: &OAuthProviderConfig,
        access_token: &str,
    ) -> Result<Option<String>, ApiError> {
        let emails_url = format!("{}/emails", provider.profile_url.trim_end_matches('/'));
        let emails: Vec<GithubEmail> = self
            .http
            .get(&emails_url)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()
            .map_err(|_| ApiError::unauthorized("oauth_profile_failed"))?
            .json()
            .await
            .map_err(|_| ApiError::unauthorized("oauth_profile_failed"))?;

        let picked = emails
            .iter()
            .find(|e| e.primary && e.verified)
            .or_else(|| emails.iter().find(|e| e.verified))
            .map(|e| e.email.clone());

        Ok(picked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_provider(server: &MockServer) -> OAuthProviderConfig {
        OAuthProviderConfig {
            name: "github".to_string(),
            client_id: "cid".to_string(),
            client_secret: "csecret".to_string(),
            auth_url: "https://github.com/login/oauth/authorize".to_string(),
            token_url: format!("{}/login/oauth/access_token", server.uri()),
            profile_url: format!("{}/user", server.uri()),
            scopes: "read:user user:email".to_string(),
        }
    }

    #[test]
    fn test_authorize_url_carries_state() {
        let client = OAuthClient::new().unwrap();
        let provider = OAuthProviderConfig::google("cid".to_string(), "cs".to_string());

        let url = client
            .authorize_url(&provider, "state123", "https://api.example.com/cb")
            .unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("state=state123"));
        assert!(url.contains("client_id=cid"));
        assert!(url.contains("response_type=code"));
    }

    #[tokio::test]
    async fn test_exchange_code() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .and(body_string_contains("grant_type=authorization_code"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"access_token": "gho_abc"})),
            )
            .mount(&server)
            .await;

        let client = OAuthClient::new().unwrap();
        let token = client
            .exchange_code(&test_provider(&server), "code1", "https://api.example.com/cb")
            .await
            .unwrap();
        assert_eq!(token, "gho_abc");
    }

    #[tokio::test]
    async fn test_github_email_fallback_prefers_primary_verified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/user"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 42,
                "login": "ada",
                "name": "Ada",
                "email": null,
                "avatar_url": "https://avatars.example.com/ada"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/user/emails"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"email": "old@x.io", "primary": false, "verified": true},
                {"email": "ada@x.io", "primary": true, "verified": true},
                {"email": "spam@x.io", "primary": false, "verified": false}
            ])))
            .mount(&server)
            .await;

        let client = OAuthClient::new().unwrap();
        let profile = client
            .fetch_profile(&test_provider(&server), "gho_abc")
            .await
            .unwrap();

        assert_eq!(profile.provider_user_id, "42");
        assert_eq!(profile.email.as_deref(), Some("ada@x.io"));
        assert_eq!(profile.name.as_deref(), Some("Ada"));
    }

    #[tokio::test]
    async fn test_failed_exchange_is_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/login/oauth/access_token"))
            .respond_with(ResponseTemplate::new(400))
            .mount(&server)
            .await;

        let client = OAuthClient::new().unwrap();
        let err = client
            .exchange_code(&test_provider(&server), "bad", "https://api.example.com/cb")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
    }
}
