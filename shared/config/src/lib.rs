use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Database connection URL
    #[serde(default)]
    pub database_url: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Deployment environment: "development" | "production"
    #[serde(default = "default_environment")]
    pub environment: String,

    /// JWT secret key for signing tokens (required in production)
    #[serde(default)]
    pub jwt_secret: String,

    /// Access token lifetime (duration string, default 15m)
    #[serde(default = "default_access_ttl")]
    pub jwt_access_token_ttl: String,

    /// Refresh token lifetime (duration string, default 168h = 7 days)
    #[serde(default = "default_refresh_ttl")]
    pub jwt_refresh_token_ttl: String,

    /// Comma-separated origin allow-list, or "*"
    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: String,

    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// Rate limiting on auth endpoints
    #[serde(default = "default_true")]
    pub ratelimit_enabled: bool,

    /// Requests allowed per window per client IP
    #[serde(default = "default_ratelimit_requests")]
    pub ratelimit_requests: u32,

    /// Sliding window size (duration string, default 15m)
    #[serde(default = "default_ratelimit_window")]
    pub ratelimit_window: String,

    /// Auth provider selection: "local" | "external"
    #[serde(default = "default_auth_provider")]
    pub auth_provider: String,

    /// External identity provider (required when auth_provider = "external")
    pub external_idp_url: Option<String>,
    pub external_idp_key: Option<String>,
    pub external_idp_jwt_secret: Option<String>,
    pub external_idp_webhook_secret: Option<String>,

    /// OAuth federation providers
    pub oauth_google_client_id: Option<String>,
    pub oauth_google_client_secret: Option<String>,
    #[serde(default)]
    pub oauth_google_enabled: bool,
    pub oauth_github_client_id: Option<String>,
    pub oauth_github_client_secret: Option<String>,
    #[serde(default)]
    pub oauth_github_enabled: bool,

    /// SPA base URL for OAuth redirects
    #[serde(default = "default_frontend_url")]
    pub oauth_frontend_url: String,

    /// SMTP transport for verification / reset emails
    #[serde(default)]
    pub smtp_host: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<String>,
    pub smtp_password: Option<String>,
    #[serde(default = "default_from_email")]
    pub smtp_from_email: String,
    #[serde(default = "default_from_name")]
    pub smtp_from_name: String,

    /// Email verification token lifetime (default 24h)
    #[serde(default = "default_verification_ttl")]
    pub email_verification_ttl: String,

    /// Password reset token lifetime (default 15m)
    #[serde(default = "default_reset_ttl")]
    pub password_reset_ttl: String,

    /// Billing webhook shared callback token
    pub xendit_callback_token: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_environment() -> String {
    "development".to_string()
}

fn default_access_ttl() -> String {
    "15m".to_string()
}

fn default_refresh_ttl() -> String {
    "168h".to_string()
}

fn default_cors_origins() -> String {
    "*".to_string()
}

fn default_true() -> bool {
    true
}

fn default_ratelimit_requests() -> u32 {
    5
}

fn default_ratelimit_window() -> String {
    "15m".to_string()
}

fn default_auth_provider() -> String {
    "local".to_string()
}

fn default_frontend_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_smtp_port() -> u16 {
    587
}

fn default_from_email() -> String {
    "no-reply@localhost".to_string()
}

fn default_from_name() -> String {
    "Platform".to_string()
}

fn default_verification_ttl() -> String {
    "24h".to_string()
}

fn default_reset_ttl() -> String {
    "15m".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let builder = config::Config::builder().add_source(config::Environment::default());
        let config: Config = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that must not reach production
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.is_production() && self.jwt_secret.is_empty() {
            return Err(config::ConfigError::Message(
                "JWT_SECRET is required in production".to_string(),
            ));
        }
        if self.auth_provider == "external"
            && (self.external_idp_url.is_none() || self.external_idp_jwt_secret.is_none())
        {
            return Err(config::ConfigError::Message(
                "EXTERNAL_IDP_URL and EXTERNAL_IDP_JWT_SECRET are required when AUTH_PROVIDER=external"
                    .to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn access_token_ttl(&self) -> Duration {
        parse_duration(&self.jwt_access_token_ttl).unwrap_or(Duration::from_secs(900))
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        parse_duration(&self.jwt_refresh_token_ttl).unwrap_or(Duration::from_secs(7 * 24 * 3600))
    }

    pub fn ratelimit_window(&self) -> Duration {
        parse_duration(&self.ratelimit_window).unwrap_or(Duration::from_secs(900))
    }

    pub fn email_verification_ttl(&self) -> Duration {
        parse_duration(&self.email_verification_ttl).unwrap_or(Duration::from_secs(24 * 3600))
    }

    pub fn password_reset_ttl(&self) -> Duration {
        parse_duration(&self.password_reset_ttl).unwrap_or(Duration::from_secs(15 * 60))
    }

    /// Origin allow-list as a vector; `["*"]` means any origin
    pub fn allowed_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn smtp_configured(&self) -> bool {
        !self.smtp_host.is_empty()
    }
}

/// Parse a duration string: bare seconds, or a `s`/`m`/`h`/`d` suffix
/// (`900`, `900s`, `15m`, `168h`, `7d`)
pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("empty duration".to_string());
    }

    let (number, multiplier) = match input.as_bytes()[input.len() - 1] {
        b's' => (&input[..input.len() - 1], 1),
        b'm' => (&input[..input.len() - 1], 60),
        b'h' => (&input[..input.len() - 1], 3600),
        b'd' => (&input[..input.len() - 1], 86_400),
        _ => (input, 1),
    };

    number
        .parse::<u64>()
        .map(|n| Duration::from_secs(n * multiplier))
        .map_err(|_| format!("invalid duration: {}", input))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration("900").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("900s").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("15m").unwrap(), Duration::from_secs(900));
        assert_eq!(parse_duration("168h").unwrap(), Duration::from_secs(604_800));
        assert_eq!(parse_duration("7d").unwrap(), Duration::from_secs(604_800));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(parse_duration("").is_err());
        assert!(parse_duration("15 minutes").is_err());
        assert!(parse_duration("m").is_err());
    }

    fn base_config() -> Config {
        Config {
            database_url: "postgres://localhost/platform".to_string(),
            host: default_host(),
            port: default_port(),
            environment: default_environment(),
            jwt_secret: "secret".to_string(),
            jwt_access_token_ttl: default_access_ttl(),
            jwt_refresh_token_ttl: default_refresh_ttl(),
            cors_allowed_origins: default_cors_origins(),
            cors_allow_credentials: false,
            ratelimit_enabled: true,
            ratelimit_requests: 5,
            ratelimit_window: default_ratelimit_window(),
            auth_provider: default_auth_provider(),
            external_idp_url: None,
            external_idp_key: None,
            external_idp_jwt_secret: None,
            external_idp_webhook_secret: None,
            oauth_google_client_id: None,
            oauth_google_client_secret: None,
            oauth_google_enabled: false,
            oauth_github_client_id: None,
            oauth_github_client_secret: None,
            oauth_github_enabled: false,
            oauth_frontend_url: default_frontend_url(),
            smtp_host: String::new(),
            smtp_port: default_smtp_port(),
            smtp_username: None,
            smtp_password: None,
            smtp_from_email: default_from_email(),
            smtp_from_name: default_from_name(),
            email_verification_ttl: default_verification_ttl(),
            password_reset_ttl: default_reset_ttl(),
            xendit_callback_token: None,
        }
    }

    #[test]
    fn test_defaults() {
        let config = base_config();
        assert_eq!(config.access_token_ttl(), Duration::from_secs(900));
        assert_eq!(config.refresh_token_ttl(), Duration::from_secs(604_800));
        assert_eq!(config.ratelimit_window(), Duration::from_secs(900));
        assert!(!config.is_production());
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        let mut config = base_config();
        config.environment = "production".to_string();
        config.jwt_secret = String::new();
        assert!(config.validate().is_err());

        config.jwt_secret = "s3cret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_external_provider_requires_idp_settings() {
        let mut config = base_config();
        config.auth_provider = "external".to_string();
        assert!(config.validate().is_err());

        config.external_idp_url = Some("https://idp.example.com".to_string());
        config.external_idp_jwt_secret = Some("shared".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_allowed_origins_list() {
        let mut config = base_config();
        config.cors_allowed_origins = "https://app.example.com, https://admin.example.com".to_string();
        assert_eq!(
            config.allowed_origins(),
            vec![
                "https://app.example.com".to_string(),
                "https://admin.example.com".to_string()
            ]
        );

        config.cors_allowed_origins = "*".to_string();
        assert_eq!(config.allowed_origins(), vec!["*".to_string()]);
    }
}
