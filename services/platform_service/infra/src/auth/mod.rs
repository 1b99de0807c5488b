mod email_verification_repository;
mod email_verification_service;
mod external_provider;
mod idp_client;
mod local_provider;
mod oauth_account_repository;
mod oauth_client;
mod oauth_service;
mod password_reset_repository;
mod password_reset_service;
mod refresh_token_repository;
mod repository;
mod smtp_sender;
mod token_service;
mod webhook;

pub use email_verification_repository::PgEmailVerificationRepository;
pub use email_verification_service::EmailVerificationServiceImpl;
pub use external_provider::ExternalIdpProvider;
pub use idp_client::{IdpClient, IdpConfig, IdpTokenBundle, IdpUser};
pub use local_provider::LocalAuthProvider;
pub use oauth_account_repository::PgOAuthAccountRepository;
pub use oauth_client::{OAuthClient, OAuthProviderConfig, OAuthRegistry};
pub use oauth_service::FederationServiceImpl;
pub use password_reset_repository::PgPasswordResetRepository;
pub use password_reset_service::PasswordResetServiceImpl;
pub use refresh_token_repository::PgRefreshTokenRepository;
pub use repository::{PgRoleRepository, PgUserRepository};
pub use smtp_sender::{EmailMessage, EmailSender, SmtpConfig, SmtpEmailSender};
pub use token_service::TokenService;
pub use webhook::{verify_callback_token, verify_hmac_signature, IdpSyncService, IdpUserEvent};
