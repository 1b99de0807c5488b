use axum::extract::{Path, Query, State};
use axum::http::{header::SET_COOKIE, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use platform_service_core::domains::auth::dto::oauth_dto::{OAuthAccountResp, OAuthCallbackQuery};
use platform_service_core::domains::auth::utils::token_utils::generate_state_token;
use shared_auth::AuthUser;
use shared_error::{ApiError, ApiResponse};

use crate::cookie_helper::{build_cookie, get_cookie_value, CookieSpec, OAUTH_STATE_COOKIE};
use crate::state::AppState;

const STATE_COOKIE_TTL: i64 = 300;

/// Start the authorization-code round with a provider
///
/// The random state value travels twice: in the consent URL and in a
/// short-lived HttpOnly cookie. The callback requires both to match.
#[utoipa::path(
    get,
    path = "/api/v1/auth/oauth/{provider}",
    tag = "oauth",
    params(("provider" = String, Path, description = "Provider name (google, github)")),
    responses(
        (status = 307, description = "Redirect to the provider consent page"),
        (status = 404, description = "Unknown or disabled provider"),
    )
)]
pub async fn oauth_authorize(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let provider_config = state
        .oauth_registry
        .get(&provider)
        .ok_or_else(|| ApiError::not_found("unknown or disabled provider"))?;

    let state_token = generate_state_token();
    let redirect_uri = callback_url(&headers, &provider);
    let consent_url = state
        .oauth_client
        .authorize_url(provider_config, &state_token, &redirect_uri)?;

    let mut response = Redirect::temporary(&consent_url).into_response();
    let cookie = build_cookie(&CookieSpec {
        name: OAUTH_STATE_COOKIE,
        value: &state_token,
        max_age: STATE_COOKIE_TTL,
        http_only: true,
        secure: request_is_tls(&headers) || state.secure_cookies(),
        same_site: "Lax",
    })
    .map_err(ApiError::internal)?;
    response.headers_mut().append(SET_COOKIE, cookie);

    Ok(response)
}

/// Finish the authorization-code round
///
/// On success the SPA callback receives the pair in the URL fragment, which
/// never reaches referer headers or server logs. Every failure redirects to
/// the SPA error route instead of rendering an API error.
#[utoipa::path(
    get,
    path = "/api/v1/auth/oauth/{provider}/callback",
    tag = "oauth",
    params(("provider" = String, Path, description = "Provider name (google, github)")),
    responses((status = 307, description = "Redirect to the SPA callback or error route"))
)]
pub async fn oauth_callback(
    State(state): State<AppState>,
    Path(provider): Path<String>,
    Query(query): Query<OAuthCallbackQuery>,
    headers: HeaderMap,
) -> Response {
    let frontend = state.config.oauth_frontend_url.trim_end_matches('/');
    let secure = request_is_tls(&headers) || state.secure_cookies();

    let fail = |reason: &str| {
        let mut response =
            Redirect::temporary(&format!("{}/auth/error?error={}", frontend, reason))
                .into_response();
        clear_state_cookie(&mut response, secure);
        response
    };

    // State must round-trip exactly
    let cookie_state = get_cookie_value(&headers, OAUTH_STATE_COOKIE);
    let state_ok = matches!(
        (&cookie_state, &query.state),
        (Some(cookie), Some(query_state)) if !cookie.is_empty() && cookie == query_state
    );
    if !state_ok {
        return fail("invalid_state");
    }

    if let Some(error) = &query.error {
        tracing::debug!(provider = %provider, error = %error, "provider returned an error");
        return fail(error);
    }

    let Some(code) = &query.code else {
        return fail("missing_code");
    };

    let Some(provider_config) = state.oauth_registry.get(&provider) else {
        return fail("unknown_provider");
    };

    let redirect_uri = callback_url(&headers, &provider);
    let auth_resp = async {
        let access_token = state
            .oauth_client
            .exchange_code(provider_config, code, &redirect_uri)
            .await?;
        let profile = state
            .oauth_client
            .fetch_profile(provider_config, &access_token)
            .await?;
        state.federation.federated_sign_in(profile).await
    }
    .await;

    match auth_resp {
        Ok(resp) => {
            // Tokens in the fragment only
            let target = format!(
                "{}/auth/callback#access_token={}&refresh_token={}&expires_in={}",
                frontend, resp.access_token, resp.refresh_token, resp.expires_in
            );
            let mut response = Redirect::temporary(&target).into_response();
            clear_state_cookie(&mut response, secure);
            response
        }
        Err(e) => {
            tracing::warn!(provider = %provider, error = %e, "federated sign-in failed");
            fail("oauth_failed")
        }
    }
}

/// Linked federated accounts of the caller
#[utoipa::path(
    get,
    path = "/api/v1/users/me/oauth-accounts",
    tag = "oauth",
    security(("bearer_auth" = [])),
    responses((status = 200, description = "Linked accounts", body = [OAuthAccountResp]))
)]
pub async fn list_oauth_accounts(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<ApiResponse<Vec<OAuthAccountResp>>, ApiError> {
    let accounts = state.federation.list_accounts(user.user_id).await?;
    Ok(ApiResponse::success(
        accounts.iter().map(OAuthAccountResp::from).collect(),
    ))
}

/// Unlink a federated account
///
/// Refused when it is the caller's last way to sign in.
#[utoipa::path(
    delete,
    path = "/api/v1/users/me/oauth-accounts/{provider}",
    tag = "oauth",
    security(("bearer_auth" = [])),
    params(("provider" = String, Path, description = "Provider name")),
    responses(
        (status = 200, description = "Unlinked"),
        (status = 400, description = "Last auth method"),
        (status = 404, description = "No linked account for this provider"),
    )
)]
pub async fn unlink_oauth_account(
    State(state): State<AppState>,
    user: AuthUser,
    Path(provider): Path<String>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    state.federation.unlink(user.user_id, &provider).await?;
    Ok(ApiResponse::success(serde_json::json!({ "unlinked": provider })))
}

/// External callback URL for a provider, derived from the inbound request
fn callback_url(headers: &HeaderMap, provider: &str) -> String {
    let scheme = if request_is_tls(headers) { "https" } else { "http" };
    let host = headers
        .get(axum::http::header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    format!("{}://{}/api/v1/auth/oauth/{}/callback", scheme, host, provider)
}

fn request_is_tls(headers: &HeaderMap) -> bool {
    headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .map(|v| v.eq_ignore_ascii_case("https"))
        .unwrap_or(false)
}

fn clear_state_cookie(response: &mut Response, secure: bool) {
    if let Ok(cookie) = build_cookie(&CookieSpec {
        name: OAUTH_STATE_COOKIE,
        value: "",
        max_age: 0,
        http_only: true,
        secure,
        same_site: "Lax",
    }) {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
}
