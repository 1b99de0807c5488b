use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use shared_error::ApiError;
use shared_jwt::AccessClaims;
use std::marker::PhantomData;
use uuid::Uuid;

use crate::roles::{OrgRole, OrgRoleMarker};

/// Authenticated principal, attached to the request by the JWT middleware
///
/// The extractor only reads what the middleware stored; it never validates
/// tokens itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub name: String,
    pub roles: Vec<String>,
}

impl AuthUser {
    pub fn from_claims(claims: &AccessClaims) -> Self {
        Self {
            user_id: claims.user_id,
            email: claims.email.clone(),
            name: claims.name.clone(),
            roles: claims.roles.clone(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    pub fn is_super_admin(&self) -> bool {
        self.has_role("super_admin")
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("authentication_required"))
    }
}

/// Tenant scope resolved for the current request
///
/// Attached by the org-resolver middleware after the membership lookup
/// succeeds. Its absence on an org-scoped route is a forbidden request,
/// never a not-found: tenant existence is not revealed.
#[derive(Debug, Clone)]
pub struct OrgContext {
    pub org_id: Uuid,
    pub membership_id: Uuid,
    pub role: OrgRole,
}

impl<S> FromRequestParts<S> for OrgContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<OrgContext>()
            .cloned()
            .ok_or_else(|| ApiError::forbidden("not a member of this organization"))
    }
}

/// Extractor enforcing a minimum org role via the power table
///
/// # Usage
/// ```no_run
/// use shared_auth::{RequireOrgRole, AdminRole};
///
/// async fn handler(ctx: RequireOrgRole<AdminRole>) -> String {
///     format!("org {}", ctx.org.org_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireOrgRole<R: OrgRoleMarker> {
    pub org: OrgContext,
    _marker: PhantomData<R>,
}

impl<S, R> FromRequestParts<S> for RequireOrgRole<R>
where
    S: Send + Sync,
    R: OrgRoleMarker + Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let org = OrgContext::from_request_parts(parts, state).await?;
        let required = R::required();

        if !org.role.has_permission(required) {
            tracing::warn!(
                org_id = %org.org_id,
                have = %org.role,
                need = %required,
                "org role check failed"
            );
            return Err(ApiError::forbidden(format!(
                "requires {} role or higher",
                required
            )));
        }

        Ok(RequireOrgRole {
            org,
            _marker: PhantomData,
        })
    }
}

/// Extractor for endpoints restricted to the `super_admin` system role
#[derive(Debug, Clone)]
pub struct RequireSuperAdmin(pub AuthUser);

impl<S> FromRequestParts<S> for RequireSuperAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_super_admin() {
            return Err(ApiError::forbidden("requires super_admin role"));
        }
        Ok(RequireSuperAdmin(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::{AdminRole, ViewerRole};
    use axum::http::Request;

    fn parts_with(org: Option<OrgContext>, user: Option<AuthUser>) -> Parts {
        let req = Request::builder().uri("/").body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        if let Some(org) = org {
            parts.extensions.insert(org);
        }
        if let Some(user) = user {
            parts.extensions.insert(user);
        }
        parts
    }

    fn developer_ctx() -> OrgContext {
        OrgContext {
            org_id: Uuid::new_v4(),
            membership_id: Uuid::new_v4(),
            role: OrgRole::Developer,
        }
    }

    #[tokio::test]
    async fn test_missing_auth_user_is_unauthorized() {
        let mut parts = parts_with(None, None);
        let err = AuthUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "UNAUTHORIZED");
    }

    #[tokio::test]
    async fn test_missing_org_context_is_forbidden() {
        let mut parts = parts_with(None, None);
        let err = OrgContext::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_role_power_enforced() {
        let mut parts = parts_with(Some(developer_ctx()), None);
        assert!(
            RequireOrgRole::<ViewerRole>::from_request_parts(&mut parts, &())
                .await
                .is_ok()
        );

        let mut parts = parts_with(Some(developer_ctx()), None);
        let err = RequireOrgRole::<AdminRole>::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }

    #[tokio::test]
    async fn test_super_admin_gate() {
        let user = AuthUser {
            user_id: Uuid::new_v4(),
            email: "root@x.io".to_string(),
            name: "Root".to_string(),
            roles: vec!["user".to_string(), "super_admin".to_string()],
        };
        let mut parts = parts_with(None, Some(user));
        assert!(RequireSuperAdmin::from_request_parts(&mut parts, &())
            .await
            .is_ok());

        let user = AuthUser {
            user_id: Uuid::new_v4(),
            email: "a@x.io".to_string(),
            name: "A".to_string(),
            roles: vec!["user".to_string()],
        };
        let mut parts = parts_with(None, Some(user));
        let err = RequireSuperAdmin::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert_eq!(err.code(), "FORBIDDEN");
    }
}
