use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

/// Profile update (partial)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileReq {
    #[validate(length(min = 1, max = 120, message = "name must not be empty"))]
    pub name: Option<String>,

    #[validate(url(message = "must be a valid URL"))]
    pub avatar_url: Option<String>,
}
