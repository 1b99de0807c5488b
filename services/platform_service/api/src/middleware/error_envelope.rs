use axum::extract::Request;
use axum::http::header;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use shared_error::ApiError;

use super::request_id::RequestId;

/// Format recorded errors into the response envelope
///
/// Handlers and inner middleware record an error by returning `ApiError`;
/// its `IntoResponse` stores the error in the response extensions. This
/// outer formatter rebuilds the body with the request path, request id and
/// timestamp, so aborts from any depth of the pipeline still produce the
/// structured shape. The first recorded error is the one formatted.
pub async fn error_envelope(req: Request, next: Next) -> Response {
    let path = req.uri().path().to_string();
    let request_id = req
        .extensions()
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default();

    let response = next.run(req).await;

    let Some(error) = response.extensions().get::<ApiError>().cloned() else {
        return response;
    };

    let status = response.status();
    let body = error.to_body(&path, &request_id).into_envelope();
    let mut formatted = (status, Json(body)).into_response();

    // Carry over everything except the entity headers of the old body
    for (name, value) in response.headers() {
        if name == header::CONTENT_LENGTH || name == header::CONTENT_TYPE {
            continue;
        }
        formatted.headers_mut().append(name.clone(), value.clone());
    }

    formatted
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::middleware;
    use axum::routing::get;
    use axum::Router;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn failing() -> Result<(), ApiError> {
        Err(ApiError::forbidden("csrf_mismatch"))
    }

    fn app() -> Router {
        Router::new()
            .route("/guarded", get(failing))
            .layer(middleware::from_fn(error_envelope))
            .layer(middleware::from_fn(super::super::request_id::request_id))
    }

    #[tokio::test]
    async fn test_envelope_carries_path_and_request_id() {
        let response = app()
            .oneshot(
                axum::http::Request::builder()
                    .uri("/guarded")
                    .header("x-request-id", "req-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(body["success"], serde_json::json!(false));
        assert_eq!(body["error"]["code"], serde_json::json!("FORBIDDEN"));
        assert_eq!(body["error"]["message"], serde_json::json!("csrf_mismatch"));
        assert_eq!(body["error"]["path"], serde_json::json!("/guarded"));
        assert_eq!(body["error"]["request_id"], serde_json::json!("req-42"));
        assert!(body["error"]["timestamp"].is_string());
    }
}
