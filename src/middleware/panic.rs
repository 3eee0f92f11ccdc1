use std::any::Any;

use axum::response::{IntoResponse, Response};
use tower_http::catch_panic::CatchPanicLayer;

use crate::{error::AppError, logging::panic_message, response::JsonApiResponse};

type PanicHandler = fn(Box<dyn Any + Send + 'static>) -> Response;

/// Turns a handler panic into a 500 in the usual envelope.
pub fn catch_panic_layer() -> CatchPanicLayer<PanicHandler> {
    CatchPanicLayer::custom(panic_response as PanicHandler)
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let details = panic_message(panic.as_ref());
    // Debug builds echo the panic text back to the client.
    let err = if cfg!(debug_assertions) {
        AppError::internal(format!("internal server error: {details}"))
    } else {
        AppError::internal("internal server error")
    };
    JsonApiResponse::from_error(&err).into_response()
}

#[cfg(test)]
mod tests {
    use axum::{Router, body, http::Request, http::StatusCode, routing::get};
    use tower::ServiceExt;

    use super::catch_panic_layer;

    async fn boom() -> &'static str {
        panic!("kettle exploded")
    }

    #[tokio::test]
    async fn panics_become_json_500s() {
        let app = Router::new()
            .route("/boom", get(boom))
            .layer(catch_panic_layer());

        let res = app
            .oneshot(
                Request::builder()
                    .uri("/boom")
                    .body(axum::body::Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let bytes = body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], 500);
        assert!(json["message"].as_str().unwrap().starts_with("internal server error"));
    }
}
