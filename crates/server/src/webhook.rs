use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::post,
    Router,
};
use detailbook_line::{IngestError, WebhookIngestor, SIGNATURE_HEADER};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Clone)]
struct WebhookState {
    ingestor: Arc<WebhookIngestor>,
}

#[derive(Debug, Serialize)]
pub struct WebhookAccepted {
    pub received: usize,
    pub replied: usize,
}

#[derive(Debug, Serialize)]
pub struct WebhookError {
    pub error: String,
    pub correlation_id: String,
}

pub fn router(ingestor: Arc<WebhookIngestor>) -> Router {
    Router::new().route("/webhook", post(receive)).with_state(WebhookState { ingestor })
}

async fn receive(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<WebhookAccepted>, (StatusCode, Json<WebhookError>)> {
    let correlation_id = format!("req-{}", Uuid::new_v4().simple());
    let signature = headers.get(SIGNATURE_HEADER).and_then(|value| value.to_str().ok());

    match state.ingestor.ingest(&body, signature, &correlation_id).await {
        Ok(report) => {
            info!(
                event_name = "ingress.line.webhook_processed",
                correlation_id = %correlation_id,
                received = report.received,
                replied = report.replied,
                ignored = report.ignored,
                failed = report.failed,
                "webhook processed"
            );
            Ok(Json(WebhookAccepted { received: report.received, replied: report.replied }))
        }
        Err(error) => {
            let status = match error {
                IngestError::Signature(_) => StatusCode::UNAUTHORIZED,
                IngestError::Payload(_) => StatusCode::BAD_REQUEST,
            };
            warn!(
                event_name = "ingress.line.webhook_rejected",
                correlation_id = %correlation_id,
                status = status.as_u16(),
                error = %error,
                "webhook rejected"
            );
            Err((status, Json(WebhookError { error: error.to_string(), correlation_id })))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use detailbook_core::config::AppConfig;
    use detailbook_line::{InMemoryReplyTransport, SignatureVerifier, SIGNATURE_HEADER};
    use tower::ServiceExt;

    use crate::bootstrap::bootstrap_with_transport;

    const SECRET: &str = "test-channel-secret";

    fn app() -> (Router, InMemoryReplyTransport) {
        let mut config = AppConfig::default();
        config.line.channel_secret = SECRET.to_owned().into();
        let transport = InMemoryReplyTransport::default();
        let app = bootstrap_with_transport(config, Arc::new(transport.clone())).expect("bootstrap");
        (super::router(app.ingestor), transport)
    }

    fn request(body: &str, signature: Option<String>) -> Request<Body> {
        let mut builder = Request::post("/webhook").header("content-type", "application/json");
        if let Some(signature) = signature {
            builder = builder.header(SIGNATURE_HEADER, signature);
        }
        builder.body(Body::from(body.to_owned())).expect("request")
    }

    fn sign(body: &str) -> String {
        SignatureVerifier::new(SECRET.to_owned().into()).sign(body.as_bytes()).expect("signed")
    }

    #[tokio::test]
    async fn signed_follow_event_is_answered_with_menu() {
        let (router, transport) = app();
        let body = r#"{"destination":"Ubot","events":[{"type":"follow","replyToken":"r-1","source":{"type":"user","userId":"U1"}}]}"#;

        let response = router.oneshot(request(body, Some(sign(body)))).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: serde_json::Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload["received"], 1);
        assert_eq!(payload["replied"], 1);

        let sent = transport.sent();
        assert_eq!(sent[0].reply_token, "r-1");
        assert!(sent[0].messages[0].preview().starts_with("歡迎"));
    }

    #[tokio::test]
    async fn missing_or_wrong_signature_is_unauthorized() {
        let (router, transport) = app();
        let body = r#"{"destination":"Ubot","events":[]}"#;

        let response = router.clone().oneshot(request(body, None)).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response =
            router.oneshot(request(body, Some(sign("other body")))).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert!(transport.sent().is_empty());
    }

    #[tokio::test]
    async fn unparsable_body_is_bad_request() {
        let (router, _) = app();
        let body = "not json";

        let response = router.oneshot(request(body, Some(sign(body)))).await.expect("response");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
