use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use crate::events::{EventContext, EventDispatcher, HandlerResult};
use crate::reply::ReplyTransport;
use crate::signature::{SignatureError, SignatureVerifier};
use crate::webhook::WebhookBody;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Signature(#[from] SignatureError),
    #[error("webhook body is not valid JSON: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Counts for one webhook call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub received: usize,
    pub replied: usize,
    pub ignored: usize,
    pub failed: usize,
}

/// Verifies, parses and dispatches one webhook call, then sends replies.
///
/// Events in a call are handled in order, one at a time. Reply failures are
/// logged and counted but never retried.
pub struct WebhookIngestor {
    verifier: SignatureVerifier,
    dispatcher: EventDispatcher,
    transport: Arc<dyn ReplyTransport>,
}

impl WebhookIngestor {
    pub fn new(
        verifier: SignatureVerifier,
        dispatcher: EventDispatcher,
        transport: Arc<dyn ReplyTransport>,
    ) -> Self {
        Self { verifier, dispatcher, transport }
    }

    pub async fn ingest(
        &self,
        body: &[u8],
        signature: Option<&str>,
        correlation_id: &str,
    ) -> Result<IngestReport, IngestError> {
        self.verifier.verify(body, signature)?;
        let envelopes = WebhookBody::parse(body)?.into_envelopes();

        let mut report = IngestReport { received: envelopes.len(), ..IngestReport::default() };
        for (index, envelope) in envelopes.iter().enumerate() {
            let ctx = EventContext {
                correlation_id: envelope
                    .webhook_event_id
                    .clone()
                    .unwrap_or_else(|| format!("{correlation_id}-{index}")),
            };
            info!(
                event_name = "ingress.line.event_received",
                correlation_id = %ctx.correlation_id,
                event_type = envelope.event.event_type().as_str(),
                "line event received"
            );

            let messages = match self.dispatcher.dispatch(envelope, &ctx).await {
                Ok(HandlerResult::Responded(messages)) if !messages.is_empty() => messages,
                Ok(_) => {
                    report.ignored += 1;
                    continue;
                }
                Err(error) => {
                    warn!(
                        event_name = "ingress.line.dispatch_failed",
                        correlation_id = %ctx.correlation_id,
                        error = %error,
                        "line event could not be handled"
                    );
                    report.failed += 1;
                    continue;
                }
            };

            let Some(reply_token) = envelope.reply_token.as_deref() else {
                report.ignored += 1;
                continue;
            };
            match self.transport.reply(reply_token, &messages).await {
                Ok(()) => report.replied += 1,
                Err(error) => {
                    warn!(
                        event_name = "ingress.line.reply_failed",
                        correlation_id = %ctx.correlation_id,
                        error = %error,
                        "reply delivery failed"
                    );
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use detailbook_core::audit::InMemoryAuditSink;
    use detailbook_core::catalog::ServiceCatalog;
    use detailbook_core::flows::DialogEngine;
    use detailbook_core::service::DialogService;
    use detailbook_core::stores::StoreSet;

    use super::{IngestError, IngestReport, WebhookIngestor};
    use crate::events::default_dispatcher;
    use crate::reply::InMemoryReplyTransport;
    use crate::signature::{SignatureError, SignatureVerifier};

    fn ingestor() -> (WebhookIngestor, InMemoryReplyTransport) {
        let service = DialogService::new(
            DialogEngine::new(Arc::new(ServiceCatalog::standard())),
            StoreSet::in_memory(),
            Arc::new(InMemoryAuditSink::default()),
        );
        let transport = InMemoryReplyTransport::default();
        let ingestor = WebhookIngestor::new(
            SignatureVerifier::new("secret".to_owned().into()),
            default_dispatcher(Arc::new(service)),
            Arc::new(transport.clone()),
        );
        (ingestor, transport)
    }

    fn sign(body: &str) -> String {
        SignatureVerifier::new("secret".to_owned().into()).sign(body.as_bytes()).expect("signed")
    }

    #[tokio::test]
    async fn signed_text_event_gets_reply() {
        let (ingestor, transport) = ingestor();
        let body = r#"{"destination":"Ubot","events":[
            {"type":"message","replyToken":"r-1","source":{"type":"user","userId":"U1"},
             "message":{"type":"text","id":"1","text":"我要預約"}},
            {"type":"unfollow","source":{"type":"user","userId":"U2"}}
        ]}"#;

        let report =
            ingestor.ingest(body.as_bytes(), Some(&sign(body)), "req-1").await.expect("ingested");
        assert_eq!(report, IngestReport { received: 2, replied: 1, ignored: 1, failed: 0 });

        let sent = transport.sent();
        assert_eq!(sent[0].reply_token, "r-1");
        assert_eq!(sent[0].messages[0].preview(), "請選擇服務分類：");
    }

    #[tokio::test]
    async fn bad_signature_and_bad_json_are_rejected() {
        let (ingestor, transport) = ingestor();
        let outcome = ingestor.ingest(b"{}", Some("AAAA"), "req-2").await;
        assert!(matches!(outcome, Err(IngestError::Signature(SignatureError::Mismatch))));

        let outcome = ingestor.ingest(b"nope", Some(&sign("nope")), "req-3").await;
        assert!(matches!(outcome, Err(IngestError::Payload(_))));
        assert!(transport.sent().is_empty());
    }
}
