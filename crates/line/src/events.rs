use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use detailbook_core::domain::identity::Identity;
use detailbook_core::errors::ApplicationError;
use detailbook_core::flows::{Effect, InboundEvent};
use detailbook_core::service::DialogService;
use thiserror::Error;
use tracing::warn;

use crate::messages::{self, OutboundMessage};
use crate::webhook::{LineEnvelope, LineEvent, LineEventType};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HandlerResult {
    Responded(Vec<OutboundMessage>),
    Processed,
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error("{event_type} event carries no user id")]
    MissingUserId { event_type: &'static str },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

/// The conversation behind the webhook. Implemented by [`DialogService`].
#[async_trait]
pub trait ConversationService: Send + Sync {
    async fn converse(
        &self,
        event: InboundEvent,
        ctx: &EventContext,
    ) -> Result<Effect, ApplicationError>;
}

#[async_trait]
impl ConversationService for DialogService {
    async fn converse(
        &self,
        event: InboundEvent,
        ctx: &EventContext,
    ) -> Result<Effect, ApplicationError> {
        self.handle(event, &ctx.correlation_id)
    }
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> LineEventType;
    async fn handle(
        &self,
        envelope: &LineEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<LineEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &LineEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn default_dispatcher(service: Arc<dyn ConversationService>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(ConversationHandler::new(LineEventType::Message, Arc::clone(&service)));
    dispatcher.register(ConversationHandler::new(LineEventType::Postback, Arc::clone(&service)));
    dispatcher.register(ConversationHandler::new(LineEventType::Follow, service));
    dispatcher
}

/// Forwards one event type into the conversation and renders the effect.
pub struct ConversationHandler {
    event_type: LineEventType,
    service: Arc<dyn ConversationService>,
}

impl ConversationHandler {
    pub fn new(event_type: LineEventType, service: Arc<dyn ConversationService>) -> Self {
        Self { event_type, service }
    }
}

#[async_trait]
impl EventHandler for ConversationHandler {
    fn event_type(&self) -> LineEventType {
        self.event_type
    }

    async fn handle(
        &self,
        envelope: &LineEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let event_type = envelope.event.event_type();
        if event_type != self.event_type {
            return Ok(HandlerResult::Ignored);
        }

        let identity = envelope
            .source
            .identity()
            .ok_or(EventHandlerError::MissingUserId { event_type: event_type.as_str() })?;
        let Some(inbound) = inbound_event(identity, &envelope.event) else {
            return Ok(HandlerResult::Ignored);
        };

        match self.service.converse(inbound, ctx).await {
            Ok(Effect::Ignored) => Ok(HandlerResult::Processed),
            Ok(effect) => Ok(HandlerResult::Responded(messages::render(&effect))),
            Err(error) => {
                let error = error.into_interface(ctx.correlation_id.as_str());
                warn!(
                    event_name = "ingress.line.conversation_failed",
                    correlation_id = %ctx.correlation_id,
                    error = %error,
                    "conversation turn failed; replying with failure notice"
                );
                Ok(HandlerResult::Responded(messages::render_failure(&error)))
            }
        }
    }
}

fn inbound_event(identity: Identity, event: &LineEvent) -> Option<InboundEvent> {
    Some(match event {
        LineEvent::Text(text) => InboundEvent::text(identity, text.as_str()),
        LineEvent::Location(location) => InboundEvent::location(identity, location.clone()),
        LineEvent::Postback(data) => InboundEvent::postback(identity, data.as_str()),
        LineEvent::Follow => InboundEvent::follow(identity),
        LineEvent::Unsupported { .. } => return None,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use detailbook_core::errors::{ApplicationError, DomainError};
    use detailbook_core::flows::{prompts, Effect, EventKind, InboundEvent};

    use super::{
        default_dispatcher, ConversationService, DispatchError, EventContext, EventDispatcher,
        EventHandlerError, HandlerResult,
    };
    use crate::webhook::{EventSource, LineEnvelope, LineEvent};

    #[derive(Default)]
    struct RecordingService {
        seen: Mutex<Vec<InboundEvent>>,
        fail: bool,
    }

    #[async_trait]
    impl ConversationService for RecordingService {
        async fn converse(
            &self,
            event: InboundEvent,
            _ctx: &EventContext,
        ) -> Result<Effect, ApplicationError> {
            let kind = event.kind.clone();
            self.seen.lock().expect("lock").push(event);
            if self.fail {
                return Err(ApplicationError::Domain(DomainError::InvariantViolation(
                    "broken session".to_owned(),
                )));
            }
            Ok(match kind {
                EventKind::Postback(_) => Effect::Ignored,
                _ => Effect::Handoff { notice: prompts::HANDOFF.to_owned() },
            })
        }
    }

    fn envelope(event: LineEvent, user_id: Option<&str>) -> LineEnvelope {
        LineEnvelope {
            webhook_event_id: Some("ev-1".to_owned()),
            reply_token: Some("reply-1".to_owned()),
            source: EventSource {
                source_type: "user".to_owned(),
                user_id: user_id.map(str::to_owned),
            },
            event,
        }
    }

    #[tokio::test]
    async fn dispatcher_routes_text_into_conversation() {
        let service = Arc::new(RecordingService::default());
        let dispatcher = default_dispatcher(service.clone());

        let result = dispatcher
            .dispatch(&envelope(LineEvent::Text("真人客服".to_owned()), Some("U1")), &EventContext::default())
            .await
            .expect("dispatch");

        let HandlerResult::Responded(messages) = result else {
            panic!("reply expected");
        };
        assert_eq!(messages[0].preview(), prompts::HANDOFF);
        assert_eq!(service.seen.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn ignored_effect_is_processed_without_reply() {
        let dispatcher = default_dispatcher(Arc::new(RecordingService::default()));
        let result = dispatcher
            .dispatch(&envelope(LineEvent::Postback("UNKNOWN".to_owned()), Some("U1")), &EventContext::default())
            .await
            .expect("dispatch");
        assert_eq!(result, HandlerResult::Processed);
    }

    #[tokio::test]
    async fn unsupported_events_are_ignored() {
        let service = Arc::new(RecordingService::default());
        let dispatcher = default_dispatcher(service.clone());
        let result = dispatcher
            .dispatch(
                &envelope(LineEvent::Unsupported { event_type: "unfollow".to_owned() }, Some("U1")),
                &EventContext::default(),
            )
            .await
            .expect("dispatch");
        assert_eq!(result, HandlerResult::Ignored);
        assert!(service.seen.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn missing_user_id_is_a_handler_error() {
        let dispatcher = default_dispatcher(Arc::new(RecordingService::default()));
        let result =
            dispatcher.dispatch(&envelope(LineEvent::Follow, None), &EventContext::default()).await;
        assert_eq!(
            result,
            Err(DispatchError::Handler(EventHandlerError::MissingUserId { event_type: "follow" }))
        );
    }

    #[tokio::test]
    async fn failed_turn_replies_with_failure_notice() {
        let service = Arc::new(RecordingService { fail: true, ..RecordingService::default() });
        let dispatcher = default_dispatcher(service);
        let ctx = EventContext { correlation_id: "req-9".to_owned() };

        let result = dispatcher
            .dispatch(&envelope(LineEvent::Text("小型車".to_owned()), Some("U1")), &ctx)
            .await
            .expect("dispatch");
        let HandlerResult::Responded(messages) = result else {
            panic!("failure reply expected");
        };
        assert_eq!(messages[0].preview(), prompts::FAILURE);
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn default_dispatcher_registers_handlers() {
        let dispatcher = default_dispatcher(Arc::new(RecordingService::default()));
        assert_eq!(dispatcher.handler_count(), 3);
        assert_eq!(EventDispatcher::new().handler_count(), 0);
    }
}
