use std::sync::Arc;

use crate::audit::{AuditCategory, AuditContext, AuditOutcome, AuditSink};
use crate::errors::{ApplicationError, DomainError};
use crate::flows::{prompts, DialogEngine, Effect, EventKind, InboundEvent, StoreWrite};
use crate::stores::StoreSet;

const ACTOR: &str = "dialog-service";

/// Runs one inbound event through the engine against the configured stores.
///
/// The engine decides; this type loads the session, applies the returned
/// writes in order, stores or clears the session and records audit events.
pub struct DialogService {
    engine: DialogEngine,
    stores: StoreSet,
    audit: Arc<dyn AuditSink>,
}

impl DialogService {
    pub fn new(engine: DialogEngine, stores: StoreSet, audit: Arc<dyn AuditSink>) -> Self {
        Self { engine, stores, audit }
    }

    pub fn engine(&self) -> &DialogEngine {
        &self.engine
    }

    pub fn stores(&self) -> &StoreSet {
        &self.stores
    }

    pub fn handle(
        &self,
        event: InboundEvent,
        correlation_id: &str,
    ) -> Result<Effect, ApplicationError> {
        let context = AuditContext::new(Some(event.identity.clone()), correlation_id, ACTOR);
        let identity = event.identity;

        let Some(input) = event.kind.into_input() else {
            self.audit.emit(
                context
                    .event("dialog.follow_received", AuditCategory::Ingress, AuditOutcome::Success)
                    .with_metadata("kind", EventKind::Follow.as_str()),
            );
            return Ok(Effect::Menu(prompts::main_menu(Some(prompts::WELCOME))));
        };

        let session = self.stores.sessions.load(&identity);
        let from = session.as_ref().map_or_else(|| "idle".to_owned(), |session| session.step.label());

        let turn = match self.engine.advance(session, &identity, &input, &self.stores) {
            Ok(turn) => turn,
            Err(error) => {
                self.stores.sessions.clear(&identity);
                let error = DomainError::from(error);
                self.audit.emit(
                    context
                        .event("dialog.turn_failed", AuditCategory::Dialog, AuditOutcome::Failed)
                        .with_metadata("from", from)
                        .with_metadata("error", error.to_string()),
                );
                return Err(ApplicationError::Domain(error));
            }
        };

        for write in &turn.writes {
            self.apply(write, &context);
        }

        let to = match turn.session {
            Some(session) => {
                let label = session.step.label();
                self.stores.sessions.save(&identity, session);
                label
            }
            None => {
                self.stores.sessions.clear(&identity);
                "idle".to_owned()
            }
        };

        let outcome = match &turn.effect {
            Effect::Rejection { .. } => AuditOutcome::Rejected,
            _ => AuditOutcome::Success,
        };
        self.audit.emit(
            context
                .event("dialog.turn_applied", AuditCategory::Dialog, outcome)
                .with_transition(from, to)
                .with_metadata("effect", turn.effect.as_str()),
        );

        Ok(turn.effect)
    }

    fn apply(&self, write: &StoreWrite, context: &AuditContext) {
        match write {
            StoreWrite::SaveBooking(booking) => {
                let receipt = self.stores.bookings.save(booking.clone());
                let mut event = context
                    .event("booking.saved", AuditCategory::Booking, AuditOutcome::Success)
                    .with_subject(&booking.owner)
                    .with_metadata("service", booking.selection().display_name())
                    .with_metadata("replaced", receipt.replaced.is_some().to_string());
                if let Some(previous) = receipt.phone_taken_from {
                    event = event.with_metadata("phone_taken_from", previous.as_str());
                }
                self.audit.emit(event);
            }
            StoreWrite::RefreshMemory { identity, memory } => {
                self.stores.memories.remember(identity, memory.clone());
                let remembered: Vec<&str> = [
                    ("phone", memory.phone.is_some()),
                    ("license_plate", memory.license_plate.is_some()),
                    ("pickup_location", memory.pickup_location.is_some()),
                ]
                .into_iter()
                .filter_map(|(field, present)| present.then_some(field))
                .collect();
                self.audit.emit(
                    context
                        .event("memory.refreshed", AuditCategory::Memory, AuditOutcome::Success)
                        .with_subject(identity)
                        .with_metadata("fields", remembered.join(",")),
                );
            }
            StoreWrite::RescheduleBooking { owner, date, time_slot } => {
                let updated = self.stores.bookings.reschedule(owner, date, *time_slot);
                self.audit.emit(
                    context
                        .event(
                            "booking.rescheduled",
                            AuditCategory::Booking,
                            AuditOutcome::applied(updated.is_some()),
                        )
                        .with_subject(owner)
                        .with_metadata("date", date.as_str())
                        .with_metadata("time_slot", time_slot.label()),
                );
            }
            StoreWrite::CancelBooking { owner } => {
                let removed = self.stores.bookings.cancel(owner);
                self.audit.emit(
                    context
                        .event(
                            "booking.cancelled",
                            AuditCategory::Booking,
                            AuditOutcome::applied(removed.is_some()),
                        )
                        .with_subject(owner),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::DialogService;
    use crate::audit::{AuditCategory, AuditOutcome, InMemoryAuditSink};
    use crate::catalog::{ServiceCatalog, VehicleClass};
    use crate::domain::booking::{Booking, TimeSlot};
    use crate::domain::identity::Identity;
    use crate::errors::{ApplicationError, DomainError};
    use crate::flows::{DialogEngine, Effect, InboundEvent, PriceStep, Session, Step};
    use crate::stores::StoreSet;

    fn service() -> (DialogService, InMemoryAuditSink) {
        let sink = InMemoryAuditSink::default();
        let service = DialogService::new(
            DialogEngine::new(Arc::new(ServiceCatalog::standard())),
            StoreSet::in_memory(),
            Arc::new(sink.clone()),
        );
        (service, sink)
    }

    #[test]
    fn follow_shows_welcome_menu_without_session() {
        let (service, sink) = service();
        let identity = Identity::new("U1");

        let effect = service.handle(InboundEvent::follow(identity.clone()), "req-1").expect("handled");
        let Effect::Menu(menu) = effect else {
            panic!("menu expected");
        };
        assert!(menu.notice.is_some());
        assert!(service.stores().sessions.load(&identity).is_none());
        assert_eq!(sink.event_types(), ["dialog.follow_received"]);
    }

    #[test]
    fn turns_persist_session_and_audit_steps() {
        let (service, sink) = service();
        let identity = Identity::new("U1");

        service.handle(InboundEvent::text(identity.clone(), "我要預約"), "req-1").expect("handled");
        let session = service.stores().sessions.load(&identity).expect("session stored");
        assert_eq!(session.step.label(), "booking.category");

        let events = sink.events();
        assert_eq!(events[0].event_type, "dialog.turn_applied");
        assert_eq!(events[0].metadata.get("from").map(String::as_str), Some("idle"));
        assert_eq!(events[0].metadata.get("to").map(String::as_str), Some("booking.category"));

        service.handle(InboundEvent::text(identity.clone(), "不存在的分類"), "req-2").expect("handled");
        assert_eq!(sink.events()[1].outcome, AuditOutcome::Rejected);
    }

    #[test]
    fn refill_records_remembered_fields_for_acting_user() {
        let (service, sink) = service();
        let identity = Identity::new("U-friend");
        service.stores().bookings.save(Booking {
            owner: Identity::new("U-owner"),
            phone: "0912345678".to_string(),
            category: "拋光美容".to_string(),
            sub_service: Some("打蠟".to_string()),
            vehicle: VehicleClass::Sedan,
            license_plate: "XYZ-9876".to_string(),
            date: "2025-06-01".to_string(),
            time_slot: TimeSlot::Morning,
            pickup_location: "台北車站".to_string(),
            note: String::new(),
        });

        for (index, line) in ["更改預約", "0912345678", "重新填寫預約單"].into_iter().enumerate() {
            service
                .handle(InboundEvent::text(identity.clone(), line), &format!("req-{index}"))
                .expect("handled");
        }

        let refreshed = sink
            .events()
            .into_iter()
            .find(|event| event.event_type == "memory.refreshed")
            .expect("memory audited");
        assert_eq!(refreshed.category, AuditCategory::Memory);
        assert_eq!(refreshed.correlation_id, "req-2");
        assert_eq!(refreshed.metadata.get("owner").map(String::as_str), Some("U-friend"));
        assert_eq!(
            refreshed.metadata.get("fields").map(String::as_str),
            Some("phone,license_plate,pickup_location")
        );
        assert!(!refreshed.metadata.contains_key("on_behalf_of"));
        assert_eq!(
            sink.event_types().last().map(String::as_str),
            Some("dialog.turn_applied"),
            "store writes are audited before the turn itself"
        );
    }

    #[test]
    fn catalog_inconsistency_clears_session_and_fails() {
        let (service, sink) = service();
        let identity = Identity::new("U1");
        let mut session = Session::new(Step::PriceInquiry(PriceStep::VehicleClass));
        session.draft.category = Some("已下架".to_string());
        service.stores().sessions.save(&identity, session);

        let error = service
            .handle(InboundEvent::text(identity.clone(), "小型車"), "req-9")
            .expect_err("inconsistent catalog");
        assert!(matches!(error, ApplicationError::Domain(DomainError::CatalogInconsistency(_))));
        assert!(service.stores().sessions.load(&identity).is_none());

        let events = sink.events();
        assert_eq!(events.last().map(|event| event.outcome), Some(AuditOutcome::Failed));
    }
}
