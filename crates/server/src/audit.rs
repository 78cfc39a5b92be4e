use detailbook_core::audit::{AuditEvent, AuditOutcome, AuditSink};
use tracing::{info, warn};

/// Forwards audit events to the process log.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn emit(&self, event: AuditEvent) {
        let identity = event.identity.as_ref().map_or("unknown", |identity| identity.as_str());
        match event.outcome {
            AuditOutcome::Failed => warn!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                identity,
                category = event.category.as_str(),
                outcome = event.outcome.as_str(),
                metadata = ?event.metadata,
                "audit event"
            ),
            AuditOutcome::Success | AuditOutcome::Rejected => info!(
                event_name = %event.event_type,
                correlation_id = %event.correlation_id,
                identity,
                category = event.category.as_str(),
                outcome = event.outcome.as_str(),
                metadata = ?event.metadata,
                "audit event"
            ),
        }
    }
}
