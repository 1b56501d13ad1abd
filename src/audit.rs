//! Audit trail of authorization decisions.
//!
//! This module provides:
//! - `AuditEvent`: one decision about one invocation
//! - `AuditTrail`: thread-safe in-memory recorder
//! - `emit`: structured `tracing` output on the `ownership_audit` target
//!
//! Events only carry the function name, the caller's own customer id and
//! the outcome. Ids of the resource the caller asked for are never recorded,
//! so a denied probe for another customer's data leaves no trace of that
//! customer in the audit output.

mod event;
mod trail;

pub use event::{AuditEvent, AuditOutcome};
pub use trail::AuditTrail;

/// Emits an audit event through the tracing infrastructure.
pub fn emit(event: &AuditEvent) {
    let principal = event.principal().map(|id| id.get());
    match event.outcome() {
        AuditOutcome::Granted => tracing::info!(
            target: "ownership_audit",
            request_id = %event.request_id(),
            function = %event.function(),
            principal = ?principal,
            outcome = %event.outcome(),
            "audit event"
        ),
        AuditOutcome::Denied(reason) => tracing::warn!(
            target: "ownership_audit",
            request_id = %event.request_id(),
            function = %event.function(),
            principal = ?principal,
            outcome = %event.outcome(),
            reason = %reason,
            "audit event"
        ),
        AuditOutcome::Failed => tracing::error!(
            target: "ownership_audit",
            request_id = %event.request_id(),
            function = %event.function(),
            principal = ?principal,
            outcome = %event.outcome(),
            "audit event"
        ),
    }
}
