//! In-memory audit trail recorder.

use parking_lot::Mutex;

use super::AuditEvent;

/// Thread-safe in-memory recorder for audit events.
///
/// Shared between concurrent invocations through an `Arc`; recording takes
/// a short lock and never blocks on I/O.
///
/// # Example
///
/// ```
/// use ownership_guard::audit::{AuditEvent, AuditOutcome, AuditTrail};
///
/// let trail = AuditTrail::new();
/// trail.record(AuditEvent::new("req-1", "getCustomerById", AuditOutcome::Granted));
///
/// assert_eq!(trail.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct AuditTrail {
    events: Mutex<Vec<AuditEvent>>,
}

impl AuditTrail {
    /// Creates a new empty audit trail.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an audit event. Events keep their recording order.
    pub fn record(&self, event: AuditEvent) {
        self.events.lock().push(event);
    }

    /// Returns a snapshot of all recorded events.
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().clone()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if no events have been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}
