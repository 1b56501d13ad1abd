//! Audit event schema.

use std::fmt;

use crate::error::DenialReason;
use crate::ids::CustomerId;

/// Outcome of an audited invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditOutcome {
    /// Authorization passed and the operation succeeded
    Granted,
    /// The invocation was refused
    Denied(DenialReason),
    /// Authorization passed but the operation failed upstream
    Failed,
}

impl fmt::Display for AuditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditOutcome::Granted => write!(f, "granted"),
            AuditOutcome::Denied(reason) => write!(f, "denied({})", reason),
            AuditOutcome::Failed => write!(f, "failed"),
        }
    }
}

/// One authorization decision.
///
/// # Example
///
/// ```
/// use ownership_guard::audit::{AuditEvent, AuditOutcome};
/// use ownership_guard::{CustomerId, DenialReason};
///
/// let event = AuditEvent::new(
///     "req-123",
///     "getCustomerById",
///     AuditOutcome::Denied(DenialReason::OwnerMismatch),
/// )
/// .with_principal(CustomerId::new(1).unwrap());
///
/// assert_eq!(event.request_id(), "req-123");
/// assert_eq!(event.principal().map(CustomerId::get), Some(1));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEvent {
    request_id: String,
    function: &'static str,
    /// None when the caller could not be identified
    principal: Option<CustomerId>,
    outcome: AuditOutcome,
}

impl AuditEvent {
    /// Creates an event without a principal.
    pub fn new(
        request_id: impl Into<String>,
        function: &'static str,
        outcome: AuditOutcome,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            function,
            principal: None,
            outcome,
        }
    }

    /// Sets the authenticated caller.
    pub fn with_principal(mut self, principal: CustomerId) -> Self {
        self.principal = Some(principal);
        self
    }

    /// Returns the request identifier.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the invoked function.
    pub fn function(&self) -> &'static str {
        self.function
    }

    /// Returns the caller, if identified.
    pub fn principal(&self) -> Option<CustomerId> {
        self.principal
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> AuditOutcome {
        self.outcome
    }

    /// Returns the denial reason, if denied.
    pub fn denial_reason(&self) -> Option<DenialReason> {
        match self.outcome {
            AuditOutcome::Denied(reason) => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AuditEvent[function={}, outcome={}, request_id={}",
            self.function, self.outcome, self.request_id
        )?;
        match self.principal {
            Some(id) => write!(f, ", principal={}]", id),
            None => write!(f, ", principal=<none>]"),
        }
    }
}
