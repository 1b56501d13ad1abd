use crate::ids::CustomerId;
use crate::logging::InvocationLog;

/// State of a context before identity extraction.
#[derive(Debug, Clone, Copy)]
pub struct Anonymous {
    _private: (),
}

/// State of a context whose caller has been identified.
#[derive(Debug, Clone, Copy)]
pub struct Identified {
    principal: CustomerId,
}

/// State of a context whose caller has been shown to own the target.
#[derive(Debug, Clone, Copy)]
pub struct OwnerVerified {
    principal: CustomerId,
}

/// Per-invocation context, with its authorization state in the type.
///
/// ```text
/// Ctx<Anonymous> --identify--> Ctx<Identified> --verify_owner--> Ctx<OwnerVerified>
/// ```
///
/// Transitions are crate-private: only the guard can advance a context, so
/// holding a `Ctx<OwnerVerified>` proves the full check ran. Delegated
/// operations receive one.
#[derive(Debug, Clone)]
pub struct Ctx<S> {
    request_id: String,
    function: &'static str,
    state: S,
}

impl<S> Ctx<S> {
    /// Returns the request ID for this invocation.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Returns the name of the invoked function.
    pub fn function(&self) -> &'static str {
        self.function
    }

    /// Returns a logger stamped with this invocation's request ID and function.
    pub fn log(&self) -> InvocationLog<'_> {
        InvocationLog::new(&self.request_id, self.function)
    }
}

impl Ctx<Anonymous> {
    pub(crate) fn new(request_id: impl Into<String>, function: &'static str) -> Self {
        Self {
            request_id: request_id.into(),
            function,
            state: Anonymous { _private: () },
        }
    }

    pub(crate) fn identify(self, principal: CustomerId) -> Ctx<Identified> {
        Ctx {
            request_id: self.request_id,
            function: self.function,
            state: Identified { principal },
        }
    }
}

impl Ctx<Identified> {
    /// Returns the authenticated customer.
    pub fn principal(&self) -> CustomerId {
        self.state.principal
    }

    pub(crate) fn verify_owner(self) -> Ctx<OwnerVerified> {
        Ctx {
            request_id: self.request_id,
            function: self.function,
            state: OwnerVerified {
                principal: self.state.principal,
            },
        }
    }
}

impl Ctx<OwnerVerified> {
    /// Returns the authenticated customer, who owns the request's target.
    pub fn principal(&self) -> CustomerId {
        self.state.principal
    }
}
