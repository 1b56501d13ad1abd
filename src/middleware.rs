//! The authorization middleware wrapped around every AI function.
//!
//! Each invocation walks the same fixed sequence:
//!
//! 1. blocked check
//! 2. authentication check
//! 3. classification
//! 4. ownership resolution
//! 5. comparison
//! 6. delegation
//!
//! The first failing step ends the invocation with a [`Denial`]. Nothing is
//! shared between invocations apart from the optional audit trail.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::audit::{self, AuditEvent, AuditOutcome, AuditTrail};
use crate::catalog::FunctionDescriptor;
use crate::client::{ApiError, OwnershipLookup};
use crate::config::GuardConfig;
use crate::context::{Ctx, Identified, OwnerVerified};
use crate::error::{Denial, DenialReason};
use crate::identity::{IdentityExtractor, SecurityContext};
use crate::ids::CustomerId;
use crate::resolver::OwnershipResolver;
use crate::response::Response;
use crate::shape::{Classification, Classify};

/// Message returned when the delegated operation fails upstream.
pub const UPSTREAM_FAILURE_MESSAGE: &str =
    "The insurance service could not complete the request. Please try again later.";

/// Result of running steps 1 to 5 for one invocation.
#[derive(Debug)]
pub enum Authorization {
    /// The caller owns the target; the context proves it
    Authorized(Ctx<OwnerVerified>),
    /// The invocation was refused
    Denied(Denial),
}

impl Authorization {
    /// Returns true if the invocation may proceed.
    pub fn is_authorized(&self) -> bool {
        matches!(self, Authorization::Authorized(_))
    }

    /// Returns the denial, if any.
    pub fn denial(&self) -> Option<&Denial> {
        match self {
            Authorization::Authorized(_) => None,
            Authorization::Denied(denial) => Some(denial),
        }
    }

    /// Converts into a `Result`.
    pub fn into_result(self) -> Result<Ctx<OwnerVerified>, Denial> {
        match self {
            Authorization::Authorized(ctx) => Ok(ctx),
            Authorization::Denied(denial) => Err(denial),
        }
    }
}

/// The authorization decision maker shared by every secured function.
///
/// # Examples
///
/// ```
/// use ownership_guard::memory::InMemoryInsurance;
/// use ownership_guard::{
///     Classification, Classify, CustomerId, FunctionDescriptor, Guard, SecurityContext,
/// };
/// use serde_json::json;
///
/// struct ForCustomer(u64);
///
/// impl Classify for ForCustomer {
///     fn classify(&self) -> Classification {
///         Classification::customer(CustomerId::new(self.0))
///     }
/// }
///
/// const GET: FunctionDescriptor = FunctionDescriptor::new("getCustomerById", "Fetch a customer");
///
/// let guard = Guard::default();
/// let store = InMemoryInsurance::new();
/// let security = SecurityContext::oidc(
///     json!({ "insurance_user_id": 1 }).as_object().unwrap().clone(),
/// );
///
/// assert!(guard.authorize(&GET, &security, "req-1", &ForCustomer(1), &store).is_authorized());
/// assert!(!guard.authorize(&GET, &security, "req-2", &ForCustomer(2), &store).is_authorized());
/// ```
#[derive(Debug, Default)]
pub struct Guard {
    extractor: IdentityExtractor,
    trail: Option<Arc<AuditTrail>>,
}

impl Guard {
    /// Creates a guard reading the principal with the given extractor.
    pub fn new(extractor: IdentityExtractor) -> Self {
        Self {
            extractor,
            trail: None,
        }
    }

    /// Creates a guard from configuration.
    pub fn from_config(config: &GuardConfig) -> Self {
        let guard = Self::new(IdentityExtractor::new(config.customer_id_claim.clone()));
        if config.audit_enabled {
            guard.with_audit_trail(Arc::new(AuditTrail::new()))
        } else {
            guard
        }
    }

    /// Records every decision into `trail` as well as emitting it.
    pub fn with_audit_trail(mut self, trail: Arc<AuditTrail>) -> Self {
        self.trail = Some(trail);
        self
    }

    /// Returns the audit trail, if one is attached.
    pub fn audit_trail(&self) -> Option<&Arc<AuditTrail>> {
        self.trail.as_ref()
    }

    /// Returns the identity extractor.
    pub fn extractor(&self) -> &IdentityExtractor {
        &self.extractor
    }

    /// Runs the blocked, authentication, classification, resolution and
    /// comparison steps for one request.
    ///
    /// A granted decision is audited here. Callers that delegate afterwards
    /// should use [`SecuredFunction`], which audits the delegation outcome
    /// instead.
    pub fn authorize<R, L>(
        &self,
        descriptor: &FunctionDescriptor,
        security: &SecurityContext,
        request_id: &str,
        request: &R,
        lookup: &L,
    ) -> Authorization
    where
        R: Classify + ?Sized,
        L: OwnershipLookup + ?Sized,
    {
        let verified = self
            .admit(descriptor, security, request_id)
            .and_then(|ctx| self.verify_owner(ctx, request, lookup));

        match verified {
            Ok(ctx) => {
                self.complete(&ctx, AuditOutcome::Granted);
                Authorization::Authorized(ctx)
            }
            Err(denial) => Authorization::Denied(denial),
        }
    }

    /// Steps 1 and 2. Nothing about the request is looked at.
    pub(crate) fn admit(
        &self,
        descriptor: &FunctionDescriptor,
        security: &SecurityContext,
        request_id: &str,
    ) -> Result<Ctx<Identified>, Denial> {
        let ctx = Ctx::new(request_id, descriptor.name);

        if descriptor.blocked_for_ai {
            ctx.log()
                .warn(format_args!("function is blocked for AI access"));
            return Err(self.reject(ctx.request_id(), descriptor.name, None, DenialReason::Blocked));
        }

        match self.extractor.current_principal(security) {
            Some(principal) => Ok(ctx.identify(principal)),
            None => {
                ctx.log()
                    .warn(format_args!("no authenticated customer for invocation"));
                Err(self.reject(
                    ctx.request_id(),
                    descriptor.name,
                    None,
                    DenialReason::NotAuthenticated,
                ))
            }
        }
    }

    /// Steps 3 to 5.
    pub(crate) fn verify_owner<R, L>(
        &self,
        ctx: Ctx<Identified>,
        request: &R,
        lookup: &L,
    ) -> Result<Ctx<OwnerVerified>, Denial>
    where
        R: Classify + ?Sized,
        L: OwnershipLookup + ?Sized,
    {
        let principal = ctx.principal();

        let shape = match request.classify() {
            Classification::Shape(shape) => shape,
            Classification::Unknown => {
                ctx.log()
                    .warn(format_args!("request does not match any ownership shape"));
                return Err(self.deny(&ctx, DenialReason::CannotResolveOwner));
            }
        };

        let owner = match OwnershipResolver::new(lookup).resolve(&shape) {
            Ok(owner) => owner,
            Err(err) => {
                ctx.log().warn(format_args!(
                    "owner of {} request could not be resolved: {}",
                    shape.label(),
                    err
                ));
                return Err(self.deny(&ctx, DenialReason::CannotResolveOwner));
            }
        };

        if owner != principal {
            ctx.log().warn(format_args!(
                "customer {} does not own the requested {} resource",
                principal,
                shape.label()
            ));
            return Err(self.deny(&ctx, DenialReason::OwnerMismatch));
        }

        ctx.log().debug(format_args!(
            "customer {} owns the requested {} resource",
            principal,
            shape.label()
        ));
        Ok(ctx.verify_owner())
    }

    /// Denies an identified invocation.
    pub(crate) fn deny(&self, ctx: &Ctx<Identified>, reason: DenialReason) -> Denial {
        self.reject(ctx.request_id(), ctx.function(), Some(ctx.principal()), reason)
    }

    fn reject(
        &self,
        request_id: &str,
        function: &'static str,
        principal: Option<CustomerId>,
        reason: DenialReason,
    ) -> Denial {
        let mut event = AuditEvent::new(request_id, function, AuditOutcome::Denied(reason));
        if let Some(principal) = principal {
            event = event.with_principal(principal);
        }
        self.record(event);
        Denial::new(function, reason)
    }

    /// Audits the end of an authorized invocation.
    pub(crate) fn complete(&self, ctx: &Ctx<OwnerVerified>, outcome: AuditOutcome) {
        match outcome {
            AuditOutcome::Failed => ctx.log().warn(format_args!("delegated operation failed")),
            _ => ctx
                .log()
                .info(format_args!("invocation authorized for customer {}", ctx.principal())),
        }
        self.record(
            AuditEvent::new(ctx.request_id(), ctx.function(), outcome)
                .with_principal(ctx.principal()),
        );
    }

    fn record(&self, event: AuditEvent) {
        audit::emit(&event);
        if let Some(trail) = &self.trail {
            trail.record(event);
        }
    }
}

/// An AI function behind the authorization middleware.
///
/// Built once at startup from a descriptor and the real operation. `F` only
/// ever runs with a verified context.
pub struct SecuredFunction<C: ?Sized, Req, Out, F> {
    descriptor: FunctionDescriptor,
    client: Arc<C>,
    guard: Arc<Guard>,
    delegate: F,
    _io: PhantomData<fn(Req) -> Out>,
}

impl<C, Req, Out, F> SecuredFunction<C, Req, Out, F>
where
    C: OwnershipLookup + ?Sized,
    Req: Classify,
    F: Fn(&Ctx<OwnerVerified>, &C, Req) -> Result<Out, ApiError>,
{
    /// Wraps `delegate` with the guard.
    pub fn new(
        descriptor: FunctionDescriptor,
        client: Arc<C>,
        guard: Arc<Guard>,
        delegate: F,
    ) -> Self {
        Self {
            descriptor,
            client,
            guard,
            delegate,
            _io: PhantomData,
        }
    }

    /// Returns the function's descriptor.
    pub fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    /// Authorizes the request and, if granted, delegates exactly once.
    pub fn call(
        &self,
        security: &SecurityContext,
        request_id: &str,
        request: Req,
    ) -> Response<Out> {
        match self.guard.admit(&self.descriptor, security, request_id) {
            Ok(ctx) => self.proceed(ctx, request),
            Err(denial) => Response::from_denial(&denial),
        }
    }

    fn proceed(&self, ctx: Ctx<Identified>, request: Req) -> Response<Out> {
        let ctx = match self.guard.verify_owner(ctx, &request, &*self.client) {
            Ok(ctx) => ctx,
            Err(denial) => return Response::from_denial(&denial),
        };

        match (self.delegate)(&ctx, &*self.client, request) {
            Ok(out) => {
                self.guard.complete(&ctx, AuditOutcome::Granted);
                Response::ok(out)
            }
            Err(err) => {
                ctx.log().debug(format_args!("upstream error: {}", err));
                self.guard.complete(&ctx, AuditOutcome::Failed);
                Response::failure(UPSTREAM_FAILURE_MESSAGE)
            }
        }
    }
}

/// A catalog entry callable with JSON arguments.
pub trait AiFunction: Send + Sync {
    /// Returns the function's descriptor.
    fn descriptor(&self) -> &FunctionDescriptor;

    /// Decodes `arguments` and runs the secured invocation.
    ///
    /// Arguments are decoded only once the caller is admitted, so a blocked
    /// function never looks at its payload.
    fn call_json(
        &self,
        security: &SecurityContext,
        request_id: &str,
        arguments: Value,
    ) -> Response<Value>;
}

impl<C, Req, Out, F> AiFunction for SecuredFunction<C, Req, Out, F>
where
    C: OwnershipLookup + Send + Sync + ?Sized,
    Req: Classify + DeserializeOwned,
    Out: Serialize,
    F: Fn(&Ctx<OwnerVerified>, &C, Req) -> Result<Out, ApiError> + Send + Sync,
{
    fn descriptor(&self) -> &FunctionDescriptor {
        &self.descriptor
    }

    fn call_json(
        &self,
        security: &SecurityContext,
        request_id: &str,
        arguments: Value,
    ) -> Response<Value> {
        let ctx = match self.guard.admit(&self.descriptor, security, request_id) {
            Ok(ctx) => ctx,
            Err(denial) => return Response::from_denial(&denial),
        };

        let request: Req = match serde_json::from_value(arguments) {
            Ok(request) => request,
            Err(err) => {
                ctx.log()
                    .warn(format_args!("arguments could not be decoded: {}", err));
                let denial = self.guard.deny(&ctx, DenialReason::CannotResolveOwner);
                return Response::from_denial(&denial);
            }
        };

        match self.proceed(ctx, request).into_result() {
            Ok(out) => match serde_json::to_value(out) {
                Ok(value) => Response::ok(value),
                Err(err) => {
                    tracing::error!(
                        request_id,
                        function = self.descriptor.name,
                        error = %err,
                        "result could not be encoded"
                    );
                    Response::failure(UPSTREAM_FAILURE_MESSAGE)
                }
            },
            Err(message) => Response::failure(message),
        }
    }
}
