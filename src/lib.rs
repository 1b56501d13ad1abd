//! Customer-ownership authorization for AI assistant function calls.
//!
//! An assistant acting for a signed-in customer may call named functions
//! that read or change insurance data. This crate makes sure every such call
//! only touches data the customer owns:
//! - **Blocked functions**: Refused outright, whoever asks
//! - **Identity**: The caller's customer id comes from a verified identity token
//! - **Ownership**: Requests are classified into a closed set of shapes and
//!   their owner is resolved through the insurance service (claim, then
//!   policy, then customer)
//! - **Uniform results**: Every outcome, including refusals, is a [`Response`]
//!
//! # Core Types
//!
//! - [`Guard`]: Runs the authorization sequence
//! - [`Ctx`]: Invocation context whose type records how far it got
//! - [`Classify`]: Maps a request to its [`OwnershipShape`]
//! - [`OwnershipResolver`]: Finds the customer owning a policy or claim
//! - [`Catalog`]: The named functions the assistant may call
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//!
//! use ownership_guard::memory::InMemoryInsurance;
//! use ownership_guard::{functions, CustomerId, Guard, PolicyId, SecurityContext, ToolCall};
//! use serde_json::json;
//!
//! let store = Arc::new(InMemoryInsurance::new());
//! let alice = CustomerId::new(1).unwrap();
//! store.insert_customer(alice);
//! store.insert_policy(PolicyId::new(10).unwrap(), "POL-10", Some(alice));
//!
//! let catalog = functions::catalog(store, Arc::new(Guard::default())).unwrap();
//! let security = SecurityContext::oidc(
//!     json!({ "insurance_user_id": "1" }).as_object().unwrap().clone(),
//! );
//!
//! let call = ToolCall::new("req-1", "getPolicyById", json!({ "policyId": 10 }));
//! let own = catalog.invoke(&security, &call);
//! assert!(own.is_success());
//!
//! let call = ToolCall::new("req-2", "getCustomerById", json!({ "customerId": 2 }));
//! let other = catalog.invoke(&security, &call);
//! assert!(!other.is_success());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
mod catalog;
mod client;
mod config;
mod context;
mod error;
pub mod functions;
mod identity;
mod ids;
mod logging;
pub mod memory;
mod middleware;
mod resolver;
mod response;
mod shape;

pub use catalog::{
    Catalog, CatalogBuilder, FunctionDescriptor, ToolCall, UNKNOWN_FUNCTION_MESSAGE,
};
pub use client::{
    AdjusterAssignment, ApiError, ApiErrorKind, ClaimQuery, ClaimRecord, CustomerRecord,
    InsuranceClient, OwnershipLookup, PolicyConditions, PolicyRecord,
};
pub use config::{
    ConfigError, GuardConfig, AUDIT_KEY, CUSTOMER_ID_CLAIM_KEY, DEFAULT_CUSTOMER_ID_CLAIM,
};
pub use context::{Anonymous, Ctx, Identified, OwnerVerified};
pub use error::{CatalogError, Denial, DenialReason, Error};
pub use identity::{AuthPrincipal, Authentication, IdToken, IdentityExtractor, SecurityContext};
pub use ids::{ClaimId, ClaimKind, CustomerId, InvalidId, PolicyId, PolicyNumber};
pub use logging::InvocationLog;
pub use middleware::{
    AiFunction, Authorization, Guard, SecuredFunction, UPSTREAM_FAILURE_MESSAGE,
};
pub use resolver::{OwnershipResolver, ResolveError};
pub use response::Response;
pub use shape::{classify, ClaimRef, Classification, Classify, OwnershipShape};
