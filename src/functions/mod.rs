//! The insurance functions offered to the assistant.
//!
//! Each function pairs a [`FunctionDescriptor`] with a request type that
//! implements [`Classify`] and a one-line delegation to the
//! [`InsuranceClient`]. Everything passes through the [`Guard`] first.
//!
//! ```
//! use std::sync::Arc;
//!
//! use ownership_guard::functions;
//! use ownership_guard::memory::InMemoryInsurance;
//! use ownership_guard::Guard;
//!
//! let catalog = functions::catalog(
//!     Arc::new(InMemoryInsurance::new()),
//!     Arc::new(Guard::default()),
//! )
//! .unwrap();
//!
//! assert_eq!(catalog.len(), functions::ADVERTISED.len());
//! assert!(catalog.descriptor("deleteCustomer").unwrap().blocked_for_ai);
//! ```

pub mod claims;
pub mod customers;
pub mod policies;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::catalog::{Catalog, CatalogBuilder, FunctionDescriptor};
use crate::client::{ApiError, InsuranceClient, OwnershipLookup};
use crate::context::{Ctx, OwnerVerified};
use crate::error::CatalogError;
use crate::ids::ClaimKind;
use crate::middleware::{AiFunction, Guard, SecuredFunction};
use crate::shape::Classify;

use self::claims::{Auto, Health, Home};

/// Every function name the assistant is told about.
pub const ADVERTISED: &[&str] = &[
    // customers
    "getCustomerById",
    "createCustomer",
    "updateCustomer",
    "deleteCustomer",
    "getCustomerByPolicyNumber",
    "getPoliciesByCustomerId",
    // policies
    "createPolicy",
    "getPolicyById",
    "getPolicyByPolicyNumber",
    "updatePolicy",
    "deletePolicy",
    "getAllPolicies",
    "updatePolicyConditions",
    "getAutoClaimsByPolicyId",
    "getHomeClaimsByPolicyId",
    "getHealthClaimsByPolicyId",
    // auto claims
    "createAutoClaim",
    "getAutoClaimById",
    "getAllAutoClaims",
    "updateAutoClaim",
    "deleteAutoClaim",
    "assignAdjusterToAutoClaim",
    // home claims
    "createHomeClaim",
    "getHomeClaimById",
    "getAllHomeClaims",
    "updateHomeClaim",
    "deleteHomeClaim",
    "assignAdjusterToHomeClaim",
    // health claims
    "createHealthClaim",
    "getHealthClaimById",
    "getAllHealthClaims",
    "updateHealthClaim",
    "deleteHealthClaim",
    "assignAdjusterToHealthClaim",
];

/// Payload returned by the delete functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeletionConfirmation {
    /// Always `SUCCESS`
    pub status: &'static str,
    /// What was deleted
    pub message: String,
}

impl DeletionConfirmation {
    /// Confirms a deletion.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "SUCCESS",
            message: message.into(),
        }
    }

    /// Confirms a claim deletion, e.g. `Auto claim deleted successfully.`
    pub fn claim(kind: ClaimKind) -> Self {
        Self::new(format!("{} claim deleted successfully.", kind.label()))
    }
}

/// Registers every insurance function on `builder`.
pub fn register_all<C>(builder: CatalogBuilder, client: Arc<C>, guard: Arc<Guard>) -> CatalogBuilder
where
    C: InsuranceClient + Send + Sync + ?Sized + 'static,
{
    let builder = customers::register(builder, &client, &guard);
    let builder = policies::register(builder, &client, &guard);
    let builder = claims::register::<Auto, C>(builder, &client, &guard);
    let builder = claims::register::<Home, C>(builder, &client, &guard);
    claims::register::<Health, C>(builder, &client, &guard)
}

/// Builds the full catalog and checks it against [`ADVERTISED`].
///
/// # Errors
///
/// Any [`CatalogError`] is a startup fault.
pub fn catalog<C>(client: Arc<C>, guard: Arc<Guard>) -> Result<Catalog, CatalogError>
where
    C: InsuranceClient + Send + Sync + ?Sized + 'static,
{
    let catalog = register_all(Catalog::builder(), client, guard).build()?;
    catalog.verify_advertised(ADVERTISED)?;
    tracing::info!(functions = catalog.len(), "insurance functions registered");
    Ok(catalog)
}

pub(crate) fn secured<C, Req, Out, F>(
    descriptor: FunctionDescriptor,
    client: &Arc<C>,
    guard: &Arc<Guard>,
    delegate: F,
) -> Box<dyn AiFunction>
where
    C: OwnershipLookup + Send + Sync + ?Sized + 'static,
    Req: Classify + DeserializeOwned + 'static,
    Out: Serialize + 'static,
    F: Fn(&Ctx<OwnerVerified>, &C, Req) -> Result<Out, ApiError> + Send + Sync + 'static,
{
    Box::new(SecuredFunction::new(
        descriptor,
        Arc::clone(client),
        Arc::clone(guard),
        delegate,
    ))
}
