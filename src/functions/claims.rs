//! Claim functions for the auto, home and health families.
//!
//! The three families behave identically. Each is a marker type
//! implementing [`ClaimType`], and every request is generic over it, so a
//! single registration routine serves all of them.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::Deserialize;

use super::{secured, DeletionConfirmation};
use crate::catalog::{CatalogBuilder, FunctionDescriptor};
use crate::client::{AdjusterAssignment, ClaimQuery, ClaimRecord, InsuranceClient};
use crate::ids::{ClaimId, ClaimKind};
use crate::middleware::Guard;
use crate::shape::{Classification, Classify};

/// A claim family and the descriptors of its functions.
pub trait ClaimType: fmt::Debug + Send + Sync + 'static {
    /// The family
    const KIND: ClaimKind;
    /// `create<Kind>Claim`
    const CREATE: FunctionDescriptor;
    /// `get<Kind>ClaimById`
    const GET: FunctionDescriptor;
    /// `getAll<Kind>Claims`
    const GET_ALL: FunctionDescriptor;
    /// `update<Kind>Claim`
    const UPDATE: FunctionDescriptor;
    /// `delete<Kind>Claim`
    const DELETE: FunctionDescriptor;
    /// `assignAdjusterTo<Kind>Claim`
    const ASSIGN_ADJUSTER: FunctionDescriptor;
    /// `get<Kind>ClaimsByPolicyId`
    const BY_POLICY: FunctionDescriptor;
}

macro_rules! claim_type {
    ($(#[$meta:meta])* $marker:ident, $label:literal, $noun:literal, $incident:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        pub enum $marker {}

        impl ClaimType for $marker {
            const KIND: ClaimKind = ClaimKind::$marker;

            const CREATE: FunctionDescriptor = FunctionDescriptor::new(
                concat!("create", $label, "Claim"),
                concat!(
                    "Files a new ", $noun, " claim for ", $incident, ". ",
                    "Set policyId to the technical policy id, not the policy number, ",
                    "and claimType to '", $label, "ClaimDto'. ",
                    "Returns the created claim with its claim id and initial status."
                ),
            );

            const GET: FunctionDescriptor = FunctionDescriptor::new(
                concat!("get", $label, "ClaimById"),
                concat!(
                    "Retrieves a ", $noun, " claim by claim id, including its status, ",
                    "amounts and incident details."
                ),
            );

            const GET_ALL: FunctionDescriptor = FunctionDescriptor::new(
                concat!("getAll", $label, "Claims"),
                concat!(
                    "Lists every ", $noun, " claim in the system with optional page, size ",
                    "and status filters. Administrative use only."
                ),
            )
            .blocked();

            const UPDATE: FunctionDescriptor = FunctionDescriptor::new(
                concat!("update", $label, "Claim"),
                concat!(
                    "Updates an existing ", $noun, " claim identified by claimId with new ",
                    "details. Returns the updated claim."
                ),
            );

            const DELETE: FunctionDescriptor = FunctionDescriptor::new(
                concat!("delete", $label, "Claim"),
                concat!("Deletes a ", $noun, " claim. Administrative use only."),
            )
            .blocked();

            const ASSIGN_ADJUSTER: FunctionDescriptor = FunctionDescriptor::new(
                concat!("assignAdjusterTo", $label, "Claim"),
                concat!(
                    "Assigns an adjuster to a ", $noun, " claim. Only available to claim ",
                    "handlers."
                ),
            )
            .blocked();

            const BY_POLICY: FunctionDescriptor = FunctionDescriptor::new(
                concat!("get", $label, "ClaimsByPolicyId"),
                concat!(
                    "Lists the ", $noun, " claims filed against one of the customer's ",
                    "policies, with optional page, size and status filters."
                ),
            );
        }
    };
}

claim_type!(
    /// Vehicle claims.
    Auto,
    "Auto",
    "auto",
    "vehicle accidents, theft or damage"
);
claim_type!(
    /// Property claims.
    Home,
    "Home",
    "home",
    "damage to a house or its contents"
);
claim_type!(
    /// Medical expense claims.
    Health,
    "Health",
    "health",
    "medical treatment and hospital costs"
);

/// A new claim of family `K`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct CreateClaim<K> {
    /// The claim to file
    #[serde(alias = "autoClaimDto", alias = "homeClaimDto", alias = "healthClaimDto")]
    pub claim: ClaimRecord,
    #[serde(skip)]
    kind: PhantomData<fn() -> K>,
}

impl<K> CreateClaim<K> {
    /// Wraps a claim to file.
    pub fn new(claim: ClaimRecord) -> Self {
        Self {
            claim,
            kind: PhantomData,
        }
    }
}

impl<K: ClaimType> Classify for CreateClaim<K> {
    // A claimType naming another family makes the request ambiguous.
    fn classify(&self) -> Classification {
        match self.claim.claim_type.as_deref() {
            Some(raw) if ClaimKind::parse(raw) != Some(K::KIND) => Classification::Unknown,
            _ => Classification::policy(self.claim.policy_id),
        }
    }
}

/// A request naming one claim of family `K`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct ByClaimId<K> {
    /// The claim
    pub claim_id: ClaimId,
    #[serde(skip)]
    kind: PhantomData<fn() -> K>,
}

impl<K> ByClaimId<K> {
    /// Names a claim.
    pub fn new(claim_id: ClaimId) -> Self {
        Self {
            claim_id,
            kind: PhantomData,
        }
    }
}

impl<K: ClaimType> Classify for ByClaimId<K> {
    fn classify(&self) -> Classification {
        Classification::claim(K::KIND, self.claim_id)
    }
}

/// Replacement of a claim's data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct UpdateClaim<K> {
    /// The claim to update
    pub claim_id: ClaimId,
    /// New claim data
    #[serde(alias = "autoClaimDto", alias = "homeClaimDto", alias = "healthClaimDto")]
    pub claim: ClaimRecord,
    #[serde(skip)]
    kind: PhantomData<fn() -> K>,
}

impl<K> UpdateClaim<K> {
    /// Creates an update for `claim_id`.
    pub fn new(claim_id: ClaimId, claim: ClaimRecord) -> Self {
        Self {
            claim_id,
            claim,
            kind: PhantomData,
        }
    }
}

impl<K: ClaimType> Classify for UpdateClaim<K> {
    fn classify(&self) -> Classification {
        Classification::claim(K::KIND, self.claim_id)
    }
}

/// Listing of every claim of family `K`.
#[derive(Debug, Deserialize)]
#[serde(bound = "")]
pub struct AllClaims<K> {
    /// Paging and status filter
    #[serde(flatten)]
    pub query: ClaimQuery,
    #[serde(skip)]
    kind: PhantomData<fn() -> K>,
}

impl<K> Classify for AllClaims<K> {
    fn classify(&self) -> Classification {
        Classification::Unknown
    }
}

/// Assignment of an adjuster to a claim of family `K`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct AssignAdjuster<K> {
    /// The claim
    pub claim_id: ClaimId,
    /// The adjuster and notes
    #[serde(rename = "assignAdjusterRequestDto", alias = "assignment")]
    pub assignment: AdjusterAssignment,
    #[serde(skip)]
    kind: PhantomData<fn() -> K>,
}

impl<K: ClaimType> Classify for AssignAdjuster<K> {
    fn classify(&self) -> Classification {
        Classification::claim(K::KIND, self.claim_id)
    }
}

pub(crate) fn register<K, C>(
    builder: CatalogBuilder,
    client: &Arc<C>,
    guard: &Arc<Guard>,
) -> CatalogBuilder
where
    K: ClaimType,
    C: InsuranceClient + Send + Sync + ?Sized + 'static,
{
    builder
        .register(secured(K::CREATE, client, guard, |ctx, client: &C, req: CreateClaim<K>| {
            ctx.log().info(format_args!("filing {} claim", K::KIND));
            client.create_claim(K::KIND, req.claim)
        }))
        .register(secured(K::GET, client, guard, |_, client: &C, req: ByClaimId<K>| {
            client.get_claim_by_id(K::KIND, req.claim_id)
        }))
        .register(secured(K::GET_ALL, client, guard, |_, client: &C, req: AllClaims<K>| {
            client.get_all_claims(K::KIND, &req.query)
        }))
        .register(secured(
            K::UPDATE,
            client,
            guard,
            |ctx, client: &C, mut req: UpdateClaim<K>| {
                ctx.log()
                    .info(format_args!("updating {} claim {}", K::KIND, req.claim_id));
                // The claim stays on the policy ownership was checked against.
                req.claim.policy_id = client.get_claim_by_id(K::KIND, req.claim_id)?.policy_id;
                client.update_claim(K::KIND, req.claim_id, req.claim)
            },
        ))
        .register(secured(K::DELETE, client, guard, |_, client: &C, req: ByClaimId<K>| {
            client
                .delete_claim(K::KIND, req.claim_id)
                .map(|()| DeletionConfirmation::claim(K::KIND))
        }))
        .register(secured(
            K::ASSIGN_ADJUSTER,
            client,
            guard,
            |_, client: &C, req: AssignAdjuster<K>| {
                client.assign_adjuster(K::KIND, req.claim_id, req.assignment)
            },
        ))
}
