//! Policy functions, including the per-policy claim listings.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Deserialize;

use super::claims::{Auto, ClaimType, Health, Home};
use super::customers::ByPolicyNumber;
use super::{secured, DeletionConfirmation};
use crate::catalog::{CatalogBuilder, FunctionDescriptor};
use crate::client::{ClaimQuery, InsuranceClient, PolicyConditions, PolicyRecord};
use crate::ids::PolicyId;
use crate::middleware::Guard;
use crate::shape::{Classification, Classify};

/// `createPolicy`
pub const CREATE_POLICY: FunctionDescriptor = FunctionDescriptor::new(
    "createPolicy",
    "Creates a new insurance policy for the signed-in customer. The policyDto must carry the \
     customer's own customerId together with the coverage type, dates and premium. Returns the \
     created policy with its policy number.",
);

/// `getPolicyById`
pub const GET_POLICY_BY_ID: FunctionDescriptor = FunctionDescriptor::new(
    "getPolicyById",
    "Retrieves policy details using the policy's technical id. Prefer it over the policy \
     number lookup when the id is already known from an earlier call.",
);

/// `getPolicyByPolicyNumber`
pub const GET_POLICY_BY_POLICY_NUMBER: FunctionDescriptor = FunctionDescriptor::new(
    "getPolicyByPolicyNumber",
    "Retrieves policy details using a policy number such as POL-12345, as quoted by the \
     customer.",
);

/// `updatePolicy`
pub const UPDATE_POLICY: FunctionDescriptor = FunctionDescriptor::new(
    "updatePolicy",
    "Updates an existing policy identified by policyId, for example coverage changes. \
     Requires policyId and the complete updated policyDto. Always confirm changes with the \
     customer first.",
);

/// `deletePolicy`
pub const DELETE_POLICY: FunctionDescriptor = FunctionDescriptor::new(
    "deletePolicy",
    "Cancels and deletes a policy. Only available to customer service.",
)
.blocked();

/// `getAllPolicies`
pub const GET_ALL_POLICIES: FunctionDescriptor = FunctionDescriptor::new(
    "getAllPolicies",
    "Lists every policy in the insurance system. Administrative use only.",
)
.blocked();

/// `updatePolicyConditions`
pub const UPDATE_POLICY_CONDITIONS: FunctionDescriptor = FunctionDescriptor::new(
    "updatePolicyConditions",
    "Replaces the system-wide policy conditions such as cancellation periods and penalties. \
     Affects every policy. Administrative use only.",
)
.blocked();

/// A request naming one policy by technical id.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByPolicyId {
    /// The policy
    pub policy_id: PolicyId,
}

impl Classify for ByPolicyId {
    fn classify(&self) -> Classification {
        Classification::policy(Some(self.policy_id))
    }
}

/// A new policy.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePolicy {
    /// The policy to create
    #[serde(alias = "policy")]
    pub policy_dto: PolicyRecord,
}

impl Classify for CreatePolicy {
    fn classify(&self) -> Classification {
        Classification::customer(self.policy_dto.customer_id)
    }
}

/// Replacement of a policy's data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePolicy {
    /// The policy to update
    pub policy_id: PolicyId,
    /// New policy data
    #[serde(alias = "policy")]
    pub policy_dto: PolicyRecord,
}

impl Classify for UpdatePolicy {
    // The stored policy decides, not the customerId inside the new data.
    fn classify(&self) -> Classification {
        Classification::policy(Some(self.policy_id))
    }
}

/// Listing of every policy.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AllPolicies {}

impl Classify for AllPolicies {
    fn classify(&self) -> Classification {
        Classification::Unknown
    }
}

/// Replacement of the conditions shared by all policies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePolicyConditions {
    /// The new conditions
    #[serde(alias = "policyConditions")]
    pub policy_conditions_dto: PolicyConditions,
}

impl Classify for UpdatePolicyConditions {
    // Not owned by any one customer.
    fn classify(&self) -> Classification {
        Classification::Unknown
    }
}

/// Listing of one kind of claims filed against a policy.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", bound = "")]
pub struct ClaimsByPolicyId<K> {
    /// The policy
    pub policy_id: PolicyId,
    /// Paging and status filter
    #[serde(flatten)]
    pub query: ClaimQuery,
    #[serde(skip)]
    kind: PhantomData<fn() -> K>,
}

impl<K> ClaimsByPolicyId<K> {
    /// Creates a listing request for `policy_id`.
    pub fn new(policy_id: PolicyId, query: ClaimQuery) -> Self {
        Self {
            policy_id,
            query,
            kind: PhantomData,
        }
    }
}

impl<K> Classify for ClaimsByPolicyId<K> {
    fn classify(&self) -> Classification {
        Classification::policy(Some(self.policy_id))
    }
}

pub(crate) fn register<C>(
    builder: CatalogBuilder,
    client: &Arc<C>,
    guard: &Arc<Guard>,
) -> CatalogBuilder
where
    C: InsuranceClient + Send + Sync + ?Sized + 'static,
{
    let builder = builder
        .register(secured(CREATE_POLICY, client, guard, |ctx, client: &C, req: CreatePolicy| {
            ctx.log().info(format_args!("creating policy"));
            client.create_policy(req.policy_dto)
        }))
        .register(secured(GET_POLICY_BY_ID, client, guard, |_, client: &C, req: ByPolicyId| {
            client.get_policy_by_id(req.policy_id)
        }))
        .register(secured(
            GET_POLICY_BY_POLICY_NUMBER,
            client,
            guard,
            |_, client: &C, req: ByPolicyNumber| client.get_policy_by_number(&req.policy_number),
        ))
        .register(secured(
            UPDATE_POLICY,
            client,
            guard,
            |ctx, client: &C, mut req: UpdatePolicy| {
                ctx.log().info(format_args!("updating policy {}", req.policy_id));
                // The verified principal owns the stored policy.
                req.policy_dto.customer_id = Some(ctx.principal());
                client.update_policy(req.policy_id, req.policy_dto)
            },
        ))
        .register(secured(DELETE_POLICY, client, guard, |_, client: &C, req: ByPolicyId| {
            client
                .delete_policy(req.policy_id)
                .map(|()| DeletionConfirmation::new("Policy deleted successfully."))
        }))
        .register(secured(GET_ALL_POLICIES, client, guard, |_, client: &C, _: AllPolicies| {
            client.get_all_policies()
        }))
        .register(secured(
            UPDATE_POLICY_CONDITIONS,
            client,
            guard,
            |_, client: &C, req: UpdatePolicyConditions| {
                client.update_policy_conditions(req.policy_conditions_dto)
            },
        ));

    let builder = register_claim_listing::<Auto, C>(builder, client, guard);
    let builder = register_claim_listing::<Home, C>(builder, client, guard);
    register_claim_listing::<Health, C>(builder, client, guard)
}

fn register_claim_listing<K, C>(
    builder: CatalogBuilder,
    client: &Arc<C>,
    guard: &Arc<Guard>,
) -> CatalogBuilder
where
    K: ClaimType,
    C: InsuranceClient + Send + Sync + ?Sized + 'static,
{
    builder.register(secured(
        K::BY_POLICY,
        client,
        guard,
        |_, client: &C, req: ClaimsByPolicyId<K>| {
            client.get_claims_by_policy_id(K::KIND, req.policy_id, &req.query)
        },
    ))
}
