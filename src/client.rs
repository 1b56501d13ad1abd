//! Interface of the external insurance REST service.
//!
//! Only the fields ownership resolution needs are typed. Everything else a
//! record carries travels through untouched in its `attributes` map.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::{ClaimId, ClaimKind, CustomerId, PolicyId, PolicyNumber};

/// A customer as returned by the insurance service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    /// Technical id; absent on records that have not been created yet
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CustomerId>,
    /// Remaining customer fields
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A policy as returned by the insurance service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRecord {
    /// Technical id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<PolicyId>,
    /// Human-readable number
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_number: Option<PolicyNumber>,
    /// Owning customer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
    /// Remaining policy fields
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// A claim of any kind as returned by the insurance service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimRecord {
    /// Technical id within its kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ClaimId>,
    /// Policy the claim was filed against
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<PolicyId>,
    /// Upstream type discriminator, e.g. `AutoClaimDto`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claim_type: Option<String>,
    /// Processing status, e.g. `PENDING`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Remaining claim fields
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

/// System-wide policy terms such as cancellation periods.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyConditions {
    /// The condition fields, passed through as-is
    #[serde(flatten)]
    pub terms: Map<String, Value>,
}

/// Details for assigning an adjuster to a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjusterAssignment {
    /// Adjuster to assign
    pub adjuster_id: String,
    /// Free-form notes for the adjuster
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Pagination and status filter for claim listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimQuery {
    /// Zero-based page
    #[serde(default)]
    pub page: Option<u32>,
    /// Page size
    #[serde(default)]
    pub size: Option<u32>,
    /// Status filter
    #[serde(default)]
    pub status: Option<String>,
}

/// Kind of failure reported by the insurance service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiErrorKind {
    /// The record does not exist
    NotFound,
    /// The service failed or could not be reached
    Upstream,
    /// The service answered with data that cannot be used
    Malformed,
}

impl fmt::Display for ApiErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiErrorKind::NotFound => write!(f, "not found"),
            ApiErrorKind::Upstream => write!(f, "upstream failure"),
            ApiErrorKind::Malformed => write!(f, "malformed response"),
        }
    }
}

/// Error returned by an [`InsuranceClient`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    kind: ApiErrorKind,
    message: String,
}

impl ApiError {
    /// Creates an error of the given kind.
    pub fn new(kind: ApiErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// A missing record.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::NotFound, message)
    }

    /// A service failure.
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Upstream, message)
    }

    /// Unusable data.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Malformed, message)
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ApiErrorKind {
        self.kind
    }

    /// Returns the diagnostic message. Not meant for end users.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "insurance api error ({}): {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

/// The lookups ownership resolution depends on.
///
/// `Ok(None)` means the record does not exist.
pub trait OwnershipLookup {
    /// Fetches a policy by technical id.
    fn policy_by_id(&self, id: PolicyId) -> Result<Option<PolicyRecord>, ApiError>;

    /// Fetches a policy by its human-readable number.
    fn policy_by_number(&self, number: &PolicyNumber) -> Result<Option<PolicyRecord>, ApiError>;

    /// Fetches an auto claim.
    fn auto_claim_by_id(&self, id: ClaimId) -> Result<Option<ClaimRecord>, ApiError>;

    /// Fetches a home claim.
    fn home_claim_by_id(&self, id: ClaimId) -> Result<Option<ClaimRecord>, ApiError>;

    /// Fetches a health claim.
    fn health_claim_by_id(&self, id: ClaimId) -> Result<Option<ClaimRecord>, ApiError>;
}

/// The full set of operations the assistant's functions delegate to.
pub trait InsuranceClient: OwnershipLookup {
    /// Fetches a customer.
    fn get_customer_by_id(&self, id: CustomerId) -> Result<CustomerRecord, ApiError>;
    /// Creates a customer.
    fn create_customer(&self, customer: CustomerRecord) -> Result<CustomerRecord, ApiError>;
    /// Replaces a customer's data.
    fn update_customer(
        &self,
        id: CustomerId,
        customer: CustomerRecord,
    ) -> Result<CustomerRecord, ApiError>;
    /// Deletes a customer.
    fn delete_customer(&self, id: CustomerId) -> Result<(), ApiError>;
    /// Finds the customer owning a policy number.
    fn get_customer_by_policy_number(
        &self,
        number: &PolicyNumber,
    ) -> Result<CustomerRecord, ApiError>;
    /// Lists a customer's policies.
    fn get_policies_by_customer_id(&self, id: CustomerId) -> Result<Vec<PolicyRecord>, ApiError>;

    /// Creates a policy.
    fn create_policy(&self, policy: PolicyRecord) -> Result<PolicyRecord, ApiError>;
    /// Fetches a policy, failing with `NotFound` when absent.
    fn get_policy_by_id(&self, id: PolicyId) -> Result<PolicyRecord, ApiError>;
    /// Fetches a policy by number, failing with `NotFound` when absent.
    fn get_policy_by_number(&self, number: &PolicyNumber) -> Result<PolicyRecord, ApiError>;
    /// Replaces a policy's data.
    fn update_policy(&self, id: PolicyId, policy: PolicyRecord) -> Result<PolicyRecord, ApiError>;
    /// Deletes a policy.
    fn delete_policy(&self, id: PolicyId) -> Result<(), ApiError>;
    /// Lists every policy in the system.
    fn get_all_policies(&self) -> Result<Vec<PolicyRecord>, ApiError>;
    /// Replaces the conditions that apply to every policy.
    fn update_policy_conditions(
        &self,
        conditions: PolicyConditions,
    ) -> Result<PolicyConditions, ApiError>;
    /// Lists the claims of one kind filed against a policy.
    fn get_claims_by_policy_id(
        &self,
        kind: ClaimKind,
        policy: PolicyId,
        query: &ClaimQuery,
    ) -> Result<Vec<ClaimRecord>, ApiError>;

    /// Files a claim.
    fn create_claim(&self, kind: ClaimKind, claim: ClaimRecord) -> Result<ClaimRecord, ApiError>;
    /// Fetches a claim, failing with `NotFound` when absent.
    fn get_claim_by_id(&self, kind: ClaimKind, id: ClaimId) -> Result<ClaimRecord, ApiError>;
    /// Replaces a claim's data.
    fn update_claim(
        &self,
        kind: ClaimKind,
        id: ClaimId,
        claim: ClaimRecord,
    ) -> Result<ClaimRecord, ApiError>;
    /// Deletes a claim.
    fn delete_claim(&self, kind: ClaimKind, id: ClaimId) -> Result<(), ApiError>;
    /// Lists every claim of one kind.
    fn get_all_claims(
        &self,
        kind: ClaimKind,
        query: &ClaimQuery,
    ) -> Result<Vec<ClaimRecord>, ApiError>;
    /// Assigns an adjuster to a claim.
    fn assign_adjuster(
        &self,
        kind: ClaimKind,
        id: ClaimId,
        assignment: AdjusterAssignment,
    ) -> Result<ClaimRecord, ApiError>;
}
