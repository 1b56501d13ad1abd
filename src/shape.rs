//! Ownership shapes of AI-callable requests.
//!
//! Every request type states how its owning customer is discovered. The set
//! of shapes is closed; a request that cannot name one is [`Classification::Unknown`]
//! and is always denied.

use crate::ids::{ClaimId, ClaimKind, CustomerId, PolicyId, PolicyNumber};

/// A claim reference: its family plus its id within that family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClaimRef {
    /// Which claim family to look in
    pub kind: ClaimKind,
    /// Claim id within the family
    pub id: ClaimId,
}

impl ClaimRef {
    /// Creates a claim reference.
    pub fn new(kind: ClaimKind, id: ClaimId) -> Self {
        Self { kind, id }
    }
}

/// How ownership of a request's target is determined.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OwnershipShape {
    /// Carries the owning customer id directly
    CustomerOwned(CustomerId),
    /// Carries a policy id; owner is the policy's customer
    PolicyIdOwned(PolicyId),
    /// Carries a policy number; looked up, then as `PolicyIdOwned`
    PolicyNumberOwned(PolicyNumber),
    /// Carries a claim; owner is the customer of the claim's policy
    ClaimOwned(ClaimRef),
}

impl OwnershipShape {
    /// Number of upstream lookups needed to resolve the owner.
    pub fn indirections(&self) -> usize {
        match self {
            OwnershipShape::CustomerOwned(_) => 0,
            OwnershipShape::PolicyIdOwned(_) | OwnershipShape::PolicyNumberOwned(_) => 1,
            OwnershipShape::ClaimOwned(_) => 2,
        }
    }

    /// Short label for logs.
    pub fn label(&self) -> &'static str {
        match self {
            OwnershipShape::CustomerOwned(_) => "customer",
            OwnershipShape::PolicyIdOwned(_) => "policy_id",
            OwnershipShape::PolicyNumberOwned(_) => "policy_number",
            OwnershipShape::ClaimOwned(_) => "claim",
        }
    }
}

/// Result of classifying a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Classification {
    /// The request maps to exactly this shape
    Shape(OwnershipShape),
    /// The request names no owner; never treated as unrestricted
    Unknown,
}

impl Classification {
    /// Classifies by an optional customer id.
    pub fn customer(id: Option<CustomerId>) -> Self {
        id.map_or(Self::Unknown, |id| Self::Shape(OwnershipShape::CustomerOwned(id)))
    }

    /// Classifies by an optional policy id.
    pub fn policy(id: Option<PolicyId>) -> Self {
        id.map_or(Self::Unknown, |id| Self::Shape(OwnershipShape::PolicyIdOwned(id)))
    }

    /// Classifies by a policy number.
    pub fn policy_number(number: &PolicyNumber) -> Self {
        Self::Shape(OwnershipShape::PolicyNumberOwned(number.clone()))
    }

    /// Classifies by a claim reference.
    pub fn claim(kind: ClaimKind, id: ClaimId) -> Self {
        Self::Shape(OwnershipShape::ClaimOwned(ClaimRef::new(kind, id)))
    }

    /// Returns the shape, if classified.
    pub fn shape(&self) -> Option<&OwnershipShape> {
        match self {
            Classification::Shape(shape) => Some(shape),
            Classification::Unknown => None,
        }
    }
}

/// Implemented by every request an AI function accepts.
///
/// Implementations must return the single most specific shape: a claim
/// request is `ClaimOwned` even if it also happens to carry a customer id.
pub trait Classify {
    /// Classifies this request.
    fn classify(&self) -> Classification;
}

/// Classifies a request.
pub fn classify<R: Classify + ?Sized>(request: &R) -> Classification {
    request.classify()
}
