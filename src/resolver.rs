//! Ownership resolution through the insurance service.
//!
//! Ownership is never cached: each call asks the service again, so a policy
//! moved to another customer is seen immediately.

use std::fmt;

use crate::client::{ApiError, ApiErrorKind, ClaimRecord, OwnershipLookup, PolicyRecord};
use crate::ids::{ClaimKind, CustomerId, PolicyId, PolicyNumber};
use crate::shape::{ClaimRef, OwnershipShape};

/// Why an owner could not be determined.
///
/// Every variant becomes `CannotResolveOwner` at the middleware boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The referenced record does not exist
    NotFound {
        /// The kind of record that was missing
        resource: &'static str,
    },
    /// The service failed while looking the record up
    Upstream(String),
    /// The record exists but lacks the field ownership hangs on
    Malformed {
        /// The record whose ownership field was missing
        resource: &'static str,
    },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::NotFound { resource } => write!(f, "{} not found", resource),
            ResolveError::Upstream(message) => write!(f, "lookup failed: {}", message),
            ResolveError::Malformed { resource } => {
                write!(f, "{} has no owner reference", resource)
            }
        }
    }
}

impl std::error::Error for ResolveError {}

impl ResolveError {
    fn from_api(resource: &'static str, err: ApiError) -> Self {
        match err.kind() {
            ApiErrorKind::NotFound => ResolveError::NotFound { resource },
            ApiErrorKind::Malformed => ResolveError::Malformed { resource },
            ApiErrorKind::Upstream => ResolveError::Upstream(err.message().to_string()),
        }
    }
}

/// Resolves the customer owning a policy or claim.
pub struct OwnershipResolver<'a, L: OwnershipLookup + ?Sized> {
    lookup: &'a L,
}

impl<'a, L: OwnershipLookup + ?Sized> OwnershipResolver<'a, L> {
    /// Creates a resolver over the given lookup.
    pub fn new(lookup: &'a L) -> Self {
        Self { lookup }
    }

    /// Resolves the owner for any ownership shape.
    ///
    /// `CustomerOwned` needs no lookup and returns its own id.
    pub fn resolve(&self, shape: &OwnershipShape) -> Result<CustomerId, ResolveError> {
        match shape {
            OwnershipShape::CustomerOwned(id) => Ok(*id),
            OwnershipShape::PolicyIdOwned(id) => self.owner_of_policy(*id),
            OwnershipShape::PolicyNumberOwned(number) => self.owner_of_policy_number(number),
            OwnershipShape::ClaimOwned(claim) => self.owner_of_claim(*claim),
        }
    }

    /// Returns the customer owning a policy.
    pub fn owner_of_policy(&self, id: PolicyId) -> Result<CustomerId, ResolveError> {
        let policy = self
            .lookup
            .policy_by_id(id)
            .map_err(|e| ResolveError::from_api("policy", e))?;
        policy_owner(policy)
    }

    /// Returns the customer owning the policy with this number.
    pub fn owner_of_policy_number(
        &self,
        number: &PolicyNumber,
    ) -> Result<CustomerId, ResolveError> {
        let policy = self
            .lookup
            .policy_by_number(number)
            .map_err(|e| ResolveError::from_api("policy", e))?;
        policy_owner(policy)
    }

    /// Returns the customer owning a claim: claim, then its policy, then the
    /// policy's customer. All claim kinds follow the same chain.
    pub fn owner_of_claim(&self, claim: ClaimRef) -> Result<CustomerId, ResolveError> {
        let record = match claim.kind {
            ClaimKind::Auto => self.lookup.auto_claim_by_id(claim.id),
            ClaimKind::Home => self.lookup.home_claim_by_id(claim.id),
            ClaimKind::Health => self.lookup.health_claim_by_id(claim.id),
        }
        .map_err(|e| ResolveError::from_api("claim", e))?;

        let policy_id = claim_policy(record)?;
        self.owner_of_policy(policy_id)
    }
}

fn policy_owner(policy: Option<PolicyRecord>) -> Result<CustomerId, ResolveError> {
    policy
        .ok_or(ResolveError::NotFound { resource: "policy" })?
        .customer_id
        .ok_or(ResolveError::Malformed { resource: "policy" })
}

fn claim_policy(claim: Option<ClaimRecord>) -> Result<PolicyId, ResolveError> {
    claim
        .ok_or(ResolveError::NotFound { resource: "claim" })?
        .policy_id
        .ok_or(ResolveError::Malformed { resource: "claim" })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::ClaimId;
    use crate::memory::InMemoryInsurance;

    fn cid(n: u64) -> CustomerId {
        CustomerId::new(n).unwrap()
    }

    fn pid(n: u64) -> PolicyId {
        PolicyId::new(n).unwrap()
    }

    fn claim(kind: ClaimKind, n: u64) -> ClaimRef {
        ClaimRef::new(kind, ClaimId::new(n).unwrap())
    }

    fn seeded() -> InMemoryInsurance {
        let store = InMemoryInsurance::new();
        store.insert_customer(cid(1));
        store.insert_customer(cid(2));
        store.insert_policy(pid(10), "POL-10", Some(cid(1)));
        store.insert_policy(pid(20), "POL-20", Some(cid(2)));
        store.insert_policy(pid(30), "POL-30", None);
        for kind in ClaimKind::ALL {
            store.insert_claim(kind, ClaimId::new(99).unwrap(), Some(pid(20)));
            store.insert_claim(kind, ClaimId::new(7).unwrap(), None);
        }
        store
    }

    #[test]
    fn customer_owned_needs_no_lookup() {
        let store = seeded();
        let resolver = OwnershipResolver::new(&store);
        let owner = resolver.resolve(&OwnershipShape::CustomerOwned(cid(5)));
        assert_eq!(owner, Ok(cid(5)));
        assert_eq!(store.lookup_calls(), 0);
    }

    #[test]
    fn policy_by_id_and_number() {
        let store = seeded();
        let resolver = OwnershipResolver::new(&store);

        assert_eq!(resolver.owner_of_policy(pid(10)), Ok(cid(1)));
        let number = PolicyNumber::new("POL-20").unwrap();
        assert_eq!(resolver.owner_of_policy_number(&number), Ok(cid(2)));
        assert_eq!(store.lookup_calls(), 2);
    }

    #[test]
    fn missing_policy_is_not_found() {
        let store = seeded();
        let resolver = OwnershipResolver::new(&store);

        assert_eq!(
            resolver.owner_of_policy(pid(404)),
            Err(ResolveError::NotFound { resource: "policy" })
        );
        let number = PolicyNumber::new("POL-404").unwrap();
        assert_eq!(
            resolver.owner_of_policy_number(&number),
            Err(ResolveError::NotFound { resource: "policy" })
        );
    }

    #[test]
    fn policy_without_customer_is_malformed() {
        let store = seeded();
        let resolver = OwnershipResolver::new(&store);
        assert_eq!(
            resolver.owner_of_policy(pid(30)),
            Err(ResolveError::Malformed { resource: "policy" })
        );
    }

    #[test]
    fn claims_follow_the_chain_for_every_kind() {
        let store = seeded();
        let resolver = OwnershipResolver::new(&store);

        for kind in ClaimKind::ALL {
            assert_eq!(resolver.owner_of_claim(claim(kind, 99)), Ok(cid(2)));
            assert_eq!(
                resolver.owner_of_claim(claim(kind, 404)),
                Err(ResolveError::NotFound { resource: "claim" })
            );
            assert_eq!(
                resolver.owner_of_claim(claim(kind, 7)),
                Err(ResolveError::Malformed { resource: "claim" })
            );
        }
    }

    #[test]
    fn upstream_failures_are_recoverable() {
        let store = seeded();
        store.fail_lookups(true);
        let resolver = OwnershipResolver::new(&store);

        assert!(matches!(
            resolver.owner_of_policy(pid(10)),
            Err(ResolveError::Upstream(_))
        ));
        assert!(matches!(
            resolver.owner_of_claim(claim(ClaimKind::Auto, 99)),
            Err(ResolveError::Upstream(_))
        ));
    }

    #[test]
    fn ownership_is_not_cached() {
        let store = seeded();
        let resolver = OwnershipResolver::new(&store);

        assert_eq!(resolver.owner_of_policy(pid(10)), Ok(cid(1)));
        store.insert_policy(pid(10), "POL-10", Some(cid(2)));
        assert_eq!(resolver.owner_of_policy(pid(10)), Ok(cid(2)));
    }
}
