//! In-memory insurance service.
//!
//! Backs the tests and the demo. Counts ownership lookups and delegated
//! operations separately so callers can observe which path ran.

use std::collections::BTreeMap;
use std::num::NonZeroU64;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde_json::Map;

use crate::client::{
    AdjusterAssignment, ApiError, ClaimQuery, ClaimRecord, CustomerRecord, InsuranceClient,
    OwnershipLookup, PolicyConditions, PolicyRecord,
};
use crate::ids::{ClaimId, ClaimKind, CustomerId, PolicyId, PolicyNumber};

#[derive(Debug)]
struct Store {
    customers: BTreeMap<CustomerId, CustomerRecord>,
    policies: BTreeMap<PolicyId, PolicyRecord>,
    claims: BTreeMap<(ClaimKind, ClaimId), ClaimRecord>,
    conditions: PolicyConditions,
    next_id: NonZeroU64,
}

impl Store {
    fn allocate(&mut self) -> NonZeroU64 {
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        id
    }
}

/// Thread-safe in-memory implementation of [`InsuranceClient`].
///
/// # Examples
///
/// ```
/// use ownership_guard::memory::InMemoryInsurance;
/// use ownership_guard::{CustomerId, OwnershipLookup, PolicyId};
///
/// let store = InMemoryInsurance::new();
/// let customer = CustomerId::new(1).unwrap();
/// let policy = PolicyId::new(10).unwrap();
/// store.insert_customer(customer);
/// store.insert_policy(policy, "POL-10", Some(customer));
///
/// let found = store.policy_by_id(policy).unwrap().unwrap();
/// assert_eq!(found.customer_id, Some(customer));
/// assert_eq!(store.lookup_calls(), 1);
/// ```
#[derive(Debug)]
pub struct InMemoryInsurance {
    store: Mutex<Store>,
    lookups: AtomicUsize,
    operations: AtomicUsize,
    failing: AtomicBool,
}

impl Default for InMemoryInsurance {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryInsurance {
    /// Creates an empty service. Generated ids start at 1000.
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store {
                customers: BTreeMap::new(),
                policies: BTreeMap::new(),
                claims: BTreeMap::new(),
                conditions: PolicyConditions::default(),
                next_id: NonZeroU64::MIN.saturating_add(999),
            }),
            lookups: AtomicUsize::new(0),
            operations: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
        }
    }

    /// Inserts or replaces a customer with no extra attributes.
    pub fn insert_customer(&self, id: CustomerId) {
        self.store.lock().customers.insert(
            id,
            CustomerRecord {
                id: Some(id),
                attributes: Map::new(),
            },
        );
    }

    /// Inserts or replaces a policy.
    pub fn insert_policy(&self, id: PolicyId, number: &str, customer: Option<CustomerId>) {
        self.store.lock().policies.insert(
            id,
            PolicyRecord {
                id: Some(id),
                policy_number: PolicyNumber::new(number),
                customer_id: customer,
                attributes: Map::new(),
            },
        );
    }

    /// Inserts or replaces a claim.
    pub fn insert_claim(&self, kind: ClaimKind, id: ClaimId, policy: Option<PolicyId>) {
        self.store.lock().claims.insert(
            (kind, id),
            ClaimRecord {
                id: Some(id),
                policy_id: policy,
                claim_type: Some(format!("{}ClaimDto", kind.label())),
                status: Some("PENDING".to_string()),
                attributes: Map::new(),
            },
        );
    }

    /// Makes every ownership lookup fail with an upstream error.
    pub fn fail_lookups(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of ownership lookups served so far.
    pub fn lookup_calls(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    /// Number of delegated operations served so far.
    pub fn operation_calls(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Returns whether a customer exists.
    pub fn has_customer(&self, id: CustomerId) -> bool {
        self.store.lock().customers.contains_key(&id)
    }

    /// Returns a copy of a stored claim without counting a call.
    pub fn claim_snapshot(&self, kind: ClaimKind, id: ClaimId) -> Option<ClaimRecord> {
        self.store.lock().claims.get(&(kind, id)).cloned()
    }

    fn lookup(&self) -> Result<(), ApiError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            Err(ApiError::upstream("insurance service unavailable"))
        } else {
            Ok(())
        }
    }

    fn operation(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }

    fn claim_by_id(&self, kind: ClaimKind, id: ClaimId) -> Result<Option<ClaimRecord>, ApiError> {
        self.lookup()?;
        Ok(self.store.lock().claims.get(&(kind, id)).cloned())
    }
}

impl OwnershipLookup for InMemoryInsurance {
    fn policy_by_id(&self, id: PolicyId) -> Result<Option<PolicyRecord>, ApiError> {
        self.lookup()?;
        Ok(self.store.lock().policies.get(&id).cloned())
    }

    fn policy_by_number(&self, number: &PolicyNumber) -> Result<Option<PolicyRecord>, ApiError> {
        self.lookup()?;
        Ok(self
            .store
            .lock()
            .policies
            .values()
            .find(|p| p.policy_number.as_ref() == Some(number))
            .cloned())
    }

    fn auto_claim_by_id(&self, id: ClaimId) -> Result<Option<ClaimRecord>, ApiError> {
        self.claim_by_id(ClaimKind::Auto, id)
    }

    fn home_claim_by_id(&self, id: ClaimId) -> Result<Option<ClaimRecord>, ApiError> {
        self.claim_by_id(ClaimKind::Home, id)
    }

    fn health_claim_by_id(&self, id: ClaimId) -> Result<Option<ClaimRecord>, ApiError> {
        self.claim_by_id(ClaimKind::Health, id)
    }
}

impl InsuranceClient for InMemoryInsurance {
    fn get_customer_by_id(&self, id: CustomerId) -> Result<CustomerRecord, ApiError> {
        self.operation();
        self.store
            .lock()
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("customer {}", id)))
    }

    fn create_customer(&self, mut customer: CustomerRecord) -> Result<CustomerRecord, ApiError> {
        self.operation();
        let mut store = self.store.lock();
        let id = CustomerId::from(store.allocate());
        customer.id = Some(id);
        store.customers.insert(id, customer.clone());
        Ok(customer)
    }

    fn update_customer(
        &self,
        id: CustomerId,
        mut customer: CustomerRecord,
    ) -> Result<CustomerRecord, ApiError> {
        self.operation();
        let mut store = self.store.lock();
        let existing = store
            .customers
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found(format!("customer {}", id)))?;
        customer.id = Some(id);
        *existing = customer.clone();
        Ok(customer)
    }

    fn delete_customer(&self, id: CustomerId) -> Result<(), ApiError> {
        self.operation();
        self.store
            .lock()
            .customers
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found(format!("customer {}", id)))
    }

    fn get_customer_by_policy_number(
        &self,
        number: &PolicyNumber,
    ) -> Result<CustomerRecord, ApiError> {
        self.operation();
        let store = self.store.lock();
        store
            .policies
            .values()
            .find(|p| p.policy_number.as_ref() == Some(number))
            .and_then(|p| p.customer_id)
            .and_then(|id| store.customers.get(&id))
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("customer for policy {}", number)))
    }

    fn get_policies_by_customer_id(&self, id: CustomerId) -> Result<Vec<PolicyRecord>, ApiError> {
        self.operation();
        Ok(self
            .store
            .lock()
            .policies
            .values()
            .filter(|p| p.customer_id == Some(id))
            .cloned()
            .collect())
    }

    fn create_policy(&self, mut policy: PolicyRecord) -> Result<PolicyRecord, ApiError> {
        self.operation();
        let mut store = self.store.lock();
        let id = PolicyId::from(store.allocate());
        policy.id = Some(id);
        if policy.policy_number.is_none() {
            policy.policy_number = PolicyNumber::new(format!("POL-{}", id));
        }
        store.policies.insert(id, policy.clone());
        Ok(policy)
    }

    fn get_policy_by_id(&self, id: PolicyId) -> Result<PolicyRecord, ApiError> {
        self.operation();
        self.store
            .lock()
            .policies
            .get(&id)
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("policy {}", id)))
    }

    fn get_policy_by_number(&self, number: &PolicyNumber) -> Result<PolicyRecord, ApiError> {
        self.operation();
        self.store
            .lock()
            .policies
            .values()
            .find(|p| p.policy_number.as_ref() == Some(number))
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("policy {}", number)))
    }

    fn update_policy(
        &self,
        id: PolicyId,
        mut policy: PolicyRecord,
    ) -> Result<PolicyRecord, ApiError> {
        self.operation();
        let mut store = self.store.lock();
        let existing = store
            .policies
            .get_mut(&id)
            .ok_or_else(|| ApiError::not_found(format!("policy {}", id)))?;
        // Absent ownership fields keep their stored value.
        policy.id = Some(id);
        policy.customer_id = policy.customer_id.or(existing.customer_id);
        policy.policy_number = existing.policy_number.clone();
        *existing = policy.clone();
        Ok(policy)
    }

    fn delete_policy(&self, id: PolicyId) -> Result<(), ApiError> {
        self.operation();
        self.store
            .lock()
            .policies
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found(format!("policy {}", id)))
    }

    fn get_all_policies(&self) -> Result<Vec<PolicyRecord>, ApiError> {
        self.operation();
        Ok(self.store.lock().policies.values().cloned().collect())
    }

    fn update_policy_conditions(
        &self,
        conditions: PolicyConditions,
    ) -> Result<PolicyConditions, ApiError> {
        self.operation();
        let mut store = self.store.lock();
        store.conditions = conditions.clone();
        Ok(conditions)
    }

    fn get_claims_by_policy_id(
        &self,
        kind: ClaimKind,
        policy: PolicyId,
        query: &ClaimQuery,
    ) -> Result<Vec<ClaimRecord>, ApiError> {
        self.operation();
        let store = self.store.lock();
        let matching = store
            .claims
            .iter()
            .filter(|((k, _), c)| *k == kind && c.policy_id == Some(policy))
            .map(|(_, c)| c);
        Ok(paginate(matching, query))
    }

    fn create_claim(
        &self,
        kind: ClaimKind,
        mut claim: ClaimRecord,
    ) -> Result<ClaimRecord, ApiError> {
        self.operation();
        let mut store = self.store.lock();
        let policy = claim
            .policy_id
            .ok_or_else(|| ApiError::malformed("claim has no policy id"))?;
        if !store.policies.contains_key(&policy) {
            return Err(ApiError::not_found(format!("policy {}", policy)));
        }
        let id = ClaimId::from(store.allocate());
        claim.id = Some(id);
        claim.claim_type = Some(format!("{}ClaimDto", kind.label()));
        claim.status.get_or_insert_with(|| "PENDING".to_string());
        store.claims.insert((kind, id), claim.clone());
        Ok(claim)
    }

    fn get_claim_by_id(&self, kind: ClaimKind, id: ClaimId) -> Result<ClaimRecord, ApiError> {
        self.operation();
        self.store
            .lock()
            .claims
            .get(&(kind, id))
            .cloned()
            .ok_or_else(|| ApiError::not_found(format!("{} claim {}", kind, id)))
    }

    fn update_claim(
        &self,
        kind: ClaimKind,
        id: ClaimId,
        mut claim: ClaimRecord,
    ) -> Result<ClaimRecord, ApiError> {
        self.operation();
        let mut store = self.store.lock();
        let existing = store
            .claims
            .get_mut(&(kind, id))
            .ok_or_else(|| ApiError::not_found(format!("{} claim {}", kind, id)))?;
        claim.id = Some(id);
        claim.policy_id = claim.policy_id.or(existing.policy_id);
        claim.claim_type = existing.claim_type.clone();
        *existing = claim.clone();
        Ok(claim)
    }

    fn delete_claim(&self, kind: ClaimKind, id: ClaimId) -> Result<(), ApiError> {
        self.operation();
        self.store
            .lock()
            .claims
            .remove(&(kind, id))
            .map(|_| ())
            .ok_or_else(|| ApiError::not_found(format!("{} claim {}", kind, id)))
    }

    fn get_all_claims(
        &self,
        kind: ClaimKind,
        query: &ClaimQuery,
    ) -> Result<Vec<ClaimRecord>, ApiError> {
        self.operation();
        let store = self.store.lock();
        let matching = store
            .claims
            .iter()
            .filter(|((k, _), _)| *k == kind)
            .map(|(_, c)| c);
        Ok(paginate(matching, query))
    }

    fn assign_adjuster(
        &self,
        kind: ClaimKind,
        id: ClaimId,
        assignment: AdjusterAssignment,
    ) -> Result<ClaimRecord, ApiError> {
        self.operation();
        let mut store = self.store.lock();
        let claim = store
            .claims
            .get_mut(&(kind, id))
            .ok_or_else(|| ApiError::not_found(format!("{} claim {}", kind, id)))?;
        claim.attributes.insert(
            "adjusterId".to_string(),
            serde_json::Value::String(assignment.adjuster_id),
        );
        Ok(claim.clone())
    }
}

fn paginate<'a>(
    claims: impl Iterator<Item = &'a ClaimRecord>,
    query: &ClaimQuery,
) -> Vec<ClaimRecord> {
    let size = query.size.unwrap_or(20).max(1) as usize;
    let page = query.page.unwrap_or(0) as usize;
    claims
        .filter(|c| match &query.status {
            Some(status) => c.status.as_deref() == Some(status.as_str()),
            None => true,
        })
        .skip(page.saturating_mul(size))
        .take(size)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(n: u64) -> CustomerId {
        CustomerId::new(n).unwrap()
    }

    fn pid(n: u64) -> PolicyId {
        PolicyId::new(n).unwrap()
    }

    #[test]
    fn lookups_and_operations_are_counted_separately() {
        let store = InMemoryInsurance::new();
        store.insert_customer(cid(1));
        store.insert_policy(pid(10), "POL-10", Some(cid(1)));

        store.policy_by_id(pid(10)).unwrap();
        store.get_policy_by_id(pid(10)).unwrap();
        store.get_customer_by_id(cid(1)).unwrap();

        assert_eq!(store.lookup_calls(), 1);
        assert_eq!(store.operation_calls(), 2);
    }

    #[test]
    fn failing_lookups_do_not_affect_operations() {
        let store = InMemoryInsurance::new();
        store.insert_policy(pid(10), "POL-10", Some(cid(1)));
        store.fail_lookups(true);

        assert!(store.policy_by_id(pid(10)).is_err());
        assert!(store.get_policy_by_id(pid(10)).is_ok());
    }

    #[test]
    fn created_records_get_fresh_ids() {
        let store = InMemoryInsurance::new();
        let a = store.create_customer(CustomerRecord::default()).unwrap();
        let b = store.create_customer(CustomerRecord::default()).unwrap();
        assert_eq!(a.id.map(CustomerId::get), Some(1000));
        assert_eq!(b.id.map(CustomerId::get), Some(1001));
    }

    #[test]
    fn update_claim_fills_absent_fields_from_the_stored_claim() {
        let store = InMemoryInsurance::new();
        let claim = ClaimId::new(5).unwrap();
        store.insert_policy(pid(10), "POL-10", Some(cid(1)));
        store.insert_claim(ClaimKind::Home, claim, Some(pid(10)));

        let approved = ClaimRecord {
            status: Some("APPROVED".to_string()),
            ..ClaimRecord::default()
        };
        let updated = store.update_claim(ClaimKind::Home, claim, approved).unwrap();

        assert_eq!(updated.policy_id, Some(pid(10)));
        assert_eq!(updated.status.as_deref(), Some("APPROVED"));
    }

    #[test]
    fn update_stores_the_owner_it_is_given() {
        let store = InMemoryInsurance::new();
        store.insert_policy(pid(10), "POL-10", Some(cid(1)));

        let rewritten = PolicyRecord {
            customer_id: Some(cid(2)),
            ..PolicyRecord::default()
        };
        let updated = store.update_policy(pid(10), rewritten).unwrap();

        assert_eq!(updated.customer_id, Some(cid(2)));
        assert_eq!(updated.policy_number.as_ref().map(|n| n.as_str()), Some("POL-10"));
    }

    #[test]
    fn policy_conditions_are_replaced_whole() {
        let store = InMemoryInsurance::new();
        let mut terms = Map::new();
        terms.insert("freeCancellationDays".to_string(), serde_json::json!(7));

        let updated = store
            .update_policy_conditions(PolicyConditions { terms })
            .unwrap();

        assert_eq!(updated.terms["freeCancellationDays"], 7);
        assert_eq!(store.operation_calls(), 1);
    }

    #[test]
    fn claim_listing_filters_and_paginates() {
        let store = InMemoryInsurance::new();
        store.insert_policy(pid(10), "POL-10", Some(cid(1)));
        for n in 1..=5 {
            store.insert_claim(ClaimKind::Auto, ClaimId::new(n).unwrap(), Some(pid(10)));
        }
        store.insert_claim(ClaimKind::Health, ClaimId::new(1).unwrap(), Some(pid(10)));

        let query = ClaimQuery {
            page: Some(1),
            size: Some(2),
            status: Some("PENDING".to_string()),
        };
        let page = store
            .get_claims_by_policy_id(ClaimKind::Auto, pid(10), &query)
            .unwrap();
        let ids: Vec<u64> = page.iter().filter_map(|c| c.id).map(ClaimId::get).collect();
        assert_eq!(ids, vec![3, 4]);

        let none = ClaimQuery {
            status: Some("APPROVED".to_string()),
            ..ClaimQuery::default()
        };
        assert!(store.get_all_claims(ClaimKind::Auto, &none).unwrap().is_empty());
    }
}
