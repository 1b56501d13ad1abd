//! Property tests for the authorization sequence.
//!
//! These validate the ownership invariants over arbitrary principals,
//! owners and claim families using property-based testing.

use std::sync::Arc;

use ownership_guard::memory::InMemoryInsurance;
use ownership_guard::{
    functions, Catalog, ClaimId, ClaimKind, CustomerId, DenialReason, Guard, IdentityExtractor,
    PolicyId, Response, SecurityContext, ToolCall,
};
use proptest::prelude::*;
use serde_json::{json, Value};

fn signed_in(id: u64) -> SecurityContext {
    SecurityContext::oidc(
        json!({ "insurance_user_id": id })
            .as_object()
            .unwrap()
            .clone(),
    )
}

fn catalog_over(store: &Arc<InMemoryInsurance>) -> Catalog {
    functions::catalog(Arc::clone(store), Arc::new(Guard::default())).unwrap()
}

fn invoke(catalog: &Catalog, principal: u64, name: &str, arguments: Value) -> Response<Value> {
    catalog.invoke(&signed_in(principal), &ToolCall::new("req-prop", name, arguments))
}

// Strategy: Generate small positive ids so collisions between principal and owner are common
fn arb_id() -> impl Strategy<Value = u64> {
    1u64..6
}

// Strategy: Generate a claim family together with its lookup function name
fn arb_claim_kind() -> impl Strategy<Value = (ClaimKind, &'static str)> {
    prop_oneof![
        Just((ClaimKind::Auto, "getAutoClaimById")),
        Just((ClaimKind::Home, "getHomeClaimById")),
        Just((ClaimKind::Health, "getHealthClaimById")),
    ]
}

proptest! {
    /// Property: A customer-owned request is delegated iff principal equals the customer
    #[test]
    fn proptest_customer_owned_delegates_iff_owner(
        principal in arb_id(),
        customer in arb_id()
    ) {
        let store = Arc::new(InMemoryInsurance::new());
        for id in 1..6 {
            store.insert_customer(CustomerId::new(id).unwrap());
        }
        let catalog = catalog_over(&store);

        let arguments = json!({ "customerId": customer });
        let response = invoke(&catalog, principal, "getPoliciesByCustomerId", arguments);

        prop_assert_eq!(response.is_success(), principal == customer);
        prop_assert_eq!(store.operation_calls(), usize::from(principal == customer));
        if principal != customer {
            prop_assert_eq!(
                response.error_message(),
                Some(DenialReason::OwnerMismatch.user_message())
            );
        }
    }

    /// Property: Policy requests are delegated iff the stored owner is the principal
    #[test]
    fn proptest_policy_owned_delegates_iff_owner(
        principal in arb_id(),
        owner in prop::option::of(arb_id()),
        by_number in any::<bool>()
    ) {
        let store = Arc::new(InMemoryInsurance::new());
        let policy = PolicyId::new(77).unwrap();
        if let Some(owner) = owner {
            store.insert_policy(policy, "POL-77", CustomerId::new(owner));
        }
        let catalog = catalog_over(&store);

        let response = if by_number {
            let arguments = json!({ "policyNumber": "POL-77" });
            invoke(&catalog, principal, "getPolicyByPolicyNumber", arguments)
        } else {
            invoke(&catalog, principal, "getPolicyById", json!({ "policyId": 77 }))
        };

        match owner {
            None => prop_assert_eq!(
                response.error_message(),
                Some(DenialReason::CannotResolveOwner.user_message())
            ),
            Some(owner) => prop_assert_eq!(response.is_success(), owner == principal),
        }
    }

    /// Property: Every claim family resolves through its policy exactly the same way
    #[test]
    fn proptest_claim_families_agree(
        principal in arb_id(),
        owner in arb_id(),
        (kind, name) in arb_claim_kind(),
        has_policy in any::<bool>()
    ) {
        let store = Arc::new(InMemoryInsurance::new());
        let policy = PolicyId::new(30).unwrap();
        store.insert_policy(policy, "POL-30", CustomerId::new(owner));
        let claim = ClaimId::new(9).unwrap();
        store.insert_claim(kind, claim, has_policy.then_some(policy));
        let catalog = catalog_over(&store);

        let response = invoke(&catalog, principal, name, json!({ "claimId": 9 }));

        let expected = match (has_policy, owner == principal) {
            (false, _) => Some(DenialReason::CannotResolveOwner),
            (true, true) => None,
            (true, false) => Some(DenialReason::OwnerMismatch),
        };
        prop_assert_eq!(response.error_message(), expected.map(DenialReason::user_message));
    }

    /// Property: Blocked functions never delegate, whoever asks for whatever
    #[test]
    fn proptest_blocked_never_delegates(
        principal in prop::option::of(arb_id()),
        index in any::<prop::sample::Index>()
    ) {
        let store = Arc::new(InMemoryInsurance::new());
        store.insert_customer(CustomerId::new(1).unwrap());
        let catalog = catalog_over(&store);
        let blocked: Vec<_> = catalog
            .descriptors()
            .filter(|d| d.blocked_for_ai)
            .map(|d| d.name)
            .collect();
        let name = index.get(&blocked);

        let security = match principal {
            Some(id) => signed_in(id),
            None => SecurityContext::anonymous(),
        };
        let call = ToolCall::new("req", *name, json!({ "customerId": 1 }));
        let response = catalog.invoke(&security, &call);

        prop_assert_eq!(response.error_message(), Some(DenialReason::Blocked.user_message()));
        prop_assert_eq!(store.lookup_calls(), 0);
        prop_assert_eq!(store.operation_calls(), 0);
    }

    /// Property: Numeric and string claims yield the same principal
    #[test]
    fn proptest_claim_value_forms_agree(id in 1u64..u64::MAX, padding in "[ ]{0,3}") {
        let extractor = IdentityExtractor::default();
        let numeric = signed_in(id);
        let textual = SecurityContext::oidc(
            json!({ "insurance_user_id": format!("{padding}{id}{padding}") })
                .as_object()
                .unwrap()
                .clone(),
        );

        let expected = CustomerId::new(id);
        prop_assert_eq!(extractor.current_principal(&numeric), expected);
        prop_assert_eq!(extractor.current_principal(&textual), expected);
    }

    /// Property: Non-numeric claims never authenticate
    #[test]
    fn proptest_garbage_claims_are_rejected(raw in "[a-zA-Z_-]{1,12}") {
        let security = SecurityContext::oidc(
            json!({ "insurance_user_id": raw }).as_object().unwrap().clone(),
        );
        prop_assert!(IdentityExtractor::default().current_principal(&security).is_none());
    }

    /// Property: The envelope carries exactly one of data and error message
    #[test]
    fn proptest_envelope_invariant(
        principal in arb_id(),
        customer in 0u64..8,
        name in prop_oneof![
            Just("getCustomerById"),
            Just("updateCustomer"),
            Just("deleteCustomer"),
            Just("getPoliciesByCustomerId"),
        ]
    ) {
        let store = Arc::new(InMemoryInsurance::new());
        for id in 1..4 {
            store.insert_customer(CustomerId::new(id).unwrap());
        }
        let catalog = catalog_over(&store);

        let response = invoke(
            &catalog,
            principal,
            name,
            json!({ "customerId": customer, "customerDto": {} }),
        );

        prop_assert_eq!(response.is_success(), response.data().is_some());
        prop_assert_eq!(response.is_success(), response.error_message().is_none());
    }
}
