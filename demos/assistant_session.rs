//! Assistant session demonstration.
//!
//! This example replays the function calls an assistant might make for one
//! signed-in customer:
//! 1. Read the customer's own data
//! 2. Try to read another customer's data
//! 3. Touch a claim through its policy
//! 4. Call functions that are blocked for the assistant
//!
//! Run with: `cargo run --example assistant_session`

use std::sync::Arc;

use ownership_guard::memory::InMemoryInsurance;
use ownership_guard::{
    functions, ClaimId, ClaimKind, CustomerId, Guard, GuardConfig, PolicyId, SecurityContext,
    ToolCall,
};
use serde_json::json;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    println!("=== Assistant Session Example ===\n");

    let store = Arc::new(InMemoryInsurance::new());
    let alice = CustomerId::new(1).ok_or("invalid id")?;
    let bob = CustomerId::new(2).ok_or("invalid id")?;
    let alice_policy = PolicyId::new(10).ok_or("invalid id")?;
    let bob_policy = PolicyId::new(20).ok_or("invalid id")?;
    store.insert_customer(alice);
    store.insert_customer(bob);
    store.insert_policy(alice_policy, "POL-10", Some(alice));
    store.insert_policy(bob_policy, "POL-20", Some(bob));
    let alice_claim = ClaimId::new(5).ok_or("invalid id")?;
    let bob_claim = ClaimId::new(99).ok_or("invalid id")?;
    store.insert_claim(ClaimKind::Auto, alice_claim, Some(alice_policy));
    store.insert_claim(ClaimKind::Auto, bob_claim, Some(bob_policy));

    let mut config = GuardConfig::load()?;
    config.audit_enabled = true;
    let guard = Arc::new(Guard::from_config(&config));
    let trail = guard.audit_trail().cloned().ok_or("audit trail missing")?;
    let catalog = functions::catalog(Arc::clone(&store), guard)?;
    println!("Catalog holds {} functions\n", catalog.len());

    let mut claims = serde_json::Map::new();
    claims.insert(config.customer_id_claim.clone(), json!(1));
    let security = SecurityContext::oidc(claims);

    let calls = [
        ("--- Scenario 1: Own data ---", "getCustomerById", json!({ "customerId": 1 })),
        ("", "getPoliciesByCustomerId", json!({ "customerId": 1 })),
        (
            "--- Scenario 2: Another customer's data ---",
            "getCustomerById",
            json!({ "customerId": 2 }),
        ),
        ("", "getPolicyByPolicyNumber", json!({ "policyNumber": "POL-20" })),
        (
            "--- Scenario 3: Claims ---",
            "updateAutoClaim",
            json!({ "claimId": 5, "autoClaimDto": { "description": "rear bumper" } }),
        ),
        (
            "",
            "updateAutoClaim",
            json!({ "claimId": 99, "autoClaimDto": { "description": "rear bumper" } }),
        ),
        ("", "getAutoClaimById", json!({ "claimId": 404 })),
        ("--- Scenario 4: Blocked functions ---", "deleteCustomer", json!({ "customerId": 1 })),
        ("", "getAllPolicies", json!({})),
        ("", "updatePolicyConditions", json!({ "policyConditionsDto": {} })),
    ];

    for (index, (heading, name, arguments)) in calls.into_iter().enumerate() {
        if !heading.is_empty() {
            println!("\n{}", heading);
        }
        let call = ToolCall::new(format!("req-{:03}", index), name, arguments);
        let response = catalog.invoke(&security, &call);
        println!("{} -> {}", name, serde_json::to_string(&response)?);
    }

    println!("\n--- Audit trail ---");
    for event in trail.events() {
        println!("{}", event);
    }

    Ok(())
}
