use std::sync::Arc;

use ownership_guard::memory::InMemoryInsurance;
use ownership_guard::{
    functions, AiFunction, ApiError, Catalog, CatalogError, Classification, Classify, Ctx,
    CustomerId, DenialReason, FunctionDescriptor, Guard, GuardConfig, InsuranceClient,
    OwnerVerified, SecuredFunction, SecurityContext, ToolCall,
};
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Greeting {
    customer_id: CustomerId,
}

impl Classify for Greeting {
    fn classify(&self) -> Classification {
        Classification::customer(Some(self.customer_id))
    }
}

const GREET: FunctionDescriptor =
    FunctionDescriptor::new("greetCustomer", "Greets the signed-in customer by id.");

fn greeter(store: Arc<InMemoryInsurance>, guard: Arc<Guard>) -> Box<dyn AiFunction> {
    Box::new(SecuredFunction::new(
        GREET,
        store,
        guard,
        |ctx: &Ctx<OwnerVerified>, _: &InMemoryInsurance, req: Greeting| {
            Ok::<_, ApiError>(format!("hello {} ({})", req.customer_id, ctx.request_id()))
        },
    ))
}

#[test]
fn full_catalog_is_symmetric_with_advertised_names() {
    let catalog = functions::catalog(
        Arc::new(InMemoryInsurance::new()),
        Arc::new(Guard::default()),
    )
    .unwrap();

    assert!(catalog.verify_advertised(functions::ADVERTISED).is_ok());
    for name in functions::ADVERTISED {
        let descriptor = catalog.descriptor(name).unwrap();
        assert!(!descriptor.description.trim().is_empty(), "{name}");
    }
}

#[test]
fn catalog_works_over_a_trait_object_client() {
    let store = Arc::new(InMemoryInsurance::new());
    store.insert_customer(CustomerId::new(4).unwrap());
    let client: Arc<dyn InsuranceClient + Send + Sync> = store;

    let catalog = functions::catalog(client, Arc::new(Guard::default())).unwrap();
    let security = SecurityContext::oidc(
        json!({ "insurance_user_id": 4 }).as_object().unwrap().clone(),
    );
    let response = catalog.invoke(
        &security,
        &ToolCall::new("req-dyn", "getCustomerById", json!({ "customerId": 4 })),
    );
    assert!(response.is_success());
}

#[test]
fn extra_function_must_be_advertised() {
    let store = Arc::new(InMemoryInsurance::new());
    let guard = Arc::new(Guard::default());
    let catalog =
        functions::register_all(Catalog::builder(), Arc::clone(&store), Arc::clone(&guard))
            .register(greeter(store, guard))
            .build()
            .unwrap();

    assert_eq!(
        catalog.verify_advertised(functions::ADVERTISED),
        Err(CatalogError::NotAdvertised("greetCustomer"))
    );

    let mut advertised = functions::ADVERTISED.to_vec();
    advertised.push("greetCustomer");
    assert!(catalog.verify_advertised(&advertised).is_ok());
}

#[test]
fn registering_a_name_twice_fails() {
    let store = Arc::new(InMemoryInsurance::new());
    let guard = Arc::new(Guard::default());
    let err = Catalog::builder()
        .register(greeter(Arc::clone(&store), Arc::clone(&guard)))
        .register(greeter(store, guard))
        .build()
        .unwrap_err();

    assert_eq!(err, CatalogError::DuplicateName("greetCustomer"));
}

#[test]
fn custom_function_goes_through_the_guard() {
    let store = Arc::new(InMemoryInsurance::new());
    let guard = Arc::new(Guard::default());
    let catalog = Catalog::builder()
        .register(greeter(store, guard))
        .build()
        .unwrap();
    let security = SecurityContext::oidc(
        json!({ "insurance_user_id": "8" }).as_object().unwrap().clone(),
    );

    let own = catalog.invoke(
        &security,
        &ToolCall::new("req-8", "greetCustomer", json!({ "customerId": 8 })),
    );
    assert_eq!(own.data(), Some(&json!("hello 8 (req-8)")));

    let other = catalog.invoke(
        &security,
        &ToolCall::new("req-9", "greetCustomer", json!({ "customerId": 9 })),
    );
    assert_eq!(
        other.error_message(),
        Some(DenialReason::OwnerMismatch.user_message())
    );
}

#[test]
fn configured_claim_name_is_honored() {
    let mut kv = std::collections::HashMap::new();
    kv.insert(
        "OWNERSHIP_GUARD_CUSTOMER_ID_CLAIM".to_string(),
        "customer_number".to_string(),
    );
    kv.insert("OWNERSHIP_GUARD_AUDIT".to_string(), "true".to_string());
    let config = GuardConfig::from_kv(&kv).unwrap();
    let guard = Arc::new(Guard::from_config(&config));
    let trail = Arc::clone(guard.audit_trail().unwrap());

    let store = Arc::new(InMemoryInsurance::new());
    store.insert_customer(CustomerId::new(6).unwrap());
    let catalog = functions::catalog(store, guard).unwrap();

    let default_claim = SecurityContext::oidc(
        json!({ "insurance_user_id": 6 }).as_object().unwrap().clone(),
    );
    let configured_claim = SecurityContext::oidc(
        json!({ "customer_number": 6 }).as_object().unwrap().clone(),
    );
    let call = ToolCall::new("req-cfg", "getCustomerById", json!({ "customerId": 6 }));

    assert_eq!(
        catalog.invoke(&default_claim, &call).error_message(),
        Some(DenialReason::NotAuthenticated.user_message())
    );
    assert!(catalog.invoke(&configured_claim, &call).is_success());
    assert_eq!(trail.len(), 2);
}
