//! Customer functions.

use std::sync::Arc;

use serde::Deserialize;

use super::{secured, DeletionConfirmation};
use crate::catalog::{CatalogBuilder, FunctionDescriptor};
use crate::client::{CustomerRecord, InsuranceClient};
use crate::ids::{CustomerId, PolicyNumber};
use crate::middleware::Guard;
use crate::shape::{Classification, Classify};

/// `getCustomerById`
pub const GET_CUSTOMER_BY_ID: FunctionDescriptor = FunctionDescriptor::new(
    "getCustomerById",
    "Retrieves the signed-in customer's profile by customer id: name, contact details and \
     address. Use it when the customer asks about their own account details.",
);

/// `createCustomer`
pub const CREATE_CUSTOMER: FunctionDescriptor = FunctionDescriptor::new(
    "createCustomer",
    "Registers a new customer. Only available to customer service.",
)
.blocked();

/// `updateCustomer`
pub const UPDATE_CUSTOMER: FunctionDescriptor = FunctionDescriptor::new(
    "updateCustomer",
    "Updates the signed-in customer's profile, for example a new address or phone number. \
     Requires customerId and the complete updated customerDto.",
);

/// `deleteCustomer`
pub const DELETE_CUSTOMER: FunctionDescriptor = FunctionDescriptor::new(
    "deleteCustomer",
    "Deletes a customer account. Only available to customer service.",
)
.blocked();

/// `getCustomerByPolicyNumber`
pub const GET_CUSTOMER_BY_POLICY_NUMBER: FunctionDescriptor = FunctionDescriptor::new(
    "getCustomerByPolicyNumber",
    "Finds the customer holding a policy number such as POL-12345. Use it when the customer \
     identifies themselves through a policy number.",
);

/// `getPoliciesByCustomerId`
pub const GET_POLICIES_BY_CUSTOMER_ID: FunctionDescriptor = FunctionDescriptor::new(
    "getPoliciesByCustomerId",
    "Lists every policy the signed-in customer holds. Use it to answer 'what policies do I \
     have' or before working on a specific policy.",
);

/// A request naming one customer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByCustomerId {
    /// The customer
    pub customer_id: CustomerId,
}

impl Classify for ByCustomerId {
    fn classify(&self) -> Classification {
        Classification::customer(Some(self.customer_id))
    }
}

/// Registration of a new customer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomer {
    /// The customer to create
    #[serde(alias = "customer")]
    pub customer_dto: CustomerRecord,
}

impl Classify for CreateCustomer {
    // A customer that does not exist yet has no owner to compare with.
    fn classify(&self) -> Classification {
        Classification::Unknown
    }
}

/// Replacement of a customer's profile.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomer {
    /// The customer to update
    pub customer_id: CustomerId,
    /// New profile data
    #[serde(alias = "customer")]
    pub customer_dto: CustomerRecord,
}

impl Classify for UpdateCustomer {
    fn classify(&self) -> Classification {
        Classification::customer(Some(self.customer_id))
    }
}

/// Lookup of a customer through a policy number.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ByPolicyNumber {
    /// The policy number
    pub policy_number: PolicyNumber,
}

impl Classify for ByPolicyNumber {
    fn classify(&self) -> Classification {
        Classification::policy_number(&self.policy_number)
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
    builder
        .register(secured(GET_CUSTOMER_BY_ID, client, guard, |_, client: &C, req: ByCustomerId| {
            client.get_customer_by_id(req.customer_id)
        }))
        .register(secured(CREATE_CUSTOMER, client, guard, |_, client: &C, req: CreateCustomer| {
            client.create_customer(req.customer_dto)
        }))
        .register(secured(UPDATE_CUSTOMER, client, guard, |ctx, client: &C, req: UpdateCustomer| {
            ctx.log().info(format_args!("updating customer profile"));
            client.update_customer(req.customer_id, req.customer_dto)
        }))
        .register(secured(DELETE_CUSTOMER, client, guard, |_, client: &C, req: ByCustomerId| {
            client
                .delete_customer(req.customer_id)
                .map(|()| DeletionConfirmation::new("Customer deleted successfully."))
        }))
        .register(secured(
            GET_CUSTOMER_BY_POLICY_NUMBER,
            client,
            guard,
            |_, client: &C, req: ByPolicyNumber| {
                client.get_customer_by_policy_number(&req.policy_number)
            },
        ))
        .register(secured(
            GET_POLICIES_BY_CUSTOMER_ID,
            client,
            guard,
            |_, client: &C, req: ByCustomerId| client.get_policies_by_customer_id(req.customer_id),
        ))
}
