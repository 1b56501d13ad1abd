//! The registry of functions the assistant may call.

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;
use serde_json::Value;

use crate::error::CatalogError;
use crate::identity::SecurityContext;
use crate::middleware::AiFunction;
use crate::response::Response;

/// Message returned for a call to a name the catalog does not hold.
pub const UNKNOWN_FUNCTION_MESSAGE: &str = "Unknown function";

/// Static metadata of one AI function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionDescriptor {
    /// Name the assistant calls the function by
    pub name: &'static str,
    /// Purpose shown to the assistant
    pub description: &'static str,
    /// Refuse every call without looking at caller or request
    pub blocked_for_ai: bool,
}

impl FunctionDescriptor {
    /// Creates a descriptor for a callable function.
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            blocked_for_ai: false,
        }
    }

    /// Marks the function as never reachable from the assistant.
    pub const fn blocked(mut self) -> Self {
        self.blocked_for_ai = true;
        self
    }
}

/// One call requested by the model.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCall {
    /// Correlation id for logs and audit events
    pub request_id: String,
    /// Name of the function to invoke
    pub name: String,
    /// The single request value, as JSON
    #[serde(default)]
    pub arguments: Value,
}

impl ToolCall {
    /// Creates a call.
    pub fn new(request_id: impl Into<String>, name: impl Into<String>, arguments: Value) -> Self {
        Self {
            request_id: request_id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Collects functions before the catalog is sealed.
#[derive(Default)]
pub struct CatalogBuilder {
    functions: Vec<Box<dyn AiFunction>>,
}

impl CatalogBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a function.
    pub fn register(mut self, function: Box<dyn AiFunction>) -> Self {
        self.functions.push(function);
        self
    }

    /// Seals the catalog.
    ///
    /// # Errors
    ///
    /// Fails on a blank name, a blank description, or a name registered twice.
    pub fn build(self) -> Result<Catalog, CatalogError> {
        let mut functions = BTreeMap::new();
        for function in self.functions {
            let descriptor = *function.descriptor();
            if descriptor.name.trim().is_empty() {
                return Err(CatalogError::EmptyName);
            }
            if descriptor.description.trim().is_empty() {
                return Err(CatalogError::MissingDescription(descriptor.name));
            }
            if functions.insert(descriptor.name, function).is_some() {
                return Err(CatalogError::DuplicateName(descriptor.name));
            }
        }
        tracing::debug!(functions = functions.len(), "function catalog built");
        Ok(Catalog { functions })
    }
}

/// The immutable set of secured functions, keyed by name.
pub struct Catalog {
    functions: BTreeMap<&'static str, Box<dyn AiFunction>>,
}

impl Catalog {
    /// Starts a new catalog.
    pub fn builder() -> CatalogBuilder {
        CatalogBuilder::new()
    }

    /// Returns every function name, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.functions.keys().copied().collect()
    }

    /// Returns the number of functions.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Returns true if the catalog holds no function.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Returns the descriptor of the named function.
    pub fn descriptor(&self, name: &str) -> Option<&FunctionDescriptor> {
        self.functions.get(name).map(|f| f.descriptor())
    }

    /// Returns every descriptor, sorted by name.
    pub fn descriptors(&self) -> impl Iterator<Item = &FunctionDescriptor> + '_ {
        self.functions.values().map(|f| f.descriptor())
    }

    /// Checks that `advertised` names exactly the registered functions.
    ///
    /// # Errors
    ///
    /// Returns the first registered name missing from `advertised`, or else
    /// the first advertised name with no function behind it.
    pub fn verify_advertised(&self, advertised: &[&str]) -> Result<(), CatalogError> {
        let advertised: BTreeSet<&str> = advertised.iter().copied().collect();

        if let Some(name) = self.functions.keys().find(|name| !advertised.contains(**name)) {
            return Err(CatalogError::NotAdvertised(*name));
        }
        if let Some(name) = advertised.iter().find(|name| !self.functions.contains_key(**name)) {
            return Err(CatalogError::NotRegistered(name.to_string()));
        }
        Ok(())
    }

    /// Dispatches a model call to its secured function.
    pub fn invoke(&self, security: &SecurityContext, call: &ToolCall) -> Response<Value> {
        match self.functions.get(call.name.as_str()) {
            Some(function) => {
                function.call_json(security, &call.request_id, call.arguments.clone())
            }
            None => {
                tracing::warn!(
                    request_id = %call.request_id,
                    function = %call.name,
                    "unknown function called"
                );
                Response::failure(UNKNOWN_FUNCTION_MESSAGE)
            }
        }
    }
}

impl std::fmt::Debug for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Catalog")
            .field("functions", &self.names())
            .finish()
    }
}
