use std::fmt;

use crate::config::ConfigError;

/// Errors that can occur while setting up or running the guard.
///
/// Per-invocation denials are values returned to the assistant inside a
/// [`Response`](crate::Response); this type only exists so callers that
/// prefer `?` can lift a denial or a startup fault into one error.
#[derive(Debug)]
pub enum Error {
    /// An invocation was refused
    Denied(Denial),
    /// The function catalog could not be built
    Catalog(CatalogError),
    /// Configuration could not be loaded
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Denied(d) => write!(f, "Invocation denied: {}", d),
            Error::Catalog(e) => write!(f, "Catalog error: {}", e),
            Error::Config(e) => write!(f, "Configuration error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Denied(d) => Some(d),
            Error::Catalog(e) => Some(e),
            Error::Config(e) => Some(e),
        }
    }
}

impl From<Denial> for Error {
    fn from(d: Denial) -> Self {
        Error::Denied(d)
    }
}

impl From<CatalogError> for Error {
    fn from(e: CatalogError) -> Self {
        Error::Catalog(e)
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

/// Why an AI invocation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DenialReason {
    /// The function is never reachable from the assistant
    Blocked,
    /// No usable customer identity in the security context
    NotAuthenticated,
    /// The request could not be classified or its owner could not be found
    CannotResolveOwner,
    /// The resource belongs to a different customer
    OwnerMismatch,
}

impl DenialReason {
    /// The fixed message relayed to the assistant for this reason.
    ///
    /// Messages never carry identifiers of the refused resource.
    pub fn user_message(self) -> &'static str {
        match self {
            DenialReason::Blocked => {
                "This operation is not available through the AI assistant for security reasons. \
                 Please contact customer service for assistance."
            }
            DenialReason::NotAuthenticated => "User is not authenticated",
            DenialReason::CannotResolveOwner => {
                "The request could not be matched to an owner or the requested resource was \
                 not found. Request could not be processed."
            }
            DenialReason::OwnerMismatch => {
                "Access denied. You can only access your own data. \
                 If you believe this is an error, please contact customer service."
            }
        }
    }

    /// Short machine-readable code used in logs and audit events.
    pub fn code(self) -> &'static str {
        match self {
            DenialReason::Blocked => "blocked",
            DenialReason::NotAuthenticated => "not_authenticated",
            DenialReason::CannotResolveOwner => "cannot_resolve_owner",
            DenialReason::OwnerMismatch => "owner_mismatch",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// A refused invocation of a catalog function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    /// Why the invocation was refused
    pub reason: DenialReason,
    /// Name of the function that was invoked
    pub function: &'static str,
}

impl Denial {
    /// Creates a new denial.
    pub fn new(function: &'static str, reason: DenialReason) -> Self {
        Self { reason, function }
    }

    /// The message relayed to the assistant.
    pub fn user_message(&self) -> &'static str {
        self.reason.user_message()
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} denied: {}", self.function, self.reason)
    }
}

impl std::error::Error for Denial {}

/// Faults detected while building the function catalog.
///
/// These are startup errors; a process must not serve invocations from a
/// catalog that failed to build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Two functions share the same name
    DuplicateName(&'static str),
    /// A function was registered with a blank name
    EmptyName,
    /// A function has no description for the assistant
    MissingDescription(&'static str),
    /// A registered function is missing from the advertised set
    NotAdvertised(&'static str),
    /// An advertised name has no registered function
    NotRegistered(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::DuplicateName(name) => write!(f, "duplicate function name '{}'", name),
            CatalogError::EmptyName => write!(f, "function registered without a name"),
            CatalogError::MissingDescription(name) => {
                write!(f, "function '{}' has no description", name)
            }
            CatalogError::NotAdvertised(name) => {
                write!(f, "function '{}' is registered but not advertised", name)
            }
            CatalogError::NotRegistered(name) => {
                write!(f, "function '{}' is advertised but not registered", name)
            }
        }
    }
}

impl std::error::Error for CatalogError {}
