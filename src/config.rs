//! Guard configuration.
//!
//! Values come from a key/value map, usually the process environment.

use std::collections::HashMap;
use std::fmt;

/// Environment key naming the identity-token claim that carries the customer id.
pub const CUSTOMER_ID_CLAIM_KEY: &str = "OWNERSHIP_GUARD_CUSTOMER_ID_CLAIM";
/// Environment key toggling the in-memory decision audit trail.
pub const AUDIT_KEY: &str = "OWNERSHIP_GUARD_AUDIT";

/// Claim used when none is configured.
pub const DEFAULT_CUSTOMER_ID_CLAIM: &str = "insurance_user_id";

/// Settings for [`Guard`](crate::Guard).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Name of the custom identity-token claim holding the customer id
    pub customer_id_claim: String,
    /// Whether decisions are also recorded into an [`AuditTrail`](crate::audit::AuditTrail)
    pub audit_enabled: bool,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            customer_id_claim: DEFAULT_CUSTOMER_ID_CLAIM.to_string(),
            audit_enabled: false,
        }
    }
}

/// A configuration value that could not be used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    /// The offending key
    pub key: &'static str,
    /// What was wrong with it
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl GuardConfig {
    /// Loads configuration from the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::from_kv(&vars)
    }

    /// Builds configuration from a key/value map, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the claim name is blank or the audit flag is
    /// not a recognized boolean.
    pub fn from_kv(kv: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(claim) = kv.get(CUSTOMER_ID_CLAIM_KEY) {
            let claim = claim.trim();
            if claim.is_empty() {
                return Err(ConfigError {
                    key: CUSTOMER_ID_CLAIM_KEY,
                    message: "claim name must be non-empty".to_string(),
                });
            }
            config.customer_id_claim = claim.to_string();
        }

        if let Some(flag) = kv.get(AUDIT_KEY) {
            config.audit_enabled = parse_bool(AUDIT_KEY, flag)?;
        }

        Ok(config)
    }
}

fn parse_bool(key: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError {
            key,
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}
