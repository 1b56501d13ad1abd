//! Identity extraction from an explicit security context.
//!
//! The host (web layer, session store) builds a [`SecurityContext`] for each
//! request and passes it in. Nothing here reads ambient or global state.

use serde_json::{Map, Value};

use crate::config::DEFAULT_CUSTOMER_ID_CLAIM;
use crate::ids::CustomerId;

/// A verified OIDC identity token's claims.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdToken {
    claims: Map<String, Value>,
}

impl IdToken {
    /// Wraps an already verified claim set.
    pub fn new(claims: Map<String, Value>) -> Self {
        Self { claims }
    }

    /// Builds a token from a JSON object; any other JSON value yields `None`.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(claims) => Some(Self { claims }),
            _ => None,
        }
    }

    /// Looks up a claim by name.
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }

    /// The standard `sub` claim, if it is a string.
    pub fn subject(&self) -> Option<&str> {
        self.claims.get("sub").and_then(Value::as_str)
    }
}

/// Who the host authenticated.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthPrincipal {
    /// An OIDC user backed by a verified identity token
    IdToken(IdToken),
    /// Any other principal kind (API key, anonymous token, ...)
    Other {
        /// Host-specific label for the principal kind
        kind: String,
    },
}

/// The authentication attached to the current request.
#[derive(Debug, Clone, PartialEq)]
pub struct Authentication {
    authenticated: bool,
    principal: AuthPrincipal,
}

impl Authentication {
    /// Creates an authentication with an explicit state.
    pub fn new(principal: AuthPrincipal, authenticated: bool) -> Self {
        Self {
            authenticated,
            principal,
        }
    }

    /// A completed login for the given principal.
    pub fn verified(principal: AuthPrincipal) -> Self {
        Self::new(principal, true)
    }

    /// Returns whether the login completed.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Returns the authenticated principal.
    pub fn principal(&self) -> &AuthPrincipal {
        &self.principal
    }
}

/// Per-request security state handed to the guard.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SecurityContext {
    authentication: Option<Authentication>,
}

impl SecurityContext {
    /// A context with no authentication at all.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A context carrying the given authentication.
    pub fn authenticated(authentication: Authentication) -> Self {
        Self {
            authentication: Some(authentication),
        }
    }

    /// Shorthand for a verified OIDC login with the given claims.
    pub fn oidc(claims: Map<String, Value>) -> Self {
        Self::authenticated(Authentication::verified(AuthPrincipal::IdToken(
            IdToken::new(claims),
        )))
    }

    /// Returns the authentication, if any.
    pub fn authentication(&self) -> Option<&Authentication> {
        self.authentication.as_ref()
    }
}

/// Derives the caller's customer id from a [`SecurityContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityExtractor {
    claim: String,
}

impl Default for IdentityExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_CUSTOMER_ID_CLAIM)
    }
}

impl IdentityExtractor {
    /// Creates an extractor reading the given custom claim.
    pub fn new(claim: impl Into<String>) -> Self {
        Self {
            claim: claim.into(),
        }
    }

    /// Returns the claim name this extractor reads.
    pub fn claim(&self) -> &str {
        &self.claim
    }

    /// Returns the authenticated customer id, or `None` when there is none.
    ///
    /// Absence covers every failure: no authentication, an unfinished login,
    /// a non-OIDC principal, a missing claim, or a claim that is not a
    /// positive integer (numbers are tried first, then strings).
    pub fn current_principal(&self, security: &SecurityContext) -> Option<CustomerId> {
        let Some(authentication) = security.authentication() else {
            tracing::warn!("no authentication present");
            return None;
        };

        if !authentication.is_authenticated() {
            tracing::warn!("authentication is not in an authenticated state");
            return None;
        }

        let token = match authentication.principal() {
            AuthPrincipal::IdToken(token) => token,
            AuthPrincipal::Other { kind } => {
                tracing::warn!(principal_kind = %kind, "principal is not an identity token");
                return None;
            }
        };

        let Some(value) = token.claim(&self.claim) else {
            tracing::warn!(claim = %self.claim, "customer id claim not found in identity token");
            return None;
        };

        let parsed = parse_customer_id(value);
        if parsed.is_none() {
            tracing::warn!(claim = %self.claim, "customer id claim is not a positive integer");
        }
        parsed
    }
}

fn parse_customer_id(value: &Value) -> Option<CustomerId> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().and_then(whole))
            .and_then(CustomerId::new),
        Value::String(s) => s.trim().parse::<u64>().ok().and_then(CustomerId::new),
        _ => None,
    }
}

// Some identity providers serialize integer claims as `5.0`.
fn whole(f: f64) -> Option<u64> {
    // `u64::MAX as f64` rounds up to 2^64, one past the range.
    (f.is_finite() && f.fract() == 0.0 && f >= 0.0 && f < u64::MAX as f64).then(|| f as u64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn claims(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("claims must be an object"),
        }
    }

    #[test]
    fn numeric_claim_is_extracted() {
        let ctx = SecurityContext::oidc(claims(json!({ "insurance_user_id": 17 })));
        let id = IdentityExtractor::default().current_principal(&ctx);
        assert_eq!(id.map(CustomerId::get), Some(17));
    }

    #[test]
    fn whole_float_claim_is_extracted() {
        let ctx = SecurityContext::oidc(claims(json!({ "insurance_user_id": 5.0 })));
        let id = IdentityExtractor::default().current_principal(&ctx);
        assert_eq!(id.map(CustomerId::get), Some(5));
    }

    #[test]
    fn string_claim_is_parsed() {
        let ctx = SecurityContext::oidc(claims(json!({ "insurance_user_id": " 23 " })));
        let id = IdentityExtractor::default().current_principal(&ctx);
        assert_eq!(id.map(CustomerId::get), Some(23));
    }

    #[test]
    fn anonymous_context_has_no_principal() {
        let ctx = SecurityContext::anonymous();
        assert!(IdentityExtractor::default().current_principal(&ctx).is_none());
    }

    #[test]
    fn unfinished_login_has_no_principal() {
        let token = IdToken::new(claims(json!({ "insurance_user_id": 1 })));
        let ctx = SecurityContext::authenticated(Authentication::new(
            AuthPrincipal::IdToken(token),
            false,
        ));
        assert!(IdentityExtractor::default().current_principal(&ctx).is_none());
    }

    #[test]
    fn non_oidc_principal_has_no_principal() {
        let ctx = SecurityContext::authenticated(Authentication::verified(AuthPrincipal::Other {
            kind: "api-key".to_string(),
        }));
        assert!(IdentityExtractor::default().current_principal(&ctx).is_none());
    }

    #[test]
    fn missing_or_malformed_claim_has_no_principal() {
        let extractor = IdentityExtractor::default();
        for value in [
            json!({ "sub": "alice" }),
            json!({ "insurance_user_id": "abc" }),
            json!({ "insurance_user_id": 0 }),
            json!({ "insurance_user_id": -4 }),
            json!({ "insurance_user_id": 1.5 }),
            json!({ "insurance_user_id": -4.0 }),
            json!({ "insurance_user_id": 1e30 }),
            json!({ "insurance_user_id": true }),
            json!({ "insurance_user_id": [1] }),
            json!({ "insurance_user_id": null }),
        ] {
            let ctx = SecurityContext::oidc(claims(value.clone()));
            assert!(
                extractor.current_principal(&ctx).is_none(),
                "expected no principal for {}",
                value
            );
        }
    }

    #[test]
    fn custom_claim_name() {
        let ctx = SecurityContext::oidc(claims(json!({
            "customer_no": 5,
            "insurance_user_id": 9
        })));
        let id = IdentityExtractor::new("customer_no").current_principal(&ctx);
        assert_eq!(id.map(CustomerId::get), Some(5));
    }

    #[test]
    fn id_token_from_value() {
        assert!(IdToken::from_value(json!("not an object")).is_none());
        let token = IdToken::from_value(json!({ "sub": "alice" })).unwrap();
        assert_eq!(token.subject(), Some("alice"));
    }
}
