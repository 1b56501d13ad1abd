//! Strongly typed identifiers for customers, policies and claims.
//!
//! Upstream identifiers are positive integers. Zero is never a valid id, so
//! the numeric ids wrap [`NonZeroU64`] and refuse to deserialize from `0`.

use std::fmt;
use std::num::NonZeroU64;

use serde::{Deserialize, Serialize};

/// Error returned when a raw value cannot become an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidId {
    kind: &'static str,
}

impl fmt::Display for InvalidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}", self.kind)
    }
}

impl std::error::Error for InvalidId {}

macro_rules! positive_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "u64", into = "u64")]
        pub struct $name(NonZeroU64);

        impl $name {
            /// Creates an id, returning `None` for zero.
            pub fn new(raw: u64) -> Option<Self> {
                NonZeroU64::new(raw).map(Self)
            }

            /// Returns the raw numeric value.
            pub fn get(self) -> u64 {
                self.0.get()
            }
        }

        impl From<NonZeroU64> for $name {
            fn from(raw: NonZeroU64) -> Self {
                Self(raw)
            }
        }

        impl TryFrom<u64> for $name {
            type Error = InvalidId;

            fn try_from(raw: u64) -> Result<Self, Self::Error> {
                Self::new(raw).ok_or(InvalidId { kind: $label })
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> u64 {
                id.get()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

positive_id!(
    /// Technical id of an insurance customer.
    CustomerId,
    "customer id"
);
positive_id!(
    /// Technical id of a policy.
    PolicyId,
    "policy id"
);
positive_id!(
    /// Technical id of a claim. Claim ids are only unique within a [`ClaimKind`].
    ClaimId,
    "claim id"
);

/// Human-readable policy number such as `POL-12345`.
///
/// Always trimmed and non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PolicyNumber(String);

impl PolicyNumber {
    /// Creates a policy number, returning `None` if it is blank.
    pub fn new(raw: impl AsRef<str>) -> Option<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Returns the policy number text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for PolicyNumber {
    type Error = InvalidId;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::new(raw).ok_or(InvalidId {
            kind: "policy number",
        })
    }
}

impl From<PolicyNumber> for String {
    fn from(number: PolicyNumber) -> String {
        number.0
    }
}

impl fmt::Display for PolicyNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The three claim families the insurance service keeps apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimKind {
    /// Vehicle claims.
    Auto,
    /// Property claims.
    Home,
    /// Medical expense claims.
    Health,
}

impl ClaimKind {
    /// All claim kinds, in a stable order.
    pub const ALL: [ClaimKind; 3] = [ClaimKind::Auto, ClaimKind::Home, ClaimKind::Health];

    /// Parses the spellings used on the wire.
    ///
    /// Accepts the short names (`auto`, `home`, `health`, any case) and the
    /// upstream discriminators (`AutoClaimDto`, `HomeClaimDto`, `HealthClaimDto`).
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        let short = raw
            .strip_suffix("ClaimDto")
            .or_else(|| raw.strip_suffix("Claim"))
            .unwrap_or(raw);

        match short.to_ascii_lowercase().as_str() {
            "auto" => Some(ClaimKind::Auto),
            "home" => Some(ClaimKind::Home),
            "health" => Some(ClaimKind::Health),
            _ => None,
        }
    }

    /// Capitalized label used in user-facing text.
    pub fn label(self) -> &'static str {
        match self {
            ClaimKind::Auto => "Auto",
            ClaimKind::Home => "Home",
            ClaimKind::Health => "Health",
        }
    }
}

impl fmt::Display for ClaimKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClaimKind::Auto => write!(f, "auto"),
            ClaimKind::Home => write!(f, "home"),
            ClaimKind::Health => write!(f, "health"),
        }
    }
}
