//! NewType wrappers for strong typing of identity values.
//!
//! These types prevent accidental mixing of semantically different strings
//! (e.g., passing an email claim where a subject id is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(
    /// Subject id asserted by the upstream identity gateway.
    ///
    /// This is the stable primary id of a local account. It is stored
    /// lower-cased and is distinct from the SurrealDB record id.
    AccountId
);

newtype_string!(
    /// Account name, bound as the authenticated user of a request.
    ///
    /// Unique across the directory.
    AccountName
);

newtype_string!(
    /// Email address of an account.
    ///
    /// The upstream gateway is the system of record for this value; local
    /// copies are overwritten whenever the claim drifts.
    EmailAddress
);

newtype_string!(
    /// SHA-256 hex digest of an account credential.
    ///
    /// Accounts provisioned through SSO never authenticate with a password,
    /// but the directory requires a non-empty credential.
    PasswordHash
);

impl EmailAddress {
    /// Check whether this address belongs to `domain`.
    ///
    /// The comparison is case-insensitive and a leading `@` on `domain` is
    /// ignored.
    pub fn is_in_domain(&self, domain: &str) -> bool {
        let domain = domain.trim().trim_start_matches('@');
        match self.0.rsplit_once('@') {
            Some((local, host)) => !local.is_empty() && host.eq_ignore_ascii_case(domain),
            None => false,
        }
    }
}
