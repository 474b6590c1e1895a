//! Request-scoped authenticated identity.

use serde::{Deserialize, Serialize};

use crate::directory::Account;
use crate::types::{AccountId, AccountName, EmailAddress};

/// How the account bound to a request was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// Existing account, nothing written
    Existing,
    /// Existing account whose email was overwritten with the claim
    EmailUpdated,
    /// Account created on first sight of the subject id
    Provisioned,
}

impl Resolution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Existing => "existing",
            Self::EmailUpdated => "email_updated",
            Self::Provisioned => "provisioned",
        }
    }
}

/// Identity bound to a request after SSO resolution.
///
/// Inserted into the request extensions by the identify middleware. It is
/// immutable once created and lives only as long as the request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SsoIdentity {
    account: Account,
    resolution: Resolution,
    /// Client IP address (for diagnostics)
    ip_address: Option<String>,
    /// Client user agent (for diagnostics)
    user_agent: Option<String>,
}

impl SsoIdentity {
    /// Create a new identity for a resolved account.
    pub fn new(account: Account, resolution: Resolution) -> Self {
        Self {
            account,
            resolution,
            ip_address: None,
            user_agent: None,
        }
    }

    /// Set client metadata.
    pub fn with_client_info(
        mut self,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    /// The authenticated user name bound to the request.
    pub fn user(&self) -> &AccountName {
        &self.account.name
    }

    pub fn account_id(&self) -> &AccountId {
        &self.account.id
    }

    pub fn email(&self) -> &EmailAddress {
        &self.account.email
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn ip_address(&self) -> Option<&str> {
        self.ip_address.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.user_agent.as_deref()
    }
}
