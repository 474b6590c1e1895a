//! Header-based SSO identity resolution.

use std::fmt;
use std::sync::Arc;

use http::HeaderMap;
use sha2::{Digest, Sha256};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::auth::claim::IdentityClaim;
use crate::auth::context::{Resolution, SsoIdentity};
use crate::config::SsoConfig;
use crate::directory::{AccountDirectory, DirectoryError, NewAccount};
use crate::types::{AccountId, EmailAddress, PasswordHash};

/// Identification errors.
#[derive(Debug, Clone)]
pub enum IdentifyError {
    /// The subject id header was sent but a companion header was not
    MissingHeader(String),
    /// Header value is empty or not valid UTF-8
    InvalidHeader(String),
    /// Email claim is outside the configured domain
    EmailDomainRejected { email: EmailAddress, domain: String },
    /// New subject id whose email already belongs to another account
    DuplicateEmail {
        email: EmailAddress,
        existing: AccountId,
    },
    /// Directory failure, including inconsistent directory data
    Directory(DirectoryError),
}

impl fmt::Display for IdentifyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHeader(name) => write!(f, "Missing SSO header: {}", name),
            Self::InvalidHeader(name) => write!(f, "Invalid SSO header: {}", name),
            Self::EmailDomainRejected { email, domain } => {
                write!(f, "Email {} is not in the {} domain", email, domain)
            }
            Self::DuplicateEmail { email, existing } => write!(
                f,
                "Email {} is already used by account {}",
                email, existing
            ),
            Self::Directory(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for IdentifyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Directory(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DirectoryError> for IdentifyError {
    fn from(err: DirectoryError) -> Self {
        Self::Directory(err)
    }
}

/// Maps trusted SSO headers onto local accounts.
///
/// The headers are accepted without verification. This is only safe behind a
/// reverse proxy that strips or overwrites the configured headers on every
/// request arriving from the public network.
pub struct IdentityResolver<D> {
    config: Arc<SsoConfig>,
    directory: D,
}

impl<D: AccountDirectory> IdentityResolver<D> {
    /// Create a new resolver.
    pub fn new(config: SsoConfig, directory: D) -> Self {
        Self {
            config: Arc::new(config),
            directory,
        }
    }

    pub fn config(&self) -> &SsoConfig {
        &self.config
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Identify the user behind a request.
    ///
    /// Returns `Ok(None)` when the subject id header is absent, leaving the
    /// request unauthenticated.
    pub async fn identify(&self, headers: &HeaderMap) -> Result<Option<SsoIdentity>, IdentifyError> {
        debug!(header = %self.config.header_parameter, "Checking for SSO header");

        let Some(claim) = IdentityClaim::from_headers(headers, &self.config)? else {
            return Ok(None);
        };

        debug!(subject_id = %claim.subject_id, "SSO header present");
        self.resolve(claim).await.map(Some)
    }

    /// Resolve a claim to an account, reconciling the email or provisioning
    /// a new account as needed.
    pub async fn resolve(&self, claim: IdentityClaim) -> Result<SsoIdentity, IdentifyError> {
        if let Some(domain) = &self.config.email_domain
            && !claim.email.is_in_domain(domain)
        {
            return Err(IdentifyError::EmailDomainRejected {
                email: claim.email,
                domain: domain.clone(),
            });
        }

        if let Some(account) = self.directory.get_by_id(&claim.subject_id).await? {
            if account.email == claim.email {
                return Ok(SsoIdentity::new(account, Resolution::Existing));
            }

            // The gateway is the system of record for email.
            info!(
                account_id = %account.id,
                "Account email changed upstream, updating"
            );
            let account = self
                .directory
                .update_email(&claim.subject_id, &claim.email)
                .await?;
            return Ok(SsoIdentity::new(account, Resolution::EmailUpdated));
        }

        if let Some(existing) = self.directory.find_by_email(&claim.email).await? {
            error!(
                account_id = %claim.subject_id,
                existing_account_id = %existing.id,
                "An existing account already has this email"
            );
            if self.config.reject_duplicate_email {
                return Err(IdentifyError::DuplicateEmail {
                    email: claim.email,
                    existing: existing.id,
                });
            }
        }

        info!(account_id = %claim.subject_id, "Account not found, provisioning");
        let account = self
            .directory
            .create(NewAccount {
                id: claim.subject_id,
                name: claim.username,
                email: claim.email,
                password_hash: hash_password(&generate_password()),
            })
            .await?;

        Ok(SsoIdentity::new(account, Resolution::Provisioned))
    }
}

/// Generate a random password for a provisioned account.
///
/// SSO accounts never log in with it; it only satisfies the directory's
/// requirement for a credential.
pub fn generate_password() -> String {
    Uuid::new_v4().to_string()
}

/// Hash a password for storage (don't store raw credentials).
pub fn hash_password(password: &str) -> PasswordHash {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    let result = hasher.finalize();
    PasswordHash::new(format!("{:x}", result))
}
