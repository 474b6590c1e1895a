//! Account directory.
//!
//! The directory owns persisted accounts. The SSO resolver only reads and
//! writes them through [`AccountDirectory`], which exposes lookup by email
//! as a first-class capability alongside lookup by id and by name.

mod store;

use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::db::AccountRecord;
use crate::types::{AccountId, AccountName, EmailAddress, PasswordHash};

pub use store::SurrealDirectory;

/// Canonical account representation handed out by the directory.
///
/// Never carries the stored credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: AccountName,
    pub email: EmailAddress,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<AccountRecord> for Account {
    fn from(record: AccountRecord) -> Self {
        Self {
            id: record.account_id,
            name: record.name,
            email: record.email,
            created_at: record.created_at.map(|dt| dt.to_raw()),
            updated_at: record.updated_at.map(|dt| dt.to_raw()),
        }
    }
}

/// Input for provisioning a new account.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: AccountId,
    pub name: AccountName,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
}

/// Directory errors.
#[derive(Debug, Clone)]
pub enum DirectoryError {
    /// More than one account shares an email address. The directory data is
    /// inconsistent and no single account can be returned.
    AmbiguousEmail { email: EmailAddress, count: usize },
    /// An update targeted an account that does not exist
    NotFound(AccountId),
    /// Storage failure, including uniqueness violations on create
    Database(String),
}

impl fmt::Display for DirectoryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmbiguousEmail { email, count } => write!(
                f,
                "{} accounts share the email address {}; refusing to pick one",
                count, email
            ),
            Self::NotFound(id) => write!(f, "Account not found: {}", id),
            Self::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for DirectoryError {}

impl From<surrealdb::Error> for DirectoryError {
    fn from(err: surrealdb::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// Operations the SSO resolver needs from an account directory.
///
/// Writes are performed on behalf of the system: there is no interactive
/// actor to authorize them against.
pub trait AccountDirectory: Send + Sync {
    /// Look up an account by its subject id.
    fn get_by_id(
        &self,
        id: &AccountId,
    ) -> impl Future<Output = Result<Option<Account>, DirectoryError>> + Send;

    /// Look up an account by its name.
    fn get_by_name(
        &self,
        name: &AccountName,
    ) -> impl Future<Output = Result<Option<Account>, DirectoryError>> + Send;

    /// Look up the account using `email`.
    ///
    /// Fails with [`DirectoryError::AmbiguousEmail`] when more than one
    /// account matches.
    fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> impl Future<Output = Result<Option<Account>, DirectoryError>> + Send;

    /// Create a new account.
    fn create(
        &self,
        account: NewAccount,
    ) -> impl Future<Output = Result<Account, DirectoryError>> + Send;

    /// Replace the email of an existing account.
    fn update_email(
        &self,
        id: &AccountId,
        email: &EmailAddress,
    ) -> impl Future<Output = Result<Account, DirectoryError>> + Send;
}
