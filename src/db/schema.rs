use serde::{Deserialize, Serialize};
use surrealdb::{RecordId, sql::Datetime};

use crate::types::{AccountId, AccountName, EmailAddress, PasswordHash};

/// Persisted account record in SurrealDB (table: `account`).
///
/// This is the raw storage shape; callers outside the directory work with
/// [`crate::directory::Account`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountRecord {
    /// Database identifier
    pub id: RecordId,
    /// SSO subject id
    pub account_id: AccountId,
    pub name: AccountName,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
    pub created_at: Option<Datetime>,
    pub updated_at: Option<Datetime>,
}

/// Payload for creating a new account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountCreate {
    pub account_id: AccountId,
    pub name: AccountName,
    pub email: EmailAddress,
    pub password_hash: PasswordHash,
}
