//! SurrealDB-backed account directory.

use tracing::debug;

use super::{Account, AccountDirectory, DirectoryError, NewAccount};
use crate::db::{AccountCreate, AccountRecord, Db};
use crate::types::{AccountId, AccountName, EmailAddress};

/// Account directory stored in the `account` table.
#[derive(Clone)]
pub struct SurrealDirectory {
    db: Db,
}

impl SurrealDirectory {
    /// Create a new directory over an initialized database.
    pub fn new(db: Db) -> Self {
        Self { db }
    }

    /// Get reference to the database.
    pub fn db(&self) -> &Db {
        &self.db
    }

    async fn select_one(
        &self,
        query: &'static str,
        field: &'static str,
        value: String,
    ) -> Result<Option<Account>, DirectoryError> {
        let mut res = self.db.query(query).bind((field, value)).await?;

        let records: Vec<AccountRecord> = res.take(0)?;
        Ok(records.into_iter().next().map(Account::from))
    }
}

impl AccountDirectory for SurrealDirectory {
    async fn get_by_id(&self, id: &AccountId) -> Result<Option<Account>, DirectoryError> {
        self.select_one(
            "SELECT * FROM account WHERE account_id = $account_id LIMIT 1",
            "account_id",
            id.as_str().to_string(),
        )
        .await
    }

    async fn get_by_name(&self, name: &AccountName) -> Result<Option<Account>, DirectoryError> {
        self.select_one(
            "SELECT * FROM account WHERE name = $name LIMIT 1",
            "name",
            name.as_str().to_string(),
        )
        .await
    }

    async fn find_by_email(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Account>, DirectoryError> {
        let mut res = self
            .db
            .query("SELECT * FROM account WHERE email = $email")
            .bind(("email", email.as_str().to_string()))
            .await?;

        let records: Vec<AccountRecord> = res.take(0)?;
        if records.len() > 1 {
            return Err(DirectoryError::AmbiguousEmail {
                email: email.clone(),
                count: records.len(),
            });
        }

        Ok(records.into_iter().next().map(Account::from))
    }

    async fn create(&self, account: NewAccount) -> Result<Account, DirectoryError> {
        let content = AccountCreate {
            account_id: account.id,
            name: account.name,
            email: account.email,
            password_hash: account.password_hash,
        };

        debug!(account_id = %content.account_id, "Creating account");

        let mut res = self
            .db
            .query("CREATE account CONTENT $content")
            .bind(("content", content))
            .await?;

        let records: Vec<AccountRecord> = res.take(0)?;
        records
            .into_iter()
            .next()
            .map(Account::from)
            .ok_or_else(|| DirectoryError::Database("Failed to create account".to_string()))
    }

    async fn update_email(
        &self,
        id: &AccountId,
        email: &EmailAddress,
    ) -> Result<Account, DirectoryError> {
        let query = r#"
            UPDATE account SET
                email = $email
            WHERE account_id = $account_id
            RETURN AFTER
        "#;

        let mut res = self
            .db
            .query(query)
            .bind(("account_id", id.as_str().to_string()))
            .bind(("email", email.as_str().to_string()))
            .await?;

        let records: Vec<AccountRecord> = res.take(0)?;
        records
            .into_iter()
            .next()
            .map(Account::from)
            .ok_or_else(|| DirectoryError::NotFound(id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DatabaseConfig, create_connection, ensure_schema};
    use crate::types::PasswordHash;

    async fn setup_test_directory() -> SurrealDirectory {
        let config = DatabaseConfig {
            url: "memory".to_string(),
            ..Default::default()
        };
        let db = create_connection(config).await.unwrap();
        ensure_schema(&db).await.unwrap();
        SurrealDirectory::new(db)
    }

    fn new_account(id: &str, name: &str, email: &str) -> NewAccount {
        NewAccount {
            id: AccountId::new(id),
            name: AccountName::new(name),
            email: EmailAddress::new(email),
            password_hash: PasswordHash::new("0123abcd"),
        }
    }

    #[tokio::test]
    async fn test_create_and_get_by_id() {
        let dir = setup_test_directory().await;

        let created = dir.create(new_account("u1", "alice", "a@x.com")).await.unwrap();
        assert_eq!(created.id.as_str(), "u1");
        assert_eq!(created.name.as_str(), "alice");
        assert_eq!(created.email.as_str(), "a@x.com");
        assert!(created.created_at.is_some());

        let found = dir.get_by_id(&AccountId::new("u1")).await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert_eq!(found.name, created.name);
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let dir = setup_test_directory().await;

        assert!(dir.get_by_id(&AccountId::new("nobody")).await.unwrap().is_none());
        assert!(dir.get_by_name(&AccountName::new("nobody")).await.unwrap().is_none());
        assert!(
            dir.find_by_email(&EmailAddress::new("nobody@x.com"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_get_by_name() {
        let dir = setup_test_directory().await;
        dir.create(new_account("u1", "alice", "a@x.com")).await.unwrap();

        let found = dir.get_by_name(&AccountName::new("alice")).await.unwrap().unwrap();
        assert_eq!(found.id.as_str(), "u1");
    }

    #[tokio::test]
    async fn test_find_by_email_single_match() {
        let dir = setup_test_directory().await;
        dir.create(new_account("u1", "alice", "a@x.com")).await.unwrap();

        let found = dir
            .find_by_email(&EmailAddress::new("a@x.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id.as_str(), "u1");
    }

    #[tokio::test]
    async fn test_find_by_email_ambiguous_is_fatal() {
        let dir = setup_test_directory().await;
        dir.create(new_account("u1", "alice", "shared@x.com")).await.unwrap();
        dir.create(new_account("u2", "bob", "shared@x.com")).await.unwrap();

        let err = dir
            .find_by_email(&EmailAddress::new("shared@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::AmbiguousEmail { count: 2, .. }));
    }

    #[tokio::test]
    async fn test_duplicate_id_or_name_rejected() {
        let dir = setup_test_directory().await;
        dir.create(new_account("u1", "alice", "a@x.com")).await.unwrap();

        let same_id = dir.create(new_account("u1", "carol", "c@x.com")).await;
        assert!(matches!(same_id, Err(DirectoryError::Database(_))));

        let same_name = dir.create(new_account("u3", "alice", "d@x.com")).await;
        assert!(matches!(same_name, Err(DirectoryError::Database(_))));
    }

    #[tokio::test]
    async fn test_update_email() {
        let dir = setup_test_directory().await;
        dir.create(new_account("u1", "alice", "old@x.com")).await.unwrap();

        let updated = dir
            .update_email(&AccountId::new("u1"), &EmailAddress::new("new@x.com"))
            .await
            .unwrap();
        assert_eq!(updated.email.as_str(), "new@x.com");
        assert_eq!(updated.name.as_str(), "alice");

        let found = dir.get_by_id(&AccountId::new("u1")).await.unwrap().unwrap();
        assert_eq!(found.email.as_str(), "new@x.com");
    }

    #[tokio::test]
    async fn test_update_email_missing_account() {
        let dir = setup_test_directory().await;

        let err = dir
            .update_email(&AccountId::new("ghost"), &EmailAddress::new("g@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_account_json_has_no_credential() {
        let dir = setup_test_directory().await;
        let created = dir.create(new_account("u1", "alice", "a@x.com")).await.unwrap();

        let json = serde_json::to_value(&created).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["id"], "u1");
    }
}
