use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;

pub type Db = Surreal<Any>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("SURREALDB_URL").unwrap_or_else(|_| "memory".to_string()),
            namespace: env::var("SURREALDB_NAMESPACE").unwrap_or_else(|_| "simplesso".to_string()),
            database: env::var("SURREALDB_DATABASE").unwrap_or_else(|_| "directory".to_string()),
            username: env::var("SURREALDB_USERNAME").ok(),
            password: env::var("SURREALDB_PASSWORD").ok(),
        }
    }
}

pub async fn create_connection(config: DatabaseConfig) -> Result<Db> {
    let db = surrealdb::engine::any::connect(config.url).await?;

    // Sign in if credentials are provided
    if let (Some(username), Some(password)) = (config.username, config.password) {
        db.signin(Root {
            username: &username,
            password: &password,
        })
        .await?;
    }

    db.use_ns(config.namespace).use_db(config.database).await?;

    Ok(db)
}

pub async fn ensure_schema(db: &Db) -> Result<()> {
    let schema_queries = [
        // Account directory. `account_id` is the SSO subject id; email is
        // deliberately not unique at the storage level.
        "DEFINE TABLE IF NOT EXISTS account SCHEMAFULL;
         DEFINE FIELD IF NOT EXISTS account_id ON TABLE account TYPE string;
         DEFINE FIELD IF NOT EXISTS name ON TABLE account TYPE string;
         DEFINE FIELD IF NOT EXISTS email ON TABLE account TYPE string;
         DEFINE FIELD IF NOT EXISTS password_hash ON TABLE account TYPE string
            ASSERT string::len($value) > 0;
         DEFINE FIELD IF NOT EXISTS created_at ON TABLE account TYPE datetime DEFAULT time::now();
         DEFINE FIELD IF NOT EXISTS updated_at ON TABLE account TYPE datetime VALUE time::now();",
        // Indexes
        "DEFINE INDEX IF NOT EXISTS account_id_unique ON TABLE account COLUMNS account_id UNIQUE;
         DEFINE INDEX IF NOT EXISTS account_name_unique ON TABLE account COLUMNS name UNIQUE;
         DEFINE INDEX IF NOT EXISTS account_email ON TABLE account COLUMNS email;",
    ];

    for query in schema_queries {
        db.query(query).await?.check()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_config() -> DatabaseConfig {
        DatabaseConfig {
            url: "memory".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let db = create_connection(memory_config()).await.unwrap();
        ensure_schema(&db).await.unwrap();
        ensure_schema(&db).await.unwrap();
    }

    #[tokio::test]
    async fn test_schema_rejects_duplicate_account_id() {
        let db = create_connection(memory_config()).await.unwrap();
        ensure_schema(&db).await.unwrap();

        let create = "CREATE account CONTENT {
            account_id: 'u1', name: $name, email: 'a@x.com', password_hash: 'h'
        }";
        db.query(create)
            .bind(("name", "alice"))
            .await
            .unwrap()
            .check()
            .unwrap();

        let second = db.query(create).bind(("name", "bob")).await.unwrap().check();
        assert!(second.is_err());
    }
}
