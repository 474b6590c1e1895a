pub mod config;
mod types;
pub mod api;
pub mod auth;
pub mod db;
pub mod directory;

pub use auth::{
    CurrentUser, IdentifyError, IdentityClaim, IdentityResolver, MaybeCurrentUser, Resolution,
    SsoIdentity,
};
pub use config::{SsoConfig, load_settings, resolve_config_path};
pub use db::{DatabaseConfig, create_connection, ensure_schema};
pub use directory::{Account, AccountDirectory, DirectoryError, SurrealDirectory};
pub use types::{AccountId, AccountName, EmailAddress, PasswordHash};

use anyhow::Result;

/// Convenience function to connect to the directory database and build a
/// resolver over it.
pub async fn create_resolver(
    sso_config: SsoConfig,
    db_config: DatabaseConfig,
) -> Result<IdentityResolver<SurrealDirectory>> {
    let db = create_connection(db_config).await?;
    ensure_schema(&db).await?;
    Ok(IdentityResolver::new(sso_config, SurrealDirectory::new(db)))
}
