//! Header-based SSO identification.
//!
//! An upstream reverse proxy or identity gateway authenticates the user and
//! forwards three identity claims as plain request headers: subject id,
//! username and email. This module maps those claims onto a local account:
//!
//! - **Existing account**: bound as-is
//! - **Email drift**: the stored email is overwritten with the claim
//! - **Unknown subject**: a new account is provisioned
//!
//! ## Security Model
//!
//! The headers are trusted implicitly. There is no token or signature
//! verification. Only deploy behind a proxy that strips or overwrites the
//! configured headers on every request from the public network; otherwise any
//! client can impersonate any user.
//!
//! ## Usage
//!
//! ```ignore
//! let resolver = Arc::new(IdentityResolver::new(config, SurrealDirectory::new(db)));
//! let app = Router::new()
//!     .route("/whoami", get(whoami))
//!     .layer(middleware::from_fn_with_state(resolver, identify::<SurrealDirectory>));
//! ```

mod claim;
mod context;
mod middleware;
mod resolver;

pub use claim::IdentityClaim;
pub use context::{Resolution, SsoIdentity};
pub use middleware::{CurrentUser, MaybeCurrentUser, identify};
pub use resolver::{IdentifyError, IdentityResolver, generate_password, hash_password};
