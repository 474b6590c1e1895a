//! Axum integration: the identify middleware and identity extractors.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, StatusCode, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{error, info, warn};

use crate::auth::context::SsoIdentity;
use crate::auth::resolver::{IdentifyError, IdentityResolver};
use crate::directory::{AccountDirectory, DirectoryError};

impl IdentifyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingHeader(_) | Self::InvalidHeader(_) => StatusCode::BAD_REQUEST,
            Self::EmailDomainRejected { .. } => StatusCode::FORBIDDEN,
            Self::DuplicateEmail { .. } => StatusCode::CONFLICT,
            Self::Directory(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for IdentifyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Directory internals stay in the logs.
        let message = match &self {
            Self::Directory(_) => "Internal error while resolving SSO identity".to_string(),
            other => other.to_string(),
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

/// Identify middleware.
///
/// Runs SSO resolution once per request. On success the resolved
/// [`SsoIdentity`] is inserted into the request extensions; when the subject
/// id header is absent the request passes through untouched.
pub async fn identify<D>(
    State(resolver): State<Arc<IdentityResolver<D>>>,
    mut request: Request,
    next: Next,
) -> Response
where
    D: AccountDirectory + 'static,
{
    let result = resolver.identify(request.headers()).await;
    match result {
        Ok(Some(identity)) => {
            let (ip_address, user_agent) = client_info(request.headers());
            let identity = identity.with_client_info(ip_address, user_agent);
            info!(
                user = %identity.user(),
                account_id = %identity.account_id(),
                resolution = identity.resolution().as_str(),
                "SSO user identified"
            );
            request.extensions_mut().insert(identity);
        }
        Ok(None) => {}
        Err(err) => {
            match &err {
                IdentifyError::Directory(DirectoryError::AmbiguousEmail { email, count }) => {
                    error!(
                        email = %email,
                        count = *count,
                        "Directory has more than one account with the same email address"
                    );
                }
                IdentifyError::Directory(e) => error!("SSO identification failed: {}", e),
                other => warn!("SSO identification rejected: {}", other),
            }
            return err.into_response();
        }
    }

    next.run(request).await
}

fn client_info(headers: &HeaderMap) -> (Option<String>, Option<String>) {
    let ip = headers
        .get("X-Forwarded-For")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_string())
        .or_else(|| {
            headers
                .get("X-Real-IP")
                .and_then(|v| v.to_str().ok())
                .map(|v| v.to_string())
        });
    let ua = headers
        .get(http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_string());
    (ip, ua)
}

/// Extractor for the SSO user bound to the request.
///
/// Rejects with 401 when the request was not identified.
pub struct CurrentUser(pub SsoIdentity);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SsoIdentity>()
            .cloned()
            .map(CurrentUser)
            .ok_or((StatusCode::UNAUTHORIZED, "Not authenticated"))
    }
}

/// Extractor for routes that serve both identified and anonymous requests.
pub struct MaybeCurrentUser(pub Option<SsoIdentity>);

impl<S> FromRequestParts<S> for MaybeCurrentUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeCurrentUser(parts.extensions.get::<SsoIdentity>().cloned()))
    }
}
