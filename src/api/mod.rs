// HTTP surface: every route sits behind the SSO identify middleware

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::Json,
    routing::get,
};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::auth::{CurrentUser, IdentityResolver, identify};
use crate::directory::AccountDirectory;

pub fn create_router<D>(resolver: Arc<IdentityResolver<D>>) -> Router
where
    D: AccountDirectory + 'static,
{
    let mut router = Router::new()
        .route("/health", get(health_check))
        .route("/whoami", get(whoami));

    let templates = resolver.config().template_directory.clone();
    if templates.is_dir() {
        info!("Registering template directory {}", templates.display());
        router = router.nest_service("/templates", ServeDir::new(templates));
    } else {
        warn!(
            "Template directory {} not found, templates will not be served",
            templates.display()
        );
    }

    router
        .layer(middleware::from_fn_with_state(resolver, identify::<D>))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

async fn health_check() -> Result<Json<Value>, StatusCode> {
    Ok(Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    })))
}

/// Return the SSO user bound to this request.
async fn whoami(CurrentUser(identity): CurrentUser) -> Json<Value> {
    Json(serde_json::json!({
        "user": identity.user(),
        "account": identity.account(),
        "resolution": identity.resolution(),
    }))
}
