use axum::{
    middleware,
    routing::{delete, get, post},
    Extension, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::cache::{GoalValueCache, InMemoryGoalCache};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;

/// Shared per-process state injected into handlers. The goal cache lives
/// here (not in a global) so a shared implementation can be swapped in.
#[derive(Clone)]
pub struct AppState {
    pub goal_cache: Arc<dyn GoalValueCache>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            goal_cache: Arc::new(InMemoryGoalCache::from_config()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (token acquisition)
        .merge(auth_public_routes())
        // Protected API
        .merge(api_routes())
        // Global middleware
        .layer(Extension(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    Router::new()
        .route("/auth/login", post(public::auth::login))
        .route("/auth/refresh", post(public::auth::refresh))
}

fn api_routes() -> Router {
    Router::new()
        .route("/api/auth/whoami", get(protected::auth::whoami))
        // User management (manager only)
        .route(
            "/api/users",
            get(protected::users::list).post(protected::users::create),
        )
        .route(
            "/api/users/:id",
            get(protected::users::get)
                .put(protected::users::update)
                .delete(protected::users::remove),
        )
        // Clients and their notes
        .route(
            "/api/clients",
            get(protected::clients::list).post(protected::clients::create),
        )
        .route(
            "/api/clients/:id",
            get(protected::clients::get)
                .put(protected::clients::update)
                .delete(protected::clients::remove),
        )
        .route(
            "/api/clients/:id/notes",
            get(protected::clients::list_notes).post(protected::clients::add_note),
        )
        // Product catalog
        .route(
            "/api/products",
            get(protected::products::list).post(protected::products::create),
        )
        .route(
            "/api/products/:id",
            get(protected::products::get)
                .put(protected::products::update)
                .delete(protected::products::remove),
        )
        // Sales
        .route(
            "/api/sales",
            get(protected::sales::list).post(protected::sales::create),
        )
        .route(
            "/api/sales/:id",
            get(protected::sales::get)
                .put(protected::sales::update)
                .delete(protected::sales::remove),
        )
        // Goals and the progress engine
        .route(
            "/api/goals",
            get(protected::goals::list).post(protected::goals::create),
        )
        .route("/api/goals/sync-all", post(protected::goals::sync_all))
        .route(
            "/api/goals/:id",
            get(protected::goals::get)
                .put(protected::goals::update)
                .delete(protected::goals::remove),
        )
        .route(
            "/api/goals/:id/recalculate",
            post(protected::goals::recalculate),
        )
        // Content library
        .route(
            "/api/content",
            get(protected::content::list).post(protected::content::create),
        )
        .route(
            "/api/content/:id",
            get(protected::content::get)
                .put(protected::content::update)
                .delete(protected::content::remove),
        )
        // Reports
        .route("/api/reports/sales", get(protected::reports::sales))
        .route("/api/reports/dashboard", get(protected::reports::dashboard))
        // Reminders
        .route(
            "/api/reminders",
            get(protected::reminders::list).post(protected::reminders::create),
        )
        .route(
            "/api/reminders/:id",
            get(protected::reminders::get)
                .put(protected::reminders::update)
                .delete(protected::reminders::remove),
        )
        .route(
            "/api/reminders/:id/complete",
            post(protected::reminders::complete),
        )
        // Teams
        .route(
            "/api/teams",
            get(protected::teams::list).post(protected::teams::create),
        )
        .route(
            "/api/teams/:id",
            get(protected::teams::get)
                .put(protected::teams::update)
                .delete(protected::teams::remove),
        )
        .route(
            "/api/teams/:id/members",
            get(protected::teams::list_members).post(protected::teams::add_member),
        )
        .route(
            "/api/teams/:id/members/:user_id",
            delete(protected::teams::remove_member),
        )
        .layer(middleware::from_fn(jwt_auth_middleware))
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Agency API",
            "version": version,
            "description": "Insurance agency back-office API built with Rust (Axum)",
            "endpoints": {
                "home": "/ (public)",
                "public_auth": "/auth/login, /auth/refresh (public - token acquisition)",
                "auth": "/api/auth/whoami (protected)",
                "users": "/api/users[/:id] (protected, manager)",
                "clients": "/api/clients[/:id][/notes] (protected)",
                "products": "/api/products[/:id] (protected)",
                "sales": "/api/sales[/:id] (protected)",
                "goals": "/api/goals[/:id][/recalculate], /api/goals/sync-all (protected)",
                "content": "/api/content[/:id] (protected)",
                "reports": "/api/reports/sales, /api/reports/dashboard (protected)",
                "reminders": "/api/reminders[/:id][/complete] (protected)",
                "teams": "/api/teams[/:id][/members] (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match crate::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
