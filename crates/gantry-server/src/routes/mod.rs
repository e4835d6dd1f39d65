//! API route handlers.
//!
//! All routes are nested under `/v1`. Signup is the only unauthenticated
//! route; everything else goes through the Bearer auth middleware, which
//! injects the caller's [`Identity`](crate::auth::Identity).

pub mod apps;
pub mod auth_routes;
pub mod env_vars;
pub mod events;
pub mod metrics;

use axum::Router;
use axum::middleware as axum_mw;

use crate::auth::auth_middleware;
use crate::state::AppState;

/// Build the complete API router with its state applied.
pub fn api_router(state: AppState) -> Router {
    // Signup is concurrency-limited: it is the one write path anyone on
    // the network can reach.
    let public = auth_routes::public_router().layer(tower::limit::ConcurrencyLimitLayer::new(10));

    let authenticated = Router::new()
        .merge(auth_routes::router())
        .merge(apps::router())
        .merge(env_vars::router())
        .merge(events::router())
        .merge(metrics::router())
        .route_layer(axum_mw::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .nest("/v1", public.merge(authenticated))
        .with_state(state)
}
