pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod state;
pub mod sync;

use axum::{
    http::HeaderName,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::public::auth::AUTH_TOKEN_HEADER;
use crate::middleware::{jwt_auth_middleware, pagination_middleware};
pub use crate::state::AppState;

/// Full HTTP surface: public auth and health, JWT-guarded resources and streams
pub fn app(state: AppState) -> Router {
    let cors = if state.config.security.enable_cors {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
            .expose_headers([HeaderName::from_static(AUTH_TOKEN_HEADER)])
    } else {
        CorsLayer::new()
    };

    Router::new()
        .merge(public_routes())
        .merge(resource_routes(&state))
        .merge(stream_routes(&state))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors))
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route("/status", get(public::status))
        .route("/auth/google", post(public::google_login))
}

fn resource_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected::resources;

    Router::new()
        .route("/resources/create", post(resources::resource_create))
        .route(
            "/resources",
            get(resources::resource_list).route_layer(from_fn_with_state(state.clone(), pagination_middleware)),
        )
        .route(
            "/resources/:resourceId",
            get(resources::resource_show)
                .put(resources::resource_update)
                .delete(resources::resource_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}

fn stream_routes(state: &AppState) -> Router<AppState> {
    use handlers::protected::streams;

    Router::new()
        .route(
            "/streams",
            get(streams::stream_list)
                .route_layer(from_fn_with_state(state.clone(), pagination_middleware))
                .post(streams::stream_create),
        )
        .route("/streams/members", put(streams::stream_members_update))
        .route(
            "/streams/:streamId",
            get(streams::stream_show)
                .route_layer(from_fn_with_state(state.clone(), pagination_middleware))
                .put(streams::stream_update)
                .delete(streams::stream_delete),
        )
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware))
}
