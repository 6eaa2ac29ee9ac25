use super::handlers;
use crate::auth::{require_credential, AccessPolicy, Role};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

/// Creates the categories router
pub fn categories_routes() -> Router {
    Router::new().route(
        "/api/categories",
        get(handlers::list_categories).merge(
            post(handlers::create_category).route_layer(middleware::from_fn_with_state(
                AccessPolicy::roles(&[Role::Admin, Role::Editor]),
                require_credential,
            )),
        ),
    )
}
