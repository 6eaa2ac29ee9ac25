use super::handlers;
use crate::auth::{require_credential, AccessPolicy, Role};
use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

/// Creates the posts router
///
/// Reads are public. Writes sit behind the credential guard:
/// create/update need `admin` or `editor`, delete needs `admin`.
pub fn posts_routes() -> Router {
    let writers = || {
        middleware::from_fn_with_state(
            AccessPolicy::roles(&[Role::Admin, Role::Editor]),
            require_credential,
        )
    };
    let admins =
        || middleware::from_fn_with_state(AccessPolicy::roles(&[Role::Admin]), require_credential);

    Router::new()
        .route(
            "/api/posts",
            get(handlers::list_posts).merge(post(handlers::create_post).route_layer(writers())),
        )
        .route(
            "/api/posts/:key",
            get(handlers::get_post)
                .merge(put(handlers::update_post).route_layer(writers()))
                .merge(delete(handlers::delete_post).route_layer(admins())),
        )
        .route("/api/post_by_id/:id", get(handlers::get_post_by_id))
}
