use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{catalog, social, users};

/// Build the full HTTP surface. Reads are public; creating catalog entries
/// requires a bearer token.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/users", get(users::list_users))
        // One path for both addressing schemes: GET takes a username,
        // PUT/DELETE take an id.
        .route(
            "/users/{user}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/{user_id}/follow/{followed_user_id}", post(social::follow))
        .route("/{user_id}/unfollow/{followed_user_id}", post(social::unfollow))
        .route("/categories", get(catalog::list_categories))
        .route("/collections", get(catalog::list_collections))
        .route("/items", get(catalog::list_items))
        .route("/items/{item_id}", get(catalog::get_item));

    let protected_routes = Router::new()
        .route("/auth/verify", get(auth::verify))
        .route("/categories", post(catalog::create_category))
        .route("/collections", post(catalog::create_collection))
        .route("/items", post(catalog::create_item))
        .route("/items/{item_id}/reviews", post(catalog::create_review))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
