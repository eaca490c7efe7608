// src/routes.rs

use axum::{
    Json, Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    routing::{get, post, put},
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};
use utoipa::OpenApi;

use crate::{
    handlers::{auth, category, comment, post as posts, pricing},
    openapi::ApiDoc,
    state::AppState,
};

/// Assembles the main application router.
///
/// * Nests every domain router under `/api/v1`.
/// * Serves uploaded cover images under `/media`.
/// * Applies global middleware (Trace, CORS, upload size limit).
/// * Injects global state.
///
/// Write endpoints are gated by the `AdminUser` extractor in the handlers
/// themselves, so read and write routes can share a path.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::mirror_request())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let auth_routes = Router::new().route("/login", post(auth::login));

    let post_routes = Router::new()
        .route("/", get(posts::find_all).post(posts::create))
        .route("/search", get(posts::search_posts))
        .route("/category/{category_id}", get(posts::find_by_category))
        .route(
            "/{id}",
            get(posts::find_one).put(posts::update).delete(posts::remove),
        );

    let category_routes = Router::new()
        .route(
            "/",
            get(category::list_categories).post(category::create_category),
        )
        .route(
            "/{id}",
            get(category::get_category)
                .put(category::update_category)
                .delete(category::delete_category),
        );

    let comment_routes = Router::new()
        .route("/", post(comment::create_comment))
        .route("/post/{post_id}", get(comment::list_comments))
        .route(
            "/{id}",
            put(comment::update_comment)
                .patch(comment::update_comment)
                .delete(comment::delete_comment),
        );

    let pricing_routes = Router::new()
        .route("/", get(pricing::list_plans).post(pricing::create_plan))
        .route(
            "/{id}",
            get(pricing::get_plan)
                .patch(pricing::update_plan)
                .delete(pricing::delete_plan),
        );

    let api = Router::new()
        .nest("/auth", auth_routes)
        .nest("/post", post_routes)
        .nest("/category", category_routes)
        .nest("/comment", comment_routes)
        .nest("/pricings", pricing_routes);

    let max_upload_bytes = state.config.max_upload_bytes;
    let media_dir = ServeDir::new(&state.config.media_root);

    Router::new()
        .nest("/api/v1", api)
        .nest_service("/media", media_dir)
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        )
        // Global Middleware (applied from outside in)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
