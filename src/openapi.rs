// src/openapi.rs

use utoipa::OpenApi;

use crate::{
    handlers::post,
    models::{
        category::CategorySummary,
        comment::{Comment, CommentThread},
        post::{Post, PostView},
    },
    response::Pagination,
};

/// OpenAPI document for the post API, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        post::create,
        post::find_all,
        post::find_one,
        post::find_by_category,
        post::search_posts,
        post::update,
        post::remove,
    ),
    components(schemas(
        Post,
        PostView,
        post::PostForm,
        CategorySummary,
        Comment,
        CommentThread,
        Pagination
    )),
    tags((name = "post", description = "Post lifecycle"))
)]
pub struct ApiDoc;
