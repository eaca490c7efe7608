use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::models::{category::CategorySummary, comment::CommentThread};

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub content: String,

    /// Cover image URL. Empty string when the post has no cover.
    pub image_url: String,

    pub category_id: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// A post together with whatever relations the read asked for.
///
/// `category` and `comments` are omitted from the payload when they were
/// not included, so a list page (category only) and a detail read
/// (category + comment threads) share one shape.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    #[serde(flatten)]
    pub post: Post,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<CategorySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<CommentThread>>,
}

/// DTO for creating a new post.
/// The cover image arrives separately as a multipart file.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: String,

    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: String,

    #[validate(length(min = 1, message = "categoryId is required"))]
    pub category_id: String,
}

/// DTO for updating a post. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePostRequest {
    #[validate(length(
        min = 1,
        max = 200,
        message = "Title length must be between 1 and 200 chars"
    ))]
    pub title: Option<String>,

    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: Option<String>,

    pub category_id: Option<String>,

    /// Explicit cover URL, used only when no new image is uploaded.
    pub image_url: Option<String>,
}

/// Query parameters for `GET /post`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PostListParams {
    /// 1-based page number (default: 1).
    pub page: Option<i64>,

    /// Number of items per page (default: 10, max: 100).
    pub limit: Option<i64>,
}

/// Query parameters for `GET /post/search`.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchParams {
    /// Case-insensitive fragment matched against title and content.
    #[serde(default)]
    pub q: String,
}
