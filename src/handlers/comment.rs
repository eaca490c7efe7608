use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::{Comment, CommentThread, CreateCommentRequest, UpdateCommentRequest},
    response::ApiResponse,
    utils::{html::clean_required, jwt::AdminUser},
};

const COMMENT_COLUMNS: &str = "id, name, email, content, post_id, parent_id, created_at";

/// Create a new comment, or a reply when `parentId` is given.
/// Public: readers comment without an account.
pub async fn create_comment(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let content = clean_required(&payload.content, "Comment")?;

    let mut tx = pool.begin().await?;

    // 1. The post must exist
    sqlx::query("SELECT 1 FROM posts WHERE id = $1")
        .bind(&payload.post_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    // 2. A parent must belong to the same post
    if let Some(parent_id) = &payload.parent_id {
        sqlx::query("SELECT 1 FROM comments WHERE id = $1 AND post_id = $2")
            .bind(parent_id)
            .bind(&payload.post_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(AppError::NotFound("Parent comment not found".to_string()))?;
    }

    // 3. Insert Comment
    let comment = sqlx::query_as::<_, Comment>(&format!(
        r#"
        INSERT INTO comments (name, email, content, post_id, parent_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        COMMENT_COLUMNS
    ))
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&content)
    .bind(&payload.post_id)
    .bind(&payload.parent_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ApiResponse::created(comment).message("Comment created successfully"))
}

/// List all comments for a post, oldest first, each with its immediate replies.
pub async fn list_comments(
    State(pool): State<PgPool>,
    Path(post_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let comments = sqlx::query_as::<_, Comment>(&format!(
        "SELECT {} FROM comments WHERE post_id = $1 ORDER BY created_at ASC",
        COMMENT_COLUMNS
    ))
    .bind(&post_id)
    .fetch_all(&pool)
    .await?;

    let threads: Vec<CommentThread> = comments
        .iter()
        .map(|comment| CommentThread {
            comment: comment.clone(),
            replies: comments
                .iter()
                .filter(|c| c.parent_id.as_deref() == Some(comment.id.as_str()))
                .cloned()
                .collect(),
        })
        .collect();

    Ok(ApiResponse::ok(threads))
}

/// Edits a comment.
/// Admin only.
pub async fn update_comment(
    State(pool): State<PgPool>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let content = payload
        .content
        .as_deref()
        .map(|c| clean_required(c, "Comment"))
        .transpose()?;

    let comment = sqlx::query_as::<_, Comment>(&format!(
        r#"
        UPDATE comments
        SET name = COALESCE($2, name),
            email = COALESCE($3, email),
            content = COALESCE($4, content)
        WHERE id = $1
        RETURNING {}
        "#,
        COMMENT_COLUMNS
    ))
    .bind(&id)
    .bind(&payload.name)
    .bind(&payload.email)
    .bind(&content)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Comment not found".to_string()))?;

    Ok(ApiResponse::ok(comment).message("Comment updated successfully"))
}

/// Deletes a comment and, through the cascade, its replies.
/// Admin only.
pub async fn delete_comment(
    State(pool): State<PgPool>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM comments WHERE id = $1")
        .bind(&id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete comment: {:?}", e);
            AppError::UpstreamWrite("Failed to delete comment".to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Comment not found".to_string()));
    }

    Ok(ApiResponse::deleted("Comment deleted successfully"))
}
