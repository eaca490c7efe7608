use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    models::category::{Category, CategoryRequest},
    response::ApiResponse,
    utils::jwt::AdminUser,
};

/// Maps write errors on `categories` to user-facing conflicts where possible.
fn map_write_error(e: sqlx::Error, name: &str) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return AppError::Conflict(format!("Category '{}' already exists", name));
        }
    }
    tracing::error!("Failed to write category: {:?}", e);
    AppError::UpstreamWrite("Failed to save category".to_string())
}

/// Posts reference categories with `ON DELETE RESTRICT`.
fn map_delete_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_foreign_key_violation() {
            return AppError::Conflict("Category still has posts".to_string());
        }
    }
    tracing::error!("Failed to delete category: {:?}", e);
    AppError::UpstreamWrite("Failed to delete category".to_string())
}

/// Creates a new category.
/// Admin only.
pub async fn create_category(
    State(pool): State<PgPool>,
    _admin: AdminUser,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = sqlx::query_as::<_, Category>(
        "INSERT INTO categories (name) VALUES ($1) RETURNING id, name, created_at",
    )
    .bind(&payload.name)
    .fetch_one(&pool)
    .await
    .map_err(|e| map_write_error(e, &payload.name))?;

    Ok(ApiResponse::created(category).message("Category created successfully"))
}

/// Lists all categories, alphabetically.
pub async fn list_categories(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let categories = sqlx::query_as::<_, Category>(
        "SELECT id, name, created_at FROM categories ORDER BY name ASC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::ok(categories))
}

pub async fn get_category(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let category = sqlx::query_as::<_, Category>(
        "SELECT id, name, created_at FROM categories WHERE id = $1",
    )
    .bind(&id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Category not found".to_string()))?;

    Ok(ApiResponse::ok(category))
}

/// Renames a category.
/// Admin only.
pub async fn update_category(
    State(pool): State<PgPool>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<CategoryRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let category = sqlx::query_as::<_, Category>(
        "UPDATE categories SET name = $1 WHERE id = $2 RETURNING id, name, created_at",
    )
    .bind(&payload.name)
    .bind(&id)
    .fetch_optional(&pool)
    .await
    .map_err(|e| map_write_error(e, &payload.name))?
    .ok_or(AppError::NotFound("Category not found".to_string()))?;

    Ok(ApiResponse::ok(category).message("Category updated successfully"))
}

/// Deletes a category that no post references any more.
/// Admin only.
pub async fn delete_category(
    State(pool): State<PgPool>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(&id)
        .execute(&pool)
        .await
        .map_err(map_delete_error)?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Category not found".to_string()));
    }

    Ok(ApiResponse::deleted("Category deleted successfully"))
}
