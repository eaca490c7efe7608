use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::{PgPool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    error::AppError,
    models::pricing::{CreatePricingRequest, PricingPlan, UpdatePricingRequest},
    response::ApiResponse,
    utils::jwt::AdminUser,
};

const PLAN_COLUMNS: &str = "id, name, description, price, currency, period, features, created_at";

/// Creates a pricing plan.
/// Admin only.
pub async fn create_plan(
    State(pool): State<PgPool>,
    _admin: AdminUser,
    Json(payload): Json<CreatePricingRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let plan = sqlx::query_as::<_, PricingPlan>(&format!(
        r#"
        INSERT INTO pricing_plans (name, description, price, currency, period, features)
        VALUES ($1, $2, $3, COALESCE($4, 'USD'), COALESCE($5, 'month'), $6)
        RETURNING {}
        "#,
        PLAN_COLUMNS
    ))
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(&payload.currency)
    .bind(&payload.period)
    .bind(SqlJson(&payload.features))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create pricing plan: {:?}", e);
        AppError::UpstreamWrite("Failed to create pricing plan".to_string())
    })?;

    Ok(ApiResponse::created(plan).message("Pricing plan created successfully"))
}

/// Lists plans, cheapest first.
pub async fn list_plans(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let plans = sqlx::query_as::<_, PricingPlan>(&format!(
        "SELECT {} FROM pricing_plans ORDER BY price ASC, name ASC",
        PLAN_COLUMNS
    ))
    .fetch_all(&pool)
    .await?;

    Ok(ApiResponse::ok(plans))
}

pub async fn get_plan(
    State(pool): State<PgPool>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let plan = sqlx::query_as::<_, PricingPlan>(&format!(
        "SELECT {} FROM pricing_plans WHERE id = $1",
        PLAN_COLUMNS
    ))
    .bind(&id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("Pricing plan not found".to_string()))?;

    Ok(ApiResponse::ok(plan))
}

/// Partially updates a plan. A given `features` list replaces the old one.
/// Admin only.
pub async fn update_plan(
    State(pool): State<PgPool>,
    _admin: AdminUser,
    Path(id): Path<String>,
    Json(payload): Json<UpdatePricingRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let plan = sqlx::query_as::<_, PricingPlan>(&format!(
        r#"
        UPDATE pricing_plans
        SET name = COALESCE($2, name),
            description = COALESCE($3, description),
            price = COALESCE($4, price),
            currency = COALESCE($5, currency),
            period = COALESCE($6, period),
            features = COALESCE($7, features)
        WHERE id = $1
        RETURNING {}
        "#,
        PLAN_COLUMNS
    ))
    .bind(&id)
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.price)
    .bind(&payload.currency)
    .bind(&payload.period)
    .bind(payload.features.as_ref().map(SqlJson))
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to update pricing plan: {:?}", e);
        AppError::UpstreamWrite("Failed to update pricing plan".to_string())
    })?
    .ok_or(AppError::NotFound("Pricing plan not found".to_string()))?;

    Ok(ApiResponse::ok(plan).message("Pricing plan updated successfully"))
}

/// Admin only.
pub async fn delete_plan(
    State(pool): State<PgPool>,
    _admin: AdminUser,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM pricing_plans WHERE id = $1")
        .bind(&id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete pricing plan: {:?}", e);
            AppError::UpstreamWrite("Failed to delete pricing plan".to_string())
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Pricing plan not found".to_string()));
    }

    Ok(ApiResponse::deleted("Pricing plan deleted successfully"))
}
