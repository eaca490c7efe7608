use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'pricing_plans' table in the database.
#[derive(Debug, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PricingPlan {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub currency: String,

    /// Billing period (e.g., "month", "year").
    pub period: String,

    /// Stored as a JSON array in the database.
    /// `sqlx::types::Json` handles automatic serialization/deserialization.
    pub features: Json<Vec<Feature>>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A single line of a plan's feature list.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Feature {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[serde(default)]
    pub included: bool,
}

/// DTO for creating a new pricing plan.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePricingRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 1, max = 2000))]
    pub description: String,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: f64,
    #[validate(length(min = 1, max = 10))]
    pub currency: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub period: Option<String>,
    #[validate(nested)]
    pub features: Vec<Feature>,
}

/// DTO for updating a pricing plan. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePricingRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0.0, message = "Price must not be negative"))]
    pub price: Option<f64>,
    #[validate(length(min = 1, max = 10))]
    pub currency: Option<String>,
    #[validate(length(min = 1, max = 20))]
    pub period: Option<String>,
    #[validate(nested)]
    pub features: Option<Vec<Feature>>,
}
