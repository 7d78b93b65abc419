/// Food catalog handlers
///
/// The list endpoint is served through the response cache; catalog mutations
/// invalidate the cached list. An invalidation failure only affects
/// freshness, never the mutation itself, so it is logged and swallowed.
use actix_web::{web, HttpResponse};
use response_cache::ResponseCache;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::handlers::{data_response, message_response};
use crate::models::FoodItem;
use crate::store::AppStore;

/// Pattern covering every cached variant of the food list
pub const FOOD_LIST_PATTERN: &str = "cache:/api/food/list*";

#[derive(Debug, Deserialize)]
pub struct AddFoodRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveFoodRequest {
    pub id: Uuid,
}

pub async fn list_food(store: web::Data<AppStore>) -> Result<HttpResponse> {
    Ok(data_response(store.list_foods()))
}

pub async fn add_food(
    store: web::Data<AppStore>,
    cache: web::Data<ResponseCache>,
    req: web::Json<AddFoodRequest>,
) -> Result<HttpResponse> {
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    if req.price <= 0.0 {
        return Err(AppError::BadRequest("Price must be positive".into()));
    }

    let req = req.into_inner();
    store.add_food(FoodItem {
        id: Uuid::new_v4(),
        name: req.name.trim().to_string(),
        description: req.description,
        price: req.price,
        category: req.category,
        image: req.image,
    });

    invalidate_food_list(&cache).await;
    Ok(message_response("Food item added"))
}

pub async fn remove_food(
    store: web::Data<AppStore>,
    cache: web::Data<ResponseCache>,
    req: web::Json<RemoveFoodRequest>,
) -> Result<HttpResponse> {
    if store.remove_food(req.id).is_none() {
        return Err(AppError::NotFound("Food item not found".into()));
    }

    invalidate_food_list(&cache).await;
    Ok(message_response("Food item removed"))
}

async fn invalidate_food_list(cache: &ResponseCache) {
    match cache.invalidate(FOOD_LIST_PATTERN).await {
        Ok(deleted) => info!(deleted, "food list cache cleared after catalog change"),
        Err(e) => warn!(error = %e, "food list cache invalidation failed"),
    }
}
