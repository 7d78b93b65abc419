//! HTTP request handlers
//!
//! Responses use the `{"success": ..., "data"|"message": ...}` envelope the
//! frontend expects; failures go through `AppError`.

pub mod cart;
pub mod food;
pub mod orders;
pub mod users;

use actix_web::HttpResponse;
use serde::Serialize;

pub(crate) fn data_response<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "success": true, "data": data }))
}

pub(crate) fn message_response(message: &str) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "success": true, "message": message }))
}
