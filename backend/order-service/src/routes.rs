//! Route table
//!
//! Wires handlers, the JWT middleware and the response cache into the
//! request pipeline. Shared between `main` and the integration tests so both
//! run the exact same pipeline.

use actix_middleware::{CacheResponse, JwtAuth};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use response_cache::ResponseCache;
use std::sync::Arc;

use crate::handlers;

pub fn configure(
    cfg: &mut web::ServiceConfig,
    secret: &str,
    cache: Arc<ResponseCache>,
    food_list_ttl_secs: u64,
) {
    cfg.route("/health", web::get().to(health))
        .service(
            web::scope("/api/user")
                .route("/register", web::post().to(handlers::users::register))
                .route("/login", web::post().to(handlers::users::login)),
        )
        .service(
            web::scope("/api/food")
                .service(
                    web::resource("/list")
                        .wrap(CacheResponse::new(cache, food_list_ttl_secs))
                        .route(web::get().to(handlers::food::list_food)),
                )
                .service(
                    web::resource("/add")
                        .wrap(JwtAuth::new(secret))
                        .route(web::post().to(handlers::food::add_food)),
                )
                .service(
                    web::resource("/remove")
                        .wrap(JwtAuth::new(secret))
                        .route(web::post().to(handlers::food::remove_food)),
                ),
        )
        .service(
            web::scope("/api/cart")
                .wrap(JwtAuth::new(secret))
                .route("/add", web::post().to(handlers::cart::add_to_cart))
                .route("/remove", web::post().to(handlers::cart::remove_from_cart))
                .route("/get", web::post().to(handlers::cart::get_cart)),
        )
        .service(
            web::scope("/api/order")
                .route("/verify", web::post().to(handlers::orders::verify_order))
                .service(
                    web::resource("/place")
                        .wrap(JwtAuth::new(secret))
                        .route(web::post().to(handlers::orders::place_order)),
                )
                .service(
                    web::resource("/userorders")
                        .wrap(JwtAuth::new(secret))
                        .route(web::post().to(handlers::orders::user_orders)),
                )
                .service(
                    web::resource("/list")
                        .wrap(JwtAuth::new(secret))
                        .route(web::get().to(handlers::orders::list_orders)),
                )
                .service(
                    web::resource("/status")
                        .wrap(JwtAuth::new(secret))
                        .route(web::post().to(handlers::orders::update_status)),
                ),
        );
}

async fn health(cache: web::Data<ResponseCache>) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "cache": cache.connectivity().as_str(),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
