/// Order handlers - checkout, payment verification, tracking
use actix_middleware::{compat, compat::LegacyUserField, UserId};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::handlers::{data_response, message_response};
use crate::models::{DeliveryAddress, Order, OrderItem, OrderStatus};
use crate::store::AppStore;

#[derive(Debug, Deserialize)]
pub struct PlaceOrderRequest {
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub delivery_address: DeliveryAddress,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl LegacyUserField for PlaceOrderRequest {
    fn set_user_id(&mut self, user_id: String) {
        self.user_id = Some(user_id);
    }
}

/// Payment callback payload; `success` comes from the payment provider
#[derive(Debug, Deserialize)]
pub struct VerifyOrderRequest {
    pub order_id: Uuid,
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub order_id: Uuid,
    pub status: OrderStatus,
}

pub async fn place_order(
    store: web::Data<AppStore>,
    user: UserId,
    req: web::Json<PlaceOrderRequest>,
) -> Result<HttpResponse> {
    let mut req = req.into_inner();
    compat::inject_user_id(user, &mut req);

    if req.items.is_empty() {
        return Err(AppError::BadRequest("Order must contain items".into()));
    }
    if req.total_amount <= 0.0 {
        return Err(AppError::BadRequest("Total amount must be positive".into()));
    }

    let order = Order {
        id: Uuid::new_v4(),
        user_id: user.0,
        items: req.items,
        total_amount: req.total_amount,
        delivery_address: req.delivery_address,
        status: OrderStatus::Pending,
        paid: false,
        created_at: Utc::now(),
    };
    let order_id = order.id;

    store.insert_order(order.clone());
    store.clear_cart(user.0);

    info!(order_id = %order_id, user_id = %user.0, "order placed");
    Ok(data_response(order))
}

pub async fn verify_order(
    store: web::Data<AppStore>,
    req: web::Json<VerifyOrderRequest>,
) -> Result<HttpResponse> {
    if req.success {
        if !store.mark_order_paid(req.order_id) {
            return Err(AppError::NotFound("Order not found".into()));
        }
        Ok(message_response("Paid"))
    } else {
        if store.remove_order(req.order_id).is_none() {
            return Err(AppError::NotFound("Order not found".into()));
        }
        Ok(message_response("Payment failed, order cancelled"))
    }
}

pub async fn user_orders(store: web::Data<AppStore>, user: UserId) -> Result<HttpResponse> {
    Ok(data_response(store.user_orders(user.0)))
}

pub async fn list_orders(store: web::Data<AppStore>) -> Result<HttpResponse> {
    Ok(data_response(store.all_orders()))
}

pub async fn update_status(
    store: web::Data<AppStore>,
    req: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse> {
    if !store.set_order_status(req.order_id, req.status) {
        return Err(AppError::NotFound("Order not found".into()));
    }
    Ok(message_response("Status updated"))
}
