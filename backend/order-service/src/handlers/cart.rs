/// Cart handlers - per-user item-id to quantity map
///
/// All routes here sit behind `JwtAuth`. The request payloads still carry the
/// legacy `user_id` field; the compat shim fills it from the verified
/// identity so older clients sending their own value cannot act as someone
/// else.
use actix_middleware::{compat, compat::LegacyUserField, UserId};
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::Result;
use crate::handlers::data_response;
use crate::store::AppStore;

#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub item_id: Uuid,
    #[serde(default)]
    pub user_id: Option<String>,
}

impl LegacyUserField for CartItemRequest {
    fn set_user_id(&mut self, user_id: String) {
        self.user_id = Some(user_id);
    }
}

pub async fn add_to_cart(
    store: web::Data<AppStore>,
    user: UserId,
    req: web::Json<CartItemRequest>,
) -> Result<HttpResponse> {
    let mut req = req.into_inner();
    compat::inject_user_id(user, &mut req);

    Ok(data_response(store.cart_add(user.0, req.item_id)))
}

pub async fn remove_from_cart(
    store: web::Data<AppStore>,
    user: UserId,
    req: web::Json<CartItemRequest>,
) -> Result<HttpResponse> {
    let mut req = req.into_inner();
    compat::inject_user_id(user, &mut req);

    Ok(data_response(store.cart_remove(user.0, req.item_id)))
}

pub async fn get_cart(store: web::Data<AppStore>, user: UserId) -> Result<HttpResponse> {
    Ok(data_response(store.cart(user.0)))
}
