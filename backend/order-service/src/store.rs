//! In-process repositories backing the handlers.
//!
//! Persistence proper is an external collaborator of this service; handlers
//! treat the store the way they would treat a database client, so swapping
//! in a real one touches nothing above this module.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::collections::HashMap;
use uuid::Uuid;

use crate::models::{FoodItem, Order, OrderStatus, User};

#[derive(Default)]
pub struct AppStore {
    users: DashMap<Uuid, User>,
    users_by_email: DashMap<String, Uuid>,
    foods: DashMap<Uuid, FoodItem>,
    carts: DashMap<Uuid, HashMap<Uuid, u32>>,
    orders: DashMap<Uuid, Order>,
}

impl AppStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ============= Users =============

    /// Insert a user; returns false when the email is already registered.
    pub fn insert_user(&self, user: User) -> bool {
        match self.users_by_email.entry(user.email.to_lowercase()) {
            Entry::Occupied(_) => false,
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(user.id, user);
                true
            }
        }
    }

    pub fn find_user_by_email(&self, email: &str) -> Option<User> {
        let id = *self.users_by_email.get(&email.to_lowercase())?;
        self.users.get(&id).map(|u| u.clone())
    }

    // ============= Food catalog =============

    pub fn add_food(&self, item: FoodItem) {
        self.foods.insert(item.id, item);
    }

    pub fn remove_food(&self, id: Uuid) -> Option<FoodItem> {
        self.foods.remove(&id).map(|(_, item)| item)
    }

    pub fn list_foods(&self) -> Vec<FoodItem> {
        let mut items: Vec<_> = self.foods.iter().map(|e| e.value().clone()).collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        items
    }

    // ============= Carts =============

    pub fn cart_add(&self, user_id: Uuid, item_id: Uuid) -> HashMap<Uuid, u32> {
        let mut cart = self.carts.entry(user_id).or_default();
        *cart.entry(item_id).or_insert(0) += 1;
        cart.clone()
    }

    pub fn cart_remove(&self, user_id: Uuid, item_id: Uuid) -> HashMap<Uuid, u32> {
        let mut cart = self.carts.entry(user_id).or_default();
        match cart.get_mut(&item_id) {
            Some(qty) if *qty > 1 => *qty -= 1,
            Some(_) => {
                cart.remove(&item_id);
            }
            None => {}
        }
        cart.clone()
    }

    pub fn cart(&self, user_id: Uuid) -> HashMap<Uuid, u32> {
        self.carts
            .get(&user_id)
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn clear_cart(&self, user_id: Uuid) {
        self.carts.remove(&user_id);
    }

    // ============= Orders =============

    pub fn insert_order(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn remove_order(&self, id: Uuid) -> Option<Order> {
        self.orders.remove(&id).map(|(_, order)| order)
    }

    pub fn user_orders(&self, user_id: Uuid) -> Vec<Order> {
        let mut orders: Vec<_> = self
            .orders
            .iter()
            .filter(|e| e.value().user_id == user_id)
            .map(|e| e.value().clone())
            .collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    pub fn all_orders(&self) -> Vec<Order> {
        let mut orders: Vec<_> = self.orders.iter().map(|e| e.value().clone()).collect();
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders
    }

    pub fn set_order_status(&self, id: Uuid, status: OrderStatus) -> bool {
        match self.orders.get_mut(&id) {
            Some(mut order) => {
                order.status = status;
                true
            }
            None => false,
        }
    }

    pub fn mark_order_paid(&self, id: Uuid) -> bool {
        match self.orders.get_mut(&id) {
            Some(mut order) => {
                order.paid = true;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::models::DeliveryAddress;

    fn user(email: &str) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test".into(),
            email: email.into(),
            password_hash: "hash".into(),
        }
    }

    #[test]
    fn email_uniqueness_is_case_insensitive() {
        let store = AppStore::new();
        assert!(store.insert_user(user("a@example.com")));
        assert!(!store.insert_user(user("A@Example.com")));
        assert!(store.find_user_by_email("A@EXAMPLE.COM").is_some());
    }

    #[test]
    fn cart_add_and_remove_track_quantities() {
        let store = AppStore::new();
        let user_id = Uuid::new_v4();
        let item = Uuid::new_v4();

        store.cart_add(user_id, item);
        let cart = store.cart_add(user_id, item);
        assert_eq!(cart.get(&item), Some(&2));

        let cart = store.cart_remove(user_id, item);
        assert_eq!(cart.get(&item), Some(&1));

        let cart = store.cart_remove(user_id, item);
        assert!(cart.is_empty());

        // Removing from an empty cart is a no-op
        let cart = store.cart_remove(user_id, item);
        assert!(cart.is_empty());
    }

    #[test]
    fn user_orders_are_scoped_and_newest_first() {
        let store = AppStore::new();
        let user_id = Uuid::new_v4();
        let other = Uuid::new_v4();

        let address = DeliveryAddress {
            street: "1 Main St".into(),
            city: "Springfield".into(),
            state: "IL".into(),
            zip_code: "62704".into(),
            country: "US".into(),
        };

        for (owner, minutes_ago) in [(user_id, 10), (other, 5), (user_id, 1)] {
            store.insert_order(Order {
                id: Uuid::new_v4(),
                user_id: owner,
                items: vec![],
                total_amount: 10.0,
                delivery_address: address.clone(),
                status: OrderStatus::Pending,
                paid: false,
                created_at: Utc::now() - chrono::Duration::minutes(minutes_ago),
            });
        }

        let orders = store.user_orders(user_id);
        assert_eq!(orders.len(), 2);
        assert!(orders[0].created_at > orders[1].created_at);
    }
}
