//! Persisted record types. Field names on the wire (and in the store) are
//! camelCase; ids are hex strings minted from ObjectIds at insert time so
//! one representation covers Mongo, the in-memory store, and JSON.

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

pub fn new_id() -> String {
    ObjectId::new().to_hex()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(name: String, email: String, password_hash: String) -> Self {
        Self {
            id: new_id(),
            name,
            email,
            password: password_hash,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    /// Ids of owned Address records. Deleting an address does not scrub its
    /// id from here; the profile join skips ids that no longer resolve.
    pub addresses: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: String, email: String, phone: String, password_hash: String) -> Self {
        Self {
            id: new_id(),
            name,
            email,
            phone,
            password: password_hash,
            addresses: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub desc: Option<String>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub desc: String,
    pub price: f64,
    pub mrp: f64,
    /// Free-form label, not a Category reference.
    pub category: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voice {
    #[serde(rename = "_id")]
    pub id: String,
    pub author: String,
    pub voicename: String,
    pub note: Option<String>,
    /// Category id; must resolve at creation time. No cascade on category
    /// deletion, so reads may find it dangling.
    pub category: String,
    pub audio: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[serde(rename = "_id")]
    pub id: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: Option<String>,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update for an Address; absent fields keep their stored value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressUpdate {
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub product: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "user")]
    pub user_id: String,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn new(user_id: &str) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge semantics: a product appears at most once per cart, duplicate
    /// adds increment the existing line. No upper bound is enforced, so the
    /// increment saturates instead of wrapping.
    pub fn add_line(&mut self, product_id: &str, quantity: u32) {
        match self.items.iter_mut().find(|i| i.product == product_id) {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.items.push(CartItem {
                product: product_id.to_string(),
                quantity,
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "user")]
    pub user_id: String,
    /// Snapshot of the cart lines at confirmation time.
    pub items: Vec<CartItem>,
    pub total_amount: f64,
    pub payment_method: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}
