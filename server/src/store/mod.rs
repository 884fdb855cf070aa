//! The document-store seam. Handlers and workflow code only see the
//! [`Store`] trait; the concrete client is constructed once at startup and
//! threaded through [`crate::state::AppState`].
//!
//! Every method maps to a single database write or read. Multi-step
//! workflows (cart merge, confirm-then-clear, add-address-then-link) are
//! sequences of these calls with no cross-write transaction, so a crash in
//! the middle leaves the earlier writes in place.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    Address, AddressUpdate, Admin, Cart, Category, Order, Product, User, Voice,
};

mod memory;
mod mongo;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

#[derive(Debug, Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

impl From<mongodb::error::Error> for StoreError {
    fn from(err: mongodb::error::Error) -> Self {
        Self(err.to_string())
    }
}

type Result<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    // Admins
    async fn insert_admin(&self, admin: &Admin) -> Result<()>;
    async fn admin_by_email(&self, email: &str) -> Result<Option<Admin>>;
    async fn admin_by_id(&self, id: &str) -> Result<Option<Admin>>;

    // Users
    async fn insert_user(&self, user: &User) -> Result<()>;
    async fn user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn user_by_id(&self, id: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn push_user_address(&self, user_id: &str, address_id: &str) -> Result<()>;

    // Categories
    async fn insert_category(&self, category: &Category) -> Result<()>;
    async fn category_by_title(&self, title: &str) -> Result<Option<Category>>;
    async fn category_by_id(&self, id: &str) -> Result<Option<Category>>;
    async fn list_categories(&self) -> Result<Vec<Category>>;
    async fn delete_category(&self, id: &str) -> Result<bool>;

    // Products
    async fn insert_product(&self, product: &Product) -> Result<()>;
    async fn product_by_title(&self, title: &str) -> Result<Option<Product>>;
    async fn product_by_id(&self, id: &str) -> Result<Option<Product>>;
    async fn list_products(&self) -> Result<Vec<Product>>;
    async fn delete_product(&self, id: &str) -> Result<bool>;

    // Voices
    async fn insert_voice(&self, voice: &Voice) -> Result<()>;
    async fn voice_by_name(&self, voicename: &str) -> Result<Option<Voice>>;
    async fn voice_by_id(&self, id: &str) -> Result<Option<Voice>>;
    /// `category` filters by category id when given.
    async fn list_voices(&self, category: Option<&str>) -> Result<Vec<Voice>>;
    async fn delete_voice(&self, id: &str) -> Result<bool>;

    // Carts (one per user, created lazily)
    async fn cart_by_user(&self, user_id: &str) -> Result<Option<Cart>>;
    /// Upsert by cart id.
    async fn save_cart(&self, cart: &Cart) -> Result<()>;

    // Orders
    async fn insert_order(&self, order: &Order) -> Result<()>;
    async fn list_orders(&self) -> Result<Vec<Order>>;

    // Addresses
    async fn insert_address(&self, address: &Address) -> Result<()>;
    async fn address_by_id(&self, id: &str) -> Result<Option<Address>>;
    async fn addresses_by_user(&self, user_id: &str) -> Result<Vec<Address>>;
    /// Applies the given fields and returns the updated record, or None if
    /// the id does not exist.
    async fn update_address(&self, id: &str, update: &AddressUpdate) -> Result<Option<Address>>;
    async fn delete_address(&self, id: &str) -> Result<bool>;
}
