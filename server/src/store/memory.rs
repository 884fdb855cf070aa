use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use super::{Store, StoreError};
use crate::models::{
    Address, AddressUpdate, Admin, Cart, Category, Order, Product, User, Voice,
};

/// In-process [`Store`] used by the test suite. Same observable semantics
/// as [`super::MongoStore`], minus durability.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

#[derive(Default)]
struct Inner {
    admins: HashMap<String, Admin>,
    users: HashMap<String, User>,
    categories: HashMap<String, Category>,
    products: HashMap<String, Product>,
    voices: HashMap<String, Voice>,
    carts: HashMap<String, Cart>,
    orders: Vec<Order>,
    addresses: HashMap<String, Address>,
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_admin(&self, admin: &Admin) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .admins
            .insert(admin.id.clone(), admin.clone());
        Ok(())
    }

    async fn admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.admins.values().find(|a| a.email == email).cloned())
    }

    async fn admin_by_id(&self, id: &str) -> Result<Option<Admin>, StoreError> {
        Ok(self.inner.read().await.admins.get(id).cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .users
            .insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.inner.read().await.users.values().cloned().collect())
    }

    async fn push_user_address(&self, user_id: &str, address_id: &str) -> Result<(), StoreError> {
        if let Some(user) = self.inner.write().await.users.get_mut(user_id) {
            user.addresses.push(address_id.to_string());
        }
        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .categories
            .insert(category.id.clone(), category.clone());
        Ok(())
    }

    async fn category_by_title(&self, title: &str) -> Result<Option<Category>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.categories.values().find(|c| c.title == title).cloned())
    }

    async fn category_by_id(&self, id: &str) -> Result<Option<Category>, StoreError> {
        Ok(self.inner.read().await.categories.get(id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.inner.read().await.categories.values().cloned().collect())
    }

    async fn delete_category(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.categories.remove(id).is_some())
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .products
            .insert(product.id.clone(), product.clone());
        Ok(())
    }

    async fn product_by_title(&self, title: &str) -> Result<Option<Product>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.products.values().find(|p| p.title == title).cloned())
    }

    async fn product_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.inner.read().await.products.get(id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self.inner.read().await.products.values().cloned().collect())
    }

    async fn delete_product(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.products.remove(id).is_some())
    }

    async fn insert_voice(&self, voice: &Voice) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .voices
            .insert(voice.id.clone(), voice.clone());
        Ok(())
    }

    async fn voice_by_name(&self, voicename: &str) -> Result<Option<Voice>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .voices
            .values()
            .find(|v| v.voicename == voicename)
            .cloned())
    }

    async fn voice_by_id(&self, id: &str) -> Result<Option<Voice>, StoreError> {
        Ok(self.inner.read().await.voices.get(id).cloned())
    }

    async fn list_voices(&self, category: Option<&str>) -> Result<Vec<Voice>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .voices
            .values()
            .filter(|v| category.map_or(true, |c| v.category == c))
            .cloned()
            .collect())
    }

    async fn delete_voice(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.voices.remove(id).is_some())
    }

    async fn cart_by_user(&self, user_id: &str) -> Result<Option<Cart>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.carts.values().find(|c| c.user_id == user_id).cloned())
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .carts
            .insert(cart.id.clone(), cart.clone());
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        self.inner.write().await.orders.push(order.clone());
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.inner.read().await.orders.clone())
    }

    async fn insert_address(&self, address: &Address) -> Result<(), StoreError> {
        self.inner
            .write()
            .await
            .addresses
            .insert(address.id.clone(), address.clone());
        Ok(())
    }

    async fn address_by_id(&self, id: &str) -> Result<Option<Address>, StoreError> {
        Ok(self.inner.read().await.addresses.get(id).cloned())
    }

    async fn addresses_by_user(&self, user_id: &str) -> Result<Vec<Address>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .addresses
            .values()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update_address(
        &self,
        id: &str,
        update: &AddressUpdate,
    ) -> Result<Option<Address>, StoreError> {
        let mut inner = self.inner.write().await;
        let Some(address) = inner.addresses.get_mut(id) else {
            return Ok(None);
        };

        if let Some(street) = &update.street {
            address.street = street.clone();
        }
        if let Some(city) = &update.city {
            address.city = city.clone();
        }
        if let Some(state) = &update.state {
            address.state = state.clone();
        }
        if let Some(postal_code) = &update.postal_code {
            address.postal_code = postal_code.clone();
        }
        if let Some(country) = &update.country {
            address.country = Some(country.clone());
        }
        address.updated_at = Utc::now();

        Ok(Some(address.clone()))
    }

    async fn delete_address(&self, id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.write().await.addresses.remove(id).is_some())
    }
}
