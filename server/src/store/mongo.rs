use async_trait::async_trait;
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, Document},
    options::{FindOneAndUpdateOptions, ReplaceOptions, ReturnDocument},
    Client, Collection, Database,
};
use tracing::info;

use super::{Store, StoreError};
use crate::models::{
    Address, AddressUpdate, Admin, Cart, Category, Order, Product, User, Voice,
};

/// MongoDB-backed [`Store`]. One collection per record type; all ids are
/// stored as hex strings under `_id`.
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    pub async fn connect(url: &str, db_name: &str) -> Result<Self, StoreError> {
        let client = Client::with_uri_str(url).await?;
        info!("Connected to MongoDB at {url}, database {db_name}");

        Ok(Self {
            db: client.database(db_name),
        })
    }

    fn admins(&self) -> Collection<Admin> {
        self.db.collection("admins")
    }

    fn users(&self) -> Collection<User> {
        self.db.collection("users")
    }

    fn categories(&self) -> Collection<Category> {
        self.db.collection("categories")
    }

    fn products(&self) -> Collection<Product> {
        self.db.collection("products")
    }

    fn voices(&self) -> Collection<Voice> {
        self.db.collection("voices")
    }

    fn carts(&self) -> Collection<Cart> {
        self.db.collection("carts")
    }

    fn orders(&self) -> Collection<Order> {
        self.db.collection("orders")
    }

    fn addresses(&self) -> Collection<Address> {
        self.db.collection("addresses")
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn insert_admin(&self, admin: &Admin) -> Result<(), StoreError> {
        self.admins().insert_one(admin, None).await?;
        Ok(())
    }

    async fn admin_by_email(&self, email: &str) -> Result<Option<Admin>, StoreError> {
        Ok(self.admins().find_one(doc! { "email": email }, None).await?)
    }

    async fn admin_by_id(&self, id: &str) -> Result<Option<Admin>, StoreError> {
        Ok(self.admins().find_one(doc! { "_id": id }, None).await?)
    }

    async fn insert_user(&self, user: &User) -> Result<(), StoreError> {
        self.users().insert_one(user, None).await?;
        Ok(())
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "email": email }, None).await?)
    }

    async fn user_by_id(&self, id: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        Ok(self.users().find(None, None).await?.try_collect().await?)
    }

    async fn push_user_address(&self, user_id: &str, address_id: &str) -> Result<(), StoreError> {
        self.users()
            .update_one(
                doc! { "_id": user_id },
                doc! { "$push": { "addresses": address_id } },
                None,
            )
            .await?;
        Ok(())
    }

    async fn insert_category(&self, category: &Category) -> Result<(), StoreError> {
        self.categories().insert_one(category, None).await?;
        Ok(())
    }

    async fn category_by_title(&self, title: &str) -> Result<Option<Category>, StoreError> {
        Ok(self
            .categories()
            .find_one(doc! { "title": title }, None)
            .await?)
    }

    async fn category_by_id(&self, id: &str) -> Result<Option<Category>, StoreError> {
        Ok(self.categories().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self
            .categories()
            .find(None, None)
            .await?
            .try_collect()
            .await?)
    }

    async fn delete_category(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.categories().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_product(&self, product: &Product) -> Result<(), StoreError> {
        self.products().insert_one(product, None).await?;
        Ok(())
    }

    async fn product_by_title(&self, title: &str) -> Result<Option<Product>, StoreError> {
        Ok(self
            .products()
            .find_one(doc! { "title": title }, None)
            .await?)
    }

    async fn product_by_id(&self, id: &str) -> Result<Option<Product>, StoreError> {
        Ok(self.products().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .products()
            .find(None, None)
            .await?
            .try_collect()
            .await?)
    }

    async fn delete_product(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.products().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_voice(&self, voice: &Voice) -> Result<(), StoreError> {
        self.voices().insert_one(voice, None).await?;
        Ok(())
    }

    async fn voice_by_name(&self, voicename: &str) -> Result<Option<Voice>, StoreError> {
        Ok(self
            .voices()
            .find_one(doc! { "voicename": voicename }, None)
            .await?)
    }

    async fn voice_by_id(&self, id: &str) -> Result<Option<Voice>, StoreError> {
        Ok(self.voices().find_one(doc! { "_id": id }, None).await?)
    }

    async fn list_voices(&self, category: Option<&str>) -> Result<Vec<Voice>, StoreError> {
        let filter = category.map(|c| doc! { "category": c });
        Ok(self.voices().find(filter, None).await?.try_collect().await?)
    }

    async fn delete_voice(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.voices().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }

    async fn cart_by_user(&self, user_id: &str) -> Result<Option<Cart>, StoreError> {
        Ok(self.carts().find_one(doc! { "user": user_id }, None).await?)
    }

    async fn save_cart(&self, cart: &Cart) -> Result<(), StoreError> {
        let options = ReplaceOptions::builder().upsert(true).build();
        self.carts()
            .replace_one(doc! { "_id": cart.id.as_str() }, cart, options)
            .await?;
        Ok(())
    }

    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        self.orders().insert_one(order, None).await?;
        Ok(())
    }

    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        Ok(self.orders().find(None, None).await?.try_collect().await?)
    }

    async fn insert_address(&self, address: &Address) -> Result<(), StoreError> {
        self.addresses().insert_one(address, None).await?;
        Ok(())
    }

    async fn address_by_id(&self, id: &str) -> Result<Option<Address>, StoreError> {
        Ok(self.addresses().find_one(doc! { "_id": id }, None).await?)
    }

    async fn addresses_by_user(&self, user_id: &str) -> Result<Vec<Address>, StoreError> {
        Ok(self
            .addresses()
            .find(doc! { "userId": user_id }, None)
            .await?
            .try_collect()
            .await?)
    }

    async fn update_address(
        &self,
        id: &str,
        update: &AddressUpdate,
    ) -> Result<Option<Address>, StoreError> {
        let mut set = Document::new();
        if let Some(street) = &update.street {
            set.insert("street", street.as_str());
        }
        if let Some(city) = &update.city {
            set.insert("city", city.as_str());
        }
        if let Some(state) = &update.state {
            set.insert("state", state.as_str());
        }
        if let Some(postal_code) = &update.postal_code {
            set.insert("postalCode", postal_code.as_str());
        }
        if let Some(country) = &update.country {
            set.insert("country", country.as_str());
        }
        set.insert("updatedAt", Utc::now().to_rfc3339());

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();

        Ok(self
            .addresses()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set }, options)
            .await?)
    }

    async fn delete_address(&self, id: &str) -> Result<bool, StoreError> {
        let result = self.addresses().delete_one(doc! { "_id": id }, None).await?;
        Ok(result.deleted_count > 0)
    }
}
