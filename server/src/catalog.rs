//! Catalog operations for categories, products, and voices. Uniqueness of
//! the natural keys (title / voicename) is enforced by a find-then-insert
//! sequence; the store only guarantees atomicity per individual write.
//! Deletions never cascade: records referencing a deleted category are left
//! dangling and surface a null category at read time.

use chrono::Utc;

use crate::error::AppError;
use crate::models::{new_id, Category, Product, Voice};
use crate::store::Store;

pub struct NewProduct {
    pub title: String,
    pub desc: String,
    pub price: f64,
    pub mrp: f64,
    pub category: String,
    pub image: Option<String>,
}

pub struct NewVoice {
    pub author: String,
    pub voicename: String,
    pub note: Option<String>,
    pub category_id: String,
    pub audio: String,
}

pub async fn create_category(
    store: &dyn Store,
    title: String,
    desc: Option<String>,
    image: Option<String>,
) -> Result<Category, AppError> {
    if store.category_by_title(&title).await?.is_some() {
        return Err(AppError::Duplicate("Category already exists"));
    }

    let category = Category {
        id: new_id(),
        title,
        desc,
        image,
        created_at: Utc::now(),
    };
    store.insert_category(&category).await?;

    Ok(category)
}

pub async fn delete_category(store: &dyn Store, id: &str) -> Result<(), AppError> {
    if !store.delete_category(id).await? {
        return Err(AppError::NotFound("Category not found"));
    }
    Ok(())
}

pub async fn create_product(store: &dyn Store, new: NewProduct) -> Result<Product, AppError> {
    if new.price < 0.0 || new.mrp < 0.0 {
        return Err(AppError::Validation(
            "Price and MRP must not be negative".to_string(),
        ));
    }
    if store.product_by_title(&new.title).await?.is_some() {
        return Err(AppError::Duplicate("Product already exists"));
    }

    let product = Product {
        id: new_id(),
        title: new.title,
        desc: new.desc,
        price: new.price,
        mrp: new.mrp,
        category: new.category,
        image: new.image,
        created_at: Utc::now(),
    };
    store.insert_product(&product).await?;

    Ok(product)
}

pub async fn delete_product(store: &dyn Store, id: &str) -> Result<(), AppError> {
    if !store.delete_product(id).await? {
        return Err(AppError::NotFound("Product not found"));
    }
    Ok(())
}

pub async fn create_voice(store: &dyn Store, new: NewVoice) -> Result<Voice, AppError> {
    if store.voice_by_name(&new.voicename).await?.is_some() {
        return Err(AppError::Duplicate("This voice name already exists"));
    }
    if store.category_by_id(&new.category_id).await?.is_none() {
        return Err(AppError::Validation(
            "Category does not exist".to_string(),
        ));
    }

    let voice = Voice {
        id: new_id(),
        author: new.author,
        voicename: new.voicename,
        note: new.note,
        category: new.category_id,
        audio: new.audio,
        created_at: Utc::now(),
    };
    store.insert_voice(&voice).await?;

    Ok(voice)
}

pub async fn delete_voice(store: &dyn Store, id: &str) -> Result<(), AppError> {
    if !store.delete_voice(id).await? {
        return Err(AppError::NotFound("Voice not found"));
    }
    Ok(())
}
