//! Customer-facing handlers: user auth and profile, the public catalog
//! reads, the address book, and the cart/checkout endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{self, Principal, PrincipalKind};
use crate::cart::{self, CartView, CheckoutView};
use crate::error::AppError;
use crate::models::{new_id, Address, AddressUpdate, Category, Order, Product, User};
use crate::state::AppState;

use super::admin::SigninRequest;

#[derive(Deserialize)]
pub struct UserSignupRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct UserAuthResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub token: String,
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<UserSignupRequest>,
) -> Result<(StatusCode, Json<UserAuthResponse>), AppError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required".to_string(),
        ));
    }
    if state.store.user_by_email(&req.email).await?.is_some() {
        return Err(AppError::Duplicate("User already exists"));
    }

    let user = User::new(
        req.name,
        req.email,
        req.phone,
        auth::hash_password(&req.password)?,
    );
    state.store.insert_user(&user).await?;

    let token = auth::issue_token(&state.config, PrincipalKind::User, &user.id)?;
    Ok((
        StatusCode::CREATED,
        Json(UserAuthResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            token,
        }),
    ))
}

pub async fn signin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SigninRequest>,
) -> Result<Json<UserAuthResponse>, AppError> {
    let user = state
        .store
        .user_by_email(&req.email)
        .await?
        .filter(|u| auth::verify_password(&req.password, &u.password))
        .ok_or(AppError::Unauthorized("Invalid email or password"))?;

    let token = auth::issue_token(&state.config, PrincipalKind::User, &user.id)?;
    Ok(Json(UserAuthResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        phone: user.phone,
        token,
    }))
}

pub async fn signout(
    Extension(principal): Extension<Principal>,
) -> Result<Json<serde_json::Value>, AppError> {
    principal.user_id()?;
    Ok(Json(json!({ "message": "Signed out successfully" })))
}

#[derive(Serialize)]
pub struct UserProfileResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// Resolved Address records; ids that no longer resolve are skipped.
    pub addresses: Vec<Address>,
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<UserProfileResponse>, AppError> {
    let user = state
        .store
        .user_by_id(principal.user_id()?)
        .await?
        .ok_or(AppError::NotFound("User not found"))?;

    let mut addresses = Vec::with_capacity(user.addresses.len());
    for id in &user.addresses {
        if let Some(address) = state.store.address_by_id(id).await? {
            addresses.push(address);
        }
    }

    Ok(Json(UserProfileResponse {
        id: user.id,
        name: user.name,
        email: user.email,
        phone: user.phone,
        addresses,
    }))
}

// Public catalog reads.

pub async fn all_products(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Product>>, AppError> {
    Ok(Json(state.store.list_products().await?))
}

pub async fn all_categories(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Category>>, AppError> {
    Ok(Json(state.store.list_categories().await?))
}

pub async fn product_by_id(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Product>, AppError> {
    let product = state
        .store
        .product_by_id(&id)
        .await?
        .ok_or(AppError::NotFound("Product not found"))?;

    Ok(Json(product))
}

// Address book.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressRequest {
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: Option<String>,
}

/// Two writes: the Address record, then the id appended to the owning
/// User's list. Not atomic; a failure in between leaves an unlinked record.
pub async fn add_address(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<AddressRequest>,
) -> Result<(StatusCode, Json<serde_json::Value>), AppError> {
    let user_id = principal.user_id()?;
    let now = Utc::now();

    let address = Address {
        id: new_id(),
        street: req.street,
        city: req.city,
        state: req.state,
        postal_code: req.postal_code,
        country: req.country,
        user_id: user_id.to_string(),
        created_at: now,
        updated_at: now,
    };
    state.store.insert_address(&address).await?;
    state.store.push_user_address(user_id, &address.id).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "Address added successfully!", "address": address })),
    ))
}

pub async fn all_addresses(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<Address>>, AppError> {
    Ok(Json(
        state.store.addresses_by_user(principal.user_id()?).await?,
    ))
}

/// Addresses are scoped to their owner: an id belonging to someone else is
/// indistinguishable from a missing one.
async fn check_address_owner(
    state: &AppState,
    user_id: &str,
    address_id: &str,
) -> Result<(), AppError> {
    state
        .store
        .address_by_id(address_id)
        .await?
        .filter(|a| a.user_id == user_id)
        .map(|_| ())
        .ok_or(AppError::NotFound("Address not found"))
}

pub async fn update_address(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
    Json(req): Json<AddressUpdate>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_address_owner(&state, principal.user_id()?, &id).await?;

    let address = state
        .store
        .update_address(&id, &req)
        .await?
        .ok_or(AppError::NotFound("Address not found"))?;

    Ok(Json(
        json!({ "message": "Address updated successfully!", "address": address }),
    ))
}

/// Deletes the record only; the id already pushed onto User.addresses is
/// left dangling and skipped by the profile join.
pub async fn delete_address(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    check_address_owner(&state, principal.user_id()?, &id).await?;

    if !state.store.delete_address(&id).await? {
        return Err(AppError::NotFound("Address not found"));
    }
    Ok(Json(json!({ "message": "Address deleted successfully" })))
}

// Cart & checkout.

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateQuantityRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoveItemRequest {
    pub product_id: String,
}

pub async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<AddToCartRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let view = cart::add_to_cart(
        state.store.as_ref(),
        principal.user_id()?,
        &req.product_id,
        req.quantity,
    )
    .await?;

    Ok(Json(
        json!({ "message": "Product added to cart", "cart": view }),
    ))
}

pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<CartView>, AppError> {
    Ok(Json(
        cart::get_cart(state.store.as_ref(), principal.user_id()?).await?,
    ))
}

pub async fn update_quantity(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<UpdateQuantityRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let view = cart::update_quantity(
        state.store.as_ref(),
        principal.user_id()?,
        &req.product_id,
        req.quantity,
    )
    .await?;

    Ok(Json(json!({ "message": "Cart updated", "cart": view })))
}

pub async fn remove_item(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<RemoveItemRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let view = cart::remove_from_cart(
        state.store.as_ref(),
        principal.user_id()?,
        &req.product_id,
    )
    .await?;

    Ok(Json(
        json!({ "message": "Product removed from cart", "cart": view }),
    ))
}

pub async fn checkout(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<CheckoutView>, AppError> {
    Ok(Json(
        cart::checkout(state.store.as_ref(), principal.user_id()?).await?,
    ))
}

#[derive(Serialize)]
pub struct ConfirmOrderResponse {
    pub message: &'static str,
    pub order: Order,
}

pub async fn confirm_order(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<ConfirmOrderResponse>, AppError> {
    let order = cart::confirm_order(state.store.as_ref(), principal.user_id()?).await?;

    Ok(Json(ConfirmOrderResponse {
        message: "Order placed successfully",
        order,
    }))
}
