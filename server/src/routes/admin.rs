//! Admin-scoped handlers: admin auth, user listing, category/product
//! management, order overview, and the AI image helper.

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Extension, Json,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::{self, Principal, PrincipalKind};
use crate::catalog::{self, NewProduct};
use crate::error::AppError;
use crate::models::{Admin, CartItem, Order, Product, User};
use crate::state::AppState;
use crate::uploads;

#[derive(Deserialize)]
pub struct AdminSignupRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct AdminAuthResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub token: String,
}

#[derive(Serialize)]
pub struct AdminProfileResponse {
    pub id: String,
    pub name: String,
    pub email: String,
}

impl From<Admin> for AdminProfileResponse {
    fn from(admin: Admin) -> Self {
        Self {
            id: admin.id,
            name: admin.name,
            email: admin.email,
        }
    }
}

#[derive(Serialize)]
pub struct UserSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<User> for UserSummary {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
        }
    }
}

pub async fn signup(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdminSignupRequest>,
) -> Result<(StatusCode, Json<AdminAuthResponse>), AppError> {
    if req.name.trim().is_empty() || req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Name, email and password are required".to_string(),
        ));
    }
    if state.store.admin_by_email(&req.email).await?.is_some() {
        return Err(AppError::Duplicate("Admin already exists"));
    }

    let admin = Admin::new(req.name, req.email, auth::hash_password(&req.password)?);
    state.store.insert_admin(&admin).await?;

    let token = auth::issue_token(&state.config, PrincipalKind::Admin, &admin.id)?;
    Ok((
        StatusCode::CREATED,
        Json(AdminAuthResponse {
            id: admin.id,
            name: admin.name,
            email: admin.email,
            token,
        }),
    ))
}

pub async fn signin(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SigninRequest>,
) -> Result<Json<AdminAuthResponse>, AppError> {
    let admin = state
        .store
        .admin_by_email(&req.email)
        .await?
        .filter(|a| auth::verify_password(&req.password, &a.password))
        .ok_or(AppError::Unauthorized("Invalid email or password"))?;

    let token = auth::issue_token(&state.config, PrincipalKind::Admin, &admin.id)?;
    Ok(Json(AdminAuthResponse {
        id: admin.id,
        name: admin.name,
        email: admin.email,
        token,
    }))
}

pub async fn signout(
    Extension(principal): Extension<Principal>,
) -> Result<Json<serde_json::Value>, AppError> {
    principal.admin_id()?;
    Ok(Json(json!({ "message": "Signed out successfully" })))
}

pub async fn profile(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<AdminProfileResponse>, AppError> {
    let admin = state
        .store
        .admin_by_id(principal.admin_id()?)
        .await?
        .ok_or(AppError::NotFound("Admin not found"))?;

    Ok(Json(admin.into()))
}

pub async fn users(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    principal.admin_id()?;

    let users = state.store.list_users().await?;
    Ok(Json(users.into_iter().map(Into::into).collect()))
}

pub async fn add_category(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<crate::models::Category>), AppError> {
    principal.admin_id()?;

    let (fields, image) =
        uploads::read_form(multipart, &uploads::image("category"), &state.config.upload_dir)
            .await?;
    let title = uploads::required_field(&fields, "title")?;
    let desc = fields.get("desc").cloned();

    let category = catalog::create_category(state.store.as_ref(), title, desc, image).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn all_categories(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<crate::models::Category>>, AppError> {
    principal.admin_id()?;
    Ok(Json(state.store.list_categories().await?))
}

pub async fn delete_category(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    principal.admin_id()?;

    catalog::delete_category(state.store.as_ref(), &id).await?;
    Ok(Json(json!({ "message": "Category deleted successfully" })))
}

pub async fn add_product(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Product>), AppError> {
    principal.admin_id()?;

    let (fields, image) =
        uploads::read_form(multipart, &uploads::image("product"), &state.config.upload_dir)
            .await?;

    let new = NewProduct {
        title: uploads::required_field(&fields, "title")?,
        desc: uploads::required_field(&fields, "desc")?,
        price: parse_amount(&fields, "price")?,
        mrp: parse_amount(&fields, "mrp")?,
        category: uploads::required_field(&fields, "category")?,
        image,
    };

    let product = catalog::create_product(state.store.as_ref(), new).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn delete_product(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    principal.admin_id()?;

    catalog::delete_product(state.store.as_ref(), &id).await?;
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

#[derive(Serialize)]
pub struct OrderUserRef {
    pub name: String,
    pub email: String,
}

#[derive(Serialize)]
pub struct OrderLineView {
    pub product: Option<Product>,
    pub quantity: u32,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub user: Option<OrderUserRef>,
    pub items: Vec<OrderLineView>,
    pub total_amount: f64,
    pub payment_method: String,
    pub status: crate::models::OrderStatus,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

async fn order_view(state: &AppState, order: Order) -> Result<OrderView, AppError> {
    let user = state
        .store
        .user_by_id(&order.user_id)
        .await?
        .map(|u| OrderUserRef {
            name: u.name,
            email: u.email,
        });

    let mut items = Vec::with_capacity(order.items.len());
    for CartItem { product, quantity } in order.items {
        items.push(OrderLineView {
            product: state.store.product_by_id(&product).await?,
            quantity,
        });
    }

    Ok(OrderView {
        id: order.id,
        user,
        items,
        total_amount: order.total_amount,
        payment_method: order.payment_method,
        status: order.status,
        created_at: order.created_at,
    })
}

pub async fn all_orders(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<OrderView>>, AppError> {
    principal.admin_id()?;

    let orders = state.store.list_orders().await?;
    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        views.push(order_view(&state, order).await?);
    }
    Ok(Json(views))
}

#[derive(Deserialize)]
pub struct AiImageRequest {
    pub name: Option<String>,
}

/// Builds a deterministic generated-image URL for a product name. Nothing
/// is persisted; the client decides what to do with the URL.
pub async fn ai_image(
    Extension(principal): Extension<Principal>,
    Json(req): Json<AiImageRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    principal.admin_id()?;

    let name = req
        .name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("Product name is required".to_string()))?;

    let encoded = utf8_percent_encode(name, NON_ALPHANUMERIC).to_string();
    Ok(Json(json!({
        "message": "Image generated successfully!",
        "imageUrl": format!("https://image.pollinations.ai/prompt/{encoded}"),
    })))
}

fn parse_amount(
    fields: &std::collections::HashMap<String, String>,
    name: &str,
) -> Result<f64, AppError> {
    uploads::required_field(fields, name)?
        .parse::<f64>()
        .map_err(|_| AppError::Validation(format!("{name} must be a number")))
}
