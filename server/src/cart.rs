//! Cart and checkout workflow. One cart per user, created lazily on the
//! first add. Confirmation snapshots the cart into an Order and then clears
//! the cart's items; the two writes are separate store calls, so a crash in
//! between leaves both the order and the un-cleared cart persisted. Cart
//! mutation itself is a read-modify-write without locking, matching the
//! store's per-write atomicity.

use chrono::Utc;
use serde::Serialize;

use crate::error::AppError;
use crate::models::{new_id, Cart, Order, OrderStatus, Product};
use crate::store::Store;

const PAYMENT_METHOD: &str = "Cash on Delivery";

#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub image: Option<String>,
}

impl From<Product> for ProductSummary {
    fn from(p: Product) -> Self {
        Self {
            id: p.id,
            title: p.title,
            price: p.price,
            image: p.image,
        }
    }
}

/// A cart line with its product reference expanded. `product` is None when
/// the product was deleted after being added to the cart.
#[derive(Debug, Serialize)]
pub struct ExpandedLine {
    pub product: Option<ProductSummary>,
    pub quantity: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub id: String,
    pub user: String,
    pub items: Vec<ExpandedLine>,
    pub updated_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutView {
    pub cart: Vec<ExpandedLine>,
    pub total_price: f64,
}

async fn expand_lines(store: &dyn Store, cart: &Cart) -> Result<Vec<ExpandedLine>, AppError> {
    let mut lines = Vec::with_capacity(cart.items.len());
    for item in &cart.items {
        let product = store.product_by_id(&item.product).await?;
        lines.push(ExpandedLine {
            product: product.map(Into::into),
            quantity: item.quantity,
        });
    }
    Ok(lines)
}

/// Checkout and confirm share this: deleted products contribute nothing.
fn total_price(lines: &[ExpandedLine]) -> f64 {
    lines
        .iter()
        .filter_map(|l| l.product.as_ref().map(|p| p.price * f64::from(l.quantity)))
        .sum()
}

pub async fn add_to_cart(
    store: &dyn Store,
    user_id: &str,
    product_id: &str,
    quantity: i64,
) -> Result<CartView, AppError> {
    let quantity = positive_quantity(quantity)?;

    if store.product_by_id(product_id).await?.is_none() {
        return Err(AppError::NotFound("Product not found"));
    }

    let mut cart = match store.cart_by_user(user_id).await? {
        Some(cart) => cart,
        None => Cart::new(user_id),
    };

    cart.add_line(product_id, quantity);
    cart.updated_at = Utc::now();
    store.save_cart(&cart).await?;

    view(store, cart).await
}

pub async fn get_cart(store: &dyn Store, user_id: &str) -> Result<CartView, AppError> {
    let cart = store
        .cart_by_user(user_id)
        .await?
        .ok_or(AppError::NotFound("Cart not found"))?;

    view(store, cart).await
}

/// Removing a product that is not in the cart is a silent no-op.
pub async fn remove_from_cart(
    store: &dyn Store,
    user_id: &str,
    product_id: &str,
) -> Result<CartView, AppError> {
    let mut cart = store
        .cart_by_user(user_id)
        .await?
        .ok_or(AppError::NotFound("Cart not found"))?;

    cart.items.retain(|item| item.product != product_id);
    cart.updated_at = Utc::now();
    store.save_cart(&cart).await?;

    view(store, cart).await
}

pub async fn update_quantity(
    store: &dyn Store,
    user_id: &str,
    product_id: &str,
    quantity: i64,
) -> Result<CartView, AppError> {
    let quantity = positive_quantity(quantity)?;

    let mut cart = store
        .cart_by_user(user_id)
        .await?
        .ok_or(AppError::NotFound("Cart not found"))?;

    let line = cart
        .items
        .iter_mut()
        .find(|item| item.product == product_id)
        .ok_or(AppError::NotFound("Product not found in cart"))?;

    line.quantity = quantity;
    cart.updated_at = Utc::now();
    store.save_cart(&cart).await?;

    view(store, cart).await
}

/// Read-only preview: expanded lines plus the total the confirmation step
/// would charge.
pub async fn checkout(store: &dyn Store, user_id: &str) -> Result<CheckoutView, AppError> {
    let cart = non_empty_cart(store, user_id).await?;
    let lines = expand_lines(store, &cart).await?;
    let total = total_price(&lines);

    Ok(CheckoutView {
        cart: lines,
        total_price: total,
    })
}

/// Snapshots the cart into an Order, persists it, then clears the cart's
/// items (the cart record itself is kept). Not transactional.
pub async fn confirm_order(store: &dyn Store, user_id: &str) -> Result<Order, AppError> {
    let mut cart = non_empty_cart(store, user_id).await?;

    let lines = expand_lines(store, &cart).await?;
    let order = Order {
        id: new_id(),
        user_id: user_id.to_string(),
        items: cart.items.clone(),
        total_amount: total_price(&lines),
        payment_method: PAYMENT_METHOD.to_string(),
        status: OrderStatus::Pending,
        created_at: Utc::now(),
    };
    store.insert_order(&order).await?;

    cart.items.clear();
    cart.updated_at = Utc::now();
    store.save_cart(&cart).await?;

    Ok(order)
}

async fn non_empty_cart(store: &dyn Store, user_id: &str) -> Result<Cart, AppError> {
    match store.cart_by_user(user_id).await? {
        Some(cart) if !cart.items.is_empty() => Ok(cart),
        _ => Err(AppError::NotFound("Your cart is empty")),
    }
}

fn positive_quantity(quantity: i64) -> Result<u32, AppError> {
    u32::try_from(quantity)
        .ok()
        .filter(|q| *q > 0)
        .ok_or_else(|| AppError::Validation("Quantity must be a positive integer".to_string()))
}

async fn view(store: &dyn Store, cart: Cart) -> Result<CartView, AppError> {
    let items = expand_lines(store, &cart).await?;
    Ok(CartView {
        id: cart.id,
        user: cart.user_id,
        items,
        updated_at: cart.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{create_product, NewProduct};
    use crate::store::MemoryStore;

    async fn seeded_store() -> (MemoryStore, String, String) {
        let store = MemoryStore::default();
        let a = create_product(
            &store,
            NewProduct {
                title: "Brass Lamp".into(),
                desc: "a".into(),
                price: 100.0,
                mrp: 120.0,
                category: "lamps".into(),
                image: None,
            },
        )
        .await
        .unwrap();
        let b = create_product(
            &store,
            NewProduct {
                title: "Oil Bottle".into(),
                desc: "b".into(),
                price: 50.0,
                mrp: 60.0,
                category: "oil".into(),
                image: None,
            },
        )
        .await
        .unwrap();

        (store, a.id, b.id)
    }

    #[tokio::test]
    async fn duplicate_adds_merge_into_one_line() {
        let (store, a, _) = seeded_store().await;

        add_to_cart(&store, "u1", &a, 2).await.unwrap();
        let view = add_to_cart(&store, "u1", &a, 3).await.unwrap();

        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 5);
    }

    #[tokio::test]
    async fn add_rejects_non_positive_quantity() {
        let (store, a, _) = seeded_store().await;

        for q in [0, -1] {
            assert!(matches!(
                add_to_cart(&store, "u1", &a, q).await,
                Err(AppError::Validation(_))
            ));
        }
        assert!(store.cart_by_user("u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn add_rejects_unknown_product() {
        let (store, _, _) = seeded_store().await;

        assert!(matches!(
            add_to_cart(&store, "u1", &new_id(), 1).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn get_cart_before_first_add_is_not_found() {
        let (store, _, _) = seeded_store().await;

        assert!(matches!(
            get_cart(&store, "u1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn remove_of_absent_line_is_a_noop() {
        let (store, a, b) = seeded_store().await;
        add_to_cart(&store, "u1", &a, 2).await.unwrap();

        let view = remove_from_cart(&store, "u1", &b).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn remove_drops_the_matching_line() {
        let (store, a, b) = seeded_store().await;
        add_to_cart(&store, "u1", &a, 2).await.unwrap();
        add_to_cart(&store, "u1", &b, 1).await.unwrap();

        let view = remove_from_cart(&store, "u1", &a).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(
            view.items[0].product.as_ref().unwrap().title,
            "Oil Bottle"
        );
    }

    #[tokio::test]
    async fn update_quantity_sets_the_value() {
        let (store, a, _) = seeded_store().await;
        add_to_cart(&store, "u1", &a, 2).await.unwrap();

        let view = update_quantity(&store, "u1", &a, 7).await.unwrap();
        assert_eq!(view.items[0].quantity, 7);
    }

    #[tokio::test]
    async fn update_quantity_for_missing_line_is_not_found_and_cart_unchanged() {
        let (store, a, b) = seeded_store().await;
        add_to_cart(&store, "u1", &a, 3).await.unwrap();

        assert!(matches!(
            update_quantity(&store, "u1", &b, 2).await,
            Err(AppError::NotFound(_))
        ));

        let cart = store.cart_by_user("u1").await.unwrap().unwrap();
        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 3);
    }

    #[tokio::test]
    async fn update_quantity_rejects_non_positive_values() {
        let (store, a, _) = seeded_store().await;
        add_to_cart(&store, "u1", &a, 2).await.unwrap();

        assert!(matches!(
            update_quantity(&store, "u1", &a, 0).await,
            Err(AppError::Validation(_))
        ));
        let cart = store.cart_by_user("u1").await.unwrap().unwrap();
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[tokio::test]
    async fn checkout_and_confirm_compute_the_same_total() {
        let (store, a, b) = seeded_store().await;
        add_to_cart(&store, "u1", &a, 2).await.unwrap();
        add_to_cart(&store, "u1", &b, 1).await.unwrap();

        let preview = checkout(&store, "u1").await.unwrap();
        assert_eq!(preview.total_price, 250.0);

        let order = confirm_order(&store, "u1").await.unwrap();
        assert_eq!(order.total_amount, preview.total_price);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, "Cash on Delivery");
    }

    #[tokio::test]
    async fn confirm_clears_cart_and_repeat_fails_empty() {
        let (store, a, _) = seeded_store().await;
        add_to_cart(&store, "u1", &a, 2).await.unwrap();

        confirm_order(&store, "u1").await.unwrap();

        let cart = store.cart_by_user("u1").await.unwrap().unwrap();
        assert!(cart.items.is_empty());

        assert!(matches!(
            confirm_order(&store, "u1").await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(store.list_orders().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn checkout_with_no_cart_is_empty_cart() {
        let (store, _, _) = seeded_store().await;

        assert!(matches!(
            checkout(&store, "u1").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn cart_can_be_refilled_after_confirmation() {
        let (store, a, b) = seeded_store().await;
        add_to_cart(&store, "u1", &a, 1).await.unwrap();
        confirm_order(&store, "u1").await.unwrap();

        let view = add_to_cart(&store, "u1", &b, 4).await.unwrap();
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].quantity, 4);
    }

    #[tokio::test]
    async fn deleted_product_contributes_nothing_to_the_total() {
        let (store, a, b) = seeded_store().await;
        add_to_cart(&store, "u1", &a, 2).await.unwrap();
        add_to_cart(&store, "u1", &b, 1).await.unwrap();

        store.delete_product(&b).await.unwrap();

        let preview = checkout(&store, "u1").await.unwrap();
        assert_eq!(preview.total_price, 200.0);
        assert!(preview.cart.iter().any(|l| l.product.is_none()));
    }
}
