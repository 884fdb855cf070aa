//! Route tables. Admin endpoints live under `/api/admin`, the customer and
//! public surface under `/api`, uploaded assets under `/uploads`.

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::auth;
use crate::state::AppState;

pub mod admin;
pub mod user;
pub mod voice;

pub fn router(state: Arc<AppState>) -> Router {
    let protect = middleware::from_fn_with_state(state.clone(), auth::require_principal);

    let admin_protected = Router::new()
        .route("/signout", post(admin::signout))
        .route("/profile", get(admin::profile))
        .route("/users", get(admin::users))
        .route("/add-category", post(admin::add_category))
        .route("/all-categories", get(admin::all_categories))
        .route("/delete-category/:id", delete(admin::delete_category))
        .route("/add-product", post(admin::add_product))
        .route("/delete-product/:id", delete(admin::delete_product))
        .route("/all-orders", get(admin::all_orders))
        .route("/ai-image", post(admin::ai_image))
        .route("/all-voices", get(voice::all_voices))
        .route("/add-voice", post(voice::add_voice))
        .route("/delete-voice/:id", delete(voice::delete_voice))
        .route_layer(protect.clone());

    let admin_routes = Router::new()
        .route("/signup", post(admin::signup))
        .route("/signin", post(admin::signin))
        .merge(admin_protected);

    let user_protected = Router::new()
        .route("/signout", post(user::signout))
        .route("/profile", get(user::profile))
        .route("/all-address", get(user::all_addresses))
        .route("/add-address", post(user::add_address))
        .route("/update-address/:id", post(user::update_address))
        .route("/delete-address/:id", post(user::delete_address))
        .route("/add-to-cart", post(user::add_to_cart))
        .route("/cart", get(user::get_cart))
        // Path misspelling kept for client compatibility.
        .route("/update-quantiy", post(user::update_quantity))
        .route("/remove-item", post(user::remove_item))
        .route("/checkout", get(user::checkout))
        .route("/confirm-order", post(user::confirm_order))
        .route_layer(protect);

    let user_routes = Router::new()
        .route("/signup", post(user::signup))
        .route("/signin", post(user::signin))
        .route("/all-products", get(user::all_products))
        .route("/all-categories", get(user::all_categories))
        .route("/product/:id", get(user::product_by_id))
        .route("/voices", get(voice::voices_by_category))
        .merge(user_protected);

    Router::new()
        .nest("/api/admin", admin_routes)
        .nest("/api", user_routes)
        .nest_service("/uploads", ServeDir::new(&state.config.upload_dir))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::catalog::{create_product, NewProduct};
    use crate::store::MemoryStore;

    fn test_router() -> (Router, Arc<AppState>) {
        let state = AppState::for_tests(Arc::new(MemoryStore::default()));
        (router(state.clone()), state)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn seed_product(state: &AppState, title: &str, price: f64) -> String {
        create_product(
            state.store.as_ref(),
            NewProduct {
                title: title.to_string(),
                desc: "d".to_string(),
                price,
                mrp: price,
                category: "misc".to_string(),
                image: None,
            },
        )
        .await
        .unwrap()
        .id
    }

    async fn signup_user_as(app: &Router, email: &str) -> String {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/signup",
                json!({
                    "name": "Asha",
                    "email": email,
                    "phone": "9999999999",
                    "password": "hunter2",
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let body = body_json(response).await;
        body["token"].as_str().unwrap().to_string()
    }

    async fn signup_user(app: &Router) -> String {
        signup_user_as(app, "asha@example.com").await
    }

    fn with_bearer(mut request: Request<Body>, token: &str) -> Request<Body> {
        request.headers_mut().insert(
            header::AUTHORIZATION,
            format!("Bearer {token}").parse().unwrap(),
        );
        request
    }

    #[tokio::test]
    async fn protected_route_without_token_is_401() {
        let (app, _) = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/cart")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Not authorized, no token");
    }

    #[tokio::test]
    async fn public_catalog_route_needs_no_token() {
        let (app, _) = test_router();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/all-products")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn user_token_is_rejected_on_admin_routes() {
        let (app, _) = test_router();
        let token = signup_user(&app).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/admin/users")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn signin_with_wrong_password_is_401() {
        let (app, _) = test_router();
        signup_user(&app).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/signin",
                json!({ "email": "asha@example.com", "password": "wrong" }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn duplicate_signup_is_400() {
        let (app, _) = test_router();
        signup_user(&app).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/signup",
                json!({
                    "name": "Asha Again",
                    "email": "asha@example.com",
                    "phone": "8888888888",
                    "password": "other",
                }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["message"], "User already exists");
    }

    #[tokio::test]
    async fn address_of_another_user_is_not_found() {
        let (app, _) = test_router();
        let owner = signup_user_as(&app, "asha@example.com").await;
        let other = signup_user_as(&app, "ravi@example.com").await;

        let request = with_bearer(
            json_request(
                "POST",
                "/api/add-address",
                json!({
                    "street": "12 Market Rd",
                    "city": "Pune",
                    "state": "MH",
                    "postalCode": "411001",
                }),
            ),
            &owner,
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        let address_id = body["address"]["_id"].as_str().unwrap().to_string();

        let update = json!({ "city": "Mumbai" });
        let request = with_bearer(
            json_request("POST", &format!("/api/update-address/{address_id}"), update.clone()),
            &other,
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = with_bearer(
            json_request("POST", &format!("/api/delete-address/{address_id}"), json!({})),
            &other,
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let request = with_bearer(
            json_request("POST", &format!("/api/update-address/{address_id}"), update),
            &owner,
        );
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["address"]["city"], "Mumbai");
    }

    #[tokio::test]
    async fn cart_flow_over_http() {
        let (app, state) = test_router();
        let token = signup_user(&app).await;
        let lamp = seed_product(&state, "Brass Lamp", 100.0).await;
        let oil = seed_product(&state, "Oil Bottle", 50.0).await;

        for (id, qty) in [(&lamp, 2), (&oil, 1)] {
            let mut request = json_request(
                "POST",
                "/api/add-to-cart",
                json!({ "productId": id, "quantity": qty }),
            );
            request.headers_mut().insert(
                header::AUTHORIZATION,
                format!("Bearer {token}").parse().unwrap(),
            );

            let response = app.clone().oneshot(request).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/checkout")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["totalPrice"], json!(250.0));

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/confirm-order")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["order"]["totalAmount"], json!(250.0));
        assert_eq!(body["order"]["status"], "Pending");
    }
}
