//! Integration tests for authentication and role checks at the gateway.

mod common;

use axum::http::{header, Method, StatusCode};
use common::{body_json, build_state, build_test_app, call, call_json, TestPorts};
use serde_json::json;

// ---------------------------------------------------------------------------
// Login / register
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_returns_token_and_user() {
    let app = build_test_app(build_state(&TestPorts::default()));

    let response = common::send(
        &app,
        common::request(Method::POST, "/auth/login", None)
            .header(header::CONTENT_TYPE, "application/json")
            .body(json!({"email": "shop@smartstock.test", "password": "correct horse"}).to_string().into())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["access_token"], common::USER_TOKEN);
    assert_eq!(json["token_type"], "bearer");
    assert_eq!(json["user"]["email"], "shop@smartstock.test");
    assert_eq!(json["user"]["role"], "user");
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = build_test_app(build_state(&TestPorts::default()));

    let response = common::send(
        &app,
        common::request(Method::POST, "/auth/login", None)
            .header(header::CONTENT_TYPE, "application/json")
            .body(json!({"email": "shop@smartstock.test", "password": "nope"}).to_string().into())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn register_requires_email_and_password() {
    let app = build_test_app(build_state(&TestPorts::default()));

    let response = common::send(
        &app,
        common::request(Method::POST, "/auth/register", None)
            .header(header::CONTENT_TYPE, "application/json")
            .body(json!({"email": "  ", "password": ""}).to_string().into())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn register_creates_user() {
    let app = build_test_app(build_state(&TestPorts::default()));

    let response = common::send(
        &app,
        common::request(Method::POST, "/auth/register", None)
            .header(header::CONTENT_TYPE, "application/json")
            .body(
                json!({"email": "new@smartstock.test", "password": "pw", "full_name": "New Owner"})
                    .to_string()
                    .into(),
            )
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["email"], "new@smartstock.test");
    assert_eq!(json["full_name"], "New Owner");
}

// ---------------------------------------------------------------------------
// Bearer checks
// ---------------------------------------------------------------------------

#[tokio::test]
async fn protected_routes_require_a_token() {
    let app = build_test_app(build_state(&TestPorts::default()));

    for (method, path) in [
        (Method::GET, "/auth/me"),
        (Method::POST, "/wizards"),
        (Method::GET, "/add-product"),
        (Method::GET, "/products"),
        (Method::GET, "/stats/model"),
    ] {
        let response = call(&app, method, path, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", path);
    }
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let app = build_test_app(build_state(&TestPorts::default()));
    let response = call(&app, Method::GET, "/auth/me", Some("forged")).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_returns_the_token_owner() {
    let app = build_test_app(build_state(&TestPorts::default()));

    let response = call(&app, Method::GET, "/auth/me", Some(common::ADMIN_TOKEN)).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["user_id"], "admin-1");
    assert_eq!(json["role"], "admin");
}

#[tokio::test]
async fn admin_routes_reject_regular_users() {
    let app = build_test_app(build_state(&TestPorts::default()));

    let response = call(&app, Method::GET, "/admin/train/status", Some(common::USER_TOKEN)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = call(&app, Method::GET, "/admin/train/status", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn shop_is_public() {
    let ports = TestPorts::default();
    {
        let mut products = ports.catalog.products.lock().unwrap();
        let mut listed = common::product("Beagle", "Dog", Some("Beagle"), 200.0);
        listed.published = true;
        products.push(listed);
        products.push(common::product("Pug", "Dog", Some("Pug"), 300.0));
    }
    let app = build_test_app(build_state(&ports));

    let response = call(&app, Method::GET, "/shop", None).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    let products = json.as_array().unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0]["product_name"], "Beagle");
}

#[tokio::test]
async fn backend_forbidden_is_reported_as_403() {
    let app = build_test_app(build_state(&TestPorts::default()));

    let response = call_json(
        &app,
        Method::POST,
        "/product-types",
        common::USER_TOKEN,
        json!({"name": "Bird"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = call(&app, Method::DELETE, "/product-types/t-1", Some(common::USER_TOKEN)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
