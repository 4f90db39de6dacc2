use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use std::sync::Arc;
use tower::ServiceExt;

use minimart::app::{AppState, router};

fn test_app() -> (tempfile::TempDir, Arc<AppState>, Router) {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = Arc::new(AppState::new(dir.path()).expect("state"));
    let app = router(state.clone());
    (dir, state, app)
}

fn form_post(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).expect("request")
}

fn json_post(uri: &str, body: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie)
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).expect("request")
}

/// Multipart body for the sell form, built by hand.
fn sell_body(boundary: &str, name: &str, price: &str, quantity: &str) -> String {
    let mut body = String::new();
    for (field, value) in [
        ("product-name", name),
        ("product-price", price),
        ("product-quantity", quantity),
    ] {
        body.push_str(&format!(
            "--{boundary}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n"
        ));
    }
    body.push_str(&format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"product-image\"; \
         filename=\"w.png\"\r\nContent-Type: image/png\r\n\r\nfakepngdata\r\n"
    ));
    body.push_str(&format!("--{boundary}--\r\n"));
    body
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    String::from_utf8(bytes.to_vec()).expect("utf8 body")
}

/// Sign up and log in, returning the session cookie to send back.
async fn login(app: &Router, username: &str, password: &str) -> String {
    let creds = format!("username={username}&password={password}");
    let response = app
        .clone()
        .oneshot(form_post("/signup", &creds, None))
        .await
        .expect("signup");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(form_post("/login", &creds, None))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie")
        .to_str()
        .expect("cookie str");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

#[tokio::test]
async fn full_purchase_flow() {
    let (_dir, state, app) = test_app();
    let cookie = login(&app, "alice", "p1").await;

    // List a product through the multipart sell form.
    let boundary = "X-MINIMART-TEST";
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sell")
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .header(header::COOKIE, &cookie)
                .body(Body::from(sell_body(boundary, "Widget", "5", "3")))
                .expect("request"),
        )
        .await
        .expect("sell");
    assert_eq!(response.status(), StatusCode::OK);

    let products = state.catalog.list_all().expect("catalog");
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Widget");
    assert_eq!(products[0].added_by, "alice");
    assert!(products[0].image.ends_with(".png"));

    // Add two Widgets to the cart.
    let response = app
        .clone()
        .oneshot(json_post(
            "/add_to_cart",
            r#"{"product_name":"Widget","quantity":2}"#,
            &cookie,
        ))
        .await
        .expect("add_to_cart");
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("true"), "unexpected body: {body}");

    let user = state.users.authenticate("alice", "p1").expect("user");
    let rows = state.cart.list_for_user(user.id).expect("cart");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].product_name, "Widget");
    assert_eq!(rows[0].quantity, 2);
    assert_eq!(rows[0].cost, 5.0);

    // Stock is 3: asking for 2 is fine, asking for 5 is not.
    let response = app
        .clone()
        .oneshot(json_post(
            "/check_availability",
            r#"{"product_name":"Widget","quantity":2}"#,
            &cookie,
        ))
        .await
        .expect("check_availability");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_post(
            "/check_availability",
            r#"{"product_name":"Widget","quantity":5}"#,
            &cookie,
        ))
        .await
        .expect("check_availability");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("Not enough quantity available"));

    // Confirm the order; the cart empties and the receipt shows the row.
    let response = app
        .clone()
        .oneshot(form_post(
            "/confirm_order",
            "name=Alice&email=a%40x.com",
            Some(&cookie),
        ))
        .await
        .expect("confirm_order");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    assert!(state.cart.list_for_user(user.id).expect("cart").is_empty());

    let response = app
        .clone()
        .oneshot(get("/receipt", Some(&cookie)))
        .await
        .expect("receipt");
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_string(response).await;
    assert!(page.contains("Widget"));
    assert!(page.contains("a@x.com"));
}

#[tokio::test]
async fn unknown_product_in_cart_request_is_a_404() {
    let (_dir, _state, app) = test_app();
    let cookie = login(&app, "dana", "p4").await;

    let response = app
        .clone()
        .oneshot(json_post(
            "/add_to_cart",
            r#"{"product_name":"Ghost","quantity":1}"#,
            &cookie,
        ))
        .await
        .expect("add_to_cart");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_string(response).await;
    assert!(body.contains("Product not found"));

    let response = app
        .clone()
        .oneshot(json_post(
            "/check_availability",
            r#"{"product_name":"Ghost","quantity":1}"#,
            &cookie,
        ))
        .await
        .expect("check_availability");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn protected_routes_redirect_anonymous_users_to_login() {
    let (_dir, _state, app) = test_app();

    for uri in ["/dashboard", "/buy_pro", "/cart", "/bill", "/receipt"] {
        let response = app.clone().oneshot(get(uri, None)).await.expect("request");
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "uri: {uri}");
        assert_eq!(
            response
                .headers()
                .get(header::LOCATION)
                .expect("location")
                .to_str()
                .expect("location str"),
            "/login"
        );
    }
}

#[tokio::test]
async fn duplicate_signup_and_bad_login_are_rejected() {
    let (_dir, _state, app) = test_app();

    let creds = "username=erin&password=p5";
    let response = app
        .clone()
        .oneshot(form_post("/signup", creds, None))
        .await
        .expect("signup");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(form_post("/signup", creds, None))
        .await
        .expect("signup");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_string(response).await;
    assert!(body.contains("Username already exists"));

    let response = app
        .clone()
        .oneshot(form_post("/login", "username=erin&password=nope", None))
        .await
        .expect("login");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logout_invalidates_the_session() {
    let (_dir, _state, app) = test_app();
    let cookie = login(&app, "frank", "p6").await;

    let response = app
        .clone()
        .oneshot(get("/dashboard", Some(&cookie)))
        .await
        .expect("dashboard");
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/logout", Some(&cookie)))
        .await
        .expect("logout");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app
        .clone()
        .oneshot(get("/dashboard", Some(&cookie)))
        .await
        .expect("dashboard");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}
