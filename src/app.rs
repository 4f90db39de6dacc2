use axum::{
    Extension, Json, Router,
    extract::{Multipart, State},
    http::{StatusCode, header},
    middleware,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;

use crate::cart::CartStore;
use crate::catalog::{CatalogStore, Product};
use crate::checkout;
use crate::error::ShopError;
use crate::export;
use crate::login;
use crate::session::AuthUser;
use crate::uploads;
use crate::users::UserStore;

/// Default root for the table files.
const DATA_DIR: &str = "database";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Shared application state: the three stores plus the uploads directory.
pub struct AppState {
    pub users: UserStore,
    pub catalog: CatalogStore,
    pub cart: CartStore,
    pub uploads_dir: PathBuf,
}

impl AppState {
    /// Open all stores rooted at `data_dir`, creating it if needed.
    /// Uploaded images live under `<data_dir>/uploads`.
    pub fn new(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let data_dir = data_dir.as_ref();
        let uploads_dir = data_dir.join("uploads");
        std::fs::create_dir_all(&uploads_dir)?;

        Ok(AppState {
            users: UserStore::open(data_dir),
            catalog: CatalogStore::open(data_dir),
            cart: CartStore::open(data_dir),
            uploads_dir,
        })
    }
}

#[derive(Deserialize)]
struct AddToCartRequest {
    product_name: String,
    quantity: u32,
}

#[derive(Deserialize)]
struct AvailabilityRequest {
    product_name: String,
    quantity: u32,
}

/// Build the application router.
///
/// Everything past login/signup sits behind the `require_auth` middleware;
/// uploaded product images are served from the uploads directory.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/dashboard", get(serve_dashboard))
        .route("/buy_pro", get(buy_pro))
        .route("/view", get(view_products))
        .route("/add_to_cart", post(add_to_cart))
        .route("/cart", get(cart_page))
        .route("/clear_cart", post(clear_cart))
        .route("/bill", get(bill))
        .route("/check_availability", post(check_availability))
        .route("/sell", get(serve_sell_page).post(handle_sell))
        .route(
            "/confirm_order",
            get(checkout::review_order).post(checkout::confirm_order),
        )
        .route("/receipt", get(checkout::receipt))
        .route("/order_confirmation", get(checkout::order_confirmation))
        .route("/export/catalog.xlsx", get(export_catalog_xlsx))
        .route("/export/catalog.csv", get(export_catalog_csv))
        .route("/export/cart.xlsx", get(export_cart_xlsx))
        .route_layer(middleware::from_fn(login::require_auth));

    Router::new()
        .route("/", get(login::serve_login_page))
        .route(
            "/login",
            get(login::serve_login_page).post(login::handle_login),
        )
        .route(
            "/signup",
            get(login::serve_signup_page).post(login::handle_signup),
        )
        .route("/logout", get(login::handle_logout))
        .merge(protected)
        .nest_service("/static/uploads", ServeDir::new(&state.uploads_dir))
        .with_state(state)
}

/// Start the web server with stores rooted at the default data directory.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(DATA_DIR)?);
    let app = router(state);

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
    let listener = TcpListener::bind(&addr).await?;
    log::info!("listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Inject a JSON constant into a static page template: the page's script
/// reads `const <name> = <json>;` from its head.
pub fn inject_page_data(template: &str, name: &str, json: &str) -> String {
    template.replace(
        "</head>",
        &format!("    <script>const {} = {};</script>\n</head>", name, json),
    )
}

async fn serve_dashboard() -> Html<&'static str> {
    Html(include_str!("./static/dashboard.html"))
}

async fn serve_sell_page() -> Html<String> {
    Html(inject_page_data(
        include_str!("./static/sell.html"),
        "SELL_RESULT",
        "null",
    ))
}

async fn buy_pro(State(state): State<Arc<AppState>>) -> Result<Html<String>, ShopError> {
    let products = state.catalog.list_all()?;
    let data = serde_json::to_string(&products).unwrap_or_else(|_| "[]".to_string());
    Ok(Html(inject_page_data(
        include_str!("./static/buy.html"),
        "PRODUCTS_DATA",
        &data,
    )))
}

async fn view_products(State(state): State<Arc<AppState>>) -> Result<Html<String>, ShopError> {
    let products = state.catalog.list_all()?;
    let data = serde_json::to_string(&products).unwrap_or_else(|_| "[]".to_string());
    Ok(Html(inject_page_data(
        include_str!("./static/view.html"),
        "PRODUCTS_DATA",
        &data,
    )))
}

async fn add_to_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(req): Json<AddToCartRequest>,
) -> Response {
    let product = match state.catalog.find_by_name(&req.product_name) {
        Ok(product) => product,
        Err(ShopError::ProductNotFound) => {
            return (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!({
                    "success": false,
                    "message": ShopError::ProductNotFound.to_string(),
                })),
            )
                .into_response();
        }
        Err(e) => return e.into_response(),
    };

    match state
        .cart
        .upsert(user.id, &product.name, req.quantity, product.price)
    {
        Ok(()) => Json(serde_json::json!({ "success": true })).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn cart_page(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Html<String>, ShopError> {
    let items = state.cart.list_for_user(user.id)?;
    let data = serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string());
    Ok(Html(inject_page_data(
        include_str!("./static/cart.html"),
        "CART_DATA",
        &data,
    )))
}

async fn bill(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Html<String>, ShopError> {
    let items = state.cart.list_for_user(user.id)?;
    let data = serde_json::to_string(&items).unwrap_or_else(|_| "[]".to_string());
    Ok(Html(inject_page_data(
        include_str!("./static/bill.html"),
        "CART_DATA",
        &data,
    )))
}

async fn clear_cart(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<serde_json::Value>, ShopError> {
    state.cart.clear(user.id)?;
    Ok(Json(serde_json::json!({ "success": true })))
}

async fn check_availability(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AvailabilityRequest>,
) -> Response {
    match state
        .catalog
        .check_availability(&req.product_name, req.quantity)
    {
        Ok(true) => Json(serde_json::json!({ "available": true })).into_response(),
        Ok(false) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "available": false,
                "message": ShopError::InsufficientQuantity.to_string(),
            })),
        )
            .into_response(),
        Err(ShopError::ProductNotFound) => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({
                "available": false,
                "message": ShopError::ProductNotFound.to_string(),
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

/// Handle a "sell" submission: multipart form with the product fields and
/// the product image. The image is stored under a unique name and the
/// catalog row records the authenticated seller.
async fn handle_sell(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    mut multipart: Multipart,
) -> Result<Html<String>, ShopError> {
    let mut name = None;
    let mut price = None;
    let mut quantity = None;
    let mut image: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(bad_form)? {
        match field.name().unwrap_or("") {
            "product-name" => name = Some(field.text().await.map_err(bad_form)?),
            "product-price" => price = Some(field.text().await.map_err(bad_form)?),
            "product-quantity" => quantity = Some(field.text().await.map_err(bad_form)?),
            "product-image" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(bad_form)?.to_vec();
                image = Some((filename, data));
            }
            _ => {}
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ShopError::InvalidInput("Missing product name".to_string()))?;
    let price: f64 = parse_form_number(price, "product price")?;
    let quantity: u32 = parse_form_number(quantity, "product quantity")?;
    let (filename, data) = image.ok_or(ShopError::MissingUploadFile)?;

    let stored_image = uploads::save_product_image(&state.uploads_dir, &filename, &data)?;

    state.catalog.append(Product {
        name: name.clone(),
        price,
        quantity,
        image: stored_image,
        added_by: user.username.clone(),
        seller_id: user.id,
    })?;
    log::info!("{} listed product {}", user.username, name);

    let result = serde_json::json!({ "added": true, "product_name": name });
    Ok(Html(inject_page_data(
        include_str!("./static/sell.html"),
        "SELL_RESULT",
        &result.to_string(),
    )))
}

fn bad_form(e: axum::extract::multipart::MultipartError) -> ShopError {
    ShopError::InvalidInput(e.to_string())
}

fn parse_form_number<N: std::str::FromStr>(
    value: Option<String>,
    what: &str,
) -> Result<N, ShopError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| ShopError::InvalidInput(format!("Invalid {}", what)))
}

async fn export_catalog_xlsx(State(state): State<Arc<AppState>>) -> Result<Response, ShopError> {
    let products = state.catalog.list_all()?;
    let buffer = export::products_to_xlsx(&products)?;
    Ok(spreadsheet_download("products.xlsx", buffer))
}

async fn export_catalog_csv(State(state): State<Arc<AppState>>) -> Result<Response, ShopError> {
    let products = state.catalog.list_all()?;
    let csv = export::products_to_csv(&products);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"products.csv\"".to_string(),
            ),
        ],
        csv,
    )
        .into_response())
}

async fn export_cart_xlsx(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Response, ShopError> {
    let items = state.cart.list_for_user(user.id)?;
    let buffer = export::cart_to_xlsx(&items)?;
    Ok(spreadsheet_download("cart.xlsx", buffer))
}

fn spreadsheet_download(filename: &str, buffer: Vec<u8>) -> Response {
    (
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        buffer,
    )
        .into_response()
}
