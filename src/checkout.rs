use axum::{
    Extension, Form,
    extract::State,
    response::{Html, Redirect},
};
use chrono::Utc;
use std::sync::Arc;

use crate::app::{AppState, inject_page_data};
use crate::error::ShopError;
use crate::session::{self, AuthUser, ContactDetails, OrderSnapshot};

/// GET on the confirmation endpoint sends the user back to cart review.
pub async fn review_order() -> Redirect {
    Redirect::to("/cart")
}

/// Confirm an order.
///
/// Takes the user's cart rows as the order snapshot, stores it with the
/// submitted contact details in the session, and clears the cart in the
/// same transaction. There is no persistent order ledger; the snapshot dies
/// with the session.
pub async fn confirm_order(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Form(details): Form<ContactDetails>,
) -> Result<Redirect, ShopError> {
    let items = state.cart.take_snapshot_and_clear(user.id)?;
    log::info!(
        "order confirmed for {} ({} line items)",
        user.username,
        items.len()
    );

    session::store_order(
        &user.token,
        OrderSnapshot {
            details,
            items,
            placed_at: Utc::now(),
        },
    );

    Ok(Redirect::to("/receipt"))
}

/// Render the receipt for the session's confirmed order.
///
/// Re-rendering is allowed for the lifetime of the session; a session with
/// no confirmed order gets an empty receipt.
pub async fn receipt(Extension(user): Extension<AuthUser>) -> Html<String> {
    let order = session::current_order(&user.token);
    let data = serde_json::to_string(&order).unwrap_or_else(|_| "null".to_string());

    Html(inject_page_data(
        include_str!("./static/receipt.html"),
        "ORDER_DATA",
        &data,
    ))
}

/// Serve the order confirmation page HTML
pub async fn order_confirmation() -> Html<&'static str> {
    Html(include_str!("./static/order_confirmation.html"))
}
