use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, SystemTime};
use uuid::Uuid;

use crate::cart::CartItem;
use crate::users::User;

/// An authenticated server-side session.
///
/// Besides the identity, the session carries the transient checkout state:
/// once an order is confirmed its snapshot lives here until the session
/// expires or is destroyed. There is no persistent order ledger.
#[derive(Debug, Clone)]
pub struct Session {
    /// Id of the authenticated user
    pub user_id: Uuid,

    /// Username of the authenticated user
    pub username: String,

    /// Time when the session expires
    pub expires_at: SystemTime,

    /// Snapshot of the most recently confirmed order, if any
    pub order: Option<OrderSnapshot>,
}

/// Request-scoped identity inserted by the auth middleware.
///
/// Handlers receive this instead of reading ambient session state; store
/// calls take `id` explicitly.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    /// Session token, used to reach session-scoped checkout state
    pub token: String,
}

/// Contact details submitted with an order confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactDetails {
    pub name: String,
    pub email: String,
}

/// Point-in-time copy of a user's cart taken at checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub details: ContactDetails,
    pub items: Vec<CartItem>,
    pub placed_at: DateTime<Utc>,
}

lazy_static! {
    static ref SESSIONS: RwLock<HashMap<String, Session>> = RwLock::new(HashMap::new());
}

const SESSION_DURATION: u64 = 24 * 60 * 60; // 24 hours in seconds

/// Create a new session for an authenticated user and return its token.
pub fn create_session(user: &User) -> String {
    let token = Uuid::new_v4().to_string();
    let session = Session {
        user_id: user.id,
        username: user.username.clone(),
        expires_at: SystemTime::now() + Duration::from_secs(SESSION_DURATION),
        order: None,
    };

    let mut sessions = SESSIONS.write().unwrap();
    sessions.insert(token.clone(), session);

    token
}

/// Resolve a session token to its identity, if the session exists and has
/// not expired. Expired sessions are evicted on the spot, so the map does
/// not accumulate dead entries.
pub fn validate_session(token: &str) -> Option<AuthUser> {
    let mut sessions = SESSIONS.write().unwrap();

    match sessions.get(token) {
        Some(session) if session.expires_at > SystemTime::now() => Some(AuthUser {
            id: session.user_id,
            username: session.username.clone(),
            token: token.to_string(),
        }),
        Some(_) => {
            sessions.remove(token);
            None
        }
        None => None,
    }
}

/// Drop a session (logout).
pub fn destroy_session(token: &str) {
    let mut sessions = SESSIONS.write().unwrap();
    sessions.remove(token);
}

/// Attach a confirmed order's snapshot to its session.
pub fn store_order(token: &str, order: OrderSnapshot) {
    let mut sessions = SESSIONS.write().unwrap();
    if let Some(session) = sessions.get_mut(token) {
        session.order = Some(order);
    }
}

/// The snapshot of the session's confirmed order, if one was placed.
pub fn current_order(token: &str) -> Option<OrderSnapshot> {
    let sessions = SESSIONS.read().unwrap();
    sessions.get(token).and_then(|s| s.order.clone())
}
