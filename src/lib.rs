/*!
# minimart

A small e-commerce web application: signup/login, product listing, cart
management, and checkout with a session-scoped receipt. Persistence is
flat-file table storage rather than a database.

## Architecture

The application is a single axum server. Every protected route sits behind
an authentication middleware that resolves the session cookie into a
request-scoped identity; handlers pass that identity explicitly into the
store layer.

### Store layer

Three stores share one persistence mechanism, [`table::TableFile`]: a
whole-table flat file (gzip-compressed bincode) with shared-lock reads and
exclusive-lock load → mutate → atomic-rename rewrites.

- **users**: registered accounts; append on signup, linear-scan lookup on
  login, Argon2 password hashes
- **catalog**: products listed for sale; full-table reads, append on
  "sell", advisory availability checks
- **cart**: per-user line items keyed by (product, user); upsert
  accumulates quantity, checkout takes a snapshot and clears in one
  transaction

### Checkout flow

Browsing → cart review → order confirmed → receipt. Confirming an order
snapshots the cart rows plus the submitted contact details into the
session and empties the cart; the receipt renders that snapshot for the
rest of the session. No persistent order ledger is written.

### Export

The catalog and cart tables can be downloaded as spreadsheet files
(xlsx/csv) from the export routes.

## Modules

- **table**: transactional whole-table flat-file store
- **users**: user records and credential verification
- **catalog**: product table
- **cart**: cart line items
- **session**: server-side sessions and the checkout snapshot
- **login**: auth pages, handlers, and the `require_auth` middleware
- **checkout**: order confirmation and receipt
- **uploads**: product image storage
- **export**: xlsx/csv projection of the tables
- **error**: unified error type with HTTP status mapping
- **app**: routing, state, and the shop handlers
*/

pub mod app;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod error;
pub mod export;
pub mod login;
pub mod session;
pub mod table;
pub mod uploads;
pub mod users;

/// Re-export the store and domain types for easier use
pub use cart::{CartItem, CartStore};
pub use catalog::{CatalogStore, Product};
pub use error::ShopError;
pub use session::{AuthUser, ContactDetails, OrderSnapshot};
pub use table::TableFile;
pub use users::{User, UserStore};
