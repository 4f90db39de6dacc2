use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::error::ShopError;
use crate::table::TableFile;

/// One line item in a user's cart.
///
/// Keyed by `(product_name, user_id)`; repeat adds accumulate quantity on
/// the existing row.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CartItem {
    /// Name of the product, as it appeared in the catalog at add time
    pub product_name: String,

    /// Accumulated quantity
    pub quantity: u32,

    /// Unit cost captured from the catalog at add time
    pub cost: f64,

    /// Owner of the cart row
    pub user_id: Uuid,
}

/// Tabular collection of per-user cart line items.
pub struct CartStore {
    table: TableFile<CartItem>,
}

impl CartStore {
    /// Open the cart store rooted at `dir` (`<dir>/cart.bin.gz`).
    pub fn open(dir: impl AsRef<Path>) -> Self {
        CartStore {
            table: TableFile::open(dir.as_ref().join("cart.bin.gz")),
        }
    }

    /// All rows belonging to `user_id`.
    pub fn list_for_user(&self, user_id: Uuid) -> Result<Vec<CartItem>, ShopError> {
        let rows = self.table.read()?;
        Ok(rows.into_iter().filter(|r| r.user_id == user_id).collect())
    }

    /// Add `quantity` of a product to a user's cart.
    ///
    /// If a row for `(product_name, user_id)` already exists its quantity is
    /// incremented, saturating at `u32::MAX`; otherwise a new row is
    /// appended. One transaction either way.
    pub fn upsert(
        &self,
        user_id: Uuid,
        product_name: &str,
        quantity: u32,
        cost: f64,
    ) -> Result<(), ShopError> {
        let product_name = product_name.to_string();
        self.table.update(move |rows| {
            if let Some(row) = rows
                .iter_mut()
                .find(|r| r.product_name == product_name && r.user_id == user_id)
            {
                row.quantity = row.quantity.saturating_add(quantity);
            } else {
                rows.push(CartItem {
                    product_name,
                    quantity,
                    cost,
                    user_id,
                });
            }
            Ok(())
        })
    }

    /// Remove all rows belonging to `user_id`, leaving other users' rows
    /// untouched.
    pub fn clear(&self, user_id: Uuid) -> Result<(), ShopError> {
        self.table.update(move |rows| {
            rows.retain(|r| r.user_id != user_id);
            Ok(())
        })
    }

    /// Return the user's rows and remove them, in one transaction.
    ///
    /// Used by checkout: the returned rows are the order snapshot, and the
    /// cart is empty for that user the moment this returns.
    pub fn take_snapshot_and_clear(&self, user_id: Uuid) -> Result<Vec<CartItem>, ShopError> {
        self.table.update(move |rows| {
            let (taken, kept): (Vec<_>, Vec<_>) =
                rows.drain(..).partition(|r| r.user_id == user_id);
            *rows = kept;
            Ok(taken)
        })
    }
}
