use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

use crate::error::ShopError;
use crate::table::TableFile;

/// A product listed for sale.
///
/// The name acts as the lookup key via first-match scans; nothing enforces
/// uniqueness on append. Quantity is advisory only and is never decremented
/// by the purchase flow.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    /// Product name (acts as key for lookups)
    pub name: String,

    /// Unit price
    pub price: f64,

    /// Listed stock, read by availability checks only
    pub quantity: u32,

    /// Stored filename of the product image, relative to the uploads dir
    pub image: String,

    /// Username of the seller who listed the product
    pub added_by: String,

    /// Id of the seller who listed the product
    pub seller_id: Uuid,
}

/// Tabular collection of products, backed by a single table file.
pub struct CatalogStore {
    table: TableFile<Product>,
}

impl CatalogStore {
    /// Open the catalog rooted at `dir` (`<dir>/products.bin.gz`).
    pub fn open(dir: impl AsRef<Path>) -> Self {
        CatalogStore {
            table: TableFile::open(dir.as_ref().join("products.bin.gz")),
        }
    }

    /// Load the entire product table.
    pub fn list_all(&self) -> Result<Vec<Product>, ShopError> {
        self.table.read()
    }

    /// First row matching `name`, or `ProductNotFound`.
    pub fn find_by_name(&self, name: &str) -> Result<Product, ShopError> {
        let products = self.table.read()?;
        products
            .into_iter()
            .find(|p| p.name == name)
            .ok_or(ShopError::ProductNotFound)
    }

    /// Append a row and rewrite the table. No duplicate-name check.
    pub fn append(&self, product: Product) -> Result<(), ShopError> {
        self.table.update(move |products| {
            products.push(product);
            Ok(())
        })
    }

    /// Whether the listed quantity covers `requested`.
    ///
    /// Purely advisory; never reserves stock. Fails with `ProductNotFound`
    /// if no row matches.
    pub fn check_availability(&self, name: &str, requested: u32) -> Result<bool, ShopError> {
        let product = self.find_by_name(name)?;
        Ok(product.quantity >= requested)
    }
}
