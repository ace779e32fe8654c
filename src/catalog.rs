//! Product catalog backed by a tab-separated table
//!
//! Rows are addressed by position: the vector index and the catalog share the
//! same row-id space. `product_id` is the stable external identifier and is
//! kept as a string regardless of how it is spelled in the source file.

use std::path::Path;

use serde::Deserialize;
use serde::Serialize;
use tracing::info;

use crate::errors::Result;

/// A single catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Product {
    pub product_id: String,
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_description: String,
}

/// In-memory product table, read-only after load
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Load the catalog from a tab-separated file with a header row
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading product catalog from {}", path.display());

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .flexible(true)
            .from_path(path)?;

        let mut products = Vec::new();
        for record in reader.deserialize() {
            let product: Product = record?;
            products.push(product);
        }

        info!("Loaded {} products", products.len());
        Ok(Self { products })
    }

    /// Build a catalog from already-parsed products
    pub fn from_products(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Get a product by row position
    pub fn get(&self, row: usize) -> Option<&Product> {
        self.products.get(row)
    }

    /// Look up a product by its stable identifier (string-compared)
    pub fn find_by_product_id(&self, product_id: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.product_id == product_id)
    }

    /// Number of catalog rows
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog is empty
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}
