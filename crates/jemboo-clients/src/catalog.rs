//! Product catalog lookup.

use std::collections::HashMap;
use std::path::Path;

use jemboo_core::{Product, ProductId};
use tracing::info;

use crate::errors::CatalogError;

/// Read-only product lookup.
pub trait Catalog: Send + Sync {
    /// The product with `id`, if the catalog has it.
    fn get_product(&self, id: &ProductId) -> Option<Product>;
}

/// In-memory catalog loaded from a JSON array of products.
#[derive(Debug, Default)]
pub struct JsonCatalog {
    products: HashMap<ProductId, Product>,
}

impl JsonCatalog {
    /// Load a catalog file. Later duplicates of an id replace earlier ones.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let products: Vec<Product> =
            serde_json::from_str(&content).map_err(|source| CatalogError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let catalog = Self::from_products(products);
        info!(path = %path.display(), products = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    /// Build a catalog from products already in memory.
    pub fn from_products(products: impl IntoIterator<Item = Product>) -> Self {
        Self {
            products: products.into_iter().map(|p| (p.id.clone(), p)).collect(),
        }
    }

    /// Number of products.
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog holds no products.
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

impl Catalog for JsonCatalog {
    fn get_product(&self, id: &ProductId) -> Option<Product> {
        self.products.get(id).cloned()
    }
}
