//! Turns raw suggestion entries into client-ready items.

use std::sync::Arc;

use jemboo_clients::Catalog;
use jemboo_core::{ProductImage, RawSuggestion, SuggestionItem, Tile};
use metrics::counter;
use tracing::debug;

use crate::metrics::COMPOSER_MISSING_PRODUCTS_TOTAL;

const MEDIUM_WIDTH: &str = "w-md";
const MEDIUM_HEIGHT: &str = "h-md";

/// Joins suggestion entries with catalog products.
#[derive(Clone)]
pub struct ResponseComposer {
    catalog: Arc<dyn Catalog>,
}

impl ResponseComposer {
    /// Composer backed by `catalog`.
    pub fn new(catalog: Arc<dyn Catalog>) -> Self {
        Self { catalog }
    }

    /// Compose items in entry order. Entries whose product is unknown are dropped.
    pub fn compose(&self, entries: Vec<RawSuggestion>) -> Vec<SuggestionItem> {
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            let Some(product) = self.catalog.get_product(&entry.id) else {
                debug!(product_id = %entry.id, "suggested product not in catalog, skipping");
                counter!(COMPOSER_MISSING_PRODUCTS_TOTAL).increment(1);
                continue;
            };
            let tile = select_tile(&product.images);
            items.push(SuggestionItem::from_product(product, entry, tile));
        }
        items
    }
}

/// First medium-width tile across all images that carry tile metadata.
pub fn select_tile(images: &[ProductImage]) -> Option<Tile> {
    images
        .iter()
        .filter_map(|image| image.tiles.as_deref())
        .flatten()
        .find(|tile| tile.w == MEDIUM_WIDTH)
        .map(|tile| Tile {
            colspan: 1,
            rowspan: if tile.h == MEDIUM_HEIGHT { 1 } else { 2 },
            image_url: tile.path.clone(),
        })
}
