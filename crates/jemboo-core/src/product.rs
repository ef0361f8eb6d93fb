//! Catalog products, raw suggestion entries, and the composed items sent to
//! clients.
//!
//! Products are mostly opaque: only `_id` and `images` are typed, everything
//! else rides along in a flattened map and is forwarded verbatim.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ids::ProductId;

/// Keys a [`SuggestionItem`] sets itself. Product fields with these names are
/// dropped so the item never serializes a key twice.
const ITEM_KEYS: [&str; 5] = ["_id", "score", "reasons", "position", "tile"];

/// A catalog product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    /// Product id.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Image metadata, in display order.
    #[serde(default)]
    pub images: Vec<ProductImage>,
    /// Every other product field.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

/// One product image.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Pre-rendered tile variants. Absent when the image has no tile metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiles: Option<Vec<ImageTile>>,
    /// Remaining image fields (url, alt text, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A tile variant of an image, keyed by width and height class.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageTile {
    /// Width class, e.g. `w-md`.
    #[serde(default)]
    pub w: String,
    /// Height class, e.g. `h-md`.
    #[serde(default)]
    pub h: String,
    /// Image location.
    pub path: String,
}

/// Grid placement for a suggestion item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tile {
    /// Columns spanned.
    pub colspan: u8,
    /// Rows spanned.
    pub rowspan: u8,
    /// Image to render in the tile.
    pub image_url: String,
}

/// A ranked entry as returned by the suggestion service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawSuggestion {
    /// Product id. Plain string or `{"$oid": ...}`.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Ranking score.
    #[serde(default)]
    pub score: f64,
    /// Why the product was suggested. Shape is owned by the suggestion service.
    #[serde(default)]
    pub reasons: Value,
    /// Position within the batch.
    pub index: u64,
}

/// A product decorated with ranking data, ready for the client.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SuggestionItem {
    /// Product id, always a plain string on the wire.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Product images.
    pub images: Vec<ProductImage>,
    /// Remaining product fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
    /// Ranking score.
    pub score: f64,
    /// Ranking reasons.
    pub reasons: Value,
    /// Index of the entry within the batch.
    pub position: u64,
    /// Display tile, omitted when the product has none.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile: Option<Tile>,
}

impl SuggestionItem {
    /// Merge a catalog product with its ranking entry.
    #[must_use]
    pub fn from_product(product: Product, entry: RawSuggestion, tile: Option<Tile>) -> Self {
        let Product {
            images, mut fields, ..
        } = product;
        fields.retain(|key, _| !ITEM_KEYS.contains(&key.as_str()));
        Self {
            id: entry.id,
            images,
            fields,
            score: entry.score,
            reasons: entry.reasons,
            position: entry.index,
            tile,
        }
    }
}
