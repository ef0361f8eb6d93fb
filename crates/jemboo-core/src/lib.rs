//! # jemboo-core
//!
//! Shared vocabulary for the Jemboo session gateway.
//!
//! - **Branded IDs**: `ConnectionId`, `ContextId`, `Revision`, `SuggestId`, `ProductId`
//! - **Identity**: the per-session `(user, application, session, locale)` tuple
//! - **Messages**: closed `InboundMessage` / `OutboundMessage` enums for the client protocol
//! - **Products**: catalog products, raw suggestion entries, composed items and tiles
//! - **Errors**: `ProtocolError` for rejected client messages
//! - **Logging**: `tracing` subscriber setup

#![deny(unsafe_code)]

pub mod errors;
pub mod identity;
pub mod ids;
pub mod logging;
pub mod messages;
pub mod product;

pub use errors::ProtocolError;
pub use identity::Identity;
pub use logging::LogFormat;
pub use ids::{ConnectionId, ContextId, DetectionLocation, ProductId, Revision, SuggestId};
pub use messages::{Direction, InboundMessage, OutboundMessage, ThinkingMode};
pub use product::{ImageTile, Product, ProductImage, RawSuggestion, SuggestionItem, Tile};
