//! # jemboo-clients
//!
//! Collaborators the session protocol talks to.
//!
//! - [`ContextClient`]: revisioned conversation documents
//! - [`DetectionClient`]: asynchronous free-text detection
//! - [`SuggestionClient`]: ranked, paginated suggestion batches
//! - [`Catalog`]: product lookup by id
//!
//! Each remote trait has a `reqwest` implementation. All remote failures are
//! reported as [`RemoteCallError`]; this layer never retries.

#![deny(unsafe_code)]

pub mod catalog;
pub mod context;
pub mod detection;
pub mod errors;
pub mod http;
pub mod suggestion;

pub use catalog::{Catalog, JsonCatalog};
pub use context::{ContextClient, ContextDocument, FeedbackRequest, HttpContextClient};
pub use detection::{DetectionClient, HttpDetectionClient};
pub use errors::{CatalogError, RemoteCallError, RemoteErrorKind, Service};
pub use http::build_http_client;
pub use suggestion::{HttpSuggestionClient, SuggestionClient, SuggestionPage};
