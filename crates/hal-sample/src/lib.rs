//! # Catalog Sample
//!
//! This library wires the generic engine to a concrete domain for
//! integration testing and as a worked example:
//!
//! - **[model]**: Pure state structs ([`CatalogState`](model::CatalogState),
//!   [`ItemState`](model::ItemState)) serialized into the documents.
//! - **[resources]**: [`Resource`](hal_engine::Resource) implementations for
//!   the catalog graph, including an intentionally unavailable item for
//!   exercising partial responses.
//! - **[service]**: The composition root that registers descriptors and link
//!   relation metadata once and exposes resolve/render/wrap entry points.

pub mod error;
pub mod model;
pub mod resources;
pub mod service;
