//! # HAL Engine
//!
//! This crate provides the foundational building blocks for composing
//! hypermedia APIs in Rust: declaratively-described resources are resolved
//! concurrently into a single hypermedia document, and the *same* declarative
//! metadata drives a client proxy that navigates a remote server exposing
//! this format.
//!
//! ## Why Metadata-Driven Composition?
//!
//! A hypermedia document is more than data: it carries navigable links to
//! related resources, and may inline ("embed") related content to save the
//! consumer round trips. Deciding per relation whether to embed or link,
//! resolving everything concurrently, and degrading gracefully when one
//! branch fails is the same problem on every resource type, so it is solved
//! **once**, driven by static [`ResourceTypeDescriptor`]s, and every domain
//! only implements the [`Resource`] accessor contract.
//!
//! Because the client proxy navigates by the identical descriptors, server
//! and client cannot drift apart: a relation renamed in the descriptor is
//! renamed for both directions at once.
//!
//! ## Architecture Overview
//!
//! The engine separates concerns into three layers:
//!
//! 1. **Metadata Layer** ([`descriptor`], [`registry`]) - Static type
//!    descriptions, built once at startup, shared read-mostly.
//! 2. **Resolution Layer** ([`resolve`], [`policy`], [`response`],
//!    [`render`]) - Walks a live resource graph, fans relations out
//!    concurrently, and renders the materialized tree to the wire.
//! 3. **Client Layer** ([`client`], [`document`]) - Wraps inbound documents
//!    into lazily-fetching, caching proxies over the same metadata.
//!
//! ## Core Abstractions
//!
//! ### [`Resource`] - The Accessor Contract
//!
//! Domain adapters (content-repository lookups, database queries, ...)
//! implement this trait; the engine never touches domain objects directly.
//!
//! ### [`Resolver`] - Concurrent Resolution
//!
//! One task per relation and per multi-valued element, joined before a node
//! is assembled; deterministic output order regardless of completion order;
//! one cancellation token spanning the whole call. Relation-scoped failures
//! degrade to [`ErrorEntry`] items in the response instead of failing the
//! request.
//!
//! ### [`wrap`] - Client Navigation
//!
//! Wraps a wire document into a [`RemoteResource`] whose relation accessors
//! serve embedded content without any network call and fetch linked content
//! lazily, exactly once per relation per proxy.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use async_trait::async_trait;
//! use hal_engine::{
//!     BoxError, DescriptorRegistry, Link, LinkRelationRegistry, PreferredEmbedding,
//!     Renderer, Resolver, Resource, ResourceTypeDescriptor,
//! };
//! use serde_json::json;
//!
//! struct Greeting;
//!
//! #[async_trait]
//! impl Resource for Greeting {
//!     fn type_name(&self) -> &str {
//!         "greeting"
//!     }
//!
//!     async fn state(&self) -> Result<Option<serde_json::Value>, BoxError> {
//!         Ok(Some(json!({ "message": "hello" })))
//!     }
//!
//!     fn self_link(&self) -> Option<Link> {
//!         Some(Link::new("/greeting"))
//!     }
//!
//!     async fn related(&self, _relation: &str) -> Result<Vec<Arc<dyn Resource>>, BoxError> {
//!         Ok(Vec::new())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // 1. Register metadata at startup
//!     let registry = Arc::new(DescriptorRegistry::new());
//!     registry.register(
//!         ResourceTypeDescriptor::builder("greeting")
//!             .with_state()
//!             .build()
//!             .unwrap(),
//!     );
//!     let relations = Arc::new(LinkRelationRegistry::new());
//!
//!     // 2. Resolve a live resource graph
//!     let resolver = Resolver::new(Arc::clone(&registry), Arc::clone(&relations));
//!     let tree = resolver
//!         .resolve(Arc::new(Greeting), &PreferredEmbedding, None)
//!         .await
//!         .unwrap();
//!
//!     // 3. Render it to the wire
//!     let document = Renderer::new(relations).render(&tree);
//!     assert_eq!(document.state["message"], json!("hello"));
//!     assert_eq!(document.self_link().unwrap().href, "/greeting");
//! }
//! ```
//!
//! ## Concurrency Model
//!
//! - Cooperative, task-based: no dedicated threads per request
//! - Sibling relations and sibling elements resolve with no ordering
//!   dependency between them
//! - The only cross-request shared state is the descriptor registry, which is
//!   append-only with idempotent writes
//! - A deadline cancels in-flight relations; completed siblings are kept and
//!   pending ones surface as timeout entries (partial response, not a dropped
//!   one)
//!
//! ## Testing
//!
//! The [`mock`] module provides a [`MockFetcher`](mock::MockFetcher) that
//! implements the same [`Fetcher`] API as a production transport but operates
//! entirely in-memory, with per-URI fetch counting for asserting the proxy's
//! caching guarantees.

pub mod client;
pub mod descriptor;
pub mod document;
pub mod error;
pub mod mock;
pub mod policy;
pub mod registry;
pub mod render;
pub mod resolve;
pub mod resource;
pub mod response;
pub mod tracing;

// Re-export core types for convenience
pub use client::{wrap, Fetcher, RemoteResource};
pub use descriptor::{Cardinality, RelationDescriptor, ResourceTypeDescriptor};
pub use document::{HalDocument, OneOrMany, CURIES_REL, SELF_REL};
pub use error::{
    cause_chain, error_entry, BoxError, MetadataError, RemoteResourceError, ResolveError,
    TransportError, MAX_CAUSE_DEPTH,
};
pub use policy::{Decision, EmbeddingPolicy, LinkOnly, MaxDepth, PreferredEmbedding};
pub use registry::{DescriptorRegistry, LinkRelationRegistry, RelationInfo};
pub use render::Renderer;
pub use resolve::Resolver;
pub use resource::{Link, Resource};
pub use response::{ErrorEntry, MaterializedResponse, RelationEmbeds, RelationLinks, ResponseMeta};
