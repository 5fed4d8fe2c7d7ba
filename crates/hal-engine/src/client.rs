//! # Client Proxy
//!
//! The client-side counterpart of the resolver: [`wrap`] turns a fetched
//! wire document into a [`RemoteResource`], a navigable proxy driven by the
//! *same* descriptors the server renders from. Calling code traverses
//! relations as if they were local accessors; the proxy decides per call
//! whether the data is already embedded or needs a lazy fetch.
//!
//! # Laziness & Caching
//! - Targets present in `_embedded` are synthesized directly, no network.
//! - Otherwise the relation's link template is expanded with the supplied
//!   variables and fetched through the injected [`Fetcher`], exactly once
//!   per (relation, variables) per proxy instance. The outcome, success or
//!   failure, is cached for the proxy's lifetime, so repeated accessor calls
//!   never re-fetch and a failure replays without hitting the network again.
//! - A relation present in neither section yields the empty result, not an
//!   error; cardinality-shaped accessors ([`related_optional`],
//!   [`related_single`]) sit on top of that.
//!
//! [`related_optional`]: RemoteResource::related_optional
//! [`related_single`]: RemoteResource::related_single
//!
//! # Design Note
//! There is no code generation here: the proxy is one generic type
//! parameterized at runtime by a type name plus the descriptor registry.
//! `RemoteResource` also implements [`Resource`], so a fetched document can
//! be fed straight back into a [`Resolver`](crate::resolve::Resolver) for
//! re-composition.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

use crate::document::HalDocument;
use crate::error::{BoxError, RemoteResourceError, TransportError};
use crate::registry::DescriptorRegistry;
use crate::resource::{Link, Resource};
use crate::response::ErrorEntry;

/// The injected transport abstraction. Represents the HTTP layer the engine
/// deliberately does not implement; authentication, caching policy, and
/// retries all live behind this seam.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, uri: &str) -> Result<HalDocument, TransportError>;
}

struct Inner {
    document: HalDocument,
    fetcher: Arc<dyn Fetcher>,
    type_name: String,
    registry: Arc<DescriptorRegistry>,
    /// Per-(relation, variables) outcome cache; one entry per distinct
    /// accessor invocation, never shared across proxies.
    cache: Mutex<HashMap<String, Result<Vec<RemoteResource>, RemoteResourceError>>>,
}

/// A navigable proxy over a fetched wire document.
///
/// Cheap to clone (shares the underlying document and cache) and owned by a
/// single navigation chain; dropped when no longer referenced.
#[derive(Clone)]
pub struct RemoteResource {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for RemoteResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteResource")
            .field("type_name", &self.inner.type_name)
            .field("base_uri", &self.base_uri())
            .finish_non_exhaustive()
    }
}

/// Wraps a wire document into a navigable proxy.
///
/// `type_name` names the descriptor the proxy navigates by; it is resolved
/// lazily through `registry` on the first accessor call, so wrapping a
/// document of a not-yet-registered type only fails when actually navigated.
pub fn wrap(
    document: HalDocument,
    fetcher: Arc<dyn Fetcher>,
    type_name: impl Into<String>,
    registry: Arc<DescriptorRegistry>,
) -> RemoteResource {
    RemoteResource {
        inner: Arc::new(Inner {
            document,
            fetcher,
            type_name: type_name.into(),
            registry,
            cache: Mutex::new(HashMap::new()),
        }),
    }
}

impl RemoteResource {
    /// The underlying wire document.
    pub fn document(&self) -> &HalDocument {
        &self.inner.document
    }

    /// The document's state properties as a JSON object.
    pub fn state_value(&self) -> Value {
        Value::Object(self.inner.document.state.clone())
    }

    /// Deserializes the document's state into a typed value.
    pub fn state<T: DeserializeOwned>(&self) -> Result<T, RemoteResourceError> {
        serde_json::from_value(self.state_value()).map_err(|e| {
            RemoteResourceError::new(self.base_uri(), format!("state deserialization failed: {e}"))
        })
    }

    /// The document's canonical href, when present.
    pub fn self_href(&self) -> Option<&str> {
        self.inner.document.self_link().map(|l| l.href.as_str())
    }

    /// Error entries the server attached to this document, if any. A
    /// non-empty list marks a partial response; whether that matters is the
    /// caller's judgment, not the proxy's.
    pub fn error_entries(&self) -> &[ErrorEntry] {
        &self.inner.document.errors
    }

    /// Navigates a relation, supplying values for its template variables.
    ///
    /// Returns the relation's targets in wire order; an absent relation is
    /// the empty result. See the module docs for the laziness and caching
    /// contract.
    #[instrument(skip(self, variables), fields(resource_type = %self.inner.type_name))]
    pub async fn related(
        &self,
        relation: &str,
        variables: &HashMap<String, String>,
    ) -> Result<Vec<RemoteResource>, RemoteResourceError> {
        let key = cache_key(relation, variables);
        let mut cache = self.inner.cache.lock().await;
        if let Some(cached) = cache.get(&key) {
            debug!(relation, "serving relation from proxy cache");
            return cached.clone();
        }
        let result = self.follow(relation, variables).await;
        cache.insert(key, result.clone());
        result
    }

    /// Navigates an optional relation: first target or `None`.
    pub async fn related_optional(
        &self,
        relation: &str,
        variables: &HashMap<String, String>,
    ) -> Result<Option<RemoteResource>, RemoteResourceError> {
        Ok(self.related(relation, variables).await?.into_iter().next())
    }

    /// Navigates a single-valued relation; a missing target is an error.
    pub async fn related_single(
        &self,
        relation: &str,
        variables: &HashMap<String, String>,
    ) -> Result<RemoteResource, RemoteResourceError> {
        self.related(relation, variables)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| {
                RemoteResourceError::new(
                    self.base_uri(),
                    format!("relation `{relation}` produced no target"),
                )
            })
    }

    async fn follow(
        &self,
        relation: &str,
        variables: &HashMap<String, String>,
    ) -> Result<Vec<RemoteResource>, RemoteResourceError> {
        let descriptor = self
            .inner
            .registry
            .describe(&self.inner.type_name)
            .map_err(|e| RemoteResourceError::new(self.base_uri(), e.to_string()))?;
        let rel = descriptor.relation(relation).ok_or_else(|| {
            RemoteResourceError::new(
                self.base_uri(),
                format!(
                    "unknown relation `{relation}` on type `{}`",
                    self.inner.type_name
                ),
            )
        })?;

        let embedded = self.inner.document.embedded_for(relation);
        if !embedded.is_empty() {
            debug!(relation, count = embedded.len(), "relation already embedded, no fetch");
            return Ok(embedded
                .iter()
                .map(|doc| self.child(doc.clone(), &rel.target_type))
                .collect());
        }

        let links = self.inner.document.links_for(relation);
        if links.is_empty() {
            debug!(relation, "relation absent, returning empty result");
            return Ok(Vec::new());
        }

        let mut targets = Vec::with_capacity(links.len());
        for link in links {
            let expanded = link.expand(variables);
            if expanded.templated {
                return Err(RemoteResourceError::new(
                    expanded.href,
                    format!("link for relation `{relation}` still templated after variable substitution"),
                ));
            }
            debug!(relation, uri = %expanded.href, "fetching linked relation");
            let document = self.inner.fetcher.fetch(&expanded.href).await?;
            targets.push(self.child(document, &rel.target_type));
        }
        Ok(targets)
    }

    fn child(&self, document: HalDocument, target_type: &str) -> RemoteResource {
        wrap(
            document,
            Arc::clone(&self.inner.fetcher),
            target_type,
            Arc::clone(&self.inner.registry),
        )
    }

    fn base_uri(&self) -> String {
        self.self_href().unwrap_or_default().to_string()
    }
}

fn cache_key(relation: &str, variables: &HashMap<String, String>) -> String {
    let mut pairs: Vec<_> = variables.iter().collect();
    pairs.sort();
    let mut key = relation.to_string();
    for (name, value) in pairs {
        key.push('\u{1}');
        key.push_str(name);
        key.push('=');
        key.push_str(value);
    }
    key
}

/// A fetched document honors the same accessor contract as a local resource,
/// so it can be re-composed by a resolver. Template variables cannot be
/// supplied through this seam; templated links navigated this way fail with
/// the usual unexpanded-template error.
#[async_trait]
impl Resource for RemoteResource {
    fn type_name(&self) -> &str {
        &self.inner.type_name
    }

    async fn state(&self) -> Result<Option<Value>, BoxError> {
        if self.inner.document.state.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.state_value()))
        }
    }

    fn self_link(&self) -> Option<Link> {
        self.inner.document.self_link().cloned()
    }

    async fn related(&self, relation: &str) -> Result<Vec<Arc<dyn Resource>>, BoxError> {
        let targets = RemoteResource::related(self, relation, &HashMap::new()).await?;
        Ok(targets
            .into_iter()
            .map(|target| Arc::new(target) as Arc<dyn Resource>)
            .collect())
    }
}
