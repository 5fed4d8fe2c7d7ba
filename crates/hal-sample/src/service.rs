//! # Catalog Service
//!
//! The composition root for the catalog domain: registers descriptors and
//! link relation metadata once at construction, then serves resolve, render,
//! and wrap entry points. One service instance is shared by any number of
//! concurrent requests; per-request state lives entirely in the resolved
//! trees.

use std::sync::Arc;
use std::time::Duration;

use hal_engine::{
    wrap, DescriptorRegistry, Fetcher, HalDocument, LinkRelationRegistry, MaterializedResponse,
    MetadataError, PreferredEmbedding, RelationDescriptor, RemoteResource, Renderer, ResolveError,
    Resolver, ResourceTypeDescriptor,
};
use tracing::{info, instrument};

use crate::resources::{CatalogResource, CATALOG_TYPE, ITEMS_REL, ITEM_TYPE, NEXT_PAGE_REL};

pub struct CatalogService {
    registry: Arc<DescriptorRegistry>,
    relations: Arc<LinkRelationRegistry>,
    resolver: Resolver,
    renderer: Renderer,
}

impl CatalogService {
    /// Builds the service, registering all catalog metadata.
    ///
    /// # Errors
    /// Fails if a descriptor registration is malformed, which makes a broken
    /// deployment fail at startup instead of on the first request.
    pub fn new() -> Result<Self, MetadataError> {
        let registry = Arc::new(DescriptorRegistry::new());
        registry.register(
            ResourceTypeDescriptor::builder(CATALOG_TYPE)
                .with_state()
                .relation(RelationDescriptor::many(ITEMS_REL, ITEM_TYPE).embed_preferred())
                .relation(
                    RelationDescriptor::optional(NEXT_PAGE_REL, CATALOG_TYPE)
                        .template_variable("page"),
                )
                .build()?,
        );
        registry.register(
            ResourceTypeDescriptor::builder(ITEM_TYPE)
                .with_state()
                .build()?,
        );

        let mut relations = LinkRelationRegistry::new();
        relations.register(ITEMS_REL, "Items on this catalog page");
        relations.register(NEXT_PAGE_REL, "Next catalog page");
        let relations = Arc::new(relations);

        info!("catalog metadata registered");
        Ok(Self {
            resolver: Resolver::new(Arc::clone(&registry), Arc::clone(&relations)),
            renderer: Renderer::new(Arc::clone(&relations)),
            registry,
            relations,
        })
    }

    pub fn registry(&self) -> Arc<DescriptorRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn relations(&self) -> Arc<LinkRelationRegistry> {
        Arc::clone(&self.relations)
    }

    /// Resolves a catalog page with the default embedding preferences.
    #[instrument(skip_all)]
    pub async fn resolve_catalog(
        &self,
        catalog: Arc<CatalogResource>,
        deadline: Option<Duration>,
    ) -> Result<MaterializedResponse, ResolveError> {
        self.resolver
            .resolve(catalog, &PreferredEmbedding, deadline)
            .await
    }

    /// Resolves and renders a catalog page into a wire document.
    #[instrument(skip_all)]
    pub async fn render_catalog(
        &self,
        catalog: Arc<CatalogResource>,
        deadline: Option<Duration>,
    ) -> Result<HalDocument, ResolveError> {
        let tree = self.resolve_catalog(catalog, deadline).await?;
        info!(
            nodes = tree.meta.as_ref().map_or(0, |m| m.resolved_nodes),
            errors = tree.errors.len(),
            "catalog resolved"
        );
        Ok(self.renderer.render(&tree))
    }

    /// Wraps an inbound catalog document into a navigable proxy.
    pub fn wrap_catalog(&self, document: HalDocument, fetcher: Arc<dyn Fetcher>) -> RemoteResource {
        wrap(document, fetcher, CATALOG_TYPE, Arc::clone(&self.registry))
    }
}
