//! Integration tests for the resolution engine: failure scoping, ordering,
//! cycle handling, and cancellation.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hal_engine::{
    BoxError, DescriptorRegistry, Link, LinkOnly, LinkRelationRegistry, MetadataError,
    PreferredEmbedding, RelationDescriptor, ResolveError, Resolver, Resource,
    ResourceTypeDescriptor,
};
use serde_json::{json, Value};

// --- Test Fixture ---

/// A scriptable resource: configurable state, delay, self link, relation
/// targets, and injected failures.
struct TestResource {
    type_name: &'static str,
    state: Option<Value>,
    fail_state: bool,
    state_delay: Duration,
    self_link: Option<Link>,
    relations: Vec<(String, Vec<Arc<dyn Resource>>)>,
    failing_relations: HashSet<String>,
}

impl TestResource {
    fn new(type_name: &'static str, href: &str, state: Value) -> Self {
        Self {
            type_name,
            state: Some(state),
            fail_state: false,
            state_delay: Duration::ZERO,
            self_link: Some(Link::new(href)),
            relations: Vec::new(),
            failing_relations: HashSet::new(),
        }
    }

    fn with_relation(mut self, name: &str, targets: Vec<Arc<dyn Resource>>) -> Self {
        self.relations.push((name.to_string(), targets));
        self
    }

    fn with_failing_relation(mut self, name: &str) -> Self {
        self.failing_relations.insert(name.to_string());
        self
    }

    fn with_state_delay(mut self, delay: Duration) -> Self {
        self.state_delay = delay;
        self
    }

    fn failing_state(mut self) -> Self {
        self.fail_state = true;
        self
    }

    fn without_self_link(mut self) -> Self {
        self.self_link = None;
        self
    }

    fn shared(self) -> Arc<dyn Resource> {
        Arc::new(self)
    }
}

#[async_trait]
impl Resource for TestResource {
    fn type_name(&self) -> &str {
        self.type_name
    }

    async fn state(&self) -> Result<Option<Value>, BoxError> {
        if !self.state_delay.is_zero() {
            tokio::time::sleep(self.state_delay).await;
        }
        if self.fail_state {
            return Err("state accessor exploded".into());
        }
        Ok(self.state.clone())
    }

    fn self_link(&self) -> Option<Link> {
        self.self_link.clone()
    }

    async fn related(&self, relation: &str) -> Result<Vec<Arc<dyn Resource>>, BoxError> {
        if self.failing_relations.contains(relation) {
            return Err(format!("{relation} backend unavailable").into());
        }
        Ok(self
            .relations
            .iter()
            .find(|(name, _)| name == relation)
            .map(|(_, targets)| targets.clone())
            .unwrap_or_default())
    }
}

fn catalog_engine() -> (Arc<DescriptorRegistry>, Resolver) {
    let registry = Arc::new(DescriptorRegistry::new());
    registry.register(
        ResourceTypeDescriptor::builder("catalog")
            .with_state()
            .relation(RelationDescriptor::many("items", "item").embed_preferred())
            .relation(RelationDescriptor::optional("next_page", "catalog").template_variable("page"))
            .build()
            .unwrap(),
    );
    registry.register(
        ResourceTypeDescriptor::builder("item")
            .with_state()
            .build()
            .unwrap(),
    );
    let mut relations = LinkRelationRegistry::new();
    relations.register("items", "Catalog items");
    let resolver = Resolver::new(Arc::clone(&registry), Arc::new(relations));
    (registry, resolver)
}

fn item(sku: &str) -> Arc<dyn Resource> {
    TestResource::new("item", &format!("/items/{sku}"), json!({ "sku": sku })).shared()
}

// --- Tests ---

#[tokio::test]
async fn sibling_relations_resolve_independently_under_failure() {
    let (_registry, resolver) = catalog_engine();
    let root = TestResource::new("catalog", "/catalog", json!({ "title": "c" }))
        .with_relation("items", vec![item("a")])
        .with_failing_relation("next_page")
        .shared();

    let tree = resolver
        .resolve(root, &PreferredEmbedding, None)
        .await
        .unwrap();

    let items = tree.embedded_for("items").unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].state.as_ref().unwrap()["sku"], json!("a"));

    assert_eq!(tree.errors.len(), 1);
    assert_eq!(tree.errors[0].title, "next_page resolution failed");
    assert_eq!(tree.errors[0].status, 500);
    assert_eq!(tree.errors[0].about.as_deref(), Some("/catalog"));
    assert!(tree
        .errors[0]
        .detail
        .as_deref()
        .unwrap()
        .contains("backend unavailable"));
}

#[tokio::test]
async fn failing_element_keeps_its_siblings() {
    let (_registry, resolver) = catalog_engine();
    let broken: Arc<dyn Resource> =
        TestResource::new("item", "/items/b", json!({ "sku": "b" }))
            .failing_state()
            .shared();
    let root = TestResource::new("catalog", "/catalog", json!({ "title": "c" }))
        .with_relation("items", vec![item("a"), broken, item("c")])
        .shared();

    let tree = resolver
        .resolve(root, &PreferredEmbedding, None)
        .await
        .unwrap();

    let items = tree.embedded_for("items").unwrap();
    let skus: Vec<_> = items
        .iter()
        .map(|i| i.state.as_ref().unwrap()["sku"].clone())
        .collect();
    assert_eq!(skus, vec![json!("a"), json!("c")]);

    assert_eq!(tree.errors.len(), 1);
    assert_eq!(tree.errors[0].title, "item resolution failed");
    assert_eq!(tree.errors[0].status, 500);
    assert_eq!(tree.errors[0].about.as_deref(), Some("/items/b"));
}

#[tokio::test]
async fn multi_valued_order_is_emission_order_not_completion_order() {
    let (_registry, resolver) = catalog_engine();
    let slow: Arc<dyn Resource> = TestResource::new("item", "/items/a", json!({ "sku": "a" }))
        .with_state_delay(Duration::from_millis(80))
        .shared();
    let fast: Arc<dyn Resource> = TestResource::new("item", "/items/b", json!({ "sku": "b" }))
        .with_state_delay(Duration::from_millis(5))
        .shared();
    let medium: Arc<dyn Resource> = TestResource::new("item", "/items/c", json!({ "sku": "c" }))
        .with_state_delay(Duration::from_millis(40))
        .shared();
    let root = TestResource::new("catalog", "/catalog", json!({ "title": "c" }))
        .with_relation("items", vec![slow, fast, medium])
        .shared();

    let tree = resolver
        .resolve(root, &PreferredEmbedding, None)
        .await
        .unwrap();

    let skus: Vec<_> = tree
        .embedded_for("items")
        .unwrap()
        .iter()
        .map(|i| i.state.as_ref().unwrap()["sku"].clone())
        .collect();
    assert_eq!(skus, vec![json!("a"), json!("b"), json!("c")]);
}

#[tokio::test]
async fn embed_cycle_is_demoted_to_link() {
    let registry = Arc::new(DescriptorRegistry::new());
    registry.register(
        ResourceTypeDescriptor::builder("node")
            .with_state()
            .relation(RelationDescriptor::single("partner", "node").embed_preferred())
            .build()
            .unwrap(),
    );
    let resolver = Resolver::new(registry, Arc::new(LinkRelationRegistry::new()));

    // a -> b -> a again: the second `a` shares the first one's self link
    let a_again: Arc<dyn Resource> =
        TestResource::new("node", "/nodes/a", json!({ "id": "a" })).shared();
    let b: Arc<dyn Resource> = TestResource::new("node", "/nodes/b", json!({ "id": "b" }))
        .with_relation("partner", vec![a_again])
        .shared();
    let a = TestResource::new("node", "/nodes/a", json!({ "id": "a" }))
        .with_relation("partner", vec![b])
        .shared();

    let tree = resolver
        .resolve(a, &PreferredEmbedding, None)
        .await
        .unwrap();

    let b_node = &tree.embedded_for("partner").unwrap()[0];
    assert_eq!(b_node.state.as_ref().unwrap()["id"], json!("b"));
    // b's partner is not embedded again, only linked
    assert!(b_node.embedded_for("partner").is_none());
    assert_eq!(b_node.links_for("partner").unwrap()[0].href, "/nodes/a");
    assert!(tree.errors.is_empty());
    assert!(b_node.errors.is_empty());
}

#[tokio::test]
async fn cancellation_keeps_completed_relations_and_reports_pending_ones() {
    let (_registry, resolver) = catalog_engine();
    let hanging: Arc<dyn Resource> =
        TestResource::new("catalog", "/catalog?page=2", json!({ "title": "p2" }))
            .with_state_delay(Duration::from_secs(10))
            .shared();
    let root = TestResource::new("catalog", "/catalog", json!({ "title": "c" }))
        .with_relation("items", vec![item("a")])
        .with_relation("next_page", vec![hanging])
        .shared();

    // force next_page to embed so its slow state computation is on the path
    struct EmbedEverything;
    impl hal_engine::EmbeddingPolicy for EmbedEverything {
        fn decide(&self, _: &RelationDescriptor, _: usize) -> hal_engine::Decision {
            hal_engine::Decision::Embed
        }
    }

    let tree = resolver
        .resolve(root, &EmbedEverything, Some(Duration::from_millis(150)))
        .await
        .unwrap();

    // the fast relation completed and was kept
    assert_eq!(tree.embedded_for("items").unwrap().len(), 1);
    // the pending relation surfaced as a timeout entry, not a silent drop
    assert_eq!(tree.errors.len(), 1);
    assert_eq!(tree.errors[0].title, "next_page resolution timed out");
    assert_eq!(tree.errors[0].status, 504);
    // generation metadata still present on the partial response
    assert!(tree.meta.is_some());
}

#[tokio::test]
async fn root_state_overrunning_the_deadline_is_fatal() {
    let (_registry, resolver) = catalog_engine();
    let root = TestResource::new("catalog", "/catalog", json!({ "title": "c" }))
        .with_state_delay(Duration::from_secs(5))
        .shared();

    let started = std::time::Instant::now();
    let err = resolver
        .resolve(root, &PreferredEmbedding, Some(Duration::from_millis(100)))
        .await
        .unwrap_err();

    // the deadline bounds the root's own work, not just its relations
    assert!(matches!(err, ResolveError::RootDeadline));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn link_only_relations_emit_links_without_recursing() {
    let (_registry, resolver) = catalog_engine();
    let next: Arc<dyn Resource> = TestResource::new("catalog", "/catalog?page=2", json!({}))
        .with_failing_relation("items")
        .shared();
    let root = TestResource::new("catalog", "/catalog", json!({ "title": "c" }))
        .with_relation("items", vec![item("a")])
        .with_relation("next_page", vec![next])
        .shared();

    let tree = resolver
        .resolve(root, &PreferredEmbedding, None)
        .await
        .unwrap();

    // next_page is link-only by preference; its own failing relation was
    // never touched because link-only targets are not resolved further
    let next_links = tree.links_for("next_page").unwrap();
    assert_eq!(next_links[0].href, "/catalog?page=2");
    assert!(tree.errors.is_empty());

    // embedded linkable targets also contribute links, with registry titles
    let item_links = tree.links_for("items").unwrap();
    assert_eq!(item_links[0].href, "/items/a");
    assert_eq!(item_links[0].title.as_deref(), Some("Catalog items"));
}

#[tokio::test]
async fn link_only_everything_resolves_just_the_root() {
    let (_registry, resolver) = catalog_engine();
    let root = TestResource::new("catalog", "/catalog", json!({ "title": "c" }))
        .with_relation("items", vec![item("a"), item("b")])
        .shared();

    let tree = resolver.resolve(root, &LinkOnly, None).await.unwrap();

    assert!(tree.embedded.is_empty());
    assert_eq!(tree.links_for("items").unwrap().len(), 2);
    assert_eq!(tree.meta.as_ref().unwrap().resolved_nodes, 1);
}

#[tokio::test]
async fn root_state_failure_is_fatal() {
    let (_registry, resolver) = catalog_engine();
    let root = TestResource::new("catalog", "/catalog", json!({}))
        .failing_state()
        .shared();

    let err = resolver
        .resolve(root, &PreferredEmbedding, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::RootState(_)));
}

#[tokio::test]
async fn root_without_self_link_is_fatal() {
    let (_registry, resolver) = catalog_engine();
    let root = TestResource::new("catalog", "/catalog", json!({}))
        .without_self_link()
        .shared();

    let err = resolver
        .resolve(root, &PreferredEmbedding, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ResolveError::RootSelfLink));
}

#[tokio::test]
async fn unregistered_type_is_fatal() {
    let (_registry, resolver) = catalog_engine();
    let root = TestResource::new("mystery", "/mystery", json!({})).shared();

    let err = resolver
        .resolve(root, &PreferredEmbedding, None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ResolveError::Metadata(MetadataError::UnknownType(name)) if name == "mystery"
    ));
}

#[tokio::test]
async fn non_linkable_embedded_target_is_legal() {
    let registry = Arc::new(DescriptorRegistry::new());
    registry.register(
        ResourceTypeDescriptor::builder("page")
            .with_state()
            .relation(RelationDescriptor::single("teaser", "teaser").embed_preferred())
            .build()
            .unwrap(),
    );
    registry.register(
        ResourceTypeDescriptor::builder("teaser")
            .with_state()
            .build()
            .unwrap(),
    );
    let resolver = Resolver::new(registry, Arc::new(LinkRelationRegistry::new()));

    let teaser: Arc<dyn Resource> =
        TestResource::new("teaser", "", json!({ "text": "inline only" }))
            .without_self_link()
            .shared();
    let root = TestResource::new("page", "/pages/1", json!({ "title": "p" }))
        .with_relation("teaser", vec![teaser])
        .shared();

    let tree = resolver
        .resolve(root, &PreferredEmbedding, None)
        .await
        .unwrap();

    let teaser_node = &tree.embedded_for("teaser").unwrap()[0];
    assert!(teaser_node.self_link.is_none());
    // no link emitted for a non-linkable embedded value
    assert!(tree.links_for("teaser").is_none());
    assert!(tree.errors.is_empty());
}
