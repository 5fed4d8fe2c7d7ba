//! # Registries
//!
//! Two process-lifetime registries back the engine:
//!
//! - [`DescriptorRegistry`]: the memoized cache of
//!   [`ResourceTypeDescriptor`]s. This is the only state shared across
//!   concurrent requests. It is append-only and read-mostly: registrations
//!   are idempotent (re-registering an equal descriptor is harmless under
//!   races), so concurrent lookups only need the lock the storage primitive
//!   requires for memory safety.
//! - [`LinkRelationRegistry`]: maps relation names to human-readable titles
//!   and CURIE namespaces. Populated at startup, read-only during request
//!   processing. A missing entry is not an error; the renderer simply emits
//!   the relation without a title.
//!
//! # Design Note
//! Both registries are explicitly constructed and injected rather than
//! implicit singletons, so tests can build isolated instances.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::descriptor::ResourceTypeDescriptor;
use crate::error::MetadataError;

/// Injectable, process-lifetime cache of resource type descriptors.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    inner: RwLock<HashMap<String, Arc<ResourceTypeDescriptor>>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a descriptor under its type name.
    ///
    /// Idempotent: registering an equal descriptor again overwrites with an
    /// equal value, which is harmless even under concurrent registration.
    pub fn register(&self, descriptor: ResourceTypeDescriptor) -> Arc<ResourceTypeDescriptor> {
        let descriptor = Arc::new(descriptor);
        let mut inner = self.inner.write().expect("descriptor registry poisoned");
        inner.insert(descriptor.type_name.clone(), Arc::clone(&descriptor));
        descriptor
    }

    /// Looks up the descriptor for a type name.
    ///
    /// # Errors
    /// [`MetadataError::UnknownType`] when the type was never registered.
    /// Because relation target types resolve through this call lazily, an
    /// unregistered target surfaces here on first use.
    pub fn describe(&self, type_name: &str) -> Result<Arc<ResourceTypeDescriptor>, MetadataError> {
        let inner = self.inner.read().expect("descriptor registry poisoned");
        inner
            .get(type_name)
            .cloned()
            .ok_or_else(|| MetadataError::UnknownType(type_name.to_string()))
    }

    /// Memoized describe: returns the cached descriptor, or builds one with
    /// `build` and caches it. Recomputation under a race yields an equal
    /// value, so last-write-wins is acceptable.
    pub fn describe_with<F>(
        &self,
        type_name: &str,
        build: F,
    ) -> Result<Arc<ResourceTypeDescriptor>, MetadataError>
    where
        F: FnOnce() -> Result<ResourceTypeDescriptor, MetadataError>,
    {
        if let Ok(found) = self.describe(type_name) {
            return Ok(found);
        }
        Ok(self.register(build()?))
    }

    /// Whether a type name has been registered.
    pub fn contains(&self, type_name: &str) -> bool {
        let inner = self.inner.read().expect("descriptor registry poisoned");
        inner.contains_key(type_name)
    }
}

/// Title and CURIE namespace for a link relation name.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationInfo {
    pub title: Option<String>,
    /// CURIE namespace prefix documenting this relation, if any.
    pub curie: Option<String>,
}

/// Process-wide mapping from relation name to documentation metadata.
///
/// Registration happens at startup through `&mut self` methods; afterwards
/// the registry is shared behind an `Arc` and only read.
#[derive(Debug, Default)]
pub struct LinkRelationRegistry {
    entries: HashMap<String, RelationInfo>,
    curies: HashMap<String, String>,
}

impl LinkRelationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a human-readable title for a relation name.
    pub fn register(&mut self, name: &str, title: &str) {
        self.entries.insert(
            name.to_string(),
            RelationInfo {
                title: Some(title.to_string()),
                curie: None,
            },
        );
    }

    /// Registers a relation name with both a title and a CURIE namespace.
    pub fn register_with_curie(&mut self, name: &str, title: &str, curie: &str) {
        self.entries.insert(
            name.to_string(),
            RelationInfo {
                title: Some(title.to_string()),
                curie: Some(curie.to_string()),
            },
        );
    }

    /// Registers a CURIE namespace with its documentation href template,
    /// e.g. `("doc", "https://example.org/rels/{rel}")`.
    pub fn register_curie(&mut self, namespace: &str, href_template: &str) {
        self.curies
            .insert(namespace.to_string(), href_template.to_string());
    }

    /// Looks up documentation metadata for a relation name.
    /// Absence is not an error.
    pub fn lookup(&self, name: &str) -> Option<&RelationInfo> {
        self.entries.get(name)
    }

    /// Looks up the href template for a CURIE namespace.
    pub fn curie_href(&self, namespace: &str) -> Option<&str> {
        self.curies.get(namespace).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::RelationDescriptor;

    fn catalog_descriptor() -> ResourceTypeDescriptor {
        ResourceTypeDescriptor::builder("catalog")
            .with_state()
            .relation(RelationDescriptor::many("items", "item").embed_preferred())
            .build()
            .unwrap()
    }

    #[test]
    fn describe_is_idempotent() {
        let registry = DescriptorRegistry::new();
        let first = registry
            .describe_with("catalog", || Ok(catalog_descriptor()))
            .unwrap();
        let second = registry
            .describe_with("catalog", || panic!("must not recompute"))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first.relations.len(), second.relations.len());
    }

    #[test]
    fn unknown_type_is_a_metadata_error() {
        let registry = DescriptorRegistry::new();
        assert_eq!(
            registry.describe("missing").unwrap_err(),
            MetadataError::UnknownType("missing".into())
        );
    }

    #[test]
    fn re_registration_overwrites_with_equal_value() {
        let registry = DescriptorRegistry::new();
        registry.register(catalog_descriptor());
        registry.register(catalog_descriptor());
        assert!(registry.contains("catalog"));
        assert_eq!(*registry.describe("catalog").unwrap(), catalog_descriptor());
    }

    #[test]
    fn relation_lookup_falls_back_to_absent() {
        let mut relations = LinkRelationRegistry::new();
        relations.register_with_curie("doc:items", "Catalog items", "doc");
        relations.register_curie("doc", "https://example.org/rels/{rel}");

        let info = relations.lookup("doc:items").unwrap();
        assert_eq!(info.title.as_deref(), Some("Catalog items"));
        assert_eq!(info.curie.as_deref(), Some("doc"));
        assert!(relations.lookup("unregistered").is_none());
        assert_eq!(
            relations.curie_href("doc"),
            Some("https://example.org/rels/{rel}")
        );
    }
}
