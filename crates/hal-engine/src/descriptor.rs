//! # Resource Type Descriptors
//!
//! Static description of a resource type: whether it exposes state, and the
//! ordered list of relations leading out of it. Descriptors are built once
//! through an explicit builder, validated eagerly, and never mutated again.
//! Both the server-side resolver and the client-side proxy drive off the same
//! descriptor, which is what keeps the two directions in sync.
//!
//! # Design Note
//! There is no reflection here on purpose. Each type registers its descriptor
//! declaratively at startup; a malformed registration fails with
//! [`MetadataError`] before any request is served. Target types are referenced
//! *by name* and resolved lazily through the
//! [`DescriptorRegistry`](crate::registry::DescriptorRegistry), which is what
//! makes mutually-recursive types legal.

use crate::error::MetadataError;

/// How many targets a relation may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one target.
    Single,
    /// Zero or one target.
    Optional,
    /// Zero or more targets, in producer order.
    Many,
}

/// A named, typed edge from one resource type to another.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationDescriptor {
    /// Relation identifier, unique within the owning type.
    pub name: String,
    pub cardinality: Cardinality,
    /// Default for whether targets of this relation should be embedded rather
    /// than only linked. An [`EmbeddingPolicy`](crate::policy::EmbeddingPolicy)
    /// may override this per call.
    pub embed_preferred: bool,
    /// Named parameters substituted into the relation's URI template.
    /// Unique within the relation.
    pub template_variables: Vec<String>,
    /// Name of the target resource type, resolved lazily via the registry.
    pub target_type: String,
}

impl RelationDescriptor {
    fn new(name: &str, target_type: &str, cardinality: Cardinality) -> Self {
        Self {
            name: name.to_string(),
            cardinality,
            embed_preferred: false,
            template_variables: Vec::new(),
            target_type: target_type.to_string(),
        }
    }

    /// A relation producing exactly one target.
    pub fn single(name: &str, target_type: &str) -> Self {
        Self::new(name, target_type, Cardinality::Single)
    }

    /// A relation producing zero or one target.
    pub fn optional(name: &str, target_type: &str) -> Self {
        Self::new(name, target_type, Cardinality::Optional)
    }

    /// A relation producing zero or more targets.
    pub fn many(name: &str, target_type: &str) -> Self {
        Self::new(name, target_type, Cardinality::Many)
    }

    /// Marks targets of this relation as embedded by default.
    pub fn embed_preferred(mut self) -> Self {
        self.embed_preferred = true;
        self
    }

    /// Declares a template variable that parameterizes this relation's link.
    pub fn template_variable(mut self, name: &str) -> Self {
        self.template_variables.push(name.to_string());
        self
    }
}

/// Static description of a resource type.
///
/// Immutable once built. Lives for the process inside a
/// [`DescriptorRegistry`](crate::registry::DescriptorRegistry).
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceTypeDescriptor {
    pub type_name: String,
    /// Whether instances of this type expose directly-rendered properties.
    pub has_state: bool,
    /// Outgoing relations, in declared order. The resolver assembles output
    /// sections in exactly this order.
    pub relations: Vec<RelationDescriptor>,
}

impl ResourceTypeDescriptor {
    pub fn builder(type_name: &str) -> ResourceTypeDescriptorBuilder {
        ResourceTypeDescriptorBuilder {
            type_name: type_name.to_string(),
            has_state: false,
            relations: Vec::new(),
        }
    }

    /// Looks up a relation by name.
    pub fn relation(&self, name: &str) -> Option<&RelationDescriptor> {
        self.relations.iter().find(|r| r.name == name)
    }
}

/// Builder for [`ResourceTypeDescriptor`]. Validation happens in
/// [`build`](Self::build) so a malformed registration fails loudly at
/// startup instead of corrupting a live resolution.
pub struct ResourceTypeDescriptorBuilder {
    type_name: String,
    has_state: bool,
    relations: Vec<RelationDescriptor>,
}

impl ResourceTypeDescriptorBuilder {
    /// Declares that instances of this type expose state properties.
    pub fn with_state(mut self) -> Self {
        self.has_state = true;
        self
    }

    /// Appends a relation. Declared order is preserved in output.
    pub fn relation(mut self, relation: RelationDescriptor) -> Self {
        self.relations.push(relation);
        self
    }

    /// Validates and freezes the descriptor.
    ///
    /// # Errors
    /// Fails when two relations share a name, or a relation declares the same
    /// template variable twice.
    pub fn build(self) -> Result<ResourceTypeDescriptor, MetadataError> {
        for (i, rel) in self.relations.iter().enumerate() {
            if self.relations[..i].iter().any(|r| r.name == rel.name) {
                return Err(MetadataError::DuplicateRelation {
                    type_name: self.type_name.clone(),
                    relation: rel.name.clone(),
                });
            }
            for (j, var) in rel.template_variables.iter().enumerate() {
                if rel.template_variables[..j].contains(var) {
                    return Err(MetadataError::DuplicateVariable {
                        relation: rel.name.clone(),
                        variable: var.clone(),
                    });
                }
            }
        }
        Ok(ResourceTypeDescriptor {
            type_name: self.type_name,
            has_state: self.has_state,
            relations: self.relations,
        })
    }
}
