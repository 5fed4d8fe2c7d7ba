//! # Materialized Response Tree
//!
//! The request-scoped result of a resolution: state, per-relation links,
//! per-relation embedded children, relation-scoped errors, and generation
//! metadata. Built once per `resolve` call, immutable after construction,
//! and owned exclusively by the caller, which is why nothing here needs a
//! lock.
//!
//! Relations appear in the order the owning type declared them, and elements
//! of a multi-valued relation appear in producer emission order, regardless
//! of the order their async resolutions completed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::resource::Link;

/// A relation-scoped, non-fatal failure surfaced inside a response.
///
/// Producing one of these never terminates resolution of sibling relations;
/// the renderer maps them to a vnd.error-style `errors` section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub title: String,
    /// HTTP-style status classifying the failure (500 for accessor and
    /// resolution failures, 504 for per-relation timeouts).
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Link back to the resource in error, when its identity is known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    /// Bounded cause chain, outermost first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub causes: Vec<String>,
}

/// Timing and generation info recorded on the root of a resolved tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Wall-clock duration of the resolution, in milliseconds.
    pub elapsed_ms: u64,
    /// Number of resources materialized into the tree (root included).
    pub resolved_nodes: usize,
}

/// Ordered links for one relation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationLinks {
    pub relation: String,
    pub links: Vec<Link>,
}

/// Ordered embedded children for one relation.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationEmbeds {
    pub relation: String,
    pub resources: Vec<MaterializedResponse>,
}

/// One fully resolved node of the response tree.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterializedResponse {
    /// Directly-exposed properties, or `None` for stateless types.
    pub state: Option<Value>,
    /// Canonical self link. Always present on the root; may be absent on
    /// embedded values that declared themselves non-linkable.
    pub self_link: Option<Link>,
    /// Per-relation links, in the owning type's declared relation order.
    pub links: Vec<RelationLinks>,
    /// Per-relation embedded children, in declared relation order.
    pub embedded: Vec<RelationEmbeds>,
    /// Non-fatal failures scoped to this node's relations.
    pub errors: Vec<ErrorEntry>,
    /// Generation metadata; populated on the root only.
    pub meta: Option<ResponseMeta>,
}

impl MaterializedResponse {
    /// Links emitted for a relation, if any.
    pub fn links_for(&self, relation: &str) -> Option<&[Link]> {
        self.links
            .iter()
            .find(|l| l.relation == relation)
            .map(|l| l.links.as_slice())
    }

    /// Embedded children of a relation, if any.
    pub fn embedded_for(&self, relation: &str) -> Option<&[MaterializedResponse]> {
        self.embedded
            .iter()
            .find(|e| e.relation == relation)
            .map(|e| e.resources.as_slice())
    }

    /// Total number of nodes in this subtree, itself included.
    pub fn node_count(&self) -> usize {
        1 + self
            .embedded
            .iter()
            .flat_map(|e| e.resources.iter())
            .map(MaterializedResponse::node_count)
            .sum::<usize>()
    }
}
