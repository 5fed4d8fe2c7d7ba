//! # Resource Trait
//!
//! The `Resource` trait is the contract every concrete resource (a CMS page,
//! an asset, a catalog entry, ...) must implement to be composed by the
//! engine. It is the server-side accessor seam: the resolver only ever talks
//! to domain adapters through this trait.
//!
//! # Architecture Note
//! By defining a contract that all resource types satisfy, the resolver logic
//! is written *once* and reused for any domain. The trait is object-safe on
//! purpose: a relation accessor returns `Arc<dyn Resource>` targets, so a
//! graph can mix resource types freely while the
//! [`ResourceTypeDescriptor`](crate::descriptor::ResourceTypeDescriptor)
//! looked up via [`type_name`](Resource::type_name) keeps traversal typed at
//! the boundary.
//!
//! # Async & Errors
//! `state` and `related` are `#[async_trait]` methods because computing state
//! or enumerating targets may involve I/O. Failures cross the seam as a
//! boxed error ([`BoxError`]); the resolver decides whether the failure is
//! fatal (root) or degrades to an error entry (any relation).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BoxError;

/// A hypermedia link: an href plus optional documentation metadata.
///
/// Doubles as the wire link object, so the same value flows from a resource's
/// `self_link` through the rendered document into the client proxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub href: String,
    /// Whether `href` still contains unexpanded `{var}` template expressions.
    #[serde(default, skip_serializing_if = "is_false")]
    pub templated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Disambiguates entries of a multi-valued relation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Link {
    /// A concrete (non-templated) link.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: false,
            title: None,
            name: None,
        }
    }

    /// A templated link; `href` contains `{var}` expressions.
    pub fn templated(href: impl Into<String>) -> Self {
        Self {
            templated: true,
            ..Self::new(href)
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Substitutes `{var}` expressions with the supplied values.
    ///
    /// Variables without a supplied value are left in place and keep the link
    /// templated; once every expression is expanded the result is concrete.
    pub fn expand(&self, variables: &HashMap<String, String>) -> Link {
        let mut href = self.href.clone();
        for (name, value) in variables {
            href = href.replace(&format!("{{{name}}}"), value);
        }
        Link {
            templated: href.contains('{'),
            href,
            title: self.title.clone(),
            name: self.name.clone(),
        }
    }
}

/// A concrete object conforming to a resource type descriptor.
///
/// Implementations produce their own state, their canonical self link, and
/// the targets of each declared relation. The resolver never inspects domain
/// objects directly; everything flows through this trait.
#[async_trait]
pub trait Resource: Send + Sync {
    /// The resource type name, used to look up the descriptor in the
    /// [`DescriptorRegistry`](crate::registry::DescriptorRegistry).
    fn type_name(&self) -> &str;

    /// Computes this resource's directly-exposed state, or `None` for types
    /// that declare no state of their own. May involve I/O.
    async fn state(&self) -> Result<Option<Value>, BoxError>;

    /// This resource's canonical self link.
    ///
    /// `None` declares the resource non-linkable, which is only legal for
    /// values reached through an embedded relation; never for the root of a
    /// resolution, and never for a target the policy decided to link.
    fn self_link(&self) -> Option<Link>;

    /// Produces the targets of the named relation, in emission order.
    ///
    /// A relation the implementation does not know should return an error;
    /// an empty result means the relation resolved to no targets.
    async fn related(&self, relation: &str) -> Result<Vec<Arc<dyn Resource>>, BoxError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_substitutes_supplied_variables() {
        let link = Link::templated("/catalog?page={page}&size={size}");
        let vars = HashMap::from([("page".to_string(), "2".to_string())]);
        let expanded = link.expand(&vars);
        assert_eq!(expanded.href, "/catalog?page=2&size={size}");
        assert!(expanded.templated);

        let vars = HashMap::from([
            ("page".to_string(), "2".to_string()),
            ("size".to_string(), "10".to_string()),
        ]);
        let expanded = link.expand(&vars);
        assert_eq!(expanded.href, "/catalog?page=2&size=10");
        assert!(!expanded.templated);
    }

    #[test]
    fn link_serialization_omits_defaults() {
        let json = serde_json::to_value(Link::new("/items/1")).unwrap();
        assert_eq!(json, serde_json::json!({ "href": "/items/1" }));

        let json =
            serde_json::to_value(Link::templated("/catalog?page={page}").with_title("Next page"))
                .unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "href": "/catalog?page={page}",
                "templated": true,
                "title": "Next page",
            })
        );
    }
}
