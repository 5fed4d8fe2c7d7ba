//! # Wire Document
//!
//! Serde model of the hypermedia wire shape: arbitrary state properties at
//! the top level, `_links` and `_embedded` sections keyed by relation name,
//! an optional vnd.error-style `errors` extension, and a reserved `_meta`
//! object for generation info. The renderer produces this type and the
//! client proxy consumes it, so the two directions cannot drift apart.
//!
//! Link and embedded sections accept both the single-object and the array
//! form, as hypermedia emitters in the wild use either for single-valued
//! relations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::resource::Link;
use crate::response::{ErrorEntry, ResponseMeta};

/// Reserved relation name under which CURIE definitions appear in `_links`.
pub const CURIES_REL: &str = "curies";

/// Reserved relation name for a document's own canonical link.
pub const SELF_REL: &str = "self";

/// One value or an array of values, matching both wire forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    pub fn as_slice(&self) -> &[T] {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value),
            OneOrMany::Many(values) => values.as_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    /// A single element collapses to the object form; anything else keeps
    /// the array form.
    fn from(mut values: Vec<T>) -> Self {
        if values.len() == 1 {
            OneOrMany::One(values.remove(0))
        } else {
            OneOrMany::Many(values)
        }
    }
}

/// A hypermedia document as it appears on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HalDocument {
    /// `_links` section: relation name to link object(s). `self` carries the
    /// document's canonical link, `curies` the CURIE definitions.
    #[serde(rename = "_links", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, OneOrMany<Link>>,

    /// `_embedded` section: relation name to nested document(s).
    #[serde(
        rename = "_embedded",
        default,
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub embedded: BTreeMap<String, OneOrMany<HalDocument>>,

    /// vnd.error-style extension listing relation-scoped failures.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorEntry>,

    /// Generation metadata, present on root documents only.
    #[serde(rename = "_meta", default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,

    /// The document's primary state properties.
    #[serde(flatten)]
    pub state: Map<String, Value>,
}

impl HalDocument {
    /// The document's canonical self link, if present.
    pub fn self_link(&self) -> Option<&Link> {
        self.links.get(SELF_REL).and_then(|l| l.as_slice().first())
    }

    /// Links for a relation, in wire order. Empty when the relation is
    /// absent from `_links`.
    pub fn links_for(&self, relation: &str) -> &[Link] {
        self.links.get(relation).map_or(&[], OneOrMany::as_slice)
    }

    /// Embedded documents for a relation, in wire order. Empty when the
    /// relation is absent from `_embedded`.
    pub fn embedded_for(&self, relation: &str) -> &[HalDocument] {
        self.embedded.get(relation).map_or(&[], OneOrMany::as_slice)
    }

    /// Parses a wire document from bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Serializes this document to bytes.
    pub fn to_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}
