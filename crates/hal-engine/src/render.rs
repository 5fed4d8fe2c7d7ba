//! # Response Renderer
//!
//! Serializes a [`MaterializedResponse`] tree into the wire document. The
//! renderer is deterministic given its input and never fails on a well-formed
//! tree; a resource whose state is not a JSON object is a programming error
//! in the resource implementation and is signaled as such instead of being
//! swallowed into the response.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;

use crate::document::{HalDocument, OneOrMany, CURIES_REL, SELF_REL};
use crate::registry::LinkRelationRegistry;
use crate::resource::Link;
use crate::response::MaterializedResponse;

/// Renders materialized trees into wire documents, consulting the link
/// relation registry for CURIE definitions.
pub struct Renderer {
    relations: Arc<LinkRelationRegistry>,
}

impl Renderer {
    pub fn new(relations: Arc<LinkRelationRegistry>) -> Self {
        Self { relations }
    }

    /// Renders a resolved tree into a wire document.
    ///
    /// CURIE definitions for every relation appearing anywhere in the tree
    /// are emitted once, under the reserved `curies` relation of the root's
    /// `_links` section.
    pub fn render(&self, response: &MaterializedResponse) -> HalDocument {
        let mut doc = self.node(response);

        let mut namespaces = BTreeSet::new();
        collect_curie_namespaces(response, &self.relations, &mut namespaces);
        let curies: Vec<Link> = namespaces
            .into_iter()
            .filter_map(|ns| {
                self.relations
                    .curie_href(&ns)
                    .map(|href| Link::templated(href).with_name(ns))
            })
            .collect();
        if !curies.is_empty() {
            doc.links
                .insert(CURIES_REL.to_string(), OneOrMany::Many(curies));
        }

        doc
    }

    /// Renders a resolved tree straight to bytes.
    pub fn render_bytes(&self, response: &MaterializedResponse) -> Result<Vec<u8>, serde_json::Error> {
        self.render(response).to_vec()
    }

    fn node(&self, response: &MaterializedResponse) -> HalDocument {
        let mut doc = HalDocument::default();

        match &response.state {
            None => {}
            Some(Value::Object(map)) => doc.state = map.clone(),
            Some(other) => {
                // Resource implementations must expose object-shaped state.
                panic!("resource state must be a JSON object, got: {other}");
            }
        }

        if let Some(self_link) = &response.self_link {
            doc.links
                .insert(SELF_REL.to_string(), OneOrMany::One(self_link.clone()));
        }
        for relation_links in &response.links {
            doc.links.insert(
                relation_links.relation.clone(),
                relation_links.links.clone().into(),
            );
        }
        for relation_embeds in &response.embedded {
            let children: Vec<HalDocument> = relation_embeds
                .resources
                .iter()
                .map(|child| self.node(child))
                .collect();
            doc.embedded
                .insert(relation_embeds.relation.clone(), children.into());
        }
        doc.errors = response.errors.clone();
        doc.meta = response.meta.clone();
        doc
    }
}

fn collect_curie_namespaces(
    response: &MaterializedResponse,
    relations: &LinkRelationRegistry,
    namespaces: &mut BTreeSet<String>,
) {
    let link_rels = response.links.iter().map(|l| l.relation.as_str());
    let embed_rels = response.embedded.iter().map(|e| e.relation.as_str());
    for relation in link_rels.chain(embed_rels) {
        if let Some(ns) = relations.lookup(relation).and_then(|info| info.curie.clone()) {
            namespaces.insert(ns);
        }
    }
    for embeds in &response.embedded {
        for child in &embeds.resources {
            collect_curie_namespaces(child, relations, namespaces);
        }
    }
}
