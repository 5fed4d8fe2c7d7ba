//! # Embedding Policy
//!
//! Whether a relation's targets are inlined (`Embed`) or referenced
//! (`Link`) is business configuration, not engine logic. The engine consults
//! an injected [`EmbeddingPolicy`] at every relation and otherwise assumes
//! nothing; in particular there is no built-in default embed depth.
//!
//! The provided implementations cover the common cases; anything richer
//! ("never embed relation X", per-tenant rules, ...) is a small custom impl.

use crate::descriptor::RelationDescriptor;

/// Outcome of an embedding decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Inline the target's fully rendered content and keep resolving.
    Embed,
    /// Emit only the canonical link; do not resolve the target further.
    Link,
}

/// Pure decision function consulted once per relation per node.
///
/// `depth` is the embedding depth of the node owning the relation; the root's
/// relations are decided at depth 0.
pub trait EmbeddingPolicy: Send + Sync {
    fn decide(&self, relation: &RelationDescriptor, depth: usize) -> Decision;
}

/// Follows each relation's declared `embed_preferred` default.
#[derive(Debug, Default, Clone, Copy)]
pub struct PreferredEmbedding;

impl EmbeddingPolicy for PreferredEmbedding {
    fn decide(&self, relation: &RelationDescriptor, _depth: usize) -> Decision {
        if relation.embed_preferred {
            Decision::Embed
        } else {
            Decision::Link
        }
    }
}

/// Never embeds anything; every relation renders as links only.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinkOnly;

impl EmbeddingPolicy for LinkOnly {
    fn decide(&self, _relation: &RelationDescriptor, _depth: usize) -> Decision {
        Decision::Link
    }
}

/// Wraps another policy and forces `Link` once `depth` reaches `max_depth`,
/// bounding how deeply an embedding chain may nest.
#[derive(Debug, Clone, Copy)]
pub struct MaxDepth<P> {
    inner: P,
    max_depth: usize,
}

impl<P> MaxDepth<P> {
    pub fn new(inner: P, max_depth: usize) -> Self {
        Self { inner, max_depth }
    }
}

impl<P: EmbeddingPolicy> EmbeddingPolicy for MaxDepth<P> {
    fn decide(&self, relation: &RelationDescriptor, depth: usize) -> Decision {
        if depth >= self.max_depth {
            Decision::Link
        } else {
            self.inner.decide(relation, depth)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferred_embedding_follows_descriptor_default() {
        let embed = RelationDescriptor::many("items", "item").embed_preferred();
        let link = RelationDescriptor::optional("next_page", "catalog");
        assert_eq!(PreferredEmbedding.decide(&embed, 0), Decision::Embed);
        assert_eq!(PreferredEmbedding.decide(&link, 0), Decision::Link);
    }

    #[test]
    fn max_depth_forces_link_past_the_bound() {
        let rel = RelationDescriptor::many("items", "item").embed_preferred();
        let policy = MaxDepth::new(PreferredEmbedding, 2);
        assert_eq!(policy.decide(&rel, 0), Decision::Embed);
        assert_eq!(policy.decide(&rel, 1), Decision::Embed);
        assert_eq!(policy.decide(&rel, 2), Decision::Link);
        assert_eq!(policy.decide(&rel, 3), Decision::Link);
    }
}
