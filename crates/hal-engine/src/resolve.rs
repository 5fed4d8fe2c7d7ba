//! # Resolution Engine
//!
//! Walks a live resource graph against its descriptors and materializes a
//! [`MaterializedResponse`] tree, deciding per relation whether to embed or
//! link via the injected [`EmbeddingPolicy`].
//!
//! # Concurrency Model
//! Every relation of a node, and every element of a multi-valued relation,
//! is an independently scheduled future; the engine fans them out with
//! `join_all` and joins before assembling the node. `join_all` returns
//! results in input order, which is how output ordering stays deterministic
//! (declared relation order, then producer emission order) no matter which
//! future finishes first. No dedicated threads, no locks: each request owns
//! its tree exclusively.
//!
//! # Cancellation
//! One `CancellationToken` spans the whole `resolve` call; an optional
//! deadline arms a timer that cancels it. Each relation races its work
//! against the token: relations still pending at cancellation degrade to a
//! non-fatal timeout [`ErrorEntry`], while already-completed siblings are
//! kept, yielding a best-effort partial response. The root node itself races
//! the token too; a root still computing its own state at the deadline fails
//! fatally with [`ResolveError::RootDeadline`], because without a root there
//! is no partial response to degrade into.
//!
//! # Failure Scoping
//! Only three things are fatal: the root's state failing, the root missing
//! its self link, and a type without a valid descriptor. Everything else is
//! captured where it happened and attached to the affected node.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::{join_all, BoxFuture};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use crate::descriptor::RelationDescriptor;
use crate::error::{error_entry, BoxError, MetadataError, ResolveError};
use crate::policy::{Decision, EmbeddingPolicy};
use crate::registry::{DescriptorRegistry, LinkRelationRegistry};
use crate::resource::{Link, Resource};
use crate::response::{
    ErrorEntry, MaterializedResponse, RelationEmbeds, RelationLinks, ResponseMeta,
};

/// Resolves resource graphs into materialized response trees.
///
/// Holds only shared, read-mostly registries; one `Resolver` serves any
/// number of concurrent `resolve` calls.
pub struct Resolver {
    registry: Arc<DescriptorRegistry>,
    relations: Arc<LinkRelationRegistry>,
}

/// Failure of a single node's own computation. Escapes `resolve_node` so the
/// caller can scope it: fatal at the root, an error entry anywhere else.
enum NodeError {
    State(BoxError),
    Metadata(MetadataError),
}

impl From<MetadataError> for NodeError {
    fn from(e: MetadataError) -> Self {
        NodeError::Metadata(e)
    }
}

/// Collected result of resolving one relation of one node.
#[derive(Default)]
struct RelationOutcome {
    links: Vec<Link>,
    embedded: Vec<MaterializedResponse>,
    errors: Vec<ErrorEntry>,
}

impl RelationOutcome {
    fn timed_out(relation: &RelationDescriptor, self_href: Option<&str>) -> Self {
        RelationOutcome {
            errors: vec![ErrorEntry {
                title: format!("{} resolution timed out", relation.name),
                status: 504,
                detail: Some(
                    "relation was still pending when the resolution deadline expired".to_string(),
                ),
                about: self_href.map(str::to_string),
                causes: Vec::new(),
            }],
            ..Default::default()
        }
    }
}

/// Result of resolving one element of a relation under an embed decision.
enum ElementOutcome {
    /// Fully materialized; `link` also goes into the link section when the
    /// target is linkable.
    Embedded {
        node: MaterializedResponse,
        link: Option<Link>,
    },
    /// The target's self link matched an ancestor on the embed path; demoted
    /// to link-only instead of embedding again.
    Cycle(Link),
    /// The element failed; siblings are unaffected.
    Failed(ErrorEntry),
    /// Metadata failure; aborts the whole resolution.
    Fatal(MetadataError),
}

impl Resolver {
    pub fn new(registry: Arc<DescriptorRegistry>, relations: Arc<LinkRelationRegistry>) -> Self {
        Self {
            registry,
            relations,
        }
    }

    /// Resolves the graph rooted at `root` into a materialized tree.
    ///
    /// `deadline`, when given, bounds the whole call: relations still pending
    /// when it expires are recorded as timeout entries and everything that
    /// finished in time is kept.
    ///
    /// # Errors
    /// Fails only for root-level failures and invalid metadata; see the
    /// module docs for the failure scoping rules.
    #[instrument(skip_all, fields(root = root.type_name()))]
    pub async fn resolve(
        &self,
        root: Arc<dyn Resource>,
        policy: &dyn EmbeddingPolicy,
        deadline: Option<Duration>,
    ) -> Result<MaterializedResponse, ResolveError> {
        let started = Instant::now();
        let token = CancellationToken::new();
        let timer = deadline.map(|after| {
            let token = token.clone();
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                debug!("resolution deadline expired, cancelling pending relations");
                token.cancel();
            })
        });

        // The root future is polled first: once the token fires, pending
        // relations collapse into timeout entries and the root completes on
        // its next poll. Only a root stuck in its own eager work (its state
        // accessor, which no relation-level race covers) stays pending and
        // lets the cancellation branch win.
        let outcome = tokio::select! {
            biased;
            outcome = self.resolve_node(root, 0, Vec::new(), policy, &token) => Some(outcome),
            _ = token.cancelled() => {
                warn!("root was still resolving at the deadline, aborting");
                None
            }
        };

        if let Some(timer) = timer {
            timer.abort();
        }

        let mut node = match outcome {
            None => return Err(ResolveError::RootDeadline),
            Some(Ok(node)) => node,
            Some(Err(NodeError::State(e))) => return Err(ResolveError::RootState(e)),
            Some(Err(NodeError::Metadata(e))) => return Err(ResolveError::Metadata(e)),
        };
        if node.self_link.is_none() {
            return Err(ResolveError::RootSelfLink);
        }
        node.meta = Some(ResponseMeta {
            elapsed_ms: started.elapsed().as_millis() as u64,
            resolved_nodes: node.node_count(),
        });
        Ok(node)
    }

    /// Materializes one node: own state and self link eagerly, then all
    /// relations concurrently, assembled in declared order.
    ///
    /// `path` carries the self-link hrefs of the active embed chain for the
    /// cycle guard; it grows by this node's own href before recursing.
    fn resolve_node<'a>(
        &'a self,
        resource: Arc<dyn Resource>,
        depth: usize,
        mut path: Vec<String>,
        policy: &'a dyn EmbeddingPolicy,
        token: &'a CancellationToken,
    ) -> BoxFuture<'a, Result<MaterializedResponse, NodeError>> {
        Box::pin(async move {
            let state = resource.state().await.map_err(NodeError::State)?;
            let self_link = resource.self_link();
            let descriptor = self.registry.describe(resource.type_name())?;

            if let Some(link) = &self_link {
                path.push(link.href.clone());
            }
            let self_href = self_link.as_ref().map(|l| l.href.clone());

            let relation_futures = descriptor.relations.iter().map(|relation| {
                self.resolve_relation(
                    resource.as_ref(),
                    relation,
                    depth,
                    &path,
                    self_href.as_deref(),
                    policy,
                    token,
                )
            });
            let outcomes = join_all(relation_futures).await;

            let mut links = Vec::new();
            let mut embedded = Vec::new();
            let mut errors = Vec::new();
            for (relation, outcome) in descriptor.relations.iter().zip(outcomes) {
                let outcome = outcome?;
                if !outcome.links.is_empty() {
                    links.push(RelationLinks {
                        relation: relation.name.clone(),
                        links: outcome.links,
                    });
                }
                if !outcome.embedded.is_empty() {
                    embedded.push(RelationEmbeds {
                        relation: relation.name.clone(),
                        resources: outcome.embedded,
                    });
                }
                errors.extend(outcome.errors);
            }

            Ok(MaterializedResponse {
                state,
                self_link,
                links,
                embedded,
                errors,
                meta: None,
            })
        })
    }

    /// Resolves one relation, racing the work against cancellation. A
    /// relation overtaken by cancellation yields a timeout entry instead of
    /// being silently dropped.
    #[allow(clippy::too_many_arguments)]
    async fn resolve_relation(
        &self,
        resource: &dyn Resource,
        relation: &RelationDescriptor,
        depth: usize,
        path: &[String],
        self_href: Option<&str>,
        policy: &dyn EmbeddingPolicy,
        token: &CancellationToken,
    ) -> Result<RelationOutcome, MetadataError> {
        tokio::select! {
            _ = token.cancelled() => {
                warn!(relation = %relation.name, "relation cancelled before completion");
                Ok(RelationOutcome::timed_out(relation, self_href))
            }
            outcome = self.relation_work(resource, relation, depth, path, self_href, policy, token) => outcome,
        }
    }

    #[allow(clippy::too_many_arguments)]
    async fn relation_work(
        &self,
        resource: &dyn Resource,
        relation: &RelationDescriptor,
        depth: usize,
        path: &[String],
        self_href: Option<&str>,
        policy: &dyn EmbeddingPolicy,
        token: &CancellationToken,
    ) -> Result<RelationOutcome, MetadataError> {
        let mut outcome = RelationOutcome::default();

        let targets = match resource.related(&relation.name).await {
            Ok(targets) => targets,
            Err(e) => {
                warn!(relation = %relation.name, error = %e, "relation accessor failed");
                outcome.errors.push(error_entry(
                    format!("{} resolution failed", relation.name),
                    500,
                    e.as_ref(),
                    self_href.map(str::to_string),
                ));
                return Ok(outcome);
            }
        };
        debug!(relation = %relation.name, targets = targets.len(), depth, "relation resolved");

        match policy.decide(relation, depth) {
            Decision::Link => {
                for target in &targets {
                    match target.self_link() {
                        Some(link) => outcome.links.push(self.titled(relation, link)),
                        None => outcome.errors.push(ErrorEntry {
                            title: format!("{} resolution failed", relation.name),
                            status: 500,
                            detail: Some("link-only target has no self link".to_string()),
                            about: self_href.map(str::to_string),
                            causes: Vec::new(),
                        }),
                    }
                }
            }
            Decision::Embed => {
                let element_futures = targets.iter().map(|target| {
                    self.resolve_element(Arc::clone(target), relation, depth, path, policy, token)
                });
                for element in join_all(element_futures).await {
                    match element {
                        ElementOutcome::Embedded { node, link } => {
                            if let Some(link) = link {
                                outcome.links.push(self.titled(relation, link));
                            }
                            outcome.embedded.push(node);
                        }
                        ElementOutcome::Cycle(link) => {
                            debug!(relation = %relation.name, href = %link.href, "embed cycle, linking instead");
                            outcome.links.push(self.titled(relation, link));
                        }
                        ElementOutcome::Failed(error) => outcome.errors.push(error),
                        ElementOutcome::Fatal(e) => return Err(e),
                    }
                }
            }
        }

        Ok(outcome)
    }

    /// Resolves one target of an embed-decided relation. The cycle guard
    /// runs first: a target whose href is already on the embed path is
    /// demoted to link-only.
    async fn resolve_element(
        &self,
        target: Arc<dyn Resource>,
        relation: &RelationDescriptor,
        depth: usize,
        path: &[String],
        policy: &dyn EmbeddingPolicy,
        token: &CancellationToken,
    ) -> ElementOutcome {
        let link = target.self_link();
        if let Some(l) = &link {
            if path.iter().any(|href| href == &l.href) {
                return ElementOutcome::Cycle(l.clone());
            }
        }
        let about = link.as_ref().map(|l| l.href.clone());

        match self
            .resolve_node(target, depth + 1, path.to_vec(), policy, token)
            .await
        {
            Ok(node) => ElementOutcome::Embedded { node, link },
            Err(NodeError::Metadata(e)) => ElementOutcome::Fatal(e),
            Err(NodeError::State(e)) => {
                warn!(relation = %relation.name, error = %e, "embedded target failed");
                ElementOutcome::Failed(error_entry(
                    format!("{} resolution failed", relation.target_type),
                    500,
                    e.as_ref(),
                    about,
                ))
            }
        }
    }

    /// Fills in the registered title for a relation's link when the resource
    /// did not supply one. Absence in the registry is not an error.
    fn titled(&self, relation: &RelationDescriptor, mut link: Link) -> Link {
        if link.title.is_none() {
            if let Some(info) = self.relations.lookup(&relation.name) {
                link.title = info.title.clone();
            }
        }
        link
    }
}
