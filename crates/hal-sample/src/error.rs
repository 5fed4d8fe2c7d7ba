//! Domain errors for the catalog sample.

/// Errors raised by the catalog resource accessors. They cross into the
/// engine as boxed errors and come back out as error entries on the
/// affected relation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("item `{0}` is unavailable")]
    ItemUnavailable(String),
    #[error("unknown relation `{0}`")]
    UnknownRelation(String),
}
