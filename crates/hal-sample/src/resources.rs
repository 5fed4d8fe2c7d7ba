//! # Catalog Resources
//!
//! [`Resource`] implementations for the catalog graph. A catalog page
//! exposes its items (embed-preferred) and an optional link to the next page
//! (link-only by preference, parameterized by the `page` template variable).
//!
//! [`ItemResource::unavailable`] builds an item whose state accessor fails,
//! which is how the sample exercises partial responses: the catalog still
//! renders, the broken item surfaces as an error entry.

use std::sync::Arc;

use async_trait::async_trait;
use hal_engine::{BoxError, Link, Resource};
use serde_json::Value;

use crate::error::CatalogError;
use crate::model::{CatalogState, ItemState};

pub const CATALOG_TYPE: &str = "catalog";
pub const ITEM_TYPE: &str = "item";
pub const ITEMS_REL: &str = "items";
pub const NEXT_PAGE_REL: &str = "next_page";

fn catalog_href(page: u32) -> String {
    format!("/catalog?page={page}")
}

/// One catalog item. Self-linked under `/items/{sku}`.
pub struct ItemResource {
    sku: String,
    state: Option<ItemState>,
}

impl ItemResource {
    pub fn new(state: ItemState) -> Self {
        Self {
            sku: state.sku.clone(),
            state: Some(state),
        }
    }

    /// An item whose state accessor fails, for partial-response scenarios.
    pub fn unavailable(sku: &str) -> Self {
        Self {
            sku: sku.to_string(),
            state: None,
        }
    }
}

#[async_trait]
impl Resource for ItemResource {
    fn type_name(&self) -> &str {
        ITEM_TYPE
    }

    async fn state(&self) -> Result<Option<Value>, BoxError> {
        match &self.state {
            Some(state) => Ok(Some(serde_json::to_value(state)?)),
            None => Err(CatalogError::ItemUnavailable(self.sku.clone()).into()),
        }
    }

    fn self_link(&self) -> Option<Link> {
        Some(Link::new(format!("/items/{}", self.sku)))
    }

    async fn related(&self, relation: &str) -> Result<Vec<Arc<dyn Resource>>, BoxError> {
        Err(CatalogError::UnknownRelation(relation.to_string()).into())
    }
}

/// One page of the catalog.
pub struct CatalogResource {
    state: CatalogState,
    items: Vec<Arc<ItemResource>>,
    has_next_page: bool,
}

impl CatalogResource {
    pub fn new(state: CatalogState, items: Vec<Arc<ItemResource>>, has_next_page: bool) -> Self {
        Self {
            state,
            items,
            has_next_page,
        }
    }

    /// A link target for a page that has not been loaded; only its self link
    /// is ever consulted while the relation stays link-only.
    fn page_stub(page: u32) -> Self {
        Self {
            state: CatalogState {
                title: String::new(),
                page,
            },
            items: Vec::new(),
            has_next_page: false,
        }
    }
}

#[async_trait]
impl Resource for CatalogResource {
    fn type_name(&self) -> &str {
        CATALOG_TYPE
    }

    async fn state(&self) -> Result<Option<Value>, BoxError> {
        Ok(Some(serde_json::to_value(&self.state)?))
    }

    fn self_link(&self) -> Option<Link> {
        Some(Link::new(catalog_href(self.state.page)))
    }

    async fn related(&self, relation: &str) -> Result<Vec<Arc<dyn Resource>>, BoxError> {
        match relation {
            ITEMS_REL => Ok(self
                .items
                .iter()
                .map(|item| Arc::clone(item) as Arc<dyn Resource>)
                .collect()),
            NEXT_PAGE_REL => {
                if self.has_next_page {
                    Ok(vec![Arc::new(Self::page_stub(self.state.page + 1))])
                } else {
                    Ok(Vec::new())
                }
            }
            other => Err(CatalogError::UnknownRelation(other.to_string()).into()),
        }
    }
}
