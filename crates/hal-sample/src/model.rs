//! Pure state structs for the catalog domain. These are what ends up as the
//! primary properties of the rendered documents.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogState {
    pub title: String,
    pub page: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemState {
    pub sku: String,
    pub name: String,
    pub price: f64,
}
