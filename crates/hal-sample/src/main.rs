//! # Catalog Demo
//!
//! Resolves a small catalog graph (including one intentionally unavailable
//! item) and prints the rendered hypermedia document. Demonstrates:
//! 1. Building the [`CatalogService`] (registers all metadata).
//! 2. Resolving with concurrent relation fan-out and a deadline.
//! 3. A partial response: the broken item degrades to an error entry while
//!    its siblings render in full.

use std::sync::Arc;
use std::time::Duration;

use hal_engine::tracing::setup_tracing;
use hal_sample::model::{CatalogState, ItemState};
use hal_sample::resources::{CatalogResource, ItemResource};
use hal_sample::service::CatalogService;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Setup tracing once for the entire application
    setup_tracing();

    info!("starting catalog demo");
    let service = CatalogService::new()?;

    let catalog = Arc::new(CatalogResource::new(
        CatalogState {
            title: "Spring catalog".to_string(),
            page: 1,
        },
        vec![
            Arc::new(ItemResource::new(ItemState {
                sku: "A-1".to_string(),
                name: "Trowel".to_string(),
                price: 12.5,
            })),
            Arc::new(ItemResource::unavailable("A-2")),
            Arc::new(ItemResource::new(ItemState {
                sku: "A-3".to_string(),
                name: "Watering can".to_string(),
                price: 19.0,
            })),
        ],
        true,
    ));

    let document = service
        .render_catalog(catalog, Some(Duration::from_secs(2)))
        .await?;

    if !document.errors.is_empty() {
        info!(
            errors = document.errors.len(),
            "response is partial, some branches could not be resolved"
        );
    }

    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}
