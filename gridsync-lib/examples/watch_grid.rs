//! Grid view-model example.
//!
//! Run with: cargo run --example watch_grid
//!
//! Requires .env file with:
//! - GRIDSYNC_URL
//! - GRIDSYNC_RESOURCE (optional, defaults to "users")

use std::env;
use std::sync::Arc;

use gridsync_lib::GridClient;
use gridsync_lib::GridConfig;
use gridsync_lib::GridController;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();

    let url = env::var("GRIDSYNC_URL").expect("GRIDSYNC_URL not set");
    let resource = env::var("GRIDSYNC_RESOURCE").unwrap_or_else(|_| "users".to_string());

    let client = GridClient::builder().url(url).resource(resource).build()?;
    let grid = GridController::new(Arc::new(client), GridConfig::default().with_page_size(5));

    let mut views = grid.subscribe();
    let printer = tokio::spawn(async move {
        while views.changed().await.is_ok() {
            let view = views.borrow_and_update().clone();
            println!(
                "page {}/{} loading={} rows={}",
                view.pagination.current_page,
                view.pagination.total_pages,
                view.is_loading,
                view.rows.len()
            );
        }
    });

    grid.refetch().await?;
    if grid.view().pagination.has_next() {
        grid.set_page(2).await?;
    }

    grid.unmount();
    drop(grid);
    printer.await?;

    Ok(())
}
