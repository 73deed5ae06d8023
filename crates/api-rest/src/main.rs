//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the Medex REST API: validate incoming encounter payloads, transform
//! them into FHIR bundles, and persist each bundle to the file-backed store.
//!
//! ## Environment Variables
//! - `MEDEX_REST_ADDR`: server address (default: "0.0.0.0:3000")
//! - `MEDEX_DATA_DIR`: data directory holding the bundle store (default:
//!   "/medex_data"; must exist at startup)

use std::path::PathBuf;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::{router, AppState};
use medex_core::{BundleStore, CoreConfig, FileStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?)
                .add_directive("medex_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDEX_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    tracing::info!("-- Starting Medex REST API on {}", addr);

    let data_dir = std::env::var("MEDEX_DATA_DIR").unwrap_or_else(|_| "/medex_data".into());
    let cfg = CoreConfig::new(PathBuf::from(data_dir))?;

    let store: Arc<dyn BundleStore> = Arc::new(FileStore::new(cfg.bundle_dir()));
    let app = router(AppState::new(store));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
