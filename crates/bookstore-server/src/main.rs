//! Bookstore HTTP API Server
//!
//! Exposes notebook publishing, cloning and feature introspection over
//! HTTP, and mirrors notebook saves to object storage in the background.

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use bookstore::{
    validate_bookstore, Archiver, ArchivingContents, BookstoreFeatures, BookstoreSettings,
    ContentsManager, FileContentsManager, FsCloner, Publisher, S3Cloner, S3ObjectStore,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

mod config;
mod error;
mod routes;

use config::ServerConfig;
use error::{ApiError, Result};

/// Main application state
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    pub features: BookstoreFeatures,
    pub publisher: Arc<Publisher>,
    pub s3_cloner: Arc<S3Cloner>,
    pub fs_cloner: Arc<FsCloner>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "bookstore_server=debug,bookstore=debug,tower_http=debug".to_string()),
        )
        .init();

    let config = ServerConfig::from_env()?;
    let settings = BookstoreSettings::from_env();
    let features = validate_bookstore(&settings);

    let store = Arc::new(
        S3ObjectStore::from_settings(&settings)
            .map_err(|e| ApiError::Config(e.to_string()))?,
    );

    let archiver = Arc::new(Archiver::new(settings.clone(), store.clone()));
    let local_contents = Arc::new(FileContentsManager::new(&config.notebook_dir));
    // Clone targets are saved through the archiving wrapper, so cloned
    // notebooks get mirrored to the workspace prefix like any other save
    let contents: Arc<dyn ContentsManager> =
        Arc::new(ArchivingContents::new(local_contents, archiver));

    let state = AppState {
        config: config.clone(),
        features,
        publisher: Arc::new(Publisher::new(settings.clone(), store.clone())),
        s3_cloner: Arc::new(S3Cloner::new(store, contents.clone())),
        fs_cloner: Arc::new(FsCloner::new(&settings, contents)),
    };

    let app = create_router(state);

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Bookstore server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router, registering optional endpoints only when
/// their feature validates against the settings.
fn create_router(state: AppState) -> Router {
    let features = state.features;
    let body_limit = state.config.max_body_mb * 1024 * 1024;
    let release = env!("CARGO_PKG_VERSION");

    let mut api = Router::new();
    let mut pages = Router::new();

    if features.publish_valid {
        info!("Enabling bookstore publishing, version: {}", release);
        api = api.route("/publish/{*path}", put(routes::publish::publish));
    } else {
        info!("Publishing disabled. s3_bucket or endpoint are not configured.");
    }

    if features.s3_clone_valid {
        info!("Enabling bookstore cloning, version: {}", release);
        api = api.route("/clone", post(routes::clone::clone_from_s3));
        pages = pages.route("/clone", get(routes::clone::clone_landing));
    } else {
        info!("Bookstore cloning disabled, version: {}", release);
    }

    if features.fs_clone_valid {
        info!("Enabling bookstore filesystem cloning, version: {}", release);
        api = api.route("/fs-clone", post(routes::clone::clone_from_fs));
        pages = pages.route("/fs-clone", get(routes::clone::fs_clone_landing));
    } else {
        info!("Bookstore filesystem cloning disabled, version: {}", release);
    }

    Router::new()
        // The version handler is always enabled for the API
        .route("/api/bookstore", get(routes::version::bookstore_version))
        .nest("/api/bookstore", api)
        .nest("/bookstore", pages)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                // Notebooks with embedded outputs can be large
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}
