//! Version and feature introspection

use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::AppState;

/// GET /api/bookstore
///
/// Returns version info and feature availability so frontends can do
/// feature detection against serverside settings.
pub async fn bookstore_version(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "release": env!("CARGO_PKG_VERSION"),
        "features": state.features,
    }))
}
