//! Notebook publishing route

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bookstore::{BookstoreError, PublishModel};
use serde_json::Value;
use tracing::info;

use crate::{error::Result, AppState};

/// PUT /api/bookstore/publish/{path}
///
/// Publish a notebook on a given path. The payload directly matches the
/// contents API PUT body. Responds 201 with the published display path and,
/// when the bucket is versioned, the new version token.
pub async fn publish(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse> {
    info!("About to publish {}", path);

    if body.is_null() || body.as_object().is_some_and(|o| o.is_empty()) {
        return Err(BookstoreError::invalid_request("Cannot publish empty model").into());
    }
    let model: PublishModel =
        serde_json::from_value(body).map_err(BookstoreError::Serialization)?;

    let receipt = state.publisher.publish(&path, &model).await?;

    Ok((StatusCode::CREATED, Json(receipt)))
}
