//! Clone routes: API endpoints plus the HTML landing pages

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    Json,
};
use bookstore::{BookstoreError, CloneRequest, FsCloneRequest, FsCloner, S3Cloner};
use serde::Deserialize;
use tracing::info;

use crate::{error::Result, AppState};

/// POST /api/bookstore/clone
///
/// Clone an object out of S3 into the local workspace. The response matches
/// the contents API POST response, plus the source display path and version
/// token when available.
pub async fn clone_from_s3(
    State(state): State<AppState>,
    Json(request): Json<CloneRequest>,
) -> Result<impl IntoResponse> {
    let response = S3Cloner::clone(&state.s3_cloner, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/bookstore/fs-clone
///
/// Clone a file from the configured base directory into the workspace.
pub async fn clone_from_fs(
    State(state): State<AppState>,
    Json(request): Json<FsCloneRequest>,
) -> Result<impl IntoResponse> {
    let response = FsCloner::clone(&state.fs_cloner, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

#[derive(Debug, Deserialize)]
pub struct ClonePageQuery {
    #[serde(default)]
    s3_bucket: String,
    #[serde(default)]
    s3_key: String,
}

/// GET /bookstore/clone?s3_bucket=&s3_key=
///
/// Renders a confirmation page for cloning a notebook from a specific
/// bucket via the cloning API.
pub async fn clone_landing(Query(query): Query<ClonePageQuery>) -> Result<Html<String>> {
    if query.s3_bucket.is_empty() || query.s3_bucket == "/" {
        return Err(BookstoreError::invalid_request(
            "Requires an S3 bucket in order to clone",
        )
        .into());
    }
    if query.s3_key.is_empty() || query.s3_key == "/" {
        return Err(BookstoreError::invalid_request(
            "Requires an S3 object key in order to clone",
        )
        .into());
    }

    info!("Setting up cloning landing page from {}", query.s3_key);
    Ok(Html(clone_page(
        "/api/bookstore/clone",
        &[("s3_bucket", &query.s3_bucket), ("s3_key", &query.s3_key)],
    )))
}

#[derive(Debug, Deserialize)]
pub struct FsClonePageQuery {
    #[serde(default)]
    relpath: String,
}

/// GET /bookstore/fs-clone?relpath=
pub async fn fs_clone_landing(Query(query): Query<FsClonePageQuery>) -> Result<Html<String>> {
    if query.relpath.is_empty() {
        return Err(
            BookstoreError::invalid_request("Requires a relpath in order to clone").into(),
        );
    }

    info!("Setting up cloning landing page from {}", query.relpath);
    Ok(Html(clone_page(
        "/api/bookstore/fs-clone",
        &[("relpath", &query.relpath)],
    )))
}

fn escape_html(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Minimal options page that posts the clone parameters to the API.
fn clone_page(api_url: &str, params: &[(&str, &str)]) -> String {
    let source = params
        .iter()
        .map(|(name, value)| format!("<dt>{}</dt><dd>{}</dd>", name, escape_html(value)))
        .collect::<String>();
    let payload = params
        .iter()
        .map(|(name, value)| {
            format!(
                "{}: {}",
                serde_json::Value::from(*name),
                serde_json::Value::from(*value)
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
        // The payload sits inside a single-quoted HTML attribute
        .replace('\'', "\\u0027");

    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>Clone notebook</title></head>\n<body>\n\
         <h1>Clone to your workspace?</h1>\n<dl>{}</dl>\n\
         <button onclick='fetch(\"{}\", {{method: \"POST\", \
         headers: {{\"Content-Type\": \"application/json\"}}, \
         body: JSON.stringify({{{}}})}}).then(() => window.location = \"/\")'>Clone</button>\n\
         </body>\n</html>\n",
        source, api_url, payload
    )
}
