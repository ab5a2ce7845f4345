//! Structural validation of notebook documents
//!
//! Existence checks only: a notebook is a JSON object with a `cells` array,
//! a `metadata` object, and an integer `nbformat`. Cell-level format rules
//! are out of scope.

use serde_json::Value;

use crate::error::{BookstoreError, Result};

/// File extensions treated as notebooks when cloning.
pub const NOTEBOOK_EXTENSIONS: &[&str] = &["ipynb"];

/// Whether a path names a notebook, judged by extension.
pub fn is_notebook_path(path: &str) -> bool {
    std::path::Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| NOTEBOOK_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

/// Validate the structure of a notebook document.
pub fn validate_notebook(content: &Value) -> Result<()> {
    let object = content.as_object().ok_or_else(|| {
        BookstoreError::invalid_request("Notebook content must be a JSON object")
    })?;

    match object.get("cells") {
        Some(cells) if cells.is_array() => {}
        Some(_) => {
            return Err(BookstoreError::invalid_request(
                "Notebook 'cells' must be an array",
            ));
        }
        None => {
            return Err(BookstoreError::invalid_request(
                "Notebook is missing required 'cells' field",
            ));
        }
    }

    match object.get("metadata") {
        Some(metadata) if metadata.is_object() => {}
        Some(_) => {
            return Err(BookstoreError::invalid_request(
                "Notebook 'metadata' must be an object",
            ));
        }
        None => {
            return Err(BookstoreError::invalid_request(
                "Notebook is missing required 'metadata' field",
            ));
        }
    }

    match object.get("nbformat") {
        Some(nbformat) if nbformat.is_u64() => Ok(()),
        Some(_) => Err(BookstoreError::invalid_request(
            "Notebook 'nbformat' must be an integer",
        )),
        None => Err(BookstoreError::invalid_request(
            "Notebook is missing required 'nbformat' field",
        )),
    }
}
