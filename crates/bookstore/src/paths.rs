//! S3 path utilities and relative path validation
//!
//! Keys and display paths are always joined with `/` regardless of platform.
//! Empty segments are elided and leading slashes are stripped from each
//! segment, so `s3_key("", "a/b.ipynb")` is `a/b.ipynb` with no leading or
//! doubled slash.

use std::path::{Component, Path, PathBuf};

use crate::error::{BookstoreError, Result};

/// The S3 path delimiter, fixed as `/` in all uses.
const DELIMITER: &str = "/";

/// Join segments, dropping empty ones and stripping left-leading `/`.
fn join(segments: &[&str]) -> String {
    segments
        .iter()
        .map(|s| s.trim_start_matches(DELIMITER))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

/// Compute the full s3 path (bucket-qualified key).
pub fn s3_path(bucket: &str, prefix: &str, path: &str) -> String {
    join(&[bucket, prefix, path])
}

/// Compute the s3 object key under a workspace or published prefix.
pub fn s3_key(prefix: &str, path: &str) -> String {
    join(&[prefix, path])
}

/// Human-readable rendering of a storage location, for logs and responses
/// only; never used for addressing.
pub fn s3_display_path(bucket: &str, prefix: &str, path: &str) -> String {
    format!("s3://{}", s3_path(bucket, prefix, path))
}

/// Validate a user-supplied relative path against a base directory.
///
/// Resolves `relpath` lexically against `base` and rejects empty input and
/// any path that escapes `base`. Escapes are reported as not-found rather
/// than permission errors so directory structure is not leaked.
pub fn validate_relpath(relpath: &str, base: &Path) -> Result<PathBuf> {
    if relpath.is_empty() {
        return Err(BookstoreError::invalid_request(
            "Must have a relpath to clone from",
        ));
    }

    let mut resolved = base.to_path_buf();
    let mut depth: usize = 0;
    for component in Path::new(relpath).components() {
        match component {
            Component::Normal(part) => {
                resolved.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return Err(BookstoreError::not_found(format!(
                        "Cannot clone from path {} outside root cloning directory",
                        relpath
                    )));
                }
                resolved.pop();
                depth -= 1;
            }
            // Absolute components would re-root the path outside the base
            Component::RootDir | Component::Prefix(_) => {
                return Err(BookstoreError::not_found(format!(
                    "Cannot clone from path {} outside root cloning directory",
                    relpath
                )));
            }
        }
    }

    if depth == 0 {
        return Err(BookstoreError::invalid_request(
            "Must have a relpath to clone from",
        ));
    }

    Ok(resolved)
}
