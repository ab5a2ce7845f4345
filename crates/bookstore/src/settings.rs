//! Bookstore configuration
//!
//! Settings are a snapshot produced once at startup. Incomplete settings
//! never raise; they disable the affected features via
//! [`validate_bookstore`], and the server consults the resulting flags
//! before registering optional endpoints.

use serde::{Deserialize, Serialize};

/// Settings used for archival, publishing and cloning.
///
/// S3 credentials may be left unset, in which case the ambient (IAM)
/// credential chain is used.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookstoreSettings {
    /// Prefix for the live workspace notebooks
    pub workspace_prefix: String,

    /// Prefix for published notebooks
    pub published_prefix: String,

    /// S3/AWS access key ID (None = ambient credentials)
    pub s3_access_key_id: Option<String>,

    /// S3/AWS secret access key (None = ambient credentials)
    pub s3_secret_access_key: Option<String>,

    /// S3 endpoint URL
    pub s3_endpoint_url: String,

    /// Region name
    pub s3_region_name: String,

    /// Bucket name to store notebooks
    pub s3_bucket: String,

    /// Maximum number of detached archive writes in flight at once
    pub max_threads: usize,

    /// Whether cloning from S3 buckets is offered
    pub enable_s3_cloning: bool,

    /// Whether cloning from the local filesystem is offered
    pub enable_fs_cloning: bool,

    /// Base directory that filesystem clones may not escape
    pub fs_cloning_basedir: String,
}

impl Default for BookstoreSettings {
    fn default() -> Self {
        Self {
            workspace_prefix: "workspace".to_string(),
            published_prefix: "published".to_string(),
            s3_access_key_id: None,
            s3_secret_access_key: None,
            s3_endpoint_url: "https://s3.amazonaws.com".to_string(),
            s3_region_name: "us-east-1".to_string(),
            s3_bucket: String::new(),
            max_threads: 16,
            enable_s3_cloning: true,
            enable_fs_cloning: false,
            fs_cloning_basedir: String::new(),
        }
    }
}

impl BookstoreSettings {
    /// Load settings from `BOOKSTORE_*` environment variables, falling back
    /// to defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            workspace_prefix: env_or("BOOKSTORE_WORKSPACE_PREFIX", defaults.workspace_prefix),
            published_prefix: env_or("BOOKSTORE_PUBLISHED_PREFIX", defaults.published_prefix),
            s3_access_key_id: std::env::var("BOOKSTORE_S3_ACCESS_KEY_ID").ok(),
            s3_secret_access_key: std::env::var("BOOKSTORE_S3_SECRET_ACCESS_KEY").ok(),
            s3_endpoint_url: env_or("BOOKSTORE_S3_ENDPOINT_URL", defaults.s3_endpoint_url),
            s3_region_name: env_or("BOOKSTORE_S3_REGION_NAME", defaults.s3_region_name),
            s3_bucket: env_or("BOOKSTORE_S3_BUCKET", defaults.s3_bucket),
            max_threads: std::env::var("BOOKSTORE_MAX_THREADS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_threads),
            enable_s3_cloning: env_flag("BOOKSTORE_ENABLE_S3_CLONING", defaults.enable_s3_cloning),
            enable_fs_cloning: env_flag("BOOKSTORE_ENABLE_FS_CLONING", defaults.enable_fs_cloning),
            fs_cloning_basedir: env_or("BOOKSTORE_FS_CLONING_BASEDIR", defaults.fs_cloning_basedir),
        }
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key).unwrap_or(default)
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v.to_lowercase() == "true" || v == "1")
        .unwrap_or(default)
}

/// Feature availability derived from a settings snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookstoreFeatures {
    pub archive_valid: bool,
    pub publish_valid: bool,
    pub s3_clone_valid: bool,
    pub fs_clone_valid: bool,
}

/// Determine which bookstore features the given settings can support.
///
/// Archival and publishing need a bucket, an endpoint and their prefixes;
/// S3 cloning additionally needs its enable flag; filesystem cloning only
/// needs its enable flag and a base directory.
pub fn validate_bookstore(settings: &BookstoreSettings) -> BookstoreFeatures {
    let s3_valid = !settings.s3_bucket.is_empty()
        && !settings.s3_endpoint_url.is_empty()
        && !settings.workspace_prefix.is_empty()
        && !settings.published_prefix.is_empty();

    BookstoreFeatures {
        archive_valid: s3_valid,
        publish_valid: s3_valid,
        s3_clone_valid: s3_valid && settings.enable_s3_cloning,
        fs_clone_valid: settings.enable_fs_cloning && !settings.fs_cloning_basedir.is_empty(),
    }
}
