use std::path::PathBuf;

use serde::Deserialize;

/// Which object storage backend serves uploaded media.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackendKind {
    #[default]
    Filesystem,
    S3,
}

/// Credentials and location of an S3-compatible bucket (R2, MinIO, AWS).
#[derive(Debug, Deserialize, Clone)]
pub struct S3Config {
    /// Service endpoint, e.g. `https://<account>.r2.cloudflarestorage.com`.
    pub endpoint: String,
    /// Default: "auto".
    #[serde(default = "default_s3_region")]
    pub region: String,
    /// Default: "pz-news-images".
    #[serde(default = "default_s3_bucket")]
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Address the bucket as `{endpoint}/{bucket}` instead of a subdomain. Default: true.
    #[serde(default = "default_path_style")]
    pub path_style: bool,
}

/// App-level object storage configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackendKind,
    /// Required when `backend = "s3"`.
    #[serde(default)]
    pub s3: Option<S3Config>,
    /// Root directory for the filesystem backend. Default: "./data/uploads".
    #[serde(default = "default_filesystem_root")]
    pub filesystem_root: PathBuf,
    /// Base URL prepended to object keys in public links. Default: "/media".
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

fn default_s3_region() -> String {
    "auto".into()
}
fn default_s3_bucket() -> String {
    "pz-news-images".into()
}
fn default_path_style() -> bool {
    true
}
fn default_filesystem_root() -> PathBuf {
    PathBuf::from("./data/uploads")
}
fn default_public_url() -> String {
    "/media".into()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            s3: None,
            filesystem_root: default_filesystem_root(),
            public_url: default_public_url(),
        }
    }
}
