use async_trait::async_trait;
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;

use super::error::StorageError;
use super::traits::{ObjectStore, PutOptions, join_url, validate_key};
use crate::config::S3Config;

/// Object store backed by an S3-compatible bucket.
///
/// The client is built without `fail-on-err`, so every response status is
/// checked here rather than surfacing as an `S3Error`.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_base_url: String,
}

impl S3ObjectStore {
    pub fn new(
        config: &S3Config,
        public_base_url: impl Into<String>,
    ) -> Result<Self, StorageError> {
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        };
        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.secret_access_key),
            None,
            None,
            None,
        )
        .map_err(|e| StorageError::Config(e.to_string()))?;

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| StorageError::Config(e.to_string()))?;
        if config.path_style {
            bucket = bucket.with_path_style();
        }

        Ok(Self {
            bucket,
            public_base_url: public_base_url.into(),
        })
    }
}

fn check_status(op: &str, key: &str, status: u16) -> Result<(), StorageError> {
    if (200..300).contains(&status) {
        Ok(())
    } else if status == 404 {
        Err(StorageError::NotFound(key.to_string()))
    } else {
        Err(StorageError::Backend(format!(
            "{op} {key} returned HTTP {status}"
        )))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[tracing::instrument(skip(self, data, options), fields(size = data.len()))]
    async fn put(
        &self,
        key: &str,
        data: Vec<u8>,
        options: &PutOptions,
    ) -> Result<(), StorageError> {
        validate_key(key)?;

        let response = match &options.cache_control {
            Some(cache_control) => {
                let mut bucket = self.bucket.clone();
                bucket.add_header("Cache-Control", cache_control);
                bucket
                    .put_object_with_content_type(key, &data, &options.content_type)
                    .await?
            }
            None => {
                self.bucket
                    .put_object_with_content_type(key, &data, &options.content_type)
                    .await?
            }
        };
        check_status("PUT", key, response.status_code())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StorageError> {
        validate_key(key)?;
        let response = self.bucket.get_object(key).await?;
        check_status("GET", key, response.status_code())?;
        Ok(response.bytes().to_vec())
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        let (_, status) = self.bucket.head_object(key).await?;
        match check_status("HEAD", key, status) {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        validate_key(key)?;
        let response = self.bucket.delete_object(key).await?;
        match check_status("DELETE", key, response.status_code()) {
            Ok(()) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}
