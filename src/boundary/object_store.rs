//! Object-store collaborator contract.

use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use tokio::io::AsyncRead;

use crate::error::ReefResult;

/// An object body in transit.
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Metadata returned by `stat` and `list`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub bucket: String,
    pub key: String,
    pub size: u64,
    pub content_type: Option<String>,
    /// RFC 3339 timestamp of the last write.
    pub last_modified: Option<String>,
    pub etag: Option<String>,
}

/// An S3-compatible object store.
///
/// Callers back user-facing file-and-folder semantics with this trait;
/// the path of a file is derived with [`object_path`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Streams an object into `bucket` under `key`. `size` is the total
    /// byte count, required up front by S3-style backends.
    async fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: ByteStream,
        size: u64,
        content_type: &str,
    ) -> ReefResult<()>;

    /// Opens an object for streaming reads.
    async fn download(&self, bucket: &str, key: &str) -> ReefResult<ByteStream>;

    /// Deletes an object. Idempotent.
    async fn remove(&self, bucket: &str, key: &str) -> ReefResult<()>;

    /// Lists objects under `prefix`; `recursive` descends past the next
    /// `/` boundary.
    async fn list(
        &self,
        bucket: &str,
        prefix: &str,
        recursive: bool,
    ) -> ReefResult<BoxStream<'static, ReefResult<ObjectMeta>>>;

    /// Fetches object metadata; `None` when the object does not exist.
    async fn stat(&self, bucket: &str, key: &str) -> ReefResult<Option<ObjectMeta>>;

    /// Presigns a download URL valid for `ttl`.
    async fn presign_get(&self, bucket: &str, key: &str, ttl: Duration) -> ReefResult<String>;

    /// Presigns an upload URL valid for `ttl`.
    async fn presign_put(&self, bucket: &str, key: &str, ttl: Duration) -> ReefResult<String>;
}

/// Joins ancestor folder names and a file name into an object key:
/// folders joined by `/`, then the file name. Empty folder segments are
/// skipped.
pub fn object_path(folders: &[&str], file: &str) -> String {
    let mut segments: Vec<&str> = folders.iter().copied().filter(|s| !s.is_empty()).collect();
    segments.push(file);
    segments.join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::*;

    #[test]
    fn test_object_path_joins_ancestors() {
        assert_eq!(object_path(&["docs", "2025"], "report.pdf"), "docs/2025/report.pdf");
        assert_eq!(object_path(&[], "top.txt"), "top.txt");
        assert_eq!(object_path(&["", "a"], "f"), "a/f");
    }

    #[tokio::test]
    async fn test_stat_seam() {
        let mut store = MockObjectStore::new();
        store
            .expect_stat()
            .with(eq("media"), eq("docs/2025/report.pdf"))
            .returning(|bucket, key| {
                Ok(Some(ObjectMeta {
                    bucket: bucket.to_string(),
                    key: key.to_string(),
                    size: 1024,
                    content_type: Some("application/pdf".to_string()),
                    last_modified: None,
                    etag: None,
                }))
            });
        store
            .expect_stat()
            .returning(|_, _| Ok(None));

        let key = object_path(&["docs", "2025"], "report.pdf");
        let meta = store.stat("media", &key).await.unwrap().unwrap();
        assert_eq!(meta.size, 1024);

        assert!(store.stat("media", "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_presign_seam() {
        let mut store = MockObjectStore::new();
        store
            .expect_presign_get()
            .with(eq("media"), eq("k"), eq(Duration::from_secs(600)))
            .returning(|bucket, key, ttl| {
                Ok(format!(
                    "https://store.example/{bucket}/{key}?expires={}",
                    ttl.as_secs()
                ))
            });

        let url = store
            .presign_get("media", "k", Duration::from_secs(600))
            .await
            .unwrap();
        assert!(url.contains("expires=600"));
    }
}
