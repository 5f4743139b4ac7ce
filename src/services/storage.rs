use anyhow::Result;
use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncSeekExt, AsyncWriteExt};

pub struct UploadResult {
    pub hash: String,
    pub size: i64,
    pub key: String,
}

pub struct ObjectStream {
    pub reader: Box<dyn AsyncRead + Send + Unpin>,
    pub content_length: i64,
}

pub struct ObjectMetadata {
    pub size: i64,
}

/// Blob store abstraction. Keys are opaque single-segment names; the
/// lifecycle service owns key generation.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Store a stream under `key`, calculating its SHA-256 hash and size on
    /// the fly without buffering the whole payload.
    async fn upload_stream_with_hash<'a>(
        &self,
        key: &str,
        reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<UploadResult>;
    async fn delete_file(&self, key: &str) -> Result<()>;
    async fn file_exists(&self, key: &str) -> Result<bool>;
    async fn get_object_stream(&self, key: &str) -> Result<ObjectStream>;
    /// Inclusive byte range read.
    async fn get_object_range(&self, key: &str, start: u64, end: u64) -> Result<ObjectStream>;
    async fn get_object_metadata(&self, key: &str) -> Result<ObjectMetadata>;
}

// ── S3 / MinIO backend ────────────────────────────────────────────────

pub struct S3StorageService {
    client: Client,
    bucket: String,
}

impl S3StorageService {
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }
}

#[async_trait]
impl StorageService for S3StorageService {
    async fn upload_stream_with_hash<'a>(
        &self,
        key: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<UploadResult> {
        let multipart_upload_res = self
            .client
            .create_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        let upload_id = multipart_upload_res
            .upload_id()
            .ok_or_else(|| anyhow::anyhow!("No upload ID"))?;
        let mut chunk_index = 1;
        let mut completed_parts = Vec::new();
        let mut hasher = Sha256::new();
        let mut total_size = 0;

        let chunk_size = 10 * 1024 * 1024;
        let mut buffer = vec![0u8; chunk_size];

        loop {
            let mut n = 0;
            while n < chunk_size {
                let read = reader.read(&mut buffer[n..]).await?;
                if read == 0 {
                    break;
                }
                hasher.update(&buffer[n..n + read]);
                n += read;
            }

            if n == 0 {
                break;
            }

            total_size += n as i64;
            let body = ByteStream::from(buffer[..n].to_vec());
            let upload_part_res = self
                .client
                .upload_part()
                .bucket(&self.bucket)
                .key(key)
                .upload_id(upload_id)
                .body(body)
                .part_number(chunk_index)
                .send()
                .await?;

            completed_parts.push(
                CompletedPart::builder()
                    .e_tag(upload_part_res.e_tag().unwrap_or_default())
                    .part_number(chunk_index)
                    .build(),
            );

            chunk_index += 1;
        }

        let completed_multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        self.client
            .complete_multipart_upload()
            .bucket(&self.bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(completed_multipart_upload)
            .send()
            .await?;

        let hash = hex::encode(hasher.finalize());

        Ok(UploadResult {
            hash,
            size: total_size,
            key: key.to_string(),
        })
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(())
    }

    async fn file_exists(&self, key: &str) -> Result<bool> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await;

        match res {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_error = e.into_service_error();
                if service_error.is_not_found() {
                    Ok(false)
                } else {
                    Err(anyhow::anyhow!(service_error))
                }
            }
        }
    }

    async fn get_object_stream(&self, key: &str) -> Result<ObjectStream> {
        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;
        Ok(ObjectStream {
            content_length: res.content_length.unwrap_or(0),
            reader: Box::new(res.body.into_async_read()),
        })
    }

    async fn get_object_range(&self, key: &str, start: u64, end: u64) -> Result<ObjectStream> {
        let res = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .range(format!("bytes={}-{}", start, end))
            .send()
            .await?;
        Ok(ObjectStream {
            content_length: res.content_length.unwrap_or(0),
            reader: Box::new(res.body.into_async_read()),
        })
    }

    async fn get_object_metadata(&self, key: &str) -> Result<ObjectMetadata> {
        let res = self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await?;

        Ok(ObjectMetadata {
            size: res.content_length.unwrap_or(0),
        })
    }
}

// ── Local filesystem backend ──────────────────────────────────────────

pub struct LocalStorageService {
    root: PathBuf,
}

impl LocalStorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Keys are generated by the lifecycle service and never contain path
    /// separators; reject anything else outright.
    fn resolve(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.contains("..") {
            anyhow::bail!("invalid storage key: {}", key);
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl StorageService for LocalStorageService {
    async fn upload_stream_with_hash<'a>(
        &self,
        key: &str,
        mut reader: Box<dyn AsyncRead + Unpin + Send + 'a>,
    ) -> Result<UploadResult> {
        let path = self.resolve(key)?;
        tokio::fs::create_dir_all(&self.root).await?;

        let mut file = tokio::fs::File::create(&path).await?;
        let mut hasher = Sha256::new();
        let mut total_size: i64 = 0;
        let mut buffer = [0u8; 64 * 1024];

        loop {
            let n = reader.read(&mut buffer).await?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
            file.write_all(&buffer[..n]).await?;
            total_size += n as i64;
        }
        file.flush().await?;

        Ok(UploadResult {
            hash: hex::encode(hasher.finalize()),
            size: total_size,
            key: key.to_string(),
        })
    }

    async fn delete_file(&self, key: &str) -> Result<()> {
        let path = self.resolve(key)?;
        tokio::fs::remove_file(&path).await?;
        Ok(())
    }

    async fn file_exists(&self, key: &str) -> Result<bool> {
        let path = self.resolve(key)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    async fn get_object_stream(&self, key: &str) -> Result<ObjectStream> {
        let path = self.resolve(key)?;
        let file = tokio::fs::File::open(&path).await?;
        let size = file.metadata().await?.len() as i64;
        Ok(ObjectStream {
            content_length: size,
            reader: Box::new(file),
        })
    }

    async fn get_object_range(&self, key: &str, start: u64, end: u64) -> Result<ObjectStream> {
        let path = self.resolve(key)?;
        let mut file = tokio::fs::File::open(&path).await?;
        file.seek(std::io::SeekFrom::Start(start)).await?;
        let len = end - start + 1;
        Ok(ObjectStream {
            content_length: len as i64,
            reader: Box::new(file.take(len)),
        })
    }

    async fn get_object_metadata(&self, key: &str) -> Result<ObjectMetadata> {
        let path = self.resolve(key)?;
        let meta = tokio::fs::metadata(&path).await?;
        Ok(ObjectMetadata {
            size: meta.len() as i64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local() -> (tempfile::TempDir, LocalStorageService) {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorageService::new(dir.path());
        (dir, storage)
    }

    #[tokio::test]
    async fn test_local_upload_and_read_back() {
        let (_dir, storage) = local();
        let data = b"hello world".to_vec();

        let result = storage
            .upload_stream_with_hash("k1", Box::new(std::io::Cursor::new(data.clone())))
            .await
            .unwrap();
        assert_eq!(result.size, 11);
        // SHA-256 for "hello world"
        assert_eq!(
            result.hash,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );

        let mut stream = storage.get_object_stream("k1").await.unwrap();
        let mut read_back = Vec::new();
        stream.reader.read_to_end(&mut read_back).await.unwrap();
        assert_eq!(read_back, data);
        assert_eq!(stream.content_length, 11);
    }

    #[tokio::test]
    async fn test_local_range_read() {
        let (_dir, storage) = local();
        storage
            .upload_stream_with_hash("k2", Box::new(std::io::Cursor::new(b"0123456789".to_vec())))
            .await
            .unwrap();

        let mut stream = storage.get_object_range("k2", 2, 5).await.unwrap();
        let mut read_back = Vec::new();
        stream.reader.read_to_end(&mut read_back).await.unwrap();
        assert_eq!(read_back, b"2345");
        assert_eq!(stream.content_length, 4);
    }

    #[tokio::test]
    async fn test_local_delete_and_exists() {
        let (_dir, storage) = local();
        storage
            .upload_stream_with_hash("k3", Box::new(std::io::Cursor::new(b"x".to_vec())))
            .await
            .unwrap();
        assert!(storage.file_exists("k3").await.unwrap());

        storage.delete_file("k3").await.unwrap();
        assert!(!storage.file_exists("k3").await.unwrap());
        assert!(storage.delete_file("k3").await.is_err());
    }

    #[tokio::test]
    async fn test_local_rejects_traversal_keys() {
        let (_dir, storage) = local();
        assert!(storage.get_object_metadata("../etc/passwd").await.is_err());
        assert!(storage.delete_file("a/b").await.is_err());
    }
}
