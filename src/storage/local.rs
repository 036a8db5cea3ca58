// ==========================================
// 报关预审系统 - 本地目录对象存储
// ==========================================
// 职责: 以本地目录树实现 BlobStorage, 键即相对路径
// 键布局: shippers/{shipper}/shipments/{shipment}/{uuid}_{file_name}
// 说明: 开发/离线环境使用; 生产环境由对象存储服务实现同一契约
// ==========================================

use crate::storage::{shipment_prefix, BlobStorage, StorageError, StorageResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::debug;
use uuid::Uuid;

// ==========================================
// LocalBlobStorage - 本地目录对象存储
// ==========================================
pub struct LocalBlobStorage {
    root: PathBuf,
}

impl LocalBlobStorage {
    /// 以指定根目录创建
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 以系统数据目录下的默认位置创建
    ///
    /// 路径: {data_dir}/customs-preclear/blobs
    pub fn in_default_data_dir() -> Self {
        let root = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("customs-preclear")
            .join("blobs");
        Self::new(root)
    }

    /// 键合法性检查: 拒绝路径逃逸
    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        if key.split('/').any(|part| part == "..") || Path::new(key).is_absolute() {
            return Err(StorageError::IoError(format!("非法存储键: {}", key)));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl BlobStorage for LocalBlobStorage {
    async fn upload(
        &self,
        shipper_id: i64,
        shipment_id: i64,
        file_name: &str,
        bytes: &[u8],
    ) -> StorageResult<String> {
        // 文件名前缀 uuid, 避免同名覆盖
        let safe_name = file_name.replace(['/', '\\'], "_");
        let key = format!(
            "{}{}_{}",
            shipment_prefix(shipper_id, shipment_id),
            Uuid::new_v4().simple(),
            safe_name
        );

        let path = self.resolve(&key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;

        debug!(key, size = bytes.len(), "对象已写入本地存储");
        Ok(key)
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::KeyNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::KeyNotFound(key.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete_by_shipment(
        &self,
        shipper_id: i64,
        shipment_id: i64,
    ) -> StorageResult<usize> {
        let prefix_dir = self.root.join(shipment_prefix(shipper_id, shipment_id));
        if !prefix_dir.exists() {
            return Ok(0);
        }

        let mut count = 0;
        let mut entries = tokio::fs::read_dir(&prefix_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                tokio::fs::remove_file(entry.path()).await?;
                count += 1;
            }
        }
        tokio::fs::remove_dir_all(&prefix_dir).await.ok();

        debug!(shipper_id, shipment_id, count, "货运对象已清理");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_roundtrip() {
        let dir = TempDir::new().unwrap();
        let storage = LocalBlobStorage::new(dir.path());

        let key = storage.upload(1, 10, "invoice.txt", b"hello").await.unwrap();
        assert!(key.starts_with("shippers/1/shipments/10/"));
        assert_eq!(storage.download(&key).await.unwrap(), b"hello");

        storage.delete(&key).await.unwrap();
        assert!(matches!(
            storage.download(&key).await,
            Err(StorageError::KeyNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_by_shipment() {
        let dir = TempDir::new().unwrap();
        let storage = LocalBlobStorage::new(dir.path());
        storage.upload(1, 10, "a.txt", b"a").await.unwrap();
        storage.upload(1, 10, "b.txt", b"b").await.unwrap();

        assert_eq!(storage.delete_by_shipment(1, 10).await.unwrap(), 2);
        assert_eq!(storage.delete_by_shipment(1, 10).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejects_path_escape() {
        let dir = TempDir::new().unwrap();
        let storage = LocalBlobStorage::new(dir.path());
        assert!(storage.download("../etc/passwd").await.is_err());
    }
}
