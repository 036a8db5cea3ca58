// ==========================================
// 报关预审系统 - 内存对象存储（测试替身）
// ==========================================
// 职责: 以 HashMap 模拟键值存储, 供引擎测试在无磁盘/网络依赖下运行
// ==========================================

use crate::storage::{shipment_prefix, BlobStorage, StorageError, StorageResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

// ==========================================
// MemoryBlobStorage - 内存对象存储
// ==========================================
#[derive(Debug, Default)]
pub struct MemoryBlobStorage {
    objects: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 直接写入指定键（测试装配用）
    pub fn put(&self, key: &str, bytes: &[u8]) {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(key.to_string(), bytes.to_vec());
    }

    /// 当前对象数（断言用）
    pub fn len(&self) -> usize {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl BlobStorage for MemoryBlobStorage {
    async fn upload(
        &self,
        shipper_id: i64,
        shipment_id: i64,
        file_name: &str,
        bytes: &[u8],
    ) -> StorageResult<String> {
        let key = format!(
            "{}{}",
            shipment_prefix(shipper_id, shipment_id),
            file_name
        );
        self.put(&key, bytes);
        Ok(key)
    }

    async fn download(&self, key: &str) -> StorageResult<Vec<u8>> {
        self.objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(key)
            .cloned()
            .ok_or_else(|| StorageError::KeyNotFound(key.to_string()))
    }

    async fn delete(&self, key: &str) -> StorageResult<()> {
        let removed = self
            .objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(key);
        match removed {
            Some(_) => Ok(()),
            None => Err(StorageError::KeyNotFound(key.to_string())),
        }
    }

    async fn delete_by_shipment(
        &self,
        shipper_id: i64,
        shipment_id: i64,
    ) -> StorageResult<usize> {
        let prefix = shipment_prefix(shipper_id, shipment_id);
        let mut objects = self
            .objects
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let keys: Vec<String> = objects
            .keys()
            .filter(|k| k.starts_with(&prefix))
            .cloned()
            .collect();
        for key in &keys {
            objects.remove(key);
        }
        Ok(keys.len())
    }
}
