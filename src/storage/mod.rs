// ==========================================
// 报关预审系统 - 对象存储层
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 6. Blob 存储契约
// ==========================================
// 职责: 纯键值字节 I/O; 键布局 shippers/{shipper}/shipments/{shipment}/...
// 红线: 流水线不感知具体存储实现
// ==========================================

pub mod local;
pub mod memory;

pub use local::LocalBlobStorage;
pub use memory::MemoryBlobStorage;

use async_trait::async_trait;
use thiserror::Error;

// ==========================================
// 存储层错误类型
// ==========================================
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("存储键不存在: {0}")]
    KeyNotFound(String),

    #[error("存储读写失败: {0}")]
    IoError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err.to_string())
    }
}

/// Result 类型别名
pub type StorageResult<T> = Result<T, StorageError>;

// ==========================================
// BlobStorage Trait
// ==========================================
// 实现者: LocalBlobStorage（本地目录树）/ MemoryBlobStorage（测试）
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// 上传字节, 返回存储键
    ///
    /// # 参数
    /// - shipper_id / shipment_id: 键前缀维度
    /// - file_name: 原始文件名（参与键生成）
    /// - bytes: 文件内容
    async fn upload(
        &self,
        shipper_id: i64,
        shipment_id: i64,
        file_name: &str,
        bytes: &[u8],
    ) -> StorageResult<String>;

    /// 按键下载字节
    async fn download(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// 按键删除
    async fn delete(&self, key: &str) -> StorageResult<()>;

    /// 删除货运下全部对象, 返回删除数量
    async fn delete_by_shipment(
        &self,
        shipper_id: i64,
        shipment_id: i64,
    ) -> StorageResult<usize>;
}

/// 货运对象键前缀
pub fn shipment_prefix(shipper_id: i64, shipment_id: i64) -> String {
    format!("shippers/{}/shipments/{}/", shipper_id, shipment_id)
}
