// ==========================================
// 报关预审系统 - 流水线错误类型
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 7. 错误分级
// 工具: thiserror 派生宏
// ==========================================
// 红线: 单证级失败收敛为 ValidationResult 内的问题, 不在此处出现;
//       此处仅为使整次运行失败的条件
// ==========================================

use crate::compliance::error::DatasetError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 流水线级错误类型
#[derive(Error, Debug)]
pub enum ValidationError {
    // ===== 数据集条件 =====
    #[error("合规数据集尚未初始化, 请先执行初始化")]
    DatasetUninitialized,

    // ===== 并发控制 =====
    #[error("货运 {0} 的校验正在进行中, 请稍后重试")]
    ConcurrentRunConflict(i64),

    // ===== 持久化 =====
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<DatasetError>: 引擎视角只区分"未初始化", 其余折叠为内部错误
impl From<DatasetError> for ValidationError {
    fn from(err: DatasetError) -> Self {
        match err {
            DatasetError::Uninitialized => ValidationError::DatasetUninitialized,
            other => ValidationError::InternalError(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, ValidationError>;
