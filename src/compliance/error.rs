// ==========================================
// 报关预审系统 - 合规数据集错误类型
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 7. 错误分级
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 合规数据集错误类型
///
/// 红线: LoadFailure 仅使本次加载失败, 先前已发布的数据集保持生效
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("合规数据集尚未初始化")]
    Uninitialized,

    #[error("合规数据集加载失败: {0}")]
    LoadFailure(String),

    #[error("规则文件读取失败: {0}")]
    SourceReadError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for DatasetError {
    fn from(err: std::io::Error) -> Self {
        DatasetError::SourceReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for DatasetError {
    fn from(err: csv::Error) -> Self {
        DatasetError::LoadFailure(format!("CSV 解析失败: {}", err))
    }
}

/// Result 类型别名
pub type DatasetResult<T> = Result<T, DatasetError>;
