// ==========================================
// 报关预审系统 - 提取模块错误类型
// ==========================================
// 依据: Rust 错误处理最佳实践
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 提取模块错误类型
///
/// 红线: 提取失败是单证级问题, 不得中断整船校验
#[derive(Error, Debug)]
pub enum ExtractError {
    // ===== 格式相关错误 =====
    #[error("文件格式不支持: {0}（仅支持 .txt/.csv/.json/.xlsx/.xls）")]
    UnsupportedFormat(String),

    #[error("文件内容损坏: {0}")]
    CorruptDocument(String),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ExtractError {
    /// 提取错误转为问题描述（写入 ValidationIssue.message）
    pub fn issue_message(&self) -> String {
        self.to_string()
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ExtractError {
    fn from(err: csv::Error) -> Self {
        ExtractError::CorruptDocument(format!("CSV 解析失败: {}", err))
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::CorruptDocument(format!("JSON 解析失败: {}", err))
    }
}

/// Result 类型别名
pub type ExtractResult<T> = Result<T, ExtractError>;
