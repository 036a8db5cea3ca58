// ==========================================
// 报关预审系统 - AI 解析层错误类型
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.2 AiFieldExtractor 失败模式
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// AI 解析服务错误类型
///
/// 红线: 仅瞬时错误 (Timeout / transient Provider) 允许重试
#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("AI 解析超时（{timeout_ms} ms）")]
    Timeout { timeout_ms: u64 },

    #[error("AI 解析服务错误: {message}")]
    Provider { message: String, transient: bool },

    #[error("AI 响应格式错误: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AnalyzerError {
    /// 是否为瞬时错误（允许有界重试）
    pub fn is_transient(&self) -> bool {
        match self {
            AnalyzerError::Timeout { .. } => true,
            AnalyzerError::Provider { transient, .. } => *transient,
            AnalyzerError::MalformedResponse(_) => false,
            AnalyzerError::Other(_) => false,
        }
    }
}

/// Result 类型别名
pub type AnalyzerResult<T> = Result<T, AnalyzerError>;
