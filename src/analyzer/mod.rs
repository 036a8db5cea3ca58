// ==========================================
// 报关预审系统 - AI 字段解析层
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.2 AiFieldExtractor (能力边界)
// ==========================================
// 职责: 归一化文本 + 单证类型 -> 字段映射
// 红线: 引擎只依赖 trait, 任何满足契约的提供方可替换;
//       空映射是合法成功, 不是错误
// ==========================================

pub mod error;
pub mod heuristic;
pub mod remote;
pub mod stub;

pub use error::{AnalyzerError, AnalyzerResult};
pub use heuristic::HeuristicFieldAnalyzer;
pub use remote::{RemoteAnalyzerSettings, RemoteFieldAnalyzer};
pub use stub::StubFieldAnalyzer;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

// ==========================================
// AiFieldExtractor Trait
// ==========================================
// 实现者: HeuristicFieldAnalyzer（离线默认）/ RemoteFieldAnalyzer（LLM 服务）
//         / StubFieldAnalyzer（测试）
#[async_trait]
pub trait AiFieldExtractor: Send + Sync {
    /// 从归一化文本中解析报关字段
    ///
    /// # 参数
    /// - content: 归一化文本
    /// - document_type: 申报单证类型标签
    ///
    /// # 返回
    /// - Ok(map): 字段名 -> 值; 空映射表示"未识别出字段", 属合法成功
    /// - Err(AnalyzerError): 超时 / 服务错误（带瞬时性分类）
    async fn extract_fields(
        &self,
        content: &str,
        document_type: &str,
    ) -> AnalyzerResult<BTreeMap<String, String>>;
}

// ==========================================
// 重试策略
// ==========================================

/// 有界重试配置
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// 总尝试次数（含首次）
    pub max_attempts: u32,
    /// 退避基数（毫秒）; 第 n 次重试前等待 base * 2^(n-1)
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_base_ms: 200,
        }
    }
}

/// 带超时与有界重试地调用 AI 解析服务
///
/// 红线: 仅对瞬时错误重试; 非瞬时错误一次性向上返回
///
/// # 参数
/// - analyzer: AI 解析提供方
/// - content / document_type: 透传给提供方
/// - timeout: 单次调用超时
/// - policy: 重试配置
pub async fn extract_fields_with_retry(
    analyzer: &Arc<dyn AiFieldExtractor>,
    content: &str,
    document_type: &str,
    timeout: Duration,
    policy: RetryPolicy,
) -> AnalyzerResult<BTreeMap<String, String>> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let outcome = tokio::time::timeout(
            timeout,
            analyzer.extract_fields(content, document_type),
        )
        .await;

        let err = match outcome {
            Ok(Ok(fields)) => {
                debug!(
                    document_type,
                    attempt,
                    field_count = fields.len(),
                    "AI 字段解析成功"
                );
                return Ok(fields);
            }
            Ok(Err(e)) => e,
            Err(_) => AnalyzerError::Timeout {
                timeout_ms: timeout.as_millis() as u64,
            },
        };

        if !err.is_transient() || attempt >= max_attempts {
            return Err(err);
        }

        let backoff = Duration::from_millis(policy.backoff_base_ms << (attempt - 1));
        warn!(
            document_type,
            attempt,
            backoff_ms = backoff.as_millis() as u64,
            error = %err,
            "AI 字段解析瞬时失败, 退避后重试"
        );
        tokio::time::sleep(backoff).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// 前 n 次返回瞬时错误, 之后成功
    struct FlakyAnalyzer {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl AiFieldExtractor for FlakyAnalyzer {
        async fn extract_fields(
            &self,
            _content: &str,
            _document_type: &str,
        ) -> AnalyzerResult<BTreeMap<String, String>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                return Err(AnalyzerError::Provider {
                    message: "暂时不可用".to_string(),
                    transient: true,
                });
            }
            let mut fields = BTreeMap::new();
            fields.insert("invoice_number".to_string(), "INV-1".to_string());
            Ok(fields)
        }
    }

    /// 永远返回非瞬时错误
    struct BrokenAnalyzer;

    #[async_trait]
    impl AiFieldExtractor for BrokenAnalyzer {
        async fn extract_fields(
            &self,
            _content: &str,
            _document_type: &str,
        ) -> AnalyzerResult<BTreeMap<String, String>> {
            Err(AnalyzerError::Provider {
                message: "鉴权失败".to_string(),
                transient: false,
            })
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let analyzer: Arc<dyn AiFieldExtractor> = Arc::new(FlakyAnalyzer {
            failures: 2,
            calls: AtomicU32::new(0),
        });
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_base_ms: 1,
        };
        let fields = extract_fields_with_retry(
            &analyzer,
            "Invoice # 1234567",
            "invoice",
            Duration::from_secs(1),
            policy,
        )
        .await
        .unwrap();
        assert_eq!(fields.get("invoice_number").map(String::as_str), Some("INV-1"));
    }

    #[tokio::test]
    async fn test_non_transient_fails_immediately() {
        let analyzer: Arc<dyn AiFieldExtractor> = Arc::new(BrokenAnalyzer);
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_base_ms: 1,
        };
        let err = extract_fields_with_retry(
            &analyzer,
            "x",
            "invoice",
            Duration::from_secs(1),
            policy,
        )
        .await
        .unwrap_err();
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn test_retry_exhaustion_returns_last_error() {
        let analyzer: Arc<dyn AiFieldExtractor> = Arc::new(FlakyAnalyzer {
            failures: 10,
            calls: AtomicU32::new(0),
        });
        let policy = RetryPolicy {
            max_attempts: 2,
            backoff_base_ms: 1,
        };
        let err = extract_fields_with_retry(
            &analyzer,
            "x",
            "invoice",
            Duration::from_secs(1),
            policy,
        )
        .await
        .unwrap_err();
        assert!(err.is_transient());
    }
}
