// ==========================================
// 报关预审系统 - 测试用脚本化解析器
// ==========================================
// 职责: 按预设剧本响应, 供引擎测试在无真实 AI 依赖下运行
// 说明: 与 NoOpEventPublisher 同类, 作为库内导出的测试替身
// ==========================================

use crate::analyzer::{AiFieldExtractor, AnalyzerError, AnalyzerResult};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

/// 脚本化响应
#[derive(Debug, Clone)]
pub enum StubResponse {
    /// 返回固定字段映射
    Fields(Vec<(String, String)>),
    /// 返回空映射
    Empty,
    /// 模拟超时（挂起超过任何合理超时上限）
    Hang,
    /// 返回服务错误
    Error { message: String, transient: bool },
}

// ==========================================
// StubFieldAnalyzer - 脚本化解析器
// ==========================================
pub struct StubFieldAnalyzer {
    response: StubResponse,
    calls: AtomicU32,
}

impl StubFieldAnalyzer {
    /// 固定返回给定字段映射
    pub fn with_fields(pairs: &[(&str, &str)]) -> Self {
        Self {
            response: StubResponse::Fields(
                pairs
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            calls: AtomicU32::new(0),
        }
    }

    /// 固定返回空映射
    pub fn empty() -> Self {
        Self {
            response: StubResponse::Empty,
            calls: AtomicU32::new(0),
        }
    }

    /// 模拟挂起（由调用侧超时裁决）
    pub fn hanging() -> Self {
        Self {
            response: StubResponse::Hang,
            calls: AtomicU32::new(0),
        }
    }

    /// 固定返回服务错误
    pub fn failing(message: &str, transient: bool) -> Self {
        Self {
            response: StubResponse::Error {
                message: message.to_string(),
                transient,
            },
            calls: AtomicU32::new(0),
        }
    }

    /// 已被调用次数（断言重试行为用）
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AiFieldExtractor for StubFieldAnalyzer {
    async fn extract_fields(
        &self,
        _content: &str,
        _document_type: &str,
    ) -> AnalyzerResult<BTreeMap<String, String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.response {
            StubResponse::Fields(pairs) => Ok(pairs.iter().cloned().collect()),
            StubResponse::Empty => Ok(BTreeMap::new()),
            StubResponse::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(BTreeMap::new())
            }
            StubResponse::Error { message, transient } => Err(AnalyzerError::Provider {
                message: message.clone(),
                transient: *transient,
            }),
        }
    }
}
