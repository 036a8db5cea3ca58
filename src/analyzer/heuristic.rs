// ==========================================
// 报关预审系统 - 离线启发式解析器
// ==========================================
// 职责: 无外部依赖的默认 AI 解析实现, 复用行级字段嗅探
// 用途: 未配置远程 LLM 服务时的离线回退
// ==========================================

use crate::analyzer::{AiFieldExtractor, AnalyzerResult};
use crate::extractor::field_sniffer::sniff_fields;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// 离线启发式字段解析器
///
/// 确定性: 相同文本恒定输出, 可用于缓存与复现测试
#[derive(Debug, Clone, Default)]
pub struct HeuristicFieldAnalyzer;

impl HeuristicFieldAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl AiFieldExtractor for HeuristicFieldAnalyzer {
    async fn extract_fields(
        &self,
        content: &str,
        _document_type: &str,
    ) -> AnalyzerResult<BTreeMap<String, String>> {
        // 空内容 => 空映射（合法成功）
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        Ok(sniff_fields(content))
    }
}
