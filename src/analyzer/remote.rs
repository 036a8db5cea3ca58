// ==========================================
// 报关预审系统 - 远程 LLM 字段解析器
// ==========================================
// 职责: 调用 chat-completions 兼容服务做结构化字段抽取
// 红线: 仅返回分类后的错误; HTTP 细节不得泄漏到引擎层
// ==========================================

use crate::analyzer::{AiFieldExtractor, AnalyzerError, AnalyzerResult};
use async_trait::async_trait;
use serde_json::json;
use std::collections::BTreeMap;

/// 系统提示词: 仅输出匹配字段 schema 的最小化 JSON
const SYSTEM_PROMPT: &str = "You are an expert customs document parser. \
Extract key fields from the user-provided document text and respond ONLY with \
minified JSON matching the schema: {invoice_number,tracking_number,weight,\
total_value,hs_code,origin_country,destination_country}. Use null when \
unknown. Do not include explanations.";

// ==========================================
// RemoteAnalyzerSettings - 远程服务配置
// ==========================================
#[derive(Debug, Clone)]
pub struct RemoteAnalyzerSettings {
    /// 服务根地址（chat-completions 兼容）
    pub endpoint: String,
    /// API Key
    pub api_key: String,
    /// 模型名
    pub model: String,
}

// ==========================================
// RemoteFieldAnalyzer - 远程 LLM 解析器
// ==========================================
pub struct RemoteFieldAnalyzer {
    settings: RemoteAnalyzerSettings,
    client: reqwest::Client,
}

impl RemoteFieldAnalyzer {
    /// 创建新的远程解析器实例
    pub fn new(settings: RemoteAnalyzerSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    /// 将模型返回的 JSON 对象压平为字段映射
    ///
    /// null/复合值跳过, 数值转字符串
    fn flatten_response(value: &serde_json::Value) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        if let serde_json::Value::Object(map) = value {
            for (key, member) in map {
                match member {
                    serde_json::Value::String(s) if !s.trim().is_empty() => {
                        fields.insert(key.clone(), s.clone());
                    }
                    serde_json::Value::Number(n) => {
                        fields.insert(key.clone(), n.to_string());
                    }
                    _ => {}
                }
            }
        }
        fields
    }
}

#[async_trait]
impl AiFieldExtractor for RemoteFieldAnalyzer {
    async fn extract_fields(
        &self,
        content: &str,
        document_type: &str,
    ) -> AnalyzerResult<BTreeMap<String, String>> {
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        let url = format!(
            "{}/chat/completions",
            self.settings.endpoint.trim_end_matches('/')
        );
        let user_prompt = format!(
            "DocumentType: {}\n---\n{}\n---\nReturn JSON now.",
            document_type, content
        );
        let payload = json!({
            "model": self.settings.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt },
            ],
            "temperature": 0.0,
            "response_format": { "type": "json_object" },
        });

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AnalyzerError::Provider {
                message: format!("请求发送失败: {}", e),
                // 网络层失败视为瞬时
                transient: true,
            })?;

        let status = response.status();
        if !status.is_success() {
            // 限流与服务端错误可重试; 客户端错误(鉴权/参数)不可
            let transient = status.is_server_error() || status.as_u16() == 429;
            return Err(AnalyzerError::Provider {
                message: format!("HTTP {}", status),
                transient,
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AnalyzerError::MalformedResponse(e.to_string()))?;

        let message = body
            .pointer("/choices/0/message/content")
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                AnalyzerError::MalformedResponse("响应缺少 choices[0].message.content".to_string())
            })?;

        let parsed: serde_json::Value = serde_json::from_str(message)
            .map_err(|e| AnalyzerError::MalformedResponse(format!("模型输出非 JSON: {}", e)))?;

        Ok(Self::flatten_response(&parsed))
    }
}
