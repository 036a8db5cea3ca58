// ==========================================
// 报关预审系统 - 单证实体
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 3. 数据模型
// 红线: ShipmentDocument 为事实层, ExtractedDocument 为派生层(可重算)
// ==========================================

use crate::domain::types::SourceType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// ShipmentDocument - 货运单证
// ==========================================
// 上传时创建; 仅 uploaded_at 标记与校验回写字段可变
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentDocument {
    /// 单证 ID（自增主键）
    pub id: i64,
    /// 所属货运 ID
    pub shipment_id: i64,
    /// 申报单证类型（如 commercial invoice / packing list）
    pub document_type: String,
    /// 原始文件名
    pub file_name: String,
    /// 对象存储键（blob storage key）
    pub storage_key: String,
    /// 文件大小（字节）
    pub file_size: Option<i64>,
    /// MIME 类型
    pub mime_type: Option<String>,
    /// 上传人 ID
    pub uploaded_by: Option<i64>,
    /// 上传时间
    pub uploaded_at: DateTime<Utc>,
    /// 校验回写: 单证级状态 (not-validated / pass / warning / fail)
    pub validation_status: Option<String>,
    /// 校验回写: 结果摘要 JSON
    pub validation_notes_json: Option<String>,
}

impl ShipmentDocument {
    /// 由文件名推断来源格式
    pub fn source_type(&self) -> SourceType {
        let ext = self
            .file_name
            .rsplit('.')
            .next()
            .filter(|e| *e != self.file_name)
            .unwrap_or("");
        SourceType::from_extension(ext)
    }
}

// ==========================================
// ExtractedDocument - 提取结果（派生, 非事实层）
// ==========================================
// 每次校验运行重新计算; 字段映射用 BTreeMap 保证遍历顺序确定
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedDocument {
    /// 所属货运 ID
    pub shipment_id: i64,
    /// 单证 ID
    pub document_id: i64,
    /// 申报单证类型
    pub document_type: String,
    /// 原始文件名
    pub file_name: String,
    /// 来源格式
    pub source_type: SourceType,
    /// 归一化文本
    pub extracted_content: String,
    /// 字段映射 (字段名 -> 值)
    pub parsed_fields: BTreeMap<String, String>,
    /// 提取时间
    pub extracted_at: DateTime<Utc>,
}
