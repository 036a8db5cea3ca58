// ==========================================
// 报关预审系统 - 提取层
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.1 ContentExtractor
// ==========================================
// 职责: 原始字节 + 申报类型 -> 归一化文本 + 字段候选
// 红线: 确定性输出; 失败为类型化错误, 不中断整船校验
// ==========================================

pub mod content_extractor;
pub mod error;
pub mod field_sniffer;

// 重导出核心类型
pub use content_extractor::{ContentExtractor, ExtractedContent};
pub use error::{ExtractError, ExtractResult};
pub use field_sniffer::sniff_fields;
