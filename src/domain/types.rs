// ==========================================
// 报关预审系统 - 领域类型定义
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 状态与严重度体系
// 红线: 状态为枚举制, 不得用字符串哨兵值
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 校验总体状态 (Validation Status)
// ==========================================
// 序列化格式: snake_case (与缓存表一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationStatus {
    NotRun,      // 从未运行 / 无单证
    Pending,     // 运行中
    Passed,      // 全部通过
    Failed,      // 存在 failed 级问题
    NeedsReview, // 提取/解析失败, 需人工复核
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationStatus::NotRun => write!(f, "not_run"),
            ValidationStatus::Pending => write!(f, "pending"),
            ValidationStatus::Passed => write!(f, "passed"),
            ValidationStatus::Failed => write!(f, "failed"),
            ValidationStatus::NeedsReview => write!(f, "needs_review"),
        }
    }
}

impl ValidationStatus {
    /// 从字符串解析（缓存表读取用）
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "pending" => ValidationStatus::Pending,
            "passed" => ValidationStatus::Passed,
            "failed" => ValidationStatus::Failed,
            "needs_review" => ValidationStatus::NeedsReview,
            _ => ValidationStatus::NotRun,
        }
    }
}

// ==========================================
// 问题严重度 (Issue Severity)
// ==========================================
// 红线: failed 阻断放行, warn 可补交后复验
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Info,
    Warn,
    Failed,
}

impl fmt::Display for IssueSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IssueSeverity::Info => write!(f, "info"),
            IssueSeverity::Warn => write!(f, "warn"),
            IssueSeverity::Failed => write!(f, "failed"),
        }
    }
}

// ==========================================
// 问题类别 (Issue Kind)
// ==========================================
// 规则类问题来自 RuleMatcher, 提取类问题来自流水线本身
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// 必填字段缺失
    MissingField,
    /// 字段值不在允许集合内
    ValueNotAllowed,
    /// 数值超出范围
    ValueOutOfRange,
    /// 格式不符（可补交修正）
    FormatMismatch,
    /// 单证内容提取失败（格式不支持/文件损坏）
    ExtractionFailure,
    /// AI 解析服务失败（重试后仍失败）
    ProviderFailure,
}

impl IssueKind {
    pub fn as_str(&self) -> &str {
        match self {
            IssueKind::MissingField => "missing_field",
            IssueKind::ValueNotAllowed => "value_not_allowed",
            IssueKind::ValueOutOfRange => "value_out_of_range",
            IssueKind::FormatMismatch => "format_mismatch",
            IssueKind::ExtractionFailure => "extraction_failure",
            IssueKind::ProviderFailure => "provider_failure",
        }
    }
}

// ==========================================
// 补单请求状态 (Document Request Status)
// ==========================================
// 红线: 单向转换 pending -> fulfilled, 不得回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Fulfilled,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "pending"),
            RequestStatus::Fulfilled => write!(f, "fulfilled"),
        }
    }
}

impl RequestStatus {
    pub fn from_str_or_default(s: &str) -> Self {
        match s {
            "fulfilled" => RequestStatus::Fulfilled,
            _ => RequestStatus::Pending,
        }
    }
}

// ==========================================
// 审批方 (Approval Side)
// ==========================================
// 双审批: 发货方 + 报关行, 两侧各自单向完成
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalSide {
    Shipper,
    Broker,
}

impl fmt::Display for ApprovalSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalSide::Shipper => write!(f, "shipper"),
            ApprovalSide::Broker => write!(f, "broker"),
        }
    }
}

// ==========================================
// 单证来源格式 (Document Source Type)
// ==========================================
// 依据: 上传文件扩展名归一化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Text,
    Csv,
    Json,
    Spreadsheet,
    Unknown,
}

impl SourceType {
    /// 由文件扩展名判定来源格式
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            "txt" => SourceType::Text,
            "csv" => SourceType::Csv,
            "json" => SourceType::Json,
            "xlsx" | "xls" => SourceType::Spreadsheet,
            _ => SourceType::Unknown,
        }
    }
}
