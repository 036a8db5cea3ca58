// ==========================================
// 报关预审系统 - 校验结果实体
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 3. 数据模型 / 5. 顺序保证
// 红线: 问题列表按 单证上传顺序 -> 规则评估顺序 排列, 重跑字节级一致
// ==========================================

use crate::domain::types::{IssueKind, IssueSeverity, ValidationStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// ValidationIssue - 单条校验问题
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// 问题所在单证 ID
    pub document_id: i64,
    /// 相关字段名（提取类问题为空）
    pub field: Option<String>,
    /// 命中规则 ID（提取类问题为空）
    pub rule_id: Option<String>,
    /// 严重度
    pub severity: IssueSeverity,
    /// 问题类别
    pub kind: IssueKind,
    /// 问题描述
    pub message: String,
}

impl ValidationIssue {
    /// 规则类问题
    pub fn rule_issue(
        document_id: i64,
        field: &str,
        rule_id: &str,
        severity: IssueSeverity,
        kind: IssueKind,
        message: String,
    ) -> Self {
        Self {
            document_id,
            field: Some(field.to_string()),
            rule_id: Some(rule_id.to_string()),
            severity,
            kind,
            message,
        }
    }

    /// 流水线类问题（提取失败 / AI 服务失败）
    pub fn pipeline_issue(document_id: i64, kind: IssueKind, message: String) -> Self {
        Self {
            document_id,
            field: None,
            rule_id: None,
            severity: IssueSeverity::Warn,
            kind,
            message,
        }
    }
}

// ==========================================
// DocumentOutcome - 单证级结论
// ==========================================
// rules_evaluated=false 表示"无适用规则", 与"规则全部通过"可区分
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentOutcome {
    /// 单证 ID
    pub document_id: i64,
    /// 申报单证类型
    pub document_type: String,
    /// 是否有规则被评估
    pub rules_evaluated: bool,
    /// 该单证的问题数
    pub issue_count: usize,
}

// ==========================================
// ValidationResult - 货运级校验结果
// ==========================================
// 每货运一条逻辑结果; 每次成功运行整体覆盖
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    /// 货运 ID（结果主键）
    pub shipment_id: i64,
    /// 总体状态
    pub status: ValidationStatus,
    /// 有序问题列表
    pub issues: Vec<ValidationIssue>,
    /// 单证级结论（与单证上传顺序一致）
    pub document_outcomes: Vec<DocumentOutcome>,
    /// 合规评分 0-100
    pub score: i32,
    /// 结果消息
    pub message: String,
    /// 计算完成时间
    pub computed_at: DateTime<Utc>,
}

impl ValidationResult {
    /// 由问题列表计算合规评分
    ///
    /// 权重: failed=30, warn=5, info=1; 下限 0, 上限 100
    pub fn compute_score(issues: &[ValidationIssue]) -> i32 {
        if issues.is_empty() {
            return 100;
        }

        let failed = issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Failed)
            .count() as i32;
        let warn = issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Warn)
            .count() as i32;
        let info = issues
            .iter()
            .filter(|i| i.severity == IssueSeverity::Info)
            .count() as i32;

        (100 - failed * 30 - warn * 5 - info).clamp(0, 100)
    }
}
