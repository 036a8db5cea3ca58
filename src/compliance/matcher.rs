// ==========================================
// 报关预审系统 - 规则匹配器
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.3 RuleMatcher 语义
// 红线: 评估顺序 = 数据集声明顺序; 同一输入输出恒定
// 严重度: 必填缺失/集合外/超范围 => failed; 格式不符 => warn
// ==========================================

use crate::compliance::dataset::ComplianceDataset;
use crate::compliance::rule::{ComplianceRule, ConstraintKind};
use crate::domain::types::{IssueKind, IssueSeverity};
use crate::domain::validation::ValidationIssue;
use std::collections::BTreeMap;
use tracing::debug;

// ==========================================
// MatchOutcome - 单证匹配结论
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    /// 规则问题（规则声明顺序）
    pub issues: Vec<ValidationIssue>,
    /// 是否有规则被评估（false = 无适用规则, 与"全部通过"可区分）
    pub rules_evaluated: bool,
}

// ==========================================
// RuleMatcher - 规则匹配器
// ==========================================
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher;

impl RuleMatcher {
    pub fn new() -> Self {
        Self
    }

    /// 对单份单证的提取字段应用全部适用规则
    ///
    /// # 参数
    /// - fields: 提取字段映射
    /// - document_type: 申报单证类型
    /// - dataset: 当前合规数据集快照
    /// - document_id: 问题归属单证 ID
    pub fn match_document(
        &self,
        fields: &BTreeMap<String, String>,
        document_type: &str,
        dataset: &ComplianceDataset,
        document_id: i64,
    ) -> MatchOutcome {
        let applicable: Vec<&ComplianceRule> = dataset
            .rules_for_document_type(document_type)
            .into_iter()
            .filter(|rule| rule.applies_to(document_type, fields))
            .collect();

        if applicable.is_empty() {
            debug!(document_type, document_id, "无适用规则");
            return MatchOutcome {
                issues: vec![],
                rules_evaluated: false,
            };
        }

        let mut issues = Vec::new();
        for rule in &applicable {
            self.evaluate_rule(rule, fields, document_id, &mut issues);
        }

        debug!(
            document_type,
            document_id,
            rule_count = applicable.len(),
            issue_count = issues.len(),
            "规则评估完成"
        );
        MatchOutcome {
            issues,
            rules_evaluated: true,
        }
    }

    /// 评估单条规则: 先必填字段, 后字段约束, 各按声明顺序
    fn evaluate_rule(
        &self,
        rule: &ComplianceRule,
        fields: &BTreeMap<String, String>,
        document_id: i64,
        issues: &mut Vec<ValidationIssue>,
    ) {
        // ===== 必填字段 =====
        for required in &rule.required_fields {
            let present = fields
                .get(required)
                .map(|v| !v.trim().is_empty())
                .unwrap_or(false);
            if !present {
                issues.push(ValidationIssue::rule_issue(
                    document_id,
                    required,
                    &rule.rule_id,
                    IssueSeverity::Failed,
                    IssueKind::MissingField,
                    format!(
                        "必填字段缺失: {}{}",
                        required,
                        rule.message
                            .as_deref()
                            .map(|m| format!("（{}）", m))
                            .unwrap_or_default()
                    ),
                ));
            }
        }

        // ===== 字段约束 =====
        // 约束只评估已出现的字段; 缺失由 required_fields 负责
        for constraint in &rule.constraints {
            let Some(value) = fields.get(&constraint.field).map(|v| v.trim()) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }

            match &constraint.kind {
                ConstraintKind::AllowedSet(allowed) => {
                    let hit = allowed.iter().any(|a| a.eq_ignore_ascii_case(value));
                    if !hit {
                        issues.push(ValidationIssue::rule_issue(
                            document_id,
                            &constraint.field,
                            &rule.rule_id,
                            IssueSeverity::Failed,
                            IssueKind::ValueNotAllowed,
                            format!(
                                "字段 {} 的值 {} 不在允许集合 [{}] 内",
                                constraint.field,
                                value,
                                allowed.join(", ")
                            ),
                        ));
                    }
                }
                ConstraintKind::NumericRange { min, max } => {
                    match value.parse::<f64>() {
                        Ok(number) => {
                            let below = min.map(|m| number < m).unwrap_or(false);
                            let above = max.map(|m| number > m).unwrap_or(false);
                            if below || above {
                                issues.push(ValidationIssue::rule_issue(
                                    document_id,
                                    &constraint.field,
                                    &rule.rule_id,
                                    IssueSeverity::Failed,
                                    IssueKind::ValueOutOfRange,
                                    format!(
                                        "字段 {} 的值 {} 超出范围 [{}, {}]",
                                        constraint.field,
                                        value,
                                        min.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
                                        max.map(|m| m.to_string()).unwrap_or_else(|| "-".to_string()),
                                    ),
                                ));
                            }
                        }
                        Err(_) => {
                            // 非数值落在数值约束上 => 格式问题, 补交可修正
                            issues.push(ValidationIssue::rule_issue(
                                document_id,
                                &constraint.field,
                                &rule.rule_id,
                                IssueSeverity::Warn,
                                IssueKind::FormatMismatch,
                                format!("字段 {} 的值 {} 不是数值", constraint.field, value),
                            ));
                        }
                    }
                }
                ConstraintKind::Format(format) => {
                    if !format.validates(value) {
                        issues.push(ValidationIssue::rule_issue(
                            document_id,
                            &constraint.field,
                            &rule.rule_id,
                            IssueSeverity::Warn,
                            IssueKind::FormatMismatch,
                            format!(
                                "字段 {} 的值 {} 格式不符（期望 {:?}）",
                                constraint.field, value, format
                            ),
                        ));
                    }
                }
            }
        }
    }
}
