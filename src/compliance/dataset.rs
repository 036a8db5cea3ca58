// ==========================================
// 报关预审系统 - 合规数据集快照
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 3. ComplianceDataset
// 红线: 快照不可变; 并发读取者只见完整数据集, 不见半加载状态
// ==========================================

use crate::compliance::rule::ComplianceRule;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

// ==========================================
// ComplianceDataset - 不可变规则快照
// ==========================================
#[derive(Debug, Clone)]
pub struct ComplianceDataset {
    /// 全量规则（数据集声明顺序 = 规则评估顺序）
    rules: Vec<ComplianceRule>,
    /// 单证类型索引（小写类型 -> 规则下标, 保持声明顺序）
    by_document_type: HashMap<String, Vec<usize>>,
    /// 加载完成时间
    pub loaded_at: DateTime<Utc>,
    /// 来源标识（文件路径）
    pub source: String,
}

impl ComplianceDataset {
    /// 由规则列表构建快照（索引一次建好, 随后只读）
    pub fn new(rules: Vec<ComplianceRule>, source: String) -> Self {
        let mut by_document_type: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, rule) in rules.iter().enumerate() {
            by_document_type
                .entry(rule.document_type.to_ascii_lowercase())
                .or_default()
                .push(idx);
        }

        Self {
            rules,
            by_document_type,
            loaded_at: Utc::now(),
            source,
        }
    }

    /// 规则总数
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 按单证类型取规则（数据集声明顺序）
    pub fn rules_for_document_type(&self, document_type: &str) -> Vec<&ComplianceRule> {
        let key = document_type.trim().to_ascii_lowercase();
        self.by_document_type
            .get(&key)
            .map(|indices| indices.iter().map(|&i| &self.rules[i]).collect())
            .unwrap_or_default()
    }

    /// 全量规则视图
    pub fn rules(&self) -> &[ComplianceRule] {
        &self.rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(rule_id: &str, document_type: &str) -> ComplianceRule {
        ComplianceRule {
            rule_id: rule_id.to_string(),
            document_type: document_type.to_string(),
            origin_country: None,
            destination_country: None,
            hs_code_prefix: None,
            required_fields: vec![],
            constraints: vec![],
            message: None,
        }
    }

    #[test]
    fn test_index_preserves_declaration_order() {
        let dataset = ComplianceDataset::new(
            vec![
                rule("R1", "invoice"),
                rule("R2", "packing list"),
                rule("R3", "invoice"),
            ],
            "test.csv".to_string(),
        );

        let invoice_rules: Vec<&str> = dataset
            .rules_for_document_type("Invoice")
            .iter()
            .map(|r| r.rule_id.as_str())
            .collect();
        assert_eq!(invoice_rules, vec!["R1", "R3"]);
    }

    #[test]
    fn test_unknown_type_has_no_rules() {
        let dataset = ComplianceDataset::new(vec![rule("R1", "invoice")], "test.csv".to_string());
        assert!(dataset.rules_for_document_type("certificate").is_empty());
    }
}
