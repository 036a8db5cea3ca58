// ==========================================
// 报关预审系统 - 合规规则定义
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 3. ComplianceRule / 4.3 匹配语义
// 红线: 规则加载后不可变
// ==========================================

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// 字段格式 (Field Format)
// ==========================================
// 格式不符 => warn 级问题（补交可修正）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldFormat {
    /// 十进制数值
    Numeric,
    /// 日期 YYYY-MM-DD
    Date,
    /// HS 编码: 6-10 位数字
    HsCode,
    /// 国家代码: 2 位大写字母
    CountryCode,
}

impl FieldFormat {
    /// 从规则文件中的格式名解析
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "numeric" => Some(FieldFormat::Numeric),
            "date" => Some(FieldFormat::Date),
            "hs_code" => Some(FieldFormat::HsCode),
            "country_code" => Some(FieldFormat::CountryCode),
            _ => None,
        }
    }

    /// 校验值是否符合本格式
    pub fn validates(&self, value: &str) -> bool {
        let value = value.trim();
        match self {
            FieldFormat::Numeric => {
                !value.is_empty() && value.parse::<f64>().is_ok()
            }
            FieldFormat::Date => {
                let bytes = value.as_bytes();
                bytes.len() == 10
                    && bytes[4] == b'-'
                    && bytes[7] == b'-'
                    && value
                        .char_indices()
                        .all(|(i, c)| (i == 4 || i == 7) || c.is_ascii_digit())
                    && chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d").is_ok()
            }
            FieldFormat::HsCode => {
                (6..=10).contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit())
            }
            FieldFormat::CountryCode => {
                value.len() == 2 && value.chars().all(|c| c.is_ascii_uppercase())
            }
        }
    }
}

// ==========================================
// 字段约束 (Field Constraint)
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConstraintKind {
    /// 值必须落在允许集合内（大小写不敏感）
    AllowedSet(Vec<String>),
    /// 数值范围 [min, max]（任一端可缺省）
    NumericRange { min: Option<f64>, max: Option<f64> },
    /// 格式检查
    Format(FieldFormat),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConstraint {
    /// 约束作用的字段名
    pub field: String,
    /// 约束种类
    pub kind: ConstraintKind,
}

// ==========================================
// ComplianceRule - 合规规则
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRule {
    /// 规则 ID（数据集内唯一）
    pub rule_id: String,
    /// 适用单证类型（小写归一化）
    pub document_type: String,
    /// 适用起运国（None = 通配）
    pub origin_country: Option<String>,
    /// 适用目的国（None = 通配）
    pub destination_country: Option<String>,
    /// 适用 HS 编码前缀（None = 通配）
    pub hs_code_prefix: Option<String>,
    /// 必填字段（按声明顺序评估）
    pub required_fields: Vec<String>,
    /// 字段约束（按声明顺序评估）
    pub constraints: Vec<FieldConstraint>,
    /// 规则说明（写入问题消息）
    pub message: Option<String>,
}

impl ComplianceRule {
    /// 判定规则是否适用于给定单证
    ///
    /// 匹配语义:
    /// - document_type 必须匹配（大小写不敏感）
    /// - 管辖/归类维度（起运国/目的国/HS 前缀）为可选谓词:
    ///   规则声明了该维度且提取字段存在时才比较;
    ///   字段缺失视为通配命中（缺失本身由 required_fields 负责揭示）
    pub fn applies_to(
        &self,
        document_type: &str,
        fields: &BTreeMap<String, String>,
    ) -> bool {
        if !self.document_type.eq_ignore_ascii_case(document_type.trim()) {
            return false;
        }

        let attr_matches = |rule_value: &Option<String>, field_name: &str| -> bool {
            match (rule_value, fields.get(field_name)) {
                (Some(expected), Some(actual)) => expected.eq_ignore_ascii_case(actual.trim()),
                _ => true,
            }
        };

        if !attr_matches(&self.origin_country, "origin_country") {
            return false;
        }
        if !attr_matches(&self.destination_country, "destination_country") {
            return false;
        }

        match (&self.hs_code_prefix, fields.get("hs_code")) {
            (Some(prefix), Some(code)) => code.trim().starts_with(prefix.as_str()),
            _ => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn rule() -> ComplianceRule {
        ComplianceRule {
            rule_id: "R1".to_string(),
            document_type: "invoice".to_string(),
            origin_country: Some("Germany".to_string()),
            destination_country: None,
            hs_code_prefix: Some("8504".to_string()),
            required_fields: vec!["invoice_number".to_string()],
            constraints: vec![],
            message: None,
        }
    }

    #[test]
    fn test_applies_requires_document_type() {
        assert!(!rule().applies_to("packing list", &fields(&[])));
        assert!(rule().applies_to("Invoice", &fields(&[])));
    }

    #[test]
    fn test_jurisdiction_compared_only_when_present() {
        let r = rule();
        // 字段缺失 => 通配命中
        assert!(r.applies_to("invoice", &fields(&[])));
        // 字段存在且不匹配 => 不适用
        assert!(!r.applies_to("invoice", &fields(&[("origin_country", "Japan")])));
        assert!(r.applies_to("invoice", &fields(&[("origin_country", "germany")])));
    }

    #[test]
    fn test_hs_prefix_match() {
        let r = rule();
        assert!(r.applies_to("invoice", &fields(&[("hs_code", "850440")])));
        assert!(!r.applies_to("invoice", &fields(&[("hs_code", "620342")])));
    }

    #[test]
    fn test_format_validators() {
        assert!(FieldFormat::Numeric.validates("120.5"));
        assert!(!FieldFormat::Numeric.validates("12,5"));
        assert!(FieldFormat::Date.validates("2026-08-06"));
        assert!(!FieldFormat::Date.validates("06/08/2026"));
        assert!(!FieldFormat::Date.validates("2026-13-40"));
        assert!(FieldFormat::HsCode.validates("850440"));
        assert!(!FieldFormat::HsCode.validates("85"));
        assert!(FieldFormat::CountryCode.validates("DE"));
        assert!(!FieldFormat::CountryCode.validates("Germany"));
    }
}
