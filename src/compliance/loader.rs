// ==========================================
// 报关预审系统 - 合规规则集加载器
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.3 InitializeComplianceDataset
// 格式: CSV (表头映射, 引号容忍)
// 红线: 全量解析成功才产出数据集; 任何坏行使本次加载整体失败
// ==========================================

use crate::compliance::dataset::ComplianceDataset;
use crate::compliance::error::{DatasetError, DatasetResult};
use crate::compliance::rule::{ComplianceRule, ConstraintKind, FieldConstraint, FieldFormat};
use csv::ReaderBuilder;
use std::collections::{HashMap, HashSet};
use tracing::info;

// 规则文件表头:
// rule_id, document_type, origin_country, destination_country, hs_code_prefix,
// required_fields, constraint_field, allowed_values, min_value, max_value,
// format, message
//
// 一行一条规则; required_fields / allowed_values 以分号分隔;
// constraint_field 非空时, allowed_values / min+max / format 三者取其一

/// 解析规则文件字节为规则列表（全量成功或整体失败）
pub fn parse_ruleset(bytes: &[u8], source: &str) -> DatasetResult<ComplianceDataset> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(bytes);

    let headers: HashMap<String, usize> = reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(idx, h)| (h.trim().to_ascii_lowercase(), idx))
        .collect();

    for required in ["rule_id", "document_type"] {
        if !headers.contains_key(required) {
            return Err(DatasetError::LoadFailure(format!(
                "规则文件缺少表头: {}",
                required
            )));
        }
    }

    let mut rules = Vec::new();
    let mut seen_ids = HashSet::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let line_no = row_idx + 2; // 含表头的行号

        let get = |name: &str| -> String {
            headers
                .get(name)
                .and_then(|&idx| record.get(idx))
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };

        // 跳过完全空白的行
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }

        let rule_id = get("rule_id");
        if rule_id.is_empty() {
            return Err(DatasetError::LoadFailure(format!(
                "第 {} 行: rule_id 为空",
                line_no
            )));
        }
        if !seen_ids.insert(rule_id.clone()) {
            return Err(DatasetError::LoadFailure(format!(
                "第 {} 行: 规则 ID 重复: {}",
                line_no, rule_id
            )));
        }

        let document_type = get("document_type").to_ascii_lowercase();
        if document_type.is_empty() {
            return Err(DatasetError::LoadFailure(format!(
                "第 {} 行: document_type 为空",
                line_no
            )));
        }

        let required_fields = split_list(&get("required_fields"));
        let constraints = parse_constraint(&get, line_no)?;

        rules.push(ComplianceRule {
            rule_id,
            document_type,
            origin_country: non_empty(get("origin_country")),
            destination_country: non_empty(get("destination_country")),
            hs_code_prefix: non_empty(get("hs_code_prefix")),
            required_fields,
            constraints,
            message: non_empty(get("message")),
        });
    }

    info!(rule_count = rules.len(), source, "合规规则集解析完成");
    Ok(ComplianceDataset::new(rules, source.to_string()))
}

/// 解析行内约束列（constraint_field 非空时恰取一种约束）
fn parse_constraint(
    get: &dyn Fn(&str) -> String,
    line_no: usize,
) -> DatasetResult<Vec<FieldConstraint>> {
    let field = get("constraint_field");
    if field.is_empty() {
        return Ok(vec![]);
    }

    let allowed = get("allowed_values");
    let min_raw = get("min_value");
    let max_raw = get("max_value");
    let format_raw = get("format");

    let kind = if !allowed.is_empty() {
        ConstraintKind::AllowedSet(split_list(&allowed))
    } else if !min_raw.is_empty() || !max_raw.is_empty() {
        ConstraintKind::NumericRange {
            min: parse_bound(&min_raw, "min_value", line_no)?,
            max: parse_bound(&max_raw, "max_value", line_no)?,
        }
    } else if !format_raw.is_empty() {
        let format = FieldFormat::parse(&format_raw).ok_or_else(|| {
            DatasetError::LoadFailure(format!(
                "第 {} 行: 未知格式名: {}",
                line_no, format_raw
            ))
        })?;
        ConstraintKind::Format(format)
    } else {
        return Err(DatasetError::LoadFailure(format!(
            "第 {} 行: constraint_field 已给出但无约束内容",
            line_no
        )));
    };

    Ok(vec![FieldConstraint { field, kind }])
}

fn parse_bound(raw: &str, column: &str, line_no: usize) -> DatasetResult<Option<f64>> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>().map(Some).map_err(|_| {
        DatasetError::LoadFailure(format!(
            "第 {} 行: {} 非数值: {}",
            line_no, column, raw
        ))
    })
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(';')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}
