// ==========================================
// 报关预审系统 - 行级字段嗅探器
// ==========================================
// 依据: 关键字段行扫描规则（invoice/tracking/weight/value/hs/origin/destination）
// 红线: 纯函数, 同一文本输出恒定（缓存与测试可复现的前提）
// ==========================================

use std::collections::BTreeMap;

/// 从归一化文本中嗅探常见报关字段
///
/// 逐行扫描, 行内出现关键词即尝试抽取对应值;
/// 后续行不覆盖已嗅探到的字段（首次命中优先）
pub fn sniff_fields(content: &str) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();

    if content.trim().is_empty() {
        return fields;
    }

    for line in content.lines() {
        let lower = line.to_ascii_lowercase();

        // 发票号
        if lower.contains("invoice") {
            if let Some(number) = extract_long_digits(line, 6) {
                fields.entry("invoice_number".to_string()).or_insert(number);
            }
        }

        // 运单号/提单号
        if lower.contains("tracking") || lower.contains("shipment") || lower.contains("b/l") {
            if let Some(number) = extract_long_digits(line, 6) {
                fields
                    .entry("tracking_number".to_string())
                    .or_insert(number);
            }
        }

        // 重量
        if lower.contains("weight") {
            if let Some(value) = extract_decimal(line) {
                fields.entry("weight".to_string()).or_insert(value);
            }
        }

        // 总价值
        if lower.contains("total") || lower.contains("value") {
            if let Some(value) = extract_decimal(line) {
                fields.entry("total_value".to_string()).or_insert(value);
            }
        }

        // HS 编码
        if lower.contains("hs") || lower.contains("tariff") {
            if let Some(code) = extract_hs_code(line) {
                fields.entry("hs_code".to_string()).or_insert(code);
            }
        }

        // 起运国/目的国
        if lower.contains("origin") {
            if let Some(country) = extract_trailing_word(line) {
                fields.entry("origin_country".to_string()).or_insert(country);
            }
        }
        if lower.contains("destination") {
            if let Some(country) = extract_trailing_word(line) {
                fields
                    .entry("destination_country".to_string())
                    .or_insert(country);
            }
        }
    }

    fields
}

/// 抽取行内第一个长度 >= min_len 的连续数字串
fn extract_long_digits(line: &str, min_len: usize) -> Option<String> {
    let mut run = String::new();
    for c in line.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() {
            run.push(c);
        } else {
            if run.len() >= min_len {
                return Some(run);
            }
            run.clear();
        }
    }
    None
}

/// 抽取行内第一个形如 `数字[.,]两位数字` 的十进制数
///
/// 逗号小数点归一化为 `.`
fn extract_decimal(line: &str) -> Option<String> {
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;
    while i < chars.len() {
        if !chars[i].is_ascii_digit() {
            i += 1;
            continue;
        }

        let start = i;
        while i < chars.len() && chars[i].is_ascii_digit() {
            i += 1;
        }

        let sep_ok = matches!(chars.get(i), Some('.') | Some(','));
        let exactly_two_decimals = chars.get(i + 1).is_some_and(|c| c.is_ascii_digit())
            && chars.get(i + 2).is_some_and(|c| c.is_ascii_digit())
            && !chars.get(i + 3).is_some_and(|c| c.is_ascii_digit());

        if sep_ok && exactly_two_decimals {
            let int_part: String = chars[start..i].iter().collect();
            let frac_part: String = chars[i + 1..i + 3].iter().collect();
            return Some(format!("{}.{}", int_part, frac_part));
        }
    }
    None
}

/// 抽取行内独立的 6 位数字串（HS 编码）
fn extract_hs_code(line: &str) -> Option<String> {
    let mut run = String::new();
    let mut prev_is_digit = false;
    for c in line.chars().chain(std::iter::once(' ')) {
        if c.is_ascii_digit() {
            run.push(c);
            prev_is_digit = true;
        } else {
            if prev_is_digit && run.len() == 6 {
                return Some(run);
            }
            run.clear();
            prev_is_digit = false;
        }
    }
    None
}

/// 抽取行尾最后一个长度 > 2 的词（国家名简易抽取）
fn extract_trailing_word(line: &str) -> Option<String> {
    line.split(|c: char| c.is_whitespace() || c == ',' || c == ':')
        .filter(|w| w.len() > 2)
        .next_back()
        .map(|w| w.to_string())
}
