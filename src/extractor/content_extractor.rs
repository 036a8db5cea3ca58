// ==========================================
// 报关预审系统 - 单证内容提取器
// ==========================================
// 依据: Pipeline_Design_v1.0.md - 4.1 ContentExtractor
// 支持: 文本 (.txt) / CSV (.csv) / JSON (.json) / 表格 (.xlsx/.xls)
// 红线: 确定性, 相同字节 + 相同类型 => 相同输出
// ==========================================

use crate::domain::types::SourceType;
use crate::extractor::error::{ExtractError, ExtractResult};
use crate::extractor::field_sniffer::sniff_fields;
use calamine::{open_workbook_from_rs, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use std::collections::BTreeMap;
use std::io::Cursor;

// ==========================================
// ExtractedContent - 提取产物
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedContent {
    /// 归一化文本
    pub text: String,
    /// 字段候选 (结构化来源优先, 行嗅探补缺)
    pub field_candidates: BTreeMap<String, String>,
}

// ==========================================
// ContentExtractor - 内容提取器
// ==========================================
// 红线: 不做网络调用, 不读数据库; 失败返回类型化错误而非 panic
#[derive(Debug, Clone, Default)]
pub struct ContentExtractor;

impl ContentExtractor {
    pub fn new() -> Self {
        Self
    }

    /// 提取单证内容
    ///
    /// # 参数
    /// - bytes: 原始文件字节
    /// - source_type: 申报的来源格式
    ///
    /// # 返回
    /// - Ok(ExtractedContent): 归一化文本 + 字段候选
    /// - Err(ExtractError): UnsupportedFormat / CorruptDocument
    pub fn extract(
        &self,
        bytes: &[u8],
        source_type: SourceType,
    ) -> ExtractResult<ExtractedContent> {
        match source_type {
            SourceType::Text => self.extract_text(bytes),
            SourceType::Csv => self.extract_csv(bytes),
            SourceType::Json => self.extract_json(bytes),
            SourceType::Spreadsheet => self.extract_spreadsheet(bytes),
            SourceType::Unknown => Err(ExtractError::UnsupportedFormat(
                "无法在进程内提取的格式（pdf/图片请走人工通道）".to_string(),
            )),
        }
    }

    // ==========================================
    // 纯文本
    // ==========================================
    fn extract_text(&self, bytes: &[u8]) -> ExtractResult<ExtractedContent> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractError::CorruptDocument(format!("非 UTF-8 文本: {}", e)))?
            .to_string();

        let field_candidates = sniff_fields(&text);
        Ok(ExtractedContent {
            text,
            field_candidates,
        })
    }

    // ==========================================
    // CSV
    // ==========================================
    // 字段候选: 表头 -> 首个非空数据行
    fn extract_csv(&self, bytes: &[u8]) -> ExtractResult<ExtractedContent> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractError::CorruptDocument(format!("非 UTF-8 文本: {}", e)))?
            .to_string();

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| normalize_key(h))
            .collect();

        let mut field_candidates = BTreeMap::new();
        for result in reader.records() {
            let record = result?;
            if record.iter().all(|v| v.trim().is_empty()) {
                continue;
            }
            for (col_idx, value) in record.iter().enumerate() {
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                if let Some(header) = headers.get(col_idx) {
                    if !header.is_empty() {
                        field_candidates.insert(header.clone(), value.to_string());
                    }
                }
            }
            break; // 仅取首个数据行
        }

        merge_sniffed(&mut field_candidates, &text);
        Ok(ExtractedContent {
            text,
            field_candidates,
        })
    }

    // ==========================================
    // JSON
    // ==========================================
    // 字段候选: 顶层对象的字符串/数值成员
    fn extract_json(&self, bytes: &[u8]) -> ExtractResult<ExtractedContent> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ExtractError::CorruptDocument(format!("非 UTF-8 文本: {}", e)))?
            .to_string();

        let value: serde_json::Value = serde_json::from_slice(bytes)?;

        let mut field_candidates = BTreeMap::new();
        if let serde_json::Value::Object(map) = &value {
            for (key, member) in map {
                let rendered = match member {
                    serde_json::Value::String(s) => Some(s.clone()),
                    serde_json::Value::Number(n) => Some(n.to_string()),
                    serde_json::Value::Bool(b) => Some(b.to_string()),
                    _ => None,
                };
                if let Some(rendered) = rendered {
                    if !rendered.trim().is_empty() {
                        field_candidates.insert(normalize_key(key), rendered);
                    }
                }
            }
        }

        merge_sniffed(&mut field_candidates, &text);
        Ok(ExtractedContent {
            text,
            field_candidates,
        })
    }

    // ==========================================
    // 表格 (xlsx/xls)
    // ==========================================
    // 归一化文本: 行内以制表符连接, 行间换行
    fn extract_spreadsheet(&self, bytes: &[u8]) -> ExtractResult<ExtractedContent> {
        let rows = read_first_sheet(bytes)?;

        let text = rows
            .iter()
            .map(|row| row.join("\t"))
            .collect::<Vec<_>>()
            .join("\n");

        let mut field_candidates = BTreeMap::new();
        if rows.len() >= 2 {
            let headers: Vec<String> = rows[0].iter().map(|h| normalize_key(h)).collect();
            for (col_idx, value) in rows[1].iter().enumerate() {
                let value = value.trim();
                if value.is_empty() {
                    continue;
                }
                if let Some(header) = headers.get(col_idx) {
                    if !header.is_empty() {
                        field_candidates.insert(header.clone(), value.to_string());
                    }
                }
            }
        }

        merge_sniffed(&mut field_candidates, &text);
        Ok(ExtractedContent {
            text,
            field_candidates,
        })
    }
}

/// 读取工作簿第一个 sheet 的全部单元格文本
///
/// 先按 xlsx 解析, 失败再按 xls 解析
fn read_first_sheet(bytes: &[u8]) -> ExtractResult<Vec<Vec<String>>> {
    if let Ok(mut workbook) =
        open_workbook_from_rs::<Xlsx<_>, _>(Cursor::new(bytes.to_vec()))
    {
        return sheet_rows(&mut workbook);
    }

    let mut workbook = open_workbook_from_rs::<Xls<_>, _>(Cursor::new(bytes.to_vec()))
        .map_err(|e| ExtractError::CorruptDocument(format!("表格解析失败: {}", e)))?;
    sheet_rows(&mut workbook)
}

fn sheet_rows<R>(workbook: &mut R) -> ExtractResult<Vec<Vec<String>>>
where
    R: Reader<Cursor<Vec<u8>>>,
    R::Error: std::fmt::Display,
{
    let sheet_names = workbook.sheet_names();
    let sheet_name = sheet_names
        .first()
        .cloned()
        .ok_or_else(|| ExtractError::CorruptDocument("表格文件无工作表".to_string()))?;

    let range = workbook
        .worksheet_range(&sheet_name)
        .map_err(|e| ExtractError::CorruptDocument(format!("表格解析失败: {}", e)))?;

    let rows = range
        .rows()
        .map(|row| {
            row.iter()
                .map(|cell| cell.to_string().trim().to_string())
                .collect()
        })
        .collect();
    Ok(rows)
}

/// 表头/键名归一化: 去空白, 小写, 空格转下划线
fn normalize_key(raw: &str) -> String {
    raw.trim()
        .to_ascii_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

/// 行嗅探补缺: 结构化候选优先, 嗅探结果只填空位
fn merge_sniffed(field_candidates: &mut BTreeMap<String, String>, text: &str) {
    for (key, value) in sniff_fields(text) {
        field_candidates.entry(key).or_insert(value);
    }
}
