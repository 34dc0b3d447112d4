use crate::domain::model::Record;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::INPUT_EXTENSIONS;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::io::Cursor;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputFormat {
    Spreadsheet,
    Csv,
}

impl InputFormat {
    /// 依副檔名判斷輸入格式
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .ok_or_else(|| EtlError::UnsupportedInputError {
                path: path.to_string(),
                reason: "file has no extension".to_string(),
            })?;

        match extension.as_str() {
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(InputFormat::Spreadsheet),
            "csv" => Ok(InputFormat::Csv),
            other => Err(EtlError::UnsupportedInputError {
                path: path.to_string(),
                reason: format!(
                    "unsupported extension '{}', expected one of: {}",
                    other,
                    INPUT_EXTENSIONS.join(", ")
                ),
            }),
        }
    }
}

/// 將輸入檔案內容解析為記錄，第一列視為標題列
pub fn read_records(path: &str, bytes: Vec<u8>, sheet: Option<&str>) -> Result<Vec<Record>> {
    match InputFormat::from_path(path)? {
        InputFormat::Spreadsheet => read_spreadsheet(bytes, sheet),
        InputFormat::Csv => read_csv(&bytes),
    }
}

fn read_spreadsheet(bytes: Vec<u8>, sheet: Option<&str>) -> Result<Vec<Record>> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))?;
    let sheet_names = workbook.sheet_names();

    let range = match sheet {
        Some(name) => {
            if !sheet_names.iter().any(|s| s == name) {
                return Err(EtlError::ConfigValidationError {
                    field: "input.sheet".to_string(),
                    message: format!(
                        "Worksheet '{}' not found. Available: {}",
                        name,
                        sheet_names.join(", ")
                    ),
                });
            }
            workbook.worksheet_range(name)?
        }
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| EtlError::ProcessingError {
                message: "Workbook contains no worksheets".to_string(),
            })??,
    };

    tracing::debug!(
        "Worksheet range {:?} ({} sheets available)",
        range.get_size(),
        sheet_names.len()
    );

    let mut rows = range.rows();
    let headers: Vec<Option<String>> = match rows.next() {
        Some(header_row) => header_row.iter().map(header_name).collect(),
        None => return Ok(Vec::new()),
    };

    warn_duplicate_headers(headers.iter().flatten());

    let mut records = Vec::new();
    for row in rows {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }

        let mut data = HashMap::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            if let Some(header) = header {
                data.entry(header.clone()).or_insert_with(|| cell_value(cell));
            }
        }
        records.push(Record { data });
    }

    Ok(records)
}

/// 重複的標題以第一欄為準
fn warn_duplicate_headers<'a>(headers: impl Iterator<Item = &'a String>) {
    let mut seen = HashSet::new();
    for header in headers {
        if !seen.insert(header.as_str()) {
            tracing::warn!("⚠️ Duplicate column '{}', keeping the first occurrence", header);
        }
    }
}

fn header_name(cell: &Data) -> Option<String> {
    let name = match cell {
        Data::Empty | Data::Error(_) => return None,
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    };
    (!name.is_empty()).then_some(name)
}

fn cell_value(cell: &Data) -> Value {
    match cell {
        Data::Int(i) => Value::from(*i),
        Data::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Data::String(s) => Value::String(s.clone()),
        Data::Bool(b) => Value::Bool(*b),
        Data::Empty | Data::Error(_) => Value::Null,
        // 日期與時長以文字保留
        other => Value::String(other.to_string()),
    }
}

fn read_csv(bytes: &[u8]) -> Result<Vec<Record>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();
    warn_duplicate_headers(headers.iter().filter(|h| !h.is_empty()));

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let mut data = HashMap::new();
        for (header, field) in headers.iter().zip(row.iter()) {
            if header.is_empty() {
                continue;
            }
            let value = if field.trim().is_empty() {
                Value::Null
            } else {
                Value::String(field.to_string())
            };
            data.entry(header.clone()).or_insert(value);
        }
        records.push(Record { data });
    }

    Ok(records)
}
