use serde_json::{Map, Value};

/// 设备日志行：列由上传的 CSV 决定，后端原样返回
pub type DeviceLogRow = Map<String, Value>;

/// 列名取第一行的键（保持原始顺序）
pub fn columns(rows: &[DeviceLogRow]) -> Vec<String> {
    rows.first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

pub fn cell_text(row: &DeviceLogRow, column: &str) -> String {
    match row.get(column) {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
