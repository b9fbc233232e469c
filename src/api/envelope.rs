//! 响应信封归一化
//!
//! 后端各接口的返回格式不统一：有的是 `{success, data}`，有的是 `{success, message}`，
//! 有的直接返回数组。所有 JSON 响应都经过这里，调用方只拿到业务数据本身。

use super::error::ApiError;
use crate::model::{normalize_id, RecordId};
use log::warn;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;

/// 去掉信封，返回业务数据
pub fn unwrap_envelope(body: Value) -> Result<Value, ApiError> {
    match body {
        Value::Object(mut map) => {
            if map.get("success").and_then(Value::as_bool) == Some(false) {
                let msg = message_of(&Value::Object(map))
                    .unwrap_or_else(|| "操作失败".to_string());
                return Err(ApiError::Rejected(msg));
            }
            if let Some(data) = map.remove("data") {
                return Ok(data);
            }
            Ok(Value::Object(map))
        }
        other => Ok(other),
    }
}

/// 解析为具体类型
pub fn decode<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    let data = unwrap_envelope(body)?;
    serde_json::from_value(data).map_err(|e| ApiError::Decode(e.to_string()))
}

/// 解析列表，兼容 `{data: [...]}`、裸数组以及 `null`
///
/// 单行解析失败只记日志并跳过，不影响其余行。
pub fn decode_list<T: DeserializeOwned>(body: Value) -> Result<Vec<T>, ApiError> {
    decode_rows(body, |_| {})
}

/// 同 `decode_list`，解析前先把主键统一到首选键
pub fn decode_records<T: DeserializeOwned + RecordId>(body: Value) -> Result<Vec<T>, ApiError> {
    decode_rows(body, normalize_id::<T>)
}

fn decode_rows<T, F>(body: Value, prepare: F) -> Result<Vec<T>, ApiError>
where
    T: DeserializeOwned,
    F: Fn(&mut Value),
{
    let items = match unwrap_envelope(body)? {
        Value::Null => return Ok(Vec::new()),
        Value::Array(items) => items,
        Value::Object(map) => {
            // 个别接口把列表再包一层，例如 {users: [...]}
            map.into_iter()
                .find_map(|(_, v)| match v {
                    Value::Array(items) => Some(items),
                    _ => None,
                })
                .ok_or_else(|| ApiError::Decode("期望列表数据".to_string()))?
        }
        other => return Err(ApiError::Decode(format!("期望列表数据，实际为 {}", other))),
    };

    let total = items.len();
    let rows: Vec<T> = items
        .into_iter()
        .enumerate()
        .filter_map(|(i, mut v)| {
            prepare(&mut v);
            match serde_json::from_value(v) {
                Ok(row) => Some(row),
                Err(e) => {
                    warn!("第 {} 行解析失败，已跳过: {}", i + 1, e);
                    None
                }
            }
        })
        .collect();
    if rows.len() < total {
        warn!("列表共 {} 行，跳过 {} 行", total, total - rows.len());
    }
    Ok(rows)
}

/// 提取提示文案（message / error / msg）
pub fn message_of(body: &Value) -> Option<String> {
    ["message", "error", "msg"].iter().find_map(|k| {
        body.get(*k).and_then(|v| match v {
            Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            Value::Object(_) => v.get("message").and_then(Value::as_str).map(String::from),
            _ => None,
        })
    })
}

/// 非 2xx 响应转错误
pub fn status_error(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| message_of(&v))
        .unwrap_or_else(|| format!("Request failed ({})", status.as_u16()));
    ApiError::Status { status, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Backup, Holiday, LeaveRequest};
    use serde_json::json;

    #[test]
    fn data_envelope_is_unwrapped() {
        let v = unwrap_envelope(json!({"success": true, "data": [1, 2]})).unwrap();
        assert_eq!(v, json!([1, 2]));
    }

    #[test]
    fn bare_array_passes_through() {
        let list: Vec<i32> = decode_list(json!([3, 4])).unwrap();
        assert_eq!(list, vec![3, 4]);
    }

    #[test]
    fn failed_envelope_surfaces_server_message() {
        let err = unwrap_envelope(json!({"success": false, "message": "duplicate sin"})).unwrap_err();
        assert_eq!(err.to_string(), "duplicate sin");
    }

    #[test]
    fn nested_list_key_is_found() {
        let list: Vec<String> =
            decode_list(json!({"success": true, "users": ["a", "b"]})).unwrap();
        assert_eq!(list, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn null_data_is_empty_list() {
        let list: Vec<i32> = decode_list(json!({"data": null})).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn bad_row_is_skipped_not_fatal() {
        let list: Vec<Backup> = decode_records(json!([
            {"id": 1, "description": "nightly"},
            {"description": "no id"},
            {"id": 3}
        ]))
        .unwrap();
        let ids: Vec<&str> = list.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn records_with_several_id_keys_decode() {
        let leaves: Vec<LeaveRequest> = decode_records(json!({"data": [
            {"id": 5, "request_id": "R5"},
            {"_id": "m9"}
        ]}))
        .unwrap();
        assert_eq!(leaves[0].request_id, "R5");
        assert_eq!(leaves[1].request_id, "m9");

        let holidays: Vec<Holiday> = decode_records(json!([
            {"_id": "abc", "id": "abc", "date": "2024-01-26", "reason": "Republic Day"},
            {"_id": "def", "date": "2024-08-15", "reason": "Independence Day"}
        ]))
        .unwrap();
        assert_eq!(holidays.len(), 2);
        assert_eq!(holidays[0].id, "abc");
        assert_eq!(holidays[1].id, "def");
    }

    #[test]
    fn status_error_falls_back_to_generic_text() {
        let err = status_error(StatusCode::INTERNAL_SERVER_ERROR, "<html>oops</html>");
        assert_eq!(err.to_string(), "Request failed (500)");
        let err = status_error(StatusCode::BAD_REQUEST, r#"{"error":"bad email"}"#);
        assert_eq!(err.to_string(), "bad email");
    }
}
