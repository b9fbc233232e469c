pub mod backup;
pub mod dashboard;
pub mod deleted_user;
pub mod device_log;
pub mod draft;
pub mod holiday;
pub mod leave;
pub mod semester;
pub mod system_config;
pub mod user;

pub use backup::{Backup, BackupStatus, BackupType, CreateBackupRequest};
pub use dashboard::{DashboardSummary, MonthPoint};
pub use deleted_user::DeletedUser;
pub use device_log::DeviceLogRow;
pub use draft::Draft;
pub use holiday::Holiday;
pub use leave::{ApprovalStage, ApprovalStatus, LeaveFilter, LeaveRequest};
pub use semester::SemesterDetails;
pub use system_config::{BiometricDevice, SystemConfig};
pub use user::{Role, User, UserForm};

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// 后端的标识字段有时是数字有时是字符串，统一成 String
pub(crate) fn de_string<'de, D>(d: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(de_opt_string(d)?.unwrap_or_default())
}

pub(crate) fn de_opt_string<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(d)?;
    Ok(match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// 记录主键在不同接口里名字不一（`request_id` / `id` / `_id`）
pub trait RecordId {
    /// 结构体里的主键字段名
    const ID_KEY: &'static str;
    /// 首选键缺失时依次尝试的键
    const ID_FALLBACKS: &'static [&'static str];
}

/// 首选键缺失或为 null 时，用第一个有值的备选键补上；两者都有时以首选键为准
pub fn normalize_id<T: RecordId>(row: &mut Value) {
    let Value::Object(map) = row else {
        return;
    };
    if map.get(T::ID_KEY).is_some_and(|v| !v.is_null()) {
        return;
    }
    let fallback = T::ID_FALLBACKS
        .iter()
        .find_map(|k| map.get(*k).filter(|v| !v.is_null()).cloned());
    if let Some(id) = fallback {
        map.insert(T::ID_KEY.to_string(), id);
    }
}

/// 大小写不敏感的子串匹配，列表搜索都用它
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// 把 ISO 时间戳或纯日期截成 `YYYY-MM-DD`
pub fn date_part(raw: &str) -> &str {
    let raw = raw.trim();
    match raw.char_indices().nth(10) {
        Some((idx, _)) if raw.as_bytes().get(4) == Some(&b'-') => &raw[..idx],
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Row;

    impl RecordId for Row {
        const ID_KEY: &'static str = "request_id";
        const ID_FALLBACKS: &'static [&'static str] = &["id", "_id"];
    }

    #[test]
    fn preferred_id_key_wins() {
        let mut both = serde_json::json!({"id": 5, "request_id": "R5"});
        normalize_id::<Row>(&mut both);
        assert_eq!(both["request_id"], "R5");

        let mut only_mongo = serde_json::json!({"_id": "m1", "request_id": null});
        normalize_id::<Row>(&mut only_mongo);
        assert_eq!(only_mongo["request_id"], "m1");
    }

    #[test]
    fn date_part_strips_time() {
        assert_eq!(date_part("2024-06-01T00:00:00.000Z"), "2024-06-01");
        assert_eq!(date_part("2024-06-01"), "2024-06-01");
        assert_eq!(date_part("June 1"), "June 1");
    }
}
