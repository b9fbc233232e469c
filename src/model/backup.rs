use super::{de_opt_string, de_string, RecordId};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BackupType {
    #[default]
    #[serde(alias = "full", alias = "FULL")]
    Full,
    #[serde(alias = "incremental", alias = "INCREMENTAL")]
    Incremental,
}

impl FromStr for BackupType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "full" => Ok(BackupType::Full),
            "incremental" | "inc" => Ok(BackupType::Incremental),
            _ => Err(format!("未知备份类型: {} (Full/Incremental)", s)),
        }
    }
}

impl fmt::Display for BackupType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackupType::Full => f.write_str("Full"),
            BackupType::Incremental => f.write_str("Incremental"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackupStatus {
    #[serde(alias = "success", alias = "COMPLETED")]
    Completed,
    #[serde(alias = "error", alias = "FAILED")]
    Failed,
    #[default]
    #[serde(alias = "in_progress", alias = "pending", alias = "running")]
    InProgress,
}

impl BackupStatus {
    pub fn label(&self) -> &'static str {
        match self {
            BackupStatus::Completed => "completed",
            BackupStatus::Failed => "failed",
            BackupStatus::InProgress => "in-progress",
        }
    }
}

fn calculating() -> String {
    "Calculating...".to_string()
}

/// 备份记录。size/status 在服务端没算好之前是占位值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    #[serde(deserialize_with = "de_string")]
    pub id: String,
    #[serde(default, alias = "created_at", alias = "createdAt", deserialize_with = "de_opt_string")]
    pub date: Option<String>,
    #[serde(default = "calculating", deserialize_with = "de_size")]
    pub size: String,
    #[serde(rename = "type", alias = "backup_type", default)]
    pub backup_type: BackupType,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub description: Option<String>,
    #[serde(default)]
    pub status: BackupStatus,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub name: Option<String>,
}

impl RecordId for Backup {
    const ID_KEY: &'static str = "id";
    const ID_FALLBACKS: &'static [&'static str] = &["_id", "backup_id"];
}

fn de_size<'de, D>(d: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(de_opt_string(d)?
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(calculating))
}

/// 新建备份请求
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateBackupRequest {
    #[serde(rename = "type")]
    pub backup_type: BackupType,
    pub description: String,
    pub name: String,
}

impl CreateBackupRequest {
    pub fn new(backup_type: BackupType, description: impl Into<String>, now: NaiveDateTime) -> Self {
        Self {
            backup_type,
            description: description.into(),
            name: format!("backup_{}", now.format("%Y%m%d_%H%M%S")),
        }
    }
}

fn filename_star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)filename\*\s*=\s*(?:[\w-]+)?'[^']*'([^;]+)"#).expect("valid regex")
    })
}

fn filename_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?i)filename\s*=\s*(?:"([^"]*)"|([^;]+))"#).expect("valid regex")
    })
}

/// 从 Content-Disposition 中取文件名，优先 RFC 5987 的 `filename*`
pub fn content_disposition_filename(header: &str) -> Option<String> {
    let raw = if let Some(c) = filename_star_re().captures(header) {
        let encoded = c.get(1)?.as_str().trim();
        urlencoding::decode(encoded)
            .map(|d| d.into_owned())
            .unwrap_or_else(|_| encoded.to_string())
    } else {
        let c = filename_re().captures(header)?;
        c.get(1).or_else(|| c.get(2))?.as_str().trim().to_string()
    };
    // 只保留文件名部分，防止路径穿越
    let name = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim()
        .to_string();
    (!name.is_empty() && name != "." && name != "..").then_some(name)
}

/// 下载保存的文件名：有响应头用响应头，否则 `backup_<id>_<YYYYMMDD>.zip`
pub fn download_filename(header: Option<&str>, id: &str, today: NaiveDate) -> String {
    header
        .and_then(content_disposition_filename)
        .unwrap_or_else(|| format!("backup_{}_{}.zip", id, today.format("%Y%m%d")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, 14).unwrap()
    }

    #[test]
    fn filename_from_quoted_header() {
        let name = download_filename(Some(r#"attachment; filename="full_backup.zip""#), "7", day());
        assert_eq!(name, "full_backup.zip");
    }

    #[test]
    fn filename_from_unquoted_header() {
        let name = download_filename(Some("attachment; filename=logs.csv; size=10"), "7", day());
        assert_eq!(name, "logs.csv");
    }

    #[test]
    fn filename_star_takes_priority() {
        let header = r#"attachment; filename="fallback.zip"; filename*=UTF-8''b%C3%A4ckup%201.zip"#;
        assert_eq!(download_filename(Some(header), "7", day()), "bäckup 1.zip");
    }

    #[test]
    fn fallback_when_header_missing_or_useless() {
        assert_eq!(download_filename(None, "12", day()), "backup_12_20240914.zip");
        assert_eq!(
            download_filename(Some("attachment"), "12", day()),
            "backup_12_20240914.zip"
        );
        assert_eq!(
            download_filename(Some(r#"attachment; filename="""#), "12", day()),
            "backup_12_20240914.zip"
        );
    }

    #[test]
    fn header_paths_are_stripped() {
        let name = download_filename(Some(r#"attachment; filename="../../etc/passwd""#), "1", day());
        assert_eq!(name, "passwd");
    }

    #[test]
    fn placeholders_fill_missing_fields() {
        let b: Backup = serde_json::from_value(json!({"id": 3, "type": "Incremental", "size": null}))
            .unwrap();
        assert_eq!(b.id, "3");
        assert_eq!(b.size, "Calculating...");
        assert_eq!(b.status, BackupStatus::InProgress);
        assert_eq!(b.backup_type, BackupType::Incremental);
    }

    #[test]
    fn create_request_serializes_type_key() {
        let now = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(3, 4, 5)
            .unwrap();
        let req = CreateBackupRequest::new(BackupType::Full, "nightly", now);
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"type": "Full", "description": "nightly", "name": "backup_20240102_030405"})
        );
    }
}
