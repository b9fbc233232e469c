use crate::model::user::photo_bytes;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;

pub const DEFAULT_ACTOR: &str = "admin";

/// 当前登录管理员的资料
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminProfile {
    #[serde(deserialize_with = "crate::model::de_opt_string")]
    pub sin_number: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub department: Option<String>,
    pub phone: Option<String>,
    pub photo: Option<Value>,
}

/// 登录上下文
///
/// 启动时构建一次，之后显式传给后台服务与界面。资料缺失或无法解析时，
/// 操作人退回到 `admin`。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AuthContext {
    profile: Option<AdminProfile>,
    source: String,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self {
            profile: None,
            source: "none".to_string(),
        }
    }

    pub fn from_profile(profile: AdminProfile, source: impl Into<String>) -> Self {
        Self {
            profile: Some(profile),
            source: source.into(),
        }
    }

    /// 依次尝试会话文件和 `ADMIN_*` 环境变量
    pub fn load(session_file: Option<&Path>) -> Self {
        Self::load_with(session_file, |k| std::env::var(k).ok())
    }

    pub fn load_with<F>(session_file: Option<&Path>, get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = session_file {
            match std::fs::read_to_string(path) {
                Ok(text) => match parse_session(&text) {
                    Some(profile) => {
                        info!("已从 {} 读取登录资料", path.display());
                        return Self::from_profile(profile, path.display().to_string());
                    }
                    None => warn!("会话文件 {} 无法解析", path.display()),
                },
                Err(e) => warn!("读取会话文件 {} 失败: {}", path.display(), e),
            }
        }

        let get = |k: &str| get(k).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let profile = AdminProfile {
            sin_number: get("ADMIN_SIN_NUMBER"),
            name: get("ADMIN_NAME"),
            email: get("ADMIN_EMAIL"),
            role: Some("admin".to_string()),
            ..AdminProfile::default()
        };
        if profile.sin_number.is_some() || profile.name.is_some() || profile.email.is_some() {
            return Self::from_profile(profile, "env");
        }
        Self::anonymous()
    }

    pub fn profile(&self) -> Option<&AdminProfile> {
        self.profile.as_ref()
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_signed_in(&self) -> bool {
        self.profile.is_some()
    }

    /// 写操作里记录的操作人
    pub fn actor_id(&self) -> String {
        self.profile
            .as_ref()
            .and_then(|p| p.sin_number.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_ACTOR)
            .to_string()
    }

    pub fn display_name(&self) -> String {
        self.profile
            .as_ref()
            .and_then(|p| p.name.clone())
            .unwrap_or_else(|| self.actor_id())
    }

    pub fn photo_bytes(&self) -> Option<Vec<u8>> {
        self.profile
            .as_ref()
            .and_then(|p| p.photo.as_ref())
            .and_then(photo_bytes)
    }

    /// 注销：清空资料
    pub fn clear(&mut self) {
        self.profile = None;
        self.source = "none".to_string();
    }
}

fn parse_session(text: &str) -> Option<AdminProfile> {
    let value: Value = serde_json::from_str(text).ok()?;
    let inner = match value.get("user") {
        Some(user @ Value::Object(_)) => user.clone(),
        _ => value,
    };
    if !inner.is_object() {
        return None;
    }
    serde_json::from_value(inner).ok()
}
