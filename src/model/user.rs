use super::{contains_ci, de_opt_string, de_string};
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Student,
    Staff,
    Principal,
    PlacementOfficer,
    Hod,
    Hodstaff,
    Admin,
}

impl Role {
    pub const ALL: [Role; 7] = [
        Role::Student,
        Role::Staff,
        Role::Principal,
        Role::PlacementOfficer,
        Role::Hod,
        Role::Hodstaff,
        Role::Admin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Staff => "staff",
            Role::Principal => "principal",
            Role::PlacementOfficer => "placement_officer",
            Role::Hod => "hod",
            Role::Hodstaff => "hodstaff",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match t.as_str() {
            "student" => Ok(Role::Student),
            "staff" => Ok(Role::Staff),
            "principal" => Ok(Role::Principal),
            "placement_officer" | "po" => Ok(Role::PlacementOfficer),
            "hod" => Ok(Role::Hod),
            "hodstaff" | "hod_staff" => Ok(Role::Hodstaff),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("未知角色: {}", s)),
        }
    }
}

/// 用户记录（服务端所有，客户端只持有拉取下来的副本）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(deserialize_with = "de_string")]
    pub sin_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub year: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub college: Option<String>,
    #[serde(default, alias = "accommodation_type", deserialize_with = "de_opt_string")]
    pub accommodation: Option<String>,
    #[serde(default, alias = "phone_number", deserialize_with = "de_opt_string")]
    pub phone: Option<String>,
    #[serde(default, alias = "parent_phone_number", deserialize_with = "de_opt_string")]
    pub parent_phone: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub mentor: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub class_advisor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<Value>,
}

impl User {
    pub fn role_kind(&self) -> Option<Role> {
        self.role.parse().ok()
    }

    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim();
        if q.is_empty() {
            return true;
        }
        [
            Some(self.sin_number.as_str()),
            Some(self.name.as_str()),
            Some(self.email.as_str()),
            Some(self.role.as_str()),
            self.department.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|field| contains_ci(field, q))
    }

    /// 照片字节（后端可能给 base64 字符串、data URL 或 Buffer JSON）
    pub fn photo_bytes(&self) -> Option<Vec<u8>> {
        self.photo.as_ref().and_then(photo_bytes)
    }
}

pub fn photo_bytes(v: &Value) -> Option<Vec<u8>> {
    match v {
        Value::String(s) if !s.is_empty() => {
            let raw = match s.find("base64,") {
                Some(idx) => &s[idx + "base64,".len()..],
                None => s.as_str(),
            };
            base64::engine::general_purpose::STANDARD
                .decode(raw.trim())
                .ok()
        }
        Value::Object(map) => map.get("data").and_then(|d| match d {
            Value::Array(items) => items
                .iter()
                .map(|b| b.as_u64().and_then(|n| u8::try_from(n).ok()))
                .collect(),
            other => photo_bytes(other),
        }),
        _ => None,
    }
}

/// 新建/编辑用户表单。所有字段以字符串提交（multipart）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserForm {
    pub sin_number: String,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub department: String,
    pub year: String,
    pub college: String,
    pub accommodation: String,
    pub phone: String,
    pub parent_phone: String,
    pub mentor: String,
    pub class_advisor: String,
    pub photo_path: Option<PathBuf>,
}

impl UserForm {
    pub fn from_user(user: &User) -> Self {
        let s = |o: &Option<String>| o.clone().unwrap_or_default();
        Self {
            sin_number: user.sin_number.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            password: String::new(),
            role: user.role.clone(),
            department: s(&user.department),
            year: s(&user.year),
            college: s(&user.college),
            accommodation: s(&user.accommodation),
            phone: s(&user.phone),
            parent_phone: s(&user.parent_phone),
            mentor: s(&user.mentor),
            class_advisor: s(&user.class_advisor),
            photo_path: None,
        }
    }

    /// 按字段名赋值，字段名兼容几种常见写法
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        let value = value.to_string();
        match key.to_ascii_lowercase().as_str() {
            "sin" | "sin_number" => self.sin_number = value,
            "name" => self.name = value,
            "email" => self.email = value,
            "password" => self.password = value,
            "role" => self.role = value,
            "department" | "dept" => self.department = value,
            "year" => self.year = value,
            "college" => self.college = value,
            "accommodation" | "accommodation_type" => self.accommodation = value,
            "phone" => self.phone = value,
            "parent_phone" => self.parent_phone = value,
            "mentor" => self.mentor = value,
            "class_advisor" | "advisor" => self.class_advisor = value,
            "photo" => self.photo_path = Some(PathBuf::from(value)),
            other => return Err(format!("未知用户字段: {}", other)),
        }
        Ok(())
    }

    /// 提交前的必填校验
    pub fn validate(&self, creating: bool) -> Result<(), String> {
        let mut missing = Vec::new();
        if self.sin_number.trim().is_empty() {
            missing.push("sin_number");
        }
        if self.name.trim().is_empty() {
            missing.push("name");
        }
        if self.email.trim().is_empty() {
            missing.push("email");
        }
        if self.role.trim().is_empty() {
            missing.push("role");
        }
        if creating && self.password.is_empty() {
            missing.push("password");
        }
        if !missing.is_empty() {
            return Err(format!("缺少必填字段: {}", missing.join(", ")));
        }
        if !self.email.contains('@') {
            return Err(format!("邮箱格式不正确: {}", self.email));
        }
        self.role.parse::<Role>()?;
        Ok(())
    }

    /// multipart 文本字段。编辑时密码留空则不提交
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let role = self
            .role
            .parse::<Role>()
            .map(|r| r.as_str().to_string())
            .unwrap_or_else(|_| self.role.clone());
        let mut out = vec![
            ("sin_number", self.sin_number.trim().to_string()),
            ("name", self.name.trim().to_string()),
            ("email", self.email.trim().to_string()),
            ("role", role),
            ("department", self.department.clone()),
            ("year", self.year.clone()),
            ("college", self.college.clone()),
            ("accommodation", self.accommodation.clone()),
            ("phone", self.phone.clone()),
            ("parent_phone", self.parent_phone.clone()),
            ("mentor", self.mentor.clone()),
            ("class_advisor", self.class_advisor.clone()),
        ];
        if !self.password.is_empty() {
            out.push(("password", self.password.clone()));
        }
        out
    }
}
