use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BiometricDevice {
    #[default]
    Fingerprint,
    Face,
    Card,
    Iris,
}

impl BiometricDevice {
    pub const ALL: [BiometricDevice; 4] = [
        BiometricDevice::Fingerprint,
        BiometricDevice::Face,
        BiometricDevice::Card,
        BiometricDevice::Iris,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BiometricDevice::Fingerprint => "fingerprint",
            BiometricDevice::Face => "face",
            BiometricDevice::Card => "card",
            BiometricDevice::Iris => "iris",
        }
    }
}

impl FromStr for BiometricDevice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fingerprint" => Ok(BiometricDevice::Fingerprint),
            "face" | "facial" | "face_recognition" => Ok(BiometricDevice::Face),
            "card" | "rfid" => Ok(BiometricDevice::Card),
            "iris" => Ok(BiometricDevice::Iris),
            _ => Err(format!(
                "未知考勤设备: {} (fingerprint/face/card/iris)",
                s
            )),
        }
    }
}

impl fmt::Display for BiometricDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 考勤规则。时长在本地统一用分钟/小时整数表示
#[derive(Debug, Clone, PartialEq)]
pub struct SystemConfig {
    /// 最低出勤率（%）
    pub min_attendance: f64,
    /// 宽限时间（分钟）
    pub grace_period: i64,
    pub biometric_device: BiometricDevice,
    /// 迟到判定阈值（分钟），不能超过宽限时间
    pub late_mark_threshold: i64,
    /// 自动锁定（小时）
    pub auto_lockout_after: i64,
    pub enable_auto_approval: bool,
    pub notify_on_late_arrival: bool,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            min_attendance: 75.0,
            grace_period: 15,
            biometric_device: BiometricDevice::Fingerprint,
            late_mark_threshold: 10,
            auto_lockout_after: 8,
            enable_auto_approval: false,
            notify_on_late_arrival: true,
        }
    }
}

impl SystemConfig {
    pub fn validate(&self) -> Result<(), String> {
        if !self.min_attendance.is_finite() || !(0.0..=100.0).contains(&self.min_attendance) {
            return Err("最低出勤率必须在 0-100 之间".to_string());
        }
        if !(0..=60).contains(&self.grace_period) {
            return Err("宽限时间必须在 0-60 分钟之间".to_string());
        }
        if self.late_mark_threshold < 0 {
            return Err("迟到阈值不能为负数".to_string());
        }
        if self.late_mark_threshold > self.grace_period {
            return Err("迟到阈值不能超过宽限时间".to_string());
        }
        if !(0..=24).contains(&self.auto_lockout_after) {
            return Err("自动锁定时间必须在 0-24 小时之间".to_string());
        }
        Ok(())
    }

    /// 按表单字段名赋值（只做类型解析，范围校验留给 validate）
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        let v = value.trim();
        let int = |v: &str| {
            v.parse::<i64>()
                .map_err(|_| format!("{} 需要整数: {}", key, v))
        };
        match normalize_key(key).as_str() {
            "minattendance" => {
                self.min_attendance = v
                    .trim_end_matches('%')
                    .parse::<f64>()
                    .map_err(|_| format!("minAttendance 需要数字: {}", v))?
            }
            "graceperiod" => self.grace_period = int(v)?,
            "latemarkthreshold" => self.late_mark_threshold = int(v)?,
            "autolockoutafter" => self.auto_lockout_after = int(v)?,
            "biometricdevice" => self.biometric_device = v.parse()?,
            "enableautoapproval" => self.enable_auto_approval = parse_bool(v)?,
            "notifyonlatearrival" => self.notify_on_late_arrival = parse_bool(v)?,
            _ => return Err(format!("未知配置项: {}", key)),
        }
        Ok(())
    }

    /// 发给后端的格式：分钟转 `HH:MM`
    pub fn to_wire(&self) -> Value {
        json!({
            "minAttendance": self.min_attendance,
            "gracePeriod": minutes_to_hhmm(self.grace_period),
            "biometricDevice": self.biometric_device.as_str(),
            "lateMarkThreshold": minutes_to_hhmm(self.late_mark_threshold),
            "autoLockoutAfter": self.auto_lockout_after,
            "enableAutoApproval": self.enable_auto_approval,
            "notifyOnLateArrival": self.notify_on_late_arrival,
        })
    }

    /// 从后端格式解析；缺失或格式不对的字段保留默认值
    pub fn from_wire(v: &Value) -> Self {
        let mut cfg = SystemConfig::default();
        let Value::Object(map) = v else {
            return cfg;
        };
        for (key, raw) in map {
            match normalize_key(key).as_str() {
                "minattendance" => {
                    if let Some(n) = number_of(raw) {
                        cfg.min_attendance = n;
                    }
                }
                "graceperiod" => {
                    if let Some(m) = minutes_of(raw) {
                        cfg.grace_period = m;
                    }
                }
                "latemarkthreshold" => {
                    if let Some(m) = minutes_of(raw) {
                        cfg.late_mark_threshold = m;
                    }
                }
                "autolockoutafter" => {
                    if let Some(n) = number_of(raw) {
                        cfg.auto_lockout_after = n.round() as i64;
                    } else if let Some(m) = raw.as_str().and_then(parse_hhmm) {
                        cfg.auto_lockout_after = m / 60;
                    }
                }
                "biometricdevice" => {
                    if let Some(d) = raw.as_str().and_then(|s| s.parse().ok()) {
                        cfg.biometric_device = d;
                    }
                }
                "enableautoapproval" => {
                    if let Some(b) = bool_of(raw) {
                        cfg.enable_auto_approval = b;
                    }
                }
                "notifyonlatearrival" => {
                    if let Some(b) = bool_of(raw) {
                        cfg.notify_on_late_arrival = b;
                    }
                }
                _ => {}
            }
        }
        cfg
    }
}

/// `gracePeriod` / `grace_period` / `GracePeriod` 统一成一个键
fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_ascii_lowercase()
}

pub fn minutes_to_hhmm(minutes: i64) -> String {
    let m = minutes.max(0);
    format!("{:02}:{:02}", m / 60, m % 60)
}

/// 解析 `HH:MM`、`HH:MM:SS` 或纯分钟数
pub fn parse_hhmm(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(n) = s.parse::<i64>() {
        return Some(n);
    }
    let parts: Vec<&str> = s.split(':').collect();
    if !(2..=3).contains(&parts.len()) {
        return None;
    }
    let h = parts[0].parse::<i64>().ok()?;
    let m = parts[1].parse::<i64>().ok()?;
    if h < 0 || !(0..60).contains(&m) {
        return None;
    }
    Some(h * 60 + m)
}

fn minutes_of(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_f64().map(|f| f.round() as i64),
        Value::String(s) => parse_hhmm(s),
        _ => None,
    }
}

fn number_of(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    }
}

fn bool_of(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => parse_bool(s).ok(),
        _ => None,
    }
}

pub fn parse_bool(s: &str) -> Result<bool, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" | "y" => Ok(true),
        "0" | "false" | "no" | "off" | "n" => Ok(false),
        _ => Err(format!("需要布尔值 (on/off): {}", s)),
    }
}
