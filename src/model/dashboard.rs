use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// `/admin-dashboard` 汇总数据
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSummary {
    #[serde(alias = "totalUsers")]
    pub total_users: u64,
    #[serde(alias = "totalStudents")]
    pub total_students: u64,
    #[serde(alias = "totalStaff")]
    pub total_staff: u64,
    #[serde(alias = "totalRequests", alias = "totalLeaveRequests")]
    pub total_requests: u64,
    #[serde(alias = "pendingRequests")]
    pub pending_requests: u64,
    #[serde(alias = "approvedRequests")]
    pub approved_requests: u64,
    #[serde(alias = "rejectedRequests")]
    pub rejected_requests: u64,
    /// 原始月度数据，格式由后端决定，交给 month_series 容错解析
    #[serde(alias = "monthlyData", alias = "monthly_data", alias = "monthlyStats")]
    pub monthly: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MonthPoint {
    pub month: u32,
    pub students: u64,
    pub staff: u64,
}

impl MonthPoint {
    pub fn label(&self) -> &'static str {
        MONTH_LABELS[(self.month.clamp(1, 12) - 1) as usize]
    }
}

impl DashboardSummary {
    pub fn month_series(&self) -> [MonthPoint; 12] {
        month_series(&self.monthly)
    }

    /// 请求总数：后端没给就用三种状态之和
    pub fn request_total(&self) -> u64 {
        if self.total_requests > 0 {
            self.total_requests
        } else {
            self.pending_requests + self.approved_requests + self.rejected_requests
        }
    }
}

/// 1-12 月补零，然后按角色叠加计数。月份越界或无法解析的条目直接忽略
pub fn month_series(entries: &[Value]) -> [MonthPoint; 12] {
    let mut series = [MonthPoint::default(); 12];
    for (i, p) in series.iter_mut().enumerate() {
        p.month = i as u32 + 1;
    }

    for entry in entries {
        let Some(month) = entry.get("month").and_then(month_of) else {
            continue;
        };
        let point = &mut series[(month - 1) as usize];

        // 形如 {month, role, count}
        if let Some(role) = entry.get("role").and_then(Value::as_str) {
            let count = entry.get("count").and_then(count_of).unwrap_or(0);
            match role.to_ascii_lowercase().as_str() {
                "student" | "students" => point.students += count,
                "staff" => point.staff += count,
                _ => {}
            }
            continue;
        }

        // 形如 {month, students, staff}
        for key in ["student", "students"] {
            if let Some(c) = entry.get(key).and_then(count_of) {
                point.students += c;
            }
        }
        if let Some(c) = entry.get("staff").and_then(count_of) {
            point.staff += c;
        }
    }
    series
}

fn month_of(v: &Value) -> Option<u32> {
    let n = match v {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => {
            let s = s.trim();
            // "2024-03" / "2024-03-01" 取月份部分
            let part = match s.split('-').nth(1) {
                Some(m) if s.len() >= 7 => m,
                _ => s,
            };
            part.parse::<i64>().ok()?
        }
        _ => return None,
    };
    (1..=12).contains(&n).then_some(n as u32)
}

fn count_of(v: &Value) -> Option<u64> {
    match v {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 百分比，分母为 0 时返回 0
pub fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 * 100.0 / total as f64
    }
}
