use super::{contains_ci, date_part, de_opt_string, de_string, RecordId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
            ApprovalStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApprovalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" | "p" => Ok(ApprovalStatus::Pending),
            "approved" | "approve" | "a" => Ok(ApprovalStatus::Approved),
            "rejected" | "reject" | "r" => Ok(ApprovalStatus::Rejected),
            _ => Err(format!("未知审批状态: {}", s)),
        }
    }
}

impl<'de> Deserialize<'de> for ApprovalStatus {
    fn deserialize<D>(d: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        match Option::<String>::deserialize(d)? {
            None => Ok(ApprovalStatus::Pending),
            Some(s) if s.trim().is_empty() => Ok(ApprovalStatus::Pending),
            Some(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 五级审批：导师 → 班主任 → 系主任 → 就业办 → 校长
///
/// 管理员可以以任意顺序把任意一级设为任意状态，客户端不做流转约束。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalStage {
    Mentor,
    ClassAdvisor,
    Hod,
    PlacementOfficer,
    Principal,
}

impl ApprovalStage {
    pub const ALL: [ApprovalStage; 5] = [
        ApprovalStage::Mentor,
        ApprovalStage::ClassAdvisor,
        ApprovalStage::Hod,
        ApprovalStage::PlacementOfficer,
        ApprovalStage::Principal,
    ];

    pub fn short_label(&self) -> &'static str {
        match self {
            ApprovalStage::Mentor => "Mentor",
            ApprovalStage::ClassAdvisor => "CA",
            ApprovalStage::Hod => "HOD",
            ApprovalStage::PlacementOfficer => "PO",
            ApprovalStage::Principal => "Principal",
        }
    }
}

impl FromStr for ApprovalStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_ascii_lowercase();
        let t = t.strip_suffix("_approval").unwrap_or(t.as_str());
        match t {
            "mentor" => Ok(ApprovalStage::Mentor),
            "ca" | "advisor" | "class_advisor" => Ok(ApprovalStage::ClassAdvisor),
            "hod" => Ok(ApprovalStage::Hod),
            "po" | "placement" | "placement_officer" => Ok(ApprovalStage::PlacementOfficer),
            "principal" => Ok(ApprovalStage::Principal),
            _ => Err(format!("未知审批环节: {}", s)),
        }
    }
}

/// 请假类型；后端新增的类型原样保留
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RequestType {
    #[default]
    Leave,
    OnDuty,
    Permission,
    Emergency,
    Other(String),
}

impl From<String> for RequestType {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "leave" => RequestType::Leave,
            "od" | "on_duty" | "onduty" => RequestType::OnDuty,
            "permission" => RequestType::Permission,
            "emergency" => RequestType::Emergency,
            _ => RequestType::Other(s),
        }
    }
}

impl From<RequestType> for String {
    fn from(t: RequestType) -> Self {
        match t {
            RequestType::Leave => "leave".to_string(),
            RequestType::OnDuty => "od".to_string(),
            RequestType::Permission => "permission".to_string(),
            RequestType::Emergency => "emergency".to_string(),
            RequestType::Other(s) => s,
        }
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from(self.clone()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaveRequest {
    #[serde(deserialize_with = "de_string")]
    pub request_id: String,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub student_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub staff_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub hod_name: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub sin_number: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub year: Option<String>,
    #[serde(default)]
    pub request_type: RequestType,
    #[serde(rename = "startDate", alias = "start_date", default)]
    pub start_date: String,
    #[serde(rename = "endDate", alias = "end_date", default)]
    pub end_date: String,
    #[serde(default)]
    pub reason: String,
    #[serde(rename = "reason_Details", alias = "reason_details", default)]
    pub reason_details: Option<String>,
    #[serde(default, alias = "mentorApproval")]
    pub mentor_approval: ApprovalStatus,
    #[serde(default, alias = "classAdvisorApproval")]
    pub class_advisor_approval: ApprovalStatus,
    #[serde(default, alias = "hodApproval")]
    pub hod_approval: ApprovalStatus,
    #[serde(default, alias = "placementOfficerApproval")]
    pub placement_officer_approval: ApprovalStatus,
    #[serde(default, alias = "principalApproval")]
    pub principal_approval: ApprovalStatus,
    #[serde(default)]
    pub photo: Option<Value>,
    /// 其余字段原样回传
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RecordId for LeaveRequest {
    const ID_KEY: &'static str = "request_id";
    const ID_FALLBACKS: &'static [&'static str] = &["id", "_id"];
}

impl LeaveRequest {
    pub fn requester_name(&self) -> &str {
        [&self.student_name, &self.staff_name, &self.hod_name]
            .into_iter()
            .filter_map(|o| o.as_deref())
            .find(|s| !s.trim().is_empty())
            .unwrap_or("-")
    }

    pub fn stage(&self, stage: ApprovalStage) -> ApprovalStatus {
        match stage {
            ApprovalStage::Mentor => self.mentor_approval,
            ApprovalStage::ClassAdvisor => self.class_advisor_approval,
            ApprovalStage::Hod => self.hod_approval,
            ApprovalStage::PlacementOfficer => self.placement_officer_approval,
            ApprovalStage::Principal => self.principal_approval,
        }
    }

    pub fn set_stage(&mut self, stage: ApprovalStage, status: ApprovalStatus) {
        let slot = match stage {
            ApprovalStage::Mentor => &mut self.mentor_approval,
            ApprovalStage::ClassAdvisor => &mut self.class_advisor_approval,
            ApprovalStage::Hod => &mut self.hod_approval,
            ApprovalStage::PlacementOfficer => &mut self.placement_officer_approval,
            ApprovalStage::Principal => &mut self.principal_approval,
        };
        *slot = status;
    }

    /// 汇总状态：任一环节拒绝即拒绝，全部通过才算通过
    pub fn overall_status(&self) -> ApprovalStatus {
        let stages = ApprovalStage::ALL.map(|s| self.stage(s));
        if stages.contains(&ApprovalStatus::Rejected) {
            ApprovalStatus::Rejected
        } else if stages.iter().all(|s| *s == ApprovalStatus::Approved) {
            ApprovalStatus::Approved
        } else {
            ApprovalStatus::Pending
        }
    }

    /// 编辑任意字段（包括强制设置审批环节）
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        if let Ok(stage) = key.parse::<ApprovalStage>() {
            self.set_stage(stage, value.parse()?);
            return Ok(());
        }
        let opt = |v: &str| {
            let v = v.trim();
            (!v.is_empty()).then(|| v.to_string())
        };
        match key.to_ascii_lowercase().as_str() {
            "student_name" => self.student_name = opt(value),
            "staff_name" => self.staff_name = opt(value),
            "hod_name" => self.hod_name = opt(value),
            "department" | "dept" => self.department = opt(value),
            "year" => self.year = opt(value),
            "type" | "request_type" => {
                if value.trim().is_empty() {
                    return Err("请假类型不能为空".to_string());
                }
                self.request_type = RequestType::from(value.to_string());
            }
            "start" | "startdate" | "start_date" => self.start_date = parse_date(value)?,
            "end" | "enddate" | "end_date" => self.end_date = parse_date(value)?,
            "reason" => self.reason = value.to_string(),
            "details" | "reason_details" => self.reason_details = opt(value),
            other => return Err(format!("未知请假字段: {}", other)),
        }
        Ok(())
    }

    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim();
        q.is_empty()
            || contains_ci(self.requester_name(), q)
            || contains_ci(&self.request_id, q)
            || contains_ci(&self.reason, q)
            || self
                .department
                .as_deref()
                .map(|d| contains_ci(d, q))
                .unwrap_or(false)
    }
}

fn parse_date(value: &str) -> Result<String, String> {
    NaiveDate::parse_from_str(date_part(value), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| format!("日期格式应为 YYYY-MM-DD: {}", value))
}

/// 构造 PUT 载荷：去掉 photo（体积大），去掉所有 null 字段
pub fn update_payload(req: &LeaveRequest) -> Map<String, Value> {
    let value = serde_json::to_value(req).unwrap_or(Value::Null);
    let mut map = match value {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.remove("photo");
    map.retain(|_, v| !v.is_null());
    map
}

/// 列表过滤条件，作为查询参数随刷新请求发出
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LeaveFilter {
    pub search: String,
    pub status: Option<ApprovalStatus>,
    pub request_type: Option<String>,
}

impl LeaveFilter {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if !self.search.trim().is_empty() {
            pairs.push(("search", self.search.trim().to_string()));
        }
        if let Some(status) = self.status {
            pairs.push(("status", status.as_str().to_string()));
        }
        if let Some(t) = self.request_type.as_deref().filter(|t| !t.trim().is_empty()) {
            pairs.push(("request_type", t.trim().to_string()));
        }
        pairs
    }

    pub fn is_empty(&self) -> bool {
        self.query_pairs().is_empty()
    }

    pub fn describe(&self) -> String {
        if self.is_empty() {
            return "全部".to_string();
        }
        self.query_pairs()
            .into_iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// 客户端分页：总页数至少为 1
pub fn page_count(len: usize, page_size: usize) -> usize {
    let size = page_size.max(1);
    len.div_ceil(size).max(1)
}

pub fn page_slice<T>(items: &[T], page: usize, page_size: usize) -> &[T] {
    let size = page_size.max(1);
    let page = page.min(page_count(items.len(), size) - 1);
    let start = (page * size).min(items.len());
    let end = (start + size).min(items.len());
    &items[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> LeaveRequest {
        serde_json::from_value(json!({
            "request_id": 42,
            "student_name": "",
            "staff_name": "K. Priya",
            "department": "ECE",
            "request_type": "OD",
            "startDate": "2024-07-01",
            "endDate": "2024-07-03",
            "reason": "Conference",
            "reason_Details": null,
            "mentor_approval": "approved",
            "photo": "aGVsbG8=",
            "remarks": null,
            "created_at": "2024-06-20T10:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn requester_name_skips_blank_fields() {
        assert_eq!(sample().requester_name(), "K. Priya");
        assert_eq!(LeaveRequest::default().requester_name(), "-");
    }

    #[test]
    fn update_payload_drops_photo_and_nulls() {
        let payload = update_payload(&sample());
        assert!(!payload.contains_key("photo"));
        assert!(payload.values().all(|v| !v.is_null()));
        assert!(!payload.contains_key("remarks"));
        assert!(!payload.contains_key("reason_Details"));
        assert_eq!(payload["created_at"], json!("2024-06-20T10:00:00Z"));
        assert_eq!(payload["request_type"], json!("od"));
        assert_eq!(payload["request_id"], json!("42"));
    }

    #[test]
    fn stages_can_be_set_out_of_order() {
        let mut req = sample();
        req.apply("principal", "approved").unwrap();
        req.apply("mentor", "rejected").unwrap();
        assert_eq!(req.stage(ApprovalStage::Principal), ApprovalStatus::Approved);
        assert_eq!(req.stage(ApprovalStage::Hod), ApprovalStatus::Pending);
        assert_eq!(req.overall_status(), ApprovalStatus::Rejected);
    }

    #[test]
    fn edit_rejects_bad_dates_and_unknown_fields() {
        let mut req = sample();
        assert!(req.apply("start", "01/07/2024").is_err());
        assert!(req.apply("colour", "red").is_err());
        req.apply("end", "2024-07-05T00:00:00Z").unwrap();
        assert_eq!(req.end_date, "2024-07-05");
    }

    #[test]
    fn filter_builds_query_pairs() {
        let filter = LeaveFilter {
            search: " priya ".into(),
            status: Some(ApprovalStatus::Pending),
            request_type: Some("".into()),
        };
        assert_eq!(
            filter.query_pairs(),
            vec![
                ("search", "priya".to_string()),
                ("status", "pending".to_string())
            ]
        );
        assert!(LeaveFilter::default().is_empty());
    }

    #[test]
    fn pagination_slices_and_clamps() {
        let items: Vec<u32> = (0..23).collect();
        assert_eq!(page_count(items.len(), 10), 3);
        assert_eq!(page_slice(&items, 2, 10), &[20, 21, 22]);
        assert_eq!(page_slice(&items, 9, 10), &[20, 21, 22]);
        assert_eq!(page_count(0, 10), 1);
        assert!(page_slice::<u32>(&[], 0, 10).is_empty());
    }
}
