use super::date_part;
use chrono::NaiveDate;
use serde_json::{json, Value};

/// 学期信息；total_days 只读，由起止日期推导
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SemesterDetails {
    pub name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    total_days: Option<i64>,
}

impl SemesterDetails {
    pub fn new(name: impl Into<String>, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        let mut s = Self {
            name: name.into(),
            start_date: start,
            end_date: end,
            total_days: None,
        };
        s.recompute();
        s
    }

    pub fn total_days(&self) -> Option<i64> {
        self.total_days
    }

    pub fn set_start(&mut self, date: Option<NaiveDate>) {
        self.start_date = date;
        self.recompute();
    }

    pub fn set_end(&mut self, date: Option<NaiveDate>) {
        self.end_date = date;
        self.recompute();
    }

    fn recompute(&mut self) {
        self.total_days = match (self.start_date, self.end_date) {
            (Some(s), Some(e)) => Some((e - s).num_days()),
            _ => None,
        };
    }

    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key.to_ascii_lowercase().replace('_', "").as_str() {
            "name" => self.name = value.trim().to_string(),
            "start" | "startdate" => self.set_start(parse_date_opt(value)?),
            "end" | "enddate" => self.set_end(parse_date_opt(value)?),
            "totaldays" => return Err("totalDays 由起止日期自动计算，不能直接修改".to_string()),
            other => return Err(format!("未知学期字段: {}", other)),
        }
        Ok(())
    }

    /// 结束早于开始时拒绝保存，不做截断
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("学期名称不能为空".to_string());
        }
        let (Some(start), Some(end)) = (self.start_date, self.end_date) else {
            return Err("请填写学期开始和结束日期".to_string());
        };
        if end < start {
            return Err(format!(
                "结束日期 {} 早于开始日期 {}",
                end.format("%Y-%m-%d"),
                start.format("%Y-%m-%d")
            ));
        }
        Ok(())
    }

    pub fn to_wire(&self) -> Value {
        let fmt = |d: Option<NaiveDate>| d.map(|d| d.format("%Y-%m-%d").to_string());
        json!({
            "name": self.name,
            "startDate": fmt(self.start_date),
            "endDate": fmt(self.end_date),
            "totalDays": self.total_days,
        })
    }

    pub fn from_wire(v: &Value) -> Self {
        let pick = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| v.get(*k).and_then(Value::as_str))
                .map(str::to_string)
        };
        let date = |keys: &[&str]| {
            pick(keys).and_then(|s| NaiveDate::parse_from_str(date_part(&s), "%Y-%m-%d").ok())
        };
        SemesterDetails::new(
            pick(&["name", "semester_name", "semesterName"]).unwrap_or_default(),
            date(&["startDate", "start_date"]),
            date(&["endDate", "end_date"]),
        )
    }
}

fn parse_date_opt(value: &str) -> Result<Option<NaiveDate>, String> {
    let v = value.trim();
    if v.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(date_part(v), "%Y-%m-%d")
        .map(Some)
        .map_err(|_| format!("日期格式应为 YYYY-MM-DD: {}", v))
}
