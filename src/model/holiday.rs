use super::{date_part, de_opt_string, de_string, RecordId};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Holiday {
    #[serde(deserialize_with = "de_string")]
    pub id: String,
    #[serde(default, deserialize_with = "de_string")]
    pub date: String,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub day: Option<String>,
    #[serde(default, alias = "holiday_reason", alias = "description")]
    pub reason: String,
}

impl RecordId for Holiday {
    const ID_KEY: &'static str = "id";
    const ID_FALLBACKS: &'static [&'static str] = &["_id", "holiday_id"];
}

impl Holiday {
    pub fn display_date(&self) -> &str {
        date_part(&self.date)
    }

    /// 行内编辑。改日期时星期同步重算
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key.to_ascii_lowercase().as_str() {
            "date" => {
                let date = NaiveDate::parse_from_str(date_part(value), "%Y-%m-%d")
                    .map_err(|_| format!("日期格式应为 YYYY-MM-DD: {}", value))?;
                self.date = date.format("%Y-%m-%d").to_string();
                self.day = Some(date.format("%A").to_string());
            }
            "day" => self.day = Some(value.trim().to_string()),
            "reason" => {
                if value.trim().is_empty() {
                    return Err("节假日原因不能为空".to_string());
                }
                self.reason = value.trim().to_string();
            }
            other => return Err(format!("未知节假日字段: {}", other)),
        }
        Ok(())
    }

    pub fn to_update_body(&self) -> serde_json::Value {
        serde_json::json!({
            "date": self.display_date(),
            "day": self.day,
            "reason": self.reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_edit_recomputes_day() {
        let mut h = Holiday {
            id: "1".into(),
            date: "2024-08-15T00:00:00Z".into(),
            day: Some("Thursday".into()),
            reason: "Independence Day".into(),
        };
        assert_eq!(h.display_date(), "2024-08-15");
        h.apply("date", "2024-10-02").unwrap();
        assert_eq!(h.day.as_deref(), Some("Wednesday"));
        assert!(h.apply("date", "02-10-2024").is_err());
        assert!(h.apply("reason", " ").is_err());
    }

    #[test]
    fn decodes_mongo_style_ids() {
        let mut row = serde_json::json!({"_id": "abc", "date": "2024-01-26", "reason": "Republic Day"});
        crate::model::normalize_id::<Holiday>(&mut row);
        let h: Holiday = serde_json::from_value(row).unwrap();
        assert_eq!(h.id, "abc");
        assert_eq!(h.day, None);
    }
}
