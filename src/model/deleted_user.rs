use super::{contains_ci, de_opt_string, de_string};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// 软删除的用户（只读，可恢复或彻底删除）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeletedUser {
    #[serde(deserialize_with = "de_string")]
    pub sin_number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default, alias = "phone_number", deserialize_with = "de_opt_string")]
    pub phone: Option<String>,
    #[serde(default, alias = "deletedAt", deserialize_with = "de_opt_string")]
    pub deleted_at: Option<String>,
}

impl DeletedUser {
    pub fn deleted_at_ts(&self) -> Option<DateTime<Utc>> {
        self.deleted_at.as_deref().and_then(parse_timestamp)
    }

    pub fn matches(&self, query: &str) -> bool {
        let q = query.trim();
        q.is_empty()
            || contains_ci(&self.sin_number, q)
            || contains_ci(&self.name, q)
            || contains_ci(&self.email, q)
            || contains_ci(&self.role, q)
    }
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|n| n.and_utc())
}

/// 按删除时间倒序；没有时间的排在最后
pub fn sort_by_deleted_desc(users: &mut [DeletedUser]) {
    users.sort_by(|a, b| match (a.deleted_at_ts(), b.deleted_at_ts()) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(sin: &str, at: Option<&str>) -> DeletedUser {
        DeletedUser {
            sin_number: sin.to_string(),
            deleted_at: at.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn newest_deletion_first_missing_last() {
        let mut list = vec![
            user("a", Some("2024-01-01T10:00:00Z")),
            user("b", None),
            user("c", Some("2024-03-05 08:00:00")),
            user("d", Some("2024-02-01")),
        ];
        sort_by_deleted_desc(&mut list);
        let order: Vec<&str> = list.iter().map(|u| u.sin_number.as_str()).collect();
        assert_eq!(order, vec!["c", "d", "a", "b"]);
    }

    #[test]
    fn search_is_case_insensitive() {
        let mut u = user("SIN77", None);
        u.email = "Kavya@college.edu".into();
        assert!(u.matches("kavya"));
        assert!(u.matches("sin7"));
        assert!(!u.matches("ravi"));
    }
}
