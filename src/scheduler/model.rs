use chrono::{Days, Months, NaiveDateTime, NaiveTime};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    #[default]
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }

    /// 在某个时间点上前进一个周期
    fn advance(&self, from: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            Frequency::Daily => from.checked_add_days(Days::new(1)),
            Frequency::Weekly => from.checked_add_days(Days::new(7)),
            Frequency::Monthly => from.checked_add_months(Months::new(1)),
        }
    }
}

impl FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Frequency::Daily),
            "weekly" | "week" | "w" => Ok(Frequency::Weekly),
            "monthly" | "month" | "m" => Ok(Frequency::Monthly),
            other => Err(format!("未知备份频率: {} (daily/weekly/monthly)", other)),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn parse_time_of_day(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M")
        .map_err(|_| format!("时间格式应为 HH:MM: {}", s.trim()))
}

/// 定时备份设置。所有时间都是本地墙上时间
#[derive(Debug, Clone, PartialEq)]
pub struct BackupSchedule {
    pub enabled: bool,
    pub frequency: Frequency,
    pub time_of_day: NaiveTime,
    pub last_run: Option<NaiveDateTime>,
    /// 最近一次修改设置的时间，首次执行从这里开始算
    pub updated_at: NaiveDateTime,
}

impl BackupSchedule {
    pub fn disabled(now: NaiveDateTime) -> Self {
        Self {
            enabled: false,
            frequency: Frequency::Daily,
            time_of_day: NaiveTime::MIN,
            last_run: None,
            updated_at: now,
        }
    }

    /// 下次应执行的时间；未启用时为 None
    pub fn next_due(&self) -> Option<NaiveDateTime> {
        if !self.enabled {
            return None;
        }
        match self.last_run {
            Some(last) => {
                let next = self.frequency.advance(last)?;
                Some(next.date().and_time(self.time_of_day))
            }
            None => {
                // 修改设置之后第一次到达 time_of_day 的时刻
                let today = self.updated_at.date().and_time(self.time_of_day);
                if today >= self.updated_at {
                    Some(today)
                } else {
                    today.checked_add_days(Days::new(1))
                }
            }
        }
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        self.next_due().is_some_and(|due| now >= due)
    }

    pub fn describe(&self) -> String {
        if !self.enabled {
            return "定时备份: 关闭".to_string();
        }
        let next = self
            .next_due()
            .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        format!(
            "定时备份: {} {} (下次 {})",
            self.frequency,
            self.time_of_day.format("%H:%M"),
            next
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn schedule(freq: Frequency, time: &str, last: Option<NaiveDateTime>) -> BackupSchedule {
        BackupSchedule {
            enabled: true,
            frequency: freq,
            time_of_day: parse_time_of_day(time).unwrap(),
            last_run: last,
            updated_at: at(2024, 5, 10, 12, 0),
        }
    }

    #[test]
    fn first_run_waits_for_next_slot() {
        let s = schedule(Frequency::Daily, "02:00", None);
        assert_eq!(s.next_due(), Some(at(2024, 5, 11, 2, 0)));
        assert!(!s.is_due(at(2024, 5, 10, 23, 59)));
        assert!(s.is_due(at(2024, 5, 11, 2, 0)));

        let later_today = schedule(Frequency::Daily, "18:30", None);
        assert_eq!(later_today.next_due(), Some(at(2024, 5, 10, 18, 30)));
    }

    #[test]
    fn next_due_follows_frequency() {
        let last = Some(at(2024, 1, 31, 2, 5));
        assert_eq!(
            schedule(Frequency::Daily, "02:00", last).next_due(),
            Some(at(2024, 2, 1, 2, 0))
        );
        assert_eq!(
            schedule(Frequency::Weekly, "02:00", last).next_due(),
            Some(at(2024, 2, 7, 2, 0))
        );
        // 1 月 31 日加一个月落到 2 月最后一天
        assert_eq!(
            schedule(Frequency::Monthly, "02:00", last).next_due(),
            Some(at(2024, 2, 29, 2, 0))
        );
    }

    #[test]
    fn disabled_is_never_due() {
        let s = BackupSchedule::disabled(at(2024, 1, 1, 0, 0));
        assert_eq!(s.next_due(), None);
        assert!(!s.is_due(at(2030, 1, 1, 0, 0)));
        assert_eq!(s.describe(), "定时备份: 关闭");
    }

    #[test]
    fn parses_frequency_and_time() {
        assert_eq!("Weekly".parse::<Frequency>(), Ok(Frequency::Weekly));
        assert!("hourly".parse::<Frequency>().is_err());
        assert!(parse_time_of_day("25:00").is_err());
        assert!(parse_time_of_day("07:05").is_ok());
    }
}
