use crate::scheduler::model::{parse_time_of_day, BackupSchedule, Frequency};
use crate::storage::entity::backup_schedule::{
    self, ActiveModel as BackupScheduleActiveModel, Entity as BackupScheduleEntity,
};
use chrono::{DateTime, NaiveDateTime};
use log::warn;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

const SCHEDULE_ID: i32 = 1;

/// 本地时间按“伪 UTC”存成秒数，读写对称即可
fn to_ts(t: NaiveDateTime) -> i64 {
    t.and_utc().timestamp()
}

fn from_ts(ts: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(ts, 0).map(|d| d.naive_utc())
}

impl From<backup_schedule::Model> for BackupSchedule {
    fn from(m: backup_schedule::Model) -> Self {
        let frequency = m.frequency.parse().unwrap_or_else(|e| {
            warn!("备份频率无效，按 daily 处理: {}", e);
            Frequency::Daily
        });
        let time_of_day = parse_time_of_day(&m.time_of_day).unwrap_or_default();
        BackupSchedule {
            enabled: m.enabled,
            frequency,
            time_of_day,
            last_run: m.last_run_at.and_then(from_ts),
            updated_at: from_ts(m.updated_at).unwrap_or_default(),
        }
    }
}

pub struct ScheduleRepository;

impl ScheduleRepository {
    /// 没有记录时返回关闭状态
    pub async fn load(
        db: &DatabaseConnection,
        now: NaiveDateTime,
    ) -> Result<BackupSchedule, sea_orm::DbErr> {
        let row = BackupScheduleEntity::find_by_id(SCHEDULE_ID).one(db).await?;
        Ok(row
            .map(BackupSchedule::from)
            .unwrap_or_else(|| BackupSchedule::disabled(now)))
    }

    /// 保存设置。修改设置会清掉上次执行时间，从 now 重新计算
    pub async fn save(
        db: &DatabaseConnection,
        enabled: bool,
        frequency: Frequency,
        time_of_day: chrono::NaiveTime,
        now: NaiveDateTime,
    ) -> Result<BackupSchedule, sea_orm::DbErr> {
        let existing = BackupScheduleEntity::find_by_id(SCHEDULE_ID).one(db).await?;
        let model = BackupScheduleActiveModel {
            id: Set(SCHEDULE_ID),
            enabled: Set(enabled),
            frequency: Set(frequency.as_str().to_string()),
            time_of_day: Set(time_of_day.format("%H:%M").to_string()),
            last_run_at: Set(None),
            updated_at: Set(to_ts(now)),
        };
        let saved = if existing.is_some() {
            model.update(db).await?
        } else {
            model.insert(db).await?
        };
        Ok(saved.into())
    }

    pub async fn mark_ran(
        db: &DatabaseConnection,
        at: NaiveDateTime,
    ) -> Result<(), sea_orm::DbErr> {
        let update = BackupScheduleActiveModel {
            id: Set(SCHEDULE_ID),
            last_run_at: Set(Some(to_ts(at))),
            updated_at: Set(to_ts(at)),
            ..Default::default()
        };
        update.update(db).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::establish_connection;
    use chrono::{NaiveDate, NaiveTime};

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    async fn temp_db() -> (tempfile::TempDir, DatabaseConnection) {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("console.db").display());
        let db = establish_connection(&url).await.unwrap();
        (dir, db)
    }

    #[tokio::test]
    async fn empty_table_means_disabled() {
        let (_dir, db) = temp_db().await;
        let s = ScheduleRepository::load(&db, at(1, 0)).await.unwrap();
        assert!(!s.enabled);
        assert_eq!(s.next_due(), None);
    }

    #[tokio::test]
    async fn save_then_mark_ran_moves_next_due() {
        let (_dir, db) = temp_db().await;
        let two_am = NaiveTime::from_hms_opt(2, 0, 0).unwrap();
        let saved = ScheduleRepository::save(&db, true, Frequency::Weekly, two_am, at(1, 12))
            .await
            .unwrap();
        assert_eq!(saved.next_due(), Some(at(2, 2)));

        ScheduleRepository::mark_ran(&db, at(2, 2)).await.unwrap();
        let loaded = ScheduleRepository::load(&db, at(2, 3)).await.unwrap();
        assert_eq!(loaded.frequency, Frequency::Weekly);
        assert_eq!(loaded.last_run, Some(at(2, 2)));
        assert_eq!(loaded.next_due(), Some(at(9, 2)));

        // 再次保存会覆盖而不是新增
        let off = ScheduleRepository::save(&db, false, Frequency::Daily, two_am, at(3, 0))
            .await
            .unwrap();
        assert!(!off.enabled);
        assert_eq!(off.last_run, None);
    }

    #[tokio::test]
    async fn in_memory_database_keeps_schema() {
        let db = establish_connection("sqlite::memory:").await.unwrap();
        let s = ScheduleRepository::load(&db, at(1, 0)).await.unwrap();
        assert!(!s.enabled);
    }
}
