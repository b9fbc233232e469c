use crate::api::AdminBackend;
use crate::app_state::AppEvent;
use crate::model::{BackupType, CreateBackupRequest};
use crate::storage::repository::ScheduleRepository;
use chrono::{Local, NaiveDateTime};
use log::{error, info, warn};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

pub const SCHEDULED_DESCRIPTION: &str = "Scheduled backup";
const TICK: Duration = Duration::from_secs(30);

/// 定时备份：每 30 秒检查一次是否到点
pub struct BackupScheduler {
    db: Arc<DatabaseConnection>,
    backend: Arc<dyn AdminBackend>,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
}

impl BackupScheduler {
    pub fn new(
        db: Arc<DatabaseConnection>,
        backend: Arc<dyn AdminBackend>,
        evt_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            db,
            backend,
            evt_tx,
        }
    }

    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                self.tick(Local::now().naive_local()).await;
                sleep(TICK).await;
            }
        })
    }

    /// 到点就执行一次完整备份，返回是否执行了
    pub async fn tick(&self, now: NaiveDateTime) -> bool {
        let schedule = match ScheduleRepository::load(&self.db, now).await {
            Ok(s) => s,
            Err(e) => {
                warn!("读取定时备份设置失败: {}", e);
                return false;
            }
        };
        if !schedule.is_due(now) {
            return false;
        }

        info!("⏰ 定时备份到点: {}", schedule.describe());
        let req = CreateBackupRequest::new(BackupType::Full, SCHEDULED_DESCRIPTION, now);
        match self.backend.create_backup(&req).await {
            Ok(msg) => {
                let _ = self
                    .evt_tx
                    .send(AppEvent::Message(format!("✓ 定时备份完成: {}", msg)));
            }
            Err(e) => {
                error!("定时备份失败: {}", e);
                let _ = self
                    .evt_tx
                    .send(AppEvent::Error(format!("✗ 定时备份失败: {}", e)));
            }
        }

        // 失败也记为已执行，下个周期再试
        if let Err(e) = ScheduleRepository::mark_ran(&self.db, now).await {
            warn!("记录定时备份时间失败: {}", e);
        }
        if let Ok(updated) = ScheduleRepository::load(&self.db, now).await {
            let _ = self.evt_tx.send(AppEvent::Schedule(updated));
        }
        match self.backend.list_backups().await {
            Ok(list) => {
                let _ = self.evt_tx.send(AppEvent::Backups(list));
            }
            Err(e) => {
                let _ = self
                    .evt_tx
                    .send(AppEvent::Error(format!("✗ 刷新备份列表失败: {}", e)));
            }
        }
        true
    }
}
