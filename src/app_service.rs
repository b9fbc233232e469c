use crate::api::{AdminBackend, ApiError, ProgressFn, UploadFile};
use crate::app_state::AppEvent;
use crate::auth::AuthContext;
use crate::model::backup::download_filename;
use crate::model::deleted_user::sort_by_deleted_desc;
use crate::model::leave::update_payload;
use crate::model::{
    BackupType, CreateBackupRequest, Holiday, LeaveFilter, LeaveRequest, SemesterDetails,
    SystemConfig, UserForm,
};
use crate::scheduler::Frequency;
use crate::storage::repository::ScheduleRepository;
use chrono::{Local, NaiveTime};
use log::{error, info, warn};
use sea_orm::DatabaseConnection;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// 交给后台服务执行的请求，每个都对应一次（或一组）后端调用
#[derive(Debug, Clone)]
pub enum ServiceRequest {
    LoadDashboard,

    LoadUsers,
    CreateUser(UserForm),
    UpdateUser { sin: String, form: UserForm },
    DeleteUser { sin: String },
    ImportUsers { path: PathBuf },

    LoadLeaveRequests(LeaveFilter),
    UpdateLeaveRequest { request: LeaveRequest, filter: LeaveFilter },
    DeleteLeaveRequest { request_id: String, filter: LeaveFilter },

    LoadDeviceLogs,
    UploadDeviceLogs { path: PathBuf },
    ClearDeviceLogs,

    LoadDeletedUsers,
    RestoreUser { sin: String },
    PurgeUser { sin: String },

    LoadBackups,
    CreateBackup { backup_type: BackupType, description: String },
    RestoreBackup { id: String },
    DeleteBackup { id: String },
    DownloadBackup { id: String },
    LoadSchedule,
    SetSchedule { enabled: bool, frequency: Frequency, time: NaiveTime },

    LoadSystemConfig,
    SaveSystemConfig(SystemConfig),
    LoadSemester,
    SaveSemester(SemesterDetails),
    LoadHolidays,
    SaveHolidays(Vec<Holiday>),
    DeleteHoliday { id: String },
    ClearHolidays,
    UploadHolidays { path: PathBuf },

    SaveProfilePhoto { path: PathBuf, bytes: Vec<u8> },
}

/// 后台服务：串起校验、后端调用、结果通知和修改后的重新加载
pub struct AdminService {
    backend: Arc<dyn AdminBackend>,
    auth: AuthContext,
    db: Option<Arc<DatabaseConnection>>,
    evt_tx: mpsc::UnboundedSender<AppEvent>,
    download_dir: PathBuf,
}

impl AdminService {
    pub fn new(
        backend: Arc<dyn AdminBackend>,
        auth: AuthContext,
        db: Option<Arc<DatabaseConnection>>,
        evt_tx: mpsc::UnboundedSender<AppEvent>,
        download_dir: PathBuf,
    ) -> Self {
        Self {
            backend,
            auth,
            db,
            evt_tx,
            download_dir,
        }
    }

    /// 启动 actor：每个请求单独起一个任务，界面不会被慢请求卡住
    pub fn spawn(
        self: Arc<Self>,
        mut req_rx: mpsc::UnboundedReceiver<ServiceRequest>,
    ) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(req) = req_rx.recv().await {
                let svc = self.clone();
                tokio::spawn(async move {
                    svc.handle(req).await;
                });
            }
            info!("service channel closed");
        })
    }

    fn send(&self, evt: AppEvent) {
        let _ = self.evt_tx.send(evt);
    }

    fn ok(&self, msg: impl AsRef<str>) {
        self.send(AppEvent::Message(format!("✓ {}", msg.as_ref())));
    }

    fn fail(&self, action: &str, err: &ApiError) {
        if err.is_validation() {
            self.send(AppEvent::Error(format!("⚠ {}", err)));
        } else {
            error!("{} 失败: {}", action, err);
            self.send(AppEvent::Error(format!("✗ {}失败: {}", action, err)));
        }
    }

    pub async fn handle(&self, req: ServiceRequest) {
        match req {
            ServiceRequest::LoadDashboard => self.refresh_dashboard().await,

            ServiceRequest::LoadUsers => self.refresh_users().await,
            ServiceRequest::CreateUser(form) => {
                match self.save_user(None, &form).await {
                    Ok(msg) => self.ok(msg),
                    Err(e) => return self.fail("创建用户", &e),
                }
                self.refresh_users().await;
            }
            ServiceRequest::UpdateUser { sin, form } => {
                match self.save_user(Some(&sin), &form).await {
                    Ok(msg) => self.ok(msg),
                    Err(e) => return self.fail("更新用户", &e),
                }
                self.refresh_users().await;
            }
            ServiceRequest::DeleteUser { sin } => {
                let actor = self.auth.actor_id();
                match self.backend.delete_user(&sin, &actor).await {
                    Ok(msg) => self.ok(format!("{} ({})", msg, sin)),
                    Err(e) => self.fail("删除用户", &e),
                }
                self.refresh_users().await;
            }
            ServiceRequest::ImportUsers { path } => {
                let result = async {
                    let file = UploadFile::from_path(&path).await?;
                    self.backend.bulk_upload_users(file).await
                }
                .await;
                match result {
                    Ok(n) => self.ok(format!("{} users created", n)),
                    Err(e) => return self.fail("批量导入用户", &e),
                }
                self.refresh_users().await;
            }

            ServiceRequest::LoadLeaveRequests(filter) => self.refresh_leave(&filter).await,
            ServiceRequest::UpdateLeaveRequest { request, filter } => {
                let payload = update_payload(&request);
                match self
                    .backend
                    .update_leave_request(&request.request_id, payload)
                    .await
                {
                    Ok(msg) => self.ok(msg),
                    Err(e) => self.fail("更新请假申请", &e),
                }
                self.refresh_leave(&filter).await;
            }
            ServiceRequest::DeleteLeaveRequest { request_id, filter } => {
                match self.backend.delete_leave_request(&request_id).await {
                    Ok(msg) => self.ok(msg),
                    Err(e) => self.fail("删除请假申请", &e),
                }
                self.refresh_leave(&filter).await;
            }

            ServiceRequest::LoadDeviceLogs => self.refresh_device_logs().await,
            ServiceRequest::UploadDeviceLogs { path } => {
                self.upload_device_logs(&path).await;
                self.refresh_device_logs().await;
            }
            ServiceRequest::ClearDeviceLogs => {
                match self.backend.delete_all_device_logs().await {
                    Ok(msg) => self.ok(msg),
                    Err(e) => self.fail("清空设备日志", &e),
                }
                self.refresh_device_logs().await;
            }

            ServiceRequest::LoadDeletedUsers => self.refresh_deleted().await,
            ServiceRequest::RestoreUser { sin } => {
                match self.backend.restore_user(&sin).await {
                    Ok(msg) => self.ok(msg),
                    Err(e) => self.fail("恢复用户", &e),
                }
                self.refresh_deleted().await;
            }
            ServiceRequest::PurgeUser { sin } => {
                match self.backend.purge_user(&sin).await {
                    Ok(msg) => self.ok(msg),
                    Err(e) => self.fail("彻底删除用户", &e),
                }
                self.refresh_deleted().await;
            }

            ServiceRequest::LoadBackups => self.refresh_backups().await,
            ServiceRequest::CreateBackup {
                backup_type,
                description,
            } => {
                let req =
                    CreateBackupRequest::new(backup_type, description, Local::now().naive_local());
                match self.backend.create_backup(&req).await {
                    Ok(msg) => self.ok(format!("{} ({})", msg, req.name)),
                    Err(e) => self.fail("创建备份", &e),
                }
                self.refresh_backups().await;
            }
            ServiceRequest::RestoreBackup { id } => {
                match self.backend.restore_backup(&id).await {
                    Ok(msg) => self.ok(msg),
                    Err(e) => self.fail("恢复备份", &e),
                }
                self.refresh_backups().await;
            }
            ServiceRequest::DeleteBackup { id } => {
                match self.backend.delete_backup(&id).await {
                    Ok(msg) => self.ok(msg),
                    Err(e) => self.fail("删除备份", &e),
                }
                self.refresh_backups().await;
            }
            ServiceRequest::DownloadBackup { id } => match self.download_backup(&id).await {
                Ok(path) => self.ok(format!("备份已下载到 {}", path.display())),
                Err(e) => self.fail("下载备份", &e),
            },
            ServiceRequest::LoadSchedule => self.load_schedule().await,
            ServiceRequest::SetSchedule {
                enabled,
                frequency,
                time,
            } => self.set_schedule(enabled, frequency, time).await,

            ServiceRequest::LoadSystemConfig => self.refresh_system_config().await,
            ServiceRequest::SaveSystemConfig(cfg) => {
                let result = match cfg.validate() {
                    Ok(()) => self.backend.save_system_config(&cfg).await,
                    Err(msg) => Err(ApiError::validation(msg)),
                };
                match result {
                    Ok(msg) => self.ok(msg),
                    Err(e) => return self.fail("保存考勤规则", &e),
                }
                self.refresh_system_config().await;
            }
            ServiceRequest::LoadSemester => self.refresh_semester().await,
            ServiceRequest::SaveSemester(sem) => {
                let result = match sem.validate() {
                    Ok(()) => self.backend.save_semester_details(&sem).await,
                    Err(msg) => Err(ApiError::validation(msg)),
                };
                match result {
                    Ok(msg) => self.ok(msg),
                    Err(e) => return self.fail("保存学期信息", &e),
                }
                self.refresh_semester().await;
            }
            ServiceRequest::LoadHolidays => self.refresh_holidays().await,
            ServiceRequest::SaveHolidays(rows) => self.save_holidays(rows).await,
            ServiceRequest::DeleteHoliday { id } => {
                match self.backend.delete_holiday(&id).await {
                    Ok(msg) => self.ok(msg),
                    Err(e) => self.fail("删除节假日", &e),
                }
                self.refresh_holidays().await;
            }
            ServiceRequest::ClearHolidays => {
                match self.backend.delete_all_holidays().await {
                    Ok(msg) => self.ok(msg),
                    Err(e) => self.fail("清空节假日", &e),
                }
                self.refresh_holidays().await;
            }
            ServiceRequest::UploadHolidays { path } => {
                let result = async {
                    let file = UploadFile::from_path(&path).await?;
                    self.backend.upload_holidays(file).await
                }
                .await;
                match result {
                    Ok(msg) => self.ok(msg),
                    Err(e) => return self.fail("导入节假日", &e),
                }
                self.refresh_holidays().await;
            }

            ServiceRequest::SaveProfilePhoto { path, bytes } => {
                match tokio::fs::write(&path, &bytes).await {
                    Ok(()) => self.ok(format!(
                        "头像已保存到 {} ({} bytes)",
                        path.display(),
                        bytes.len()
                    )),
                    Err(e) => self.fail("保存头像", &ApiError::Io(e)),
                }
            }
        }
    }

    async fn save_user(&self, sin: Option<&str>, form: &UserForm) -> Result<String, ApiError> {
        form.validate(sin.is_none()).map_err(ApiError::validation)?;
        let photo = match &form.photo_path {
            Some(path) => Some(UploadFile::from_path(path).await?),
            None => None,
        };
        match sin {
            None => self.backend.create_user(form, photo).await,
            Some(sin) => self.backend.update_user(sin, form, photo).await,
        }
    }

    async fn upload_device_logs(&self, path: &Path) {
        let file = match UploadFile::from_path(path).await {
            Ok(f) => f,
            Err(e) => return self.fail("读取上传文件", &e),
        };
        let tx = self.evt_tx.clone();
        let progress: ProgressFn = Arc::new(move |p| {
            let _ = tx.send(AppEvent::UploadProgress(Some(p)));
        });
        self.send(AppEvent::UploadProgress(Some(0)));
        let result = self.backend.upload_device_logs(file, progress).await;
        self.send(AppEvent::UploadProgress(None));
        match result {
            Ok(msg) => self.ok(msg),
            Err(e) => self.fail("上传设备日志", &e),
        }
    }

    async fn download_backup(&self, id: &str) -> Result<PathBuf, ApiError> {
        let download = self.backend.download_backup(id).await?;
        let name = download_filename(
            download.content_disposition.as_deref(),
            id,
            Local::now().date_naive(),
        );
        tokio::fs::create_dir_all(&self.download_dir).await?;
        let path = self.download_dir.join(name);
        tokio::fs::write(&path, &download.bytes).await?;
        info!("backup {} saved to {} ({} bytes)", id, path.display(), download.bytes.len());
        Ok(path)
    }

    /// 逐行顺序保存，单行失败不影响其余行
    async fn save_holidays(&self, rows: Vec<Holiday>) {
        if rows.is_empty() {
            self.send(AppEvent::Message("没有待保存的节假日修改".to_string()));
            return;
        }
        let mut saved = 0usize;
        let mut failed: Vec<Holiday> = Vec::new();
        let mut reasons: Vec<String> = Vec::new();
        for row in rows {
            match self.backend.update_holiday(&row).await {
                Ok(_) => saved += 1,
                Err(e) => {
                    warn!("holiday {} 保存失败: {}", row.id, e);
                    reasons.push(format!("{}({})", row.id, e));
                    failed.push(row);
                }
            }
        }
        if saved > 0 {
            self.ok(format!("已保存 {} 条节假日", saved));
        }
        if !failed.is_empty() {
            self.send(AppEvent::Error(format!(
                "✗ {} 条节假日保存失败: {}",
                failed.len(),
                reasons.join(", ")
            )));
        }
        match self.backend.list_holidays().await {
            Ok(list) => self.send(AppEvent::HolidaysSaved { list, failed }),
            Err(e) => self.fail("加载节假日", &e),
        }
    }

    async fn load_schedule(&self) {
        let Some(db) = &self.db else {
            return;
        };
        match ScheduleRepository::load(db, Local::now().naive_local()).await {
            Ok(s) => self.send(AppEvent::Schedule(s)),
            Err(e) => self.send(AppEvent::Error(format!("✗ 读取定时备份设置失败: {}", e))),
        }
    }

    async fn set_schedule(&self, enabled: bool, frequency: Frequency, time: NaiveTime) {
        let Some(db) = &self.db else {
            self.send(AppEvent::Error(
                "✗ 本地数据库不可用，无法保存定时备份".to_string(),
            ));
            return;
        };
        let now = Local::now().naive_local();
        match ScheduleRepository::save(db, enabled, frequency, time, now).await {
            Ok(s) => {
                self.ok(s.describe());
                self.send(AppEvent::Schedule(s));
            }
            Err(e) => self.send(AppEvent::Error(format!("✗ 保存定时备份失败: {}", e))),
        }
    }

    async fn refresh_dashboard(&self) {
        match self.backend.dashboard_summary().await {
            Ok(s) => self.send(AppEvent::Dashboard(Some(s))),
            Err(e) => {
                self.fail("加载仪表盘", &e);
                self.send(AppEvent::Dashboard(None));
            }
        }
    }

    async fn refresh_users(&self) {
        match self.backend.list_users().await {
            Ok(list) => self.send(AppEvent::Users(list)),
            Err(e) => self.fail("加载用户", &e),
        }
    }

    async fn refresh_leave(&self, filter: &LeaveFilter) {
        match self.backend.list_leave_requests(filter).await {
            Ok(list) => self.send(AppEvent::LeaveRequests(list)),
            Err(e) => self.fail("加载请假申请", &e),
        }
    }

    async fn refresh_device_logs(&self) {
        match self.backend.list_device_logs().await {
            Ok(rows) => self.send(AppEvent::DeviceLogs(rows)),
            Err(e) => self.fail("加载设备日志", &e),
        }
    }

    async fn refresh_deleted(&self) {
        match self.backend.list_deleted_users().await {
            Ok(mut list) => {
                sort_by_deleted_desc(&mut list);
                self.send(AppEvent::DeletedUsers(list));
            }
            Err(e) => self.fail("加载已删除用户", &e),
        }
    }

    async fn refresh_backups(&self) {
        match self.backend.list_backups().await {
            Ok(list) => self.send(AppEvent::Backups(list)),
            Err(e) => self.fail("加载备份列表", &e),
        }
    }

    async fn refresh_system_config(&self) {
        match self.backend.system_config().await {
            Ok(cfg) => self.send(AppEvent::SystemConfig(cfg)),
            Err(e) => self.fail("加载考勤规则", &e),
        }
    }

    async fn refresh_semester(&self) {
        match self.backend.semester_details().await {
            Ok(sem) => self.send(AppEvent::Semester(sem)),
            Err(e) => self.fail("加载学期信息", &e),
        }
    }

    async fn refresh_holidays(&self) {
        match self.backend.list_holidays().await {
            Ok(list) => self.send(AppEvent::Holidays(list)),
            Err(e) => self.fail("加载节假日", &e),
        }
    }
}
