//! 测试用的内存后端，记录每一次调用

use super::backend::{AdminBackend, Download, ProgressFn, UploadFile};
use super::error::ApiError;
use crate::model::{
    Backup, CreateBackupRequest, DashboardSummary, DeletedUser, DeviceLogRow, Holiday,
    LeaveFilter, LeaveRequest, SemesterDetails, SystemConfig, User, UserForm,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::sync::Mutex;

#[derive(Default)]
pub struct FakeBackend {
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<String>>,
    pub dashboard: Mutex<DashboardSummary>,
    pub users: Mutex<Vec<User>>,
    pub leave_requests: Mutex<Vec<LeaveRequest>>,
    pub device_logs: Mutex<Vec<DeviceLogRow>>,
    pub deleted_users: Mutex<Vec<DeletedUser>>,
    pub backups: Mutex<Vec<Backup>>,
    pub created_backups: Mutex<Vec<CreateBackupRequest>>,
    pub system_config: Mutex<SystemConfig>,
    pub semester: Mutex<SemesterDetails>,
    pub holidays: Mutex<Vec<Holiday>>,
    pub download: Mutex<Option<Download>>,
    pub last_leave_payload: Mutex<Option<Map<String, Value>>>,
    pub last_user_form: Mutex<Option<(UserForm, Option<UploadFile>)>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// 指定方法返回服务端错误；holiday 可以用 `update_holiday:<id>` 精确到行
    pub fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .map(|c| c.split(':').next().unwrap_or_default().to_string())
            .collect()
    }

    fn record(&self, name: &str, arg: &str) -> Result<(), ApiError> {
        let entry = if arg.is_empty() {
            name.to_string()
        } else {
            format!("{}:{}", name, arg)
        };
        self.calls.lock().unwrap().push(entry.clone());
        let failing = self.failing.lock().unwrap();
        if failing.contains(name) || failing.contains(&entry) {
            return Err(ApiError::Rejected(format!("{} failed", entry)));
        }
        Ok(())
    }
}

#[async_trait]
impl AdminBackend for FakeBackend {
    async fn dashboard_summary(&self) -> Result<DashboardSummary, ApiError> {
        self.record("dashboard_summary", "")?;
        Ok(self.dashboard.lock().unwrap().clone())
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.record("list_users", "")?;
        Ok(self.users.lock().unwrap().clone())
    }

    async fn create_user(
        &self,
        form: &UserForm,
        photo: Option<UploadFile>,
    ) -> Result<String, ApiError> {
        self.record("create_user", &form.sin_number)?;
        *self.last_user_form.lock().unwrap() = Some((form.clone(), photo));
        Ok("created".to_string())
    }

    async fn update_user(
        &self,
        sin: &str,
        form: &UserForm,
        photo: Option<UploadFile>,
    ) -> Result<String, ApiError> {
        self.record("update_user", sin)?;
        *self.last_user_form.lock().unwrap() = Some((form.clone(), photo));
        Ok("updated".to_string())
    }

    async fn delete_user(&self, sin: &str, actor: &str) -> Result<String, ApiError> {
        self.record("delete_user", &format!("{}:{}", sin, actor))?;
        Ok("deleted".to_string())
    }

    async fn bulk_upload_users(&self, file: UploadFile) -> Result<usize, ApiError> {
        self.record("bulk_upload_users", &file.file_name)?;
        Ok(file.bytes.iter().filter(|b| **b == b'\n').count())
    }

    async fn list_leave_requests(
        &self,
        filter: &LeaveFilter,
    ) -> Result<Vec<LeaveRequest>, ApiError> {
        self.record("list_leave_requests", &filter.describe())?;
        Ok(self.leave_requests.lock().unwrap().clone())
    }

    async fn update_leave_request(
        &self,
        request_id: &str,
        payload: Map<String, Value>,
    ) -> Result<String, ApiError> {
        self.record("update_leave_request", request_id)?;
        *self.last_leave_payload.lock().unwrap() = Some(payload);
        Ok("updated".to_string())
    }

    async fn delete_leave_request(&self, request_id: &str) -> Result<String, ApiError> {
        self.record("delete_leave_request", request_id)?;
        Ok("deleted".to_string())
    }

    async fn list_device_logs(&self) -> Result<Vec<DeviceLogRow>, ApiError> {
        self.record("list_device_logs", "")?;
        Ok(self.device_logs.lock().unwrap().clone())
    }

    async fn delete_all_device_logs(&self) -> Result<String, ApiError> {
        self.record("delete_all_device_logs", "")?;
        self.device_logs.lock().unwrap().clear();
        Ok("cleared".to_string())
    }

    async fn upload_device_logs(
        &self,
        file: UploadFile,
        progress: ProgressFn,
    ) -> Result<String, ApiError> {
        self.record("upload_device_logs", &file.file_name)?;
        progress(50);
        progress(100);
        Ok("uploaded".to_string())
    }

    async fn list_deleted_users(&self) -> Result<Vec<DeletedUser>, ApiError> {
        self.record("list_deleted_users", "")?;
        Ok(self.deleted_users.lock().unwrap().clone())
    }

    async fn restore_user(&self, sin: &str) -> Result<String, ApiError> {
        self.record("restore_user", sin)?;
        Ok("restored".to_string())
    }

    async fn purge_user(&self, sin: &str) -> Result<String, ApiError> {
        self.record("purge_user", sin)?;
        Ok("purged".to_string())
    }

    async fn list_backups(&self) -> Result<Vec<Backup>, ApiError> {
        self.record("list_backups", "")?;
        Ok(self.backups.lock().unwrap().clone())
    }

    async fn create_backup(&self, req: &CreateBackupRequest) -> Result<String, ApiError> {
        self.record("create_backup", &req.description)?;
        self.created_backups.lock().unwrap().push(req.clone());
        Ok("backup created".to_string())
    }

    async fn restore_backup(&self, id: &str) -> Result<String, ApiError> {
        self.record("restore_backup", id)?;
        Ok("restored".to_string())
    }

    async fn delete_backup(&self, id: &str) -> Result<String, ApiError> {
        self.record("delete_backup", id)?;
        Ok("deleted".to_string())
    }

    async fn download_backup(&self, id: &str) -> Result<Download, ApiError> {
        self.record("download_backup", id)?;
        Ok(self.download.lock().unwrap().clone().unwrap_or(Download {
            content_disposition: None,
            bytes: Vec::new(),
        }))
    }

    async fn system_config(&self) -> Result<SystemConfig, ApiError> {
        self.record("system_config", "")?;
        Ok(self.system_config.lock().unwrap().clone())
    }

    async fn save_system_config(&self, cfg: &SystemConfig) -> Result<String, ApiError> {
        self.record("save_system_config", "")?;
        *self.system_config.lock().unwrap() = cfg.clone();
        Ok("saved".to_string())
    }

    async fn semester_details(&self) -> Result<SemesterDetails, ApiError> {
        self.record("semester_details", "")?;
        Ok(self.semester.lock().unwrap().clone())
    }

    async fn save_semester_details(&self, sem: &SemesterDetails) -> Result<String, ApiError> {
        self.record("save_semester_details", "")?;
        *self.semester.lock().unwrap() = sem.clone();
        Ok("saved".to_string())
    }

    async fn list_holidays(&self) -> Result<Vec<Holiday>, ApiError> {
        self.record("list_holidays", "")?;
        Ok(self.holidays.lock().unwrap().clone())
    }

    async fn update_holiday(&self, holiday: &Holiday) -> Result<String, ApiError> {
        self.record("update_holiday", &holiday.id)?;
        let mut rows = self.holidays.lock().unwrap();
        if let Some(row) = rows.iter_mut().find(|h| h.id == holiday.id) {
            *row = holiday.clone();
        }
        Ok("updated".to_string())
    }

    async fn delete_holiday(&self, id: &str) -> Result<String, ApiError> {
        self.record("delete_holiday", id)?;
        self.holidays.lock().unwrap().retain(|h| h.id != id);
        Ok("deleted".to_string())
    }

    async fn delete_all_holidays(&self) -> Result<String, ApiError> {
        self.record("delete_all_holidays", "")?;
        self.holidays.lock().unwrap().clear();
        Ok("cleared".to_string())
    }

    async fn upload_holidays(&self, file: UploadFile) -> Result<String, ApiError> {
        self.record("upload_holidays", &file.file_name)?;
        // 按 date,reason 解析，首行表头跳过
        let text = String::from_utf8_lossy(&file.bytes).to_string();
        let mut rows = self.holidays.lock().unwrap();
        let mut added = 0;
        for line in text.lines().filter(|l| !l.trim().is_empty()) {
            let mut cols = line.splitn(2, ',').map(str::trim);
            let date = cols.next().unwrap_or_default();
            if date.eq_ignore_ascii_case("date") {
                continue;
            }
            let id = format!("h{}", rows.len() + 1);
            rows.push(Holiday {
                id,
                date: date.to_string(),
                day: None,
                reason: cols.next().unwrap_or_default().to_string(),
            });
            added += 1;
        }
        Ok(format!("uploaded {}", added))
    }
}
