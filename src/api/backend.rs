use super::error::ApiError;
use crate::model::{
    Backup, CreateBackupRequest, DashboardSummary, DeletedUser, DeviceLogRow, Holiday,
    LeaveFilter, LeaveRequest, SemesterDetails, SystemConfig, User, UserForm,
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;

/// 上传进度回调（0-100）
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// 待上传的文件
#[derive(Debug, Clone, PartialEq)]
pub struct UploadFile {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_for(&file_name);
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    pub async fn from_path(path: &Path) -> Result<Self, ApiError> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("upload.bin")
            .to_string();
        Ok(Self::new(name, bytes))
    }
}

fn mime_for(name: &str) -> &'static str {
    let ext = name
        .rsplit('.')
        .next()
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => "text/csv",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "application/octet-stream",
    }
}

/// 备份下载结果
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub content_disposition: Option<String>,
    pub bytes: Vec<u8>,
}

/// 管理后台 REST 接口
///
/// 每个方法对应一个端点；列表类接口已去掉响应信封，修改类接口返回服务端提示文案。
#[async_trait]
pub trait AdminBackend: Send + Sync {
    async fn dashboard_summary(&self) -> Result<DashboardSummary, ApiError>;

    async fn list_users(&self) -> Result<Vec<User>, ApiError>;
    async fn create_user(&self, form: &UserForm, photo: Option<UploadFile>)
        -> Result<String, ApiError>;
    async fn update_user(
        &self,
        sin: &str,
        form: &UserForm,
        photo: Option<UploadFile>,
    ) -> Result<String, ApiError>;
    async fn delete_user(&self, sin: &str, actor: &str) -> Result<String, ApiError>;
    /// 返回新建用户数
    async fn bulk_upload_users(&self, file: UploadFile) -> Result<usize, ApiError>;

    async fn list_leave_requests(&self, filter: &LeaveFilter)
        -> Result<Vec<LeaveRequest>, ApiError>;
    async fn update_leave_request(
        &self,
        request_id: &str,
        payload: Map<String, Value>,
    ) -> Result<String, ApiError>;
    async fn delete_leave_request(&self, request_id: &str) -> Result<String, ApiError>;

    async fn list_device_logs(&self) -> Result<Vec<DeviceLogRow>, ApiError>;
    async fn delete_all_device_logs(&self) -> Result<String, ApiError>;
    async fn upload_device_logs(
        &self,
        file: UploadFile,
        progress: ProgressFn,
    ) -> Result<String, ApiError>;

    async fn list_deleted_users(&self) -> Result<Vec<DeletedUser>, ApiError>;
    async fn restore_user(&self, sin: &str) -> Result<String, ApiError>;
    async fn purge_user(&self, sin: &str) -> Result<String, ApiError>;

    async fn list_backups(&self) -> Result<Vec<Backup>, ApiError>;
    async fn create_backup(&self, req: &CreateBackupRequest) -> Result<String, ApiError>;
    async fn restore_backup(&self, id: &str) -> Result<String, ApiError>;
    async fn delete_backup(&self, id: &str) -> Result<String, ApiError>;
    async fn download_backup(&self, id: &str) -> Result<Download, ApiError>;

    async fn system_config(&self) -> Result<SystemConfig, ApiError>;
    async fn save_system_config(&self, cfg: &SystemConfig) -> Result<String, ApiError>;
    async fn semester_details(&self) -> Result<SemesterDetails, ApiError>;
    async fn save_semester_details(&self, sem: &SemesterDetails) -> Result<String, ApiError>;

    async fn list_holidays(&self) -> Result<Vec<Holiday>, ApiError>;
    async fn update_holiday(&self, holiday: &Holiday) -> Result<String, ApiError>;
    async fn delete_holiday(&self, id: &str) -> Result<String, ApiError>;
    async fn delete_all_holidays(&self) -> Result<String, ApiError>;
    async fn upload_holidays(&self, file: UploadFile) -> Result<String, ApiError>;
}
