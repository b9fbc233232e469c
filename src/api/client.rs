use super::backend::{AdminBackend, Download, ProgressFn, UploadFile};
use super::envelope::{
    decode, decode_list, decode_records, message_of, status_error, unwrap_envelope,
};
use super::error::ApiError;
use super::urls::*;
use crate::config::ConsoleConfig;
use crate::model::{
    Backup, CreateBackupRequest, DashboardSummary, DeletedUser, DeviceLogRow, Holiday,
    LeaveFilter, LeaveRequest, SemesterDetails, SystemConfig, User, UserForm,
};
use async_trait::async_trait;
use futures::StreamExt;
use log::{info, warn};
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client, Method, RequestBuilder, Response};
use serde_json::{json, Map, Value};

const UPLOAD_CHUNK: usize = 16 * 1024;

/// 管理后台 HTTP 客户端
///
/// 不做自动重试，也不做取消：失败就把错误交给调用方提示用户。
pub struct AdminApi {
    client: Client,
    api_url: String,
    leave_api_url: String,
}

impl AdminApi {
    pub fn new(config: &ConsoleConfig) -> Result<Self, ApiError> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .timeout(config.timeout)
            .user_agent(concat!("attendance-admin/", env!("CARGO_PKG_VERSION")));
        if let Some(proxy) = &config.proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy)?);
        }
        Ok(Self {
            client: builder.build()?,
            api_url: config.api_url.clone(),
            leave_api_url: config.leave_api_url.clone(),
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        join(&self.api_url, path)
    }

    fn leave_url(&self, path: &str) -> String {
        join(&self.leave_api_url, path)
    }

    async fn send(&self, request: RequestBuilder, label: &str) -> Result<Value, ApiError> {
        let resp = request.send().await.map_err(|e| {
            warn!("{} {} 请求失败: {}", self, label, e);
            ApiError::Http(e)
        })?;
        info!("{} {} [{}]", self, label, resp.status());
        read_json(resp).await
    }

    async fn get(&self, url: String) -> Result<Value, ApiError> {
        let label = format!("GET {}", url);
        self.send(self.client.get(&url), &label).await
    }

    async fn send_json(&self, method: Method, url: String, body: Value) -> Result<Value, ApiError> {
        let label = format!("{} {}", method, url);
        self.send(self.client.request(method, &url).json(&body), &label)
            .await
    }

    async fn send_empty(&self, method: Method, url: String) -> Result<Value, ApiError> {
        let label = format!("{} {}", method, url);
        self.send(self.client.request(method, &url), &label).await
    }

    async fn send_form(&self, method: Method, url: String, form: Form) -> Result<Value, ApiError> {
        let label = format!("{} {} (multipart)", method, url);
        self.send(self.client.request(method, &url).multipart(form), &label)
            .await
    }

    async fn upload(&self, path: &str, file: UploadFile) -> Result<Value, ApiError> {
        let form = Form::new().part("file", file_part(file)?);
        self.send_form(Method::POST, self.url(path), form).await
    }
}

async fn read_json(resp: Response) -> Result<Value, ApiError> {
    let status = resp.status();
    let text = resp.text().await?;
    if !status.is_success() {
        return Err(status_error(status, &text));
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    // 个别接口成功时直接返回纯文本
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

/// 修改类接口的提示文案
fn mutation_message(body: Value, fallback: &str) -> Result<String, ApiError> {
    if let Value::String(s) = &body {
        if !s.trim().is_empty() {
            return Ok(s.clone());
        }
    }
    let msg = message_of(&body);
    unwrap_envelope(body)?;
    Ok(msg.unwrap_or_else(|| fallback.to_string()))
}

fn file_part(file: UploadFile) -> Result<Part, ApiError> {
    Ok(Part::bytes(file.bytes)
        .file_name(file.file_name)
        .mime_str(file.mime)?)
}

/// 分块流式上传，每发出一块回报一次进度
fn progress_part(file: UploadFile, progress: ProgressFn) -> Result<Part, ApiError> {
    let total = file.bytes.len();
    let chunks: Vec<Vec<u8>> = file
        .bytes
        .chunks(UPLOAD_CHUNK)
        .map(|c| c.to_vec())
        .collect();
    let mut sent = 0usize;
    let stream = futures::stream::iter(chunks).map(move |chunk| {
        sent += chunk.len();
        progress(percent(sent, total));
        Ok::<Vec<u8>, std::io::Error>(chunk)
    });
    let body = reqwest::Body::wrap_stream(stream);
    Ok(Part::stream_with_length(body, total as u64)
        .file_name(file.file_name)
        .mime_str(file.mime)?)
}

fn percent(sent: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent.min(total) * 100) / total) as u8
}

/// 批量导入的新建数量，兼容几种返回格式
pub fn created_count(body: &Value) -> usize {
    for key in ["created", "createdCount", "created_count", "count", "inserted", "insertedCount"] {
        match body.get(key) {
            Some(Value::Number(n)) => return n.as_u64().unwrap_or(0) as usize,
            Some(Value::Array(items)) => return items.len(),
            Some(Value::String(s)) => {
                if let Ok(n) = s.trim().parse() {
                    return n;
                }
            }
            _ => {}
        }
    }
    match body {
        Value::Array(items) => items.len(),
        Value::Object(map) => map.get("data").map(created_count).unwrap_or(0),
        _ => 0,
    }
}

fn user_form(form: &UserForm, photo: Option<UploadFile>) -> Result<Form, ApiError> {
    let mut multipart = Form::new();
    for (key, value) in form.text_fields() {
        multipart = multipart.text(key, value);
    }
    if let Some(photo) = photo {
        multipart = multipart.part("photo", file_part(photo)?);
    }
    Ok(multipart)
}

#[async_trait]
impl AdminBackend for AdminApi {
    async fn dashboard_summary(&self) -> Result<DashboardSummary, ApiError> {
        decode(self.get(self.url(PATH_ADMIN_DASHBOARD)).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        decode_list(self.get(self.url(PATH_GET_USERS)).await?)
    }

    async fn create_user(
        &self,
        form: &UserForm,
        photo: Option<UploadFile>,
    ) -> Result<String, ApiError> {
        let body = self
            .send_form(Method::POST, self.url(PATH_CREATE_USER), user_form(form, photo)?)
            .await?;
        mutation_message(body, "用户已创建")
    }

    async fn update_user(
        &self,
        sin: &str,
        form: &UserForm,
        photo: Option<UploadFile>,
    ) -> Result<String, ApiError> {
        let body = self
            .send_form(
                Method::PUT,
                self.url(&path_update_user(sin)),
                user_form(form, photo)?,
            )
            .await?;
        mutation_message(body, "用户已更新")
    }

    async fn delete_user(&self, sin: &str, actor: &str) -> Result<String, ApiError> {
        let body = self
            .send_json(
                Method::DELETE,
                self.url(&path_delete_user(sin)),
                json!({ "deleted_by": actor }),
            )
            .await?;
        mutation_message(body, "用户已删除")
    }

    async fn bulk_upload_users(&self, file: UploadFile) -> Result<usize, ApiError> {
        let body = self.upload(PATH_BULK_UPLOAD, file).await?;
        let count = created_count(&body);
        unwrap_envelope(body)?;
        Ok(count)
    }

    async fn list_leave_requests(
        &self,
        filter: &LeaveFilter,
    ) -> Result<Vec<LeaveRequest>, ApiError> {
        let url = self.leave_url("/");
        let label = format!("GET {} [{}]", url, filter.describe());
        let request = self.client.get(&url).query(&filter.query_pairs());
        decode_records(self.send(request, &label).await?)
    }

    async fn update_leave_request(
        &self,
        request_id: &str,
        payload: Map<String, Value>,
    ) -> Result<String, ApiError> {
        let body = self
            .send_json(
                Method::PUT,
                self.leave_url(&path_leave_request(request_id)),
                Value::Object(payload),
            )
            .await?;
        mutation_message(body, "请假申请已更新")
    }

    async fn delete_leave_request(&self, request_id: &str) -> Result<String, ApiError> {
        let body = self
            .send_empty(
                Method::DELETE,
                self.leave_url(&path_leave_request(request_id)),
            )
            .await?;
        mutation_message(body, "请假申请已删除")
    }

    async fn list_device_logs(&self) -> Result<Vec<DeviceLogRow>, ApiError> {
        decode_list(self.get(self.url(PATH_DEVICE_LOGS)).await?)
    }

    async fn delete_all_device_logs(&self) -> Result<String, ApiError> {
        let body = self
            .send_empty(Method::DELETE, self.url(PATH_DEVICE_LOGS))
            .await?;
        mutation_message(body, "设备日志已清空")
    }

    async fn upload_device_logs(
        &self,
        file: UploadFile,
        progress: ProgressFn,
    ) -> Result<String, ApiError> {
        let form = Form::new().part("file", progress_part(file, progress)?);
        let body = self
            .send_form(Method::POST, self.url(PATH_UPLOAD_DEVICE_LOGS), form)
            .await?;
        mutation_message(body, "设备日志已上传")
    }

    async fn list_deleted_users(&self) -> Result<Vec<DeletedUser>, ApiError> {
        decode_list(self.get(self.url(PATH_DELETED_USERS)).await?)
    }

    async fn restore_user(&self, sin: &str) -> Result<String, ApiError> {
        let body = self
            .send_json(
                Method::POST,
                self.url(PATH_RESTORE_USER),
                json!({ "sin_number": sin }),
            )
            .await?;
        mutation_message(body, "用户已恢复")
    }

    async fn purge_user(&self, sin: &str) -> Result<String, ApiError> {
        let body = self
            .send_json(
                Method::POST,
                self.url(PATH_PERMANENTLY_DELETE_USER),
                json!({ "sin_number": sin }),
            )
            .await?;
        mutation_message(body, "用户已彻底删除")
    }

    async fn list_backups(&self) -> Result<Vec<Backup>, ApiError> {
        decode_records(self.get(self.url(PATH_BACKUP_LIST)).await?)
    }

    async fn create_backup(&self, req: &CreateBackupRequest) -> Result<String, ApiError> {
        let body = self
            .send_json(
                Method::POST,
                self.url(PATH_BACKUP_CREATE),
                serde_json::to_value(req)?,
            )
            .await?;
        mutation_message(body, "备份已创建")
    }

    async fn restore_backup(&self, id: &str) -> Result<String, ApiError> {
        let body = self
            .send_empty(Method::POST, self.url(&path_backup_restore(id)))
            .await?;
        mutation_message(body, "备份已恢复")
    }

    async fn delete_backup(&self, id: &str) -> Result<String, ApiError> {
        let body = self
            .send_empty(Method::DELETE, self.url(&path_backup_delete(id)))
            .await?;
        mutation_message(body, "备份已删除")
    }

    async fn download_backup(&self, id: &str) -> Result<Download, ApiError> {
        let url = self.url(&path_backup_download(id));
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        info!("{} GET {} [{}]", self, url, status);
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }
        let content_disposition = resp
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = resp.bytes().await?.to_vec();
        Ok(Download {
            content_disposition,
            bytes,
        })
    }

    async fn system_config(&self) -> Result<SystemConfig, ApiError> {
        let data = unwrap_envelope(self.get(self.url(PATH_SYSTEM_CONFIG)).await?)?;
        Ok(SystemConfig::from_wire(&data))
    }

    async fn save_system_config(&self, cfg: &SystemConfig) -> Result<String, ApiError> {
        let body = self
            .send_json(Method::POST, self.url(PATH_SYSTEM_CONFIG), cfg.to_wire())
            .await?;
        mutation_message(body, "考勤规则已保存")
    }

    async fn semester_details(&self) -> Result<SemesterDetails, ApiError> {
        let data = unwrap_envelope(self.get(self.url(PATH_SEMESTER_DETAILS)).await?)?;
        // 有的版本返回数组，取第一条
        let data = match data {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            other => other,
        };
        Ok(SemesterDetails::from_wire(&data))
    }

    async fn save_semester_details(&self, sem: &SemesterDetails) -> Result<String, ApiError> {
        let body = self
            .send_json(Method::PUT, self.url(PATH_SEMESTER_DETAILS), sem.to_wire())
            .await?;
        mutation_message(body, "学期信息已保存")
    }

    async fn list_holidays(&self) -> Result<Vec<Holiday>, ApiError> {
        decode_records(self.get(self.url(PATH_HOLIDAYS)).await?)
    }

    async fn update_holiday(&self, holiday: &Holiday) -> Result<String, ApiError> {
        let body = self
            .send_json(
                Method::PUT,
                self.url(&path_holiday(&holiday.id)),
                holiday.to_update_body(),
            )
            .await?;
        mutation_message(body, "节假日已更新")
    }

    async fn delete_holiday(&self, id: &str) -> Result<String, ApiError> {
        let body = self
            .send_empty(Method::DELETE, self.url(&path_holiday(id)))
            .await?;
        mutation_message(body, "节假日已删除")
    }

    async fn delete_all_holidays(&self) -> Result<String, ApiError> {
        let body = self
            .send_empty(Method::DELETE, self.url(PATH_HOLIDAYS))
            .await?;
        mutation_message(body, "节假日已清空")
    }

    async fn upload_holidays(&self, file: UploadFile) -> Result<String, ApiError> {
        let body = self.upload(PATH_UPLOAD_HOLIDAYS, file).await?;
        mutation_message(body, "节假日已导入")
    }
}

impl std::fmt::Display for AdminApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<AdminApi [{}]>", self.api_url)
    }
}

impl std::fmt::Debug for AdminApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<AdminApi [{}]>", self.api_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave::update_payload;
    use pretty_assertions::assert_eq;
    use std::sync::{Arc, Mutex};
    use wiremock::matchers::{body_json, body_string_contains, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> AdminApi {
        let cfg = ConsoleConfig {
            api_url: server.uri(),
            leave_api_url: format!("{}/leave", server.uri()),
            ..ConsoleConfig::default()
        };
        AdminApi::new(&cfg).unwrap()
    }

    #[tokio::test]
    async fn list_users_accepts_both_envelopes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/get-users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": [{"sin_number": "S1", "name": "A", "email": "a@x", "role": "student"}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/deleted-users"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"sin_number": "S9", "name": "Z", "deleted_at": "2024-01-01T00:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let users = api.list_users().await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].sin_number, "S1");
        let deleted = api.list_deleted_users().await.unwrap();
        assert_eq!(deleted[0].sin_number, "S9");
    }

    #[tokio::test]
    async fn server_message_is_surfaced_on_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/restore-user"))
            .respond_with(
                ResponseTemplate::new(404).set_body_json(json!({"message": "User not found"})),
            )
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/permanently-delete-user"))
            .and(body_json(json!({"sin_number": "S2"})))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": false, "message": "locked"})),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        let err = api.restore_user("S1").await.unwrap_err();
        assert_eq!(err.to_string(), "User not found");
        let err = api.purge_user("S2").await.unwrap_err();
        assert!(matches!(err, ApiError::Rejected(ref m) if m == "locked"));
    }

    #[tokio::test]
    async fn leave_filter_is_sent_as_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/leave/"))
            .and(query_param("status", "approved"))
            .and(query_param("search", "ravi"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"request_id": 1, "student_name": "Ravi", "mentor_approval": "approved"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let filter = LeaveFilter {
            search: "ravi".into(),
            status: Some(crate::model::ApprovalStatus::Approved),
            request_type: None,
        };
        let list = api.list_leave_requests(&filter).await.unwrap();
        assert_eq!(list[0].requester_name(), "Ravi");
    }

    #[tokio::test]
    async fn leave_update_sends_sanitized_payload() {
        let server = MockServer::start().await;
        let req: LeaveRequest = serde_json::from_value(json!({
            "request_id": "7",
            "student_name": "Ravi",
            "reason": "Fever",
            "photo": "aGk=",
            "hod_name": null
        }))
        .unwrap();
        let payload = update_payload(&req);
        Mock::given(method("PUT"))
            .and(path("/leave/7"))
            .and(body_json(Value::Object(payload.clone())))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "updated"})))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let msg = api.update_leave_request("7", payload).await.unwrap();
        assert_eq!(msg, "updated");
    }

    #[tokio::test]
    async fn delete_user_carries_actor() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/delete-user/S5"))
            .and(body_json(json!({"deleted_by": "ADM1"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let api = api_for(&server);
        assert_eq!(api.delete_user("S5", "ADM1").await.unwrap(), "用户已删除");
    }

    #[tokio::test]
    async fn ids_with_reserved_characters_are_escaped() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/delete-user/CSE%2312"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "ok"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/leave/R%2F7"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let api = api_for(&server);
        assert_eq!(api.delete_user("CSE#12", "admin").await.unwrap(), "ok");
        api.delete_leave_request("R/7").await.unwrap();
    }

    #[tokio::test]
    async fn holiday_list_survives_mixed_id_keys_and_bad_rows() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/holidays"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [
                {"_id": "abc", "id": "abc", "date": "2024-01-26", "reason": "Republic Day"},
                {"reason": "row without id"},
                {"_id": "def", "date": "2024-08-15", "reason": "Independence Day"}
            ]})))
            .mount(&server)
            .await;
        let api = api_for(&server);
        let ids: Vec<String> = api
            .list_holidays()
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.id)
            .collect();
        assert_eq!(ids, vec!["abc".to_string(), "def".to_string()]);
    }

    #[tokio::test]
    async fn create_user_posts_multipart_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create-user"))
            .and(header_exists("content-type"))
            .and(body_string_contains("name=\"sin_number\""))
            .and(body_string_contains("name=\"photo\"; filename=\"me.png\""))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"success": true})))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let mut form = UserForm::default();
        form.sin_number = "S3".into();
        let photo = UploadFile::new("me.png", vec![1, 2, 3]);
        assert_eq!(api.create_user(&form, Some(photo)).await.unwrap(), "用户已创建");
    }

    #[tokio::test]
    async fn bulk_upload_reports_created_count() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bulk-upload"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"success": true, "message": "ok", "createdCount": 12})),
            )
            .mount(&server)
            .await;
        let api = api_for(&server);
        let n = api
            .bulk_upload_users(UploadFile::new("users.csv", b"sin_number\nS1\n".to_vec()))
            .await
            .unwrap();
        assert_eq!(n, 12);
    }

    #[tokio::test]
    async fn device_log_upload_reports_progress_to_100() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload-devicelogs"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "done"})))
            .mount(&server)
            .await;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let progress: ProgressFn = Arc::new(move |p| sink.lock().unwrap().push(p));
        let api = api_for(&server);
        let file = UploadFile::new("logs.csv", vec![b'x'; UPLOAD_CHUNK * 3 + 5]);
        let msg = api.upload_device_logs(file, progress).await.unwrap();
        assert_eq!(msg, "done");

        let seen = seen.lock().unwrap();
        assert_eq!(seen.last().copied(), Some(100));
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    }

    #[tokio::test]
    async fn download_reads_content_disposition() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/backup/download-csv/9"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-disposition", "attachment; filename=\"b9.zip\"")
                    .set_body_bytes(vec![1u8, 2, 3]),
            )
            .mount(&server)
            .await;
        let api = api_for(&server);
        let dl = api.download_backup("9").await.unwrap();
        assert_eq!(dl.content_disposition.as_deref(), Some("attachment; filename=\"b9.zip\""));
        assert_eq!(dl.bytes, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn system_config_is_saved_in_wire_format() {
        let server = MockServer::start().await;
        let cfg = SystemConfig::default();
        Mock::given(method("POST"))
            .and(path("/system-config"))
            .and(body_json(cfg.to_wire()))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "message": "saved"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/system-config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "success": true,
                "data": {"gracePeriod": "00:25", "lateMarkThreshold": "00:05"}
            })))
            .mount(&server)
            .await;

        let api = api_for(&server);
        assert_eq!(api.save_system_config(&cfg).await.unwrap(), "saved");
        let loaded = api.system_config().await.unwrap();
        assert_eq!(loaded.grace_period, 25);
        assert_eq!(loaded.late_mark_threshold, 5);
    }

    #[test]
    fn created_count_variants() {
        assert_eq!(created_count(&json!({"created": 3})), 3);
        assert_eq!(created_count(&json!({"inserted": [1, 2]})), 2);
        assert_eq!(created_count(&json!({"data": {"count": "4"}})), 4);
        assert_eq!(created_count(&json!([1, 2, 3, 4, 5])), 5);
        assert_eq!(created_count(&json!({"message": "ok"})), 0);
    }

    #[test]
    fn percent_is_bounded() {
        assert_eq!(percent(0, 0), 100);
        assert_eq!(percent(50, 200), 25);
        assert_eq!(percent(300, 200), 100);
    }
}
