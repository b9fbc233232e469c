use crate::app_service::ServiceRequest;
use crate::auth::AuthContext;
use crate::commands::app_command::{subcommands, HELP_TEXT, TOP_LEVEL};
use crate::commands::AppCommand;
use crate::model::leave::{page_count, page_slice};
use crate::model::{
    ApprovalStage, ApprovalStatus, Backup, DashboardSummary, DeletedUser, DeviceLogRow, Draft,
    Holiday, LeaveFilter, LeaveRequest, SemesterDetails, SystemConfig, User, UserForm,
};
use crate::scheduler::BackupSchedule;
use crossterm::event::KeyCode;
use std::fmt;
use std::str::FromStr;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Overview,
    Users,
    LeaveRequests,
    DeviceLogs,
    DeletedUsers,
    Backups,
    SystemConfig,
    Profile,
}

impl Section {
    /// 左侧菜单顺序
    pub const ALL: [Section; 8] = [
        Section::Overview,
        Section::Users,
        Section::LeaveRequests,
        Section::DeviceLogs,
        Section::DeletedUsers,
        Section::Backups,
        Section::SystemConfig,
        Section::Profile,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Section::Overview => "Overview",
            Section::Users => "Users",
            Section::LeaveRequests => "Leave Requests",
            Section::DeviceLogs => "Device Logs",
            Section::DeletedUsers => "Deleted Users",
            Section::Backups => "Backups",
            Section::SystemConfig => "System Config",
            Section::Profile => "Profile",
        }
    }

    pub fn index(&self) -> usize {
        Section::ALL.iter().position(|s| s == self).unwrap_or(0)
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overview" | "dashboard" | "home" => Ok(Section::Overview),
            "users" | "user" => Ok(Section::Users),
            "leave" | "leaves" | "leave-requests" | "requests" => Ok(Section::LeaveRequests),
            "logs" | "devicelogs" | "device-logs" => Ok(Section::DeviceLogs),
            "deleted" | "deleted-users" => Ok(Section::DeletedUsers),
            "backup" | "backups" => Ok(Section::Backups),
            "config" | "system-config" | "settings" => Ok(Section::SystemConfig),
            "profile" | "me" => Ok(Section::Profile),
            other => Err(format!("未知页面: {}", other)),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(PartialEq, Debug, Clone)]
pub enum FocusArea {
    Menu,     // 焦点在左侧菜单
    MainView, // 焦点在主视图
}

#[derive(Debug, Clone)]
pub enum ConfirmAction {
    Request(ServiceRequest),
    Logout,
}

/// 等待 y/n 的确认框
#[derive(Debug, Clone)]
pub struct PendingConfirm {
    pub prompt: String,
    pub action: ConfirmAction,
}

#[derive(Debug)]
pub enum AppEvent {
    Message(String),
    Error(String),
    /// None 表示加载失败
    Dashboard(Option<DashboardSummary>),
    Users(Vec<User>),
    LeaveRequests(Vec<LeaveRequest>),
    DeviceLogs(Vec<DeviceLogRow>),
    /// None 表示上传结束
    UploadProgress(Option<u8>),
    DeletedUsers(Vec<DeletedUser>),
    Backups(Vec<Backup>),
    Schedule(BackupSchedule),
    SystemConfig(SystemConfig),
    Semester(SemesterDetails),
    Holidays(Vec<Holiday>),
    /// 批量保存后的最新列表，以及保存失败、需要保留本地修改的行
    HolidaysSaved {
        list: Vec<Holiday>,
        failed: Vec<Holiday>,
    },
}

pub struct App {
    pub section: Section,
    pub input_mode: InputMode,
    pub focus_area: FocusArea,
    pub menu_selected_index: usize,
    pub menu_collapsed: bool,
    pub selected_index: usize,
    pub auth: AuthContext,
    pub api_url: String,

    pub dashboard: Option<DashboardSummary>,
    pub dashboard_loading: bool,
    pub users: Vec<User>,
    pub user_query: String,
    pub leave_requests: Vec<LeaveRequest>,
    pub leave_filter: LeaveFilter,
    pub leave_page: usize,
    pub leave_page_size: usize,
    pub device_logs: Vec<DeviceLogRow>,
    pub upload_progress: Option<u8>,
    pub deleted_users: Vec<DeletedUser>,
    pub deleted_query: String,
    pub backups: Vec<Backup>,
    pub schedule: Option<BackupSchedule>,
    pub system_config: Draft<SystemConfig>,
    pub semester: Draft<SemesterDetails>,
    pub holidays: Draft<Vec<Holiday>>,

    pub pending_confirm: Option<PendingConfirm>,
    pub command_input: String,
    pub command_cursor: usize,
    pub command_history: Vec<String>,
    pub command_history_index: Option<usize>,
    pub log_messages: Vec<String>,
    pub should_quit: bool,
    pub req_tx: mpsc::UnboundedSender<ServiceRequest>,
    pub evt_rx: Option<mpsc::UnboundedReceiver<AppEvent>>,
}

impl App {
    pub fn new(
        startup_info: Vec<String>,
        auth: AuthContext,
        api_url: String,
        leave_page_size: usize,
        req_tx: mpsc::UnboundedSender<ServiceRequest>,
        evt_rx: mpsc::UnboundedReceiver<AppEvent>,
    ) -> App {
        let mut log_messages = vec!["应用已启动".to_string()];
        log_messages.extend(startup_info);

        App {
            section: Section::Overview,
            input_mode: InputMode::Normal,
            focus_area: FocusArea::Menu,
            menu_selected_index: 0,
            menu_collapsed: false,
            selected_index: 0,
            auth,
            api_url,
            dashboard: None,
            dashboard_loading: false,
            users: Vec::new(),
            user_query: String::new(),
            leave_requests: Vec::new(),
            leave_filter: LeaveFilter::default(),
            leave_page: 0,
            leave_page_size: leave_page_size.max(1),
            device_logs: Vec::new(),
            upload_progress: None,
            deleted_users: Vec::new(),
            deleted_query: String::new(),
            backups: Vec::new(),
            schedule: None,
            system_config: Draft::new(SystemConfig::default()),
            semester: Draft::new(SemesterDetails::default()),
            holidays: Draft::new(Vec::new()),
            pending_confirm: None,
            command_input: String::new(),
            command_cursor: 0,
            command_history: Vec::new(),
            command_history_index: None,
            log_messages,
            should_quit: false,
            req_tx,
            evt_rx: Some(evt_rx),
        }
    }

    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
    }

    fn request(&mut self, req: ServiceRequest) {
        if self.req_tx.send(req).is_err() {
            self.add_log("✗ 后台服务已停止".to_string());
        }
    }

    fn confirm(&mut self, prompt: String, action: ConfirmAction) {
        self.pending_confirm = Some(PendingConfirm { prompt, action });
    }

    /// 回答确认框
    pub fn answer_confirm(&mut self, yes: bool) {
        let Some(pending) = self.pending_confirm.take() else {
            return;
        };
        if !yes {
            self.add_log("已取消".to_string());
            return;
        }
        match pending.action {
            ConfirmAction::Request(req) => self.request(req),
            ConfirmAction::Logout => {
                self.auth.clear();
                self.add_log("已注销".to_string());
                self.should_quit = true;
            }
        }
    }

    /// 切换页面，并在进入时加载数据
    pub fn open_section(&mut self, section: Section) {
        self.section = section;
        self.menu_selected_index = section.index();
        self.selected_index = 0;
        self.focus_area = FocusArea::MainView;
        self.load_section();
    }

    pub fn load_section(&mut self) {
        match self.section {
            Section::Overview => {
                self.dashboard_loading = true;
                self.request(ServiceRequest::LoadDashboard);
            }
            Section::Users => self.request(ServiceRequest::LoadUsers),
            Section::LeaveRequests => {
                self.request(ServiceRequest::LoadLeaveRequests(self.leave_filter.clone()))
            }
            Section::DeviceLogs => self.request(ServiceRequest::LoadDeviceLogs),
            Section::DeletedUsers => self.request(ServiceRequest::LoadDeletedUsers),
            Section::Backups => {
                self.request(ServiceRequest::LoadBackups);
                self.request(ServiceRequest::LoadSchedule);
            }
            Section::SystemConfig => {
                self.request(ServiceRequest::LoadSystemConfig);
                self.request(ServiceRequest::LoadSemester);
                self.request(ServiceRequest::LoadHolidays);
            }
            Section::Profile => {}
        }
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Message(msg) | AppEvent::Error(msg) => {
                self.log_messages.push(msg)
            }
            AppEvent::Dashboard(summary) => {
                self.dashboard_loading = false;
                self.dashboard = summary;
            }
            AppEvent::Users(list) => self.users = list,
            AppEvent::LeaveRequests(list) => {
                self.leave_requests = list;
                self.set_leave_page(self.leave_page);
            }
            AppEvent::DeviceLogs(rows) => self.device_logs = rows,
            AppEvent::UploadProgress(p) => self.upload_progress = p,
            AppEvent::DeletedUsers(list) => self.deleted_users = list,
            AppEvent::Backups(list) => self.backups = list,
            AppEvent::Schedule(s) => self.schedule = Some(s),
            AppEvent::SystemConfig(cfg) => self.system_config.load(cfg),
            AppEvent::Semester(sem) => self.semester.load(sem),
            AppEvent::Holidays(list) => self.holidays.load(list),
            AppEvent::HolidaysSaved { list, failed } => {
                self.holidays.load(list);
                // 失败行的本地修改保留，仍显示为待保存
                let rows = self.holidays.current_mut();
                for edit in failed {
                    if let Some(row) = rows.iter_mut().find(|h| h.id == edit.id) {
                        *row = edit;
                    }
                }
            }
        }
        self.clamp_selection();
    }

    pub fn visible_users(&self) -> Vec<&User> {
        self.users
            .iter()
            .filter(|u| u.matches(&self.user_query))
            .collect()
    }

    pub fn visible_deleted(&self) -> Vec<&DeletedUser> {
        self.deleted_users
            .iter()
            .filter(|u| u.matches(&self.deleted_query))
            .collect()
    }

    pub fn leave_page_count(&self) -> usize {
        page_count(self.leave_requests.len(), self.leave_page_size)
    }

    pub fn leave_page_rows(&self) -> &[LeaveRequest] {
        page_slice(&self.leave_requests, self.leave_page, self.leave_page_size)
    }

    pub fn set_leave_page(&mut self, page: usize) {
        self.leave_page = page.min(self.leave_page_count() - 1);
        self.selected_index = 0;
    }

    /// 与服务端版本不同的节假日行
    pub fn holiday_pending(&self) -> Vec<Holiday> {
        let saved = self.holidays.saved();
        self.holidays
            .current()
            .iter()
            .filter(|row| saved.iter().find(|s| s.id == row.id) != Some(*row))
            .cloned()
            .collect()
    }

    pub fn row_count(&self) -> usize {
        match self.section {
            Section::Users => self.visible_users().len(),
            Section::LeaveRequests => self.leave_page_rows().len(),
            Section::DeviceLogs => self.device_logs.len(),
            Section::DeletedUsers => self.visible_deleted().len(),
            Section::Backups => self.backups.len(),
            Section::SystemConfig => self.holidays.current().len(),
            Section::Overview | Section::Profile => 0,
        }
    }

    pub fn clamp_selection(&mut self) {
        let count = self.row_count();
        if self.selected_index >= count {
            self.selected_index = count.saturating_sub(1);
        }
    }

    fn find_user(&self, sin: &str) -> Option<&User> {
        self.users.iter().find(|u| u.sin_number == sin)
    }

    fn find_leave(&self, id: &str) -> Option<&LeaveRequest> {
        self.leave_requests.iter().find(|r| r.request_id == id)
    }

    /// 依次应用 key=value，遇到第一个错误就停下并提示
    fn apply_fields<F>(&mut self, fields: &[(String, String)], mut apply: F) -> bool
    where
        F: FnMut(&mut Self, &str, &str) -> Result<(), String>,
    {
        for (k, v) in fields {
            if let Err(e) = apply(self, k, v) {
                self.add_log(format!("⚠ {}", e));
                return false;
            }
        }
        true
    }

    pub fn execute(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::Open(section) => self.open_section(section),
            AppCommand::Refresh => self.load_section(),

            AppCommand::UsersSearch(q) => {
                self.user_query = q.trim().to_string();
                self.selected_index = 0;
                let n = self.visible_users().len();
                self.add_log(format!("用户搜索 \"{}\": {} 条", self.user_query, n));
            }
            AppCommand::UserNew(fields) => {
                let mut form = UserForm::default();
                for (k, v) in &fields {
                    if let Err(e) = form.apply(k, v) {
                        return self.add_log(format!("⚠ {}", e));
                    }
                }
                self.request(ServiceRequest::CreateUser(form));
            }
            AppCommand::UserEdit { sin, fields } => {
                let Some(user) = self.find_user(&sin) else {
                    return self.add_log(format!("✗ 未找到用户: {}", sin));
                };
                let mut form = UserForm::from_user(user);
                for (k, v) in &fields {
                    if let Err(e) = form.apply(k, v) {
                        return self.add_log(format!("⚠ {}", e));
                    }
                }
                self.request(ServiceRequest::UpdateUser { sin, form });
            }
            AppCommand::UserDelete { sin } => {
                let prompt = match self.find_user(&sin) {
                    Some(u) => format!("删除用户 {} ({})？", u.name, sin),
                    None => format!("删除用户 {}？", sin),
                };
                self.confirm(prompt, ConfirmAction::Request(ServiceRequest::DeleteUser { sin }));
            }
            AppCommand::UserPhoto { sin, path } => {
                let Some(user) = self.find_user(&sin) else {
                    return self.add_log(format!("✗ 未找到用户: {}", sin));
                };
                let mut form = UserForm::from_user(user);
                form.photo_path = Some(path);
                self.request(ServiceRequest::UpdateUser { sin, form });
            }
            AppCommand::UsersImport { path } => self.request(ServiceRequest::ImportUsers { path }),

            AppCommand::LeaveFilter(fields) => {
                let mut filter = self.leave_filter.clone();
                for (k, v) in &fields {
                    let v = v.trim();
                    match k.to_ascii_lowercase().as_str() {
                        "search" | "q" => filter.search = v.to_string(),
                        "status" => {
                            filter.status = match v {
                                "" | "all" => None,
                                s => match s.parse::<ApprovalStatus>() {
                                    Ok(st) => Some(st),
                                    Err(e) => return self.add_log(format!("⚠ {}", e)),
                                },
                            }
                        }
                        "type" | "request_type" => {
                            filter.request_type =
                                (!v.is_empty() && v != "all").then(|| v.to_string())
                        }
                        other => return self.add_log(format!("⚠ 未知过滤条件: {}", other)),
                    }
                }
                self.leave_filter = filter;
                self.leave_page = 0;
                self.request(ServiceRequest::LoadLeaveRequests(self.leave_filter.clone()));
            }
            AppCommand::LeaveFilterClear => {
                self.leave_filter = LeaveFilter::default();
                self.leave_page = 0;
                self.request(ServiceRequest::LoadLeaveRequests(LeaveFilter::default()));
            }
            AppCommand::LeaveEdit { id, fields } => {
                let Some(mut request) = self.find_leave(&id).cloned() else {
                    return self.add_log(format!("✗ 未找到请假申请: {}", id));
                };
                for (k, v) in &fields {
                    if let Err(e) = request.apply(k, v) {
                        return self.add_log(format!("⚠ {}", e));
                    }
                }
                let filter = self.leave_filter.clone();
                self.request(ServiceRequest::UpdateLeaveRequest { request, filter });
            }
            AppCommand::LeaveSet { id, stage, status } => {
                let parsed = stage
                    .parse::<ApprovalStage>()
                    .and_then(|s| status.parse::<ApprovalStatus>().map(|st| (s, st)));
                let (stage, status) = match parsed {
                    Ok(p) => p,
                    Err(e) => return self.add_log(format!("⚠ {}", e)),
                };
                let Some(mut request) = self.find_leave(&id).cloned() else {
                    return self.add_log(format!("✗ 未找到请假申请: {}", id));
                };
                request.set_stage(stage, status);
                let filter = self.leave_filter.clone();
                self.request(ServiceRequest::UpdateLeaveRequest { request, filter });
            }
            AppCommand::LeaveDelete { id } => {
                let filter = self.leave_filter.clone();
                self.confirm(
                    format!("删除请假申请 {}？", id),
                    ConfirmAction::Request(ServiceRequest::DeleteLeaveRequest {
                        request_id: id,
                        filter,
                    }),
                );
            }
            AppCommand::LeavePage(n) => self.set_leave_page(n.saturating_sub(1)),

            AppCommand::LogsUpload { path } => {
                if self.upload_progress.is_some() {
                    return self.add_log("⚠ 已有上传在进行中".to_string());
                }
                self.request(ServiceRequest::UploadDeviceLogs { path });
            }
            AppCommand::LogsClear => {
                if self.device_logs.is_empty() {
                    return self.add_log("⚠ 没有可删除的设备日志".to_string());
                }
                self.confirm(
                    format!("删除全部 {} 条设备日志？", self.device_logs.len()),
                    ConfirmAction::Request(ServiceRequest::ClearDeviceLogs),
                );
            }

            AppCommand::DeletedSearch(q) => {
                self.deleted_query = q.trim().to_string();
                self.selected_index = 0;
            }
            AppCommand::DeletedRestore { sin } => {
                self.request(ServiceRequest::RestoreUser { sin })
            }
            AppCommand::DeletedPurge { sin } => self.confirm(
                format!("彻底删除用户 {}？此操作不可恢复", sin),
                ConfirmAction::Request(ServiceRequest::PurgeUser { sin }),
            ),

            AppCommand::BackupCreate {
                backup_type,
                description,
            } => self.request(ServiceRequest::CreateBackup {
                backup_type,
                description,
            }),
            AppCommand::BackupRestore { id } => self.confirm(
                format!("恢复备份 {}？当前数据将被覆盖，恢复期间系统暂不可用", id),
                ConfirmAction::Request(ServiceRequest::RestoreBackup { id }),
            ),
            AppCommand::BackupDelete { id } => self.confirm(
                format!("删除备份 {}？", id),
                ConfirmAction::Request(ServiceRequest::DeleteBackup { id }),
            ),
            AppCommand::BackupDownload { id } => {
                self.request(ServiceRequest::DownloadBackup { id })
            }
            AppCommand::BackupScheduleShow => match &self.schedule {
                Some(s) => {
                    let line = s.describe();
                    self.add_log(line);
                }
                None => self.request(ServiceRequest::LoadSchedule),
            },
            AppCommand::BackupScheduleOn { frequency, time } => {
                self.request(ServiceRequest::SetSchedule {
                    enabled: true,
                    frequency,
                    time,
                })
            }
            AppCommand::BackupScheduleOff => {
                let (frequency, time) = self
                    .schedule
                    .as_ref()
                    .map(|s| (s.frequency, s.time_of_day))
                    .unwrap_or_default();
                self.request(ServiceRequest::SetSchedule {
                    enabled: false,
                    frequency,
                    time,
                })
            }

            AppCommand::ConfigSet(fields) => {
                if self.apply_fields(&fields, |app, k, v| {
                    app.system_config.current_mut().apply(k, v)
                }) {
                    self.add_log("考勤规则已修改（未保存）".to_string());
                }
            }
            AppCommand::ConfigSave => {
                if !self.system_config.is_dirty() {
                    return self.add_log("考勤规则没有需要保存的修改".to_string());
                }
                let cfg = self.system_config.current().clone();
                self.request(ServiceRequest::SaveSystemConfig(cfg));
            }
            AppCommand::ConfigReset => {
                if !self.system_config.is_dirty() {
                    return self.add_log("考勤规则没有未保存的修改".to_string());
                }
                self.system_config.reset();
                self.add_log("考勤规则已还原".to_string());
            }
            AppCommand::SemesterSet(fields) => {
                if self.apply_fields(&fields, |app, k, v| app.semester.current_mut().apply(k, v)) {
                    self.add_log("学期信息已修改（未保存）".to_string());
                }
            }
            AppCommand::SemesterSave => {
                if !self.semester.is_dirty() {
                    return self.add_log("学期信息没有需要保存的修改".to_string());
                }
                let sem = self.semester.current().clone();
                self.request(ServiceRequest::SaveSemester(sem));
            }
            AppCommand::SemesterReset => {
                if !self.semester.is_dirty() {
                    return self.add_log("学期信息没有未保存的修改".to_string());
                }
                self.semester.reset();
                self.add_log("学期信息已还原".to_string());
            }
            AppCommand::HolidaysUpload { path } => {
                self.request(ServiceRequest::UploadHolidays { path })
            }
            AppCommand::HolidayEdit { id, fields } => {
                if !self.holidays.current().iter().any(|h| h.id == id) {
                    return self.add_log(format!("✗ 未找到节假日: {}", id));
                }
                let ok = self.apply_fields(&fields, |app, k, v| {
                    match app.holidays.current_mut().iter_mut().find(|h| h.id == id) {
                        Some(row) => row.apply(k, v),
                        None => Err(format!("未找到节假日: {}", id)),
                    }
                });
                if ok {
                    let n = self.holiday_pending().len();
                    self.add_log(format!("节假日 {} 已修改，待保存 {} 条", id, n));
                }
            }
            AppCommand::HolidaysSave => {
                let pending = self.holiday_pending();
                if pending.is_empty() {
                    return self.add_log("节假日没有需要保存的修改".to_string());
                }
                self.request(ServiceRequest::SaveHolidays(pending));
            }
            AppCommand::HolidaysReset => {
                if self.holiday_pending().is_empty() {
                    return self.add_log("节假日没有未保存的修改".to_string());
                }
                self.holidays.reset();
                self.add_log("节假日修改已还原".to_string());
            }
            AppCommand::HolidayDelete { id } => self.request(ServiceRequest::DeleteHoliday { id }),
            AppCommand::HolidaysClear => self.confirm(
                "删除全部节假日？".to_string(),
                ConfirmAction::Request(ServiceRequest::ClearHolidays),
            ),

            AppCommand::ProfilePhoto { path } => match self.auth.photo_bytes() {
                Some(bytes) => self.request(ServiceRequest::SaveProfilePhoto { path, bytes }),
                None => self.add_log("⚠ 当前资料没有头像".to_string()),
            },
            AppCommand::Logout => {
                self.confirm("确认注销并退出？".to_string(), ConfirmAction::Logout)
            }
            AppCommand::Help => self.add_log(HELP_TEXT.to_string()),
            AppCommand::Quit => self.should_quit = true,
            AppCommand::Unknown(msg) => {
                if !msg.is_empty() {
                    self.add_log(format!("✗ {}", msg));
                }
            }
        }
    }

    /// 获取当前的补全建议
    pub fn get_completion_hint(&self) -> Option<String> {
        let input = self.command_input.trim_start();
        if input.is_empty() {
            return None;
        }
        let ends_with_space = input.ends_with(' ');
        let parts: Vec<&str> = input.split_whitespace().collect();

        let complete = |candidates: &[&str], cur: &str| {
            candidates
                .iter()
                .find(|c| c.starts_with(cur) && **c != cur)
                .map(|c| c[cur.len()..].to_string())
        };

        match (parts.len(), ends_with_space) {
            (1, false) => complete(&TOP_LEVEL, parts[0]),
            (1, true) => subcommands(parts[0]).first().map(|s| s.to_string()),
            (2, false) => complete(subcommands(parts[0]), parts[1]),
            _ => None,
        }
    }

    pub fn handle_key_event(&mut self, key: KeyCode) -> bool {
        if self.pending_confirm.is_some() {
            match key {
                KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                    self.answer_confirm(true)
                }
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.answer_confirm(false)
                }
                _ => {}
            }
            return self.should_quit;
        }

        if self.input_mode == InputMode::Command {
            self.handle_command_key(key);
            return self.should_quit;
        }

        // 正常模式下的按键处理
        match key {
            KeyCode::Char('/') => {
                self.input_mode = InputMode::Command;
                self.command_input.clear();
                self.command_cursor = 0;
            }
            KeyCode::Char('q') => self.execute(AppCommand::Logout),
            KeyCode::Char('m') => self.menu_collapsed = !self.menu_collapsed,
            KeyCode::Char('r') => self.load_section(),
            KeyCode::Char('n') if self.section == Section::LeaveRequests => {
                self.set_leave_page(self.leave_page + 1)
            }
            KeyCode::Char('p') if self.section == Section::LeaveRequests => {
                self.set_leave_page(self.leave_page.saturating_sub(1))
            }
            KeyCode::Left => self.focus_area = FocusArea::Menu,
            KeyCode::Right => self.focus_area = FocusArea::MainView,
            KeyCode::Up => {
                if self.focus_area == FocusArea::Menu {
                    self.menu_selected_index = self.menu_selected_index.saturating_sub(1);
                } else {
                    self.selected_index = self.selected_index.saturating_sub(1);
                }
            }
            KeyCode::Down => {
                if self.focus_area == FocusArea::Menu {
                    if self.menu_selected_index < Section::ALL.len() - 1 {
                        self.menu_selected_index += 1;
                    }
                } else if self.selected_index + 1 < self.row_count() {
                    self.selected_index += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char('c') => {
                if self.focus_area == FocusArea::Menu {
                    self.open_section(Section::ALL[self.menu_selected_index]);
                }
            }
            _ => {}
        }
        self.should_quit
    }

    fn handle_command_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Enter => {
                let cmd_owned = self.command_input.trim().to_string();
                self.command_input.clear();
                self.command_cursor = 0;
                self.input_mode = InputMode::Normal;
                if cmd_owned.is_empty() {
                    return;
                }
                self.command_history.push(cmd_owned.clone());
                self.command_history_index = None;
                let cmd = AppCommand::from_str(&cmd_owned)
                    .unwrap_or_else(|_| AppCommand::Unknown(cmd_owned.clone()));
                self.execute(cmd);
            }
            KeyCode::Esc => {
                self.command_input.clear();
                self.command_cursor = 0;
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Tab => {
                if let Some(hint) = self.get_completion_hint() {
                    let insert = format!("{} ", hint);
                    self.command_input.push_str(&insert);
                    self.command_cursor = self.command_input.chars().count();
                }
            }
            KeyCode::Up => {
                if self.command_history.is_empty() {
                    return;
                }
                let next = match self.command_history_index {
                    None => self.command_history.len() - 1,
                    Some(i) => i.saturating_sub(1),
                };
                self.command_history_index = Some(next);
                self.command_input = self.command_history[next].clone();
                self.command_cursor = self.command_input.chars().count();
            }
            KeyCode::Down => {
                let Some(i) = self.command_history_index else {
                    return;
                };
                let n = i + 1;
                if n >= self.command_history.len() {
                    self.command_history_index = None;
                    self.command_input.clear();
                    self.command_cursor = 0;
                    return;
                }
                self.command_history_index = Some(n);
                self.command_input = self.command_history[n].clone();
                self.command_cursor = self.command_input.chars().count();
            }
            KeyCode::Backspace => {
                if self.command_cursor > 0 {
                    self.command_cursor -= 1;
                    let idx = self.byte_index(self.command_cursor);
                    self.command_input.remove(idx);
                }
            }
            KeyCode::Delete => {
                if self.command_cursor < self.command_input.chars().count() {
                    let idx = self.byte_index(self.command_cursor);
                    self.command_input.remove(idx);
                }
            }
            KeyCode::Left => self.command_cursor = self.command_cursor.saturating_sub(1),
            KeyCode::Right => {
                if self.command_cursor < self.command_input.chars().count() {
                    self.command_cursor += 1;
                }
            }
            KeyCode::Home => self.command_cursor = 0,
            KeyCode::End => self.command_cursor = self.command_input.chars().count(),
            KeyCode::Char(c) => {
                let idx = self.byte_index(self.command_cursor);
                self.command_input.insert(idx, c);
                self.command_cursor += 1;
            }
            _ => {}
        }
    }

    /// 光标按字符计数，中文输入时要换算成字节下标
    fn byte_index(&self, char_pos: usize) -> usize {
        self.command_input
            .char_indices()
            .nth(char_pos)
            .map(|(i, _)| i)
            .unwrap_or(self.command_input.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AdminProfile;
    use serde_json::json;

    fn app() -> (App, mpsc::UnboundedReceiver<ServiceRequest>) {
        let (req_tx, req_rx) = mpsc::unbounded_channel();
        let (_evt_tx, evt_rx) = mpsc::unbounded_channel();
        let auth = AuthContext::from_profile(
            AdminProfile {
                sin_number: Some("ADM1".into()),
                name: Some("Admin".into()),
                photo: Some(json!("aGk=")),
                ..AdminProfile::default()
            },
            "test",
        );
        let app = App::new(vec![], auth, "http://api".into(), 10, req_tx, evt_rx);
        (app, req_rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServiceRequest>) -> Vec<ServiceRequest> {
        let mut out = Vec::new();
        while let Ok(r) = rx.try_recv() {
            out.push(r);
        }
        out
    }

    fn run(app: &mut App, line: &str) {
        app.execute(line.parse().unwrap());
    }

    fn leave(id: usize) -> LeaveRequest {
        serde_json::from_value(json!({"request_id": id, "student_name": format!("S{}", id)}))
            .unwrap()
    }

    #[test]
    fn opening_a_section_fetches_its_data() {
        let (mut app, mut rx) = app();
        app.open_section(Section::SystemConfig);
        let reqs = drain(&mut rx);
        assert!(matches!(reqs[0], ServiceRequest::LoadSystemConfig));
        assert!(matches!(reqs[1], ServiceRequest::LoadSemester));
        assert!(matches!(reqs[2], ServiceRequest::LoadHolidays));

        app.open_section(Section::Overview);
        assert!(app.dashboard_loading);
        app.apply_event(AppEvent::Dashboard(None));
        assert!(!app.dashboard_loading);
        assert!(app.dashboard.is_none());
    }

    #[test]
    fn destructive_commands_wait_for_confirmation() {
        let (mut app, mut rx) = app();
        run(&mut app, "backup delete 4");
        assert!(app.pending_confirm.is_some());
        assert!(drain(&mut rx).is_empty());

        app.handle_key_event(KeyCode::Char('n'));
        assert!(app.pending_confirm.is_none());
        assert!(drain(&mut rx).is_empty());

        run(&mut app, "user delete S3");
        app.handle_key_event(KeyCode::Char('y'));
        let reqs = drain(&mut rx);
        assert!(matches!(&reqs[..], [ServiceRequest::DeleteUser { sin }] if sin == "S3"));
    }

    #[test]
    fn restore_prompt_warns_about_downtime() {
        let (mut app, mut rx) = app();
        run(&mut app, "backup restore 9");
        let prompt = app.pending_confirm.as_ref().map(|p| p.prompt.clone()).unwrap();
        assert!(prompt.contains("当前数据将被覆盖"));
        assert!(prompt.contains("恢复期间系统暂不可用"));

        app.handle_key_event(KeyCode::Char('y'));
        let reqs = drain(&mut rx);
        assert!(matches!(&reqs[..], [ServiceRequest::RestoreBackup { id }] if id == "9"));
    }

    #[test]
    fn clear_logs_is_disabled_when_empty() {
        let (mut app, mut rx) = app();
        run(&mut app, "logs clear");
        assert!(app.pending_confirm.is_none());
        assert!(drain(&mut rx).is_empty());

        let mut row = serde_json::Map::new();
        row.insert("id".into(), json!(1));
        app.apply_event(AppEvent::DeviceLogs(vec![row]));
        run(&mut app, "logs clear");
        assert!(app.pending_confirm.is_some());
    }

    #[test]
    fn config_draft_save_and_reset() {
        let (mut app, mut rx) = app();
        run(&mut app, "config save");
        assert!(drain(&mut rx).is_empty());

        run(&mut app, "config set gracePeriod=20");
        assert!(app.system_config.is_dirty());
        run(&mut app, "config save");
        let reqs = drain(&mut rx);
        assert!(matches!(&reqs[..], [ServiceRequest::SaveSystemConfig(c)] if c.grace_period == 20));

        run(&mut app, "config reset");
        assert!(!app.system_config.is_dirty());
        assert_eq!(app.system_config.current().grace_period, 15);
    }

    #[test]
    fn holiday_edits_only_send_changed_rows_and_keep_failures() {
        let (mut app, mut rx) = app();
        let rows: Vec<Holiday> = (1..=3)
            .map(|i| Holiday {
                id: i.to_string(),
                date: format!("2024-01-0{}", i),
                day: None,
                reason: "Festival".into(),
            })
            .collect();
        app.apply_event(AppEvent::Holidays(rows.clone()));

        run(&mut app, "holidays edit 2 date=2024-01-15");
        run(&mut app, "holidays edit 3 reason=\"Founders Day\"");
        run(&mut app, "holidays save");
        let reqs = drain(&mut rx);
        let ServiceRequest::SaveHolidays(sent) = &reqs[0] else {
            panic!("expected SaveHolidays, got {:?}", reqs);
        };
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].day.as_deref(), Some("Monday"));

        let mut saved = rows.clone();
        saved[2].reason = "Founders Day".into();
        app.apply_event(AppEvent::HolidaysSaved {
            list: saved,
            failed: vec![sent[0].clone()],
        });
        let pending = app.holiday_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, "2");
    }

    #[test]
    fn holidays_reset_without_edits_only_notifies() {
        let (mut app, _rx) = app();
        let row = Holiday {
            id: "1".into(),
            date: "2024-01-26".into(),
            day: None,
            reason: "Republic Day".into(),
        };
        app.apply_event(AppEvent::Holidays(vec![row]));
        run(&mut app, "holidays reset");
        assert_eq!(
            app.log_messages.last().map(String::as_str),
            Some("节假日没有未保存的修改")
        );

        run(&mut app, "holidays edit 1 reason=Holiday");
        assert_eq!(app.holiday_pending().len(), 1);
        run(&mut app, "holidays reset");
        assert!(app.holiday_pending().is_empty());
        assert_eq!(app.holidays.current()[0].reason, "Republic Day");
        assert_eq!(
            app.log_messages.last().map(String::as_str),
            Some("节假日修改已还原")
        );
    }

    #[test]
    fn leave_pages_are_clamped() {
        let (mut app, _rx) = app();
        app.open_section(Section::LeaveRequests);
        app.apply_event(AppEvent::LeaveRequests((1..=25).map(leave).collect()));
        assert_eq!(app.leave_page_count(), 3);
        for _ in 0..5 {
            app.handle_key_event(KeyCode::Char('n'));
        }
        assert_eq!(app.leave_page, 2);
        assert_eq!(app.leave_page_rows().len(), 5);
        run(&mut app, "leave page 1");
        assert_eq!(app.leave_page_rows()[0].request_id, "1");

        // 列表变短后页码跟着收回
        app.apply_event(AppEvent::LeaveRequests((1..=4).map(leave).collect()));
        run(&mut app, "leave page 3");
        assert_eq!(app.leave_page, 0);
    }

    #[test]
    fn leave_stage_update_uses_current_filter() {
        let (mut app, mut rx) = app();
        app.apply_event(AppEvent::LeaveRequests(vec![leave(8)]));
        run(&mut app, "leave filter status=pending");
        run(&mut app, "leave set 8 principal approved");
        let reqs = drain(&mut rx);
        match &reqs[1] {
            ServiceRequest::UpdateLeaveRequest { request, filter } => {
                assert_eq!(request.principal_approval, ApprovalStatus::Approved);
                assert_eq!(filter.status, Some(ApprovalStatus::Pending));
            }
            other => panic!("unexpected {:?}", other),
        }
        run(&mut app, "leave set 8 dean approved");
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn q_asks_before_logging_out() {
        let (mut app, _rx) = app();
        assert!(!app.handle_key_event(KeyCode::Char('q')));
        assert!(app.pending_confirm.is_some());
        assert!(app.handle_key_event(KeyCode::Char('y')));
        assert!(!app.auth.is_signed_in());
    }

    #[test]
    fn user_search_filters_locally() {
        let (mut app, _rx) = app();
        app.open_section(Section::Users);
        let users: Vec<User> = serde_json::from_value(json!([
            {"sin_number": "S1", "name": "Asha", "email": "asha@x.edu", "role": "student"},
            {"sin_number": "S2", "name": "Bala", "email": "bala@x.edu", "role": "hod"}
        ]))
        .unwrap();
        app.apply_event(AppEvent::Users(users));
        run(&mut app, "users search BALA");
        assert_eq!(app.visible_users().len(), 1);
        assert_eq!(app.row_count(), 1);
    }

    #[test]
    fn command_line_completion_and_history() {
        let (mut app, _rx) = app();
        app.handle_key_event(KeyCode::Char('/'));
        for c in "back".chars() {
            app.handle_key_event(KeyCode::Char(c));
        }
        assert_eq!(app.get_completion_hint().as_deref(), Some("up"));
        app.handle_key_event(KeyCode::Tab);
        assert_eq!(app.command_input, "backup ");
        assert_eq!(app.get_completion_hint().as_deref(), Some("create"));
        app.handle_key_event(KeyCode::Esc);

        app.handle_key_event(KeyCode::Char('/'));
        for c in "help".chars() {
            app.handle_key_event(KeyCode::Char(c));
        }
        app.handle_key_event(KeyCode::Enter);
        assert_eq!(app.command_history, vec!["help".to_string()]);
        assert_eq!(app.log_messages.last().map(String::as_str), Some(HELP_TEXT));
    }
}
