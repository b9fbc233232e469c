mod api;
mod app_service;
mod app_state;
mod auth;
mod commands;
mod config;
mod model;
mod scheduler;
mod storage;
mod ui;

use anyhow::Context;
use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{info, warn};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::{AdminApi, AdminBackend};
use crate::app_service::{AdminService, ServiceRequest};
use crate::app_state::{App, AppEvent, Section};
use crate::auth::AuthContext;
use crate::config::ConsoleConfig;
use crate::scheduler::BackupScheduler;
use crate::ui::draw;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let ts = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let log_dir = PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir).context("无法创建日志目录")?;
    let log_file = std::fs::File::create(log_dir.join(format!("app-{}.log", ts)))
        .context("无法创建日志文件")?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file))) // 日志写文件，不干扰 TUI
        .filter_level(log::LevelFilter::Warn)
        .filter_module("attendance_admin", log::LevelFilter::Info)
        .filter_module("sqlx", log::LevelFilter::Error)
        .filter_module("sea_orm", log::LevelFilter::Error)
        .init();

    let mut startup_info = Vec::new();

    let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    startup_info.push(format!("当前工作目录: {}", current_dir.display()));

    let env_path = current_dir.join(".env");
    if env_path.exists() {
        match dotenv::from_path(&env_path) {
            Ok(()) => startup_info.push(format!("✓ 已加载 .env: {}", env_path.display())),
            Err(e) => startup_info.push(format!("⚠ .env 解析失败: {}", e)),
        }
    } else {
        startup_info.push("⚠ 未找到 .env 文件，使用系统环境变量".to_string());
    }

    let config = ConsoleConfig::from_env();
    startup_info.push(format!("后端地址: {}", config.api_url));
    startup_info.push(format!("请假接口: {}", config.leave_api_url));
    if let Some(proxy) = &config.proxy {
        startup_info.push(format!("代理: {}", proxy));
    }

    let auth = AuthContext::load(config.session_file.as_deref());
    if auth.is_signed_in() {
        startup_info.push(format!(
            "✓ 当前管理员: {} ({}，来源 {})",
            auth.display_name(),
            auth.actor_id(),
            auth.source()
        ));
    } else {
        startup_info.push("⚠ 未读取到管理员资料，操作人记为 admin".to_string());
    }

    // 本地库只存定时备份设置，失败时其余功能照常
    let db = match storage::establish_connection(&config.db_url).await {
        Ok(connection) => {
            startup_info.push("✓ 本地数据库连接成功".to_string());
            Some(Arc::new(connection))
        }
        Err(e) => {
            warn!("本地数据库连接失败: {}", e);
            startup_info.push(format!("⚠ 本地数据库不可用，定时备份已停用: {}", e));
            None
        }
    };

    let api = AdminApi::new(&config).context("无法创建 HTTP 客户端")?;
    info!("{} ready", api);
    let backend: Arc<dyn AdminBackend> = Arc::new(api);

    let (req_tx, req_rx) = mpsc::unbounded_channel::<ServiceRequest>();
    let (evt_tx, evt_rx) = mpsc::unbounded_channel::<AppEvent>();

    let service = Arc::new(AdminService::new(
        backend.clone(),
        auth.clone(),
        db.clone(),
        evt_tx.clone(),
        config.download_dir.clone(),
    ));
    service.spawn(req_rx);

    if let Some(db) = db {
        BackupScheduler::new(db, backend, evt_tx.clone()).start();
    }

    // TUI 初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let mut app = App::new(
        startup_info,
        auth,
        config.api_url.clone(),
        config.leave_page_size,
        req_tx,
        evt_rx,
    );
    app.open_section(Section::Overview);
    app.focus_area = app_state::FocusArea::Menu;

    let res = match app.evt_rx.take() {
        Some(rx) => run_app_loop(&mut terminal, &mut app, rx).await,
        None => Ok(()),
    };

    // 恢复终端
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res.context("界面循环异常退出")
}

async fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut evt_rx: mpsc::UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        while let Ok(event) = evt_rx.try_recv() {
            app.apply_event(event);
        }

        if app.should_quit {
            return Ok(());
        }

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key_event(key.code) {
                    return Ok(());
                }
            }
        }
    }
}
