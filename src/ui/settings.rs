use super::{header_style, selected_style, view_block};
use crate::app_state::App;
use crate::model::system_config::minutes_to_hhmm;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

fn dirty_title(name: &str, dirty: bool) -> Line<'static> {
    if dirty {
        Line::from(vec![
            Span::raw(format!("{} ", name)),
            Span::styled(
                "● 未保存",
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD),
            ),
        ])
    } else {
        Line::from(name.to_string())
    }
}

fn kv(key: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{:<16}", key), header_style()),
        Span::raw(value),
    ])
}

fn yes_no(b: bool) -> String {
    if b { "是" } else { "否" }.to_string()
}

pub fn render_config(f: &mut Frame, area: Rect, app: &App) {
    let outer = view_block(app, "系统设置 (config|semester|holidays ..)".to_string());
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(inner);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(9), Constraint::Min(6)])
        .split(cols[0]);

    let cfg = app.system_config.current();
    let rules = vec![
        kv("最低出勤率", format!("{:.1}%", cfg.min_attendance)),
        kv("宽限时间", minutes_to_hhmm(cfg.grace_period)),
        kv("迟到阈值", minutes_to_hhmm(cfg.late_mark_threshold)),
        kv("自动锁定", format!("{} 小时", cfg.auto_lockout_after)),
        kv("考勤设备", cfg.biometric_device.to_string()),
        kv("自动审批", yes_no(cfg.enable_auto_approval)),
        kv("迟到通知", yes_no(cfg.notify_on_late_arrival)),
    ];
    f.render_widget(
        Paragraph::new(rules).block(
            Block::default()
                .borders(Borders::ALL)
                .title(dirty_title("考勤规则", app.system_config.is_dirty())),
        ),
        left[0],
    );

    let sem = app.semester.current();
    let date = |d: Option<chrono::NaiveDate>| {
        d.map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let semester = vec![
        kv("学期", if sem.name.is_empty() { "-".to_string() } else { sem.name.clone() }),
        kv("开始", date(sem.start_date)),
        kv("结束", date(sem.end_date)),
        kv(
            "总天数",
            sem.total_days()
                .map(|d| d.to_string())
                .unwrap_or_else(|| "-".to_string()),
        ),
    ];
    f.render_widget(
        Paragraph::new(semester).block(
            Block::default()
                .borders(Borders::ALL)
                .title(dirty_title("学期", app.semester.is_dirty())),
        ),
        left[1],
    );

    render_holidays(f, cols[1], app);
}

fn render_holidays(f: &mut Frame, area: Rect, app: &App) {
    let pending = app.holiday_pending();
    let title = dirty_title(
        &format!("节假日 {} 条，待保存 {}", app.holidays.current().len(), pending.len()),
        !pending.is_empty(),
    );
    let block = Block::default().borders(Borders::ALL).title(title);
    if app.holidays.current().is_empty() {
        f.render_widget(Paragraph::new("暂无节假日 (holidays upload <csv>)").block(block), area);
        return;
    }

    let rows: Vec<Row> = app
        .holidays
        .current()
        .iter()
        .map(|h| {
            let edited = pending.iter().any(|p| p.id == h.id);
            let style = if edited {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(h.id.clone()),
                Cell::from(h.display_date().to_string()),
                Cell::from(h.day.clone().unwrap_or_default()),
                Cell::from(h.reason.clone()),
            ])
            .style(style)
        })
        .collect();
    let header = Row::new(vec!["ID", "日期", "星期", "原因"]).style(header_style());
    let table = Table::new(
        rows,
        [
            Constraint::Length(6),
            Constraint::Length(11),
            Constraint::Length(10),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block)
    .highlight_style(selected_style());
    let mut state = TableState::default();
    state.select(Some(app.selected_index));
    f.render_stateful_widget(table, area, &mut state);
}

pub fn render_profile(f: &mut Frame, area: Rect, app: &App) {
    let lines = match app.auth.profile() {
        Some(p) => {
            let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
            vec![
                kv("SIN", app.auth.actor_id()),
                kv("姓名", field(&p.name)),
                kv("邮箱", field(&p.email)),
                kv("角色", field(&p.role)),
                kv("院系", field(&p.department)),
                kv("电话", field(&p.phone)),
                kv(
                    "头像",
                    match app.auth.photo_bytes() {
                        Some(b) => format!("{} 字节 (profile photo <path> 导出)", b.len()),
                        None => "无".to_string(),
                    },
                ),
                Line::from(""),
                Line::from(Span::styled(
                    format!("资料来源: {}", app.auth.source()),
                    Style::default()
                        .fg(Color::Gray)
                        .add_modifier(Modifier::ITALIC),
                )),
            ]
        }
        None => vec![
            Line::from("未登录，写操作以 admin 身份记录"),
            Line::from(Span::styled(
                "设置 ADMIN_SESSION_FILE 或 ADMIN_SIN_NUMBER 后重启",
                Style::default().fg(Color::Gray),
            )),
        ],
    };
    f.render_widget(
        Paragraph::new(lines).block(view_block(app, "个人资料 (q 注销)".to_string())),
        area,
    );
}
