use super::{header_style, selected_style, view_block};
use crate::app_state::App;
use crate::model::device_log::{cell_text, columns};
use crate::model::{date_part, ApprovalStage, ApprovalStatus, BackupStatus, Role};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState},
    Frame,
};

fn role_color(role: Option<Role>) -> Color {
    match role {
        Some(Role::Student) => Color::Cyan,
        Some(Role::Staff) | Some(Role::Hodstaff) => Color::Green,
        Some(Role::Hod) => Color::Magenta,
        Some(Role::Principal) | Some(Role::PlacementOfficer) => Color::LightBlue,
        Some(Role::Admin) => Color::Red,
        None => Color::Gray,
    }
}

fn status_color(status: ApprovalStatus) -> Color {
    match status {
        ApprovalStatus::Pending => Color::Yellow,
        ApprovalStatus::Approved => Color::Green,
        ApprovalStatus::Rejected => Color::Red,
    }
}

fn opt(v: &Option<String>) -> String {
    v.clone().unwrap_or_else(|| "-".to_string())
}

/// 空列表时显示一行提示
fn render_empty(f: &mut Frame, area: Rect, app: &App, title: String, hint: &str) {
    let paragraph = Paragraph::new(hint.to_string()).block(view_block(app, title));
    f.render_widget(paragraph, area);
}

fn render_table(f: &mut Frame, area: Rect, table: Table<'_>, selected: usize) {
    let mut state = TableState::default();
    state.select(Some(selected));
    let table = table
        .highlight_style(selected_style())
        .highlight_symbol(">> ");
    f.render_stateful_widget(table, area, &mut state);
}

pub fn render_users(f: &mut Frame, area: Rect, app: &App) {
    let users = app.visible_users();
    let query = if app.user_query.is_empty() {
        String::new()
    } else {
        format!(" 搜索: \"{}\"", app.user_query)
    };
    let title = format!("用户 {} / {}{}", users.len(), app.users.len(), query);
    if users.is_empty() {
        return render_empty(f, area, app, title, "暂无用户 (user new sin_number=.. name=.. 新建)");
    }

    let rows: Vec<Row> = users
        .iter()
        .map(|u| {
            Row::new(vec![
                Cell::from(u.sin_number.clone()),
                Cell::from(u.name.clone()),
                Cell::from(u.email.clone()),
                Cell::from(u.role.clone()).style(Style::default().fg(role_color(u.role_kind()))),
                Cell::from(opt(&u.department)),
                Cell::from(opt(&u.year)),
                Cell::from(if u.photo.is_some() { "✓" } else { "" }),
            ])
        })
        .collect();
    let header = Row::new(vec!["SIN", "姓名", "邮箱", "角色", "院系", "年级", "照片"])
        .style(header_style());
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(14),
            Constraint::Min(20),
            Constraint::Length(18),
            Constraint::Length(10),
            Constraint::Length(6),
            Constraint::Length(4),
        ],
    )
    .header(header)
    .block(view_block(app, title));
    render_table(f, area, table, app.selected_index);
}

pub fn render_leave(f: &mut Frame, area: Rect, app: &App) {
    let page_rows = app.leave_page_rows();
    let filter = if app.leave_filter.is_empty() {
        String::new()
    } else {
        format!(" [{}]", app.leave_filter.describe())
    };
    let title = format!(
        "请假申请 {} 条{} 第 {}/{} 页 (n/p 翻页)",
        app.leave_requests.len(),
        filter,
        app.leave_page + 1,
        app.leave_page_count()
    );
    if page_rows.is_empty() {
        return render_empty(f, area, app, title, "没有符合条件的申请");
    }

    let mut header_cells = vec!["ID", "申请人", "类型", "起止", "原因"];
    header_cells.extend(ApprovalStage::ALL.iter().map(|s| s.short_label()));
    let header = Row::new(header_cells).style(header_style());

    let rows: Vec<Row> = page_rows
        .iter()
        .map(|r| {
            let mut cells = vec![
                Cell::from(r.request_id.clone()),
                Cell::from(r.requester_name().to_string()),
                Cell::from(r.request_type.to_string()),
                Cell::from(format!(
                    "{} ~ {}",
                    date_part(&r.start_date),
                    date_part(&r.end_date)
                )),
                Cell::from(r.reason.clone()),
            ];
            cells.extend(ApprovalStage::ALL.iter().map(|stage| {
                let status = r.stage(*stage);
                Cell::from(status.as_str()).style(Style::default().fg(status_color(status)))
            }));
            Row::new(cells)
        })
        .collect();

    let mut widths = vec![
        Constraint::Length(8),
        Constraint::Min(12),
        Constraint::Length(11),
        Constraint::Length(23),
        Constraint::Min(12),
    ];
    widths.extend([Constraint::Length(9); 5]);
    let table = Table::new(rows, widths)
        .header(header)
        .block(view_block(app, title));
    render_table(f, area, table, app.selected_index);
}

pub fn render_device_logs(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(3)])
        .split(area);

    let title = format!("设备日志 {} 条 (logs upload <csv> | logs clear)", app.device_logs.len());
    if app.device_logs.is_empty() {
        render_empty(f, chunks[0], app, title, "暂无设备日志");
    } else {
        let cols = columns(&app.device_logs);
        let header = Row::new(cols.clone()).style(header_style());
        let rows: Vec<Row> = app
            .device_logs
            .iter()
            .map(|row| Row::new(cols.iter().map(|c| cell_text(row, c)).collect::<Vec<_>>()))
            .collect();
        let widths = vec![Constraint::Min(8); cols.len().max(1)];
        let table = Table::new(rows, widths)
            .header(header)
            .block(view_block(app, title));
        render_table(f, chunks[0], table, app.selected_index);
    }

    let (label, pct) = match app.upload_progress {
        Some(p) => (format!("上传中 {}%", p), p.min(100)),
        None => ("空闲".to_string(), 0),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("上传进度"))
        .gauge_style(Style::default().fg(Color::Green))
        .percent(u16::from(pct))
        .label(label);
    f.render_widget(gauge, chunks[1]);
}

pub fn render_deleted(f: &mut Frame, area: Rect, app: &App) {
    let users = app.visible_deleted();
    let title = format!(
        "已删除用户 {} / {} (deleted restore|purge <sin>)",
        users.len(),
        app.deleted_users.len()
    );
    if users.is_empty() {
        return render_empty(f, area, app, title, "没有已删除的用户");
    }
    let rows: Vec<Row> = users
        .iter()
        .map(|u| {
            let deleted_at = u
                .deleted_at_ts()
                .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_else(|| opt(&u.deleted_at));
            Row::new(vec![
                Cell::from(u.sin_number.clone()),
                Cell::from(u.name.clone()),
                Cell::from(u.email.clone()),
                Cell::from(u.role.clone())
                    .style(Style::default().fg(role_color(u.role.parse().ok()))),
                Cell::from(opt(&u.phone)),
                Cell::from(deleted_at),
            ])
        })
        .collect();
    let header = Row::new(vec!["SIN", "姓名", "邮箱", "角色", "电话", "删除时间"])
        .style(header_style());
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(14),
            Constraint::Min(20),
            Constraint::Length(18),
            Constraint::Length(14),
            Constraint::Length(17),
        ],
    )
    .header(header)
    .block(view_block(app, title));
    render_table(f, area, table, app.selected_index);
}

pub fn render_backups(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let schedule = app
        .schedule
        .as_ref()
        .map(|s| s.describe())
        .unwrap_or_else(|| "定时备份: 未加载".to_string());
    let line = Line::from(vec![
        Span::styled("⏰ ", Style::default().fg(Color::Yellow)),
        Span::raw(schedule),
    ]);
    f.render_widget(
        Paragraph::new(line).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    let title = format!("备份 {} 个 (backup create|restore|delete|download)", app.backups.len());
    if app.backups.is_empty() {
        return render_empty(f, chunks[1], app, title, "暂无备份");
    }
    let rows: Vec<Row> = app
        .backups
        .iter()
        .map(|b| {
            let color = match b.status {
                BackupStatus::Completed => Color::Green,
                BackupStatus::Failed => Color::Red,
                BackupStatus::InProgress => Color::Yellow,
            };
            Row::new(vec![
                Cell::from(b.id.clone()),
                Cell::from(opt(&b.name)),
                Cell::from(b.date.as_deref().map(date_part).unwrap_or("-").to_string()),
                Cell::from(b.size.clone()),
                Cell::from(b.backup_type.to_string()),
                Cell::from(b.status.label()).style(Style::default().fg(color)),
                Cell::from(opt(&b.description)),
            ])
        })
        .collect();
    let header = Row::new(vec!["ID", "名称", "日期", "大小", "类型", "状态", "说明"])
        .style(header_style());
    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Length(24),
            Constraint::Length(11),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(view_block(app, title));
    render_table(f, chunks[1], table, app.selected_index);
}
