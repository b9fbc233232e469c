mod overview;
mod records;
mod settings;

use crate::app_state::{App, FocusArea, InputMode, Section};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

pub fn draw(f: &mut Frame, app: &App) {
    // 创建布局
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // 顶部标题栏
            Constraint::Min(0),    // 中间内容区域
            Constraint::Min(8),    // 底部命令/日志区域
        ])
        .split(f.size());

    render_top_bar(f, chunks[0], app);

    // 菜单收起时只留一列图标宽度
    let menu_width = if app.menu_collapsed { 5 } else { 22 };
    let middle_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(menu_width), Constraint::Min(0)])
        .split(chunks[1]);

    render_left_menu(f, middle_chunks[0], app);
    render_main_view(f, middle_chunks[1], app);
    render_bottom_bar(f, chunks[2], app);

    if app.pending_confirm.is_some() {
        render_confirm(f, app);
    }
}

/// 主视图边框：有焦点时高亮
pub(crate) fn view_block(app: &App, title: String) -> Block<'static> {
    let style = if app.focus_area == FocusArea::MainView {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::White)
    };
    Block::default().borders(Borders::ALL).title(title).style(style)
}

pub(crate) fn selected_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::White)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn header_style() -> Style {
    Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD)
}

fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let title = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(Color::Cyan));

    let actor_style = if app.auth.is_signed_in() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::Yellow)
    };
    let title_text = Line::from(vec![
        Span::styled(
            " 考勤管理后台 ",
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(app.auth.display_name(), actor_style),
        Span::raw(format!(" ({}) | ", app.auth.actor_id())),
        Span::styled(app.api_url.clone(), Style::default().fg(Color::Gray)),
    ]);

    let paragraph = Paragraph::new(title_text)
        .block(title)
        .alignment(Alignment::Center);

    f.render_widget(paragraph, area);
}

fn menu_icon(section: Section) -> &'static str {
    match section {
        Section::Overview => "◆",
        Section::Users => "☺",
        Section::LeaveRequests => "✉",
        Section::DeviceLogs => "⌚",
        Section::DeletedUsers => "♻",
        Section::Backups => "⛁",
        Section::SystemConfig => "⚙",
        Section::Profile => "☰",
    }
}

fn render_left_menu(f: &mut Frame, area: Rect, app: &App) {
    let menu_items: Vec<ListItem> = Section::ALL
        .iter()
        .enumerate()
        .map(|(i, section)| {
            let is_selected = i == app.menu_selected_index;
            let is_active = *section == app.section;

            let style = if is_selected {
                if app.focus_area == FocusArea::Menu {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                }
            } else if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };

            let text = if app.menu_collapsed {
                menu_icon(*section).to_string()
            } else {
                format!("{} {}", menu_icon(*section), section.title())
            };
            ListItem::new(text).style(style)
        })
        .collect();

    let title = match (app.menu_collapsed, &app.focus_area) {
        (true, _) => "",
        (false, FocusArea::Menu) => "菜单 (Enter 打开)",
        (false, FocusArea::MainView) => "菜单 (← 切换)",
    };

    let menu =
        List::new(menu_items).block(Block::default().borders(Borders::ALL).title(title).style(
            if app.focus_area == FocusArea::Menu {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            },
        ));

    f.render_widget(menu, area);
}

fn render_main_view(f: &mut Frame, area: Rect, app: &App) {
    match app.section {
        Section::Overview => overview::render(f, area, app),
        Section::Users => records::render_users(f, area, app),
        Section::LeaveRequests => records::render_leave(f, area, app),
        Section::DeviceLogs => records::render_device_logs(f, area, app),
        Section::DeletedUsers => records::render_deleted(f, area, app),
        Section::Backups => records::render_backups(f, area, app),
        Section::SystemConfig => settings::render_config(f, area, app),
        Section::Profile => settings::render_profile(f, area, app),
    }
}

fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let bottom_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    // 命令输入区域
    let command_prompt = if app.input_mode == InputMode::Command {
        let mut spans = vec![Span::styled(
            "命令: ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )];
        let (left, right): (String, String) = {
            let chars: Vec<char> = app.command_input.chars().collect();
            let cur = app.command_cursor.min(chars.len());
            (chars[..cur].iter().collect(), chars[cur..].iter().collect())
        };
        spans.push(Span::raw(left));
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(right));

        // 补全建议用灰色显示
        if let Some(hint) = app.get_completion_hint() {
            spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
        }

        vec![
            Line::from(spans),
            Line::from("Enter执行 Esc取消 Tab补全 ←→光标 Home/End ↑历史 ↓下一条"),
        ]
    } else {
        vec![
            Line::from(vec![
                Span::styled("命令: ", Style::default().fg(Color::Yellow)),
                Span::raw("(按 / 进入命令模式，输入 help 查看命令)"),
            ]),
            Line::from("/命令 ←→切换 ↑↓导航 Enter打开 r刷新 m收起菜单 n/p翻页 q注销"),
        ]
    };
    let command_paragraph = Paragraph::new(command_prompt).block(
        Block::default()
            .borders(Borders::ALL)
            .title(if app.input_mode == InputMode::Command {
                "命令输入模式"
            } else {
                "命令输入"
            })
            .style(if app.input_mode == InputMode::Command {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            }),
    );
    f.render_widget(command_paragraph, bottom_chunks[0]);

    // 最新的日志在顶部
    let log_items: Vec<ListItem> = app
        .log_messages
        .iter()
        .rev()
        .take(20)
        .map(|msg| {
            let style = if msg.starts_with('✓') {
                Style::default().fg(Color::Green)
            } else if msg.starts_with('✗') {
                Style::default().fg(Color::Red)
            } else if msg.starts_with('⚠') {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(msg.as_str()).style(style)
        })
        .collect();

    let log = List::new(log_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("日志 (共 {} 条)", app.log_messages.len()))
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(log, bottom_chunks[1]);
}

fn render_confirm(f: &mut Frame, app: &App) {
    let Some(pending) = &app.pending_confirm else {
        return;
    };
    let area = centered_rect(50, 7, f.size());
    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            pending.prompt.as_str(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[y] 确认", Style::default().fg(Color::Red)),
            Span::raw("    "),
            Span::styled("[n] 取消", Style::default().fg(Color::Green)),
        ]),
    ];
    let popup = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("确认操作")
                .style(Style::default().fg(Color::Yellow)),
        );
    f.render_widget(Clear, area);
    f.render_widget(popup, area);
}

/// 按百分比宽度、固定行高居中
fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let width = r.width * percent_x / 100;
    Rect {
        x: r.x + (r.width.saturating_sub(width)) / 2,
        y: r.y + (r.height.saturating_sub(height)) / 2,
        width,
        height: height.min(r.height),
    }
}
