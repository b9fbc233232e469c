use super::{header_style, view_block};
use crate::app_state::App;
use crate::model::dashboard::percentage;
use crate::model::DashboardSummary;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let Some(summary) = &app.dashboard else {
        let text = if app.dashboard_loading {
            "正在加载汇总数据..."
        } else {
            "暂无数据 (按 r 重新加载)"
        };
        let paragraph = Paragraph::new(text).block(view_block(app, "概览".to_string()));
        f.render_widget(paragraph, area);
        return;
    };

    let outer = view_block(app, "概览 (r 刷新)".to_string());
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(9),
        ])
        .split(inner);

    render_counts(f, chunks[0], summary);
    render_monthly(f, chunks[1], summary);
    render_shares(f, chunks[2], summary);
}

fn render_counts(f: &mut Frame, area: Rect, s: &DashboardSummary) {
    let line = Line::from(vec![
        Span::styled("用户 ", header_style()),
        Span::raw(format!("{}  ", s.total_users)),
        Span::styled("学生 ", header_style()),
        Span::raw(format!("{}  ", s.total_students)),
        Span::styled("教职工 ", header_style()),
        Span::raw(format!("{}  ", s.total_staff)),
        Span::styled("请假申请 ", header_style()),
        Span::raw(format!("{}", s.request_total())),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_monthly(f: &mut Frame, area: Rect, s: &DashboardSummary) {
    let series = s.month_series();
    let mut chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(Line::from(vec![
                    Span::raw("月度申请 "),
                    Span::styled("■ 学生 ", Style::default().fg(Color::Cyan)),
                    Span::styled("■ 教职工", Style::default().fg(Color::Magenta)),
                ])),
        )
        .bar_width(2)
        .bar_gap(0)
        .group_gap(1);
    for point in series.iter() {
        let bars = [
            Bar::default()
                .value(point.students)
                .style(Style::default().fg(Color::Cyan)),
            Bar::default()
                .value(point.staff)
                .style(Style::default().fg(Color::Magenta)),
        ];
        chart = chart.data(BarGroup::default().label(Line::from(point.label())).bars(&bars));
    }
    f.render_widget(chart, area);
}

fn render_shares(f: &mut Frame, area: Rect, s: &DashboardSummary) {
    let total = s.request_total();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3); 3])
        .split(area);

    let shares = [
        ("待审批", s.pending_requests, Color::Yellow),
        ("已批准", s.approved_requests, Color::Green),
        ("已拒绝", s.rejected_requests, Color::Red),
    ];
    for (row, (label, count, color)) in rows.iter().zip(shares) {
        let pct = percentage(count, total);
        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title(label))
            .gauge_style(Style::default().fg(color))
            .ratio((pct / 100.0).clamp(0.0, 1.0))
            .label(format!("{} / {} ({:.1}%)", count, total, pct));
        f.render_widget(gauge, *row);
    }
}
