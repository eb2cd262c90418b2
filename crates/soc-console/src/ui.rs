use crate::format;
use crate::state::{row_count, App, Screen};
use crate::theme::{self, icons};
use chrono::Utc;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Clear, Paragraph, Row, Sparkline, Table, Tabs, Wrap},
    Frame,
};
use soc_client::engine::SyncEngine;
use soc_client::source::SourceKind;
use soc_client::state::Dashboard;

pub fn render(f: &mut Frame, app: &App, engine: &SyncEngine) {
    match app.screen {
        Screen::Login => render_login(f, app),
        Screen::Main => render_main(f, app, engine),
    }

    if let Some(alert) = &app.alert {
        render_alert(f, alert);
    }
}

fn render_login(f: &mut Frame, app: &App) {
    let area = centered_rect(f.size(), 44, 9);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("snare ops console")
        .border_style(theme::HEADER_STYLE);
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let masked = "*".repeat(app.password.chars().count());
    let status = if app.verifying {
        Span::styled("verifying...", theme::DIM_STYLE)
    } else {
        Span::raw("")
    };

    let text = vec![
        Line::from(""),
        Line::from(Span::styled("Password", theme::DIM_STYLE)),
        Line::from(format!("> {masked}")),
        Line::from(""),
        Line::from(status),
        Line::from(Span::styled("Enter to sign in, Esc to quit", theme::DIM_STYLE)),
    ];
    f.render_widget(Paragraph::new(text), inner);
}

fn render_main(f: &mut Frame, app: &App, engine: &SyncEngine) {
    let dashboard = &engine.dashboard;
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(9),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
        ])
        .split(f.size());

    render_overview(f, dashboard, chunks[0]);
    render_tabs(f, dashboard, chunks[1]);
    render_records(f, app, dashboard, chunks[2]);
    render_footer(f, dashboard, chunks[3]);
}

fn render_overview(f: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(26),
            Constraint::Percentage(45),
            Constraint::Min(24),
        ])
        .split(area);

    let overview = &dashboard.overview;
    let totals = vec![
        Line::from(Span::styled("Status", theme::HEADER_STYLE)),
        Line::from(format!("uptime   {}h", overview.uptime_hours)),
        Line::from(format!("clients  {}", overview.total_clients)),
        Line::from(format!("inbound  {}", overview.total_inbound)),
        Line::from(format!("marked   {}", overview.total_marked)),
        Line::from(format!("hits     {}", overview.total_hit)),
        Line::from(if overview.synced {
            Span::raw("")
        } else {
            Span::styled("awaiting first sync", theme::DIM_STYLE)
        }),
    ];
    f.render_widget(
        Paragraph::new(totals).block(Block::default().borders(Borders::ALL)),
        columns[0],
    );

    let history = &dashboard.charts.history;
    let title = format!(
        "Hits, last {}h (newest {}h)",
        history.labels.len(),
        history.labels.first().copied().unwrap_or(0)
    );
    f.render_widget(
        Sparkline::default()
            .block(Block::default().borders(Borders::ALL).title(title))
            .style(Style::default().fg(Color::Rgb(214, 93, 14)))
            .data(&history.hit),
        columns[1],
    );

    let distribution = &dashboard.charts.distribution;
    if distribution.labels.is_empty() {
        f.render_widget(
            Paragraph::new(Line::from(Span::styled("no accesses yet", theme::DIM_STYLE)))
                .block(Block::default().borders(Borders::ALL).title("Accessed services")),
            columns[2],
        );
    } else {
        let data: Vec<(&str, u64)> = distribution
            .labels
            .iter()
            .zip(&distribution.percents)
            .map(|(label, percent)| (label.as_str(), percent.round() as u64))
            .collect();
        f.render_widget(
            BarChart::default()
                .block(Block::default().borders(Borders::ALL).title("Accessed services (%)"))
                .bar_width(8)
                .bar_gap(1)
                .data(&data),
            columns[2],
        );
    }
}

fn render_tabs(f: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let titles: Vec<Line> = SourceKind::ALL
        .iter()
        .map(|kind| Line::from(kind.as_str()))
        .collect();
    let selected = SourceKind::ALL
        .iter()
        .position(|kind| *kind == dashboard.active)
        .unwrap_or(0);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(24), Constraint::Length(12)])
        .split(area);

    let tabs = Tabs::new(titles)
        .select(selected)
        .highlight_style(theme::SELECTED_STYLE);
    f.render_widget(tabs, columns[0]);

    if dashboard.show_loading {
        f.render_widget(
            Paragraph::new(Span::styled("loading...", theme::DIM_STYLE)),
            columns[1],
        );
    }
}

fn render_records(f: &mut Frame, app: &App, dashboard: &Dashboard, area: Rect) {
    if !dashboard.source_loaded(dashboard.active) {
        let message = if dashboard.show_loading {
            "loading..."
        } else {
            "no data yet"
        };
        f.render_widget(
            Paragraph::new(Line::from(Span::styled(message, theme::DIM_STYLE)))
                .block(Block::default().borders(Borders::ALL)),
            area,
        );
        return;
    }

    match dashboard.active {
        SourceKind::Clients => render_clients(f, app, dashboard, area),
        SourceKind::Sessions => render_sessions(f, app, dashboard, area),
        SourceKind::Sync => render_sync(f, app, dashboard, area),
        SourceKind::Logs => render_logs(f, app, dashboard, area),
    }
}

fn render_clients(f: &mut Frame, app: &App, dashboard: &Dashboard, area: Rect) {
    let expanded_detail = dashboard
        .clients
        .order()
        .get(app.selected)
        .and_then(|key| dashboard.clients.get(&key.address))
        .filter(|client| client.expanded);

    let (table_area, detail_area) = if expanded_detail.is_some() {
        let split = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(area);
        (split[0], Some(split[1]))
    } else {
        (area, None)
    };

    let now = Utc::now();
    let rows: Vec<Row> = dashboard
        .clients
        .ordered()
        .enumerate()
        .map(|(index, client)| {
            let flags = format!(
                "{}{}",
                if client.marked { icons::MARKED } else { " " },
                if client.deleting { icons::DELETING } else { " " },
            );
            let expander = if client.expanded {
                icons::EXPANDED
            } else {
                icons::COLLAPSED
            };
            let style = if index == app.selected {
                theme::SELECTED_STYLE
            } else if client.marked {
                theme::MARKED_STYLE
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(expander),
                Cell::from(client.address.clone()),
                Cell::from(client.count.to_string()),
                Cell::from(format::ago(client.last_seen, now)),
                Cell::from(format::day(client.first_seen)),
                Cell::from(flags),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(1),
            Constraint::Length(40),
            Constraint::Length(8),
            Constraint::Length(18),
            Constraint::Length(14),
            Constraint::Length(4),
        ],
    )
    .header(header_row(&["", "address", "count", "last seen", "first seen", ""]))
    .block(Block::default().borders(Borders::ALL).title("Inbound clients"));
    f.render_widget(table, table_area);

    if let (Some(client), Some(detail_area)) = (expanded_detail, detail_area) {
        let lines: Vec<Line> = client
            .detail
            .iter()
            .map(|capture| {
                let marker = if capture.hitting {
                    Span::styled(icons::HIT, theme::HIT_STYLE)
                } else {
                    Span::raw(" ")
                };
                Line::from(vec![
                    marker,
                    Span::raw(" "),
                    Span::styled(format::clock(capture.time), theme::DIM_STYLE),
                    Span::raw("  "),
                    Span::raw(capture.request.clone()),
                ])
            })
            .collect();
        let title = format!("Captures for {}", client.address);
        f.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: true })
                .block(Block::default().borders(Borders::ALL).title(title)),
            detail_area,
        );
    }
}

fn render_sessions(f: &mut Frame, app: &App, dashboard: &Dashboard, area: Rect) {
    let now = Utc::now();
    let rows: Vec<Row> = dashboard
        .sessions
        .rows
        .iter()
        .enumerate()
        .map(|(index, session)| {
            let style = if index == app.selected {
                theme::SELECTED_STYLE
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(session.ip.clone()),
                Cell::from(format::ago(session.created, now)),
                Cell::from(format::ago(session.last_seen, now)),
                Cell::from(format::duration_ms(session.expire_ms)),
                Cell::from(session.granted.join(", ")),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(40),
            Constraint::Length(18),
            Constraint::Length(18),
            Constraint::Length(10),
            Constraint::Min(16),
        ],
    )
    .header(header_row(&["ip", "created", "last seen", "expire", "permissions"]))
    .block(Block::default().borders(Borders::ALL).title("Login sessions"));
    f.render_widget(table, area);
}

fn render_sync(f: &mut Frame, app: &App, dashboard: &Dashboard, area: Rect) {
    let view = &dashboard.sync.view;
    let split = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(area);

    let rows: Vec<Row> = view
        .partners
        .iter()
        .enumerate()
        .map(|(index, peer)| {
            let style = if index == app.selected {
                theme::SELECTED_STYLE
            } else {
                Style::default().fg(theme::connection_color(peer.connected))
            };
            let delay = peer.delay.map(format::duration_ms).unwrap_or_else(|| "n/a".to_string());
            Row::new(vec![
                Cell::from(format!("{}:{}", peer.ip, peer.port)),
                Cell::from(peer.role.as_str()),
                Cell::from(if peer.connected { "up" } else { "down" }),
                Cell::from(delay),
                Cell::from(format::bytes(peer.rx)),
                Cell::from(format::bytes(peer.tx)),
            ])
            .style(style)
        })
        .collect();

    let title = format!("Sync partners of {}:{}", view.server_ip, view.server_port);
    let table = Table::new(
        rows,
        [
            Constraint::Length(28),
            Constraint::Length(12),
            Constraint::Length(6),
            Constraint::Length(8),
            Constraint::Length(10),
            Constraint::Length(10),
        ],
    )
    .header(header_row(&["partner", "role", "link", "delay", "rx", "tx"]))
    .block(Block::default().borders(Borders::ALL).title(title));
    f.render_widget(table, split[0]);

    let rows: Vec<Row> = view
        .indirects
        .iter()
        .map(|peer| {
            Row::new(vec![
                Cell::from(format!("{}:{}", peer.ip, peer.port)),
                Cell::from(format!("{}:{}", peer.via_ip, peer.via_port)),
            ])
        })
        .collect();
    let table = Table::new(rows, [Constraint::Length(28), Constraint::Length(28)])
        .header(header_row(&["indirect peer", "via"]))
        .block(Block::default().borders(Borders::ALL).title("Indirect peers"));
    f.render_widget(table, split[1]);
}

fn render_logs(f: &mut Frame, app: &App, dashboard: &Dashboard, area: Rect) {
    let rows: Vec<Row> = dashboard
        .logs
        .rows
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let style = if index == app.selected {
                theme::SELECTED_STYLE
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(format::clock(entry.time)),
                Cell::from(Span::styled(
                    entry.kind.clone(),
                    Style::default().fg(theme::log_kind_color(&entry.kind)),
                )),
                Cell::from(entry.context.clone()),
                Cell::from(entry.message.clone()),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Min(20),
        ],
    )
    .header(header_row(&["time", "type", "context", "message"]))
    .block(Block::default().borders(Borders::ALL).title("Server logs"));
    f.render_widget(table, area);
}

fn render_footer(f: &mut Frame, dashboard: &Dashboard, area: Rect) {
    let hint = if dashboard.active == SourceKind::Clients {
        "1-4/tab views  j/k move  enter expand  d delete  r refresh  l logout  q quit"
    } else {
        "1-4/tab views  j/k move  r refresh  l logout  q quit"
    };
    let count = format!("{} rows", row_count(dashboard));
    let line = Line::from(vec![
        Span::styled(hint, theme::DIM_STYLE),
        Span::raw("  "),
        Span::styled(count, theme::DIM_STYLE),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_alert(f: &mut Frame, alert: &str) {
    let area = centered_rect(f.size(), 50, 7);
    let block = Block::default()
        .borders(Borders::ALL)
        .title("Alert")
        .border_style(theme::ALERT_STYLE);
    let inner = block.inner(area);
    f.render_widget(Clear, area);
    f.render_widget(block, area);

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(alert.to_string(), Style::default().add_modifier(Modifier::BOLD))),
        Line::from(""),
        Line::from(Span::styled("press any key", theme::DIM_STYLE)),
    ];
    f.render_widget(
        Paragraph::new(text).alignment(Alignment::Center).wrap(Wrap { trim: true }),
        inner,
    );
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    Row::new(
        titles
            .iter()
            .map(|title| Cell::from(Span::styled(*title, theme::HEADER_STYLE)))
            .collect::<Vec<_>>(),
    )
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}
