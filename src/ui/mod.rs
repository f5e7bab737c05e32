use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Cell, Clear, List, ListItem, Paragraph, Row, Table, TableState, Wrap};
use ratatui::Frame;

pub mod layout;

use ledgerscope::domain::TableKind;
use ledgerscope::infrastructure::PageSnapshot;
use ledgerscope::pager::PagerMode;

use crate::app::{App, InputMode};
use crate::core::NotifyLevel;

pub fn draw(f: &mut Frame, app: &App) {
    let areas = layout::areas(f.size());

    draw_header(f, areas.header, app);
    draw_sidebar(f, areas.sidebar, app);
    draw_page_table(f, areas.table, app);
    draw_status_line(f, areas.status_line, app);
    draw_command_line(f, areas.command_line, app);

    if app.help_open {
        draw_help_popup(f, areas.size);
    }
}

fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    let title = Line::from(vec![
        Span::styled(
            "Ledgerscope",
            Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled("Source", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {} ", app.source_label)),
        Span::styled("Table", Style::default().fg(Color::DarkGray)),
        Span::raw(format!(" {}", app.table.title())),
    ]);
    let left = Paragraph::new(title)
        .block(Block::default().borders(Borders::ALL))
        .alignment(Alignment::Left);

    let (label, color) = match app.page.as_ref() {
        Some(page) => (mode_label(page), mode_color(page)),
        None => ("loading…".to_string(), Color::DarkGray),
    };
    let right = Paragraph::new(Line::from(Span::styled(
        label,
        Style::default().fg(color).add_modifier(Modifier::BOLD),
    )))
    .block(Block::default().borders(Borders::ALL))
    .alignment(Alignment::Left);

    f.render_widget(left, chunks[0]);
    f.render_widget(right, chunks[1]);
}

/// `LIVE 3/20`, `PAUSED 20/20` or `PAGE 2 of ~5`
pub fn mode_label(page: &PageSnapshot) -> String {
    match (page.mode, page.live) {
        (PagerMode::AutoRefresh, Some(status)) => {
            let state = if status.paused { "PAUSED" } else { "LIVE" };
            if status.max_auto_update_count == 0 {
                state.to_string()
            } else {
                format!(
                    "{state} {}/{}",
                    status.update_count, status.max_auto_update_count
                )
            }
        }
        (PagerMode::Pagination, _) => {
            let approx = if page.drained { "" } else { "~" };
            format!("PAGE {} of {approx}{}", page.page, page.page_count)
        }
        _ => "IDLE".to_string(),
    }
}

fn mode_color(page: &PageSnapshot) -> Color {
    match (page.mode, page.live) {
        (PagerMode::AutoRefresh, Some(status)) if status.paused => Color::LightYellow,
        (PagerMode::AutoRefresh, _) => Color::LightGreen,
        (PagerMode::Pagination, _) => Color::LightCyan,
        _ => Color::DarkGray,
    }
}

fn draw_sidebar(f: &mut Frame, area: Rect, app: &App) {
    let items: Vec<ListItem> = TableKind::ALL
        .iter()
        .map(|kind| {
            let style = if *kind == app.table {
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(Line::from(Span::styled(format!(" {}", kind.title()), style)))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .title("Tables")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(list, area);
}

fn draw_page_table(f: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(table_title(app))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let Some(page) = app.page.as_ref() else {
        let waiting = Paragraph::new("Loading…")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(waiting, area);
        return;
    };

    if page.rows.is_empty() {
        let hint = match page.table {
            TableKind::Holders if page.filter.token.is_none() => "Pick a token with :token <id>",
            _ => "No rows",
        };
        let empty = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let header = Row::new(page.columns.iter().map(|column| {
        Cell::from(column.clone()).style(
            Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
    }));
    let rows = page
        .rows
        .iter()
        .map(|row| Row::new(row.iter().map(|cell| Cell::from(cell.clone()))));
    let columns = page.columns.len().max(1) as u32;
    let widths = (0..columns).map(|_| Constraint::Ratio(1, columns));

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::LightCyan),
        );
    let mut state = TableState::default().with_selected(Some(app.selected_row));
    f.render_stateful_widget(table, area, &mut state);
}

fn table_title(app: &App) -> String {
    let mut title = app.table.title().to_string();
    if let Some(account) = app.filter.account.filter(|_| app.table == TableKind::Transactions) {
        title.push_str(&format!(" · account {account}"));
    }
    if let Some(token) = app.filter.token.filter(|_| app.table == TableKind::Holders) {
        title.push_str(&format!(" · token {token}"));
    }
    title
}

fn draw_status_line(f: &mut Frame, area: Rect, app: &App) {
    let mut spans = Vec::new();
    if let Some(page) = app.page.as_ref() {
        let total = if page.drained {
            page.total_row_count.to_string()
        } else {
            format!("~{}", page.total_row_count)
        };
        spans.extend([
            Span::styled("Page ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{}  ", page.page)),
            Span::styled("Rows ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{}  ", total)),
            Span::styled("Size ", Style::default().fg(Color::DarkGray)),
            Span::raw(format!("{}  ", page.page_size)),
            Span::styled("Link ", Style::default().fg(Color::DarkGray)),
            Span::raw(page.link.clone()),
        ]);
    }

    let paragraph = Paragraph::new(Line::from(spans))
        .style(Style::default().fg(Color::White))
        .alignment(Alignment::Left);
    f.render_widget(paragraph, area);
}

/// Get command hint for autocompletion
fn command_hint(input: &str) -> Option<&'static str> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let commands = [
        ("page", "Open page N"),
        ("size", "Rows per page"),
        ("live", "Back to the live view"),
        ("table", "transactions | accounts | tokens | holders"),
        ("account", "Only transactions of an account"),
        ("token", "Holders of a token"),
        ("clear", "Drop filters"),
        ("export", "Export page (csv | json)"),
        ("link", "Copy link of this page"),
        ("quit", "Quit"),
    ];

    for (cmd, desc) in commands {
        if cmd.starts_with(&input) {
            return Some(desc);
        }
    }
    None
}

fn draw_command_line(f: &mut Frame, area: Rect, app: &App) {
    let content = match app.input_mode {
        InputMode::Command => {
            let hint_text = command_hint(&app.command_input).unwrap_or("page N | size N | table NAME");
            Line::from(vec![
                Span::styled(": ", Style::default().fg(Color::Yellow)),
                Span::raw(&app.command_input),
                Span::styled(
                    format!("  {}", hint_text),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        }
        InputMode::Normal => {
            if let Some((text, level)) = app.status_text() {
                let color = match level {
                    NotifyLevel::Info => Color::LightGreen,
                    NotifyLevel::Warn => Color::LightYellow,
                    NotifyLevel::Error => Color::LightRed,
                };
                Line::from(vec![
                    Span::styled("msg: ", Style::default().fg(Color::DarkGray)),
                    Span::styled(text, Style::default().fg(color)),
                ])
            } else {
                action_hints(app)
            }
        }
    };

    let paragraph = Paragraph::new(content).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}

fn action_hints(app: &App) -> Line<'static> {
    let hints: &[(&str, &str)] = match app.mode() {
        PagerMode::AutoRefresh => &[
            ("n", "older"),
            ("space", "pause"),
            ("r", "refresh"),
            ("Tab", "table"),
            (":", "command"),
            ("?", "help"),
        ],
        _ => &[
            ("n/p", "page"),
            ("l", "live"),
            ("+/-", "size"),
            ("y", "link"),
            ("e", "export"),
            ("?", "help"),
        ],
    };
    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(
            format!(" {key} "),
            Style::default().fg(Color::Black).bg(Color::DarkGray),
        ));
        spans.push(Span::styled(
            format!(" {label}  "),
            Style::default().fg(Color::DarkGray),
        ));
    }
    Line::from(spans)
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(64, 70, area);
    f.render_widget(Clear, popup_area);

    let lines = vec![
        Line::from("Navigation"),
        Line::from("  n / p      Next / previous page"),
        Line::from("  j / k      Move selection"),
        Line::from("  l          Live view (newest rows)"),
        Line::from("  Space      Pause/Resume auto refresh"),
        Line::from("  r          Refresh"),
        Line::from("  Tab        Next table"),
        Line::from("  + / -      Bigger / smaller pages"),
        Line::from(""),
        Line::from("Actions"),
        Line::from("  y          Copy link of this page"),
        Line::from("  Y          Copy key of the selected row"),
        Line::from("  e          Export page to CSV"),
        Line::from("  :          Command line"),
        Line::from("  ?          Toggle help"),
        Line::from("  q          Quit"),
        Line::from(""),
        Line::from("Commands"),
        Line::from("  :page 4  :size 25  :live  :table tokens"),
        Line::from("  :account 0.0.98  :token 0.0.1001  :clear"),
        Line::from("  :export json  :link  :q"),
    ];

    let paragraph = Paragraph::new(Text::from(lines))
        .block(Block::default().title("Help").borders(Borders::ALL))
        .alignment(Alignment::Left)
        .wrap(Wrap { trim: false });

    f.render_widget(paragraph, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledgerscope::domain::TableFilter;
    use ledgerscope::pager::AutoRefreshStatus;

    fn page(mode: PagerMode, live: Option<AutoRefreshStatus>, drained: bool) -> PageSnapshot {
        PageSnapshot {
            table: TableKind::Transactions,
            columns: Vec::new(),
            rows: Vec::new(),
            keys: Vec::new(),
            page: 2,
            page_count: 5,
            total_row_count: 50,
            drained,
            page_size: 10,
            mode,
            live,
            filter: TableFilter::default(),
            link: String::new(),
        }
    }

    #[test]
    fn test_mode_label() {
        let live = AutoRefreshStatus {
            paused: false,
            update_count: 3,
            max_auto_update_count: 20,
        };
        assert_eq!(mode_label(&page(PagerMode::AutoRefresh, Some(live), false)), "LIVE 3/20");

        let paused = AutoRefreshStatus {
            paused: true,
            update_count: 20,
            ..live
        };
        assert_eq!(
            mode_label(&page(PagerMode::AutoRefresh, Some(paused), false)),
            "PAUSED 20/20"
        );
        assert_eq!(mode_label(&page(PagerMode::Pagination, None, false)), "PAGE 2 of ~5");
        assert_eq!(mode_label(&page(PagerMode::Pagination, None, true)), "PAGE 2 of 5");
    }
}
