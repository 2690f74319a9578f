use ratatui::Frame;
use ratatui::layout::{Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState, Wrap};

use crate::app::Theme;
use crate::app::screen::ListView;
use crate::manager::{Access, LoadState};

pub fn render_list(f: &mut Frame, area: Rect, view: &dyn ListView, theme: &Theme) {
    let status = view.status();
    let mut title = format!(
        "{} ({}) page {}/{}",
        view.title(),
        status.total,
        status.page_index,
        status.page_count
    );
    match view.access() {
        Access::Full => {}
        Access::Append => title.push_str(" [new only]"),
        Access::ReadOnly => title.push_str(" [read-only]"),
    }
    if status.busy {
        title.push_str(" loading…");
    }
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border));

    let rows = view.rows();
    if rows.is_empty() {
        let (msg, color) = match &status.state {
            LoadState::Idle | LoadState::Loading => ("Loading…".to_string(), theme.muted),
            LoadState::Error(e) => (format!("Could not load: {e}\nPress r to retry."), theme.error),
            LoadState::Loaded if !status.keyword.is_empty() => {
                (format!("No records match '{}'.", status.keyword), theme.muted)
            }
            LoadState::Loaded => ("No records.".to_string(), theme.muted),
        };
        let p = Paragraph::new(msg)
            .style(Style::default().fg(color))
            .wrap(Wrap { trim: false })
            .block(block);
        f.render_widget(p, area);
        return;
    }

    let widths: Vec<Constraint> = view
        .columns()
        .iter()
        .map(|c| if c.width == 0 { Constraint::Min(10) } else { Constraint::Length(c.width) })
        .collect();
    let header = Row::new(view.columns().iter().map(|c| c.title))
        .style(Style::default().fg(theme.title).add_modifier(Modifier::BOLD));
    let body = rows
        .into_iter()
        .map(|cells| Row::new(cells.into_iter().map(Cell::from)).style(Style::default().fg(theme.text)));

    let table = Table::new(body, widths)
        .header(header)
        .block(block)
        .row_highlight_style(
            Style::default()
                .fg(theme.highlight_fg)
                .bg(theme.highlight_bg)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("▶ ")
        .column_spacing(1);
    let mut state = TableState::default().with_selected(Some(view.selected()));
    f.render_stateful_widget(table, area, &mut state);
}

pub fn render_details(f: &mut Frame, area: Rect, view: &dyn ListView, theme: &Theme) {
    let details = view.details();
    let width = details.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let lines: Vec<Line> = details
        .into_iter()
        .map(|(label, value)| {
            Line::from(vec![
                Span::styled(format!("{label:>width$}: "), Style::default().fg(theme.muted)),
                Span::styled(value, Style::default().fg(theme.text)),
            ])
        })
        .collect();
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Details")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(p, area);
}
