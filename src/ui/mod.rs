pub mod components;
pub mod form;
pub mod table;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, InputMode, ModalState};

pub fn render(f: &mut Frame, app: &AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)])
        .split(f.area());

    render_header(f, root[0], app);

    let main = if app.show_keybinds {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(40), Constraint::Length(44)])
            .split(root[1]);
        components::render_keybinds_panel(f, cols[1], app);
        cols[0]
    } else {
        root[1]
    };
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(main);

    match app.view() {
        Some(view) => {
            table::render_list(f, body[0], view, &app.theme);
            table::render_details(f, body[1], view, &app.theme);
        }
        None => {
            let p = Paragraph::new("Nothing to show for this account.")
                .style(Style::default().fg(app.theme.muted))
                .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(app.theme.border)));
            f.render_widget(p, main);
        }
    }

    components::render_status_bar(f, root[2], app);

    if app.modal.is_some() {
        render_modal(f, f.area(), app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &AppState) {
    let theme = &app.theme;
    let mut spans: Vec<Span> = Vec::new();
    for (idx, tab) in app.tabs.iter().enumerate() {
        let title = tab.view.title();
        if idx == app.active_tab && app.overlay.is_none() {
            spans.push(Span::styled(
                format!("[{title}]"),
                Style::default().fg(theme.highlight_fg).add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(format!(" {title} ")));
        }
        spans.push(Span::raw(" "));
    }
    if let Some(overlay) = &app.overlay {
        spans.push(Span::styled(
            format!("» {}", overlay.view.title()),
            Style::default().fg(theme.highlight_fg).add_modifier(Modifier::BOLD),
        ));
    }
    if app.input_mode == InputMode::Search {
        spans.push(Span::raw("  Search: "));
        spans.push(Span::styled(
            format!("{}_", app.search_query),
            Style::default().add_modifier(Modifier::ITALIC),
        ));
    } else if let Some(v) = app.view() {
        if !v.search_text().is_empty() {
            spans.push(Span::styled(
                format!("  filter: {}", v.search_text()),
                Style::default().fg(theme.muted),
            ));
        }
    }

    let p = Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .title(format!("booking-admin ({})", app.session.display_name()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.border)),
        )
        .style(Style::default().fg(theme.header_fg).bg(theme.header_bg));
    f.render_widget(p, area);
}

fn render_modal(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(state) = &app.modal else {
        return;
    };
    match state {
        ModalState::Actions { .. } => components::render_actions_modal(f, area, app, state),
        ModalState::DeleteConfirm { .. } => components::render_delete_modal(f, area, app, state),
        ModalState::Info { .. } => components::render_info_modal(f, area, app, state),
        ModalState::Help { scroll } => components::render_help_modal(f, area, app, *scroll),
        ModalState::Form => {
            if let Some(form) = app.view().and_then(|v| v.form()) {
                form::render_form_modal(f, area, form, &app.theme);
            }
        }
    }
}
