//! Shared UI components (status bar, keybinds panel, modal dialogs).
//!
use std::collections::{BTreeMap, BTreeSet};

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::keymap::{KeyAction, Keymap};
use crate::app::{AppState, InputMode, ModalState};
use crate::manager::{LoadState, NoticeLevel};

/// Render the bottom status bar: mode, paging, load state and the latest notice.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Search => "SEARCH",
        InputMode::Modal => "MODAL",
    };
    let theme = &app.theme;
    let base = Style::default().fg(theme.status_fg).bg(theme.status_bg);
    let mut spans = vec![Span::styled(format!(" {mode} "), base.add_modifier(Modifier::BOLD))];

    if let Some(view) = app.view() {
        let s = view.status();
        spans.push(Span::styled(
            format!(
                " page {}/{}  total:{}  rows/page:{}",
                s.page_index, s.page_count, s.total, s.page_size
            ),
            base,
        ));
        if !s.keyword.is_empty() {
            spans.push(Span::styled(format!("  keyword:'{}'", s.keyword), base));
        }
        if s.search_pending {
            spans.push(Span::styled("  searching…", base));
        } else if s.busy {
            spans.push(Span::styled("  working…", base));
        }
        if let LoadState::Error(e) = &s.state {
            spans.push(Span::styled(format!("  error: {e}"), base.fg(theme.error)));
        }
    }

    if let Some((notice, _)) = &app.notice {
        let color = match notice.level {
            NoticeLevel::Info => theme.status_fg,
            NoticeLevel::Success => theme.success,
            NoticeLevel::Error => theme.error,
        };
        spans.push(Span::styled(format!("  {}", notice.message), base.fg(color)));
    }

    let p = Paragraph::new(Line::from(spans)).style(base);
    f.render_widget(p, area);
}

fn describe(action: KeyAction) -> Option<(&'static str, &'static str)> {
    let entry = match action {
        KeyAction::Quit => ("General", "Quit"),
        KeyAction::Logout => ("General", "Log out"),
        KeyAction::OpenHelp => ("General", "Help"),
        KeyAction::ToggleKeybindsPane => ("General", "Toggle keybindings"),
        KeyAction::NextTab => ("General", "Next tab"),
        KeyAction::PrevTab => ("General", "Previous tab"),
        KeyAction::Back => ("General", "Close list"),
        KeyAction::MoveUp => ("Navigation", "Move up"),
        KeyAction::MoveDown => ("Navigation", "Move down"),
        KeyAction::PrevPage => ("Navigation", "Previous page"),
        KeyAction::NextPage => ("Navigation", "Next page"),
        KeyAction::GrowPageSize => ("Navigation", "More rows/page"),
        KeyAction::ShrinkPageSize => ("Navigation", "Fewer rows/page"),
        KeyAction::StartSearch => ("Records", "Search"),
        KeyAction::Refresh => ("Records", "Reload page"),
        KeyAction::NewRecord => ("Records", "New record"),
        KeyAction::EditSelection => ("Records", "Edit selection"),
        KeyAction::DeleteSelection => ("Records", "Delete selection"),
        KeyAction::EnterAction => ("Records", "Row actions"),
        KeyAction::Ignore => return None,
    };
    Some(entry)
}

fn key_label(mods: KeyModifiers, code: KeyCode) -> String {
    match code {
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Tab if mods.contains(KeyModifiers::SHIFT) => "Shift+Tab".to_string(),
        _ => Keymap::format_key(mods, code),
    }
}

/// Render the right-side keybinds viewer with grouped sections.
pub fn render_keybinds_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title("Keybindings")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);

    let mut sections: BTreeMap<&'static str, BTreeMap<&'static str, BTreeSet<String>>> = BTreeMap::new();
    for ((mods, code), action) in app.keymap.all_bindings() {
        if let Some((section, label)) = describe(action) {
            sections
                .entry(section)
                .or_default()
                .entry(label)
                .or_default()
                .insert(key_label(mods, code));
        }
    }

    let max_label = sections
        .values()
        .flat_map(|m| m.keys())
        .map(|k| k.len())
        .chain(["Confirm / Save".len()])
        .max()
        .unwrap_or(0);
    let sep = " │ ";
    let col1_w = max_label.min((inner.width as usize).saturating_sub(sep.chars().count() + 8));

    let row = |label: &str, value: String| -> Line<'static> {
        let lbl: String = label.chars().take(col1_w).collect();
        Line::from(vec![
            Span::raw(format!("  {lbl:>col1_w$}{sep}")),
            Span::styled(value, Style::default().add_modifier(Modifier::ITALIC)),
        ])
    };

    let mut lines: Vec<Line> = Vec::new();
    for section in ["General", "Navigation", "Records"] {
        let Some(entries) = sections.get(section) else {
            continue;
        };
        if !lines.is_empty() {
            lines.push(Line::raw(""));
        }
        lines.push(Line::from(Span::styled(
            format!("{section}:"),
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for (label, keys) in entries {
            lines.push(row(label, keys.iter().cloned().collect::<Vec<_>>().join(", ")));
        }
    }

    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "In dialogs:",
        Style::default().add_modifier(Modifier::BOLD),
    )));
    for (label, value) in [
        ("Confirm / Save", "Enter"),
        ("Cancel", "Esc"),
        ("Next field", "Tab, ↓"),
        ("Toggle choice", "Space, ←→"),
    ] {
        lines.push(row(label, value.to_string()));
    }

    let p = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(block, area);
    f.render_widget(p, inner);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Render a generic informational modal dialog.
pub fn render_info_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::Info { message } = state {
        let max_w = area.width.saturating_sub(6).max(30);
        let min_w = 40u16.min(max_w);
        let approx_lines = (message.len() as u16 / (min_w.saturating_sub(4).max(10))).max(1);
        let max_h = area.height.saturating_sub(6).max(5);
        let height = (approx_lines + 4).min(max_h).max(5);
        let rect = centered_rect(min_w, height, area);
        let p = Paragraph::new(message.clone())
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title("Info")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.border)),
            );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}

/// Per-row action menu.
pub fn render_actions_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    let ModalState::Actions { selected, options } = state else {
        return;
    };
    let title = app
        .view()
        .and_then(|v| v.selected_label())
        .unwrap_or_else(|| "Actions".to_string());
    let width = 44u16.min(area.width.saturating_sub(4)).max(30);
    let rect = centered_rect(width, options.len() as u16 + 2, area);
    let lines: Vec<Line> = options
        .iter()
        .enumerate()
        .map(|(idx, action)| {
            if idx == *selected {
                Line::from(Span::styled(
                    format!("▶ {}", action.label()),
                    Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD),
                ))
            } else {
                Line::raw(format!("  {}", action.label()))
            }
        })
        .collect();
    let p = Paragraph::new(lines).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

pub fn render_delete_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    let ModalState::DeleteConfirm { selected, label, .. } = state else {
        return;
    };
    let width = 56u16.min(area.width.saturating_sub(4)).max(36);
    let rect = centered_rect(width, 7, area);
    let button = |text: &'static str, on: bool| {
        if on {
            Span::styled(
                format!("[ {text} ]"),
                Style::default().fg(app.theme.highlight_fg).add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw(format!("  {text}  "))
        }
    };
    let lines = vec![
        Line::raw(format!("Delete {label}?")),
        Line::from(Span::styled(
            "This cannot be undone.",
            Style::default().fg(app.theme.muted),
        )),
        Line::raw(""),
        Line::from(vec![button("Yes", *selected == 0), Span::raw("   "), button("No", *selected != 0)]),
    ];
    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title("Confirm delete")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.error)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}

/// Render the help modal with important usage information and key tips.
pub fn render_help_modal(f: &mut Frame, area: Rect, app: &AppState, scroll: u16) {
    let width = 80u16.min(area.width.saturating_sub(4)).max(60);
    let height = 22u16.min(area.height.saturating_sub(4)).max(14);
    let rect = centered_rect(width, height, area);

    let key = |s: &'static str| Span::styled(s, Style::default().add_modifier(Modifier::ITALIC));
    let bold = |s: &'static str| Line::from(Span::styled(s, Style::default().add_modifier(Modifier::BOLD)));

    let mut lines: Vec<Line> = vec![bold("Lists"), Line::raw("")];
    lines.push(Line::from(vec![Span::raw("Move: "), key("↑↓ / j k")]));
    lines.push(Line::from(vec![Span::raw("Page: "), key("←→ / h l / PageUp PageDown")]));
    lines.push(Line::from(vec![Span::raw("Rows per page: "), key("+ / -")]));
    lines.push(Line::from(vec![
        Span::raw("Search: "),
        key("/"),
        Span::raw(" then type; results follow once typing pauses. Esc clears"),
    ]));
    lines.push(Line::from(vec![Span::raw("Reload: "), key("r")]));
    lines.push(Line::from(vec![Span::raw("Switch tab: "), key("Tab / Shift+Tab")]));
    lines.push(Line::raw(""));
    lines.push(bold("Records"));
    lines.push(Line::from(vec![Span::raw("New: "), key("n")]));
    lines.push(Line::from(vec![Span::raw("Edit: "), key("e")]));
    lines.push(Line::from(vec![Span::raw("Delete: "), key("Delete / d")]));
    lines.push(Line::from(vec![
        Span::raw("Row actions: "),
        key("Enter"),
        Span::raw(" (locations can list their rooms; Esc goes back)"),
    ]));
    lines.push(Line::raw(""));
    lines.push(bold("Session"));
    lines.push(Line::from(vec![Span::raw("Keybindings panel: "), key("Shift+K")]));
    lines.push(Line::from(vec![Span::raw("Log out: "), key("Shift+L")]));
    lines.push(Line::from(vec![Span::raw("Quit: "), key("q")]));
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        format!("Signed in as {}", app.session.display_name()),
        Style::default().fg(app.theme.muted),
    )));
    lines.push(Line::from(vec![Span::raw("Close help: "), key("Esc / Enter")]));

    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .scroll((scroll, 0))
        .block(
            Block::default()
                .title("Help")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
