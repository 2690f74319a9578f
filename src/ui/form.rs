use ratatui::Frame;
use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::app::Theme;
use crate::manager::{FormMode, FormState};
use crate::model::FieldKind;
use crate::ui::components::centered_rect;

fn hint(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Flag | FieldKind::Choice(_) => "  (space / ←→)",
        FieldKind::Date => "  (YYYY-MM-DD)",
        FieldKind::Integer { .. } => "  (number)",
        FieldKind::Text | FieldKind::Secret => "",
    }
}

/// Create/edit dialog: one line per field, the focused one marked.
pub fn render_form_modal(f: &mut Frame, area: Rect, form: &FormState, theme: &Theme) {
    let label_w = form.fields.iter().map(|s| s.label.len()).max().unwrap_or(0);
    let height = (form.fields.len() as u16 + 7).min(area.height.saturating_sub(2));
    let width = 72u16.min(area.width.saturating_sub(4)).max(40);
    let rect = centered_rect(width, height, area);

    let mut lines: Vec<Line> = Vec::with_capacity(form.fields.len() + 4);
    for (idx, spec) in form.fields.iter().enumerate() {
        let focused = idx == form.focus;
        let marker = if focused { "▶ " } else { "  " };
        let dirty = if form.mode != FormMode::Create && form.is_dirty(idx) { "*" } else { " " };
        let mut value = form.display_value(idx);
        if focused && !matches!(spec.kind, FieldKind::Flag | FieldKind::Choice(_)) {
            value.push('_');
        }
        let style = if focused {
            Style::default().fg(theme.highlight_fg).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.text)
        };
        let mut spans = vec![
            Span::raw(marker),
            Span::styled(format!("{:>w$}{dirty} ", spec.label, w = label_w), Style::default().fg(theme.muted)),
            Span::styled(value, style),
        ];
        if focused {
            spans.push(Span::styled(hint(spec.kind), Style::default().fg(theme.muted)));
        }
        lines.push(Line::from(spans));
    }
    lines.push(Line::raw(""));
    if let Some(err) = &form.error {
        lines.push(Line::from(Span::styled(err.clone(), Style::default().fg(theme.error))));
    } else if form.is_submitting() {
        lines.push(Line::from(Span::styled("Saving…", Style::default().fg(theme.muted))));
    } else {
        lines.push(Line::raw(""));
    }
    lines.push(Line::from(Span::styled(
        "Enter: save  Tab/↑↓: field  Esc: cancel",
        Style::default().add_modifier(Modifier::ITALIC),
    )));

    let p = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(form.title())
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border)),
    );
    f.render_widget(Clear, rect);
    f.render_widget(p, rect);
}
