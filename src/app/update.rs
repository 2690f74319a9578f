use std::time::Instant;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::Terminal;
use ratatui::backend::Backend;

use crate::app::keymap::KeyAction;
use crate::app::screen::ListView;
use crate::app::{AppState, InputMode, ModalState, RowAction};
use crate::config::step_page_size;
use crate::model::FieldKind;
use crate::ui;

/// What the loop should do after a key.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut AppState) -> Result<()> {
    loop {
        let now = Instant::now();
        app.tick(now);
        terminal.draw(|f| ui::render(f, app))?;

        if event::poll(app.poll_timeout(now))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(app, key, Instant::now()) == Flow::Quit {
                    break;
                }
            }
        }
    }
    tracing::debug!(uptime_secs = app.started_at.elapsed().as_secs(), "event loop finished");
    Ok(())
}

/// Apply one key press to the app.
pub fn handle_key(app: &mut AppState, key: KeyEvent, now: Instant) -> Flow {
    match app.input_mode {
        InputMode::Normal => handle_normal_key(app, key),
        InputMode::Search => {
            handle_search_key(app, key.code, now);
            Flow::Continue
        }
        InputMode::Modal => {
            handle_modal_key(app, key.code);
            Flow::Continue
        }
    }
}

fn open_modal(app: &mut AppState, modal: ModalState) {
    app.modal = Some(modal);
    app.input_mode = InputMode::Modal;
}

fn close_modal(app: &mut AppState) {
    app.modal = None;
    app.input_mode = InputMode::Normal;
}

fn info(app: &mut AppState, message: impl Into<String>) {
    open_modal(
        app,
        ModalState::Info {
            message: message.into(),
        },
    );
}

fn handle_normal_key(app: &mut AppState, key: KeyEvent) -> Flow {
    let Some(action) = app.keymap.resolve(&key) else {
        return Flow::Continue;
    };
    match action {
        KeyAction::Quit => return Flow::Quit,
        KeyAction::Logout => {
            app.logout();
            return Flow::Quit;
        }
        KeyAction::OpenHelp => open_modal(app, ModalState::Help { scroll: 0 }),
        KeyAction::StartSearch => {
            app.search_query = app.view().map(|v| v.search_text().to_string()).unwrap_or_default();
            app.input_mode = InputMode::Search;
        }
        KeyAction::NewRecord => start_create(app),
        KeyAction::EditSelection => start_edit(app),
        KeyAction::DeleteSelection => confirm_delete(app),
        KeyAction::EnterAction => {
            let options = app.row_actions();
            if !options.is_empty() {
                open_modal(app, ModalState::Actions { selected: 0, options });
            }
        }
        KeyAction::NextTab => app.switch_tab(true),
        KeyAction::PrevTab => app.switch_tab(false),
        KeyAction::ToggleKeybindsPane => app.show_keybinds = !app.show_keybinds,
        KeyAction::MoveUp => with_view(app, |v| v.move_selection(-1)),
        KeyAction::MoveDown => with_view(app, |v| v.move_selection(1)),
        KeyAction::PrevPage => with_view(app, |v| v.prev_page()),
        KeyAction::NextPage => with_view(app, |v| v.next_page()),
        KeyAction::GrowPageSize | KeyAction::ShrinkPageSize => {
            let grow = action == KeyAction::GrowPageSize;
            with_view(app, |v| {
                let current = v.status().page_size;
                let next = step_page_size(current, grow);
                if next != current {
                    v.set_page_size(next);
                }
            });
        }
        KeyAction::Refresh => with_view(app, |v| v.refresh()),
        KeyAction::Back => {
            app.close_overlay();
        }
        KeyAction::Ignore => {}
    }
    Flow::Continue
}

fn with_view(app: &mut AppState, f: impl FnOnce(&mut (dyn ListView + 'static))) {
    if let Some(v) = app.view_mut() {
        f(v);
    }
}

fn start_create(app: &mut AppState) {
    let opened = app.view_mut().is_some_and(|v| v.open_create_form());
    if opened {
        open_modal(app, ModalState::Form);
    } else {
        info(app, "This list is read-only.");
    }
}

fn start_edit(app: &mut AppState) {
    let Some(view) = app.view_mut() else {
        return;
    };
    if !view.access().can_modify() {
        let message = locked_message(view);
        info(app, message);
    } else if view.open_edit_form() {
        open_modal(app, ModalState::Form);
    }
}

fn confirm_delete(app: &mut AppState) {
    let Some(view) = app.view() else {
        return;
    };
    if !view.access().can_modify() {
        let message = locked_message(view);
        info(app, message);
        return;
    }
    if let (Some(id), Some(label)) = (view.selected_id(), view.selected_label()) {
        open_modal(app, ModalState::DeleteConfirm { selected: 1, id, label });
    }
}

fn locked_message(view: &dyn ListView) -> &'static str {
    if view.is_read_only() {
        "This list is read-only."
    } else {
        "Existing records cannot be changed from this list."
    }
}

fn handle_search_key(app: &mut AppState, code: KeyCode, now: Instant) {
    match code {
        KeyCode::Enter => app.input_mode = InputMode::Normal,
        KeyCode::Esc => {
            app.search_query.clear();
            app.input_mode = InputMode::Normal;
            push_search(app, now);
        }
        KeyCode::Backspace => {
            app.search_query.pop();
            push_search(app, now);
        }
        KeyCode::Char(c) => {
            app.search_query.push(c);
            push_search(app, now);
        }
        _ => {}
    }
}

fn push_search(app: &mut AppState, now: Instant) {
    let text = app.search_query.clone();
    with_view(app, |v| v.search(&text, now));
}

pub fn handle_modal_key(app: &mut AppState, code: KeyCode) {
    let Some(modal) = app.modal.clone() else {
        app.input_mode = InputMode::Normal;
        return;
    };
    match modal {
        ModalState::Actions { selected, options } => match code {
            KeyCode::Esc => close_modal(app),
            KeyCode::Up | KeyCode::Char('k') => {
                app.modal = Some(ModalState::Actions {
                    selected: selected.saturating_sub(1),
                    options,
                });
            }
            KeyCode::Down | KeyCode::Char('j') => {
                let next = (selected + 1).min(options.len().saturating_sub(1));
                app.modal = Some(ModalState::Actions { selected: next, options });
            }
            KeyCode::Enter => {
                close_modal(app);
                match options.get(selected) {
                    Some(RowAction::Edit) => start_edit(app),
                    Some(RowAction::Delete) => confirm_delete(app),
                    Some(RowAction::ShowRooms) => {
                        let target = app.view().and_then(|v| Some((v.selected_id()?, v.selected_label()?)));
                        if let Some((id, label)) = target {
                            app.open_location_rooms(id, &label);
                        }
                    }
                    Some(RowAction::BookRoom) => {
                        let room = app.view().and_then(|v| v.selected_id());
                        if room.is_some_and(|id| app.book_room(id)) {
                            open_modal(app, ModalState::Form);
                        } else {
                            info(app, "Rooms cannot be booked from this account.");
                        }
                    }
                    None => {}
                }
            }
            _ => {}
        },
        ModalState::DeleteConfirm { selected, id, label } => match code {
            KeyCode::Esc | KeyCode::Char('n') => close_modal(app),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                app.modal = Some(ModalState::DeleteConfirm {
                    selected: 1 - selected.min(1),
                    id,
                    label,
                });
            }
            KeyCode::Char('y') => {
                close_modal(app);
                with_view(app, |v| v.delete(id));
            }
            KeyCode::Enter => {
                close_modal(app);
                if selected == 0 {
                    with_view(app, |v| v.delete(id));
                }
            }
            _ => {}
        },
        ModalState::Form => handle_form_key(app, code),
        ModalState::Info { .. } => {
            if matches!(code, KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q')) {
                close_modal(app);
            }
        }
        ModalState::Help { scroll } => match code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q') | KeyCode::Char('?') => close_modal(app),
            KeyCode::Down | KeyCode::Char('j') => app.modal = Some(ModalState::Help { scroll: scroll + 1 }),
            KeyCode::Up | KeyCode::Char('k') => {
                app.modal = Some(ModalState::Help {
                    scroll: scroll.saturating_sub(1),
                });
            }
            _ => {}
        },
    }
}

fn handle_form_key(app: &mut AppState, code: KeyCode) {
    if code == KeyCode::Esc {
        with_view(app, |v| v.close_form());
        close_modal(app);
        return;
    }
    if code == KeyCode::Enter {
        with_view(app, |v| v.submit_form());
        return;
    }
    let Some(form) = app.view_mut().and_then(|v| v.form_mut()) else {
        close_modal(app);
        return;
    };
    let choice_like = matches!(
        form.focused().map(|f| f.kind),
        Some(FieldKind::Flag | FieldKind::Choice(_))
    );
    match code {
        KeyCode::Tab | KeyCode::Down => form.focus_next(),
        KeyCode::BackTab | KeyCode::Up => form.focus_prev(),
        KeyCode::Left if choice_like => form.cycle(-1),
        KeyCode::Right if choice_like => form.cycle(1),
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) => form.input_char(c),
        _ => {}
    }
}
