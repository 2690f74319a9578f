//! One list screen: a [`ListManager`] wired to a Remote API.
//!
//! Requests run as tasks on the tokio runtime; their completions come back over a
//! channel and are applied on the UI thread in [`ListView::tick`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use super::lookup::RoomNames;
use crate::api::Remote;
use crate::manager::{Access, Completion, FormState, ListManager, LoadState, Notice, Request, execute};
use crate::model::{Column, Entity, EntityKind, Room, Scope};

/// Snapshot of a list's paging and loading state for the status line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewStatus {
    pub state: LoadState,
    pub page_index: usize,
    pub page_count: usize,
    pub page_size: usize,
    pub total: usize,
    pub keyword: String,
    pub busy: bool,
    /// A search is waiting out its debounce window.
    pub search_pending: bool,
}

/// Entity-erased view the event loop and renderer drive.
pub trait ListView {
    fn kind(&self) -> EntityKind;
    fn title(&self) -> &str;
    fn scope(&self) -> Scope;
    fn access(&self) -> Access;

    fn is_read_only(&self) -> bool {
        self.access() == Access::ReadOnly
    }

    fn columns(&self) -> &'static [Column];
    fn rows(&self) -> Vec<Vec<String>>;
    fn details(&self) -> Vec<(&'static str, String)>;
    fn selected(&self) -> usize;
    fn selected_id(&self) -> Option<i64>;
    fn selected_label(&self) -> Option<String>;
    fn status(&self) -> ViewStatus;
    fn search_text(&self) -> &str;

    /// Apply finished requests and fire a settled search.
    fn tick(&mut self, now: Instant);
    /// When the next tick has work to do, if sooner than the idle poll.
    fn next_deadline(&self, now: Instant) -> Option<Duration>;
    /// Load the first page if nothing was fetched yet.
    fn activate(&mut self);
    fn refresh(&mut self);
    fn search(&mut self, text: &str, now: Instant);
    fn move_selection(&mut self, delta: isize);
    fn next_page(&mut self);
    fn prev_page(&mut self);
    fn set_page_size(&mut self, size: usize);

    fn open_create_form(&mut self) -> bool;
    /// New-record form with `(form key, text)` pairs filled in.
    fn open_create_form_with(&mut self, preset: &[(&str, String)]) -> bool;
    fn open_edit_form(&mut self) -> bool;
    fn form(&self) -> Option<&FormState>;
    fn form_mut(&mut self) -> Option<&mut FormState>;
    fn submit_form(&mut self);
    fn close_form(&mut self);

    fn delete(&mut self, id: i64);
    fn take_notices(&mut self) -> Vec<Notice>;
}

pub struct Screen<E: Entity> {
    title: String,
    manager: ListManager<E>,
    remote: Arc<dyn Remote<E>>,
    runtime: Handle,
    tx: UnboundedSender<Completion<E>>,
    rx: UnboundedReceiver<Completion<E>>,
    in_flight: usize,
    rooms: Option<RoomNames>,
}

impl<E: Entity> Screen<E> {
    pub fn new(title: impl Into<String>, manager: ListManager<E>, remote: Arc<dyn Remote<E>>, runtime: Handle) -> Self {
        let (tx, rx) = unbounded_channel();
        Self {
            title: title.into(),
            manager,
            remote,
            runtime,
            tx,
            rx,
            in_flight: 0,
            rooms: None,
        }
    }

    /// Look up and show the name of the room each row refers to.
    pub fn with_room_names(mut self, remote: Arc<dyn Remote<Room>>) -> Self {
        self.rooms = Some(RoomNames::new(remote, self.runtime.clone()));
        self
    }

    fn dispatch(&mut self, request: Request<E>) {
        let remote = Arc::clone(&self.remote);
        let tx = self.tx.clone();
        self.in_flight += 1;
        self.runtime.spawn(async move {
            let done = execute(remote.as_ref(), request).await;
            // receiver gone means the screen was closed
            let _ = tx.send(done);
        });
    }

    fn dispatch_opt(&mut self, request: Option<Request<E>>) {
        if let Some(req) = request {
            self.dispatch(req);
        }
    }
}

impl<E: Entity> ListView for Screen<E> {
    fn kind(&self) -> EntityKind {
        E::KIND
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn scope(&self) -> Scope {
        self.manager.scope()
    }

    fn access(&self) -> Access {
        self.manager.access()
    }

    fn columns(&self) -> &'static [Column] {
        E::columns()
    }

    fn rows(&self) -> Vec<Vec<String>> {
        self.manager.rows().iter().map(Entity::cells).collect()
    }

    fn details(&self) -> Vec<(&'static str, String)> {
        let Some(row) = self.manager.selected_row() else {
            return Vec::new();
        };
        let mut out = row.details();
        if let (Some(rooms), Some(id)) = (&self.rooms, row.room_ref()) {
            let name = match rooms.name(id) {
                Some(name) => name.to_string(),
                None if rooms.is_pending(id) => "loading…".to_string(),
                None => "unknown".to_string(),
            };
            out.push(("Room name", name));
        }
        out
    }

    fn selected(&self) -> usize {
        self.manager.selected()
    }

    fn selected_id(&self) -> Option<i64> {
        self.manager.selected_row().map(Entity::id)
    }

    fn selected_label(&self) -> Option<String> {
        self.manager.selected_row().map(Entity::label)
    }

    fn status(&self) -> ViewStatus {
        let q = self.manager.query();
        let now = Instant::now();
        ViewStatus {
            state: self.manager.state().clone(),
            page_index: q.page_index,
            page_count: self.manager.page_count(),
            page_size: q.page_size,
            total: self.manager.total(),
            keyword: q.keyword.clone(),
            busy: self.manager.is_busy() || self.in_flight > 0,
            search_pending: self.manager.search_deadline(now).is_some(),
        }
    }

    fn search_text(&self) -> &str {
        self.manager.search_text()
    }

    fn tick(&mut self, now: Instant) {
        let mut applied = false;
        while let Ok(done) = self.rx.try_recv() {
            applied = true;
            self.in_flight = self.in_flight.saturating_sub(1);
            for follow in self.manager.complete(done) {
                self.dispatch(follow);
            }
        }
        if let Some(rooms) = self.rooms.as_mut() {
            if applied {
                rooms.request(self.manager.rows().iter().filter_map(Entity::room_ref));
            }
            rooms.tick();
        }
        let settled = self.manager.poll(now);
        self.dispatch_opt(settled);
    }

    fn next_deadline(&self, now: Instant) -> Option<Duration> {
        self.manager.search_deadline(now)
    }

    fn activate(&mut self) {
        if *self.manager.state() == LoadState::Idle {
            let req = self.manager.refresh();
            self.dispatch(req);
        }
    }

    fn refresh(&mut self) {
        let req = self.manager.refresh();
        self.dispatch(req);
    }

    fn search(&mut self, text: &str, now: Instant) {
        self.manager.search(text, now);
    }

    fn move_selection(&mut self, delta: isize) {
        self.manager.move_selection(delta);
    }

    fn next_page(&mut self) {
        let req = self.manager.next_page();
        self.dispatch_opt(req);
    }

    fn prev_page(&mut self) {
        let req = self.manager.prev_page();
        self.dispatch_opt(req);
    }

    fn set_page_size(&mut self, size: usize) {
        let req = self.manager.set_page_size(size);
        self.dispatch(req);
    }

    fn open_create_form(&mut self) -> bool {
        self.manager.open_create_form()
    }

    fn open_create_form_with(&mut self, preset: &[(&str, String)]) -> bool {
        self.manager.open_create_form_with(preset)
    }

    fn open_edit_form(&mut self) -> bool {
        self.manager.open_edit_form()
    }

    fn form(&self) -> Option<&FormState> {
        self.manager.form().map(|f| &f.state)
    }

    fn form_mut(&mut self) -> Option<&mut FormState> {
        self.manager.form_mut().map(|f| &mut f.state)
    }

    fn submit_form(&mut self) {
        let req = self.manager.submit_form();
        self.dispatch_opt(req);
    }

    fn close_form(&mut self) {
        self.manager.close_form();
    }

    fn delete(&mut self, id: i64) {
        let req = self.manager.delete(id);
        self.dispatch_opt(req);
    }

    fn take_notices(&mut self) -> Vec<Notice> {
        self.manager.take_notices()
    }
}
