//! Generic list manager: the state machine behind every entity screen.
//!
//! [`ListManager`] never performs I/O itself. Each operation updates local state and
//! hands back a [`Request`] tagged with a sequence number; the caller runs it with
//! [`execute`] and feeds the [`Completion`] back through [`ListManager::complete`].
//! Only the completion of the most recently issued fetch is applied, so a slow
//! response can never overwrite a newer one.

pub mod form;

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::api::{MAX_PAGE_SIZE, Page, PageQuery, Remote};
use crate::error::{ApiResult, ValidationError};
use crate::model::{Entity, Scope};
use crate::search::Debouncer;

pub use form::{EntityForm, FormMode, FormState};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    /// Last fetch failed; the previous rows stay visible.
    Error(String),
}

/// What a list view may do besides listing.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Access {
    #[default]
    Full,
    /// New records only; loaded rows cannot be edited or deleted.
    Append,
    ReadOnly,
}

impl Access {
    pub fn can_create(self) -> bool {
        self != Access::ReadOnly
    }

    pub fn can_modify(self) -> bool {
        self == Access::Full
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// User-visible result of an operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum Request<E> {
    Fetch { seq: u64, query: PageQuery },
    Create { seq: u64, record: E },
    Update { seq: u64, id: i64, record: E },
    Delete { seq: u64, id: i64 },
}

impl<E> Request<E> {
    pub fn seq(&self) -> u64 {
        match self {
            Request::Fetch { seq, .. }
            | Request::Create { seq, .. }
            | Request::Update { seq, .. }
            | Request::Delete { seq, .. } => *seq,
        }
    }
}

#[derive(Debug)]
pub enum Outcome<E> {
    Fetched(ApiResult<Page<E>>),
    Created(ApiResult<Option<E>>),
    Updated { id: i64, result: ApiResult<Option<E>> },
    Deleted { id: i64, result: ApiResult<()> },
}

#[derive(Debug)]
pub struct Completion<E> {
    pub seq: u64,
    pub outcome: Outcome<E>,
}

/// Run one request against the Remote API.
pub async fn execute<E: Entity>(remote: &dyn Remote<E>, request: Request<E>) -> Completion<E> {
    debug!(backend = remote.backend_tag(), kind = E::KIND.singular(), seq = request.seq(), "executing");
    match request {
        Request::Fetch { seq, query } => Completion {
            seq,
            outcome: Outcome::Fetched(remote.fetch_page(&query).await),
        },
        Request::Create { seq, record } => Completion {
            seq,
            outcome: Outcome::Created(remote.create(&record).await),
        },
        Request::Update { seq, id, record } => Completion {
            seq,
            outcome: Outcome::Updated {
                id,
                result: remote.update(id, &record).await,
            },
        },
        Request::Delete { seq, id } => Completion {
            seq,
            outcome: Outcome::Deleted {
                id,
                result: remote.delete(id).await,
            },
        },
    }
}

pub struct ListManager<E: Entity> {
    rows: Vec<E>,
    total: usize,
    /// Query the visible rows belong to.
    query: PageQuery,
    /// Query of the fetch in flight, applied when it lands.
    pending: Option<PageQuery>,
    state: LoadState,
    next_seq: u64,
    latest_fetch: u64,
    deleting: Vec<i64>,
    form: Option<EntityForm<E>>,
    notices: VecDeque<Notice>,
    selected: usize,
    search_text: String,
    debouncer: Debouncer,
    access: Access,
}

impl<E: Entity> ListManager<E> {
    pub fn new(scope: Scope, page_size: usize, debounce: Duration) -> Self {
        Self {
            rows: Vec::new(),
            total: 0,
            query: PageQuery::new(1, page_size, "").with_scope(scope),
            pending: None,
            state: LoadState::Idle,
            next_seq: 0,
            latest_fetch: 0,
            deleting: Vec::new(),
            form: None,
            notices: VecDeque::new(),
            selected: 0,
            search_text: String::new(),
            debouncer: Debouncer::new(debounce),
            access: Access::Full,
        }
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }

    /// Listing only: create, update and delete are refused.
    pub fn read_only(self) -> Self {
        self.with_access(Access::ReadOnly)
    }

    pub fn access(&self) -> Access {
        self.access
    }

    pub fn rows(&self) -> &[E] {
        &self.rows
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn query(&self) -> &PageQuery {
        &self.query
    }

    pub fn scope(&self) -> Scope {
        self.query.scope
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn page_count(&self) -> usize {
        Page::<E>::page_count(self.total, self.query.page_size)
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading()
            || !self.deleting.is_empty()
            || self.form.as_ref().is_some_and(|f| f.state.is_submitting())
    }

    pub fn is_deleting(&self, id: i64) -> bool {
        self.deleting.contains(&id)
    }

    pub fn search_text(&self) -> &str {
        &self.search_text
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&E> {
        self.rows.get(self.selected)
    }

    pub fn form(&self) -> Option<&EntityForm<E>> {
        self.form.as_ref()
    }

    pub fn form_mut(&mut self) -> Option<&mut EntityForm<E>> {
        self.form.as_mut()
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    fn notify(&mut self, level: NoticeLevel, message: String) {
        match level {
            NoticeLevel::Error => warn!(kind = E::KIND.singular(), %message),
            _ => info!(kind = E::KIND.singular(), %message),
        }
        self.notices.push_back(Notice { level, message });
    }

    fn bump(&mut self) -> u64 {
        self.next_seq += 1;
        self.next_seq
    }

    /// The query the next page-relative operation starts from.
    fn target(&self) -> &PageQuery {
        self.pending.as_ref().unwrap_or(&self.query)
    }

    fn issue_fetch(&mut self, query: PageQuery) -> Request<E> {
        let seq = self.bump();
        self.latest_fetch = seq;
        self.state = LoadState::Loading;
        debug!(kind = E::KIND.singular(), seq, page = query.page_index, size = query.page_size, keyword = %query.keyword, "fetch");
        self.pending = Some(query.clone());
        Request::Fetch { seq, query }
    }

    pub fn fetch_page(&mut self, page_index: usize, page_size: usize, keyword: &str) -> Request<E> {
        let query = PageQuery::new(page_index, page_size, keyword.trim()).with_scope(self.query.scope);
        self.issue_fetch(query)
    }

    /// Re-fetch the current page with the current keyword.
    pub fn refresh(&mut self) -> Request<E> {
        let query = self.target().clone();
        self.issue_fetch(query)
    }

    /// Move to another page. The index is clamped to `[1, last page]` and the size to
    /// `1..=100`.
    pub fn change_page(&mut self, page_index: usize, page_size: usize) -> Request<E> {
        let size = page_size.clamp(1, MAX_PAGE_SIZE);
        let last = Page::<E>::page_count(self.total, size);
        let index = page_index.clamp(1, last);
        let keyword = self.target().keyword.clone();
        self.fetch_page(index, size, &keyword)
    }

    pub fn next_page(&mut self) -> Option<Request<E>> {
        let t = self.target();
        let (index, size) = (t.page_index, t.page_size);
        if index >= Page::<E>::page_count(self.total, size) {
            return None;
        }
        Some(self.change_page(index + 1, size))
    }

    pub fn prev_page(&mut self) -> Option<Request<E>> {
        let t = self.target();
        let (index, size) = (t.page_index, t.page_size);
        if index <= 1 {
            return None;
        }
        Some(self.change_page(index - 1, size))
    }

    /// Change the page size, landing on the page that holds the first visible row.
    pub fn set_page_size(&mut self, page_size: usize) -> Request<E> {
        let size = page_size.clamp(1, MAX_PAGE_SIZE);
        let index = self.target().offset() / size + 1;
        self.change_page(index, size)
    }

    /// Record a keystroke in the search box. Nothing is fetched until the text has
    /// been stable for the debounce window; see [`ListManager::poll`].
    pub fn search(&mut self, text: &str, now: Instant) {
        self.search_text = text.to_string();
        self.debouncer.push(text.trim(), now);
    }

    /// Fetch page 1 for the search text once it has settled.
    pub fn poll(&mut self, now: Instant) -> Option<Request<E>> {
        let keyword = self.debouncer.poll(now)?;
        let size = self.target().page_size;
        Some(self.fetch_page(1, size, &keyword))
    }

    /// Time until a pending search fires.
    pub fn search_deadline(&self, now: Instant) -> Option<Duration> {
        self.debouncer.remaining(now)
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.selected = 0;
            return;
        }
        let max = self.rows.len() as isize - 1;
        self.selected = (self.selected as isize + delta).clamp(0, max) as usize;
    }

    pub fn select(&mut self, idx: usize) {
        self.selected = idx;
        self.clamp_selection();
    }

    fn clamp_selection(&mut self) {
        self.selected = self.selected.min(self.rows.len().saturating_sub(1));
    }

    fn refuse(&self, allowed: bool) -> Result<(), ValidationError> {
        if allowed {
            Ok(())
        } else if self.access == Access::ReadOnly {
            Err(ValidationError::new("form", "this view is read-only"))
        } else {
            Err(ValidationError::new("form", "existing records cannot be changed here"))
        }
    }

    /// Normalize and validate, then issue a create. Invalid records never leave, and
    /// neither do records that would fall outside this view's scope.
    pub fn create(&mut self, mut record: E) -> Result<Request<E>, ValidationError> {
        self.refuse(self.access.can_create())?;
        record.normalize();
        record.validate()?;
        if !record.in_scope(self.query.scope) {
            return Err(ValidationError::new("form", "record does not belong to this list"));
        }
        let seq = self.bump();
        debug!(kind = E::KIND.singular(), seq, "create");
        Ok(Request::Create { seq, record })
    }

    pub fn update(&mut self, id: i64, mut record: E) -> Result<Request<E>, ValidationError> {
        self.refuse(self.access.can_modify())?;
        record.set_id(id);
        record.normalize();
        record.validate()?;
        let seq = self.bump();
        debug!(kind = E::KIND.singular(), seq, id, "update");
        Ok(Request::Update { seq, id, record })
    }

    /// Issue a delete. A second delete of an id still in flight is ignored.
    pub fn delete(&mut self, id: i64) -> Option<Request<E>> {
        if let Err(e) = self.refuse(self.access.can_modify()) {
            self.notify(NoticeLevel::Error, e.message);
            return None;
        }
        if self.deleting.contains(&id) {
            debug!(kind = E::KIND.singular(), id, "delete already in flight");
            return None;
        }
        self.deleting.push(id);
        let seq = self.bump();
        debug!(kind = E::KIND.singular(), seq, id, "delete");
        Some(Request::Delete { seq, id })
    }

    pub fn open_create_form(&mut self) -> bool {
        self.open_create_form_with(&[])
    }

    /// New-record form with some fields already filled in, given as form keys and
    /// raw text. Focus starts on the first field left blank.
    pub fn open_create_form_with(&mut self, preset: &[(&str, String)]) -> bool {
        if !self.access.can_create() {
            return false;
        }
        let mut base = E::default();
        for (key, raw) in preset {
            if let Err(e) = base.set_field(key, raw) {
                warn!(kind = E::KIND.singular(), key = *key, error = %e, "ignoring preset value");
            }
        }
        let mut form = EntityForm::create_from(base);
        if let Some(idx) = form
            .state
            .fields
            .iter()
            .position(|f| !preset.iter().any(|(key, _)| *key == f.key))
        {
            form.state.focus = idx;
        }
        self.form = Some(form);
        true
    }

    pub fn open_edit_form(&mut self) -> bool {
        if !self.access.can_modify() {
            return false;
        }
        match self.rows.get(self.selected) {
            Some(row) => {
                self.form = Some(EntityForm::edit(row));
                true
            }
            None => false,
        }
    }

    pub fn close_form(&mut self) {
        self.form = None;
    }

    /// Submit the open form. Returns `None` when there is no form, a submit is already
    /// in flight, or local validation failed (the error is shown on the form).
    pub fn submit_form(&mut self) -> Option<Request<E>> {
        let (built, mode) = {
            let form = self.form.as_ref()?;
            if form.state.is_submitting() {
                return None;
            }
            (form.build(), form.mode())
        };
        let result = built.and_then(|record| match mode {
            FormMode::Create => self.create(record),
            FormMode::Edit { id } => self.update(id, record),
        });
        let form = self.form.as_mut()?;
        match result {
            Ok(req) => {
                form.state.submitting = Some(req.seq());
                form.state.error = None;
                Some(req)
            }
            Err(e) => {
                form.state.error = Some(e.to_string());
                None
            }
        }
    }

    /// Apply a finished request. Returns follow-up requests to run (re-fetches).
    pub fn complete(&mut self, done: Completion<E>) -> Vec<Request<E>> {
        let seq = done.seq;
        match done.outcome {
            Outcome::Fetched(result) => self.complete_fetch(seq, result),
            Outcome::Created(result) => self.complete_save(seq, None, result),
            Outcome::Updated { id, result } => self.complete_save(seq, Some(id), result),
            Outcome::Deleted { id, result } => self.complete_delete(id, result),
        }
    }

    fn complete_fetch(&mut self, seq: u64, result: ApiResult<Page<E>>) -> Vec<Request<E>> {
        if seq != self.latest_fetch {
            debug!(kind = E::KIND.singular(), seq, latest = self.latest_fetch, "discarding stale page");
            return Vec::new();
        }
        let query = self.pending.take().unwrap_or_else(|| self.query.clone());
        match result {
            Ok(page) => {
                let last = Page::<E>::page_count(page.total, query.page_size);
                if page.rows.is_empty() && query.page_index > last {
                    // the set shrank under us; land on the new last page (1 when empty)
                    self.total = page.total;
                    let last_query = PageQuery {
                        page_index: last,
                        ..query
                    };
                    return vec![self.issue_fetch(last_query)];
                }
                self.rows = page.rows;
                self.total = page.total;
                self.query = query;
                self.state = LoadState::Loaded;
                self.clamp_selection();
            }
            Err(e) => {
                let message = e.to_string();
                self.state = LoadState::Error(message.clone());
                self.notify(
                    NoticeLevel::Error,
                    format!("Could not load {}: {message}", E::KIND.title().to_lowercase()),
                );
            }
        }
        Vec::new()
    }

    fn complete_save(&mut self, seq: u64, id: Option<i64>, result: ApiResult<Option<E>>) -> Vec<Request<E>> {
        let from_form = self.form.as_ref().is_some_and(|f| f.state.submitting == Some(seq));
        let verb = if id.is_some() { "update" } else { "create" };
        match result {
            Ok(echo) => {
                let label = match &echo {
                    Some(record) => record.label(),
                    None => match id {
                        Some(id) => format!("{} #{id}", E::KIND.singular()),
                        None => E::KIND.singular().to_string(),
                    },
                };
                if let Some(record) = echo {
                    if let Some(slot) = self.rows.iter_mut().find(|r| r.id() == record.id()) {
                        *slot = record;
                    }
                }
                if from_form {
                    self.form = None;
                }
                self.notify(NoticeLevel::Success, format!("Saved {label} ({verb})"));
                vec![self.refresh()]
            }
            Err(e) => {
                if from_form {
                    if let Some(form) = self.form.as_mut() {
                        form.state.submitting = None;
                        form.state.error = Some(e.to_string());
                    }
                }
                self.notify(NoticeLevel::Error, format!("Could not {verb} {}: {e}", E::KIND.singular()));
                Vec::new()
            }
        }
    }

    fn complete_delete(&mut self, id: i64, result: ApiResult<()>) -> Vec<Request<E>> {
        self.deleting.retain(|d| *d != id);
        match result {
            Ok(()) => {
                if let Some(pos) = self.rows.iter().position(|r| r.id() == id) {
                    self.rows.remove(pos);
                }
                self.total = self.total.saturating_sub(1);
                self.clamp_selection();
                self.notify(
                    NoticeLevel::Success,
                    format!("Deleted {} #{id}", E::KIND.singular()),
                );
                vec![self.refresh()]
            }
            Err(e) => {
                self.notify(
                    NoticeLevel::Error,
                    format!("Could not delete {} #{id}: {e}", E::KIND.singular()),
                );
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use crate::model::{Booking, Room};

    fn room(id: i64) -> Room {
        Room {
            id,
            name: format!("room{id}"),
            guests: 2,
            ..Room::default()
        }
    }

    fn page(ids: std::ops::RangeInclusive<i64>, total: usize) -> Page<Room> {
        Page {
            rows: ids.map(room).collect(),
            total,
        }
    }

    fn manager() -> ListManager<Room> {
        ListManager::new(Scope::All, 10, Duration::from_millis(500))
    }

    fn fetched(req: &Request<Room>, result: ApiResult<Page<Room>>) -> Completion<Room> {
        Completion {
            seq: req.seq(),
            outcome: Outcome::Fetched(result),
        }
    }

    fn loaded(total: usize) -> ListManager<Room> {
        let mut m = manager();
        let req = m.refresh();
        let last = total.min(10) as i64;
        assert!(m.complete(fetched(&req, Ok(page(1..=last, total)))).is_empty());
        m
    }

    #[test]
    fn only_latest_fetch_is_applied() {
        let mut m = manager();
        let slow = m.fetch_page(1, 10, "r");
        let fast = m.fetch_page(1, 10, "room");
        m.complete(fetched(&fast, Ok(page(1..=2, 2))));
        assert_eq!(m.rows().len(), 2);
        assert_eq!(m.query().keyword, "room");

        m.complete(fetched(&slow, Ok(page(1..=9, 9))));
        assert_eq!(m.rows().len(), 2);
        assert_eq!(m.total(), 2);
        assert_eq!(m.query().keyword, "room");
        assert_eq!(m.state(), &LoadState::Loaded);
    }

    #[test]
    fn stale_fetch_is_ignored_even_when_it_lands_first() {
        let mut m = manager();
        let old = m.fetch_page(1, 10, "a");
        let new = m.fetch_page(1, 10, "ab");
        m.complete(fetched(&old, Ok(page(1..=5, 5))));
        assert!(m.rows().is_empty());
        assert!(m.is_loading());
        m.complete(fetched(&new, Ok(page(3..=3, 1))));
        assert_eq!(m.rows()[0].id, 3);
    }

    #[test]
    fn failed_fetch_keeps_rows_and_reports() {
        let mut m = loaded(25);
        let req = m.change_page(2, 10);
        m.complete(fetched(&req, Err(ApiError::Network("timed out".into()))));
        assert_eq!(m.rows().len(), 10);
        assert_eq!(m.rows()[0].id, 1);
        assert_eq!(m.query().page_index, 1);
        assert!(matches!(m.state(), LoadState::Error(msg) if msg.contains("timed out")));
        let notices = m.take_notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].level, NoticeLevel::Error);
    }

    #[test]
    fn page_changes_are_clamped() {
        let mut m = loaded(25);
        match m.change_page(9, 10) {
            Request::Fetch { query, .. } => assert_eq!(query.page_index, 3),
            other => panic!("unexpected {other:?}"),
        }
        match m.change_page(0, 500) {
            Request::Fetch { query, .. } => {
                assert_eq!(query.page_index, 1);
                assert_eq!(query.page_size, 100);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn next_and_prev_stop_at_the_edges() {
        let mut m = loaded(25);
        assert!(m.prev_page().is_none());
        let r2 = m.next_page().unwrap();
        let r3 = m.next_page().unwrap();
        assert!(m.next_page().is_none());
        m.complete(fetched(&r2, Ok(page(11..=20, 25))));
        m.complete(fetched(&r3, Ok(page(21..=25, 25))));
        assert_eq!(m.query().page_index, 3);
        assert_eq!(m.rows().len(), 5);
    }

    #[test]
    fn empty_page_past_the_end_refetches_last_page() {
        let mut m = loaded(25);
        let r3 = m.change_page(3, 10);
        let follow = m.complete(fetched(&r3, Ok(Page { rows: vec![], total: 18 })));
        assert_eq!(follow.len(), 1);
        match &follow[0] {
            Request::Fetch { query, .. } => assert_eq!(query.page_index, 2),
            other => panic!("unexpected {other:?}"),
        }
        // rows of page 1 are still shown meanwhile
        assert_eq!(m.rows()[0].id, 1);
        m.complete(fetched(&follow[0], Ok(page(11..=18, 18))));
        assert_eq!(m.query().page_index, 2);
    }

    #[test]
    fn emptied_set_falls_back_to_page_one() {
        let mut m = loaded(25);
        let r3 = m.change_page(3, 10);
        let follow = m.complete(fetched(&r3, Ok(Page { rows: vec![], total: 0 })));
        assert_eq!(follow.len(), 1);
        match &follow[0] {
            Request::Fetch { query, .. } => assert_eq!(query.page_index, 1),
            other => panic!("unexpected {other:?}"),
        }
        assert!(m.complete(fetched(&follow[0], Ok(Page { rows: vec![], total: 0 }))).is_empty());
        assert_eq!(m.query().page_index, 1);
        assert_eq!(m.page_count(), 1);
        assert_eq!(m.total(), 0);
        assert!(m.rows().is_empty());
        assert_eq!(m.state(), &LoadState::Loaded);
    }

    #[test]
    fn page_size_change_keeps_first_visible_row() {
        let mut m = loaded(95);
        let r = m.change_page(3, 20);
        m.complete(fetched(&r, Ok(page(41..=60, 95))));
        // rows 41.. stay on screen: page 5 at size 10
        match m.set_page_size(10) {
            Request::Fetch { query, .. } => assert_eq!(query.page_index, 5),
            other => panic!("unexpected {other:?}"),
        }
        match m.set_page_size(50) {
            Request::Fetch { query, .. } => {
                assert_eq!(query.page_size, 50);
                assert_eq!(query.page_index, 1);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn search_fires_once_after_quiet_period_and_resets_to_page_one() {
        let mut m = loaded(25);
        let r = m.change_page(2, 10);
        m.complete(fetched(&r, Ok(page(11..=20, 25))));

        let t0 = Instant::now();
        for (i, text) in ["r", "ro", "roo", "room101"].iter().enumerate() {
            m.search(text, t0 + Duration::from_millis(100 * i as u64));
            assert!(m.poll(t0 + Duration::from_millis(100 * i as u64 + 50)).is_none());
        }
        assert_eq!(m.search_text(), "room101");
        let req = m.poll(t0 + Duration::from_millis(800)).unwrap();
        match &req {
            Request::Fetch { query, .. } => {
                assert_eq!(query.page_index, 1);
                assert_eq!(query.keyword, "room101");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(m.poll(t0 + Duration::from_secs(5)).is_none());
    }

    #[test]
    fn invalid_records_never_issue_requests() {
        let mut m = loaded(3);
        let err = m.create(Room::default()).unwrap_err();
        assert_eq!(err.field, "tenPhong");
        assert!(m.update(1, Room { guests: 0, ..room(1) }).is_err());
    }

    #[test]
    fn successful_create_refetches_current_page() {
        let mut m = loaded(3);
        let req = m.create(room(0)).unwrap();
        let follow = m.complete(Completion {
            seq: req.seq(),
            outcome: Outcome::Created(Ok(Some(room(4)))),
        });
        assert!(matches!(follow.as_slice(), [Request::Fetch { query, .. }] if query.page_index == 1));
        assert_eq!(m.take_notices()[0].level, NoticeLevel::Success);
    }

    #[test]
    fn failed_update_leaves_rows_untouched() {
        let mut m = loaded(3);
        let before = m.rows().to_vec();
        let req = m.update(2, Room { name: "renamed".into(), ..room(2) }).unwrap();
        let follow = m.complete(Completion {
            seq: req.seq(),
            outcome: Outcome::Updated {
                id: 2,
                result: Err(ApiError::Server {
                    status: 500,
                    message: "boom".into(),
                }),
            },
        });
        assert!(follow.is_empty());
        assert_eq!(m.rows(), before.as_slice());
    }

    #[test]
    fn echoed_update_replaces_the_row() {
        let mut m = loaded(3);
        let req = m.update(2, Room { name: "renamed".into(), ..room(2) }).unwrap();
        let echoed = Room { name: "renamed".into(), ..room(2) };
        m.complete(Completion {
            seq: req.seq(),
            outcome: Outcome::Updated {
                id: 2,
                result: Ok(Some(echoed)),
            },
        });
        assert_eq!(m.rows()[1].name, "renamed");
    }

    #[test]
    fn delete_removes_row_only_on_success() {
        let mut m = loaded(3);
        m.select(2);
        let req = m.delete(3).unwrap();
        assert!(m.delete(3).is_none(), "duplicate delete while in flight");
        assert!(m.is_busy());

        let follow = m.complete(Completion {
            seq: req.seq(),
            outcome: Outcome::Deleted {
                id: 3,
                result: Ok(()),
            },
        });
        assert_eq!(follow.len(), 1);
        assert_eq!(m.rows().len(), 2);
        assert_eq!(m.total(), 2);
        assert_eq!(m.selected(), 1);

        let req = m.delete(1).unwrap();
        m.complete(Completion {
            seq: req.seq(),
            outcome: Outcome::Deleted {
                id: 1,
                result: Err(ApiError::Server {
                    status: 404,
                    message: "not found".into(),
                }),
            },
        });
        assert_eq!(m.rows().len(), 2);
        assert_eq!(m.total(), 2);
        assert!(!m.is_deleting(1));
    }

    #[test]
    fn form_submit_is_guarded_and_closes_on_success() {
        let mut m = loaded(3);
        assert!(m.open_edit_form());
        {
            let form = m.form_mut().unwrap();
            form.state.focus = 0;
            form.state.input_char('!');
        }
        let req = m.submit_form().unwrap();
        assert!(m.submit_form().is_none(), "double submit");
        assert!(m.is_busy());

        m.complete(Completion {
            seq: req.seq(),
            outcome: Outcome::Updated {
                id: 1,
                result: Err(ApiError::Network("reset".into())),
            },
        });
        let form = m.form().unwrap();
        assert!(!form.state.is_submitting());
        assert!(form.state.error.as_deref().unwrap().contains("reset"));

        let req = m.submit_form().unwrap();
        m.complete(Completion {
            seq: req.seq(),
            outcome: Outcome::Updated { id: 1, result: Ok(None) },
        });
        assert!(m.form().is_none());
    }

    #[test]
    fn form_validation_error_stays_on_the_form() {
        let mut m = loaded(3);
        assert!(m.open_create_form());
        assert!(m.submit_form().is_none());
        let form = m.form().unwrap();
        assert!(form.state.error.is_some());
        assert!(!form.state.is_submitting());
    }

    #[test]
    fn read_only_views_refuse_mutations() {
        let mut m = ListManager::<Room>::new(Scope::ByLocation(2), 10, Duration::from_millis(500)).read_only();
        assert!(!m.open_create_form());
        assert!(m.create(room(0)).is_err());
        assert!(m.delete(1).is_none());
        assert_eq!(m.take_notices().len(), 1);
        match m.refresh() {
            Request::Fetch { query, .. } => assert_eq!(query.scope, Scope::ByLocation(2)),
            other => panic!("unexpected {other:?}"),
        }
    }

    fn booking(user_id: i64) -> Booking {
        Booking {
            room_id: 4,
            user_id,
            check_in: "2030-01-10".into(),
            check_out: "2030-01-12".into(),
            guests: 2,
            ..Booking::default()
        }
    }

    #[test]
    fn append_views_create_within_scope_only() {
        let mut m = ListManager::<Booking>::new(Scope::ByUser(2), 10, Duration::from_millis(500))
            .with_access(Access::Append);
        assert!(m.create(booking(2)).is_ok());
        let err = m.create(booking(3)).unwrap_err();
        assert!(err.message.contains("does not belong"));
        assert!(m.update(1, booking(2)).is_err());
        assert!(m.delete(1).is_none());
        assert!(!m.open_edit_form());
    }

    #[test]
    fn preset_create_form_fills_fields_and_focuses_the_rest() {
        let mut m = ListManager::<Booking>::new(Scope::ByUser(2), 10, Duration::from_millis(500))
            .with_access(Access::Append);
        assert!(m.open_create_form_with(&[("maNguoiDung", "2".into()), ("maPhong", "6".into())]));
        let form = m.form().unwrap();
        let value = |key: &str| {
            let idx = form.state.fields.iter().position(|f| f.key == key).unwrap();
            form.state.values[idx].clone()
        };
        assert_eq!(value("maNguoiDung"), "2");
        assert_eq!(value("maPhong"), "6");
        assert_eq!(form.state.focused().map(|f| f.key), Some("ngayDen"));
    }
}
