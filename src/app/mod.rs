//! Application state types and entry glue.
//!
//! Defines the tab set, modal dialogs and theme of the TUI, and builds the list
//! screens that match the signed-in user's role.
//!
pub mod keymap;
pub mod lookup;
pub mod screen;
pub mod update;

use std::path::Path;
use std::sync::{Arc, PoisonError};
use std::time::{Duration, Instant};

use ratatui::style::Color;
use tokio::runtime::Handle;

use crate::api::memory::{DemoData, MemoryApi};
use crate::api::{Remote, Session, SharedSession};
use crate::config::Settings;
use crate::manager::{Access, ListManager, Notice};
use crate::model::{Booking, Entity, EntityKind, Location, Room, Scope, User};
use keymap::Keymap;
use screen::{ListView, Screen};

/// Current input mode for key handling.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    Modal,
}

/// Color palette for theming the TUI.
#[derive(Clone, Copy, Debug)]
pub struct Theme {
    pub text: Color,
    pub muted: Color,
    pub title: Color,
    pub border: Color,
    pub header_bg: Color,
    pub header_fg: Color,
    pub status_bg: Color,
    pub status_fg: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error: Color,
    pub success: Color,
}

const THEME_KEYS: [&str; 12] = [
    "text",
    "muted",
    "title",
    "border",
    "header_bg",
    "header_fg",
    "status_bg",
    "status_fg",
    "highlight_fg",
    "highlight_bg",
    "error",
    "success",
];

impl Theme {
    /// Dark default theme.
    pub fn dark() -> Self {
        Self {
            text: Color::Gray,
            muted: Color::DarkGray,
            title: Color::Cyan,
            border: Color::Gray,
            header_bg: Color::Black,
            header_fg: Color::Cyan,
            status_bg: Color::DarkGray,
            status_fg: Color::Black,
            highlight_fg: Color::Yellow,
            highlight_bg: Color::Reset,
            error: Color::LightRed,
            success: Color::LightGreen,
        }
    }

    /// Catppuccin Mocha theme defaults.
    pub fn mocha() -> Self {
        // Palette reference: https://github.com/catppuccin/catppuccin
        Self {
            text: Color::Rgb(0xcd, 0xd6, 0xf4),         // text
            muted: Color::Rgb(0x7f, 0x84, 0x9c),        // overlay1
            title: Color::Rgb(0xcb, 0xa6, 0xf7),        // mauve
            border: Color::Rgb(0x58, 0x5b, 0x70),       // surface2
            header_bg: Color::Rgb(0x31, 0x32, 0x44),    // surface0
            header_fg: Color::Rgb(0xb4, 0xbe, 0xfe),    // lavender
            status_bg: Color::Rgb(0x45, 0x47, 0x5a),    // surface1
            status_fg: Color::Rgb(0xcd, 0xd6, 0xf4),    // text
            highlight_fg: Color::Rgb(0xf9, 0xe2, 0xaf), // yellow
            highlight_bg: Color::Rgb(0x45, 0x47, 0x5a), // surface1
            error: Color::Rgb(0xf3, 0x8b, 0xa8),        // red
            success: Color::Rgb(0xa6, 0xe3, 0xa1),      // green
        }
    }

    fn slot(&mut self, key: &str) -> Option<&mut Color> {
        Some(match key {
            "text" => &mut self.text,
            "muted" => &mut self.muted,
            "title" => &mut self.title,
            "border" => &mut self.border,
            "header_bg" => &mut self.header_bg,
            "header_fg" => &mut self.header_fg,
            "status_bg" => &mut self.status_bg,
            "status_fg" => &mut self.status_fg,
            "highlight_fg" => &mut self.highlight_fg,
            "highlight_bg" => &mut self.highlight_bg,
            "error" => &mut self.error,
            "success" => &mut self.success,
            _ => return None,
        })
    }

    /// Load theme from a simple key=value file. Unknown or missing keys fall back to `mocha`.
    pub fn from_file(path: impl AsRef<Path>) -> Option<Self> {
        let contents = std::fs::read_to_string(path).ok()?;
        Some(Self::parse(&contents))
    }

    pub fn parse(contents: &str) -> Self {
        let mut theme = Self::mocha();
        for raw_line in contents.lines() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, val)) = line.split_once('=') else {
                continue;
            };
            if let (Some(color), Some(slot)) = (Self::parse_color(val), theme.slot(key.trim())) {
                *slot = color;
            }
        }
        theme
    }

    /// Parse a color from hex ("#RRGGBB" or "RRGGBB") or "reset".
    fn parse_color(s: &str) -> Option<Color> {
        let lower = s.trim().to_ascii_lowercase();
        if lower == "reset" {
            return Some(Color::Reset);
        }
        let hex = lower.strip_prefix('#').unwrap_or(lower.as_str());
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    fn color_to_str(c: Color) -> String {
        match c {
            Color::Rgb(r, g, b) => format!("#{:02X}{:02X}{:02X}", r, g, b),
            Color::Reset => "reset".to_string(),
            // named colors: best-effort hex
            Color::Black => "#000000".to_string(),
            Color::Red => "#FF0000".to_string(),
            Color::Green => "#00FF00".to_string(),
            Color::Yellow => "#FFFF00".to_string(),
            Color::Blue => "#0000FF".to_string(),
            Color::Magenta => "#FF00FF".to_string(),
            Color::Cyan => "#00FFFF".to_string(),
            Color::Gray => "#B3B3B3".to_string(),
            Color::DarkGray => "#4D4D4D".to_string(),
            Color::LightRed => "#FF6666".to_string(),
            Color::LightGreen => "#66FF66".to_string(),
            Color::LightYellow => "#FFFF66".to_string(),
            Color::LightBlue => "#6666FF".to_string(),
            Color::LightMagenta => "#FF66FF".to_string(),
            Color::LightCyan => "#66FFFF".to_string(),
            Color::White => "#FFFFFF".to_string(),
            Color::Indexed(i) => format!("index:{}", i),
        }
    }

    /// Persist the theme to a config file in key=value format.
    pub fn write_file(&self, path: impl AsRef<Path>) -> std::io::Result<()> {
        use std::fmt::Write as _;
        let mut buf = String::new();
        buf.push_str("# booking-admin theme configuration\n");
        buf.push_str("# Colors: hex as #RRGGBB or RRGGBB, or 'reset'\n\n");
        let mut copy = *self;
        for key in THEME_KEYS {
            if let Some(c) = copy.slot(key) {
                let _ = writeln!(&mut buf, "{} = {}", key, Self::color_to_str(*c));
            }
        }
        std::fs::write(path, buf)
    }

    /// Load `path`, writing the defaults first when it does not exist.
    pub fn load_or_init(path: impl AsRef<Path>) -> Self {
        let p = path.as_ref();
        if p.exists() {
            return Self::from_file(p).unwrap_or_else(Self::mocha);
        }
        let t = Self::mocha();
        if let Err(e) = t.write_file(p) {
            tracing::warn!(path = %p.display(), error = %e, "could not write default theme");
        }
        t
    }
}

/// Entries of the per-row action menu.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RowAction {
    Edit,
    Delete,
    /// Rooms at the selected location.
    ShowRooms,
    /// New booking of the selected room for the signed-in user.
    BookRoom,
}

impl RowAction {
    pub fn label(self) -> &'static str {
        match self {
            RowAction::Edit => "Edit",
            RowAction::Delete => "Delete",
            RowAction::ShowRooms => "Rooms at this location",
            RowAction::BookRoom => "Book this room",
        }
    }
}

/// Modal dialogs.
#[derive(Clone, Debug)]
pub enum ModalState {
    Actions {
        selected: usize,
        options: Vec<RowAction>,
    },
    /// The create/edit form of the current view.
    Form,
    DeleteConfirm {
        selected: usize,
        id: i64,
        label: String,
    },
    Info {
        message: String,
    },
    Help {
        scroll: u16,
    },
}

/// Remote APIs for every entity, plus the session they authenticate with.
#[derive(Clone)]
pub struct Backends {
    pub users: Arc<dyn Remote<User>>,
    pub locations: Arc<dyn Remote<Location>>,
    pub rooms: Arc<dyn Remote<Room>>,
    pub bookings: Arc<dyn Remote<Booking>>,
    pub session: SharedSession,
}

impl Backends {
    /// Every entity served by the same client.
    pub fn shared<R>(api: Arc<R>, session: SharedSession) -> Self
    where
        R: Remote<User> + Remote<Location> + Remote<Room> + Remote<Booking> + 'static,
    {
        Self {
            users: api.clone(),
            locations: api.clone(),
            rooms: api.clone(),
            bookings: api,
            session,
        }
    }

    /// Seeded in-memory stores, signed in as the demo admin.
    pub fn demo(latency: Duration) -> Self {
        let data = DemoData::seed();
        let session = match data.admin() {
            Some(admin) => Session::signed_in(admin.clone(), "demo-token"),
            None => Session::default(),
        };
        Self {
            users: Arc::new(MemoryApi::new(data.users).with_latency(latency)),
            locations: Arc::new(MemoryApi::new(data.locations).with_latency(latency)),
            rooms: Arc::new(MemoryApi::new(data.rooms).with_latency(latency)),
            bookings: Arc::new(MemoryApi::new(data.bookings).with_latency(latency)),
            session: session.shared(),
        }
    }

    pub fn session(&self) -> Session {
        self.session.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

/// List options shared by every screen.
#[derive(Copy, Clone, Debug)]
pub struct ListOptions {
    pub page_size: usize,
    pub debounce: Duration,
}

impl ListOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            page_size: settings.page_size,
            debounce: settings.debounce,
        }
    }
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            page_size: 10,
            debounce: Duration::from_millis(500),
        }
    }
}

pub struct Tab {
    pub view: Box<dyn ListView>,
}

pub struct AppState {
    pub started_at: Instant,
    pub session: Session,
    pub backends: Backends,
    pub runtime: Handle,
    pub options: ListOptions,
    pub tabs: Vec<Tab>,
    pub active_tab: usize,
    /// Scoped list shown over the tabs (rooms of one location); Esc closes it.
    pub overlay: Option<Tab>,
    pub input_mode: InputMode,
    pub search_query: String,
    pub theme: Theme,
    pub keymap: Keymap,
    pub modal: Option<ModalState>,
    pub show_keybinds: bool,
    pub notice: Option<(Notice, Instant)>,
    pub logged_out: bool,
}

pub const NOTICE_TTL: Duration = Duration::from_secs(5);

fn screen<E: Entity>(
    title: impl Into<String>,
    remote: Arc<dyn Remote<E>>,
    runtime: &Handle,
    options: ListOptions,
    scope: Scope,
    access: Access,
) -> Screen<E> {
    let manager = ListManager::new(scope, options.page_size, options.debounce).with_access(access);
    Screen::new(title, manager, remote, runtime.clone())
}

fn tab(view: impl ListView + 'static) -> Tab {
    Tab { view: Box::new(view) }
}

/// Admins manage all four collections. Everyone else browses locations and their
/// rooms, and books rooms into a list of their own bookings.
pub fn tabs_for(session: &Session, backends: &Backends, runtime: &Handle, options: ListOptions) -> Vec<Tab> {
    let bookings = |title: &str, scope: Scope, access: Access| {
        tab(screen(title, backends.bookings.clone(), runtime, options, scope, access)
            .with_room_names(backends.rooms.clone()))
    };
    if session.is_admin() {
        return vec![
            tab(screen("Users", backends.users.clone(), runtime, options, Scope::All, Access::Full)),
            tab(screen("Locations", backends.locations.clone(), runtime, options, Scope::All, Access::Full)),
            tab(screen("Rooms", backends.rooms.clone(), runtime, options, Scope::All, Access::Full)),
            bookings("Bookings", Scope::All, Access::Full),
        ];
    }
    let user_id = session.user_id().unwrap_or_default();
    vec![
        tab(screen("Locations", backends.locations.clone(), runtime, options, Scope::All, Access::ReadOnly)),
        bookings("My bookings", Scope::ByUser(user_id), Access::Append),
    ]
}

impl AppState {
    pub fn new(backends: Backends, runtime: Handle, options: ListOptions, theme: Theme, keymap: Keymap) -> Self {
        let session = backends.session();
        let mut tabs = tabs_for(&session, &backends, &runtime, options);
        if let Some(first) = tabs.first_mut() {
            first.view.activate();
        }
        Self {
            started_at: Instant::now(),
            session,
            backends,
            runtime,
            options,
            tabs,
            active_tab: 0,
            overlay: None,
            input_mode: InputMode::Normal,
            search_query: String::new(),
            theme,
            keymap,
            modal: None,
            show_keybinds: false,
            notice: None,
            logged_out: false,
        }
    }

    /// View keys act on: the overlay when open, else the active tab.
    pub fn view(&self) -> Option<&dyn ListView> {
        match &self.overlay {
            Some(t) => Some(t.view.as_ref()),
            None => self.tabs.get(self.active_tab).map(|t| t.view.as_ref()),
        }
    }

    pub fn view_mut(&mut self) -> Option<&mut (dyn ListView + 'static)> {
        match &mut self.overlay {
            Some(t) => Some(t.view.as_mut()),
            None => self.tabs.get_mut(self.active_tab).map(|t| t.view.as_mut()),
        }
    }

    pub fn switch_tab(&mut self, forward: bool) {
        if self.overlay.is_some() || self.tabs.is_empty() {
            return;
        }
        let n = self.tabs.len();
        self.active_tab = if forward {
            (self.active_tab + 1) % n
        } else {
            (self.active_tab + n - 1) % n
        };
        self.search_query = self.tabs[self.active_tab].view.search_text().to_string();
        self.tabs[self.active_tab].view.activate();
    }

    /// Open the read-only list of rooms at `location_id` over the tabs.
    pub fn open_location_rooms(&mut self, location_id: i64, label: &str) {
        let mut overlay = tab(screen(
            format!("Rooms at {label}"),
            self.backends.rooms.clone(),
            &self.runtime,
            self.options,
            Scope::ByLocation(location_id),
            Access::ReadOnly,
        ));
        overlay.view.activate();
        self.search_query.clear();
        self.overlay = Some(overlay);
    }

    /// Tab that takes new bookings, if the session has one.
    fn booking_tab(&self) -> Option<usize> {
        self.session.user_id()?;
        self.tabs
            .iter()
            .position(|t| t.view.kind() == EntityKind::Booking && t.view.access().can_create())
    }

    /// Switch to the bookings tab and open a new booking of `room_id` for the
    /// signed-in user. Returns false when this session cannot book.
    pub fn book_room(&mut self, room_id: i64) -> bool {
        let (Some(idx), Some(user_id)) = (self.booking_tab(), self.session.user_id()) else {
            return false;
        };
        self.overlay = None;
        self.active_tab = idx;
        self.search_query = self.tabs[idx].view.search_text().to_string();
        let view = &mut self.tabs[idx].view;
        view.activate();
        view.open_create_form_with(&[("maNguoiDung", user_id.to_string()), ("maPhong", room_id.to_string())])
    }

    pub fn close_overlay(&mut self) -> bool {
        if self.overlay.take().is_some() {
            self.search_query = self.view().map(|v| v.search_text().to_string()).unwrap_or_default();
            true
        } else {
            false
        }
    }

    /// Row actions offered for the current view's selection.
    pub fn row_actions(&self) -> Vec<RowAction> {
        let Some(view) = self.view() else {
            return Vec::new();
        };
        if view.selected_id().is_none() {
            return Vec::new();
        }
        let mut out = Vec::new();
        if view.access().can_modify() {
            out.push(RowAction::Edit);
            out.push(RowAction::Delete);
        }
        match view.kind() {
            EntityKind::Location => out.push(RowAction::ShowRooms),
            EntityKind::Room if self.booking_tab().is_some() => out.push(RowAction::BookRoom),
            _ => {}
        }
        out
    }

    /// Tear down the session; no authenticated request is sent afterwards.
    pub fn logout(&mut self) {
        self.backends
            .session
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .logout();
        self.session.logout();
        self.logged_out = true;
        tracing::info!("logged out");
    }

    /// Advance every screen and collect their notices.
    pub fn tick(&mut self, now: Instant) {
        let mut notices = Vec::new();
        for tab in self.tabs.iter_mut().chain(self.overlay.iter_mut()) {
            tab.view.tick(now);
            notices.extend(tab.view.take_notices());
        }
        if let Some(last) = notices.pop() {
            self.notice = Some((last, now));
        }
        if self
            .notice
            .as_ref()
            .is_some_and(|(_, at)| now.saturating_duration_since(*at) > NOTICE_TTL)
        {
            self.notice = None;
        }
        // the form closes itself on a successful save
        if matches!(self.modal, Some(ModalState::Form)) && self.view().is_none_or(|v| v.form().is_none()) {
            self.modal = None;
            self.input_mode = InputMode::Normal;
        }
    }

    /// Poll timeout for the event loop: the idle tick, or sooner when a search is due.
    pub fn poll_timeout(&self, now: Instant) -> Duration {
        let idle = Duration::from_millis(100);
        self.tabs
            .iter()
            .chain(self.overlay.iter())
            .filter_map(|t| t.view.next_deadline(now))
            .fold(idle, Duration::min)
    }
}

/// Re-export the application event loop entry function.
pub use update::run_app as run;
