use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::model::User;

pub const DEFAULT_BASE_URL: &str = "https://airbnbnew.cybersoft.edu.vn";

/// Where the Remote API lives and the fixed key sent with every request.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(15),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// The authenticated-session context: set on login, cleared on logout.
#[derive(Clone, Debug, Default)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

pub type SharedSession = Arc<RwLock<Session>>;

impl Session {
    pub fn signed_in(user: User, token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: Some(user),
        }
    }

    pub fn shared(self) -> SharedSession {
        Arc::new(RwLock::new(self))
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    pub fn user_id(&self) -> Option<i64> {
        self.user.as_ref().map(|u| u.id)
    }

    pub fn display_name(&self) -> String {
        match &self.user {
            Some(u) if !u.name.is_empty() => format!("{} ({})", u.name, u.role),
            Some(u) => format!("{} ({})", u.email, u.role),
            None => "anonymous".to_string(),
        }
    }

    pub fn logout(&mut self) {
        self.token = None;
        self.user = None;
    }
}
