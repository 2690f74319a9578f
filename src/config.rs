//! Command-line and environment configuration.
//!
//! Flags fall back to `BOOKING_*` environment variables. `theme.conf` and
//! `keybinds.conf` live in the config directory.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Parser;

use crate::api::ApiConfig;
use crate::api::session::DEFAULT_BASE_URL;
use crate::error::{Result, simple_error};

pub const APP_DIR: &str = "booking-admin";
pub const PAGE_SIZES: [usize; 4] = [5, 10, 20, 50];

#[derive(Parser, Debug, Clone)]
#[command(name = "booking-admin", version, about)]
pub struct Cli {
    /// Base URL of the booking-site REST API.
    #[arg(long, env = "BOOKING_API_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Fixed API key sent as `TokenCybersoft`.
    #[arg(long, env = "BOOKING_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "BOOKING_EMAIL")]
    pub email: Option<String>,

    #[arg(long, env = "BOOKING_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Rows per page (1-100).
    #[arg(long, default_value_t = 10, value_parser = parse_page_size)]
    pub page_size: usize,

    /// Quiet period before a search is sent.
    #[arg(long, default_value_t = 500)]
    pub debounce_ms: u64,

    #[arg(long, default_value_t = 15)]
    pub timeout_secs: u64,

    /// Run against seeded in-memory data instead of the REST API.
    #[arg(long)]
    pub demo: bool,

    /// Artificial latency of the in-memory backend.
    #[arg(long, default_value_t = 0)]
    pub demo_latency_ms: u64,

    #[arg(long, env = "BOOKING_ADMIN_CONFIG_DIR")]
    pub config_dir: Option<PathBuf>,

    /// Log file; defaults to `booking-admin.log` in the config directory.
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

fn parse_page_size(s: &str) -> std::result::Result<usize, String> {
    let n: usize = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if (1..=100).contains(&n) {
        Ok(n)
    } else {
        Err("page size must be between 1 and 100".to_string())
    }
}

#[derive(Clone, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Resolved runtime settings.
#[derive(Clone, Debug)]
pub struct Settings {
    pub api: ApiConfig,
    pub credentials: Option<Credentials>,
    pub page_size: usize,
    pub debounce: Duration,
    pub demo: bool,
    pub demo_latency: Duration,
    pub config_dir: PathBuf,
    pub log_file: PathBuf,
}

impl Cli {
    pub fn into_settings(self) -> Result<Settings> {
        let credentials = match (self.email, self.password) {
            (Some(email), Some(password)) if !email.trim().is_empty() => Some(Credentials {
                email: email.trim().to_string(),
                password,
            }),
            _ => None,
        };
        if !self.demo && credentials.is_none() {
            return Err(simple_error(
                "--email and --password (or BOOKING_EMAIL / BOOKING_PASSWORD) are required unless --demo is given",
            ));
        }
        let config_dir = self.config_dir.unwrap_or_else(default_config_dir);
        let log_file = self
            .log_file
            .unwrap_or_else(|| config_dir.join(format!("{APP_DIR}.log")));
        Ok(Settings {
            api: ApiConfig::new(self.base_url, self.api_key)
                .with_timeout(Duration::from_secs(self.timeout_secs.max(1))),
            credentials,
            page_size: self.page_size,
            debounce: Duration::from_millis(self.debounce_ms),
            demo: self.demo,
            demo_latency: Duration::from_millis(self.demo_latency_ms),
            config_dir,
            log_file,
        })
    }
}

impl Settings {
    pub fn theme_path(&self) -> PathBuf {
        self.config_dir.join("theme.conf")
    }

    pub fn keybinds_path(&self) -> PathBuf {
        self.config_dir.join("keybinds.conf")
    }
}

/// `$XDG_CONFIG_HOME/booking-admin`, else `~/.config/booking-admin`, else the
/// working directory.
pub fn default_config_dir() -> PathBuf {
    config_dir_from(
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

fn config_dir_from(xdg: Option<PathBuf>, home: Option<PathBuf>) -> PathBuf {
    match (xdg, home) {
        (Some(x), _) if !x.as_os_str().is_empty() => x.join(APP_DIR),
        (_, Some(h)) if !h.as_os_str().is_empty() => h.join(".config").join(APP_DIR),
        _ => PathBuf::from("."),
    }
}

/// Next (`grow`) or previous entry of [`PAGE_SIZES`] relative to `current`.
pub fn step_page_size(current: usize, grow: bool) -> usize {
    if grow {
        PAGE_SIZES.iter().copied().find(|s| *s > current).unwrap_or(current)
    } else {
        PAGE_SIZES.iter().rev().copied().find(|s| *s < current).unwrap_or(current)
    }
}

pub fn ensure_dir(dir: &Path) -> Result<()> {
    use crate::error::Context;
    std::fs::create_dir_all(dir).with_ctx(|| format!("create config dir {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xdg_wins_over_home() {
        let d = config_dir_from(Some("/x".into()), Some("/home/a".into()));
        assert_eq!(d, PathBuf::from("/x/booking-admin"));
        let d = config_dir_from(None, Some("/home/a".into()));
        assert_eq!(d, PathBuf::from("/home/a/.config/booking-admin"));
        assert_eq!(config_dir_from(None, None), PathBuf::from("."));
    }

    #[test]
    fn page_size_steps() {
        assert_eq!(step_page_size(10, true), 20);
        assert_eq!(step_page_size(50, true), 50);
        assert_eq!(step_page_size(10, false), 5);
        assert_eq!(step_page_size(7, false), 5);
        assert_eq!(step_page_size(5, false), 5);
    }

    #[test]
    fn page_size_flag_is_range_checked() {
        assert!(parse_page_size("0").is_err());
        assert!(parse_page_size("101").is_err());
        assert_eq!(parse_page_size("25"), Ok(25));
    }
}
