//! Library crate for booking-admin.
//!
//! This crate exposes the building blocks of the TUI:
//! - Remote API clients, HTTP and in-memory (`api`)
//! - Application state and update loop (`app`)
//! - Command line and config files (`config`)
//! - The generic paged list manager (`manager`)
//! - Record types and their form/table metadata (`model`)
//! - UI rendering and widgets (`ui`)
//!
//! It is used by the `booking-admin` binary and by tests.
#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod api;
pub mod app;
pub mod config;
pub mod dates;
pub mod error;
pub mod manager;
pub mod model;
pub mod search;
pub mod ui;

// Re-export commonly used items at the crate root for convenience
/// Convenient error and result types shared across the crate.
pub use error::{DynError, Result};
