//! platewatch - Live Plate-Detection Stream Client
//!
//! Client controller for a video/plate-detection backend: maintains the
//! WebSocket connection with bounded reconnects, routes stream events,
//! throttles snapshot uploads, deduplicates plate reads and derives
//! session statistics for display.

pub mod config;
pub mod connection;
pub mod controller;
pub mod dedup;
pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod reconnect;
pub mod session;
pub mod stats;
pub mod throttle;
pub mod ui;
pub mod upload;

pub use error::{Error, Result};
