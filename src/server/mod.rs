//! Web UI and HTTP API

pub mod api;
