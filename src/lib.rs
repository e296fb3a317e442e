//! # Space Nomad
//!
//! Mission catalogue backend that mirrors SpaceX launch data.
//!
//! This library provides:
//! - A mission store (SQLite or in-memory) with filtered, paginated queries
//! - An upsert synchronizer keyed by mission name
//! - A launch feed that caches the latest SpaceX API payload
//! - Startup, hourly, and on-demand sync triggers
//! - HTTP endpoints and two server-rendered pages
//!
//! ## Sync Flow
//! 1. A trigger refreshes the launch feed from the SpaceX API
//! 2. Launches are parsed into mission mappings
//! 3. Each valid mapping is created or updated by name
//! 4. Invalid mappings and fetch failures are logged and skipped
//!
//! ## Modules
//! - `api`: HTTP routes and the mission store
//! - `launches`: SpaceX client and launch feed cache
//! - `sync`: validation and upsert of launch records
//! - `scheduler`: sync triggers

pub mod api;
pub mod config;
pub mod launches;
pub mod scheduler;
pub mod sync;

pub use config::Config;
