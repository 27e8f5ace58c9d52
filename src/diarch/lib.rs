//! # Diarch Architecture
//!
//! Diarch is a **UI-agnostic PDF diary archive**. It keeps PDF documents and
//! their metadata in a local record store, migrates the old flat-list
//! format, validates and encodes uploads with progress, and projects the
//! archive into a filterable catalog with statistics. The CLI is one client
//! of the library, not the other way around.
//!
//! ## The Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, renders cards/rows/charts, prompts     │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Owns the store, the CatalogState and the quota probe     │
//! │  - Opens sessions (migration, degraded mode)                │
//! │  - Normalizes inputs (selectors → records)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs, state.rs, catalog.rs)        │
//! │  - Upload pipeline, migration, catalog projection           │
//! │  - Mutations: reduce(state, Action) → effects → store       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - DataStore trait, RecordStore over a StorageBackend       │
//! │  - FileStore (production), InMemoryStore (testing)          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O Assumptions in Core
//!
//! From `api.rs` inward, code takes regular Rust arguments, returns
//! `Result<CmdResult>`, and never writes to stdout/stderr or exits. Library
//! code logs through `tracing`; installing a subscriber is the binary's job.
//!
//! ## Testing Strategy
//!
//! 1. **Commands and store**: unit tests against the in-memory backend. This
//!    is where most tests live.
//! 2. **API**: session behavior (migration on open, degraded mode) and the
//!    end-to-end catalog scenarios.
//! 3. **CLI**: `tests/` runs the binary against a temporary data directory.
//!
//! ## Module Overview
//!
//! - [`api`]: The owning controller, entry point for all operations
//! - [`commands`]: Business logic for each command
//! - [`state`]: Catalog state and its reducer
//! - [`catalog`]: Filters, options, layout, statistics
//! - [`index`]: Display indexes and record selectors
//! - [`store`]: Storage abstraction and implementations
//! - [`encoding`]: Data URL encoding with progress
//! - [`quota`]: Storage quota estimation
//! - [`model`]: `Record`, `RecordId`
//! - [`config`]: Configuration management
//! - [`init`]: Context construction for the binary
//! - [`error`]: Error types

pub mod api;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod encoding;
pub mod error;
pub mod index;
pub mod init;
pub mod model;
pub mod quota;
pub mod state;
pub mod store;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;
