//! # CLI Behavior
//!
//! This is **one possible UI client** for diarch, not the application itself.
//! The CLI is the only place that knows about terminal I/O, exit codes, and output formatting.
//!
//! For the overall architecture, see the crate-level documentation of the `diarch` library.
//!
//! ### Naked Execution (`diarch`)
//!
//! Running `diarch` with no arguments defaults to `diarch list`.
//!
//! ### Session Notices
//!
//! Opening the store may migrate the legacy diary list or fall back to a
//! read-only session. Those notices go to stderr before the command output,
//! so piping `diarch list` keeps only the catalog on stdout.
//!
//! ### Confirmation
//!
//! `diarch delete` lists the selected diaries and asks before deleting.
//! `--yes` skips the prompt; anything other than `y`/`yes` cancels.
//!
//! ## Module Structure
//!
//! - `commands`: Per-command handlers that call API and format output
//! - `render`: Cards, rows, charts and messages as strings
//! - `setup`: Argument parsing via clap, grouped help text
//! - `styles`: Terminal styling
//! - `logging`: tracing subscriber installation
//! - `opener`: Hands files to the system viewer

mod commands;
mod logging;
mod opener;
mod render;
pub mod setup;
mod styles;

pub use commands::run;
