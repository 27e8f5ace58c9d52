//! # Diarch CLI
//!
//! The binary is intentionally thin: the CLI lives in `cli/`, while this file
//! only invokes `cli::run()` and handles process termination. Everything the
//! CLI calls lives in the `diarch` library and never touches the terminal.
//!
//! Errors from the library surface here as `Error: <reason>` on stderr with
//! exit status 1.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
