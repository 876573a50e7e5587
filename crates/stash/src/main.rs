//! # Stash CLI Architecture
//!
//! The binary is thin: the CLI lives in `src/cli/`, and this file only invokes
//! `cli::run()` and handles process termination.
//!
//! ## Workspace Structure
//!
//! - `crates/stashapp/`: the backend library (store, queries, integrity rules,
//!   envelopes, fault harness)
//! - `crates/stash/`: this CLI, depending on `stashapp`
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/stash/src/cli/)                          │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - dispatch + shell loop (commands.rs)                      │
//! │  - terminal rendering (render.rs, styles.rs)                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (crates/stashapp/src/api.rs)                     │
//! │  - Fault injection before each operation                    │
//! │  - Wraps results in success / error envelopes               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (crates/stashapp/src/commands/*)             │
//! │  - Queries, hierarchy and integrity rules over the store    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors reach `main` as `anyhow::Error`. Backend failures carry an
//! `ApiError`, which is reported with its error code.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", cli::describe_error(&e));
        std::process::exit(1);
    }
}
