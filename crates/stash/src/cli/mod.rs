//! # CLI Behavior
//!
//! The terminal client for the stash backend. It is the only place that knows
//! about terminal I/O, exit codes and output formatting.
//!
//! ## Stateless Invocations
//!
//! The store lives in memory, so every `stash ...` process starts from the
//! seed snapshot (or `STASH_SEED_FILE`) and forgets its changes on exit.
//! `stash shell` reads one command per line from stdin and runs them all
//! against a single store:
//!
//! ```text
//! printf 'tags rename beach shore\nmedia list -w tags=shore\n' | stash shell
//! ```
//!
//! ## Output
//!
//! By default results are rendered as tables, trees or field blocks, followed
//! by the envelope message. `--json` prints the full envelope instead
//! (`success`, `data`, `message`, `timestamp`, `requestId`), and failures print
//! the error envelope. Either way a failed command exits with status 1 and
//! reports `Error [code]: message` on stderr.
//!
//! ## Module Structure
//!
//! - `commands`: dispatch, the shell loop and output selection
//! - `render`: tables, trees and detail views
//! - `setup`: argument parsing via clap
//! - `styles`: terminal styling constants

mod commands;
mod render;
pub mod setup;
mod styles;

pub use commands::{describe_error, run};
