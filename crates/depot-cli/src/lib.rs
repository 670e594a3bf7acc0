//! # depot-cli — Registry Client Tool
//!
//! The `depot` command: push, pull, list, search, and delete artifacts
//! against a depot registry over its HTTP API.
//!
//! ## Subcommands
//!
//! - `depot push <package> <version> <file>` — upload an artifact.
//! - `depot pull <package> <version> [--output FILE]` — download one.
//! - `depot list` — list all packages.
//! - `depot search <query>` — packages whose name contains the query.
//! - `depot delete <package> <version>` — remove a version.
//!
//! All subcommands take `--server URL` and `--token TOKEN`.

pub mod client;
pub mod delete;
pub mod list;
pub mod progress;
pub mod pull;
pub mod push;

/// Default registry endpoint when `--server` is not given.
pub const DEFAULT_SERVER: &str = "http://localhost:8080";
