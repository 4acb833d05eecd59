//! autograph library crate.
//!
//! The autocommit core: change classification, the commit scheduler and its
//! policy gate, settings, and the session glue that ties them to a git
//! repository. The primary interface is the `autograph` binary; this
//! lib.rs exposes the modules so integration tests (and embedding hosts)
//! can drive the scheduler directly without going through the CLI.

pub mod classify;
pub mod config;
pub mod error;
pub mod gitignore;
pub mod message;
pub mod scheduler;
pub mod session;
pub mod telemetry;
