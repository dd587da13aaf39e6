//! Per-user project and task tracking.
//!
//! A [`Workspace`] ties together a [`Substrate`] (where everything is
//! persisted), the [`Session`] naming the active identity, and the
//! [`RecordStore`] holding that identity's projects and tasks. Every mutation
//! rewrites the identity's whole snapshot; switching identity reloads it.

pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod query;
pub mod session;
pub mod storage;
pub mod store;
pub mod tui;
pub mod workspace;

pub use error::{Error, FieldErrors, Result};
pub use session::Session;
pub use storage::{FileSubstrate, MemorySubstrate, Substrate};
pub use store::RecordStore;
pub use workspace::Workspace;
