//! Daily pickup report.
//!
//! Reconciles the latest room inventory/revenue snapshot against the one taken
//! the day before, and renders the next seven days with the change in rooms
//! sold ("pickup") per date.

pub mod archive;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod locator;
pub mod outbox;
pub mod pipeline;
pub mod reconcile;
pub mod render;
pub mod resolver;
pub mod types;
pub mod util;
pub mod window;

pub use error::{ReportError, Result};
