//! Tracing subscriber setup
//!
//! This module provides shared tracing configuration used by both
//! the watcher binary and tests.

use std::fs::File;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub const DEFAULT_FILTER: &str = "info";

/// Initialize the global tracing subscriber.
///
/// Logs go to `log_file_path` when given (the file is truncated), otherwise
/// to stderr. Filtering follows `RUST_LOG`, defaulting to [`DEFAULT_FILTER`].
pub fn init_global(log_file_path: Option<&Path>) -> std::io::Result<()> {
    match log_file_path {
        Some(path) => {
            let log_file = File::create(path)?;
            build_subscriber(Arc::new(log_file), false).init();
        }
        None => build_subscriber(std::io::stderr, true).init(),
    }
    Ok(())
}

/// Build a subscriber writing to `writer`.
///
/// This is the core subscriber configuration shared between the binary and tests.
pub fn build_subscriber<W>(writer: W, ansi: bool) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(ansi)
        .with_target(false);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
}
