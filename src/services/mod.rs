//! External processes and I/O: formatters, the acme event log, logging setup.

pub mod command;
pub mod events;
pub mod formatter;
pub mod tracing_setup;
