// Save-time formatter for acme - exposes all core modules for testing

pub mod app;
pub mod config;
pub mod document;
pub mod model;
pub mod services;
