//! Core data model for diffs and edit scripts
//!
//! This module contains pure data structures and functions with no I/O.

pub mod edit_script;
pub mod line_diff;
pub mod span;
