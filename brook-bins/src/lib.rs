//! Shared code for the brook command-line binaries.

pub mod common;
