//! Core module - Shared building blocks
//!
//! This module provides:
//! - Result records emitted by the CLI
//! - Rendering functions for different output formats
//! - Path derivation and key sanitization
//! - Common utilities (hashing, clocks)

pub mod model;
pub mod paths;
pub mod render;
pub mod util;
