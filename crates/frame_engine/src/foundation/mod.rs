//! Foundation module - Core utilities and types
//!
//! This module provides fundamental utilities used throughout the engine:
//! - Entity identifier generation
//! - Time sources for the frame clock
//! - Logging bootstrap

pub mod ids;
pub mod time;
pub mod logging;
