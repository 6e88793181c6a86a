//! Utility functions for SectionWiki Core
//!
//! This module provides common utility functions used across the codebase.

mod render;

pub use render::{escape_html, render_content, strip_markdown};
