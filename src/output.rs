//! CLI output formatting.
//!
//! # Information-First Display
//!
//! The outline lists what a menu *contains*, not the markup it becomes: each
//! item leads with its positional index among its siblings and its label.
//! State classes and the link follow as secondary context.
//!
//! # Output Format
//!
//! ## Outline
//!
//! ```text
//! 001 One → /11/
//! 002 Two [active sub] → /12/
//!     001 Child A [active current first] → /21/
//!     002 Child B [last] → /22/
//! 003 Three [last] → /13/
//! ```
//!
//! Spacers have no link and print without the arrow.
//!
//! ## Check
//!
//! ```text
//! Config
//!     Source: menu.toml
//!     Levels: entry 0, depth 2, end none
//!     Layout: nested <ul>/<li>
//!     Doktypes: default, link, shortcut, mountpoint, move-to-placeholder
//!     Variables: menu, rootLine
//!     Deferred: no
//! ```
//!
//! # Architecture
//!
//! Each display has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure.

use crate::config::{MenuConfiguration, MenuLayout};
use crate::render::OutlineEntry;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate to `max` characters, appending `...` if truncated.
fn truncate_label(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}

// ============================================================================
// Outline
// ============================================================================

/// Format the rendered menu as an indented, indexed item list.
///
/// Positions restart at 1 inside every nested group.
pub fn format_outline(entries: &[OutlineEntry]) -> Vec<String> {
    let mut lines = Vec::with_capacity(entries.len());
    // positions[d] is the last index used at depth d + 1
    let mut positions: Vec<usize> = Vec::new();

    for entry in entries {
        let level = entry.depth.saturating_sub(1);
        positions.truncate(level + 1);
        if positions.len() <= level {
            positions.resize(level + 1, 0);
        }
        positions[level] += 1;

        let item = &entry.item;
        let mut line = format!(
            "{}{} {}",
            indent(level),
            format_index(positions[level]),
            truncate_label(&item.label, 60)
        );
        if !item.class.is_empty() {
            line.push_str(&format!(" [{}]", item.class));
        }
        if !item.link.is_empty() {
            line.push_str(&format!(" → {}", item.link));
        }
        lines.push(line);
    }

    if lines.is_empty() {
        lines.push("(empty menu)".to_string());
    }
    lines
}

pub fn print_outline(entries: &[OutlineEntry]) {
    for line in format_outline(entries) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Summarize a resolved configuration.
pub fn format_check(config: &MenuConfiguration, source: Option<&Path>) -> Vec<String> {
    let mut lines = vec!["Config".to_string()];

    let source = match source {
        Some(path) => path.display().to_string(),
        None => "stock defaults".to_string(),
    };
    lines.push(format!("    Source: {}", source));

    let end = config
        .end_level
        .map_or_else(|| "none".to_string(), |level| level.to_string());
    lines.push(format!(
        "    Levels: entry {}, depth {}, end {}",
        config.entry_level, config.max_depth, end
    ));

    if let Some(page) = config.page_uid {
        lines.push(format!("    Start page: {}", page));
    }

    let layout = match config.layout {
        MenuLayout::Nested => format!("nested <{}>/<{}>", config.container_tag, config.child_tag),
        MenuLayout::Flat => format!("flat <{}>", config.container_tag),
    };
    lines.push(format!("    Layout: {}", layout));

    let doktypes: Vec<&str> = config.allowed_doktypes.iter().map(|d| d.name()).collect();
    lines.push(format!("    Doktypes: {}", doktypes.join(", ")));

    if !config.exclude_pages.is_empty() {
        let excluded: Vec<String> = config.exclude_pages.iter().map(|id| id.to_string()).collect();
        lines.push(format!("    Excluded: {}", excluded.join(", ")));
    }

    lines.push(format!(
        "    Variables: {}, {}",
        config.menu_variable, config.root_line_variable
    ));
    lines.push(format!("    Deferred: {}", yes_no(config.deferred)));
    lines
}

pub fn print_check(config: &MenuConfiguration, source: Option<&Path>) {
    for line in format_check(config, source) {
        println!("{}", line);
    }
}
