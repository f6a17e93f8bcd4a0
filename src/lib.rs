//! # navmenu
//!
//! Hierarchical navigation menus for page trees. Given the page being
//! requested and a menu configuration, navmenu fetches the relevant sibling
//! groups from a page data source, classifies each entry (first, last,
//! active, current, has children), and renders nested list markup, expanding
//! only the branches the visitor is in.
//!
//! # Pipeline
//!
//! ```text
//! config  →  MenuConfiguration         (stock defaults → menu.toml → overrides)
//! pages   →  PageDataProvider          (root line, children, link building)
//! menu    →  classify → render         (recursive, depth-limited)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`types`] | Page records, doktypes, and classified menu items |
//! | [`config`] | Layered `menu.toml` loading, validation, and resolution |
//! | [`provider`] | The [`provider::PageDataProvider`] trait every data source implements |
//! | [`static_tree`] | In-memory provider loaded from a JSON page file |
//! | [`classify`] | Sibling-group fetch, filtering, and state classification |
//! | [`render`] | Recursive markup rendering with Maud |
//! | [`side_channel`] | Request-scoped side-channel store and variable bindings |
//! | [`menu`] | The facade: start page, content, deferred mode, submenus, breadcrumbs |
//! | [`output`] | CLI output formatting: menu outline and config summary |
//!
//! # Design Decisions
//!
//! ## Fresh Fetch Per Level
//!
//! Nothing is cached between levels or between requests. Each expanded item
//! triggers a fetch → classify → render cycle for its children, so the page
//! source stays the single source of truth and the renderer holds no state
//! beyond a depth counter.
//!
//! ## Explicit Request Context
//!
//! Menus that cooperate (a submenu continuing its parent, a deferred menu
//! consumed later in the same request) talk through a
//! [`side_channel::SideChannelStore`] and [`side_channel::Variables`] passed
//! in by the caller. Every publication and binding is guard-scoped and
//! released when the render call returns, on success or failure.
//!
//! ## Maud For Markup
//!
//! Markup is built with [Maud](https://maud.lambda.xyz/); every label, link,
//! and class is escaped on interpolation. Only the configured divider is
//! inserted raw.

pub mod classify;
pub mod config;
pub mod menu;
pub mod output;
pub mod provider;
pub mod render;
pub mod side_channel;
pub mod static_tree;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
