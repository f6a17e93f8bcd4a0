//! Menu configuration.
//!
//! Two layers:
//!
//! - [`MenuSettings`] is the user-facing surface: every option is optional,
//!   loaded from `menu.toml` (sparse, merged over stock defaults) and then
//!   patched by CLI flags or code.
//! - [`MenuConfiguration`] is the resolved, immutable value the renderer
//!   works with. It is produced once per top-level render by
//!   [`MenuSettings::resolve`], which is where every configuration error
//!   surfaces: unknown doktype names, negative depths, invalid tag names and
//!   conflicting options never make it into recursion.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # page_uid = 12           # Start page (default: root line at entry_level)
//! entry_level = 0
//! levels = 1                # Maximum depth rendered
//! expand_all = false        # Expand inactive branches too
//! show_hidden = false
//! show_current = true
//! link_current = true
//! link_active = true
//! show_access_protected = false
//! use_shortcut_uid = false
//! use_shortcut_data = false
//! title_fields = ["nav_title", "title"]
//! include_anchor_title = true
//! include_spacers = false
//! subst_element_uid = false
//! deferred = false
//! menu_variable = "menu"
//! root_line_variable = "rootLine"
//! exclude_pages = []
//! force_absolute_url = false
//! allowed_doktypes = ["default", "link", "shortcut", "mountpoint", "move-to-placeholder"]
//! # divider = "|"
//! container_tag = "ul"
//! child_tag = "li"
//! layout = "nested"          # or "flat": a run of links, no child wrappers
//!
//! [classes]
//! first = "first"
//! last = "last"
//! active = "active"
//! current = "current"
//! has_subpages = "sub"
//! access_protected = "protected"
//! access_granted = "access-granted"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::types::{Doktype, PageId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("Unknown doktype in allowed_doktypes: {0}")]
    UnknownDoktype(String),
}

/// How child items are laid out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MenuLayout {
    /// Each item wrapped in the child tag inside the container tag.
    #[default]
    Nested,
    /// Items emitted as a run of links; no child wrappers.
    Flat,
}

/// CSS class names applied per item state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassNames {
    pub first: String,
    pub last: String,
    pub active: String,
    pub current: String,
    pub has_subpages: String,
    pub access_protected: String,
    pub access_granted: String,
}

impl Default for ClassNames {
    fn default() -> Self {
        Self {
            first: "first".to_string(),
            last: "last".to_string(),
            active: "active".to_string(),
            current: "current".to_string(),
            has_subpages: "sub".to_string(),
            access_protected: "protected".to_string(),
            access_granted: "access-granted".to_string(),
        }
    }
}

/// Menu settings as loaded from `menu.toml`.
///
/// All fields have defaults; config files only need the keys they override.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MenuSettings {
    /// Explicit start page. Takes precedence over `entry_level`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_uid: Option<PageId>,
    /// Root-line level whose page is the menu root.
    pub entry_level: i64,
    /// Maximum depth rendered (1 = top level only).
    pub levels: i64,
    /// Last root-line level shown in a breadcrumb.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_level: Option<i64>,
    pub expand_all: bool,
    pub classes: ClassNames,
    /// Class attribute on the top-level container.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_class: Option<String>,
    /// Give every wrapped item `id="elem_<uid>"`.
    pub subst_element_uid: bool,
    pub show_hidden: bool,
    pub show_current: bool,
    pub link_current: bool,
    pub link_active: bool,
    pub show_access_protected: bool,
    pub use_shortcut_uid: bool,
    pub use_shortcut_data: bool,
    /// Ordered candidate fields for the item label.
    pub title_fields: Vec<String>,
    pub include_anchor_title: bool,
    pub include_spacers: bool,
    pub deferred: bool,
    pub menu_variable: String,
    pub root_line_variable: String,
    pub exclude_pages: Vec<PageId>,
    pub force_absolute_url: bool,
    pub allowed_doktypes: Vec<String>,
    /// Raw markup emitted between items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub divider: Option<String>,
    pub container_tag: String,
    pub child_tag: String,
    pub layout: MenuLayout,
}

impl Default for MenuSettings {
    fn default() -> Self {
        Self {
            page_uid: None,
            entry_level: 0,
            levels: 1,
            end_level: None,
            expand_all: false,
            classes: ClassNames::default(),
            container_class: None,
            subst_element_uid: false,
            show_hidden: false,
            show_current: true,
            link_current: true,
            link_active: true,
            show_access_protected: false,
            use_shortcut_uid: false,
            use_shortcut_data: false,
            title_fields: vec!["nav_title".to_string(), "title".to_string()],
            include_anchor_title: true,
            include_spacers: false,
            deferred: false,
            menu_variable: "menu".to_string(),
            root_line_variable: "rootLine".to_string(),
            exclude_pages: Vec::new(),
            force_absolute_url: false,
            allowed_doktypes: Doktype::menu_defaults()
                .iter()
                .map(|d| d.name().to_string())
                .collect(),
            divider: None,
            container_tag: "ul".to_string(),
            child_tag: "li".to_string(),
            layout: MenuLayout::Nested,
        }
    }
}

/// Resolved, immutable menu configuration.
///
/// Recursive renders share one instance; only the depth counter changes
/// between levels, and that lives in the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuConfiguration {
    pub page_uid: Option<PageId>,
    pub entry_level: usize,
    pub max_depth: usize,
    pub end_level: Option<usize>,
    pub expand_all: bool,
    pub classes: ClassNames,
    pub container_class: Option<String>,
    pub subst_element_uid: bool,
    pub show_hidden: bool,
    pub show_current: bool,
    pub link_current: bool,
    pub link_active: bool,
    pub show_access_protected: bool,
    pub use_shortcut_uid: bool,
    pub use_shortcut_data: bool,
    pub title_fields: Vec<String>,
    pub include_anchor_title: bool,
    pub include_spacers: bool,
    pub deferred: bool,
    pub menu_variable: String,
    pub root_line_variable: String,
    pub exclude_pages: BTreeSet<PageId>,
    pub force_absolute_url: bool,
    pub allowed_doktypes: BTreeSet<Doktype>,
    pub divider: Option<String>,
    pub container_tag: String,
    pub child_tag: String,
    pub layout: MenuLayout,
}

impl MenuConfiguration {
    /// Whether a doktype survives the allow-list.
    pub fn allows(&self, doktype: Doktype) -> bool {
        self.allowed_doktypes.contains(&doktype)
    }

    pub fn is_flat(&self) -> bool {
        self.layout == MenuLayout::Flat
    }

    /// Same configuration rooted at a different page.
    pub fn rooted_at(&self, page_id: PageId) -> Self {
        Self {
            page_uid: Some(page_id),
            ..self.clone()
        }
    }
}

impl Default for MenuConfiguration {
    fn default() -> Self {
        // Stock settings always resolve; a failure here is a bug in the defaults.
        MenuSettings::default()
            .resolve()
            .unwrap_or_else(|e| panic!("stock menu settings must resolve: {e}"))
    }
}

impl MenuSettings {
    /// Validate values that need no resolution.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.levels < 0 {
            return Err(ConfigError::Validation(format!(
                "levels must be non-negative, got {}",
                self.levels
            )));
        }
        if self.entry_level < 0 {
            return Err(ConfigError::Validation(format!(
                "entry_level must be non-negative, got {}",
                self.entry_level
            )));
        }
        if let Some(end) = self.end_level
            && end < self.entry_level
        {
            return Err(ConfigError::Validation(
                "end_level must not be below entry_level".into(),
            ));
        }
        validate_tag_name("container_tag", &self.container_tag)?;
        validate_tag_name("child_tag", &self.child_tag)?;
        if self.menu_variable.trim().is_empty() || self.root_line_variable.trim().is_empty() {
            return Err(ConfigError::Validation(
                "menu_variable and root_line_variable must not be empty".into(),
            ));
        }
        if self.menu_variable == self.root_line_variable {
            return Err(ConfigError::Validation(
                "menu_variable and root_line_variable must differ".into(),
            ));
        }
        if self.use_shortcut_uid && self.use_shortcut_data {
            return Err(ConfigError::Validation(
                "use_shortcut_uid and use_shortcut_data are mutually exclusive".into(),
            ));
        }
        Ok(())
    }

    /// Validate and freeze into a [`MenuConfiguration`].
    pub fn resolve(&self) -> Result<MenuConfiguration, ConfigError> {
        self.validate()?;

        let mut allowed_doktypes = BTreeSet::new();
        for name in &self.allowed_doktypes {
            let doktype =
                Doktype::from_name(name).ok_or_else(|| ConfigError::UnknownDoktype(name.clone()))?;
            allowed_doktypes.insert(doktype);
        }
        if allowed_doktypes.contains(&Doktype::Spacer) && !self.include_spacers {
            return Err(ConfigError::Validation(
                "allowed_doktypes lists spacer but include_spacers is false".into(),
            ));
        }
        if self.include_spacers {
            allowed_doktypes.insert(Doktype::Spacer);
        }

        Ok(MenuConfiguration {
            page_uid: self.page_uid,
            entry_level: to_usize(self.entry_level),
            max_depth: to_usize(self.levels),
            end_level: self.end_level.map(to_usize),
            expand_all: self.expand_all,
            classes: self.classes.clone(),
            container_class: self.container_class.clone().filter(|c| !c.trim().is_empty()),
            subst_element_uid: self.subst_element_uid,
            show_hidden: self.show_hidden,
            show_current: self.show_current,
            link_current: self.link_current,
            link_active: self.link_active,
            show_access_protected: self.show_access_protected,
            use_shortcut_uid: self.use_shortcut_uid,
            use_shortcut_data: self.use_shortcut_data,
            title_fields: self.title_fields.clone(),
            include_anchor_title: self.include_anchor_title,
            include_spacers: self.include_spacers,
            deferred: self.deferred,
            menu_variable: self.menu_variable.clone(),
            root_line_variable: self.root_line_variable.clone(),
            exclude_pages: self.exclude_pages.iter().copied().collect(),
            force_absolute_url: self.force_absolute_url,
            allowed_doktypes,
            divider: self.divider.clone(),
            container_tag: self.container_tag.clone(),
            child_tag: self.child_tag.clone(),
            layout: self.layout,
        })
    }
}

// Only called after validate() has rejected negatives.
fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

/// Tag names are spliced into markup unescaped, so only plain names pass.
fn validate_tag_name(key: &str, tag: &str) -> Result<(), ConfigError> {
    let valid = !tag.is_empty()
        && tag.starts_with(|c: char| c.is_ascii_alphabetic())
        && tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Validation(format!(
            "{key} must be a plain element name, got {tag:?}"
        )))
    }
}

// =============================================================================
// Config loading and merging
// =============================================================================

/// Returns the stock default settings as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(MenuSettings::default()).expect("default settings must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a settings file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_settings(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<MenuSettings, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let settings: MenuSettings = merged.try_into()?;
    settings.validate()?;
    Ok(settings)
}

/// Load settings from a `menu.toml`, falling back to stock defaults when the
/// file is missing.
pub fn load_settings(path: &Path) -> Result<MenuSettings, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(path)?;
    resolve_settings(base, overlay)
}

/// Returns a fully-commented stock `menu.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# navmenu configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Start page of the menu. When unset, the root-line page at entry_level is
# used, falling back to the current page.
# page_uid = 1

# Root-line level of the menu root (0 = site root).
entry_level = 0

# Number of levels rendered. Deeper levels only open along the active path
# unless expand_all is set.
levels = 1

# Breadcrumb only: last root-line level shown.
# end_level = 3

expand_all = false

# Include pages hidden in menus.
show_hidden = false

# Set to false to drop the current page from the menu.
show_current = true

# Set to false to render the current/active page as plain text.
link_current = true
link_active = true

# Include access-protected pages and mark them with the classes below.
show_access_protected = false

# Shortcut handling: link to the target's id, or take label and link from
# the target page entirely. Mutually exclusive.
use_shortcut_uid = false
use_shortcut_data = false

# Label candidates, first non-empty wins. Falls back to "title".
title_fields = ["nav_title", "title"]

# Add title="<label>" to links.
include_anchor_title = true

# Render spacer pages (as unlinked text).
include_spacers = false

# Give every item element id="elem_<uid>".
subst_element_uid = false

# Publish the menu for a deferred consumer instead of returning it.
deferred = false

# Variable names exposed to content rendered inside the menu.
menu_variable = "menu"
root_line_variable = "rootLine"

# Page ids never shown.
exclude_pages = []

force_absolute_url = false

# Allowed doktypes: default, link, shortcut, mountpoint, spacer, sysfolder,
# move-to-placeholder, recycler, backend-section.
allowed_doktypes = ["default", "link", "shortcut", "mountpoint", "move-to-placeholder"]

# Markup emitted between items.
# divider = "|"

container_tag = "ul"
child_tag = "li"

# "nested" wraps items in child_tag; "flat" emits a run of links.
layout = "nested"

# Class attribute on the outermost container.
# container_class = "nav"

# ---------------------------------------------------------------------------
# Item classes
# ---------------------------------------------------------------------------
[classes]
first = "first"
last = "last"
active = "active"
current = "current"
has_subpages = "sub"
access_protected = "protected"
access_granted = "access-granted"
"##
}
