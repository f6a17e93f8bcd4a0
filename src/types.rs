//! Shared types passed between the provider, classifier and renderer.
//!
//! [`PageNode`] is the raw record a [`PageDataProvider`](crate::provider::PageDataProvider)
//! hands out. [`ClassifiedItem`] is the render-time view of a node: it only
//! lives for the duration of one menu render and is what gets exposed to
//! template content through the menu variable.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Page identifier. Unique within a single sibling fetch.
pub type PageId = u32;

/// Document type of a page.
///
/// Closed set: configuration refers to these by name and unknown names are
/// rejected when the configuration is resolved (see [`Doktype::from_name`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Doktype {
    /// Regular content page.
    Default,
    /// External URL.
    Link,
    /// Redirect to another page.
    Shortcut,
    /// Mounts another branch of the tree.
    Mountpoint,
    /// Visual separator, never linked.
    Spacer,
    /// Storage folder, not a page.
    Sysfolder,
    /// Workspace placeholder for a moved page.
    MoveToPlaceholder,
    /// Trash folder.
    Recycler,
    /// Backend-only section.
    BackendSection,
}

/// Name → variant lookup table used for configuration.
const DOKTYPE_NAMES: &[(&str, Doktype)] = &[
    ("default", Doktype::Default),
    ("link", Doktype::Link),
    ("shortcut", Doktype::Shortcut),
    ("mountpoint", Doktype::Mountpoint),
    ("spacer", Doktype::Spacer),
    ("sysfolder", Doktype::Sysfolder),
    ("move-to-placeholder", Doktype::MoveToPlaceholder),
    ("placeholder", Doktype::MoveToPlaceholder),
    ("recycler", Doktype::Recycler),
    ("backend-section", Doktype::BackendSection),
];

impl Doktype {
    /// Look up a doktype by its configuration name (case-insensitive,
    /// `_` and `-` are interchangeable).
    pub fn from_name(name: &str) -> Option<Doktype> {
        let normalized = name.trim().to_ascii_lowercase().replace('_', "-");
        DOKTYPE_NAMES
            .iter()
            .find(|(n, _)| *n == normalized)
            .map(|(_, d)| *d)
    }

    /// Canonical configuration name.
    pub fn name(self) -> &'static str {
        DOKTYPE_NAMES
            .iter()
            .find(|(_, d)| *d == self)
            .map(|(n, _)| *n)
            .unwrap_or("default")
    }

    /// The default allow-list for menus.
    pub fn menu_defaults() -> [Doktype; 5] {
        [
            Doktype::Default,
            Doktype::Link,
            Doktype::Shortcut,
            Doktype::Mountpoint,
            Doktype::MoveToPlaceholder,
        ]
    }
}

impl fmt::Display for Doktype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One page record as supplied by the page-data provider.
///
/// `fields` carries the label candidates (`title`, `nav_title`, ...) and any
/// other string columns the provider wants to expose to template content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageNode {
    pub id: PageId,
    #[serde(default)]
    pub pid: PageId,
    #[serde(default = "default_doktype")]
    pub doktype: Doktype,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    /// Link target (`_blank`, frame name) if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Page a shortcut points to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<PageId>,
}

fn default_doktype() -> Doktype {
    Doktype::Default
}

impl PageNode {
    pub fn new(id: PageId, pid: PageId, title: &str) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), title.to_string());
        Self {
            id,
            pid,
            doktype: Doktype::Default,
            fields,
            target: None,
            shortcut: None,
        }
    }

    pub fn with_doktype(mut self, doktype: Doktype) -> Self {
        self.doktype = doktype;
        self
    }

    pub fn with_field(mut self, name: &str, value: &str) -> Self {
        self.fields.insert(name.to_string(), value.to_string());
        self
    }

    /// Field value, `None` when absent.
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn title(&self) -> &str {
        self.field("title").unwrap_or_default()
    }

    /// First non-empty candidate field, falling back to `title`.
    pub fn resolve_label(&self, candidates: &[String]) -> String {
        candidates
            .iter()
            .filter_map(|name| self.field(name))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or_else(|| self.title())
            .to_string()
    }
}

/// A [`PageNode`] plus the render-time flags computed by the classifier.
///
/// Serialized as-is into the menu variable, so template content can iterate
/// `menu[*].label`, `menu[*].class`, `menu[*].has_sub` and friends.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassifiedItem {
    pub page: PageNode,
    /// Identifier used for linking and active/current checks. Differs from
    /// `page.id` only for substituted shortcuts.
    pub link_id: PageId,
    pub label: String,
    pub link: String,
    pub first: bool,
    pub last: bool,
    pub active: bool,
    pub current: bool,
    pub has_sub: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_protected: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_granted: Option<bool>,
    pub css_classes: Vec<String>,
    /// `css_classes` joined with spaces.
    pub class: String,
}

impl ClassifiedItem {
    pub fn is_spacer(&self) -> bool {
        self.page.doktype == Doktype::Spacer
    }

    /// Strip the render-time attributes, yielding the raw node again.
    pub fn into_page(self) -> PageNode {
        self.page
    }
}
