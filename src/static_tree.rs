//! In-memory page tree.
//!
//! [`StaticPageTree`] implements [`PageDataProvider`] over a flat page list,
//! typically loaded from a JSON file:
//!
//! ```json
//! {
//!   "current": 5,
//!   "base_url": "https://example.org",
//!   "locale": "de",
//!   "pages": [
//!     { "id": 1, "pid": 0, "title": "Home", "slug": "/" },
//!     { "id": 2, "pid": 1, "title": "About", "nav_title": "About us", "slug": "/about/" },
//!     { "id": 3, "pid": 1, "title": "Blog", "doktype": "shortcut", "shortcut": 7 },
//!     { "id": 4, "pid": 1, "title": "Docs", "doktype": "link", "url": "https://docs.example.org" },
//!     { "id": 5, "pid": 2, "title": "Team", "slug": "/about/team/", "protected": true, "granted": true },
//!     { "id": 6, "pid": 2, "title": "Jobs", "hidden_in_menu": true },
//!     { "id": 7, "pid": 3, "title": "Posts", "slug": "/blog/posts/", "hidden_locales": ["de"] }
//!   ]
//! }
//! ```
//!
//! Sibling order is the order pages appear in the list. Pages without a
//! `slug` link to `/<id>/`. A shortcut without a `shortcut` target points to
//! its first child.

use crate::provider::{ChildQuery, DataAccessError, PageDataProvider};
use crate::types::{Doktype, PageId, PageNode};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

/// One page entry of the JSON page file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticPage {
    pub id: PageId,
    #[serde(default)]
    pub pid: PageId,
    #[serde(default = "default_doktype")]
    pub doktype: Doktype,
    pub title: String,
    #[serde(default)]
    pub nav_title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
    /// External URL for `link` pages.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub shortcut: Option<PageId>,
    #[serde(default)]
    pub hidden_in_menu: bool,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub granted: bool,
    #[serde(default)]
    pub hidden_locales: Vec<String>,
}

fn default_doktype() -> Doktype {
    Doktype::Default
}

impl StaticPage {
    pub fn new(id: PageId, pid: PageId, title: &str) -> Self {
        Self {
            id,
            pid,
            doktype: Doktype::Default,
            title: title.to_string(),
            nav_title: None,
            subtitle: None,
            slug: None,
            url: None,
            target: None,
            shortcut: None,
            hidden_in_menu: false,
            protected: false,
            granted: false,
            hidden_locales: Vec::new(),
        }
    }

    fn to_node(&self) -> PageNode {
        let mut fields = BTreeMap::new();
        fields.insert("title".to_string(), self.title.clone());
        let optional = [
            ("nav_title", &self.nav_title),
            ("subtitle", &self.subtitle),
            ("slug", &self.slug),
            ("url", &self.url),
        ];
        for (name, value) in optional {
            if let Some(value) = value {
                fields.insert(name.to_string(), value.clone());
            }
        }
        PageNode {
            id: self.id,
            pid: self.pid,
            doktype: self.doktype,
            fields,
            target: self.target.clone(),
            shortcut: self.shortcut,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PageFile {
    current: PageId,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    locale: Option<String>,
    pages: Vec<StaticPage>,
}

/// Page tree held in memory for the duration of one request.
#[derive(Debug, Clone)]
pub struct StaticPageTree {
    current: PageId,
    base_url: Option<String>,
    locale: Option<String>,
    /// Declaration order, which is also sibling order.
    order: Vec<PageId>,
    pages: BTreeMap<PageId, StaticPage>,
}

impl StaticPageTree {
    pub fn new(current: PageId) -> Self {
        Self {
            current,
            base_url: None,
            locale: None,
            order: Vec::new(),
            pages: BTreeMap::new(),
        }
    }

    /// Load a JSON page file.
    pub fn load(path: &Path) -> Result<Self, DataAccessError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, DataAccessError> {
        let file: PageFile = serde_json::from_str(json)?;
        let mut tree = Self::new(file.current);
        tree.base_url = file.base_url;
        tree.locale = file.locale;
        for page in file.pages {
            tree.insert(page);
        }
        Ok(tree)
    }

    /// Add or replace a page. Replacing keeps the original position.
    pub fn insert(&mut self, page: StaticPage) {
        if !self.pages.contains_key(&page.id) {
            self.order.push(page.id);
        }
        self.pages.insert(page.id, page);
    }

    pub fn with_page(mut self, page: StaticPage) -> Self {
        self.insert(page);
        self
    }

    pub fn with_current(mut self, current: PageId) -> Self {
        self.current = current;
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Some(base_url.to_string());
        self
    }

    pub fn with_locale(mut self, locale: &str) -> Self {
        self.locale = Some(locale.to_string());
        self
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn get(&self, id: PageId) -> Option<&StaticPage> {
        self.pages.get(&id)
    }

    fn visible_to_visitor(&self, page: &StaticPage) -> bool {
        !page.protected || page.granted
    }

    fn slug_link(&self, page: &StaticPage) -> String {
        page.slug.clone().unwrap_or_else(|| format!("/{}/", page.id))
    }

    fn direct_link(&self, page: &StaticPage) -> String {
        match (page.doktype, &page.url) {
            (Doktype::Link, Some(url)) => url.clone(),
            _ => self.slug_link(page),
        }
    }
}

impl PageDataProvider for StaticPageTree {
    fn current_page_id(&self) -> PageId {
        self.current
    }

    fn root_line(
        &self,
        page_id: PageId,
        reverse: bool,
        include_access_protected: bool,
    ) -> Result<Vec<PageNode>, DataAccessError> {
        let mut line = Vec::new();
        let mut seen = BTreeSet::new();
        let mut next = Some(page_id);
        while let Some(id) = next {
            if !seen.insert(id) {
                return Err(DataAccessError::Backend(format!(
                    "cycle in page tree at page {id}"
                )));
            }
            let page = self
                .pages
                .get(&id)
                .ok_or(DataAccessError::PageNotFound(id))?;
            if include_access_protected || self.visible_to_visitor(page) {
                line.push(page.to_node());
            }
            next = (page.pid != 0).then_some(page.pid);
        }
        if !reverse {
            line.reverse();
        }
        Ok(line)
    }

    fn children(
        &self,
        page_id: PageId,
        query: &ChildQuery<'_>,
    ) -> Result<Vec<PageNode>, DataAccessError> {
        let children = self
            .order
            .iter()
            .filter_map(|id| self.pages.get(id))
            .filter(|page| page.pid == page_id && page.id != page_id)
            .filter(|page| !query.exclude.contains(&page.id))
            .filter(|page| query.include_hidden || !page.hidden_in_menu)
            .filter(|page| query.include_spacers || page.doktype != Doktype::Spacer)
            .filter(|page| query.include_access_protected || self.visible_to_visitor(page))
            .map(StaticPage::to_node)
            .collect();
        Ok(children)
    }

    fn is_active(
        &self,
        page_id: PageId,
        include_access_protected: bool,
    ) -> Result<bool, DataAccessError> {
        let line = self.root_line(self.current, false, include_access_protected)?;
        Ok(line.iter().any(|node| node.id == page_id))
    }

    fn is_access_protected(&self, node: &PageNode) -> bool {
        self.pages.get(&node.id).is_some_and(|p| p.protected)
    }

    fn is_access_granted(&self, node: &PageNode) -> bool {
        self.pages
            .get(&node.id)
            .is_some_and(|p| self.visible_to_visitor(p))
    }

    fn shortcut_target(&self, node: &PageNode) -> Result<Option<PageNode>, DataAccessError> {
        if node.doktype != Doktype::Shortcut {
            return Ok(None);
        }
        let target = match node.shortcut {
            Some(id) => self.pages.get(&id),
            None => self
                .order
                .iter()
                .filter_map(|id| self.pages.get(id))
                .find(|page| page.pid == node.id),
        };
        Ok(target.map(StaticPage::to_node))
    }

    fn build_link(&self, node: &PageNode, force_absolute: bool) -> Result<String, DataAccessError> {
        let link = match self.pages.get(&node.id) {
            // Shortcuts are followed one hop only.
            Some(page) if page.doktype == Doktype::Shortcut => {
                match self.shortcut_target(&page.to_node())? {
                    Some(target) => self
                        .pages
                        .get(&target.id)
                        .map(|t| self.direct_link(t))
                        .unwrap_or_else(|| self.slug_link(page)),
                    None => self.slug_link(page),
                }
            }
            Some(page) => self.direct_link(page),
            None => node
                .field("slug")
                .map(str::to_string)
                .unwrap_or_else(|| format!("/{}/", node.id)),
        };

        if !force_absolute || !link.starts_with('/') {
            return Ok(link);
        }
        let base = self.base_url.as_deref().ok_or_else(|| {
            DataAccessError::Backend("absolute URL requested but no base_url configured".into())
        })?;
        Ok(format!("{}{}", base.trim_end_matches('/'), link))
    }

    fn is_hidden_for_current_locale(&self, node: &PageNode) -> bool {
        let Some(locale) = &self.locale else {
            return false;
        };
        self.pages
            .get(&node.id)
            .is_some_and(|p| p.hidden_locales.iter().any(|l| l == locale))
    }
}
