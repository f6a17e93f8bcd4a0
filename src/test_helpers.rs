//! Shared test utilities for the navmenu test suite.
//!
//! Provides small page-tree fixtures, configuration shorthands, extractors
//! for classified items and rendered markup, and providers that fail on
//! purpose.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tree = nested_tree().with_current(21);
//! let config = settings(|s| s.levels = 2);
//! let items = MenuItemClassifier::new(&tree, &config).children_of(1).unwrap();
//!
//! assert_eq!(labels(&items), vec!["One", "Two", "Three"]);
//! assert_eq!(classes(&items), vec!["first", "active sub", "last"]);
//! ```

use crate::config::{MenuConfiguration, MenuSettings};
use crate::provider::{ChildQuery, DataAccessError, PageDataProvider};
use crate::side_channel::{SideChannelStore, Variables};
use crate::static_tree::{StaticPage, StaticPageTree};
use crate::types::{ClassifiedItem, Doktype, PageId, PageNode};

// =========================================================================
// Page trees
// =========================================================================

/// Root page 1 ("Home", current) with children 11 One, 12 Two, 13 Three.
pub fn three_siblings() -> StaticPageTree {
    StaticPageTree::new(1)
        .with_page(StaticPage::new(1, 0, "Home"))
        .with_page(StaticPage::new(11, 1, "One"))
        .with_page(StaticPage::new(12, 1, "Two"))
        .with_page(StaticPage::new(13, 1, "Three"))
}

/// [`three_siblings`] plus extra pages, appended in order.
pub fn three_siblings_with(extra: Vec<StaticPage>) -> StaticPageTree {
    extra
        .into_iter()
        .fold(three_siblings(), |tree, page| tree.with_page(page))
}

/// [`three_siblings`] with 21 "Child A" and 22 "Child B" under page 12.
pub fn nested_tree() -> StaticPageTree {
    three_siblings()
        .with_page(StaticPage::new(21, 12, "Child A"))
        .with_page(StaticPage::new(22, 12, "Child B"))
}

/// Root page 1 with a single chain 101 → 102 → … → 100 + `length` below it.
pub fn deep_chain(length: u32) -> StaticPageTree {
    (1..=length).fold(
        StaticPageTree::new(1).with_page(StaticPage::new(1, 0, "Home")),
        |tree, step| {
            let id = 100 + step;
            let pid = if step == 1 { 1 } else { id - 1 };
            tree.with_page(StaticPage::new(id, pid, &format!("Level {step}")))
        },
    )
}

/// [`three_siblings`] with a spacer page 14 labelled "---".
pub fn with_spacer() -> StaticPageTree {
    let mut spacer = StaticPage::new(14, 1, "---");
    spacer.doktype = Doktype::Spacer;
    three_siblings_with(vec![spacer])
}

/// Root page 1 with one external link page opening in a new window.
pub fn external_link_tree() -> StaticPageTree {
    let mut docs = StaticPage::new(2, 1, "Docs");
    docs.doktype = Doktype::Link;
    docs.url = Some("https://example.com/docs".to_string());
    docs.target = Some("_blank".to_string());
    StaticPageTree::new(1)
        .with_page(StaticPage::new(1, 0, "Home"))
        .with_page(docs)
}

pub fn single_page_titled(title: &str) -> StaticPageTree {
    StaticPageTree::new(1)
        .with_page(StaticPage::new(1, 0, "Home"))
        .with_page(StaticPage::new(2, 1, title))
}

// =========================================================================
// Configuration and request context
// =========================================================================

/// Resolve stock settings after applying `adjust`.
///
/// ```rust
/// let config = settings(|s| {
///     s.levels = 3;
///     s.expand_all = true;
/// });
/// ```
pub fn settings(adjust: impl FnOnce(&mut MenuSettings)) -> MenuConfiguration {
    let mut settings = MenuSettings::default();
    adjust(&mut settings);
    settings.resolve().unwrap()
}

/// Fresh side-channel store and variable bindings.
pub fn context() -> (SideChannelStore, Variables) {
    (SideChannelStore::new(), Variables::new())
}

// =========================================================================
// Extractors
// =========================================================================

pub fn labels(items: &[ClassifiedItem]) -> Vec<&str> {
    items.iter().map(|item| item.label.as_str()).collect()
}

/// Joined class string of each item, empty when the item has none.
pub fn classes(items: &[ClassifiedItem]) -> Vec<&str> {
    items.iter().map(|item| item.class.as_str()).collect()
}

/// Class attribute of every `<li>` in document order, empty when absent.
pub fn li_classes(html: &str) -> Vec<String> {
    html.match_indices("<li")
        .map(|(start, _)| {
            let tag = &html[start..start + html[start..].find('>').unwrap()];
            attribute(tag, "class").unwrap_or_default()
        })
        .collect()
}

/// Text content of every `<a>` in document order.
pub fn anchor_texts(html: &str) -> Vec<String> {
    html.match_indices("<a ")
        .map(|(start, _)| {
            let rest = &html[start..];
            let open_end = rest.find('>').unwrap() + 1;
            let close = rest.find("</a>").unwrap();
            rest[open_end..close].to_string()
        })
        .collect()
}

/// The nested list rendered right after the link labelled `label`.
pub fn nested_list_of_opt(html: &str, label: &str) -> Option<String> {
    let marker = format!(">{label}</a>");
    let after = &html[html.find(&marker)? + marker.len()..];
    if !after.starts_with("<ul") {
        return None;
    }
    let end = after.find("</ul>")? + "</ul>".len();
    Some(after[..end].to_string())
}

pub fn nested_list_of(html: &str, label: &str) -> String {
    nested_list_of_opt(html, label)
        .unwrap_or_else(|| panic!("no nested list after {label:?} in {html}"))
}

fn attribute(tag: &str, name: &str) -> Option<String> {
    let marker = format!(" {name}=\"");
    let start = tag.find(&marker)? + marker.len();
    let end = start + tag[start..].find('"')?;
    Some(tag[start..end].to_string())
}

// =========================================================================
// Failing providers
// =========================================================================

fn backend_failure(what: &str) -> DataAccessError {
    DataAccessError::Backend(format!("{what}: backend unavailable"))
}

/// Provider whose every data query fails.
pub struct FailingProvider;

impl PageDataProvider for FailingProvider {
    fn current_page_id(&self) -> PageId {
        1
    }

    fn root_line(
        &self,
        _page_id: PageId,
        _reverse: bool,
        _include_access_protected: bool,
    ) -> Result<Vec<PageNode>, DataAccessError> {
        Err(backend_failure("root line"))
    }

    fn children(
        &self,
        _page_id: PageId,
        _query: &ChildQuery<'_>,
    ) -> Result<Vec<PageNode>, DataAccessError> {
        Err(backend_failure("children"))
    }

    fn is_active(&self, _page_id: PageId, _include: bool) -> Result<bool, DataAccessError> {
        Err(backend_failure("active state"))
    }

    fn is_access_protected(&self, _node: &PageNode) -> bool {
        false
    }

    fn is_access_granted(&self, _node: &PageNode) -> bool {
        false
    }

    fn shortcut_target(&self, _node: &PageNode) -> Result<Option<PageNode>, DataAccessError> {
        Err(backend_failure("shortcut"))
    }

    fn build_link(
        &self,
        _node: &PageNode,
        _force_absolute: bool,
    ) -> Result<String, DataAccessError> {
        Err(backend_failure("link"))
    }

    fn is_hidden_for_current_locale(&self, _node: &PageNode) -> bool {
        false
    }
}

/// Wraps a tree so that fetching the children of one page fails.
///
/// The existence probe still answers from the wrapped tree, so the failure
/// surfaces only when a renderer actually descends into that page.
pub struct FailOnChildrenOf {
    inner: StaticPageTree,
    failing: PageId,
}

impl FailOnChildrenOf {
    pub fn new(inner: StaticPageTree, failing: PageId) -> Self {
        Self { inner, failing }
    }
}

impl PageDataProvider for FailOnChildrenOf {
    fn current_page_id(&self) -> PageId {
        self.inner.current_page_id()
    }

    fn root_line(
        &self,
        page_id: PageId,
        reverse: bool,
        include_access_protected: bool,
    ) -> Result<Vec<PageNode>, DataAccessError> {
        self.inner
            .root_line(page_id, reverse, include_access_protected)
    }

    fn children(
        &self,
        page_id: PageId,
        query: &ChildQuery<'_>,
    ) -> Result<Vec<PageNode>, DataAccessError> {
        if page_id == self.failing {
            return Err(backend_failure("children"));
        }
        self.inner.children(page_id, query)
    }

    fn has_children(
        &self,
        page_id: PageId,
        query: &ChildQuery<'_>,
    ) -> Result<bool, DataAccessError> {
        self.inner.has_children(page_id, query)
    }

    fn is_active(&self, page_id: PageId, include: bool) -> Result<bool, DataAccessError> {
        self.inner.is_active(page_id, include)
    }

    fn is_access_protected(&self, node: &PageNode) -> bool {
        self.inner.is_access_protected(node)
    }

    fn is_access_granted(&self, node: &PageNode) -> bool {
        self.inner.is_access_granted(node)
    }

    fn shortcut_target(&self, node: &PageNode) -> Result<Option<PageNode>, DataAccessError> {
        self.inner.shortcut_target(node)
    }

    fn build_link(&self, node: &PageNode, force_absolute: bool) -> Result<String, DataAccessError> {
        self.inner.build_link(node, force_absolute)
    }

    fn is_hidden_for_current_locale(&self, node: &PageNode) -> bool {
        self.inner.is_hidden_for_current_locale(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn li_classes_reads_missing_class_as_empty() {
        let html = r#"<ul><li class="first"><a href="/">A</a></li><li>B</li></ul>"#;
        assert_eq!(li_classes(html), vec!["first", ""]);
    }

    #[test]
    fn nested_list_found_after_label() {
        let html = r#"<ul><li><a href="/2/">Two</a><ul><li>x</li></ul></li></ul>"#;
        assert_eq!(nested_list_of(html, "Two"), "<ul><li>x</li></ul>");
        assert!(nested_list_of_opt(html, "Three").is_none());
    }

    #[test]
    fn deep_chain_links_each_level_to_the_previous() {
        let tree = deep_chain(3);
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.get(103).unwrap().pid, 102);
        assert_eq!(tree.get(101).unwrap().pid, 1);
    }
}
