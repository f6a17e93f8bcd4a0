//! Menu item classification.
//!
//! Turns one sibling group of raw [`PageNode`]s into [`ClassifiedItem`]s:
//! filters out what the menu must not show, then computes the per-item state
//! the renderer and template content work with.
//!
//! ## Filtering
//!
//! A node is dropped when its doktype is not allowed, it is hidden for the
//! current locale, its id is excluded, or it is the current page and
//! `show_current` is off. `first`/`last` are assigned after filtering, so an
//! excluded last sibling moves the `last` flag to its predecessor.
//!
//! ## Class order
//!
//! Classes are appended in a fixed order so output is deterministic:
//!
//! ```text
//! access_protected, access_granted, active, current, has_subpages, first, last
//! ```
//!
//! ## Children probe
//!
//! `has_sub` comes from [`PageDataProvider::has_children`], independent of
//! how deep the renderer is allowed to go: a leaf at the depth limit still
//! carries the `sub` class if it has children.

use crate::config::MenuConfiguration;
use crate::provider::{ChildQuery, DataAccessError, PageDataProvider};
use crate::types::{ClassifiedItem, Doktype, PageId, PageNode};
use tracing::{debug, trace, warn};

/// Child query matching a configuration.
pub fn child_query(config: &MenuConfiguration) -> ChildQuery<'_> {
    ChildQuery {
        exclude: &config.exclude_pages,
        include_hidden: config.show_hidden,
        include_spacers: config.include_spacers,
        include_access_protected: config.show_access_protected,
    }
}

pub struct MenuItemClassifier<'a, P: PageDataProvider + ?Sized> {
    provider: &'a P,
    config: &'a MenuConfiguration,
}

impl<'a, P: PageDataProvider + ?Sized> MenuItemClassifier<'a, P> {
    pub fn new(provider: &'a P, config: &'a MenuConfiguration) -> Self {
        Self { provider, config }
    }

    /// Fetch the children of `page_id` and classify them.
    pub fn children_of(&self, page_id: PageId) -> Result<Vec<ClassifiedItem>, DataAccessError> {
        let nodes = self.provider.children(page_id, &child_query(self.config))?;
        self.classify(nodes)
    }

    /// Classify one sibling group, preserving order.
    pub fn classify(&self, items: Vec<PageNode>) -> Result<Vec<ClassifiedItem>, DataAccessError> {
        let input = items.len();
        let survivors: Vec<PageNode> = items.into_iter().filter(|n| self.keep(n)).collect();
        let count = survivors.len();

        let mut classified = Vec::with_capacity(count);
        for (index, page) in survivors.into_iter().enumerate() {
            classified.push(self.classify_one(page, index == 0, index + 1 == count)?);
        }

        debug!(input, kept = count, "classified menu items");
        Ok(classified)
    }

    fn keep(&self, node: &PageNode) -> bool {
        if !self.config.allows(node.doktype) {
            trace!(page = node.id, doktype = %node.doktype, "doktype not allowed");
            return false;
        }
        if self.config.exclude_pages.contains(&node.id) {
            return false;
        }
        if self.provider.is_hidden_for_current_locale(node) {
            trace!(page = node.id, "hidden for current locale");
            return false;
        }
        self.config.show_current || !self.provider.is_current(node.id)
    }

    fn classify_one(
        &self,
        page: PageNode,
        first: bool,
        last: bool,
    ) -> Result<ClassifiedItem, DataAccessError> {
        let config = self.config;
        let (label_source, link_node) = self.resolve_shortcut(&page)?;

        // Activity follows the page itself; a substituted uid only affects
        // the current check and the link.
        let active = self
            .provider
            .is_active(page.id, config.show_access_protected)?;
        let current = self.provider.is_current(link_node.id);
        let has_sub = self.provider.has_children(page.id, &child_query(config))?;

        let (access_protected, access_granted) = if config.show_access_protected {
            let protected = self.provider.is_access_protected(&page);
            let granted = protected && self.provider.is_access_granted(&page);
            (Some(protected), Some(granted))
        } else {
            (None, None)
        };

        let classes = &config.classes;
        let flags = [
            (access_protected == Some(true), &classes.access_protected),
            (access_granted == Some(true), &classes.access_granted),
            (active, &classes.active),
            (current, &classes.current),
            (has_sub, &classes.has_subpages),
            (first, &classes.first),
            (last, &classes.last),
        ];
        let css_classes: Vec<String> = flags
            .iter()
            .filter(|(applies, name)| *applies && !name.is_empty())
            .map(|(_, name)| name.to_string())
            .collect();

        let link = if page.doktype == Doktype::Spacer {
            String::new()
        } else {
            self.provider.build_link(&link_node, config.force_absolute_url)?
        };

        Ok(ClassifiedItem {
            link_id: link_node.id,
            label: label_source.resolve_label(&config.title_fields),
            link,
            first,
            last,
            active,
            current,
            has_sub,
            access_protected,
            access_granted,
            class: css_classes.join(" "),
            css_classes,
            page,
        })
    }

    /// Pick the label source and link node for a page.
    ///
    /// Only shortcuts with a resolvable target and one of the substitution
    /// options set differ from the page itself.
    fn resolve_shortcut(&self, page: &PageNode) -> Result<(PageNode, PageNode), DataAccessError> {
        let config = self.config;
        if page.doktype != Doktype::Shortcut
            || !(config.use_shortcut_data || config.use_shortcut_uid)
        {
            return Ok((page.clone(), page.clone()));
        }
        let Some(target) = self.provider.shortcut_target(page)? else {
            warn!(page = page.id, "shortcut has no target, linking the page itself");
            return Ok((page.clone(), page.clone()));
        };
        if config.use_shortcut_data {
            Ok((target.clone(), target))
        } else {
            let link_node = PageNode {
                id: target.id,
                ..page.clone()
            };
            Ok((page.clone(), link_node))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MenuSettings;
    use crate::static_tree::{StaticPage, StaticPageTree};
    use crate::test_helpers::*;

    fn classify_root(tree: &StaticPageTree, config: &MenuConfiguration) -> Vec<ClassifiedItem> {
        MenuItemClassifier::new(tree, config).children_of(1).unwrap()
    }

    #[test]
    fn three_siblings_first_and_last() {
        let tree = three_siblings();
        let items = classify_root(&tree, &MenuConfiguration::default());
        assert_eq!(labels(&items), vec!["One", "Two", "Three"]);
        assert_eq!(classes(&items), vec!["first", "", "last"]);
    }

    #[test]
    fn exactly_one_first_and_last() {
        let tree = three_siblings();
        let items = classify_root(&tree, &MenuConfiguration::default());
        assert_eq!(items.iter().filter(|i| i.first).count(), 1);
        assert_eq!(items.iter().filter(|i| i.last).count(), 1);
    }

    #[test]
    fn single_item_is_first_and_last() {
        let tree = StaticPageTree::new(1)
            .with_page(StaticPage::new(1, 0, "Root"))
            .with_page(StaticPage::new(2, 1, "Only"));
        let items = classify_root(&tree, &MenuConfiguration::default());
        assert_eq!(items[0].css_classes, vec!["first", "last"]);
    }

    #[test]
    fn first_last_follow_filtered_sequence() {
        let tree = three_siblings();
        let config = settings(|s| s.exclude_pages = vec![13]);
        let items = classify_root(&tree, &config);
        assert_eq!(labels(&items), vec!["One", "Two"]);
        assert!(items[1].last);
    }

    #[test]
    fn disallowed_doktypes_dropped_before_first_last() {
        let mut folder = StaticPage::new(10, 1, "Storage");
        folder.doktype = Doktype::Sysfolder;
        let tree = three_siblings_with(vec![folder]);
        let items = classify_root(&tree, &MenuConfiguration::default());
        assert_eq!(labels(&items), vec!["One", "Two", "Three"]);
        assert!(items[0].first);
    }

    #[test]
    fn active_and_current_classes_in_order() {
        let tree = nested_tree().with_current(21);
        let config = MenuConfiguration::default();
        let items = classify_root(&tree, &config);
        let two = &items[1];
        assert!(two.active);
        assert!(!two.current);
        assert_eq!(two.css_classes, vec!["active", "sub"]);

        let children = MenuItemClassifier::new(&tree, &config).children_of(12).unwrap();
        assert_eq!(children[0].css_classes, vec!["active", "current", "first"]);
    }

    #[test]
    fn has_sub_ignores_depth_limit() {
        let tree = nested_tree();
        let config = settings(|s| s.levels = 0);
        let items = classify_root(&tree, &config);
        assert!(items[1].has_sub);
        assert!(!items[0].has_sub);
    }

    #[test]
    fn hide_current_page() {
        let tree = three_siblings().with_current(12);
        let config = settings(|s| s.show_current = false);
        let items = classify_root(&tree, &config);
        assert_eq!(labels(&items), vec!["One", "Three"]);
        assert!(items[1].last);
    }

    #[test]
    fn label_uses_title_fields() {
        let mut two = StaticPage::new(12, 1, "Two");
        two.nav_title = Some("Second".to_string());
        let tree = three_siblings().with_page(two);
        let items = classify_root(&tree, &MenuConfiguration::default());
        assert_eq!(items[1].label, "Second");

        let config = settings(|s| s.title_fields = vec!["subtitle".to_string()]);
        let items = classify_root(&tree, &config);
        assert_eq!(items[1].label, "Two");
    }

    #[test]
    fn access_classes_only_when_enabled() {
        let mut protected = StaticPage::new(14, 1, "Members");
        protected.protected = true;
        protected.granted = true;
        let tree = three_siblings_with(vec![protected]);

        let items = classify_root(&tree, &MenuConfiguration::default());
        assert_eq!(items[3].access_protected, None);
        assert_eq!(items[3].css_classes, vec!["last"]);

        let config = settings(|s| s.show_access_protected = true);
        let items = classify_root(&tree, &config);
        assert_eq!(items[3].access_protected, Some(true));
        assert_eq!(items[3].access_granted, Some(true));
        assert_eq!(
            items[3].css_classes,
            vec!["protected", "access-granted", "last"]
        );
    }

    #[test]
    fn protected_without_grant_is_marked_protected_only() {
        let mut protected = StaticPage::new(14, 1, "Members");
        protected.protected = true;
        let tree = three_siblings_with(vec![protected]);
        let config = settings(|s| s.show_access_protected = true);
        let items = classify_root(&tree, &config);
        assert_eq!(items[3].css_classes, vec!["protected", "last"]);
    }

    #[test]
    fn shortcut_substitution_modes() {
        let mut shortcut = StaticPage::new(14, 1, "Jump");
        shortcut.doktype = Doktype::Shortcut;
        shortcut.shortcut = Some(21);
        let tree = nested_tree().with_page(shortcut);

        let plain = classify_root(&tree, &MenuConfiguration::default());
        assert_eq!(plain[3].label, "Jump");
        assert_eq!(plain[3].link_id, 14);
        assert_eq!(plain[3].link, "/21/");

        let uid = classify_root(&tree, &settings(|s| s.use_shortcut_uid = true));
        assert_eq!(uid[3].label, "Jump");
        assert_eq!(uid[3].link_id, 21);

        let data = classify_root(&tree, &settings(|s| s.use_shortcut_data = true));
        assert_eq!(data[3].label, "Child A");
        assert_eq!(data[3].link, "/21/");
    }

    #[test]
    fn shortcut_uid_marks_current_but_not_active() {
        let mut shortcut = StaticPage::new(14, 1, "Jump");
        shortcut.doktype = Doktype::Shortcut;
        shortcut.shortcut = Some(21);
        let tree = nested_tree().with_page(shortcut).with_current(21);

        let items = classify_root(&tree, &settings(|s| s.use_shortcut_uid = true));
        let jump = &items[3];
        assert_eq!(jump.link_id, 21);
        assert!(jump.current);
        assert!(!jump.active);
        assert_eq!(jump.css_classes, vec!["current", "last"]);
        // The real ancestor of the current page stays active
        assert!(items[1].active);
    }

    #[test]
    fn spacers_have_no_link() {
        let mut spacer = StaticPage::new(14, 1, "---");
        spacer.doktype = Doktype::Spacer;
        let tree = three_siblings_with(vec![spacer]);
        let config = settings(|s| s.include_spacers = true);
        let items = classify_root(&tree, &config);
        assert!(items[3].is_spacer());
        assert_eq!(items[3].link, "");
    }

    #[test]
    fn empty_class_names_are_skipped() {
        let tree = three_siblings();
        let config = settings(|s| s.classes.first = String::new());
        let items = classify_root(&tree, &config);
        assert!(items[0].css_classes.is_empty());
    }

    #[test]
    fn reclassifying_raw_pages_is_stable() {
        let tree = nested_tree().with_current(21);
        let config = MenuConfiguration::default();
        let classifier = MenuItemClassifier::new(&tree, &config);
        let first = classifier.children_of(1).unwrap();
        let raw: Vec<PageNode> = first.iter().cloned().map(ClassifiedItem::into_page).collect();
        let second = classifier.classify(raw).unwrap();
        assert_eq!(classes(&first), classes(&second));
    }

    #[test]
    fn provider_failure_propagates() {
        let config = MenuConfiguration::default();
        let result = MenuItemClassifier::new(&FailingProvider, &config).children_of(1);
        assert!(matches!(result, Err(DataAccessError::Backend(_))));
    }

    #[test]
    fn empty_input_classifies_to_nothing() {
        let tree = three_siblings();
        let config = MenuSettings::default().resolve().unwrap();
        let items = MenuItemClassifier::new(&tree, &config).classify(vec![]).unwrap();
        assert!(items.is_empty());
    }
}
