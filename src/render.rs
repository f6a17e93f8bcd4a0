//! Menu markup rendering.
//!
//! [`TreeRenderer`] walks classified sibling groups and produces nested
//! markup with [maud](https://maud.lambda.xyz/). Container and child tag
//! names are configurable, so element boundaries are emitted through
//! [`open_tag`]/[`close_tag`]; everything user-supplied (labels, links,
//! classes) still goes through maud's escaping.
//!
//! ## Expansion
//!
//! Top-level items are depth 1. An item opens a nested list only if it
//! has children, is active (or `expand_all` is set), and its depth is below
//! `max_depth`. Each expansion is a fresh fetch → classify → render cycle;
//! no subtree is cached or retained.
//!
//! ## Layouts
//!
//! ```text
//! nested:  <ul><li class="first"><a href="/a/">A</a><ul class="lvl-1">...</ul></li>...</ul>
//! flat:    <nav><a href="/a/" class="first">A</a>|...</nav>
//! ```
//!
//! The divider is raw markup taken from configuration.

use crate::classify::MenuItemClassifier;
use crate::config::MenuConfiguration;
use crate::provider::{DataAccessError, PageDataProvider};
use crate::types::ClassifiedItem;
use maud::{Markup, PreEscaped, html};
use tracing::debug;

/// How an item's label is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Linkable,
    Spacer,
    CurrentUnlinked,
    ActiveUnlinked,
}

impl LinkState {
    pub fn of(item: &ClassifiedItem, config: &MenuConfiguration) -> Self {
        if item.is_spacer() {
            LinkState::Spacer
        } else if item.current && !config.link_current {
            LinkState::CurrentUnlinked
        } else if item.active && !config.link_active {
            LinkState::ActiveUnlinked
        } else {
            LinkState::Linkable
        }
    }
}

/// One item of a rendered tree, as listed by [`TreeRenderer::outline`].
#[derive(Debug, Clone, PartialEq)]
pub struct OutlineEntry {
    pub depth: usize,
    pub item: ClassifiedItem,
}

pub struct TreeRenderer<'a, P: PageDataProvider + ?Sized> {
    provider: &'a P,
    config: &'a MenuConfiguration,
}

impl<'a, P: PageDataProvider + ?Sized> TreeRenderer<'a, P> {
    pub fn new(provider: &'a P, config: &'a MenuConfiguration) -> Self {
        Self { provider, config }
    }

    /// Render a top-level menu. Empty input renders nothing at all.
    pub fn render(&self, items: &[ClassifiedItem]) -> Result<Markup, DataAccessError> {
        self.render_level(items, 1)
    }

    /// Render one sibling group at `depth` (top level is 1).
    pub fn render_level(
        &self,
        items: &[ClassifiedItem],
        depth: usize,
    ) -> Result<Markup, DataAccessError> {
        let config = self.config;
        if items.is_empty() || depth > config.max_depth {
            return Ok(html! {});
        }
        debug!(depth, items = items.len(), "rendering menu level");

        let mut parts = Vec::with_capacity(items.len() * 2);
        for (index, item) in items.iter().enumerate() {
            let nested = if self.expands(item, depth) {
                let children = MenuItemClassifier::new(self.provider, config)
                    .children_of(item.page.id)?;
                Some(self.render_level(&children, depth + 1)?)
            } else {
                None
            };
            parts.push(self.render_item(item, nested));
            if index + 1 < items.len()
                && let Some(divider) = &config.divider
            {
                parts.push(self.render_divider(divider));
            }
        }

        let container_class = self.container_class(depth);
        Ok(html! {
            (open_tag(&config.container_tag, &[("class", container_class.as_deref())]))
            @for part in &parts {
                (part)
            }
            (close_tag(&config.container_tag))
        })
    }

    /// The items a render would emit, depth-first, with their depth.
    pub fn outline(&self, items: &[ClassifiedItem]) -> Result<Vec<OutlineEntry>, DataAccessError> {
        let mut entries = Vec::new();
        self.collect_outline(items, 1, &mut entries)?;
        Ok(entries)
    }

    fn collect_outline(
        &self,
        items: &[ClassifiedItem],
        depth: usize,
        entries: &mut Vec<OutlineEntry>,
    ) -> Result<(), DataAccessError> {
        if depth > self.config.max_depth {
            return Ok(());
        }
        for item in items {
            entries.push(OutlineEntry {
                depth,
                item: item.clone(),
            });
            if self.expands(item, depth) {
                let children = MenuItemClassifier::new(self.provider, self.config)
                    .children_of(item.page.id)?;
                self.collect_outline(&children, depth + 1, entries)?;
            }
        }
        Ok(())
    }

    /// `container_class` on every container; nested ones add `lvl-<n>`,
    /// counting the first nested level as 1.
    fn container_class(&self, depth: usize) -> Option<String> {
        let base = self.config.container_class.as_deref();
        if depth <= 1 {
            return base.map(str::to_string);
        }
        let level = format!("lvl-{}", depth - 1);
        Some(match base {
            Some(base) => format!("{base} {level}"),
            None => level,
        })
    }

    fn expands(&self, item: &ClassifiedItem, depth: usize) -> bool {
        item.has_sub && (item.active || self.config.expand_all) && depth < self.config.max_depth
    }

    /// Unlinked labels are bare text in both layouts; in the flat layout
    /// their classes have no element to attach to and are dropped.
    fn render_item(&self, item: &ClassifiedItem, nested: Option<Markup>) -> Markup {
        let config = self.config;
        let class = (!item.class.is_empty()).then_some(item.class.as_str());
        let state = LinkState::of(item, config);

        if config.is_flat() {
            return html! {
                @if state == LinkState::Linkable {
                    (self.render_link(item, class))
                } @else {
                    (item.label)
                }
                @if let Some(nested) = &nested {
                    (nested)
                }
            };
        }

        let element_id = config
            .subst_element_uid
            .then(|| format!("elem_{}", item.page.id));
        html! {
            (open_tag(&config.child_tag, &[("class", class), ("id", element_id.as_deref())]))
            @if state == LinkState::Linkable {
                (self.render_link(item, None))
            } @else {
                (item.label)
            }
            @if let Some(nested) = &nested {
                (nested)
            }
            (close_tag(&config.child_tag))
        }
    }

    fn render_link(&self, item: &ClassifiedItem, class: Option<&str>) -> Markup {
        let title = self
            .config
            .include_anchor_title
            .then_some(item.label.as_str());
        let target = item.page.target.as_deref().filter(|t| !t.is_empty());
        let rel = (target == Some("_blank")).then_some("noopener");
        html! {
            a href=(item.link) class=[class] title=[title] target=[target] rel=[rel] {
                (item.label)
            }
        }
    }

    fn render_divider(&self, divider: &str) -> Markup {
        let tag = &self.config.child_tag;
        if self.config.is_flat() {
            html! { (PreEscaped(divider)) }
        } else {
            html! {
                (open_tag(tag, &[]))
                (PreEscaped(divider))
                (close_tag(tag))
            }
        }
    }
}

/// Escape text for use in markup.
pub fn escape(text: &str) -> String {
    html! { (text) }.into_string()
}

/// Opening tag with escaped attribute values; `None` values are omitted.
///
/// Tag names are validated when the configuration is resolved.
pub fn open_tag(tag: &str, attrs: &[(&str, Option<&str>)]) -> PreEscaped<String> {
    let mut out = format!("<{tag}");
    for (name, value) in attrs {
        if let Some(value) = value {
            out.push_str(&format!(" {name}=\"{}\"", escape(value)));
        }
    }
    out.push('>');
    PreEscaped(out)
}

pub fn close_tag(tag: &str) -> PreEscaped<String> {
    PreEscaped(format!("</{tag}>"))
}
