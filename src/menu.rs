//! Menu orchestration.
//!
//! [`MenuFacade`] runs one full menu render for a request:
//!
//! ```text
//! root line → start page → fetch + classify → publish parent state
//!           → bind menu/rootLine variables → content and/or tree render
//!           → release bindings and publications
//! ```
//!
//! ## Content
//!
//! Every render takes a `content` closure standing in for whatever the host
//! renders inside the menu. It runs with the menu variables bound and can
//! call back into the facade for submenus or deferred output.
//!
//! - Normal mode: a menu without items renders nothing, content included.
//!   Otherwise content is rendered first; if it is blank after trimming, the
//!   automatic tree render is returned instead.
//! - Deferred mode: the tree is rendered up front and published to the side
//!   channel together with the item data; the call returns the content
//!   output only. Content fetches the menu through [`MenuFacade::render_deferred`]
//!   or [`MenuFacade::render_deferred_as`].
//!
//! ## Submenus
//!
//! While a menu's content runs, the menu's configuration and the variable
//! bindings it started with are published under [`PARENT_KEY`].
//! [`MenuFacade::render_submenu`] picks them up, so a submenu rendered from
//! the content behaves like a continuation of the parent. Without a parent
//! it renders on its own with a fallback configuration.
//!
//! All publications and bindings are guard-scoped; nothing a render call
//! adds outlives that call, whether it succeeds or fails.

use crate::classify::MenuItemClassifier;
use crate::config::{ConfigError, MenuConfiguration};
use crate::provider::{DataAccessError, PageDataProvider};
use crate::render::TreeRenderer;
use crate::side_channel::{
    DEFERRED_ITEMS_KEY, DEFERRED_MARKUP_KEY, MENU_NAMESPACE, PARENT_KEY, ParentState,
    SideChannelStore, SideChannelValue, Variables,
};
use crate::types::{ClassifiedItem, PageId, PageNode};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum MenuError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
    #[error("Data access error: {0}")]
    DataAccess(#[from] DataAccessError),
    #[error("Could not expose menu data: {0}")]
    Variables(#[from] serde_json::Error),
}

/// Render a menu with no surrounding content and a fresh request context.
pub fn render_menu<P: PageDataProvider + ?Sized>(
    provider: &P,
    config: &MenuConfiguration,
) -> Result<String, MenuError> {
    let store = SideChannelStore::new();
    let variables = Variables::new();
    MenuFacade::new(provider, &store, &variables).render(config)
}

pub struct MenuFacade<'a, P: PageDataProvider + ?Sized> {
    provider: &'a P,
    store: &'a SideChannelStore,
    variables: &'a Variables,
}

impl<'a, P: PageDataProvider + ?Sized> MenuFacade<'a, P> {
    pub fn new(provider: &'a P, store: &'a SideChannelStore, variables: &'a Variables) -> Self {
        Self {
            provider,
            store,
            variables,
        }
    }

    pub fn provider(&self) -> &P {
        self.provider
    }

    pub fn store(&self) -> &SideChannelStore {
        self.store
    }

    pub fn variables(&self) -> &Variables {
        self.variables
    }

    /// Automatic tree render, no content.
    pub fn render(&self, config: &MenuConfiguration) -> Result<String, MenuError> {
        self.render_menu(config, |_| Ok(String::new()))
    }

    pub fn render_menu<F>(
        &self,
        config: &MenuConfiguration,
        content: F,
    ) -> Result<String, MenuError>
    where
        F: FnOnce(&Self) -> Result<String, MenuError>,
    {
        let (items, root_line) = self.menu_items(config)?;
        debug!(items = items.len(), deferred = config.deferred, "rendering menu");
        self.render_items(config, &items, &root_line, content)
    }

    /// Classified top-level items of the menu `config` describes, together
    /// with the current root line.
    pub fn menu_items(
        &self,
        config: &MenuConfiguration,
    ) -> Result<(Vec<ClassifiedItem>, Vec<PageNode>), MenuError> {
        let root_line = self.current_root_line(config)?;
        let start = self.start_page(config, &root_line);
        trace!(page = start, "menu start page");
        let items = MenuItemClassifier::new(self.provider, config).children_of(start)?;
        Ok((items, root_line))
    }

    /// Render the children of `page_id` as a continuation of the enclosing menu.
    ///
    /// With a published parent, the parent's configuration is reused and the
    /// submenu renders only if the page is active or the parent expands all.
    /// Without one, `fallback` is used unconditionally.
    pub fn render_submenu<F>(
        &self,
        page_id: PageId,
        fallback: &MenuConfiguration,
        content: F,
    ) -> Result<String, MenuError>
    where
        F: FnOnce(&Self) -> Result<String, MenuError>,
    {
        let Some(parent) = self.store.parent() else {
            debug!(page = page_id, "no parent menu published, rendering submenu independently");
            return self.render_menu(&fallback.rooted_at(page_id), content);
        };

        let config = parent.config.rooted_at(page_id);
        if !config.expand_all
            && !self
                .provider
                .is_active(page_id, config.show_access_protected)?
        {
            trace!(page = page_id, "submenu page not active, skipping");
            return Ok(String::new());
        }

        let mut scope = self.variables.scope();
        scope.bind_all(&parent.variables);
        self.render_menu(&config, content)
    }

    /// Deferred markup published by the enclosing menu, empty if none.
    pub fn render_deferred(&self) -> String {
        self.store.deferred_markup().unwrap_or_default()
    }

    /// Bind the deferred item array to `variable` and render `content`.
    ///
    /// Returns an empty string when no deferred menu is published.
    pub fn render_deferred_as<F>(&self, variable: &str, content: F) -> Result<String, MenuError>
    where
        F: FnOnce(&Self) -> Result<String, MenuError>,
    {
        let Some(items) = self.store.deferred_items() else {
            debug!(variable, "no deferred menu published");
            return Ok(String::new());
        };
        let mut scope = self.variables.scope();
        scope.bind(variable, items);
        content(self)
    }

    /// Render the current root line as a flat breadcrumb trail.
    ///
    /// Levels `entry_level..=end_level` of the root line are classified like
    /// any sibling group; nothing expands.
    pub fn render_breadcrumb<F>(
        &self,
        config: &MenuConfiguration,
        content: F,
    ) -> Result<String, MenuError>
    where
        F: FnOnce(&Self) -> Result<String, MenuError>,
    {
        let root_line = self.current_root_line(config)?;
        let end = config
            .end_level
            .map_or(root_line.len(), |level| level + 1)
            .min(root_line.len());
        let start = config.entry_level.min(end);

        let crumb_config = MenuConfiguration {
            max_depth: 1,
            expand_all: false,
            ..config.clone()
        };
        let items = MenuItemClassifier::new(self.provider, &crumb_config)
            .classify(root_line[start..end].to_vec())?;
        debug!(items = items.len(), "rendering breadcrumb");
        self.render_items(&crumb_config, &items, &root_line, content)
    }

    fn current_root_line(&self, config: &MenuConfiguration) -> Result<Vec<PageNode>, MenuError> {
        let current = self.provider.current_page_id();
        Ok(self
            .provider
            .root_line(current, false, config.show_access_protected)?)
    }

    /// Explicit page, else the root-line page at the entry level, else the
    /// current page.
    fn start_page(&self, config: &MenuConfiguration, root_line: &[PageNode]) -> PageId {
        config
            .page_uid
            .or_else(|| root_line.get(config.entry_level).map(|node| node.id))
            .unwrap_or_else(|| self.provider.current_page_id())
    }

    fn render_items<F>(
        &self,
        config: &MenuConfiguration,
        items: &[ClassifiedItem],
        root_line: &[PageNode],
        content: F,
    ) -> Result<String, MenuError>
    where
        F: FnOnce(&Self) -> Result<String, MenuError>,
    {
        let parent = ParentState {
            config: config.clone(),
            variables: self.variables.snapshot(),
        };
        let _parent = self.store.scoped(
            MENU_NAMESPACE,
            PARENT_KEY,
            SideChannelValue::Parent(Box::new(parent)),
        );

        let items_value = serde_json::to_value(items)?;
        let mut scope = self.variables.scope();
        scope.bind(&config.menu_variable, items_value.clone());
        scope.bind(&config.root_line_variable, serde_json::to_value(root_line)?);

        let renderer = TreeRenderer::new(self.provider, config);
        if config.deferred {
            let markup = renderer.render(items)?.into_string();
            let _markup = self.store.scoped(
                MENU_NAMESPACE,
                DEFERRED_MARKUP_KEY,
                SideChannelValue::Markup(markup),
            );
            let _items = self.store.scoped(
                MENU_NAMESPACE,
                DEFERRED_ITEMS_KEY,
                SideChannelValue::Data(items_value),
            );
            return content(self);
        }

        if items.is_empty() {
            trace!("menu has no items, skipping content");
            return Ok(String::new());
        }
        let output = content(self)?;
        if !output.trim().is_empty() {
            return Ok(output);
        }
        Ok(renderer.render(items)?.into_string())
    }
}
