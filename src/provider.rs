//! Page-data collaborator.
//!
//! The menu core never touches storage, access rules or URL routing itself.
//! Everything it needs to know about pages goes through [`PageDataProvider`],
//! so the rest of the crate is backend-agnostic. The crate ships one
//! implementation, [`StaticPageTree`](crate::static_tree::StaticPageTree),
//! backed by an in-memory page list.

use crate::types::{PageId, PageNode};
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataAccessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Page {0} not found")]
    PageNotFound(PageId),
    #[error("Page data backend failed: {0}")]
    Backend(String),
}

/// Filter applied when fetching the children of a page.
#[derive(Debug, Clone, Copy)]
pub struct ChildQuery<'a> {
    pub exclude: &'a BTreeSet<PageId>,
    pub include_hidden: bool,
    pub include_spacers: bool,
    pub include_access_protected: bool,
}

/// Source of page records and page state for one request.
///
/// Implementations answer relative to the request they were built for:
/// "current" and "active" refer to the page being requested.
pub trait PageDataProvider {
    /// Id of the requested page.
    fn current_page_id(&self) -> PageId;

    /// Path from the site root to `page_id` (root first), or the reverse.
    fn root_line(
        &self,
        page_id: PageId,
        reverse: bool,
        include_access_protected: bool,
    ) -> Result<Vec<PageNode>, DataAccessError>;

    /// Ordered children of `page_id`.
    fn children(
        &self,
        page_id: PageId,
        query: &ChildQuery<'_>,
    ) -> Result<Vec<PageNode>, DataAccessError>;

    /// Children-existence probe.
    ///
    /// Defaults to a full fetch; backends with a cheaper count query should
    /// override it.
    fn has_children(
        &self,
        page_id: PageId,
        query: &ChildQuery<'_>,
    ) -> Result<bool, DataAccessError> {
        Ok(!self.children(page_id, query)?.is_empty())
    }

    /// Whether `page_id` is on the current root line.
    fn is_active(
        &self,
        page_id: PageId,
        include_access_protected: bool,
    ) -> Result<bool, DataAccessError>;

    fn is_current(&self, page_id: PageId) -> bool {
        page_id == self.current_page_id()
    }

    fn is_access_protected(&self, node: &PageNode) -> bool;

    fn is_access_granted(&self, node: &PageNode) -> bool;

    /// Resolve a shortcut page to the page it points to.
    fn shortcut_target(&self, node: &PageNode) -> Result<Option<PageNode>, DataAccessError>;

    fn build_link(&self, node: &PageNode, force_absolute: bool) -> Result<String, DataAccessError>;

    fn is_hidden_for_current_locale(&self, node: &PageNode) -> bool;
}
