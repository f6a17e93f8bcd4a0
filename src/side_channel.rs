//! Request-scoped state shared between menu invocations.
//!
//! Two stores live here, both owned by the request and passed explicitly:
//!
//! - [`SideChannelStore`]: namespaced key/value slots. A menu publishes its
//!   configuration for submenus rendered from its content, and in deferred
//!   mode publishes its markup and item data for a later consumer.
//! - [`Variables`]: the variable bindings template content sees. A menu
//!   binds its item list and root line for the duration of its content.
//!
//! Both hand out guards ([`Publication`], [`VariableScope`]) that undo their
//! changes on drop, so entries and bindings are released on every exit path:
//! normal return, `?` propagation, and unwinding. Guards restore what was
//! there before rather than blindly removing, which keeps nested menus
//! (a submenu publishing under its parent's key) strictly stack-like.
//!
//! Single-threaded by construction (`RefCell`); each request gets its own.

use crate::config::MenuConfiguration;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

/// Namespace used by the menu components.
pub const MENU_NAMESPACE: &str = "navmenu";
/// Key of the enclosing menu's state, read by submenus.
pub const PARENT_KEY: &str = "parent";
/// Key of the deferred markup.
pub const DEFERRED_MARKUP_KEY: &str = "deferred-markup";
/// Key of the deferred item array.
pub const DEFERRED_ITEMS_KEY: &str = "deferred-items";

/// State a menu hands to submenus rendered from its content.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentState {
    pub config: MenuConfiguration,
    /// Variable bindings in effect when the parent started rendering.
    pub variables: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SideChannelValue {
    Parent(Box<ParentState>),
    Markup(String),
    Data(Value),
}

type SlotKey = (String, String);

fn slot(namespace: &str, key: &str) -> SlotKey {
    (namespace.to_string(), key.to_string())
}

#[derive(Debug, Default)]
pub struct SideChannelStore {
    entries: RefCell<HashMap<SlotKey, SideChannelValue>>,
}

impl SideChannelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, returning whatever occupied the slot before.
    pub fn publish(
        &self,
        namespace: &str,
        key: &str,
        value: SideChannelValue,
    ) -> Option<SideChannelValue> {
        self.entries.borrow_mut().insert(slot(namespace, key), value)
    }

    /// Read a value. Absence is a normal outcome, not an error.
    pub fn read(&self, namespace: &str, key: &str) -> Option<SideChannelValue> {
        self.entries.borrow().get(&slot(namespace, key)).cloned()
    }

    pub fn remove(&self, namespace: &str, key: &str) -> Option<SideChannelValue> {
        self.entries.borrow_mut().remove(&slot(namespace, key))
    }

    pub fn contains(&self, namespace: &str, key: &str) -> bool {
        self.entries.borrow().contains_key(&slot(namespace, key))
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Publish for the lifetime of the returned guard.
    pub fn scoped(&self, namespace: &str, key: &str, value: SideChannelValue) -> Publication<'_> {
        let previous = self.publish(namespace, key, value);
        Publication {
            store: self,
            namespace: namespace.to_string(),
            key: key.to_string(),
            previous,
        }
    }

    pub fn parent(&self) -> Option<ParentState> {
        match self.read(MENU_NAMESPACE, PARENT_KEY)? {
            SideChannelValue::Parent(state) => Some(*state),
            _ => None,
        }
    }

    pub fn deferred_markup(&self) -> Option<String> {
        match self.read(MENU_NAMESPACE, DEFERRED_MARKUP_KEY)? {
            SideChannelValue::Markup(markup) => Some(markup),
            _ => None,
        }
    }

    pub fn deferred_items(&self) -> Option<Value> {
        match self.read(MENU_NAMESPACE, DEFERRED_ITEMS_KEY)? {
            SideChannelValue::Data(data) => Some(data),
            _ => None,
        }
    }
}

/// Guard for a scoped publication; restores the previous slot content on drop.
#[must_use = "the entry is withdrawn as soon as the guard is dropped"]
pub struct Publication<'a> {
    store: &'a SideChannelStore,
    namespace: String,
    key: String,
    previous: Option<SideChannelValue>,
}

impl Drop for Publication<'_> {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(previous) => {
                self.store.publish(&self.namespace, &self.key, previous);
            }
            None => {
                self.store.remove(&self.namespace, &self.key);
            }
        }
    }
}

/// Variable bindings visible to template content.
#[derive(Debug, Default)]
pub struct Variables {
    bindings: RefCell<BTreeMap<String, Value>>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.borrow().get(name).cloned()
    }

    /// Unscoped assignment, for the host's own variables.
    pub fn set(&self, name: &str, value: Value) {
        self.bindings.borrow_mut().insert(name.to_string(), value);
    }

    pub fn snapshot(&self) -> BTreeMap<String, Value> {
        self.bindings.borrow().clone()
    }

    /// Open a new frame. Bindings made through it are undone when it drops.
    pub fn scope(&self) -> VariableScope<'_> {
        VariableScope {
            variables: self,
            saved: Vec::new(),
        }
    }
}

/// One frame of the variable environment stack.
#[must_use = "bindings are restored as soon as the scope is dropped"]
pub struct VariableScope<'a> {
    variables: &'a Variables,
    saved: Vec<(String, Option<Value>)>,
}

impl VariableScope<'_> {
    /// Bind `name`, backing up the enclosing value the first time it is touched.
    pub fn bind(&mut self, name: &str, value: Value) {
        let previous = self
            .variables
            .bindings
            .borrow_mut()
            .insert(name.to_string(), value);
        if !self.saved.iter().any(|(saved, _)| saved == name) {
            self.saved.push((name.to_string(), previous));
        }
    }

    pub fn bind_all(&mut self, bindings: &BTreeMap<String, Value>) {
        for (name, value) in bindings {
            self.bind(name, value.clone());
        }
    }
}

impl Drop for VariableScope<'_> {
    fn drop(&mut self) {
        let mut bindings = self.variables.bindings.borrow_mut();
        for (name, previous) in self.saved.drain(..).rev() {
            match previous {
                Some(value) => {
                    bindings.insert(name, value);
                }
                None => {
                    bindings.remove(&name);
                }
            }
        }
    }
}
