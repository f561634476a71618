//! Named addon constructors and loaded addon handles.

use std::any::Any;
use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

use super::WidgetInstance;
use crate::page::Page;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddonError {
    #[error("addon '{0}' is not registered")]
    NotRegistered(String),

    #[error("addon '{name}' failed to attach: {reason}")]
    Attach { name: String, reason: String },
}

impl AddonError {
    pub fn attach(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Attach {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Type-erased addon constructor for widgets of type `W`.
pub type AddonConstructor<W> =
    Rc<dyn Fn(&mut Page, &WidgetInstance<W>) -> Result<Box<dyn Any>, AddonError>>;

/// A loaded addon. Its state is opaque to the factory.
pub struct AddonHandle {
    name: String,
    state: Box<dyn Any>,
}

impl AddonHandle {
    pub fn new(name: impl Into<String>, state: Box<dyn Any>) -> Self {
        Self {
            name: name.into(),
            state,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.state.downcast_ref()
    }
}

impl std::fmt::Debug for AddonHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddonHandle").field("name", &self.name).finish()
    }
}

/// Addon constructors known to a widget type, keyed by name.
pub struct AddonRegistry<W> {
    constructors: BTreeMap<String, AddonConstructor<W>>,
}

impl<W: 'static> AddonRegistry<W> {
    pub fn new() -> Self {
        Self {
            constructors: BTreeMap::new(),
        }
    }

    /// Register (or replace) the constructor for `name`.
    pub fn register<T, F>(&mut self, name: impl Into<String>, constructor: F)
    where
        T: Any,
        F: Fn(&mut Page, &WidgetInstance<W>) -> Result<T, AddonError> + 'static,
    {
        let erased: AddonConstructor<W> =
            Rc::new(move |page: &mut Page, instance: &WidgetInstance<W>| {
                constructor(page, instance).map(|addon| Box::new(addon) as Box<dyn Any>)
            });
        self.constructors.insert(name.into(), erased);
    }

    pub fn get(&self, name: &str) -> Option<AddonConstructor<W>> {
        self.constructors.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }
}

impl<W: 'static> Default for AddonRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}
