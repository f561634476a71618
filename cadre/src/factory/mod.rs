//! Widget factory.
//!
//! A [`WidgetType`] turns a construction routine (the [`Widget`] impl) into
//! per-root singleton instances:
//! - At most one instance per (type, root); constructing again returns it.
//! - Options are the type defaults overlaid with the root's data attributes.
//! - Addons listed in the `addons` option are loaded after construction.
//! - The `<name>Init` event fires on the root, and listeners attached later
//!   for it still run once.

mod addon;
mod options;
mod render;

pub use addon::{AddonConstructor, AddonError, AddonHandle, AddonRegistry};
pub use options::{
    as_object, camel_case, deserialize, extend, from_data_attributes, parse_data_value, Options,
    OptionsError,
};
pub use render::{
    error_placeholder, interpolate, Fragment, MicroTemplate, Renderers, TemplateRenderer,
    DEFAULT_TEMPLATE_LANGUAGE, RENDER_ERROR_TEXT, TEMPLATE_LANGUAGE_KEY,
};

use std::any::Any;
use std::cell::{Cell, Ref, RefCell};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::rc::{Rc, Weak};

use serde_json::Value;
use stagedom::NodeId;

use crate::page::{Page, PageId, SpecialHook};

/// Options key listing addons to load, separated by whitespace.
pub const ADDONS_KEY: &str = "addons";

/// A behavior attached to one root element.
pub trait Widget: Sized + 'static {
    /// Construction routine. Runs once per root, after options are merged
    /// and before the marker class, addons and init event.
    fn construct(page: &mut Page, cx: &InstanceContext) -> Self;
}

/// What a widget's construction routine knows about its instance.
#[derive(Debug, Clone)]
pub struct InstanceContext {
    widget: String,
    index: u64,
    root: NodeId,
    options: Options,
}

impl InstanceContext {
    /// Lowercase name of the widget type.
    pub fn widget(&self) -> &str {
        &self.widget
    }

    /// Instance index, unique within the widget type. Starts at 1.
    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Merged options.
    pub fn options(&self) -> &Options {
        &self.options
    }
}

/// A constructed widget bound to its root.
pub struct WidgetInstance<W> {
    cx: InstanceContext,
    widget: W,
    addons: RefCell<Vec<AddonHandle>>,
    registry: Rc<RefCell<AddonRegistry<W>>>,
}

impl<W: Widget> WidgetInstance<W> {
    pub fn context(&self) -> &InstanceContext {
        &self.cx
    }

    pub fn index(&self) -> u64 {
        self.cx.index
    }

    pub fn root(&self) -> NodeId {
        self.cx.root
    }

    pub fn options(&self) -> &Options {
        &self.cx.options
    }

    pub fn widget(&self) -> &W {
        &self.widget
    }

    /// Names of loaded addons, in load order.
    pub fn addons(&self) -> Vec<String> {
        self.addons
            .borrow()
            .iter()
            .map(|a| a.name().to_string())
            .collect()
    }

    pub fn has_addon(&self, name: &str) -> bool {
        self.addons.borrow().iter().any(|a| a.name() == name)
    }

    /// Borrow a loaded addon's state.
    pub fn addon<T: Any>(&self, name: &str) -> Option<Ref<'_, T>> {
        Ref::filter_map(self.addons.borrow(), |addons| {
            addons
                .iter()
                .find(|a| a.name() == name)
                .and_then(|a| a.downcast_ref::<T>())
        })
        .ok()
    }

    /// Load the addon registered as `name`.
    ///
    /// Loading an addon that is already loaded succeeds without running its
    /// constructor again.
    pub fn try_load_addon(&self, page: &mut Page, name: &str) -> Result<(), AddonError> {
        if self.has_addon(name) {
            return Ok(());
        }

        let constructor = self
            .registry
            .borrow()
            .get(name)
            .ok_or_else(|| AddonError::NotRegistered(name.to_string()))?;
        let state = constructor(page, self)?;

        self.addons.borrow_mut().push(AddonHandle::new(name, state));
        log::debug!("[factory] {} #{} loaded addon '{}'", self.cx.widget, self.cx.index, name);
        Ok(())
    }

    /// Best-effort [`try_load_addon`](Self::try_load_addon).
    ///
    /// Failures leave the instance's addons untouched and are not reported
    /// to the caller. A missing or broken addon never stops a widget.
    pub fn load_addon(&self, page: &mut Page, name: &str) {
        if let Err(err) = self.try_load_addon(page, name) {
            log::debug!("[factory] {} #{}: {}", self.cx.widget, self.cx.index, err);
        }
    }

    /// Render `template` with the page's strategies.
    pub fn render(&self, page: &Page, template: NodeId, view: &Value) -> Fragment {
        page.renderers().render(page.document(), template, view)
    }
}

impl<W> std::fmt::Debug for WidgetInstance<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetInstance")
            .field("cx", &self.cx)
            .field("addons", &self.addons.borrow())
            .finish()
    }
}

struct TypeInner<W> {
    name: String,
    init_event: String,
    marker_class: String,
    defaults: RefCell<Options>,
    counter: Cell<u64>,
    roots: RefCell<HashMap<(PageId, NodeId), u64>>,
    hooked: RefCell<HashSet<PageId>>,
    instances: RefCell<BTreeMap<u64, Rc<WidgetInstance<W>>>>,
    addons: Rc<RefCell<AddonRegistry<W>>>,
}

/// A widget type: the equivalent of a constructor function.
///
/// Cheap to clone; clones share defaults, registry and addons. The registry
/// lives as long as the type does.
pub struct WidgetType<W> {
    inner: Rc<TypeInner<W>>,
}

impl<W> Clone for WidgetType<W> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<W: Widget> WidgetType<W> {
    /// Define a widget type. The name is lowercased.
    pub fn define(name: &str) -> Self {
        let name = name.to_lowercase();
        Self {
            inner: Rc::new(TypeInner {
                init_event: format!("{name}Init"),
                marker_class: format!("is-{name}-instantiated"),
                name,
                defaults: RefCell::new(Options::new()),
                counter: Cell::new(0),
                roots: RefCell::new(HashMap::new()),
                hooked: RefCell::new(HashSet::new()),
                instances: RefCell::new(BTreeMap::new()),
                addons: Rc::new(RefCell::new(AddonRegistry::new())),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Event fired on a root once its instance is ready.
    pub fn init_event(&self) -> &str {
        &self.inner.init_event
    }

    /// Class added to every root carrying an instance.
    pub fn marker_class(&self) -> &str {
        &self.inner.marker_class
    }

    pub fn default_options(&self) -> Options {
        self.inner.defaults.borrow().clone()
    }

    /// Shallow-merge `options` into the type defaults.
    ///
    /// Keys are added or replaced, never removed. Non-object values are
    /// ignored.
    pub fn set_default_options(&self, options: Value) {
        match as_object(&self.inner.name, options) {
            Ok(options) => extend(&mut self.inner.defaults.borrow_mut(), &options),
            Err(err) => log::warn!("[factory] {}", err),
        }
    }

    /// Register an addon constructor under `name`.
    pub fn register_addon<T, F>(&self, name: impl Into<String>, constructor: F)
    where
        T: Any,
        F: Fn(&mut Page, &WidgetInstance<W>) -> Result<T, AddonError> + 'static,
    {
        self.inner.addons.borrow_mut().register(name, constructor);
    }

    pub fn has_addon(&self, name: &str) -> bool {
        self.inner.addons.borrow().contains(name)
    }

    /// Existing instance on `root`, if any.
    pub fn instance_for(&self, page: &Page, root: NodeId) -> Option<Rc<WidgetInstance<W>>> {
        let index = *self.inner.roots.borrow().get(&(page.id(), root))?;
        self.inner.instances.borrow().get(&index).cloned()
    }

    pub fn instance_count(&self) -> usize {
        self.inner.instances.borrow().len()
    }

    /// Options a new instance on `root` would receive.
    pub fn merged_options(&self, page: &Page, root: NodeId) -> Options {
        let mut options = self.default_options();
        if let Some(data) = page.document().data_map(root) {
            extend(&mut options, &from_data_attributes(data));
        }
        options
    }

    /// Construct an instance on `root`, or return the one already there.
    pub fn construct(&self, page: &mut Page, root: NodeId) -> Rc<WidgetInstance<W>> {
        if let Some(existing) = self.instance_for(page, root) {
            log::trace!(
                "[factory] {} already on {} as #{}",
                self.inner.name,
                root,
                existing.index()
            );
            return existing;
        }

        self.install_init_hook(page);

        let index = self.inner.counter.get() + 1;
        self.inner.counter.set(index);
        self.inner.roots.borrow_mut().insert((page.id(), root), index);

        let cx = InstanceContext {
            widget: self.inner.name.clone(),
            index,
            root,
            options: self.merged_options(page, root),
        };
        let widget = W::construct(page, &cx);
        let instance = Rc::new(WidgetInstance {
            cx,
            widget,
            addons: RefCell::new(Vec::new()),
            registry: Rc::clone(&self.inner.addons),
        });
        self.inner
            .instances
            .borrow_mut()
            .insert(index, Rc::clone(&instance));

        page.document_mut().add_class(root, &self.inner.marker_class);

        let addons: Vec<String> = instance
            .options()
            .get(ADDONS_KEY)
            .and_then(Value::as_str)
            .map(|list| list.split_whitespace().map(String::from).collect())
            .unwrap_or_default();
        for name in &addons {
            instance.load_addon(page, name);
        }

        log::debug!(
            "[factory] constructed {} #{} on {}",
            self.inner.name,
            index,
            root
        );
        page.trigger(root, &self.inner.init_event);

        instance
    }

    /// Make `<name>Init` retroactive on `page` for this type's roots.
    ///
    /// Every type installs its own hook, so types sharing a name each answer
    /// for their roots. The hook goes stale when the type is dropped.
    fn install_init_hook(&self, page: &mut Page) {
        if !self.inner.hooked.borrow_mut().insert(page.id()) {
            return;
        }
        let weak: Weak<TypeInner<W>> = Rc::downgrade(&self.inner);
        let hook: SpecialHook = Rc::new(move |page: &Page, node: NodeId| {
            let inner = weak.upgrade()?;
            let reached = inner.roots.borrow().contains_key(&(page.id(), node));
            Some(reached)
        });
        page.register_special(self.inner.init_event.clone(), hook);
    }
}

impl<W> std::fmt::Debug for WidgetType<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetType")
            .field("name", &self.inner.name)
            .field("instances", &self.inner.instances.borrow().len())
            .finish()
    }
}
