//! Per-root widget instantiation plus a timed dropdown controller, on top of
//! the headless `stagedom` document.

pub mod factory;
pub mod page;
pub mod widgets;

pub use stagedom;

pub use factory::{Widget, WidgetInstance, WidgetType};
pub use page::Page;

pub mod prelude {
    pub use crate::factory::{
        AddonError, InstanceContext, Options, Renderers, TemplateRenderer, Widget, WidgetInstance,
        WidgetType,
    };
    pub use crate::page::{Page, Retain, TimerId};
    pub use crate::widgets::dropdown::{Dropdown, DropdownOptions, PairPhase, TriggerSpec};

    pub use stagedom::{Element, Event, NodeId};
}
