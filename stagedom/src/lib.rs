pub mod element;
pub mod event;
pub mod focus;
pub mod selector;

pub use element::{Content, Document, Element, Node, NodeId};
pub use event::Event;
pub use focus::FocusState;
pub use selector::{Selector, SelectorError};
