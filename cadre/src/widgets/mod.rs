//! Widgets built on the factory.

pub mod dropdown;

pub use dropdown::Dropdown;
