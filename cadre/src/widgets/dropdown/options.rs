//! Dropdown configuration.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::factory::{self, Options, OptionsError};

/// Trigger source meaning "the whole document".
pub const DOCUMENT_SOURCE: &str = "document";

/// One trigger: where it listens and how long the transition waits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TriggerSpec {
    /// Source selector. `None` means the handles; `"document"` the document root.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    /// Delay in milliseconds.
    pub delay: u64,
}

impl TriggerSpec {
    pub fn new(delay: u64) -> Self {
        Self {
            selector: None,
            delay,
        }
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay)
    }
}

/// Trigger map: event name -> trigger, per category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Triggers {
    /// Begin expanding.
    pub on: BTreeMap<String, TriggerSpec>,
    /// Begin collapsing. Armed on the handle each time an `on` trigger fires.
    pub off: BTreeMap<String, TriggerSpec>,
    /// Flip the current state.
    pub toggle: BTreeMap<String, TriggerSpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DropdownOptions {
    pub dropdown_handle_selector: String,
    pub dropdown_expander_selector: String,
    pub active_dropdown_class: String,
    /// Cooldown after each transition, in milliseconds. Zero disables it.
    pub throttle_delay: u64,
    pub triggers: Triggers,
}

impl Default for DropdownOptions {
    fn default() -> Self {
        Self {
            dropdown_handle_selector: r#"[data-role="dropdown-handle"]"#.into(),
            dropdown_expander_selector: r#"[data-role="dropdown-content"]"#.into(),
            active_dropdown_class: "is-dropdown-active".into(),
            throttle_delay: 300,
            triggers: Triggers {
                on: BTreeMap::from([("focus".to_string(), TriggerSpec::new(0))]),
                off: BTreeMap::from([("blur".to_string(), TriggerSpec::new(0))]),
                toggle: BTreeMap::from([("click".to_string(), TriggerSpec::new(0))]),
            },
        }
    }
}

impl DropdownOptions {
    /// Typed view of merged widget options.
    pub fn from_options(options: &Options) -> Result<Self, OptionsError> {
        factory::deserialize(super::NAME, options)
    }

    /// Untyped form, suitable for `set_default_options`.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_delay)
    }
}
