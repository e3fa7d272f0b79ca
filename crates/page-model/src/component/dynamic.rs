//! Components constructed by name at run time.
//!
//! Types outside the closed variant set are registered with the decoder's
//! component registry as zero-argument constructors producing a
//! [`DynamicWidget`].

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// A widget type known only by name.
pub trait DynamicWidget: fmt::Debug + Send + Sync {
    /// Called once after construction with the generic properties read from
    /// the page. The default does nothing.
    fn initialize(&mut self, _properties: &BTreeMap<String, String>) {}

    /// Whether the widget can be placed inline in a page.
    fn is_embeddable(&self) -> bool;

    /// Properties written back when the page is saved.
    fn properties(&self) -> BTreeMap<String, String> {
        BTreeMap::new()
    }
}

/// A registry-constructed component.
#[derive(Clone, Serialize, Deserialize)]
pub struct DynamicComponent {
    pub type_name: String,
    /// Generic properties, keyed by leaf tag name.
    pub properties: BTreeMap<String, String>,
    #[serde(skip)]
    pub widget: Option<Arc<dyn DynamicWidget>>,
}

impl DynamicComponent {
    pub fn new(type_name: impl Into<String>, properties: BTreeMap<String, String>) -> Self {
        Self {
            type_name: type_name.into(),
            properties,
            widget: None,
        }
    }

    #[must_use]
    pub fn with_widget(mut self, widget: Arc<dyn DynamicWidget>) -> Self {
        self.widget = Some(widget);
        self
    }

    /// Properties to persist: the live widget's view when there is one.
    #[must_use]
    pub fn current_properties(&self) -> BTreeMap<String, String> {
        match &self.widget {
            Some(widget) => {
                let mut properties = self.properties.clone();
                properties.extend(widget.properties());
                properties
            }
            None => self.properties.clone(),
        }
    }
}

impl fmt::Debug for DynamicComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DynamicComponent")
            .field("type_name", &self.type_name)
            .field("properties", &self.properties)
            .field("live", &self.widget.is_some())
            .finish()
    }
}

impl PartialEq for DynamicComponent {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.properties == other.properties
    }
}
