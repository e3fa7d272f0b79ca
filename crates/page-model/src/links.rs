//! Pending listener links between components and models.
//!
//! Links are recorded while a page is decoded and consumed, read-only, once
//! every model has finished loading.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::component::{ComponentId, LinkRequest};

/// How a component hooks into its model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkKind {
    /// Fires a named model action.
    Action,
    /// Mirrors a boolean model switch.
    Switch,
    /// Drives a numeric model property.
    Property,
    /// Selects among named model choices.
    Choice,
    /// Observes a time series or scalar data source.
    DataSource,
    /// Observes model state without a specific key.
    Observer,
    /// Runs script text through the model's script engine.
    Script,
}

impl LinkKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::Switch => "switch",
            Self::Property => "property",
            Self::Choice => "choice",
            Self::DataSource => "data source",
            Self::Observer => "observer",
            Self::Script => "script",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLink {
    pub component: ComponentId,
    pub kind: LinkKind,
    pub key: String,
}

/// Model index to the links waiting on that model.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListenerLinks {
    pending: BTreeMap<usize, Vec<PendingLink>>,
}

impl ListenerLinks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, component: ComponentId, request: LinkRequest) {
        self.pending
            .entry(request.model)
            .or_default()
            .push(PendingLink {
                component,
                kind: request.kind,
                key: request.key,
            });
    }

    #[must_use]
    pub fn for_model(&self, model: usize) -> &[PendingLink] {
        self.pending.get(&model).map_or(&[], Vec::as_slice)
    }

    pub fn models(&self) -> impl Iterator<Item = usize> + '_ {
        self.pending.keys().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.pending.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Rewrite component ids through `remap`, dropping links whose component
    /// maps to `None` or lies outside the table.
    pub fn remap_components(&mut self, remap: &[Option<ComponentId>]) {
        for links in self.pending.values_mut() {
            links.retain_mut(|link| match remap.get(link.component.0).copied().flatten() {
                Some(id) => {
                    link.component = id;
                    true
                }
                None => false,
            });
        }
        self.pending.retain(|_, links| !links.is_empty());
    }

    /// Consume the map in model order.
    pub fn drain(&mut self) -> impl Iterator<Item = (usize, Vec<PendingLink>)> {
        std::mem::take(&mut self.pending).into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_group_by_model() {
        let mut links = ListenerLinks::new();
        links.register(
            ComponentId(0),
            LinkRequest {
                model: 3,
                kind: LinkKind::Property,
                key: "temperature".into(),
            },
        );
        links.register(
            ComponentId(4),
            LinkRequest {
                model: 3,
                kind: LinkKind::Action,
                key: "run".into(),
            },
        );
        links.register(
            ComponentId(5),
            LinkRequest {
                model: 0,
                kind: LinkKind::Switch,
                key: "show-velocity".into(),
            },
        );
        assert_eq!(links.len(), 3);
        assert_eq!(links.for_model(3).len(), 2);
        assert!(links.for_model(7).is_empty());
        let order: Vec<_> = links.drain().map(|(model, _)| model).collect();
        assert_eq!(order, vec![0, 3]);
        assert!(links.is_empty());
    }

    #[test]
    fn remapping_drops_links_of_removed_components() {
        let mut links = ListenerLinks::new();
        for (component, model) in [(0, 0), (1, 1), (2, 1)] {
            links.register(
                ComponentId(component),
                LinkRequest {
                    model,
                    kind: LinkKind::Property,
                    key: format!("p{component}"),
                },
            );
        }
        links.remap_components(&[Some(ComponentId(0)), None, Some(ComponentId(1))]);
        assert_eq!(links.len(), 2);
        assert_eq!(links.for_model(1)[0].component, ComponentId(1));
        assert_eq!(links.for_model(1)[0].key, "p2");

        links.remap_components(&[None]);
        assert!(links.is_empty());
        assert_eq!(links.models().count(), 0);
    }
}
