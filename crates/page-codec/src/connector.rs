//! Listener wiring.
//!
//! Links recorded during decoding are resolved only here, on the interactive
//! thread, after every model of the page has been created and its state
//! loaded. A control that appears before its model in the page is therefore
//! wired exactly like one that appears after it.

use std::sync::{Arc, RwLock};

use page_model::{Component, Document, LinkKind, ListenerLinks, PendingLink};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::collab::{HookState, LoadedModels, WidgetHost, WiredLink};
use crate::interactive::UiThread;

/// A link that found no model or no matching hook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedLink {
    pub model: usize,
    pub link: PendingLink,
    pub reason: UnresolvedReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    /// No model with that index exists on the page.
    NoModel,
    /// The model has no hook of that kind and key.
    NoHook,
}

/// What wiring did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WiringReport {
    pub attached: usize,
    /// Toggles whose selection was taken from a model switch.
    pub switched: usize,
    pub unresolved: Vec<UnresolvedLink>,
}

/// Resolve every pending link of a page and hand the page to `host`.
///
/// The host's previous listeners are detached first. Returns the shared
/// document handed to the host together with what was wired.
pub fn wire<H: WidgetHost + ?Sized>(
    _ui: &UiThread,
    host: &mut H,
    mut document: Document,
    mut links: ListenerLinks,
    models: LoadedModels,
) -> (Arc<RwLock<Document>>, WiringReport) {
    let span = info_span!("wire", links = links.len(), models = models.len());
    let _guard = span.enter();
    let mut report = WiringReport::default();

    host.detach_all();
    for (model_index, pending) in links.drain() {
        let Some(model) = models.get(&model_index) else {
            for link in pending {
                warn!(model = model_index, component = link.component.0, "link to missing model");
                report.unresolved.push(UnresolvedLink {
                    model: model_index,
                    link,
                    reason: UnresolvedReason::NoModel,
                });
            }
            continue;
        };
        for link in pending {
            let Some(state) = model.hook(link.kind, &link.key) else {
                warn!(
                    model = model_index,
                    kind = link.kind.label(),
                    key = %link.key,
                    "model has no such hook"
                );
                report.unresolved.push(UnresolvedLink {
                    model: model_index,
                    link,
                    reason: UnresolvedReason::NoHook,
                });
                continue;
            };
            if link.kind == LinkKind::Switch
                && let HookState::Switch(on) = &state
                && apply_switch(&mut document, &link, *on)
            {
                report.switched += 1;
            }
            let wired = WiredLink {
                component: link.component,
                model: model_index,
                kind: link.kind,
                key: link.key,
                state,
            };
            debug!(component = wired.component.0, model = model_index, kind = wired.kind.label(), "link attached");
            host.attach(&wired);
            report.attached += 1;
        }
    }

    let shared = Arc::new(RwLock::new(document));
    host.page_loaded(Arc::clone(&shared), models);
    info!(
        attached = report.attached,
        unresolved = report.unresolved.len(),
        "page wired"
    );
    (shared, report)
}

fn apply_switch(document: &mut Document, link: &PendingLink, on: bool) -> bool {
    match document.component_mut(link.component) {
        Some(Component::CheckBox(spec) | Component::RadioButton(spec)) => {
            spec.selected = Some(on);
            true
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use page_model::component::{LinkRequest, ToggleSpec};
    use page_model::{AttributeBag, ModelBinding, ModelKind};

    use super::*;
    use crate::collab::SimulationModel;
    use crate::error::Result;
    use crate::interactive::InteractiveQueue;

    struct Heater;

    impl SimulationModel for Heater {
        fn kind(&self) -> ModelKind {
            ModelKind::Atomic
        }

        fn load_state(&mut self, _bytes: &[u8]) -> Result<()> {
            Ok(())
        }

        fn save_state(&self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }

        fn is_loaded(&self) -> bool {
            true
        }

        fn hook(&self, kind: LinkKind, key: &str) -> Option<HookState> {
            (kind == LinkKind::Switch && key == "heater").then_some(HookState::Switch(true))
        }
    }

    #[derive(Default)]
    struct Recorder {
        detached: usize,
        attached: Vec<WiredLink>,
        loaded: bool,
    }

    impl WidgetHost for Recorder {
        fn detach_all(&mut self) {
            self.detached += 1;
        }

        fn attach(&mut self, link: &WiredLink) {
            self.attached.push(link.clone());
        }

        fn page_loaded(&mut self, _document: Arc<RwLock<Document>>, _models: LoadedModels) {
            self.loaded = true;
        }
    }

    fn toggle(switch: &str) -> Component {
        Component::CheckBox(ToggleSpec {
            switch: Some(switch.to_string()),
            binding: ModelBinding::to(0),
            ..ToggleSpec::default()
        })
    }

    #[test]
    fn switch_state_selects_the_toggle() {
        let mut builder = Document::builder();
        let id = builder.push_component(toggle("heater"), AttributeBag::new());
        let document = builder.build();
        let mut links = ListenerLinks::new();
        links.register(
            id,
            LinkRequest {
                model: 0,
                kind: LinkKind::Switch,
                key: "heater".into(),
            },
        );
        let mut models = LoadedModels::new();
        models.insert(0, Box::new(Heater));

        let mut queue = InteractiveQueue::new(Recorder::default());
        let (shared, report) = wire_on_queue(&mut queue, document, links, models);

        assert_eq!(report.attached, 1);
        assert_eq!(report.switched, 1);
        let recorder = queue.host();
        assert_eq!(recorder.detached, 1);
        assert!(recorder.loaded);
        assert_eq!(recorder.attached[0].state, HookState::Switch(true));
        let document = shared.read().unwrap();
        assert!(matches!(
            document.component(id),
            Some(Component::CheckBox(ToggleSpec { selected: Some(true), .. }))
        ));
    }

    #[test]
    fn missing_models_and_hooks_are_reported() {
        let mut builder = Document::builder();
        let id = builder.push_component(toggle("cooler"), AttributeBag::new());
        let document = builder.build();
        let mut links = ListenerLinks::new();
        for model in [0, 7] {
            links.register(
                id,
                LinkRequest {
                    model,
                    kind: LinkKind::Switch,
                    key: "cooler".into(),
                },
            );
        }
        let mut models = LoadedModels::new();
        models.insert(0, Box::new(Heater));

        let mut queue = InteractiveQueue::new(Recorder::default());
        let (_, report) = wire_on_queue(&mut queue, document, links, models);

        assert_eq!(report.attached, 0);
        let reasons: Vec<_> = report.unresolved.iter().map(|link| link.reason).collect();
        assert_eq!(reasons, vec![UnresolvedReason::NoHook, UnresolvedReason::NoModel]);
    }

    /// Runs `wire` the way the loader does, from a posted task.
    fn wire_on_queue(
        queue: &mut InteractiveQueue<Recorder>,
        document: Document,
        links: ListenerLinks,
        models: LoadedModels,
    ) -> (Arc<RwLock<Document>>, WiringReport) {
        let (sender, receiver) = std::sync::mpsc::channel();
        queue
            .handle()
            .post(move |ui, host| {
                let _ = sender.send(wire(ui, host, document, links, models));
            })
            .unwrap();
        assert_eq!(queue.run_pending(), 1);
        receiver.recv().unwrap()
    }
}
