//! Widget host for loads that run without an editor.

use std::fmt;
use std::sync::{Arc, RwLock};

use page_codec::{LoadedModels, WidgetHost, WiredLink};
use page_model::Document;
use tracing::debug;

/// Keeps what a load delivers so it can be inspected or saved again.
#[derive(Default)]
pub struct HeadlessHost {
    document: Option<Arc<RwLock<Document>>>,
    models: LoadedModels,
    links: Vec<WiredLink>,
    pages_loaded: usize,
}

impl HeadlessHost {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The last delivered page.
    #[must_use]
    pub fn document(&self) -> Option<Arc<RwLock<Document>>> {
        self.document.clone()
    }

    #[must_use]
    pub fn models(&self) -> &LoadedModels {
        &self.models
    }

    /// Links attached for the current page.
    #[must_use]
    pub fn links(&self) -> &[WiredLink] {
        &self.links
    }

    #[must_use]
    pub fn pages_loaded(&self) -> usize {
        self.pages_loaded
    }
}

impl fmt::Debug for HeadlessHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HeadlessHost")
            .field("has_document", &self.document.is_some())
            .field("models", &self.models.len())
            .field("links", &self.links.len())
            .field("pages_loaded", &self.pages_loaded)
            .finish()
    }
}

impl WidgetHost for HeadlessHost {
    fn detach_all(&mut self) {
        self.links.clear();
    }

    fn attach(&mut self, link: &WiredLink) {
        debug!(model = link.model, key = %link.key, "link attached");
        self.links.push(link.clone());
    }

    fn page_loaded(&mut self, document: Arc<RwLock<Document>>, models: LoadedModels) {
        self.document = Some(document);
        self.models = models;
        self.pages_loaded += 1;
    }
}
