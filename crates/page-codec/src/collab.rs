//! Collaborators the codec talks to but does not implement.
//!
//! Fetching bytes, remembering visited links, running simulation models,
//! hosting widgets and producing model state are all behind traits so the
//! codec can run headless (CLI, tests) or inside an editor.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::io::{BufRead, Cursor};
use std::sync::{Arc, Mutex, RwLock};
use std::time::SystemTime;

use page_model::{ComponentId, Document, LinkKind, Location, ModelKind};
use tracing::{debug, trace};

use crate::error::{CodecError, Result};

// =============================================================================
// RESOURCES
// =============================================================================

/// Fetches raw bytes for a location.
pub trait ResourceFetcher: Send + Sync {
    /// # Errors
    ///
    /// Returns [`CodecError::Fetch`] or [`CodecError::RemoteDisabled`] when the
    /// bytes cannot be produced.
    fn fetch(&self, location: &Location) -> Result<Vec<u8>>;

    /// Last modification time, when the backend knows it.
    fn modified(&self, _location: &Location) -> Option<SystemTime> {
        None
    }

    /// Open a page for streaming. The default buffers the whole fetch.
    ///
    /// # Errors
    ///
    /// Same as [`ResourceFetcher::fetch`].
    fn open(&self, location: &Location) -> Result<Box<dyn BufRead + Send>> {
        Ok(Box::new(Cursor::new(self.fetch(location)?)))
    }
}

/// Reads local files. Remote locations are refused; a network layer wraps
/// this type rather than living inside it.
#[derive(Debug, Clone, Copy, Default)]
pub struct FileFetcher;

impl ResourceFetcher for FileFetcher {
    fn fetch(&self, location: &Location) -> Result<Vec<u8>> {
        match location {
            Location::File(path) => {
                std::fs::read(path).map_err(|error| CodecError::fetch(location, error))
            }
            Location::Url(_) => Err(CodecError::RemoteDisabled {
                location: location.to_string(),
            }),
        }
    }

    fn modified(&self, location: &Location) -> Option<SystemTime> {
        match location {
            Location::File(path) => std::fs::metadata(path).and_then(|meta| meta.modified()).ok(),
            Location::Url(_) => None,
        }
    }

    fn open(&self, location: &Location) -> Result<Box<dyn BufRead + Send>> {
        match location {
            Location::File(path) => {
                let file =
                    std::fs::File::open(path).map_err(|error| CodecError::fetch(location, error))?;
                Ok(Box::new(std::io::BufReader::new(file)))
            }
            Location::Url(_) => Err(CodecError::RemoteDisabled {
                location: location.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    bytes: Arc<[u8]>,
    modified: Option<SystemTime>,
}

/// Memoizes another fetcher, refetching when the source reports a newer
/// modification time.
#[derive(Debug, Default)]
pub struct CachingFetcher<F> {
    inner: F,
    entries: Mutex<HashMap<Location, CacheEntry>>,
    check_updates: bool,
}

impl<F: ResourceFetcher> CachingFetcher<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            entries: Mutex::new(HashMap::new()),
            check_updates: true,
        }
    }

    /// Serve cached bytes without asking the source for a newer version.
    #[must_use]
    pub fn without_update_check(mut self) -> Self {
        self.check_updates = false;
        self
    }

    #[must_use]
    pub fn cached(&self) -> usize {
        self.entries.lock().map_or(0, |entries| entries.len())
    }

    pub fn invalidate(&self, location: &Location) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(location);
        }
    }
}

impl<F: ResourceFetcher> ResourceFetcher for CachingFetcher<F> {
    fn fetch(&self, location: &Location) -> Result<Vec<u8>> {
        let cached = self
            .entries
            .lock()
            .ok()
            .and_then(|entries| entries.get(location).cloned());
        if let Some(entry) = cached {
            let stale = self.check_updates
                && match (entry.modified, self.inner.modified(location)) {
                    (Some(then), Some(now)) => now > then,
                    _ => false,
                };
            if !stale {
                trace!(%location, "cache hit");
                return Ok(entry.bytes.to_vec());
            }
            debug!(%location, "cached copy is out of date");
        }
        let bytes = self.inner.fetch(location)?;
        let entry = CacheEntry {
            bytes: Arc::from(bytes.as_slice()),
            modified: self.inner.modified(location),
        };
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(location.clone(), entry);
        }
        Ok(bytes)
    }

    fn modified(&self, location: &Location) -> Option<SystemTime> {
        self.inner.modified(location)
    }
}

// =============================================================================
// LINK HISTORY
// =============================================================================

/// Tells whether a hyperlink target has been visited.
pub trait LinkHistory: Send + Sync {
    fn is_visited(&self, target: &str) -> bool;
}

/// History that has seen nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHistory;

impl LinkHistory for NoHistory {
    fn is_visited(&self, _target: &str) -> bool {
        false
    }
}

/// In-memory visited set.
#[derive(Debug, Default)]
pub struct VisitedSet {
    visited: RwLock<HashSet<String>>,
}

impl VisitedSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn visit(&self, target: impl Into<String>) {
        if let Ok(mut visited) = self.visited.write() {
            visited.insert(target.into());
        }
    }
}

impl LinkHistory for VisitedSet {
    fn is_visited(&self, target: &str) -> bool {
        self.visited
            .read()
            .is_ok_and(|visited| visited.contains(target))
    }
}

// =============================================================================
// MODELS
// =============================================================================

/// Current state of a model hook, as seen by the control linked to it.
#[derive(Debug, Clone, PartialEq)]
pub enum HookState {
    /// Fire-and-forget action or script entry point.
    Trigger,
    /// Boolean switch.
    Switch(bool),
    /// Numeric property.
    Value(f64),
    /// Named choices.
    Choices(Vec<String>),
    /// Observable data without a pushed value.
    Observe,
}

/// A simulation engine instance owned by a loaded page.
pub trait SimulationModel: Send {
    fn kind(&self) -> ModelKind;

    /// # Errors
    ///
    /// Returns an error when the state bytes cannot be interpreted.
    fn load_state(&mut self, bytes: &[u8]) -> Result<()>;

    /// # Errors
    ///
    /// Returns an error when the state cannot be serialized.
    fn save_state(&self) -> Result<Vec<u8>>;

    fn is_loaded(&self) -> bool;

    /// Resolve a listener hook; `None` when the model has no such hook.
    fn hook(&self, kind: LinkKind, key: &str) -> Option<HookState>;
}

/// Creates models for model-bearing components.
pub trait ModelFactory: Send + Sync {
    fn create(&self, kind: ModelKind) -> Option<Box<dyn SimulationModel>>;
}

/// Models of one page by model index.
pub type LoadedModels = BTreeMap<usize, Box<dyn SimulationModel>>;

/// A model that keeps its state as opaque bytes and exposes no hooks.
///
/// Used when pages are converted or inspected without an engine.
#[derive(Debug, Clone)]
pub struct StoredModel {
    kind: ModelKind,
    state: Option<Vec<u8>>,
}

impl StoredModel {
    #[must_use]
    pub fn new(kind: ModelKind) -> Self {
        Self { kind, state: None }
    }

    #[must_use]
    pub fn state_len(&self) -> usize {
        self.state.as_ref().map_or(0, Vec::len)
    }
}

impl SimulationModel for StoredModel {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn load_state(&mut self, bytes: &[u8]) -> Result<()> {
        self.state = Some(bytes.to_vec());
        Ok(())
    }

    fn save_state(&self) -> Result<Vec<u8>> {
        Ok(self.state.clone().unwrap_or_default())
    }

    fn is_loaded(&self) -> bool {
        self.state.is_some()
    }

    fn hook(&self, _kind: LinkKind, _key: &str) -> Option<HookState> {
        None
    }
}

/// Creates a [`StoredModel`] for every kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoredModelFactory;

impl ModelFactory for StoredModelFactory {
    fn create(&self, kind: ModelKind) -> Option<Box<dyn SimulationModel>> {
        Some(Box::new(StoredModel::new(kind)))
    }
}

/// Supplies model state bytes to the encoder.
pub trait ModelStateSource {
    /// State of model `index`, or `None` when no model is loaded for it.
    ///
    /// # Errors
    ///
    /// Returns an error when the model fails to serialize.
    fn model_state(&self, index: usize, kind: ModelKind) -> Result<Option<Vec<u8>>>;
}

/// No models at all; every model-bearing component is written without state.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoModels;

impl ModelStateSource for NoModels {
    fn model_state(&self, _index: usize, _kind: ModelKind) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }
}

impl ModelStateSource for LoadedModels {
    fn model_state(&self, index: usize, kind: ModelKind) -> Result<Option<Vec<u8>>> {
        match self.get(&index) {
            Some(model) if model.kind() == kind && model.is_loaded() => {
                model.save_state().map(Some)
            }
            Some(model) => {
                debug!(
                    index,
                    expected = kind.label(),
                    found = model.kind().label(),
                    "model kind mismatch"
                );
                Ok(None)
            }
            None => Ok(None),
        }
    }
}

// =============================================================================
// WIDGET HOST
// =============================================================================

/// A listener link resolved against a loaded model.
#[derive(Debug, Clone, PartialEq)]
pub struct WiredLink {
    pub component: ComponentId,
    pub model: usize,
    pub kind: LinkKind,
    pub key: String,
    pub state: HookState,
}

/// The editor side of a load. Lives on the interactive thread only.
pub trait WidgetHost {
    /// Drop every listener of the previous page.
    fn detach_all(&mut self);

    fn attach(&mut self, link: &WiredLink);

    /// The new page is complete and wired.
    fn page_loaded(&mut self, document: Arc<RwLock<Document>>, models: LoadedModels);
}
