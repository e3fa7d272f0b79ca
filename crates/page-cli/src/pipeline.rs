//! Load and save steps shared by the commands.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use page_codec::{
    CachingFetcher, CancelToken, Decoder, EncodeReport, Encoder, FileFetcher, InteractiveQueue,
    LoadReport, PageConfig, PageLoader, StoredModelFactory,
};
use page_model::{Document, Location};
use tracing::{info, info_span};

use crate::headless::HeadlessHost;
use crate::logging::redact_text;

/// A page loaded into a [`HeadlessHost`].
#[derive(Debug)]
pub struct LoadedPage {
    pub path: PathBuf,
    pub report: LoadReport,
    pub host: HeadlessHost,
}

impl LoadedPage {
    /// Run `f` on the loaded document.
    ///
    /// # Errors
    ///
    /// Fails if the host never received the page.
    pub fn with_document<R>(&self, f: impl FnOnce(&Document) -> R) -> Result<R> {
        let document = self
            .host
            .document()
            .ok_or_else(|| anyhow!("{} was not delivered", self.path.display()))?;
        let guard = document
            .read()
            .map_err(|_| anyhow!("document lock poisoned"))?;
        Ok(f(&guard))
    }
}

/// Shape of a loaded document, for display.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSummary {
    pub title: Option<String>,
    pub characters: usize,
    pub paragraphs: usize,
    pub icons: usize,
    pub models: usize,
    /// Component count per wire type name.
    pub components: BTreeMap<String, usize>,
}

impl PageSummary {
    #[must_use]
    pub fn of(document: &Document) -> Self {
        let mut components = BTreeMap::new();
        for (_, component) in document.components() {
            *components
                .entry(component.type_name().to_string())
                .or_insert(0) += 1;
        }
        Self {
            title: document.properties.title.clone(),
            characters: document.len_chars(),
            paragraphs: document.paragraphs.len(),
            icons: document
                .runs()
                .filter(|run| run.attributes.icon().is_some())
                .count(),
            models: document.model_count(),
            components,
        }
    }
}

/// Load the configuration file, or the defaults when none is given.
///
/// # Errors
///
/// Fails when the file cannot be read or parsed.
pub fn load_config(path: Option<&Path>) -> Result<PageConfig> {
    match path {
        Some(path) => PageConfig::from_json_file(path)
            .with_context(|| format!("read configuration {}", path.display())),
        None => Ok(PageConfig::default()),
    }
}

/// A progress bar fed by decoder updates; hidden when `visible` is false.
#[must_use]
pub fn progress_bar(visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }
    let bar = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg:<14} [{bar:30}] {pos:>3}%") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

/// Decode, fetch and wire the page at `path` on the calling thread.
///
/// # Errors
///
/// Fails when the page cannot be read.
pub fn load_page(path: &Path, config: &PageConfig, bar: &ProgressBar) -> Result<LoadedPage> {
    let span = info_span!("load", page = %path.display());
    let _guard = span.enter();

    let mut decoder = Decoder::new(config.decoder.clone());
    let progress = bar.clone();
    decoder.on_progress(move |update| {
        progress.set_position(u64::from(update.percent));
        progress.set_message(update.message);
    });
    let fetcher = CachingFetcher::new(FileFetcher);
    let mut queue = InteractiveQueue::new(HeadlessHost::new());
    let location = Location::File(path.to_path_buf());
    let result = PageLoader::load_blocking(
        &mut queue,
        &mut decoder,
        &location,
        &fetcher,
        &StoredModelFactory,
        &CancelToken::new(),
    );
    bar.finish_and_clear();
    let report = result.with_context(|| format!("load {}", path.display()))?;

    let loaded = LoadedPage {
        path: path.to_path_buf(),
        report,
        host: queue.into_host(),
    };
    loaded.with_document(|document| {
        info!(
            title = redact_text(document.properties.title.as_deref().unwrap_or("")),
            paragraphs = document.paragraphs.len(),
            components = document.components.len(),
            "page loaded"
        );
    })?;
    Ok(loaded)
}

/// Load `source` and write it to `output` with its resources and model state.
///
/// # Errors
///
/// Fails when either page file cannot be read or written.
pub fn convert_page(
    source: &Path,
    output: &Path,
    config: &PageConfig,
    bar: &ProgressBar,
) -> Result<(LoadedPage, EncodeReport)> {
    let loaded = load_page(source, config, bar)?;
    let document = loaded
        .host
        .document()
        .ok_or_else(|| anyhow!("{} was not delivered", source.display()))?;
    let report = Encoder::new(config.encoder.clone())
        .write_locked(&document, loaded.host.models(), output)
        .with_context(|| format!("write {}", output.display()))?;
    Ok((loaded, report))
}
