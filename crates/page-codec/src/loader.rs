//! Background page loading.
//!
//! A [`PageLoader`] owns two long-lived worker threads. The parser thread
//! decodes one page at a time from a bounded job queue and hands the decoded
//! page to the resource thread, which performs the deferred loads and then
//! posts the wiring step to the interactive queue.
//!
//! ```text
//! load() --sync_channel--> [parser] --channel--> [resources] --UiHandle--> wire()
//!                              \___________ LoadUpdate ___________/
//! ```

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread::{self, JoinHandle};

use page_model::Location;
use serde::Serialize;
use tracing::{debug, error, info, info_span};

use crate::collab::{ModelFactory, ResourceFetcher, WidgetHost};
use crate::config::LoaderConfig;
use crate::connector::{WiringReport, wire};
use crate::decoder::{DecodedPage, Decoder, ParseStats};
use crate::error::{CodecError, Result};
use crate::interactive::{InteractiveQueue, UiHandle, UiThread};
use crate::progress::{CancelToken, Progress};
use crate::resources::{FetchIssue, FetchOutcome, fetch_all};

/// Handle on one requested load.
#[derive(Debug, Clone)]
pub struct LoadTicket {
    id: u64,
    cancel: CancelToken,
}

impl LoadTicket {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stop the load at the next parse event or between two resource fetches.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

/// Summary of a finished load.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub stats: ParseStats,
    pub fetched: usize,
    pub placeholders: usize,
    pub fetch_issues: Vec<FetchIssue>,
    pub wiring: WiringReport,
}

/// Messages sent while a load moves through its stages.
#[derive(Debug)]
pub enum LoadUpdate {
    Progress(Progress),
    /// Parsing finished; resource loading starts.
    Parsed { stats: ParseStats, deferred: usize },
    /// Resources are loaded; wiring has been queued on the interactive thread.
    ResourcesFetched {
        fetched: usize,
        issues: Vec<FetchIssue>,
    },
    Complete(Box<LoadReport>),
    Failed(CodecError),
    Cancelled,
}

impl LoadUpdate {
    /// Whether no further update follows this one.
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Complete(_) | Self::Failed(_) | Self::Cancelled)
    }
}

struct ParseJob {
    location: Location,
    cancel: CancelToken,
    updates: Sender<LoadUpdate>,
}

struct FetchJob {
    page: DecodedPage,
    cancel: CancelToken,
    updates: Sender<LoadUpdate>,
}

/// Loads pages off the interactive thread.
pub struct PageLoader<H> {
    jobs: Option<SyncSender<ParseJob>>,
    parser: Option<JoinHandle<()>>,
    resources: Option<JoinHandle<()>>,
    next_id: AtomicU64,
    config: LoaderConfig,
    _host: PhantomData<fn(H)>,
}

impl<H> fmt::Debug for PageLoader<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageLoader")
            .field("config", &self.config)
            .field("running", &self.jobs.is_some())
            .finish_non_exhaustive()
    }
}

impl<H: WidgetHost + 'static> PageLoader<H> {
    /// Start the worker threads.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Io`] if a thread cannot be spawned.
    pub fn spawn(
        config: LoaderConfig,
        decoder: Decoder,
        fetcher: Arc<dyn ResourceFetcher>,
        factory: Arc<dyn ModelFactory>,
        ui: UiHandle<H>,
    ) -> Result<Self> {
        let (jobs, job_receiver) = mpsc::sync_channel(config.queue_depth.max(1));
        let (fetch_sender, fetch_receiver) = mpsc::channel();

        let resources = {
            let fetcher = Arc::clone(&fetcher);
            thread::Builder::new()
                .name(config.resource_thread.clone())
                .spawn(move || resource_worker(&fetch_receiver, &*fetcher, &*factory, &ui))?
        };
        let parser = thread::Builder::new()
            .name(config.parser_thread.clone())
            .spawn(move || parser_worker(&job_receiver, decoder, &*fetcher, &fetch_sender))?;
        debug!(
            parser = %config.parser_thread,
            resources = %config.resource_thread,
            "page loader started"
        );

        Ok(Self {
            jobs: Some(jobs),
            parser: Some(parser),
            resources: Some(resources),
            next_id: AtomicU64::new(1),
            config,
            _host: PhantomData,
        })
    }

    /// Queue a load. Blocks while the job queue is full.
    ///
    /// Updates for this load arrive on the returned receiver; the last one is
    /// always [`LoadUpdate::Complete`], [`LoadUpdate::Failed`] or
    /// [`LoadUpdate::Cancelled`].
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::WorkerStopped`] if the parser thread has exited.
    pub fn load(&self, location: Location) -> Result<(LoadTicket, Receiver<LoadUpdate>)> {
        let ticket = LoadTicket {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            cancel: CancelToken::new(),
        };
        let (updates, receiver) = mpsc::channel();
        let job = ParseJob {
            location,
            cancel: ticket.cancel.clone(),
            updates,
        };
        let stopped = || CodecError::WorkerStopped {
            worker: self.config.parser_thread.clone(),
        };
        self.jobs
            .as_ref()
            .ok_or_else(stopped)?
            .send(job)
            .map_err(|_| stopped())?;
        debug!(ticket = ticket.id, "load queued");
        Ok((ticket, receiver))
    }

    /// Run every stage inline on the calling thread.
    ///
    /// # Errors
    ///
    /// Returns the first stream-level failure, or [`CodecError::Cancelled`].
    pub fn load_blocking(
        queue: &mut InteractiveQueue<H>,
        decoder: &mut Decoder,
        location: &Location,
        fetcher: &dyn ResourceFetcher,
        factory: &dyn ModelFactory,
        cancel: &CancelToken,
    ) -> Result<LoadReport> {
        decoder.set_cancel(cancel.clone());
        let mut page = decoder.read(location, fetcher)?;
        let outcome = fetch_all(&mut page, fetcher, factory, cancel)?;
        Ok(queue.with_host(|ui, host| finish(ui, host, page, outcome)))
    }
}

impl<H> PageLoader<H> {
    /// Stop accepting loads and wait for both workers to finish their queues.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        self.jobs = None;
        for handle in [self.parser.take(), self.resources.take()].into_iter().flatten() {
            let name = handle.thread().name().unwrap_or("worker").to_string();
            if handle.join().is_err() {
                error!(worker = %name, "worker panicked");
            }
        }
    }
}

impl<H> Drop for PageLoader<H> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Wire a fetched page and summarize the load.
fn finish<H: WidgetHost + ?Sized>(
    ui: &UiThread,
    host: &mut H,
    page: DecodedPage,
    outcome: FetchOutcome,
) -> LoadReport {
    let DecodedPage {
        document,
        links,
        stats,
        ..
    } = page;
    let FetchOutcome {
        models,
        fetched,
        placeholders,
        issues,
        ..
    } = outcome;
    let (_, wiring) = wire(ui, host, document, links, models);
    LoadReport {
        stats,
        fetched,
        placeholders,
        fetch_issues: issues,
        wiring,
    }
}

fn parser_worker(
    jobs: &Receiver<ParseJob>,
    mut decoder: Decoder,
    fetcher: &dyn ResourceFetcher,
    next: &Sender<FetchJob>,
) {
    while let Ok(job) = jobs.recv() {
        let span = info_span!("load", location = %job.location);
        let _guard = span.enter();
        if job.cancel.is_cancelled() {
            let _ = job.updates.send(LoadUpdate::Cancelled);
            continue;
        }
        decoder.set_cancel(job.cancel.clone());
        let progress = job.updates.clone();
        decoder.on_progress(move |update| {
            let _ = progress.send(LoadUpdate::Progress(update));
        });
        let result = decoder.read(&job.location, fetcher);
        decoder.clear_progress();
        match result {
            Ok(page) => {
                let _ = job.updates.send(LoadUpdate::Parsed {
                    stats: page.stats.clone(),
                    deferred: page.deferred.len(),
                });
                let handoff = FetchJob {
                    page,
                    cancel: job.cancel,
                    updates: job.updates,
                };
                if let Err(mpsc::SendError(handoff)) = next.send(handoff) {
                    let _ = handoff.updates.send(LoadUpdate::Failed(CodecError::WorkerStopped {
                        worker: "resources".to_string(),
                    }));
                }
            }
            Err(CodecError::Cancelled) => {
                info!("load cancelled while parsing");
                let _ = job.updates.send(LoadUpdate::Cancelled);
            }
            Err(error) => {
                error!(%error, "page could not be read");
                let _ = job.updates.send(LoadUpdate::Failed(error));
            }
        }
    }
    debug!("parser worker stopped");
}

fn resource_worker<H: WidgetHost + 'static>(
    jobs: &Receiver<FetchJob>,
    fetcher: &dyn ResourceFetcher,
    factory: &dyn ModelFactory,
    ui: &UiHandle<H>,
) {
    while let Ok(job) = jobs.recv() {
        let FetchJob {
            mut page,
            cancel,
            updates,
        } = job;
        let outcome = match fetch_all(&mut page, fetcher, factory, &cancel) {
            Ok(outcome) => outcome,
            Err(CodecError::Cancelled) => {
                let _ = updates.send(LoadUpdate::Cancelled);
                continue;
            }
            Err(error) => {
                let _ = updates.send(LoadUpdate::Failed(error));
                continue;
            }
        };
        let _ = updates.send(LoadUpdate::ResourcesFetched {
            fetched: outcome.fetched,
            issues: outcome.issues.clone(),
        });

        let failed = updates.clone();
        let posted = ui.post(move |ui, host| {
            if cancel.is_cancelled() {
                let _ = updates.send(LoadUpdate::Cancelled);
                return;
            }
            let report = finish(ui, host, page, outcome);
            let _ = updates.send(LoadUpdate::Complete(Box::new(report)));
        });
        if let Err(error) = posted {
            let _ = failed.send(LoadUpdate::Failed(error));
        }
    }
    debug!("resource worker stopped");
}
