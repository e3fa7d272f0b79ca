//! Reading and writing pages.
//!
//! The [`Decoder`] turns page markup into a [`Document`](page_model::Document)
//! plus the resources and listener links it still needs. [`fetch_all`] loads
//! those resources, [`wire`] connects controls to their models on the
//! interactive thread, and [`PageLoader`] runs the three stages on background
//! workers. The [`Encoder`] writes a document back out.

pub mod collab;
pub mod config;
pub mod connector;
pub mod decoder;
pub mod encoder;
pub mod error;
mod fields;
pub mod interactive;
pub mod loader;
pub mod progress;
pub mod registry;
pub mod resources;
pub mod scratch;
pub mod tag;

pub use collab::{
    CachingFetcher, FileFetcher, HookState, LinkHistory, LoadedModels, ModelFactory,
    ModelStateSource, NoHistory, NoModels, ResourceFetcher, SimulationModel, StoredModel,
    StoredModelFactory, VisitedSet, WidgetHost, WiredLink,
};
pub use config::{DecoderConfig, EncoderConfig, LoaderConfig, PageConfig};
pub use connector::{UnresolvedLink, UnresolvedReason, WiringReport, wire};
pub use decoder::{DecodedPage, Decoder, DeferredLoad, LoadTarget, ParseStats};
pub use encoder::{EncodeIssue, EncodeReport, Encoder};
pub use error::{CodecError, Result};
pub use interactive::{InteractiveQueue, UiHandle, UiThread};
pub use loader::{LoadReport, LoadTicket, LoadUpdate, PageLoader};
pub use progress::{CancelToken, Progress};
pub use registry::ComponentRegistry;
pub use resources::{FetchIssue, FetchOutcome, ImageFormat, ImageInfo, fetch_all, sniff_image};
