//! Deferred resource loading.
//!
//! Runs after a page has been decoded and before it is wired. Each deferred
//! load is isolated: a failing image becomes a placeholder icon and a failing
//! model state leaves its model unloaded, but the page itself always loads.

use std::fmt;

use page_model::component::ResourceRole;
use page_model::{Attachment, Component, ComponentId, Icon, ModelKind, ResourceRef, Run};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::collab::{LoadedModels, ModelFactory, ResourceFetcher};
use crate::decoder::{DecodedPage, DeferredLoad, LoadTarget};
use crate::error::{CodecError, Result};
use crate::progress::CancelToken;

/// Raster formats recognized by their leading bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    Png,
    Gif,
    Jpeg,
    Bmp,
}

/// Format and pixel size of a fetched image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

/// Identify an image from its bytes.
///
/// Returns `None` for anything that is not one of the supported formats or
/// whose header is truncated.
#[must_use]
pub fn sniff_image(bytes: &[u8]) -> Option<ImageInfo> {
    if bytes.starts_with(&PNG_SIGNATURE) {
        // IHDR is always the first chunk.
        let width = u32::from_be_bytes(bytes.get(16..20)?.try_into().ok()?);
        let height = u32::from_be_bytes(bytes.get(20..24)?.try_into().ok()?);
        return Some(ImageInfo {
            format: ImageFormat::Png,
            width,
            height,
        });
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        let width = u16::from_le_bytes(bytes.get(6..8)?.try_into().ok()?);
        let height = u16::from_le_bytes(bytes.get(8..10)?.try_into().ok()?);
        return Some(ImageInfo {
            format: ImageFormat::Gif,
            width: u32::from(width),
            height: u32::from(height),
        });
    }
    if bytes.starts_with(b"BM") {
        let width = i32::from_le_bytes(bytes.get(18..22)?.try_into().ok()?);
        // Negative height marks a top-down bitmap.
        let height = i32::from_le_bytes(bytes.get(22..26)?.try_into().ok()?);
        return Some(ImageInfo {
            format: ImageFormat::Bmp,
            width: width.unsigned_abs(),
            height: height.unsigned_abs(),
        });
    }
    if bytes.starts_with(&[0xFF, 0xD8]) {
        return jpeg_size(bytes).map(|(width, height)| ImageInfo {
            format: ImageFormat::Jpeg,
            width,
            height,
        });
    }
    None
}

/// Walk JPEG segments up to the first start-of-frame marker.
fn jpeg_size(bytes: &[u8]) -> Option<(u32, u32)> {
    let mut position = 2;
    loop {
        if *bytes.get(position)? != 0xFF {
            return None;
        }
        let marker = *bytes.get(position + 1)?;
        match marker {
            // Fill bytes.
            0xFF => {
                position += 1;
                continue;
            }
            // Standalone markers carry no length.
            0x01 | 0xD0..=0xD7 => {
                position += 2;
                continue;
            }
            _ => {}
        }
        let length = usize::from(u16::from_be_bytes(
            bytes.get(position + 2..position + 4)?.try_into().ok()?,
        ));
        let is_frame = matches!(marker, 0xC0..=0xCF) && !matches!(marker, 0xC4 | 0xC8 | 0xCC);
        if is_frame {
            let height = u16::from_be_bytes(bytes.get(position + 5..position + 7)?.try_into().ok()?);
            let width = u16::from_be_bytes(bytes.get(position + 7..position + 9)?.try_into().ok()?);
            return Some((u32::from(width), u32::from(height)));
        }
        position += 2 + length;
    }
}

/// A deferred load that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchIssue {
    pub reference: ResourceRef,
    pub role: ResourceRole,
    pub message: String,
}

impl fmt::Display for FetchIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} '{}': {}", self.role, self.reference, self.message)
    }
}

/// Result of the resource phase.
#[derive(Default)]
pub struct FetchOutcome {
    /// One model per model-bearing component, keyed by model index.
    pub models: LoadedModels,
    pub fetched: usize,
    /// Loads not performed by this phase, such as activity-button targets.
    pub skipped: usize,
    pub placeholders: usize,
    pub issues: Vec<FetchIssue>,
}

impl fmt::Debug for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchOutcome")
            .field("models", &self.models.keys().collect::<Vec<_>>())
            .field("fetched", &self.fetched)
            .field("skipped", &self.skipped)
            .field("placeholders", &self.placeholders)
            .field("issues", &self.issues)
            .finish()
    }
}

impl FetchOutcome {
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }

    fn record(&mut self, load: &DeferredLoad, error: &CodecError) {
        warn!(resource = %load.reference, role = ?load.role, %error, "resource failed");
        self.issues.push(FetchIssue {
            reference: load.reference.clone(),
            role: load.role,
            message: error.to_string(),
        });
    }
}

/// Perform every deferred load of `page`.
///
/// Models are created for all model-bearing components first, so a control
/// bound to a model finds it even if that model's state fails to load.
///
/// # Errors
///
/// Returns [`CodecError::Cancelled`] when `cancel` is set between two loads.
/// Individual load failures are recorded in the outcome instead.
pub fn fetch_all(
    page: &mut DecodedPage,
    fetcher: &dyn ResourceFetcher,
    factory: &dyn ModelFactory,
    cancel: &CancelToken,
) -> Result<FetchOutcome> {
    let span = info_span!("fetch", loads = page.deferred.len());
    let _guard = span.enter();
    let mut outcome = FetchOutcome::default();

    for (id, component) in page.document.components() {
        let Some((index, kind)) = component.hosted_model() else {
            continue;
        };
        match factory.create(kind) {
            Some(model) => {
                debug!(id = id.0, index, kind = kind.label(), "model created");
                outcome.models.insert(index, model);
            }
            None => warn!(index, kind = kind.label(), "no engine for model kind"),
        }
    }

    let deferred = std::mem::take(&mut page.deferred);
    let mut cancelled = false;
    for load in &deferred {
        if cancel.is_cancelled() {
            cancelled = true;
            break;
        }
        match load.role {
            ResourceRole::Page => {
                outcome.skipped += 1;
                continue;
            }
            ResourceRole::Image => image(page, load, fetcher, &mut outcome),
            ResourceRole::ModelState | ResourceRole::Structure => {
                model_state(page, load, fetcher, &mut outcome);
            }
            ResourceRole::Audio | ResourceRole::Archive => match fetcher.fetch(&load.location) {
                Ok(bytes) => {
                    debug!(resource = %load.reference, bytes = bytes.len(), "resource fetched");
                    outcome.fetched += 1;
                }
                Err(error) => outcome.record(load, &error),
            },
        }
    }
    page.deferred = deferred;
    if cancelled {
        info!("resource loading cancelled");
        return Err(CodecError::Cancelled);
    }

    info!(
        fetched = outcome.fetched,
        models = outcome.models.len(),
        issues = outcome.issues.len(),
        "resources loaded"
    );
    Ok(outcome)
}

fn image(
    page: &mut DecodedPage,
    load: &DeferredLoad,
    fetcher: &dyn ResourceFetcher,
    outcome: &mut FetchOutcome,
) {
    let info = fetcher.fetch(&load.location).and_then(|bytes| {
        sniff_image(&bytes).ok_or_else(|| CodecError::fetch(&load.location, "not a supported image"))
    });
    let info = match info {
        Ok(info) => info,
        Err(error) => {
            outcome.record(load, &error);
            let substituted = match load.target {
                LoadTarget::Icon { paragraph, run } => run_mut(page, paragraph, run)
                    .map(|slot| {
                        slot.attributes.attachment = Some(Attachment::Icon(Icon::Placeholder {
                            missing: load.reference.clone(),
                        }));
                    })
                    .is_some(),
                LoadTarget::Component { id } => page
                    .document
                    .component_mut(id)
                    .is_some_and(Component::mark_image_missing),
                LoadTarget::Background | LoadTarget::Sound => false,
            };
            if substituted {
                outcome.placeholders += 1;
            }
            return;
        }
    };
    debug!(resource = %load.reference, format = ?info.format, width = info.width, height = info.height, "image fetched");
    outcome.fetched += 1;
    match load.target {
        LoadTarget::Icon { paragraph, run } => {
            let icon = run_mut(page, paragraph, run).and_then(|slot| {
                match &mut slot.attributes.attachment {
                    Some(Attachment::Icon(icon)) => Some(icon),
                    _ => None,
                }
            });
            if let Some(Icon::Image { width, height, .. }) = icon {
                width.get_or_insert(i32::try_from(info.width).unwrap_or(i32::MAX));
                height.get_or_insert(i32::try_from(info.height).unwrap_or(i32::MAX));
            }
        }
        LoadTarget::Component { .. } | LoadTarget::Background | LoadTarget::Sound => {}
    }
}

fn model_state(
    page: &DecodedPage,
    load: &DeferredLoad,
    fetcher: &dyn ResourceFetcher,
    outcome: &mut FetchOutcome,
) {
    let LoadTarget::Component { id } = load.target else {
        return;
    };
    let Some((index, kind)) = hosted_model(page, id) else {
        return;
    };
    let Some(model) = outcome.models.get_mut(&index) else {
        debug!(index, "state without a model");
        outcome.skipped += 1;
        return;
    };
    let result = fetcher
        .fetch(&load.location)
        .and_then(|bytes| model.load_state(&bytes));
    match result {
        Ok(()) => {
            debug!(index, kind = kind.label(), resource = %load.reference, "model state loaded");
            outcome.fetched += 1;
        }
        Err(error) => outcome.record(load, &error),
    }
}

fn run_mut(page: &mut DecodedPage, paragraph: usize, run: usize) -> Option<&mut Run> {
    page.document.paragraphs.get_mut(paragraph)?.runs.get_mut(run)
}

fn hosted_model(page: &DecodedPage, id: ComponentId) -> Option<(usize, ModelKind)> {
    page.document.component(id)?.hosted_model()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes
    }

    #[test]
    fn png_and_gif_headers_are_read() {
        let info = sniff_image(&png(40, 30)).unwrap();
        assert_eq!(info.format, ImageFormat::Png);
        assert_eq!((info.width, info.height), (40, 30));

        let mut gif = b"GIF89a".to_vec();
        gif.extend_from_slice(&[16, 0, 8, 0]);
        let info = sniff_image(&gif).unwrap();
        assert_eq!((info.format, info.width, info.height), (ImageFormat::Gif, 16, 8));
    }

    #[test]
    fn jpeg_frame_is_found_after_app_segments() {
        let bytes = [
            0xFF, 0xD8, // SOI
            0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, // APP0, 2 payload bytes
            0xFF, 0xC0, 0x00, 0x0B, 0x08, 0x00, 0x20, 0x00, 0x40, // SOF0 64x32
        ];
        let info = sniff_image(&bytes).unwrap();
        assert_eq!((info.format, info.width, info.height), (ImageFormat::Jpeg, 64, 32));
    }

    #[test]
    fn truncated_or_unknown_bytes_are_rejected() {
        assert_eq!(sniff_image(&PNG_SIGNATURE), None);
        assert_eq!(sniff_image(b"<svg/>"), None);
        assert_eq!(sniff_image(&[0xFF, 0xD8, 0xFF]), None);
    }
}
