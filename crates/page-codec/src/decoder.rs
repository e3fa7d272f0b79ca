//! Page decoder.
//!
//! Parse events are folded into a [`Document`] with a fixed element stack and
//! one [`Scratch`] accumulator. Leaf closes store values; structural closes
//! consume their declared slot sets and build paragraphs, runs, icons and
//! components. Resources named by the page are not fetched here; they are
//! returned as [`DeferredLoad`]s for the resource stage.

use std::borrow::Cow;
use std::fmt;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use page_model::component::{ResourceRole, Series};
use page_model::{
    Alignment, Attachment, AttributeBag, Background, BackgroundSound, BulletKind, Component,
    ComponentId, Document, DocumentProperties, Hyperlink, Icon, LineIcon, ListenerLinks, Location,
    Margins, Paragraph, ParagraphAttributes, ResourceRef, Rgb, Run, WindowSpec, LINK_UNVISITED,
    LINK_VISITED,
};
use encoding_rs::{Encoding, UTF_8};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use tracing::{debug, info, info_span, warn};

use crate::collab::{LinkHistory, NoHistory, ResourceFetcher};
use crate::config::DecoderConfig;
use crate::error::{CodecError, Result};
use crate::progress::{CancelToken, Progress, ProgressFn};
use crate::registry::ComponentRegistry;
use crate::scratch::{Scratch, ScratchView, slots};
use crate::tag::{Leaf, Structural, Tag};

/// What a deferred resource is fetched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum LoadTarget {
    Component { id: ComponentId },
    /// Image icon of run `run` in paragraph `paragraph`.
    Icon { paragraph: usize, run: usize },
    Background,
    Sound,
}

/// A resource to fetch once parsing has finished.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeferredLoad {
    /// Reference as written in the page.
    pub reference: ResourceRef,
    /// Reference resolved against the page's directory.
    pub location: Location,
    pub role: ResourceRole,
    pub target: LoadTarget,
}

/// Counters recorded while decoding one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParseStats {
    pub elements: usize,
    pub leaves: usize,
    pub malformed_leaves: usize,
    pub skipped_runs: usize,
    pub skipped_components: usize,
    /// Leaves left over inside an icon or component that nothing read.
    pub stray_leaves: usize,
    pub components: usize,
    pub icons: usize,
    pub bytes: u64,
    pub elapsed: Duration,
}

/// Result of decoding one page.
#[derive(Debug)]
pub struct DecodedPage {
    pub document: Document,
    /// Listener links, keyed by the model index they wait for.
    pub links: ListenerLinks,
    pub deferred: Vec<DeferredLoad>,
    pub stats: ParseStats,
}

/// Reads pages. One decoder handles one page at a time and is reused for the
/// next load.
pub struct Decoder {
    config: DecoderConfig,
    registry: ComponentRegistry,
    history: Arc<dyn LinkHistory>,
    scratch: Scratch,
    cancel: CancelToken,
    progress: Option<ProgressFn>,
}

impl Default for Decoder {
    fn default() -> Self {
        Self::new(DecoderConfig::default())
    }
}

impl fmt::Debug for Decoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decoder")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}

impl Decoder {
    /// Decoder with the standard component registry and no link history.
    #[must_use]
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            config,
            registry: ComponentRegistry::standard(),
            history: Arc::new(NoHistory),
            scratch: Scratch::new(),
            cancel: CancelToken::new(),
            progress: None,
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ComponentRegistry) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: Arc<dyn LinkHistory>) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Token checked between parse events of the following reads.
    pub fn set_cancel(&mut self, cancel: CancelToken) {
        self.cancel = cancel;
    }

    pub fn on_progress(&mut self, callback: impl FnMut(Progress) + Send + 'static) {
        self.progress = Some(Box::new(callback));
    }

    pub fn clear_progress(&mut self) {
        self.progress = None;
    }

    /// Fetch and decode the page at `location`.
    ///
    /// # Errors
    ///
    /// Stream-level failures only: the page cannot be fetched, is not
    /// well-formed, declares an unsupported encoding, or the read is
    /// cancelled.
    pub fn read(
        &mut self,
        location: &Location,
        fetcher: &dyn ResourceFetcher,
    ) -> Result<DecodedPage> {
        if location.is_remote() && !self.config.allow_remote {
            return Err(CodecError::RemoteDisabled {
                location: location.to_string(),
            });
        }
        let total = match location {
            Location::File(path) => std::fs::metadata(path).ok().map(|meta| meta.len()),
            Location::Url(_) => None,
        };
        let input = fetcher.open(location)?;
        self.decode(input, Some(location.clone()), total)
    }

    /// Decode from a reader; resources resolve against `base`'s directory.
    ///
    /// # Errors
    ///
    /// Same as [`Decoder::read`].
    pub fn read_from<R: BufRead>(
        &mut self,
        reader: R,
        base: Option<Location>,
    ) -> Result<DecodedPage> {
        self.decode(reader, base, None)
    }

    /// Decode an in-memory page.
    ///
    /// # Errors
    ///
    /// Same as [`Decoder::read`].
    pub fn read_str(&mut self, page: &str) -> Result<DecodedPage> {
        let total = u64::try_from(page.len()).ok();
        self.decode(page.as_bytes(), None, total)
    }

    fn decode<R: BufRead>(
        &mut self,
        input: R,
        base: Option<Location>,
        total: Option<u64>,
    ) -> Result<DecodedPage> {
        let page = base
            .as_ref()
            .map_or_else(|| "<memory>".to_string(), ToString::to_string);
        let span = info_span!("decode", page = %page);
        let _guard = span.enter();
        let started = Instant::now();

        self.scratch.clear();
        let cancel = self.cancel.clone();
        let progress = &mut self.progress;
        let mut session = Session::new(
            &self.registry,
            self.history.as_ref(),
            &self.config,
            &mut self.scratch,
        );

        let mut reader = Reader::from_reader(input);
        reader.config_mut().expand_empty_elements = true;
        let mut encoding = UTF_8;
        let mut buf = Vec::new();
        let mut reported = 0u8;
        notify(progress, Progress::new(0, "Reading page"));

        loop {
            if cancel.is_cancelled() {
                debug!(position = session.position, "decode cancelled");
                return Err(CodecError::Cancelled);
            }
            session.position = position(&reader);
            match reader.read_event_into(&mut buf)? {
                Event::Decl(decl) => {
                    if let Some(Ok(label)) = decl.encoding() {
                        encoding = encoding_for(&String::from_utf8_lossy(&label))?;
                        debug!(encoding = encoding.name(), "declared encoding");
                    }
                }
                Event::Start(start) => {
                    let tag = Tag::from_name(start.name().as_ref());
                    let attributes = attributes(&start, encoding, session.position)?;
                    session.open(tag, &attributes)?;
                }
                Event::End(_) => session.close()?,
                Event::Text(text) => {
                    session.text(&decode_text(encoding, &text, session.position)?)?;
                }
                Event::CData(data) => {
                    session.text(&decode_text(encoding, &data, session.position)?)?;
                }
                Event::GeneralRef(reference) => {
                    let name = decode_text(encoding, &reference, session.position)?;
                    match resolve_reference(&name) {
                        Some(resolved) => session.text(resolved.encode_utf8(&mut [0; 4]))?,
                        None => {
                            warn!(position = session.position, name = %name, "unknown entity reference");
                            session.text(&format!("&{name};"))?;
                        }
                    }
                }
                Event::Eof => break,
                _ => {}
            }
            buf.clear();

            if let Some(total) = total {
                let percent = Progress::ratio(position(&reader), total);
                if percent > reported {
                    reported = percent;
                    notify(progress, Progress::new(percent, "Reading page"));
                }
            }
        }

        if let Some(Some(open)) = session.stack.last() {
            return Err(CodecError::malformed(
                session.position,
                format!("unexpected end of input inside <{}>", tag_name(*open)),
            ));
        }

        session.stats.bytes = position(&reader);
        session.stats.elapsed = started.elapsed();
        let decoded = session.finish(base);
        let leftover = self.scratch.occupied().count();
        if leftover > 0 {
            debug!(leftover, "unconsumed leaves at end of page");
        }
        notify(progress, Progress::new(100, "Page read"));
        info!(
            paragraphs = decoded.document.paragraphs.len(),
            components = decoded.stats.components,
            deferred = decoded.deferred.len(),
            elapsed_ms = decoded.stats.elapsed.as_millis(),
            "page decoded"
        );
        Ok(decoded)
    }
}

fn notify(progress: &mut Option<ProgressFn>, update: Progress) {
    if let Some(callback) = progress.as_mut() {
        callback(update);
    }
}

fn position<R>(reader: &Reader<R>) -> u64 {
    u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX)
}

fn decode_text<'a>(
    encoding: &'static Encoding,
    bytes: &'a [u8],
    position: u64,
) -> Result<Cow<'a, str>> {
    encoding
        .decode_without_bom_handling_and_without_replacement(bytes)
        .ok_or_else(|| CodecError::malformed(position, format!("invalid {}", encoding.name())))
}

/// Resolve a declared encoding label. Markup is parsed byte-wise, so only
/// ASCII-compatible encodings are accepted.
fn encoding_for(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .filter(|encoding| encoding.is_ascii_compatible())
        .ok_or_else(|| CodecError::UnsupportedEncoding {
            name: label.trim().to_string(),
        })
}

fn tag_name(tag: Tag) -> &'static str {
    match tag {
        Tag::Structural(structural) => structural.name(),
        Tag::Leaf(leaf) => leaf.name(),
        Tag::Series(_) => Leaf::TimeSeriesY.name(),
    }
}

/// Resolve a general entity or character reference name (`amp`, `#38`, `#x26`).
fn resolve_reference(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = name.strip_prefix('#')?;
            let value = match code.strip_prefix(['x', 'X']) {
                Some(hex) => u32::from_str_radix(hex, 16).ok()?,
                None => code.parse().ok()?,
            };
            char::from_u32(value)
        }
    }
}

fn unescape(raw: &str) -> Cow<'_, str> {
    if !raw.contains('&') {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp + 1..];
        let resolved = tail
            .find(';')
            .and_then(|semi| resolve_reference(&tail[..semi]).map(|c| (c, semi)));
        match resolved {
            Some((c, semi)) => {
                out.push(c);
                rest = &tail[semi + 1..];
            }
            None => {
                out.push('&');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

fn attributes(
    start: &BytesStart<'_>,
    encoding: &'static Encoding,
    position: u64,
) -> Result<Vec<(String, String)>> {
    let mut out = Vec::new();
    for attribute in start.attributes() {
        let attribute = attribute.map_err(quick_xml::Error::from)?;
        let key = String::from_utf8_lossy(attribute.key.as_ref()).into_owned();
        let raw = decode_text(encoding, &attribute.value, position)?;
        out.push((key, unescape(&raw).into_owned()));
    }
    Ok(out)
}

fn attribute<'a>(attributes: &'a [(String, String)], key: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.as_str())
}

fn offset(attributes: &[(String, String)], key: &str) -> Option<usize> {
    attribute(attributes, key).and_then(|value| value.trim().parse().ok())
}

// =============================================================================
// SESSION
// =============================================================================

/// Per-series styling carried as attributes of `time_series_y<N>`.
#[derive(Debug, Default)]
struct SeriesStyle {
    color: Option<Rgb>,
    symbol: Option<i32>,
    style: Option<i32>,
    width: Option<f32>,
}

impl SeriesStyle {
    fn from_attributes(attributes: &[(String, String)]) -> Self {
        Self {
            color: attribute(attributes, "color").and_then(|value| Rgb::from_hex(value).ok()),
            symbol: attribute(attributes, "symbol").and_then(|value| value.trim().parse().ok()),
            style: attribute(attributes, "style").and_then(|value| value.trim().parse().ok()),
            width: attribute(attributes, "width").and_then(|value| value.trim().parse().ok()),
        }
    }
}

#[derive(Debug)]
enum Pending {
    Icon(Icon),
    Component(Component),
}

#[derive(Debug, Default)]
struct OpenParagraph {
    start: Option<usize>,
    end: Option<usize>,
    runs: Vec<Run>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Span {
    start: Option<usize>,
    end: Option<usize>,
}

struct HeaderValues {
    language: Option<String>,
    title: Option<String>,
    sound: Option<ResourceRef>,
    looping: Option<bool>,
    image: Option<ResourceRef>,
}

/// State of one read.
struct Session<'d> {
    registry: &'d ComponentRegistry,
    history: &'d dyn LinkHistory,
    config: &'d DecoderConfig,
    scratch: &'d mut Scratch,
    stack: Vec<Option<Tag>>,
    position: u64,
    text: String,
    text_len: usize,
    leaf_text: String,
    series: SeriesStyle,
    paragraphs: Vec<Paragraph>,
    paragraph: Option<OpenParagraph>,
    content: Option<Span>,
    pending: Option<Pending>,
    components: Vec<Component>,
    links: ListenerLinks,
    models: usize,
    properties: DocumentProperties,
    stats: ParseStats,
}

impl<'d> Session<'d> {
    fn new(
        registry: &'d ComponentRegistry,
        history: &'d dyn LinkHistory,
        config: &'d DecoderConfig,
        scratch: &'d mut Scratch,
    ) -> Self {
        Self {
            registry,
            history,
            config,
            scratch,
            stack: Vec::new(),
            position: 0,
            text: String::new(),
            text_len: 0,
            leaf_text: String::new(),
            series: SeriesStyle::default(),
            paragraphs: Vec::new(),
            paragraph: None,
            content: None,
            pending: None,
            components: Vec::new(),
            links: ListenerLinks::new(),
            models: 0,
            properties: DocumentProperties::default(),
            stats: ParseStats::default(),
        }
    }

    fn open(&mut self, tag: Option<Tag>, attributes: &[(String, String)]) -> Result<()> {
        self.stats.elements += 1;
        match tag {
            Some(Tag::Structural(Structural::Paragraph)) => {
                if self.paragraph.is_some() {
                    return Err(CodecError::malformed(self.position, "nested paragraph"));
                }
                self.paragraph = Some(OpenParagraph {
                    start: offset(attributes, "start"),
                    end: offset(attributes, "end"),
                    runs: Vec::new(),
                });
            }
            Some(Tag::Structural(Structural::Content)) => {
                if self.paragraph.is_none() {
                    return Err(CodecError::malformed(
                        self.position,
                        "content outside paragraph",
                    ));
                }
                self.content = Some(Span {
                    start: offset(attributes, "start"),
                    end: offset(attributes, "end"),
                });
            }
            Some(Tag::Series(_)) | Some(Tag::Leaf(Leaf::TimeSeriesY)) => {
                self.leaf_text.clear();
                self.series = SeriesStyle::from_attributes(attributes);
            }
            Some(Tag::Leaf(_)) => self.leaf_text.clear(),
            _ => {}
        }
        self.stack.push(tag);
        Ok(())
    }

    fn text(&mut self, chunk: &str) -> Result<()> {
        match self.stack.last() {
            Some(Some(Tag::Structural(Structural::Text))) => {
                self.text_len += chunk.chars().count();
                if self.text_len > self.config.max_text_chars {
                    return Err(CodecError::malformed(
                        self.position,
                        format!(
                            "text exceeds {} characters",
                            self.config.max_text_chars
                        ),
                    ));
                }
                self.text.push_str(chunk);
            }
            Some(Some(Tag::Leaf(_) | Tag::Series(_))) => self.leaf_text.push_str(chunk),
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let Some(tag) = self.stack.pop().flatten() else {
            return Ok(());
        };
        match tag {
            Tag::Series(ordinal) => self.close_series(ordinal),
            Tag::Leaf(Leaf::TimeSeriesY) => self.close_series(0),
            Tag::Leaf(leaf) => self.close_leaf(leaf),
            Tag::Structural(structural) => match structural {
                Structural::Text | Structural::Document => self.apply_header()?,
                Structural::Section => {}
                Structural::Paragraph => self.close_paragraph(),
                Structural::Content => self.close_content(),
                Structural::Icon => self.close_icon(),
                Structural::Component => self.close_component(),
                Structural::BgColor => self.close_bg_color(),
                Structural::BgGradient => self.close_bg_gradient(),
                Structural::BgPattern => self.close_bg_pattern(),
            },
        }
        Ok(())
    }

    fn close_leaf(&mut self, leaf: Leaf) {
        self.stats.leaves += 1;
        let text = std::mem::take(&mut self.leaf_text);
        if let Err(invalid) = self.scratch.store(leaf, &text) {
            self.stats.malformed_leaves += 1;
            warn!(position = self.position, "{invalid}");
        }
    }

    fn close_series(&mut self, ordinal: u16) {
        self.stats.leaves += 1;
        let source = std::mem::take(&mut self.leaf_text).trim().to_string();
        let style = std::mem::take(&mut self.series);
        self.scratch.store_series(Series {
            ordinal,
            source,
            color: style.color,
            symbol: style.symbol,
            style: style.style,
            width: style.width,
        });
    }

    fn apply_header(&mut self) -> Result<()> {
        let header = self.scratch.consume(slots::HEADER, |view| HeaderValues {
            language: view.text(Leaf::Language),
            title: view.text(Leaf::PageTitle),
            sound: view.resource(Leaf::BgSound),
            looping: view.flag(Leaf::Loop),
            image: view.resource(Leaf::BgImage),
        });
        if let Some(language) = header.language {
            encoding_for(&language)?;
            self.properties.charset = Some(language.trim().to_string());
        }
        if let Some(title) = header.title {
            self.properties.title = Some(title);
        }
        match (header.sound, header.looping) {
            (Some(resource), looping) => {
                self.properties.sound = Some(BackgroundSound {
                    resource,
                    looping: looping.unwrap_or(false),
                });
            }
            (None, Some(looping)) => {
                if let Some(sound) = self.properties.sound.as_mut() {
                    sound.looping = looping;
                }
            }
            (None, None) => {}
        }
        if let Some(resource) = header.image {
            self.properties.background = Some(Background::Image { resource });
        }
        Ok(())
    }

    fn close_bg_color(&mut self) {
        let color = self.scratch.consume(slots::BG_COLOR, |view| {
            let (red, green, blue) = (
                view.int(Leaf::Red),
                view.int(Leaf::Green),
                view.int(Leaf::Blue),
            );
            (red.is_some() || green.is_some() || blue.is_some()).then(|| {
                Rgb::from_components(red.unwrap_or(0), green.unwrap_or(0), blue.unwrap_or(0))
            })
        });
        if let Some(color) = color {
            debug!(color = %color.to_hex(), "background color");
            self.properties.background = Some(Background::Color { color });
        }
    }

    fn close_bg_gradient(&mut self) {
        let background = self.scratch.consume(slots::BG_GRADIENT, |view| Background::Gradient {
            from: view.color(Leaf::Color1).unwrap_or(Rgb::WHITE),
            to: view.color(Leaf::Color2).unwrap_or(Rgb::BLACK),
            style: view.int(Leaf::Style).unwrap_or(0),
            variant: view.int(Leaf::Variant).unwrap_or(0),
        });
        debug!("background gradient");
        self.properties.background = Some(background);
    }

    fn close_bg_pattern(&mut self) {
        let background = self.scratch.consume(slots::BG_PATTERN, |view| Background::Pattern {
            foreground: view.color(Leaf::Color1).unwrap_or(Rgb::BLACK),
            background: view.color(Leaf::Color2).unwrap_or(Rgb::WHITE),
            style: view.int(Leaf::Style).unwrap_or(0),
            width: view.int(Leaf::Width).unwrap_or(0),
            height: view.int(Leaf::Height).unwrap_or(0),
        });
        debug!("background pattern");
        self.properties.background = Some(background);
    }

    fn close_paragraph(&mut self) {
        let Some(open) = self.paragraph.take() else {
            return;
        };
        let attributes = self.scratch.consume(slots::PARAGRAPH, paragraph_attributes);
        let start = open.start.or_else(|| open.runs.first().map(|run| run.start));
        let end = open.end.or_else(|| open.runs.last().map(|run| run.end));
        match (start, end) {
            (Some(start), Some(end)) => self.paragraphs.push(Paragraph {
                start,
                end,
                attributes,
                runs: open.runs,
            }),
            _ => debug!(position = self.position, "dropping paragraph without extent"),
        }
    }

    fn close_content(&mut self) {
        let span = self.content.take().unwrap_or_default();
        let history = self.history;
        let mut attributes = self
            .scratch
            .consume(slots::RUN, |view| run_attributes(view, history));
        let pending = self.pending.take();

        let (Some(start), Some(end)) = (span.start, span.end) else {
            self.stats.skipped_runs += 1;
            warn!(position = self.position, "skipping run without offsets");
            return;
        };
        if start >= end || end > self.text_len {
            self.stats.skipped_runs += 1;
            warn!(
                position = self.position,
                start,
                end,
                len = self.text_len,
                "skipping run outside the text"
            );
            return;
        }
        let previous_end = self
            .paragraph
            .as_ref()
            .and_then(|paragraph| paragraph.runs.last())
            .map(|run| run.end);
        if let Some(previous_end) = previous_end
            && start < previous_end
        {
            self.stats.skipped_runs += 1;
            warn!(
                position = self.position,
                start,
                previous_end,
                "skipping run that overlaps the previous run"
            );
            return;
        }

        match pending {
            Some(Pending::Icon(icon)) => {
                self.stats.icons += 1;
                attributes.attachment = Some(Attachment::Icon(icon));
            }
            Some(Pending::Component(mut component)) => {
                if component.hosted_model().is_some() {
                    component.set_model_index(self.models);
                    self.models += 1;
                }
                let id = ComponentId(self.components.len());
                for request in component.link_requests() {
                    self.links.register(id, request);
                }
                debug!(
                    id = id.0,
                    type_name = component.type_name(),
                    "component placed"
                );
                self.components.push(component);
                self.stats.components += 1;
                attributes.attachment = Some(Attachment::Component(id));
            }
            None => {}
        }

        if let Some(paragraph) = self.paragraph.as_mut() {
            paragraph.runs.push(Run::new(start, end, attributes));
        }
    }

    fn close_icon(&mut self) {
        let icon = self.scratch.consume(slots::ICON, build_icon);
        self.stats.stray_leaves += self.scratch.discard(slots::embedded_scope());
        match icon {
            Some(icon) => {
                debug!(type_name = icon.type_name(), "icon built");
                self.pending = Some(Pending::Icon(icon));
            }
            None => warn!(position = self.position, "icon without a usable class"),
        }
    }

    fn close_component(&mut self) {
        let class = self
            .scratch
            .peek_text(Leaf::Class)
            .map(|class| class.trim().to_string());
        let builder = class
            .as_deref()
            .and_then(|name| self.registry.builder(name))
            .copied();

        let component = match (builder, class) {
            (Some(builder), _) => {
                let component = self.scratch.consume(builder.slots, |view| (builder.build)(view));
                debug!(type_name = builder.type_name, "component built");
                Some(component)
            }
            (None, Some(name)) if self.registry.has_dynamic(&name) => {
                let mut properties = self
                    .scratch
                    .consume(ComponentRegistry::dynamic_slots(), |view| view.properties());
                properties.remove(Leaf::Class.name());
                let component = self.registry.construct_dynamic(&name, properties);
                if component.is_none() {
                    self.stats.skipped_components += 1;
                }
                component.map(Component::Dynamic)
            }
            (None, class) => {
                debug!(class = ?class, "skipping unknown component type");
                self.stats.skipped_components += 1;
                None
            }
        };

        self.stats.stray_leaves += self.scratch.discard(slots::embedded_scope());
        self.pending = component.map(Pending::Component);
    }

    fn finish(self, base: Option<Location>) -> DecodedPage {
        let mut document =
            Document::from_parts(self.text, self.paragraphs, self.components, self.properties);
        document.normalize_partition();
        let mut links = self.links;
        links.remap_components(&document.prune_components());
        let directory = base
            .as_ref()
            .map_or_else(|| Location::File(PathBuf::new()), Location::parent);
        let deferred = deferred_loads(&document, &directory);
        document.base = base;
        DecodedPage {
            document,
            links,
            deferred,
            stats: self.stats,
        }
    }
}

// =============================================================================
// BUILDERS
// =============================================================================

fn paragraph_attributes(view: &ScratchView<'_>) -> ParagraphAttributes {
    ParagraphAttributes {
        alignment: view.int(Leaf::Alignment).and_then(Alignment::from_code),
        left_indent: view.float(Leaf::LeftIndent),
        right_indent: view.float(Leaf::RightIndent),
        first_line_indent: view.float(Leaf::FirstLineIndent),
        space_above: view.float(Leaf::SpaceAbove),
        space_below: view.float(Leaf::SpaceBelow),
        line_spacing: view.float(Leaf::LineSpacing),
    }
}

fn run_attributes(view: &ScratchView<'_>, history: &dyn LinkHistory) -> AttributeBag {
    let link = view
        .text(Leaf::Href)
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .map(|href| Hyperlink {
            href,
            target: view.text(Leaf::Target),
            window: WindowSpec {
                width: view.int(Leaf::WindowWidth),
                height: view.int(Leaf::WindowHeight),
                resizable: view.flag(Leaf::WindowResizable),
                menubar: view.flag(Leaf::WindowMenubar),
                toolbar: view.flag(Leaf::WindowToolbar),
                statusbar: view.flag(Leaf::WindowStatusbar),
            },
        });
    // Link styling is derived, never read from the page.
    let (underline, foreground) = match &link {
        Some(link) if history.is_visited(&link.href) => (Some(true), Some(LINK_VISITED)),
        Some(_) => (Some(true), Some(LINK_UNVISITED)),
        None => (view.flag(Leaf::Underline), view.color(Leaf::Foreground)),
    };
    AttributeBag {
        family: view.text(Leaf::Family),
        size: view
            .int(Leaf::Size)
            .and_then(|size| u32::try_from(size).ok())
            .filter(|size| *size > 0),
        bold: view.flag(Leaf::Bold),
        italic: view.flag(Leaf::Italic),
        underline,
        strikethrough: view.flag(Leaf::Strikethrough),
        subscript: view.flag(Leaf::Subscript),
        superscript: view.flag(Leaf::Superscript),
        foreground,
        link,
        attachment: None,
    }
}

fn build_icon(view: &ScratchView<'_>) -> Option<Icon> {
    let class = view.text(Leaf::Class)?;
    match class.trim() {
        Icon::IMAGE => Some(Icon::Image {
            resource: view.resource(Leaf::Resource)?,
            width: view.int(Leaf::Width),
            height: view.int(Leaf::Height),
        }),
        Icon::LINE => Some(Icon::Line(LineIcon {
            width: view.int(Leaf::Width).unwrap_or(0),
            height: view.int(Leaf::Height).unwrap_or(0),
            margins: Margins {
                left: view.int(Leaf::LeftMargin).unwrap_or(0),
                right: view.int(Leaf::RightMargin).unwrap_or(0),
                top: view.int(Leaf::TopMargin).unwrap_or(0),
                bottom: view.int(Leaf::BottomMargin).unwrap_or(0),
            },
            corner_arc: view.int(Leaf::CornerArc).unwrap_or(0),
            arc_width: view.int(Leaf::ArcWidth).unwrap_or(0),
            arc_height: view.int(Leaf::ArcHeight).unwrap_or(0),
            opaque: view.flag(Leaf::Opaque).unwrap_or(false),
            title: view.text(Leaf::Title),
            fill: view.color(Leaf::Color),
        })),
        Icon::BULLET => Some(Icon::Bullet {
            kind: BulletKind::from_code(view.int(Leaf::Style).unwrap_or(0)),
        }),
        other => {
            debug!(class = other, "unknown icon class");
            None
        }
    }
}

/// Every resource the decoded page needs, resolved against `directory`.
fn deferred_loads(document: &Document, directory: &Location) -> Vec<DeferredLoad> {
    let deferred = |reference: &ResourceRef, role, target| DeferredLoad {
        reference: reference.clone(),
        location: reference.resolve(directory),
        role,
        target,
    };
    let mut loads = Vec::new();
    for (id, component) in document.components() {
        for (role, reference) in component.resources() {
            loads.push(deferred(reference, role, LoadTarget::Component { id }));
        }
    }
    for (paragraph_index, paragraph) in document.paragraphs.iter().enumerate() {
        for (run_index, run) in paragraph.runs.iter().enumerate() {
            if let Some(Icon::Image { resource, .. }) = run.attributes.icon() {
                loads.push(deferred(
                    resource,
                    ResourceRole::Image,
                    LoadTarget::Icon {
                        paragraph: paragraph_index,
                        run: run_index,
                    },
                ));
            }
        }
    }
    if let Some(Background::Image { resource }) = &document.properties.background {
        loads.push(deferred(resource, ResourceRole::Image, LoadTarget::Background));
    }
    if let Some(sound) = &document.properties.sound {
        loads.push(deferred(&sound.resource, ResourceRole::Audio, LoadTarget::Sound));
    }
    loads
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn references_resolve() {
        assert_eq!(resolve_reference("amp"), Some('&'));
        assert_eq!(resolve_reference("#x41"), Some('A'));
        assert_eq!(resolve_reference("#66"), Some('B'));
        assert_eq!(resolve_reference("nbsp"), None);
        assert_eq!(unescape("a &lt;b&gt; &amp; &bogus; c"), "a <b> & &bogus; c");
    }

    #[test]
    fn header_and_background_are_read() {
        let page = r#"<?xml version="1.0" encoding="UTF-8"?>
<document>
  <language>UTF-8</language>
  <page_title>Gas laws</page_title>
  <bgsound>hum.wav</bgsound>
  <loop>true</loop>
  <bg_gradient><color1>ff0000</color1><color2>0000ff</color2><style>2</style><variant>1</variant></bg_gradient>
  <text>Hi</text>
  <section start="0" end="2"><paragraph start="0" end="2"><content start="0" end="2"></content></paragraph></section>
</document>"#;
        let decoded = Decoder::default().read_str(page).unwrap();
        let properties = &decoded.document.properties;
        assert_eq!(properties.title.as_deref(), Some("Gas laws"));
        assert_eq!(properties.charset.as_deref(), Some("UTF-8"));
        assert_eq!(
            properties.background,
            Some(Background::Gradient {
                from: Rgb::new(255, 0, 0),
                to: Rgb::new(0, 0, 255),
                style: 2,
                variant: 1,
            })
        );
        let sound = properties.sound.as_ref().unwrap();
        assert!(sound.looping);
        assert_eq!(decoded.deferred.len(), 1);
        assert_eq!(decoded.deferred[0].target, LoadTarget::Sound);
    }

    #[test]
    fn content_outside_paragraph_is_malformed() {
        let page = r#"<document><text>ab</text><section><content start="0" end="2"/></section></document>"#;
        let error = Decoder::default().read_str(page).unwrap_err();
        assert!(matches!(error, CodecError::Malformed { .. }));
    }

    #[test]
    fn text_limit_is_enforced() {
        let config = DecoderConfig {
            max_text_chars: 3,
            ..DecoderConfig::default()
        };
        let error = Decoder::new(config)
            .read_str("<document><text>abcd</text></document>")
            .unwrap_err();
        assert!(matches!(error, CodecError::Malformed { .. }));
    }

    #[test]
    fn cancelled_token_stops_the_read() {
        let mut decoder = Decoder::default();
        let cancel = CancelToken::new();
        cancel.cancel();
        decoder.set_cancel(cancel);
        let error = decoder.read_str("<document/>").unwrap_err();
        assert!(matches!(error, CodecError::Cancelled));
        decoder.set_cancel(CancelToken::new());
        assert!(decoder.read_str("<document/>").is_ok());
    }

    #[test]
    fn progress_reaches_completion() {
        use std::sync::Mutex;

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mut decoder = Decoder::default();
        decoder.on_progress(move |progress| sink.lock().unwrap().push(progress.percent));
        decoder
            .read_str("<document><text>abc</text></document>")
            .unwrap();
        let seen = seen.lock().unwrap();
        assert_eq!(seen.first(), Some(&0));
        assert_eq!(seen.last(), Some(&100));
        assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
