//! Page encoder.
//!
//! Walks a [`Document`] and writes the page markup. Only non-default values
//! are written. When writing to a file, resources are copied next to the page
//! and model state goes to `<stem>$<index>.<ext>` companion files; problems
//! with either are collected in the [`EncodeReport`] instead of failing the
//! write.

use std::collections::HashMap;
use std::fmt;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use page_model::{
    Attachment, AttributeBag, Background, Component, Document, Icon, Location, ModelKind,
    Paragraph, ParagraphAttributes, ResourceRef, Run,
};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, info_span, warn};

use crate::collab::ModelStateSource;
use crate::config::EncoderConfig;
use crate::error::Result;
use crate::fields::{Field, Fields, component_fields, icon_fields};
use crate::progress::Progress;
use crate::tag::{Leaf, SERIES_PREFIX, Structural};

/// A problem that did not stop the write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EncodeIssue {
    /// A resource could not be copied next to the page.
    ResourceCopy { resource: String, message: String },
    /// A model's state could not be obtained or written.
    ModelState { index: usize, message: String },
}

impl fmt::Display for EncodeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceCopy { resource, message } => {
                write!(f, "could not copy '{resource}': {message}")
            }
            Self::ModelState { index, message } => {
                write!(f, "could not save model #{index}: {message}")
            }
        }
    }
}

/// Outcome of one write.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EncodeReport {
    pub paragraphs: usize,
    pub components: usize,
    pub copied_resources: usize,
    pub model_files: usize,
    pub issues: Vec<EncodeIssue>,
}

impl EncodeReport {
    /// Whether everything the page references was written.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Callback invoked once per written paragraph.
pub type ProgressSink = Arc<dyn Fn(Progress) + Send + Sync>;

/// Writes pages.
#[derive(Clone, Default)]
pub struct Encoder {
    config: EncoderConfig,
    progress: Option<ProgressSink>,
}

impl fmt::Debug for Encoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encoder")
            .field("config", &self.config)
            .field("progress", &self.progress.is_some())
            .finish()
    }
}

impl Encoder {
    #[must_use]
    pub fn new(config: EncoderConfig) -> Self {
        Self {
            config,
            progress: None,
        }
    }

    pub fn on_progress(&mut self, callback: impl Fn(Progress) + Send + Sync + 'static) {
        self.progress = Some(Arc::new(callback));
    }

    /// Write `document` to `path`, externalizing resources and model state
    /// into the same directory.
    ///
    /// The page is written to a temporary file beside `path` and moved into
    /// place once complete, so a failed write leaves any existing page intact.
    ///
    /// # Errors
    ///
    /// Returns an error only when the page file itself cannot be written.
    pub fn write(
        &self,
        document: &Document,
        models: &dyn ModelStateSource,
        path: &Path,
    ) -> Result<EncodeReport> {
        let span = info_span!("encode", path = %path.display());
        let _guard = span.enter();
        let directory = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        if !directory.as_os_str().is_empty() {
            std::fs::create_dir_all(&directory)?;
        }
        let stem = path
            .file_stem()
            .map_or_else(|| "page".to_string(), |stem| stem.to_string_lossy().into_owned());
        let file = if directory.as_os_str().is_empty() {
            NamedTempFile::new_in(".")?
        } else {
            NamedTempFile::new_in(&directory)?
        };
        if let Ok(existing) = std::fs::metadata(path) {
            file.as_file().set_permissions(existing.permissions())?;
        }
        let destination = Destination { directory, stem };
        let report = self.encode(
            document,
            models,
            BufWriter::new(file.as_file()),
            Some(destination),
        )?;
        file.persist(path).map_err(|error| error.error)?;
        info!(
            paragraphs = report.paragraphs,
            components = report.components,
            issues = report.issues.len(),
            "page written"
        );
        Ok(report)
    }

    /// [`Encoder::write`] holding the document's read lock for the whole pass.
    ///
    /// # Errors
    ///
    /// Same as [`Encoder::write`].
    pub fn write_locked(
        &self,
        document: &RwLock<Document>,
        models: &dyn ModelStateSource,
        path: &Path,
    ) -> Result<EncodeReport> {
        let guard = document.read().unwrap_or_else(PoisonError::into_inner);
        self.write(&guard, models, path)
    }

    /// Write to any sink. References are written unchanged and no companion
    /// files are produced.
    ///
    /// # Errors
    ///
    /// Returns an error when the sink fails.
    pub fn write_to<W: Write>(
        &self,
        document: &Document,
        models: &dyn ModelStateSource,
        sink: W,
    ) -> Result<EncodeReport> {
        self.encode(document, models, sink, None)
    }

    /// Encode into a string, mainly for previews and tests.
    ///
    /// # Errors
    ///
    /// Same as [`Encoder::write_to`].
    pub fn write_string(
        &self,
        document: &Document,
        models: &dyn ModelStateSource,
    ) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_to(document, models, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    fn encode<W: Write>(
        &self,
        document: &Document,
        models: &dyn ModelStateSource,
        sink: W,
        destination: Option<Destination>,
    ) -> Result<EncodeReport> {
        let writer = match self.config.indent {
            Some(indent) => Writer::new_with_indent(sink, b' ', indent),
            None => Writer::new(sink),
        };
        let source_directory = document.base.as_ref().map(Location::parent);
        let mut pass = Pass {
            writer,
            models,
            source_directory,
            destination,
            copy_resources: self.config.copy_resources,
            copied: HashMap::new(),
            report: EncodeReport::default(),
        };
        pass.document(document, self.progress.as_deref())?;
        let Pass {
            writer, report, ..
        } = pass;
        writer.into_inner().flush()?;
        Ok(report)
    }
}

struct Destination {
    directory: PathBuf,
    stem: String,
}

/// State of one write.
struct Pass<'a, W: Write> {
    writer: Writer<W>,
    models: &'a dyn ModelStateSource,
    source_directory: Option<Location>,
    destination: Option<Destination>,
    copy_resources: bool,
    /// Target path to the source copied there during this pass.
    copied: HashMap<PathBuf, PathBuf>,
    report: EncodeReport,
}

impl<W: Write> Pass<'_, W> {
    fn start(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn spanned(&mut self, name: &str, start: usize, end: usize) -> Result<()> {
        let mut element = BytesStart::new(name);
        element.push_attribute(("start", start.to_string().as_str()));
        element.push_attribute(("end", end.to_string().as_str()));
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn leaf(&mut self, leaf: Leaf, text: &str) -> Result<()> {
        self.start(leaf.name())?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(leaf.name())
    }

    fn leaf_if<T: ToString>(&mut self, leaf: Leaf, value: Option<T>) -> Result<()> {
        match value {
            Some(value) => self.leaf(leaf, &value.to_string()),
            None => Ok(()),
        }
    }

    fn document(
        &mut self,
        document: &Document,
        progress: Option<&(dyn Fn(Progress) + Send + Sync)>,
    ) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        self.start(Structural::Document.name())?;
        self.header(document)?;

        self.start(Structural::Text.name())?;
        self.writer
            .write_event(Event::Text(BytesText::new(document.text())))?;
        self.end(Structural::Text.name())?;

        self.spanned(Structural::Section.name(), 0, document.len_chars())?;
        let total = document.paragraphs.len();
        for (index, paragraph) in document.paragraphs.iter().enumerate() {
            self.paragraph(document, paragraph)?;
            self.report.paragraphs += 1;
            if let Some(progress) = progress {
                let done = u64::try_from(index + 1).unwrap_or(u64::MAX);
                let total = u64::try_from(total).unwrap_or(u64::MAX);
                progress(Progress::new(
                    Progress::ratio(done, total),
                    format!("Writing paragraph {} of {total}", index + 1),
                ));
            }
        }
        self.end(Structural::Section.name())?;
        self.end(Structural::Document.name())
    }

    fn header(&mut self, document: &Document) -> Result<()> {
        let properties = &document.properties;
        self.leaf_if(Leaf::Language, properties.charset.as_deref())?;
        self.leaf_if(Leaf::PageTitle, properties.title.as_deref())?;
        if let Some(sound) = &properties.sound {
            let reference = self.resource(&sound.resource);
            self.leaf(Leaf::BgSound, &reference)?;
            if sound.looping {
                self.leaf(Leaf::Loop, "true")?;
            }
        }
        match &properties.background {
            None => {}
            Some(Background::Image { resource }) => {
                let reference = self.resource(resource);
                self.leaf(Leaf::BgImage, &reference)?;
            }
            Some(Background::Color { color }) => {
                self.start(Structural::BgColor.name())?;
                self.leaf(Leaf::Red, &color.r.to_string())?;
                self.leaf(Leaf::Green, &color.g.to_string())?;
                self.leaf(Leaf::Blue, &color.b.to_string())?;
                self.end(Structural::BgColor.name())?;
            }
            Some(Background::Gradient {
                from,
                to,
                style,
                variant,
            }) => {
                self.start(Structural::BgGradient.name())?;
                self.leaf(Leaf::Color1, &from.to_hex())?;
                self.leaf(Leaf::Color2, &to.to_hex())?;
                self.leaf(Leaf::Style, &style.to_string())?;
                self.leaf(Leaf::Variant, &variant.to_string())?;
                self.end(Structural::BgGradient.name())?;
            }
            Some(Background::Pattern {
                foreground,
                background,
                style,
                width,
                height,
            }) => {
                self.start(Structural::BgPattern.name())?;
                self.leaf(Leaf::Color1, &foreground.to_hex())?;
                self.leaf(Leaf::Color2, &background.to_hex())?;
                self.leaf(Leaf::Style, &style.to_string())?;
                self.leaf(Leaf::Width, &width.to_string())?;
                self.leaf(Leaf::Height, &height.to_string())?;
                self.end(Structural::BgPattern.name())?;
            }
        }
        Ok(())
    }

    fn paragraph(&mut self, document: &Document, paragraph: &Paragraph) -> Result<()> {
        self.spanned(Structural::Paragraph.name(), paragraph.start, paragraph.end)?;
        self.paragraph_attributes(&paragraph.attributes.normalized())?;
        for run in &paragraph.runs {
            self.run(document, run)?;
        }
        self.end(Structural::Paragraph.name())
    }

    fn paragraph_attributes(&mut self, attributes: &ParagraphAttributes) -> Result<()> {
        self.leaf_if(Leaf::Alignment, attributes.alignment.map(|a| a.code()))?;
        self.leaf_if(Leaf::LeftIndent, attributes.left_indent)?;
        self.leaf_if(Leaf::RightIndent, attributes.right_indent)?;
        self.leaf_if(Leaf::FirstLineIndent, attributes.first_line_indent)?;
        self.leaf_if(Leaf::SpaceAbove, attributes.space_above)?;
        self.leaf_if(Leaf::SpaceBelow, attributes.space_below)?;
        self.leaf_if(Leaf::LineSpacing, attributes.line_spacing)
    }

    fn run(&mut self, document: &Document, run: &Run) -> Result<()> {
        self.spanned(Structural::Content.name(), run.start, run.end)?;
        self.run_attributes(&run.attributes.normalized())?;
        match &run.attributes.attachment {
            Some(Attachment::Icon(icon)) => self.icon(icon)?,
            Some(Attachment::Component(id)) => match document.component(*id) {
                Some(component) if component.is_serializable() => self.component(component)?,
                Some(component) => {
                    debug!(id = id.0, type_name = component.type_name(), "component not saved");
                }
                None => warn!(id = id.0, "run points at a missing component"),
            },
            None => {}
        }
        self.end(Structural::Content.name())
    }

    fn run_attributes(&mut self, attributes: &AttributeBag) -> Result<()> {
        self.leaf_if(Leaf::Family, attributes.family.as_deref())?;
        self.leaf_if(Leaf::Size, attributes.size)?;
        self.leaf_if(Leaf::Bold, attributes.bold)?;
        self.leaf_if(Leaf::Italic, attributes.italic)?;
        // Link styling is derived from the link on read.
        if attributes.link.is_none() {
            self.leaf_if(Leaf::Underline, attributes.underline)?;
        }
        self.leaf_if(Leaf::Strikethrough, attributes.strikethrough)?;
        self.leaf_if(Leaf::Subscript, attributes.subscript)?;
        self.leaf_if(Leaf::Superscript, attributes.superscript)?;
        if attributes.link.is_none() {
            self.leaf_if(
                Leaf::Foreground,
                attributes.foreground.map(|color| color.to_triple()),
            )?;
        }
        if let Some(link) = &attributes.link {
            self.leaf(Leaf::Href, &link.href)?;
            self.leaf_if(Leaf::Target, link.target.as_deref())?;
            let window = &link.window;
            self.leaf_if(Leaf::WindowWidth, window.width)?;
            self.leaf_if(Leaf::WindowHeight, window.height)?;
            self.leaf_if(Leaf::WindowResizable, window.resizable)?;
            self.leaf_if(Leaf::WindowMenubar, window.menubar)?;
            self.leaf_if(Leaf::WindowToolbar, window.toolbar)?;
            self.leaf_if(Leaf::WindowStatusbar, window.statusbar)?;
        }
        Ok(())
    }

    fn icon(&mut self, icon: &Icon) -> Result<()> {
        self.start(Structural::Icon.name())?;
        self.fields(&icon_fields(icon))?;
        self.end(Structural::Icon.name())
    }

    fn component(&mut self, component: &Component) -> Result<()> {
        self.start(Structural::Component.name())?;
        self.fields(&component_fields(component))?;
        self.end(Structural::Component.name())?;
        self.report.components += 1;
        Ok(())
    }

    fn fields(&mut self, fields: &Fields<'_>) -> Result<()> {
        for field in fields.iter() {
            match field {
                Field::Value(leaf, text) => self.leaf(*leaf, text)?,
                Field::Resource(leaf, reference) => {
                    let written = self.resource(reference);
                    self.leaf(*leaf, &written)?;
                }
                Field::Archives(archives) => {
                    let written: Vec<String> = archives
                        .iter()
                        .map(|archive| self.resource(archive))
                        .collect();
                    self.leaf(Leaf::Resource, &written.join(","))?;
                }
                Field::ModelState {
                    index,
                    kind,
                    original,
                } => {
                    if let Some(written) = self.model_state(*index, *kind, *original) {
                        self.leaf(Leaf::Resource, &written)?;
                    }
                }
                Field::Series(series) => {
                    let name = format!("{SERIES_PREFIX}{}", series.ordinal);
                    let mut element = BytesStart::new(name.as_str());
                    if let Some(color) = series.color {
                        element.push_attribute(("color", color.to_hex().as_str()));
                    }
                    if let Some(symbol) = series.symbol {
                        element.push_attribute(("symbol", symbol.to_string().as_str()));
                    }
                    if let Some(style) = series.style {
                        element.push_attribute(("style", style.to_string().as_str()));
                    }
                    if let Some(width) = series.width {
                        element.push_attribute(("width", width.to_string().as_str()));
                    }
                    self.writer.write_event(Event::Start(element))?;
                    self.writer
                        .write_event(Event::Text(BytesText::new(&series.source)))?;
                    self.end(&name)?;
                }
            }
        }
        Ok(())
    }

    /// Copy a resource next to the page and return the reference to write.
    fn resource(&mut self, reference: &ResourceRef) -> String {
        let name = reference.file_name().to_string();
        self.copy_as(reference, &name)
            .unwrap_or_else(|| reference.as_str().to_string())
    }

    /// Copy `reference` into the destination as `name`, or as `stem-N.ext`
    /// when another source already took `name` in this pass. Returns the name
    /// written; `None` means the reference is written unchanged.
    fn copy_as(&mut self, reference: &ResourceRef, name: &str) -> Option<String> {
        let directory = self.destination.as_ref()?.directory.clone();
        if !self.copy_resources || reference.is_remote() {
            return None;
        }
        let source = match &self.source_directory {
            Some(base) => reference.resolve(base),
            None => Location::File(PathBuf::from(reference.as_str())),
        };
        let Location::File(source) = source else {
            return None;
        };
        let name = self.free_name(&directory, &source, name);
        let target = directory.join(&name);
        if self.copied.contains_key(&target) || same_file(&source, &target) {
            return Some(name);
        }
        self.copied.insert(target.clone(), source.clone());
        match std::fs::copy(&source, &target) {
            Ok(_) => {
                debug!(resource = %reference, "resource copied");
                self.report.copied_resources += 1;
            }
            Err(error) => {
                warn!(resource = %reference, %error, "resource not copied");
                self.report.issues.push(EncodeIssue::ResourceCopy {
                    resource: reference.to_string(),
                    message: error.to_string(),
                });
            }
        }
        Some(name)
    }

    fn free_name(&self, directory: &Path, source: &Path, name: &str) -> String {
        let taken = |candidate: &str| {
            self.copied
                .get(&directory.join(candidate))
                .is_some_and(|copied| !same_file(copied, source))
        };
        if !taken(name) {
            return name.to_string();
        }
        let (stem, extension) = match name.rsplit_once('.') {
            Some((stem, extension)) if !stem.is_empty() => (stem, Some(extension)),
            _ => (name, None),
        };
        let renamed = (2..)
            .map(|index| match extension {
                Some(extension) => format!("{stem}-{index}.{extension}"),
                None => format!("{stem}-{index}"),
            })
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| name.to_string());
        debug!(source = %source.display(), name, renamed = %renamed, "resource renamed to avoid a clash");
        renamed
    }

    fn model_state(
        &mut self,
        index: usize,
        kind: ModelKind,
        original: Option<&ResourceRef>,
    ) -> Option<String> {
        let Some(destination) = self.destination.as_ref() else {
            return original.map(ToString::to_string);
        };
        let name = format!("{}${}.{}", destination.stem, index, kind.state_extension());
        let path = destination.directory.join(&name);
        let failure = match self.models.model_state(index, kind) {
            Ok(Some(bytes)) => match std::fs::write(&path, bytes) {
                Ok(()) => {
                    debug!(index, file = %name, "model state written");
                    self.report.model_files += 1;
                    return Some(name);
                }
                Err(error) => error.to_string(),
            },
            Ok(None) => {
                // No live model: carry the original state file over.
                return original.map(|reference| {
                    self.copy_as(reference, &name)
                        .unwrap_or_else(|| reference.to_string())
                });
            }
            Err(error) => error.to_string(),
        };
        warn!(index, message = %failure, "model state not saved");
        self.report.issues.push(EncodeIssue::ModelState {
            index,
            message: failure,
        });
        original.map(ToString::to_string)
    }
}

fn same_file(source: &Path, target: &Path) -> bool {
    if source == target {
        return true;
    }
    match (std::fs::canonicalize(source), std::fs::canonicalize(target)) {
        (Ok(source), Ok(target)) => source == target,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use page_model::{AttributeBag, Rgb};

    use super::*;
    use crate::collab::NoModels;

    #[test]
    fn issues_make_the_report_incomplete() {
        let mut report = EncodeReport::default();
        assert!(report.is_complete());
        report.issues.push(EncodeIssue::ModelState {
            index: 2,
            message: "engine busy".into(),
        });
        assert!(!report.is_complete());
        assert_eq!(report.issues[0].to_string(), "could not save model #2: engine busy");
    }

    #[test]
    fn link_runs_omit_derived_styling() {
        let mut builder = Document::builder();
        builder.push_text("next", AttributeBag::new().with_link("next.page"));
        let xml = Encoder::default()
            .write_string(&builder.build(), &NoModels)
            .unwrap();
        assert!(xml.contains("<href>next.page</href>"));
        assert!(!xml.contains("<underline>"));
        assert!(!xml.contains("<foreground>"));
    }

    #[test]
    fn background_color_uses_components() {
        let mut document = Document::builder().build();
        document.properties.background = Some(Background::Color {
            color: Rgb::new(1, 2, 3),
        });
        let xml = Encoder::default().write_string(&document, &NoModels).unwrap();
        assert!(xml.contains("<bg_color><Red>1</Red><Green>2</Green><Blue>3</Blue></bg_color>"));
    }

    #[test]
    fn indent_is_configurable() {
        let encoder = Encoder::new(EncoderConfig {
            indent: Some(2),
            ..EncoderConfig::default()
        });
        let xml = encoder
            .write_string(&Document::builder().build(), &NoModels)
            .unwrap();
        assert!(xml.contains("\n  <text>"));
    }

    #[test]
    fn failed_write_leaves_no_partial_page() {
        let dir = tempfile::TempDir::new().unwrap();
        let occupied = dir.path().join("page.page");
        std::fs::create_dir(&occupied).unwrap();

        let document = Document::builder().build();
        assert!(Encoder::default().write(&document, &NoModels, &occupied).is_err());
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("page.page")]);
    }

    #[test]
    fn rewrite_replaces_the_page_in_place() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("page.page");
        std::fs::write(&path, "old contents").unwrap();

        let mut builder = Document::builder();
        builder.push_text("fresh", AttributeBag::new());
        Encoder::default()
            .write(&builder.build(), &NoModels, &path)
            .unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.contains("<text>fresh</text>"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn same_named_resources_from_different_folders_are_kept_apart() {
        let dir = tempfile::TempDir::new().unwrap();
        for (folder, bytes) in [("a", b"first"), ("b", b"other")] {
            std::fs::create_dir(dir.path().join(folder)).unwrap();
            std::fs::write(dir.path().join(folder).join("logo.png"), bytes).unwrap();
        }
        let mut builder = Document::builder();
        for reference in ["a/logo.png", "b/logo.png", "a/logo.png"] {
            builder.push_icon(Icon::image(reference), AttributeBag::new());
        }
        let mut document = builder.build();
        document.base = Some(Location::File(dir.path().join("source.page")));

        let out = dir.path().join("out");
        let report = Encoder::default()
            .write(&document, &NoModels, &out.join("copy.page"))
            .unwrap();

        assert!(report.is_complete(), "{:?}", report.issues);
        assert_eq!(report.copied_resources, 2);
        assert_eq!(std::fs::read(out.join("logo.png")).unwrap(), b"first");
        assert_eq!(std::fs::read(out.join("logo-2.png")).unwrap(), b"other");
        let xml = std::fs::read_to_string(out.join("copy.page")).unwrap();
        assert_eq!(xml.matches("<resource>logo.png</resource>").count(), 2);
        assert_eq!(xml.matches("<resource>logo-2.png</resource>").count(), 1);
    }
}
