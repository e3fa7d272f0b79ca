//! Document, paragraph and run types.

use std::fmt;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attributes::{Attachment, AttributeBag, ParagraphAttributes};
use crate::builder::DocumentBuilder;
use crate::color::Rgb;
use crate::component::{Component, ComponentId};
use crate::error::{ModelError, Result};
use crate::partition::{self, CharOffsets};
use crate::resource::{Location, ResourceRef};

/// A contiguous text span carrying one attribute bag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub start: usize,
    pub end: usize,
    pub attributes: AttributeBag,
}

impl Run {
    #[must_use]
    pub fn new(start: usize, end: usize, attributes: AttributeBag) -> Self {
        Self {
            start,
            end,
            attributes,
        }
    }

    /// A run with every attribute at its default.
    #[must_use]
    pub fn plain(start: usize, end: usize) -> Self {
        Self::new(start, end, AttributeBag::default())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub start: usize,
    pub end: usize,
    pub attributes: ParagraphAttributes,
    pub runs: Vec<Run>,
}

impl Paragraph {
    /// A default paragraph covered by one plain run.
    #[must_use]
    pub fn plain(start: usize, end: usize) -> Self {
        Self {
            start,
            end,
            attributes: ParagraphAttributes::default(),
            runs: vec![Run::plain(start, end)],
        }
    }
}

/// Page background fill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Background {
    Color {
        color: Rgb,
    },
    Image {
        resource: ResourceRef,
    },
    Gradient {
        from: Rgb,
        to: Rgb,
        style: i32,
        variant: i32,
    },
    Pattern {
        foreground: Rgb,
        background: Rgb,
        style: i32,
        width: i32,
        height: i32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundSound {
    pub resource: ResourceRef,
    pub looping: bool,
}

/// Page-level settings written before the text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentProperties {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Declared character set; `None` means UTF-8.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background: Option<Background>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sound: Option<BackgroundSound>,
}

/// Character offsets of the text, built on first use. Never part of equality.
#[derive(Clone, Default)]
struct CharIndex(OnceLock<CharOffsets>);

impl PartialEq for CharIndex {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl fmt::Debug for CharIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CharIndex")
            .field(&self.0.get().is_some())
            .finish()
    }
}

/// A styled-text document with embedded components.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    text: String,
    #[serde(skip)]
    index: CharIndex,
    pub paragraphs: Vec<Paragraph>,
    pub components: Vec<Component>,
    pub properties: DocumentProperties,
    /// Where the document was loaded from; resources resolve against its parent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base: Option<Location>,
}

impl Document {
    #[must_use]
    pub fn builder() -> DocumentBuilder {
        DocumentBuilder::new()
    }

    /// Assemble a document from decoded parts without validating it.
    #[must_use]
    pub fn from_parts(
        text: String,
        paragraphs: Vec<Paragraph>,
        components: Vec<Component>,
        properties: DocumentProperties,
    ) -> Self {
        let index = CharIndex(OnceLock::from(CharOffsets::new(&text)));
        Self {
            text,
            index,
            paragraphs,
            components,
            properties,
            base: None,
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Deserialized documents build the offsets on first use.
    fn offsets(&self) -> &CharOffsets {
        self.index.0.get_or_init(|| CharOffsets::new(&self.text))
    }

    /// Length of the text buffer in characters.
    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.offsets().len_chars()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[must_use]
    pub fn run_text(&self, run: &Run) -> &str {
        self.offsets().slice(&self.text, run.start, run.end)
    }

    #[must_use]
    pub fn paragraph_text(&self, paragraph: &Paragraph) -> &str {
        self.offsets().slice(&self.text, paragraph.start, paragraph.end)
    }

    pub fn runs(&self) -> impl Iterator<Item = &Run> {
        self.paragraphs.iter().flat_map(|paragraph| &paragraph.runs)
    }

    #[must_use]
    pub fn component(&self, id: ComponentId) -> Option<&Component> {
        self.components.get(id.0)
    }

    pub fn component_mut(&mut self, id: ComponentId) -> Option<&mut Component> {
        self.components.get_mut(id.0)
    }

    /// Ids and components in table order.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component)> {
        self.components
            .iter()
            .enumerate()
            .map(|(index, component)| (ComponentId(index), component))
    }

    /// Number of model-bearing components.
    #[must_use]
    pub fn model_count(&self) -> usize {
        self.components
            .iter()
            .filter(|component| component.hosted_model().is_some())
            .count()
    }

    /// Drop every component and the runs' references to them.
    ///
    /// Runs keep their spans so the text layout is unchanged.
    pub fn detach_components(&mut self) {
        let removed = self.components.len();
        self.components.clear();
        for paragraph in &mut self.paragraphs {
            for run in &mut paragraph.runs {
                if run.attributes.component().is_some() {
                    run.attributes.attachment = None;
                }
            }
        }
        debug!(removed, "detached components");
    }

    /// Drop components no run refers to and renumber the rest.
    ///
    /// Returns the new id for every old id, `None` where the component was
    /// dropped. Runs pointing at ids outside the table lose their attachment.
    pub fn prune_components(&mut self) -> Vec<Option<ComponentId>> {
        let mut referenced = vec![false; self.components.len()];
        for id in self.runs().filter_map(|run| run.attributes.component()) {
            if let Some(flag) = referenced.get_mut(id.0) {
                *flag = true;
            }
        }
        let mut next = 0;
        let remap: Vec<Option<ComponentId>> = referenced
            .iter()
            .map(|&keep| {
                keep.then(|| {
                    next += 1;
                    ComponentId(next - 1)
                })
            })
            .collect();

        let components = std::mem::take(&mut self.components);
        self.components = components
            .into_iter()
            .zip(&referenced)
            .filter_map(|(component, &keep)| keep.then_some(component))
            .collect();
        for run in self.paragraphs.iter_mut().flat_map(|paragraph| &mut paragraph.runs) {
            if let Some(Attachment::Component(id)) = run.attributes.attachment {
                run.attributes.attachment = remap
                    .get(id.0)
                    .copied()
                    .flatten()
                    .map(Attachment::Component);
            }
        }
        let removed = referenced.len() - self.components.len();
        if removed > 0 {
            debug!(removed, "pruned unreferenced components");
        }
        remap
    }

    /// Verify that paragraphs partition the text and runs partition each paragraph.
    ///
    /// # Errors
    ///
    /// Returns the first gap, overlap, empty span, out-of-range span or dangling
    /// component reference found.
    pub fn check_partition(&self) -> Result<()> {
        partition::check(self)?;
        for run in self.runs() {
            if let Some(id) = run.attributes.component() {
                if id.0 >= self.components.len() {
                    return Err(ModelError::UnknownComponent(id.0));
                }
            }
        }
        Ok(())
    }

    /// Repair the partition after spans were skipped or clipped.
    ///
    /// Spans are clamped to the text, overlaps and empty spans dropped, and gaps
    /// filled with default paragraphs (split at line breaks) or default runs.
    pub fn normalize_partition(&mut self) {
        let len = self.len_chars();
        let paragraphs = std::mem::take(&mut self.paragraphs);
        self.paragraphs = partition::normalize(&self.text, len, paragraphs);
    }
}
