//! Incremental document construction.

use crate::attributes::{AttributeBag, Attachment, ParagraphAttributes};
use crate::component::{Component, ComponentId};
use crate::defaults::EMBED_CHAR;
use crate::document::{Document, DocumentProperties, Paragraph, Run};
use crate::icon::Icon;

/// Appends styled text, icons and components, closing a paragraph after every
/// line break.
///
/// ```
/// use page_model::{AttributeBag, Document, ParagraphAttributes};
///
/// let mut builder = Document::builder();
/// builder.push_text("Title", AttributeBag::new().with_bold(true));
/// builder.end_paragraph(ParagraphAttributes::centered());
/// builder.push_text("Body", AttributeBag::new());
/// let document = builder.build();
/// assert_eq!(document.text(), "Title\nBody");
/// assert_eq!(document.paragraphs.len(), 2);
/// assert!(document.check_partition().is_ok());
/// ```
#[derive(Debug, Default)]
pub struct DocumentBuilder {
    text: String,
    len: usize,
    paragraph_start: usize,
    runs: Vec<Run>,
    paragraphs: Vec<Paragraph>,
    components: Vec<Component>,
    models: usize,
    properties: DocumentProperties,
}

impl DocumentBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_properties(mut self, properties: DocumentProperties) -> Self {
        self.properties = properties;
        self
    }

    pub fn push_text(&mut self, text: &str, attributes: AttributeBag) -> &mut Self {
        for line in text.split_inclusive('\n') {
            self.push_span(line, attributes.clone());
            if line.ends_with('\n') {
                self.finish_paragraph(ParagraphAttributes::default());
            }
        }
        self
    }

    pub fn push_icon(&mut self, icon: Icon, attributes: AttributeBag) -> &mut Self {
        let attributes = AttributeBag {
            attachment: Some(Attachment::Icon(icon)),
            ..attributes
        };
        self.push_embed(attributes);
        self
    }

    /// Append a component; model-bearing components get the next model index.
    pub fn push_component(&mut self, mut component: Component, attributes: AttributeBag) -> ComponentId {
        if component.hosted_model().is_some() {
            component.set_model_index(self.models);
            self.models += 1;
        }
        let id = ComponentId(self.components.len());
        self.components.push(component);
        let attributes = AttributeBag {
            attachment: Some(Attachment::Component(id)),
            ..attributes
        };
        self.push_embed(attributes);
        id
    }

    /// Terminate the current paragraph with a line break.
    pub fn end_paragraph(&mut self, attributes: ParagraphAttributes) -> &mut Self {
        self.push_span("\n", AttributeBag::default());
        self.finish_paragraph(attributes);
        self
    }

    #[must_use]
    pub fn build(mut self) -> Document {
        if self.len > self.paragraph_start {
            self.finish_paragraph(ParagraphAttributes::default());
        }
        Document::from_parts(self.text, self.paragraphs, self.components, self.properties)
    }

    fn push_embed(&mut self, attributes: AttributeBag) {
        let mut slot = [0; 4];
        self.push_span(EMBED_CHAR.encode_utf8(&mut slot), attributes);
    }

    fn push_span(&mut self, text: &str, attributes: AttributeBag) {
        let chars = text.chars().count();
        if chars == 0 {
            return;
        }
        let start = self.len;
        self.text.push_str(text);
        self.len += chars;
        self.runs.push(Run::new(start, self.len, attributes));
    }

    fn finish_paragraph(&mut self, attributes: ParagraphAttributes) {
        self.paragraphs.push(Paragraph {
            start: self.paragraph_start,
            end: self.len,
            attributes,
            runs: std::mem::take(&mut self.runs),
        });
        self.paragraph_start = self.len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{ModelCanvasSpec, ModelKind, SliderSpec};

    #[test]
    fn line_breaks_close_paragraphs() {
        let mut builder = DocumentBuilder::new();
        builder.push_text("one\ntwo\n", AttributeBag::new());
        let document = builder.build();
        let spans: Vec<_> = document.paragraphs.iter().map(|p| (p.start, p.end)).collect();
        assert_eq!(spans, vec![(0, 4), (4, 8)]);
        assert!(document.check_partition().is_ok());
    }

    #[test]
    fn components_occupy_one_character() {
        let mut builder = DocumentBuilder::new();
        builder.push_text("a", AttributeBag::new());
        let id = builder.push_component(
            Component::Slider(SliderSpec::default()),
            AttributeBag::new(),
        );
        let document = builder.build();
        assert_eq!(document.len_chars(), 2);
        let run = document.runs().last().unwrap();
        assert_eq!(run.attributes.component(), Some(id));
        assert_eq!(document.run_text(run), "\u{FFFC}");
    }

    #[test]
    fn model_indices_follow_document_order() {
        let mut builder = DocumentBuilder::new();
        builder.push_component(
            Component::ModelCanvas(ModelCanvasSpec::new(ModelKind::Atomic)),
            AttributeBag::new(),
        );
        builder.push_component(
            Component::ModelCanvas(ModelCanvasSpec::new(ModelKind::Chemical)),
            AttributeBag::new(),
        );
        let document = builder.build();
        let indices: Vec<_> = document
            .components
            .iter()
            .filter_map(|c| c.hosted_model().map(|(index, _)| index))
            .collect();
        assert_eq!(indices, vec![0, 1]);
        assert_eq!(document.model_count(), 2);
    }
}
