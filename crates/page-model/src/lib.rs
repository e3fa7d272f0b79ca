//! In-memory model of a styled-text page with embedded interactive components.
//!
//! A [`Document`] is a character buffer partitioned into [`Paragraph`]s, each
//! partitioned into [`Run`]s. A run's [`AttributeBag`] may attach an [`Icon`]
//! or point at an entry of the document's [`Component`] table.

pub mod attributes;
pub mod builder;
pub mod color;
pub mod component;
pub mod defaults;
pub mod document;
pub mod error;
pub mod icon;
pub mod links;
mod partition;
pub mod resource;

pub use attributes::{
    Alignment, Attachment, AttributeBag, Hyperlink, ParagraphAttributes, WindowSpec,
};
pub use builder::DocumentBuilder;
pub use color::Rgb;
pub use component::{Component, ComponentId, ComponentKind, Frame, ModelBinding, ModelKind};
pub use defaults::{CHARACTER_DEFAULTS, EMBED_CHAR, LINK_UNVISITED, LINK_VISITED};
pub use document::{Background, BackgroundSound, Document, DocumentProperties, Paragraph, Run};
pub use error::{ModelError, Result};
pub use icon::{BulletKind, Icon, LineIcon, Margins};
pub use links::{LinkKind, ListenerLinks, PendingLink};
pub use resource::{Location, ResourceRef};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_serializes() {
        let mut builder = Document::builder();
        builder.push_text("Hello", AttributeBag::new().with_size(16));
        builder.push_icon(Icon::image("logo.png"), AttributeBag::new());
        let document = builder.build();
        let json = serde_json::to_string(&document).expect("serialize document");
        let round: Document = serde_json::from_str(&json).expect("deserialize document");
        assert_eq!(round.text(), document.text());
        assert_eq!(round.paragraphs, document.paragraphs);
        assert_eq!(round.len_chars(), 6);
    }
}
