//! Tests for page-model types.

use page_model::component::{ButtonSpec, SliderSpec};
use page_model::{
    Attachment, AttributeBag, Component, ComponentId, Document, DocumentProperties, ModelError,
    Paragraph, ParagraphAttributes, Rgb, Run,
};
use proptest::prelude::*;

fn sample_document() -> Document {
    let mut builder = Document::builder();
    builder.push_text("Heading", AttributeBag::new().with_size(18).with_bold(true));
    builder.end_paragraph(ParagraphAttributes::centered());
    builder.push_text("Press ", AttributeBag::new());
    builder.push_component(Component::Button(ButtonSpec::default()), AttributeBag::new());
    builder.push_text(" to run.\nSee ", AttributeBag::new());
    builder.push_text("next page", AttributeBag::new().with_link("next.page"));
    builder.build()
}

#[test]
fn builder_output_is_a_valid_partition() {
    let document = sample_document();
    assert!(document.check_partition().is_ok());
    assert_eq!(document.paragraphs.len(), 3);
    assert_eq!(document.components.len(), 1);
    let last = document.runs().last().unwrap();
    assert_eq!(document.run_text(last), "next page");
    assert_eq!(last.attributes.link.as_ref().unwrap().href, "next.page");
}

#[test]
fn check_reports_gaps_and_overlaps() {
    let text = "abcdef".to_string();
    let gap = Document::from_parts(
        text.clone(),
        vec![Paragraph::plain(0, 2), Paragraph::plain(3, 6)],
        Vec::new(),
        DocumentProperties::default(),
    );
    assert!(matches!(
        gap.check_partition(),
        Err(ModelError::Gap {
            previous_end: 2,
            next_start: 3,
            ..
        })
    ));

    let overlap = Document::from_parts(
        text.clone(),
        vec![Paragraph::plain(0, 4), Paragraph::plain(3, 6)],
        Vec::new(),
        DocumentProperties::default(),
    );
    assert!(matches!(
        overlap.check_partition(),
        Err(ModelError::Overlap { offset: 3, .. })
    ));

    let beyond = Document::from_parts(
        text,
        vec![Paragraph::plain(0, 9)],
        Vec::new(),
        DocumentProperties::default(),
    );
    assert!(matches!(
        beyond.check_partition(),
        Err(ModelError::OffsetOutOfRange { end: 9, .. })
    ));
}

#[test]
fn dangling_component_reference_is_reported() {
    let mut document = sample_document();
    document.components.clear();
    assert_eq!(
        document.check_partition(),
        Err(ModelError::UnknownComponent(0))
    );
    let mut detached = sample_document();
    detached.detach_components();
    assert!(detached.check_partition().is_ok());
    assert!(detached.runs().all(|run| run.attributes.component().is_none()));
}

fn embedded(id: usize) -> AttributeBag {
    AttributeBag {
        attachment: Some(Attachment::Component(ComponentId(id))),
        ..AttributeBag::default()
    }
}

#[test]
fn pruning_drops_components_without_runs() {
    let mut document = Document::from_parts(
        "\u{fffc}\u{fffc}x".to_string(),
        vec![Paragraph {
            runs: vec![Run::new(0, 1, embedded(2)), Run::new(1, 2, embedded(7)), Run::plain(2, 3)],
            ..Paragraph::plain(0, 3)
        }],
        vec![
            Component::Button(ButtonSpec::default()),
            Component::Slider(SliderSpec::default()),
            Component::Slider(SliderSpec {
                value: Some(4.0),
                ..SliderSpec::default()
            }),
        ],
        DocumentProperties::default(),
    );
    let remap = document.prune_components();

    assert_eq!(remap, vec![None, None, Some(ComponentId(0))]);
    assert_eq!(document.components.len(), 1);
    assert!(matches!(
        &document.components[0],
        Component::Slider(slider) if slider.value == Some(4.0)
    ));
    let attached: Vec<_> = document.runs().map(|run| run.attributes.component()).collect();
    assert_eq!(attached, vec![Some(ComponentId(0)), None, None]);
    assert!(document.check_partition().is_ok());
}

#[test]
fn normalize_keeps_styled_runs() {
    let bold = AttributeBag::new().with_bold(true);
    let mut document = Document::from_parts(
        "one\ntwo\nthree".to_string(),
        vec![Paragraph {
            start: 4,
            end: 8,
            attributes: ParagraphAttributes::centered(),
            runs: vec![Run::new(4, 7, bold.clone())],
        }],
        Vec::new(),
        DocumentProperties::default(),
    );
    document.normalize_partition();
    assert!(document.check_partition().is_ok());
    let spans: Vec<_> = document.paragraphs.iter().map(|p| (p.start, p.end)).collect();
    assert_eq!(spans, vec![(0, 4), (4, 8), (8, 13)]);
    assert_eq!(document.paragraphs[1].runs[0].attributes, bold);
    assert_eq!(
        document.paragraphs[1].attributes,
        ParagraphAttributes::centered()
    );
}

#[test]
fn long_multibyte_pages_slice_by_character() {
    let mut builder = Document::builder();
    for index in 0..2_000 {
        builder.push_text(&format!("caf\u{e9} {index}\n"), AttributeBag::new());
    }
    let document = builder.build();
    assert_eq!(document.paragraph_text(&document.paragraphs[1_999]), "caf\u{e9} 1999\n");
    let rebuilt: String = document.runs().map(|run| document.run_text(run)).collect();
    assert_eq!(rebuilt, document.text());

    let restored: Document =
        serde_json::from_str(&serde_json::to_string(&document).unwrap()).unwrap();
    assert_eq!(restored.len_chars(), document.len_chars());
    assert_eq!(restored.run_text(&restored.paragraphs[7].runs[0]), "caf\u{e9} 7\n");
    assert_eq!(restored, document);
}

#[test]
fn color_codecs_agree() {
    let color = Rgb::new(0x12, 0xab, 0xff);
    assert_eq!(Rgb::from_hex(&color.to_hex()), Ok(color));
    assert_eq!(Rgb::from_triple(&color.to_triple()), Ok(color));
    assert!(Rgb::from_hex("zz0000").is_err());
}

#[test]
fn slider_defaults_are_sparse() {
    let slider = SliderSpec::default();
    assert_eq!(slider.minimum, None);
    assert_eq!(slider.maximum, None);
    assert!(slider.labels.is_empty());
}

fn arbitrary_span() -> impl Strategy<Value = (usize, usize)> {
    (0usize..40, 0usize..40)
}

proptest! {
    #[test]
    fn normalize_always_yields_a_partition(
        text in "[a-z\n]{0,30}",
        spans in prop::collection::vec((arbitrary_span(), prop::collection::vec(arbitrary_span(), 0..4)), 0..6),
    ) {
        let paragraphs = spans
            .into_iter()
            .map(|((start, end), runs)| Paragraph {
                start,
                end,
                attributes: ParagraphAttributes::default(),
                runs: runs
                    .into_iter()
                    .map(|(start, end)| Run::new(start, end, AttributeBag::new().with_italic(true)))
                    .collect(),
            })
            .collect();
        let mut document = Document::from_parts(text, paragraphs, Vec::new(), DocumentProperties::default());
        document.normalize_partition();
        prop_assert!(document.check_partition().is_ok());
    }

    #[test]
    fn builder_text_round_trips(lines in prop::collection::vec("[a-zA-Z ]{0,12}", 1..6)) {
        let mut builder = Document::builder();
        for line in &lines {
            builder.push_text(line, AttributeBag::new());
            builder.end_paragraph(ParagraphAttributes::default());
        }
        let document = builder.build();
        prop_assert!(document.check_partition().is_ok());
        let rebuilt: String = document.paragraphs.iter().map(|p| document.paragraph_text(p)).collect();
        prop_assert_eq!(rebuilt, document.text());
        prop_assert_eq!(document.paragraphs.len(), lines.len());
    }
}
