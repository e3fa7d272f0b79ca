//! Encode/decode round trips and the decoder's tolerance rules.

use std::collections::BTreeMap;

use page_codec::{ComponentRegistry, Decoder, DecoderConfig, Encoder, NoModels};
use page_model::component::{
    ComboBoxSpec, DynamicWidget, ModelCanvasSpec, Series, SliderSpec, TableSpec, XyGraphSpec,
};
use page_model::{
    Alignment, AttributeBag, Background, BackgroundSound, BulletKind, Component, Document,
    DocumentProperties, EMBED_CHAR, Frame, Icon, ModelBinding, ModelKind, Paragraph,
    ParagraphAttributes, ResourceRef, Rgb,
};
use proptest::prelude::*;

fn encode(document: &Document) -> String {
    Encoder::default()
        .write_string(document, &NoModels)
        .expect("encode page")
}

fn decode(xml: &str) -> page_codec::DecodedPage {
    Decoder::default().read_str(xml).expect("decode page")
}

/// Paragraphs with every attribute reduced to its non-default part.
fn normalized(paragraphs: &[Paragraph]) -> Vec<Paragraph> {
    paragraphs
        .iter()
        .map(|paragraph| Paragraph {
            attributes: paragraph.attributes.normalized(),
            runs: paragraph
                .runs
                .iter()
                .map(|run| page_model::Run::new(run.start, run.end, run.attributes.normalized()))
                .collect(),
            ..paragraph.clone()
        })
        .collect()
}

fn sample_document() -> Document {
    let properties = DocumentProperties {
        title: Some("Gas laws".to_string()),
        charset: Some("UTF-8".to_string()),
        background: Some(Background::Gradient {
            from: Rgb::new(255, 255, 255),
            to: Rgb::new(200, 220, 255),
            style: 1,
            variant: 2,
        }),
        sound: Some(BackgroundSound {
            resource: ResourceRef::new("hum.wav"),
            looping: true,
        }),
    };
    let mut builder = Document::builder().with_properties(properties);
    builder.push_text("Pressure & volume", AttributeBag::new().with_size(18).with_bold(true));
    builder.end_paragraph(ParagraphAttributes {
        alignment: Some(Alignment::Center),
        space_below: Some(6.5),
        ..ParagraphAttributes::default()
    });
    builder.push_text("Move the piston: ", AttributeBag::new().with_family("Courier"));
    builder.push_component(
        Component::Slider(SliderSpec {
            title: Some("Volume".into()),
            minimum: Some(1.0),
            maximum: Some(10.0),
            value: Some(2.5),
            property: Some("volume".into()),
            binding: ModelBinding::to(0),
            frame: Frame::sized(200, 40),
            ..SliderSpec::default()
        }),
        AttributeBag::new(),
    );
    builder.push_component(
        Component::ModelCanvas(ModelCanvasSpec::new(ModelKind::Atomic)),
        AttributeBag::new(),
    );
    builder.end_paragraph(ParagraphAttributes::default());
    builder.push_icon(Icon::image("diagram.png"), AttributeBag::new());
    builder.push_component(
        Component::Table(TableSpec {
            rows: Some(2),
            columns: Some(2),
            cells: vec![
                vec!["P".into(), "V".into()],
                vec!["1".into(), "10".into()],
            ],
            header: Some(true),
            ..TableSpec::default()
        }),
        AttributeBag::new(),
    );
    builder.push_component(
        Component::XyGraph(XyGraphSpec {
            title: Some("Isotherm".into()),
            x_series: Some("volume".into()),
            series: vec![Series {
                ordinal: 1,
                source: "pressure".into(),
                color: Some(Rgb::new(255, 0, 0)),
                width: Some(1.5),
                ..Series::default()
            }],
            binding: ModelBinding::to(0),
            ..XyGraphSpec::default()
        }),
        AttributeBag::new(),
    );
    builder.push_component(
        Component::ComboBox(ComboBoxSpec {
            items: vec!["Helium".into(), "Argon".into()],
            selected_index: Some(1),
            ..ComboBoxSpec::default()
        }),
        AttributeBag::new(),
    );
    builder.build()
}

#[test]
fn encoded_document_decodes_to_the_same_structure() {
    let document = sample_document();
    let decoded = decode(&encode(&document)).document;

    assert_eq!(decoded.text(), document.text());
    assert_eq!(normalized(&decoded.paragraphs), normalized(&document.paragraphs));
    assert_eq!(decoded.components, document.components);
    assert_eq!(decoded.properties, document.properties);
    assert!(decoded.check_partition().is_ok());
}

#[test]
fn re_encoding_is_stable() {
    let first = encode(&sample_document());
    let second = encode(&decode(&first).document);
    assert_eq!(first, second);
}

#[test]
fn styled_run_reproduces_exactly_its_leaves() {
    let page = r#"<?xml version="1.0" encoding="UTF-8"?><document><text>Hello</text><section start="0" end="5"><paragraph start="0" end="5"><content start="0" end="5"><size>16</size><bold>true</bold></content></paragraph></section></document>"#;
    let decoded = decode(page);
    let runs: Vec<_> = decoded.document.runs().collect();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].attributes.size, Some(16));
    assert_eq!(runs[0].attributes.bold, Some(true));
    assert_eq!(runs[0].attributes.italic, None);

    insta::assert_snapshot!(encode(&decoded.document), @r#"<?xml version="1.0" encoding="UTF-8"?><document><text>Hello</text><section start="0" end="5"><paragraph start="0" end="5"><content start="0" end="5"><size>16</size><bold>true</bold></content></paragraph></section></document>"#);
}

#[test]
fn default_attributes_emit_no_leaves() {
    let mut builder = Document::builder();
    builder.push_text(
        "plain",
        AttributeBag {
            family: Some("Verdana".into()),
            size: Some(12),
            bold: Some(false),
            foreground: Some(Rgb::BLACK),
            ..AttributeBag::default()
        },
    );
    builder.end_paragraph(ParagraphAttributes {
        alignment: Some(Alignment::Left),
        left_indent: Some(0.0),
        ..ParagraphAttributes::default()
    });
    let xml = encode(&builder.build());
    for leaf in ["family", "size", "bold", "foreground", "alignment", "left_indent"] {
        assert!(!xml.contains(&format!("<{leaf}>")), "{leaf} written in {xml}");
    }

    let decoded = decode(&xml).document;
    let run = decoded.runs().next().unwrap();
    assert_eq!(run.attributes.normalized(), AttributeBag::default());
    assert_eq!(run.attributes.effective_size(), 12);
}

#[test]
fn sibling_components_do_not_share_leaves() {
    let text: String = std::iter::repeat_n(EMBED_CHAR, 3).collect();
    let page = format!(
        r#"<document><text>{text}</text><section start="0" end="3"><paragraph start="0" end="3">
<content start="0" end="1"><component><class>page.widget.Slider</class><title>Heat</title><minimum>0</minimum><maximum>100</maximum><tooltip>Drag</tooltip><switch>stray</switch></component></content>
<content start="1" end="2"><component><class>page.widget.Spinner</class><property>volume</property></component></content>
<content start="2" end="3"><component><class>page.widget.CheckBox</class></component></content>
</paragraph></section></document>"#
    );
    let decoded = decode(&page);
    let components = &decoded.document.components;
    assert_eq!(components.len(), 3);

    let Component::Slider(slider) = &components[0] else {
        panic!("expected a slider, got {:?}", components[0]);
    };
    assert_eq!(slider.title.as_deref(), Some("Heat"));
    assert_eq!(slider.maximum, Some(100.0));

    let Component::Spinner(spinner) = &components[1] else {
        panic!("expected a spinner, got {:?}", components[1]);
    };
    assert_eq!(spinner.property.as_deref(), Some("volume"));
    assert_eq!(spinner.title, None);
    assert_eq!(spinner.tooltip, None);
    assert_eq!(spinner.minimum, None);

    let Component::CheckBox(check_box) = &components[2] else {
        panic!("expected a check box, got {:?}", components[2]);
    };
    assert_eq!(check_box.switch, None);
    assert_eq!(check_box.title, None);
    assert_eq!(decoded.stats.stray_leaves, 1);
}

#[test]
fn unknown_leaves_and_classes_are_ignored() {
    let text: String = std::iter::repeat_n(EMBED_CHAR, 2).collect();
    let page = format!(
        r#"<document><sparkle>yes</sparkle><text>{text}</text><section start="0" end="2"><paragraph start="0" end="2">
<content start="0" end="1"><glow>1</glow><bold>true</bold><component><class>page.widget.Hologram</class><title>Hi</title></component></content>
<content start="1" end="2"><component><class>page.widget.Button</class><title>Go</title></component></content>
</paragraph></section></document>"#
    );
    let decoded = decode(&page);
    assert_eq!(decoded.stats.skipped_components, 1);
    assert_eq!(decoded.document.components.len(), 1);

    let runs: Vec<_> = decoded.document.runs().collect();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].attributes.bold, Some(true));
    assert_eq!(runs[0].attributes.attachment, None);
    assert!(matches!(
        decoded.document.component(runs[1].attributes.component().unwrap()),
        Some(Component::Button(button)) if button.title.as_deref() == Some("Go")
    ));
}

#[derive(Debug)]
struct Gauge;

impl DynamicWidget for Gauge {
    fn is_embeddable(&self) -> bool {
        true
    }

    fn properties(&self) -> BTreeMap<String, String> {
        BTreeMap::from([("value".to_string(), "42".to_string())])
    }
}

#[test]
fn registered_unknown_classes_become_dynamic_components() {
    let mut registry = ComponentRegistry::standard();
    registry.register_dynamic("vendor.Gauge", || Box::new(Gauge) as Box<dyn DynamicWidget>);
    let mut decoder = Decoder::new(DecoderConfig::default()).with_registry(registry);

    let page = format!(
        r#"<document><text>{EMBED_CHAR}</text><section start="0" end="1"><paragraph start="0" end="1"><content start="0" end="1"><component><class>vendor.Gauge</class><title>Fuel</title><width>80</width></component></content></paragraph></section></document>"#
    );
    let decoded = decoder.read_str(&page).unwrap();
    let Some(Component::Dynamic(gauge)) = decoded.document.components.first() else {
        panic!("expected a dynamic component");
    };
    assert_eq!(gauge.type_name, "vendor.Gauge");
    assert_eq!(gauge.properties.get("title").map(String::as_str), Some("Fuel"));
    assert_eq!(gauge.properties.get("width").map(String::as_str), Some("80"));
    assert!(gauge.widget.is_some());

    let xml = encode(&decoded.document);
    assert!(xml.contains("<class>vendor.Gauge</class>"));
    assert!(xml.contains("<title>Fuel</title>"));
    assert!(xml.contains("<value>42</value>"));
}

#[test]
fn component_style_does_not_leak_into_the_next_icon() {
    let mut registry = ComponentRegistry::standard();
    registry.register_dynamic("vendor.Gauge", || Box::new(Gauge) as Box<dyn DynamicWidget>);
    let mut decoder = Decoder::new(DecoderConfig::default()).with_registry(registry);

    let text: String = std::iter::repeat_n(EMBED_CHAR, 2).collect();
    let page = format!(
        r#"<document><text>{text}</text><section start="0" end="2"><paragraph start="0" end="2">
<content start="0" end="1"><component><class>vendor.Gauge</class><style>2</style></component></content>
<content start="1" end="2"><icon><class>page.icon.Bullet</class></icon></content>
</paragraph></section></document>"#
    );
    let decoded = decoder.read_str(&page).unwrap();

    let Some(Component::Dynamic(gauge)) = decoded.document.components.first() else {
        panic!("expected a dynamic component");
    };
    assert_eq!(gauge.properties.get("style").map(String::as_str), Some("2"));

    let icons: Vec<_> = decoded
        .document
        .runs()
        .filter_map(|run| run.attributes.icon())
        .collect();
    assert_eq!(icons, vec![&Icon::Bullet { kind: BulletKind::Disc }]);
    assert_eq!(decoded.stats.stray_leaves, 0);

    let xml = encode(&decoded.document);
    assert!(xml.contains("<style>2</style>"), "{xml}");
}

#[test]
fn bad_offsets_are_repaired() {
    let page = r#"<document><text>abc
def</text><section start="0" end="7"><paragraph start="0" end="4"><content start="0" end="2"><italic>true</italic></content><content start="3" end="99"><bold>true</bold></content></paragraph><paragraph start="4" end="7"><content start="5" end="4"/></paragraph></section></document>"#;
    let decoded = decode(page);
    assert_eq!(decoded.stats.skipped_runs, 2);
    assert!(decoded.document.check_partition().is_ok());
    let italic: Vec<_> = decoded
        .document
        .runs()
        .filter(|run| run.attributes.italic == Some(true))
        .map(|run| (run.start, run.end))
        .collect();
    assert_eq!(italic, vec![(0, 2)]);
}

#[test]
fn overlapping_component_run_is_not_kept_or_wired() {
    let text: String = std::iter::repeat_n(EMBED_CHAR, 2).collect();
    let page = format!(
        r#"<document><text>{text}</text><section start="0" end="2"><paragraph start="0" end="2">
<content start="0" end="2"><bold>true</bold></content>
<content start="0" end="1"><component><class>page.widget.Slider</class><property>volume</property><model>0</model></component></content>
</paragraph></section></document>"#
    );
    let decoded = decode(&page);

    assert_eq!(decoded.stats.skipped_runs, 1);
    assert!(decoded.document.components.is_empty());
    assert!(decoded.links.is_empty());
    assert!(decoded.deferred.is_empty());
    assert!(decoded.document.check_partition().is_ok());
    let runs: Vec<_> = decoded.document.runs().collect();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].attributes.bold, Some(true));
}

#[test]
fn components_survive_only_where_runs_point_at_them() {
    let text: String = std::iter::repeat_n(EMBED_CHAR, 2).collect();
    // The second paragraph starts inside the first and is dropped by repair.
    let page = format!(
        r#"<document><text>{text}</text><section start="0" end="2">
<paragraph start="0" end="2"><content start="0" end="2"><component><class>page.widget.Spinner</class><property>volume</property><model>0</model></component></content></paragraph>
<paragraph start="1" end="2"><content start="1" end="2"><component><class>page.widget.Slider</class><property>pressure</property><model>0</model></component></content></paragraph>
</section></document>"#
    );
    let decoded = decode(&page);

    assert_eq!(decoded.document.components.len(), 1);
    assert!(matches!(decoded.document.components[0], Component::Spinner(_)));
    let pending = decoded.links.for_model(0);
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].key, "volume");
    assert_eq!(pending[0].component, page_model::ComponentId(0));
    assert!(decoded.document.check_partition().is_ok());
}

#[test]
fn latin1_page_is_decoded() {
    let mut page = br#"<?xml version="1.0" encoding="ISO-8859-1"?><document><text>caf"#.to_vec();
    page.push(0xE9);
    page.extend_from_slice(br#"</text><section start="0" end="4"><paragraph start="0" end="4"><content start="0" end="4"><family>Caf"#);
    page.push(0xE9);
    page.extend_from_slice(b"</family></content></paragraph></section></document>");

    let decoded = Decoder::default().read_from(page.as_slice(), None).unwrap();
    assert_eq!(decoded.document.text(), "caf\u{e9}");
    let run = decoded.document.runs().next().unwrap();
    assert_eq!(run.attributes.family.as_deref(), Some("Caf\u{e9}"));

    let xml = encode(&decoded.document);
    assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(xml.contains("<text>caf\u{e9}</text>"));
}

#[test]
fn unsupported_encoding_is_rejected() {
    for label in ["x-bogus", "UTF-16"] {
        let page = format!(r#"<?xml version="1.0" encoding="{label}"?><document><text>x</text></document>"#);
        let error = Decoder::default().read_str(&page).unwrap_err();
        assert!(
            matches!(
                error,
                page_codec::CodecError::UnsupportedEncoding { ref name } if name == label
            ),
            "{label}: {error:?}"
        );
    }
}

#[test]
fn truncated_page_is_malformed() {
    let page = r#"<document><text>x</text><section start="0" end="1"><paragraph start="0" end="1">"#;
    let error = Decoder::default().read_str(page).unwrap_err();
    assert!(!error.is_recoverable());
}

// =============================================================================
// PROPERTIES
// =============================================================================

fn attribute_bag() -> impl Strategy<Value = AttributeBag> {
    (
        proptest::option::of(8u32..40),
        proptest::option::of(any::<bool>()),
        proptest::option::of(any::<bool>()),
        proptest::option::of((any::<u8>(), any::<u8>(), any::<u8>())),
    )
        .prop_map(|(size, bold, italic, color)| AttributeBag {
            size,
            bold,
            italic,
            foreground: color.map(|(r, g, b)| Rgb::new(r, g, b)),
            ..AttributeBag::default()
        })
}

fn document() -> impl Strategy<Value = Document> {
    proptest::collection::vec(
        (
            "[a-z &<>]{1,12}",
            attribute_bag(),
            any::<bool>(),
        ),
        1..12,
    )
    .prop_map(|spans| {
        let mut builder = Document::builder();
        for (text, attributes, break_after) in spans {
            builder.push_text(&text, attributes);
            if break_after {
                builder.end_paragraph(ParagraphAttributes::default());
            }
        }
        builder.build()
    })
}

proptest! {
    #[test]
    fn generated_documents_round_trip(document in document()) {
        let decoded = decode(&encode(&document)).document;
        prop_assert_eq!(decoded.text(), document.text());
        prop_assert_eq!(normalized(&decoded.paragraphs), normalized(&document.paragraphs));
        prop_assert!(decoded.check_partition().is_ok());
    }

    #[test]
    fn corrupted_offsets_still_partition(
        document in document(),
        shifts in proptest::collection::vec((0usize..64, 0usize..64), 1..6),
    ) {
        let mut corrupted = document.clone();
        let runs: Vec<(usize, usize)> = corrupted
            .paragraphs
            .iter()
            .enumerate()
            .flat_map(|(p, paragraph)| (0..paragraph.runs.len()).map(move |r| (p, r)))
            .collect();
        for (index, (start, end)) in shifts.into_iter().enumerate() {
            let (p, r) = runs[index % runs.len()];
            let run = &mut corrupted.paragraphs[p].runs[r];
            run.start = start;
            run.end = end;
        }
        let decoded = decode(&encode(&corrupted)).document;
        prop_assert_eq!(decoded.text(), document.text());
        prop_assert!(decoded.check_partition().is_ok());
    }
}
