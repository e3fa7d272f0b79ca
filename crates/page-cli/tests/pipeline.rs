//! Integration tests for the load and convert pipeline.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ProgressBar;
use page_cli::pipeline::{PageSummary, convert_page, load_config, load_page};
use page_codec::{Encoder, EncoderConfig, NoModels, PageConfig};
use page_model::component::{ModelCanvasSpec, SliderSpec};
use page_model::{
    AttributeBag, Component, Document, DocumentProperties, Icon, ModelBinding, ModelKind,
};
use tempfile::TempDir;

/// A page with a logo, a model and a slider bound to it.
fn write_page(dir: &Path) -> PathBuf {
    fs::write(dir.join("logo.gif"), b"GIF89a\x02\x00\x03\x00").unwrap();
    fs::write(dir.join("page$0.mml"), b"state").unwrap();

    let mut builder = Document::builder().with_properties(DocumentProperties {
        title: Some("Gas laws".into()),
        ..DocumentProperties::default()
    });
    builder.push_text("Pressure\n", AttributeBag::new().with_bold(true));
    builder.push_icon(Icon::image("logo.gif"), AttributeBag::new());
    let mut canvas = ModelCanvasSpec::new(ModelKind::Atomic);
    canvas.state = Some("page$0.mml".into());
    builder.push_component(Component::ModelCanvas(canvas), AttributeBag::new());
    builder.push_component(
        Component::Slider(SliderSpec {
            property: Some("pressure".into()),
            binding: ModelBinding::to(0),
            ..SliderSpec::default()
        }),
        AttributeBag::new(),
    );
    let document = builder.build();

    let path = dir.join("page.page");
    let encoder = Encoder::new(EncoderConfig {
        copy_resources: false,
        ..EncoderConfig::default()
    });
    let mut file = fs::File::create(&path).unwrap();
    encoder.write_to(&document, &NoModels, &mut file).unwrap();
    path
}

#[test]
fn load_page_summarizes_the_document() {
    let dir = TempDir::new().unwrap();
    let path = write_page(dir.path());

    let loaded = load_page(&path, &PageConfig::default(), &ProgressBar::hidden()).unwrap();
    let summary = loaded.with_document(PageSummary::of).unwrap();

    assert_eq!(summary.title.as_deref(), Some("Gas laws"));
    assert_eq!(summary.paragraphs, 2);
    assert_eq!(summary.icons, 1);
    assert_eq!(summary.models, 1);
    let listing = summary
        .components
        .iter()
        .map(|(type_name, count)| format!("{type_name}: {count}"))
        .collect::<Vec<_>>()
        .join("\n");
    insta::assert_snapshot!(listing, @r"
    page.model.AtomContainer: 1
    page.widget.Slider: 1
    ");

    assert_eq!(loaded.report.fetched, 2);
    assert!(loaded.report.fetch_issues.is_empty());
    // Stored models expose no hooks, so the slider stays unresolved.
    assert_eq!(loaded.report.wiring.unresolved.len(), 1);
    assert_eq!(loaded.host.pages_loaded(), 1);
    assert_eq!(loaded.host.models().len(), 1);
}

#[test]
fn convert_copies_resources_and_model_state() {
    let dir = TempDir::new().unwrap();
    let path = write_page(dir.path());
    let output = dir.path().join("out").join("copy.page");

    let (_, report) = convert_page(
        &path,
        &output,
        &PageConfig::default(),
        &ProgressBar::hidden(),
    )
    .unwrap();

    assert!(report.is_complete(), "{:?}", report.issues);
    assert_eq!(report.model_files, 1);
    assert_eq!(report.copied_resources, 1);
    let out = dir.path().join("out");
    assert_eq!(fs::read(out.join("copy$0.mml")).unwrap(), b"state");
    assert!(out.join("logo.gif").exists());

    let reloaded = load_page(&output, &PageConfig::default(), &ProgressBar::hidden()).unwrap();
    assert!(reloaded.report.fetch_issues.is_empty());
}

#[test]
fn missing_page_is_an_error_with_context() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("absent.page");
    let error = load_page(&path, &PageConfig::default(), &ProgressBar::hidden()).unwrap_err();
    assert!(error.to_string().starts_with("load "));
}

#[test]
fn config_file_is_optional() {
    assert_eq!(load_config(None).unwrap(), PageConfig::default());

    let dir = TempDir::new().unwrap();
    let path = dir.path().join("page.json");
    fs::write(&path, r#"{ "encoder": { "indent": 2 } }"#).unwrap();
    let config = load_config(Some(&path)).unwrap();
    assert_eq!(config.encoder.indent, Some(2));
    assert!(config.encoder.copy_resources);

    fs::write(&path, "{ not json").unwrap();
    assert!(load_config(Some(&path)).is_err());
}
