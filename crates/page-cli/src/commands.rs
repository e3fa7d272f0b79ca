use std::io::{self, IsTerminal};

use anyhow::{Context, Result};
use page_codec::{ComponentRegistry, PageConfig};
use page_cli::pipeline::{PageSummary, convert_page, load_page, progress_bar};
use page_cli::summary::{components_table, encode_table, issues_table, page_table, registry_table};
use serde_json::json;
use tracing::warn;

use crate::cli::{ConvertArgs, InspectArgs};

/// Returns whether the page loaded without problems.
pub fn run_inspect(args: &InspectArgs, config: &PageConfig) -> Result<bool> {
    let bar = progress_bar(!args.json && io::stderr().is_terminal());
    let loaded = load_page(&args.page, config, &bar)?;
    let summary = loaded.with_document(PageSummary::of)?;
    let report = &loaded.report;
    let clean = report.fetch_issues.is_empty() && report.wiring.unresolved.is_empty();

    if args.json {
        let output = json!({
            "page": args.page.display().to_string(),
            "title": summary.title,
            "characters": summary.characters,
            "paragraphs": summary.paragraphs,
            "icons": summary.icons,
            "models": summary.models,
            "components": summary.components,
            "report": serde_json::to_value(report).context("serialize load report")?,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(clean);
    }

    println!("Page: {}", args.page.display());
    if let Some(title) = &summary.title {
        println!("Title: {title}");
    }
    println!("{}", page_table(&summary, report));
    if !summary.components.is_empty() {
        println!("{}", components_table(&summary));
    }
    if let Some(table) = issues_table(report) {
        println!("{table}");
    }
    Ok(clean)
}

/// Returns whether both the load and the save were complete.
pub fn run_convert(args: &ConvertArgs, config: &PageConfig) -> Result<bool> {
    let mut config = config.clone();
    if args.indent.is_some() {
        config.encoder.indent = args.indent;
    }
    if args.no_copy {
        config.encoder.copy_resources = false;
    }
    let bar = progress_bar(io::stderr().is_terminal());
    let (loaded, report) = convert_page(&args.page, &args.output, &config, &bar)?;

    println!("Written: {}", args.output.display());
    println!("{}", encode_table(&report));
    for issue in &report.issues {
        warn!(%issue, "save incomplete");
        println!("  {issue}");
    }
    if let Some(table) = issues_table(&loaded.report) {
        println!("{table}");
    }
    Ok(report.is_complete() && loaded.report.fetch_issues.is_empty())
}

pub fn run_components() {
    println!("{}", registry_table(&ComponentRegistry::standard()));
}
