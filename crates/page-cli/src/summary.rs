//! Console tables for load and save results.

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use page_codec::{ComponentRegistry, EncodeReport, LoadReport, UnresolvedReason};

use crate::logging::redact_text;
use crate::pipeline::PageSummary;

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

/// Page shape and load counters, one row per figure.
#[must_use]
pub fn page_table(summary: &PageSummary, report: &LoadReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Item"), header_cell("Count")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);

    let stats = &report.stats;
    let rows = [
        ("Characters", summary.characters),
        ("Paragraphs", summary.paragraphs),
        ("Icons", summary.icons),
        ("Components", summary.components.values().sum::<usize>()),
        ("Models", summary.models),
        ("Resources fetched", report.fetched),
        ("Links attached", report.wiring.attached),
    ];
    for (label, count) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(count)]);
    }
    let warnings = [
        ("Placeholders", report.placeholders),
        ("Fetch issues", report.fetch_issues.len()),
        ("Unresolved links", report.wiring.unresolved.len()),
        ("Skipped runs", stats.skipped_runs),
        ("Skipped components", stats.skipped_components),
        ("Stray leaves", stats.stray_leaves),
        ("Malformed leaves", stats.malformed_leaves),
    ];
    for (label, count) in warnings {
        table.add_row(vec![Cell::new(label), count_cell(count, Color::Yellow)]);
    }
    table
}

/// Component count per type name.
#[must_use]
pub fn components_table(summary: &PageSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Component"), header_cell("Count")]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    for (type_name, count) in &summary.components {
        table.add_row(vec![Cell::new(type_name), Cell::new(count)]);
    }
    table
}

/// Fetch failures and unresolved links, or `None` when the load was clean.
#[must_use]
pub fn issues_table(report: &LoadReport) -> Option<Table> {
    if report.fetch_issues.is_empty() && report.wiring.unresolved.is_empty() {
        return None;
    }
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Kind"),
        header_cell("Subject"),
        header_cell("Detail"),
    ]);
    apply_table_style(&mut table);
    for issue in &report.fetch_issues {
        table.add_row(vec![
            Cell::new(format!("{:?}", issue.role)).fg(Color::Yellow),
            Cell::new(&issue.reference),
            Cell::new(&issue.message),
        ]);
    }
    for unresolved in &report.wiring.unresolved {
        let detail = match unresolved.reason {
            UnresolvedReason::NoModel => "model not loaded",
            UnresolvedReason::NoHook => "model has no such hook",
        };
        table.add_row(vec![
            Cell::new(unresolved.link.kind.label()).fg(Color::Yellow),
            Cell::new(format!(
                "model #{} {}",
                unresolved.model,
                redact_text(&unresolved.link.key)
            )),
            Cell::new(detail),
        ]);
    }
    Some(table)
}

/// What a save wrote.
#[must_use]
pub fn encode_table(report: &EncodeReport) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Written"), header_cell("Count")]);
    apply_summary_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    table.add_row(vec![Cell::new("Paragraphs"), Cell::new(report.paragraphs)]);
    table.add_row(vec![Cell::new("Components"), Cell::new(report.components)]);
    table.add_row(vec![
        Cell::new("Resources copied"),
        Cell::new(report.copied_resources),
    ]);
    table.add_row(vec![Cell::new("Model files"), Cell::new(report.model_files)]);
    table.add_row(vec![
        Cell::new("Issues"),
        count_cell(report.issues.len(), Color::Red),
    ]);
    table
}

/// Every type name the registry can build, with the leaves it reads.
#[must_use]
pub fn registry_table(registry: &ComponentRegistry) -> Table {
    let mut table = Table::new();
    table.set_header(vec![header_cell("Type name"), header_cell("Leaves")]);
    apply_table_style(&mut table);
    for builder in registry.builders() {
        let leaves: Vec<&str> = builder.slots.iter().map(|leaf| leaf.name()).collect();
        table.add_row(vec![
            Cell::new(builder.type_name)
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            dim_cell(leaves.join(", ")),
        ]);
    }
    table
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_load_has_no_issue_table() {
        assert!(issues_table(&LoadReport::default()).is_none());
    }

    #[test]
    fn registry_lists_every_builder() {
        let registry = ComponentRegistry::standard();
        let table = registry_table(&registry);
        assert_eq!(table.row_count(), registry.len());
    }
}
