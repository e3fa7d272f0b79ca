//! Text, question and table components.

use serde::{Deserialize, Serialize};

use super::Frame;
use crate::color::Rgb;
use crate::resource::ResourceRef;

/// Single-line and multi-line answer fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextEntrySpec {
    /// Question shown above the field.
    pub question: Option<String>,
    /// Initial text.
    pub text: Option<String>,
    /// Reference answer.
    pub answer: Option<String>,
    pub tooltip: Option<String>,
    pub frame: Frame,
}

/// Rich text box embedded in the page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextBoxSpec {
    pub content: Option<String>,
    pub foreground: Option<Rgb>,
    pub frame: Frame,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MultipleChoiceSpec {
    pub question: Option<String>,
    pub choices: Vec<String>,
    /// Indices of the correct choices.
    pub answer: Vec<usize>,
    pub multiple: Option<bool>,
    pub submit: Option<bool>,
    pub frame: Frame,
}

impl MultipleChoiceSpec {
    /// Parse a whitespace separated list of choice indices.
    #[must_use]
    pub fn parse_answer(text: &str) -> Vec<usize> {
        text.split_whitespace()
            .filter_map(|index| index.parse().ok())
            .collect()
    }

    #[must_use]
    pub fn format_answer(answer: &[usize]) -> String {
        answer
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Question answered by pasting an image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageQuestionSpec {
    pub question: Option<String>,
    /// Illustration shown with the question.
    pub image: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub image_missing: bool,
    pub frame: Frame,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub rows: Option<i32>,
    pub columns: Option<i32>,
    /// Row-major cell values.
    pub cells: Vec<Vec<String>>,
    pub header: Option<bool>,
    pub grid: Option<bool>,
    pub grid_color: Option<Rgb>,
    pub editable: Option<bool>,
    pub frame: Frame,
}

impl TableSpec {
    /// Lay out cells accumulated one by one into rows of `columns` cells.
    ///
    /// A missing or non-positive column count puts every cell on one row. The
    /// last row is padded with empty cells.
    #[must_use]
    pub fn grid_from_flat(flat: Vec<String>, columns: Option<i32>) -> Vec<Vec<String>> {
        let width = columns
            .and_then(|c| usize::try_from(c).ok())
            .filter(|c| *c > 0)
            .unwrap_or(flat.len().max(1));
        let mut rows: Vec<Vec<String>> = Vec::new();
        for cell in flat {
            match rows.last_mut() {
                Some(row) if row.len() < width => row.push(cell),
                _ => rows.push(vec![cell]),
            }
        }
        if let Some(row) = rows.last_mut() {
            row.resize(width, String::new());
        }
        rows
    }

    pub fn flat_cells(&self) -> impl Iterator<Item = &str> {
        self.cells.iter().flatten().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_from_flat_pads_last_row() {
        let cells = ["a", "b", "c", "d", "e"].map(String::from).to_vec();
        let grid = TableSpec::grid_from_flat(cells, Some(2));
        assert_eq!(grid.len(), 3);
        assert_eq!(grid[2], vec!["e".to_string(), String::new()]);
    }

    #[test]
    fn grid_without_columns_is_one_row() {
        let cells = ["a", "b"].map(String::from).to_vec();
        assert_eq!(TableSpec::grid_from_flat(cells, None).len(), 1);
    }

    #[test]
    fn answer_list_round_trips() {
        let answer = MultipleChoiceSpec::parse_answer("0 2  x 3");
        assert_eq!(answer, vec![0, 2, 3]);
        assert_eq!(MultipleChoiceSpec::format_answer(&answer), "0 2 3");
    }
}
