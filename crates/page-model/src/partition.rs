//! Checking and repairing the paragraph/run partition of a document.

use tracing::debug;

use crate::document::{Document, Paragraph, Run};
use crate::error::{ModelError, Result};

/// Byte offset of every character boundary of a text, end included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CharOffsets(Vec<usize>);

impl CharOffsets {
    pub(crate) fn new(text: &str) -> Self {
        let mut offsets = Vec::with_capacity(text.len() + 1);
        offsets.extend(text.char_indices().map(|(index, _)| index));
        offsets.push(text.len());
        Self(offsets)
    }

    pub(crate) fn len_chars(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// Slice `text` by character offsets, clamping to the end of the string.
    ///
    /// `text` must be the string these offsets were built from.
    pub(crate) fn slice<'a>(&self, text: &'a str, start: usize, end: usize) -> &'a str {
        let byte_at = |offset: usize| self.0.get(offset).copied().unwrap_or(text.len());
        let begin = byte_at(start);
        let finish = byte_at(end.max(start));
        &text[begin..finish]
    }
}

pub(crate) fn check(document: &Document) -> Result<()> {
    let len = document.len_chars();
    let mut cursor = 0;
    for (index, paragraph) in document.paragraphs.iter().enumerate() {
        let scope = "document";
        check_span(scope, cursor, paragraph.start, paragraph.end, len)?;
        let scope = format!("paragraph {index}");
        let mut run_cursor = paragraph.start;
        for run in &paragraph.runs {
            check_span(&scope, run_cursor, run.start, run.end, paragraph.end)?;
            run_cursor = run.end;
        }
        if run_cursor != paragraph.end {
            return Err(ModelError::Gap {
                scope,
                previous_end: run_cursor,
                next_start: paragraph.end,
            });
        }
        cursor = paragraph.end;
    }
    if cursor != len {
        return Err(ModelError::Gap {
            scope: "document".to_string(),
            previous_end: cursor,
            next_start: len,
        });
    }
    Ok(())
}

fn check_span(scope: &str, cursor: usize, start: usize, end: usize, limit: usize) -> Result<()> {
    if start >= end {
        return Err(ModelError::EmptySpan {
            scope: scope.to_string(),
            start,
            end,
        });
    }
    if end > limit {
        return Err(ModelError::OffsetOutOfRange {
            start,
            end,
            len: limit,
        });
    }
    if start > cursor {
        return Err(ModelError::Gap {
            scope: scope.to_string(),
            previous_end: cursor,
            next_start: start,
        });
    }
    if start < cursor {
        return Err(ModelError::Overlap {
            scope: scope.to_string(),
            offset: start,
        });
    }
    Ok(())
}

/// Rebuild a valid paragraph partition of `[0, len)` from possibly broken input.
pub(crate) fn normalize(text: &str, len: usize, mut paragraphs: Vec<Paragraph>) -> Vec<Paragraph> {
    let breaks: Vec<usize> = text
        .chars()
        .enumerate()
        .filter_map(|(offset, ch)| (ch == '\n').then_some(offset))
        .collect();
    paragraphs.sort_by_key(|paragraph| paragraph.start);

    let mut repaired = Vec::with_capacity(paragraphs.len());
    let mut cursor = 0;
    for mut paragraph in paragraphs {
        let start = paragraph.start.max(cursor);
        let end = paragraph.end.min(len);
        if end <= start {
            debug!(
                start = paragraph.start,
                end = paragraph.end,
                "dropped empty or overlapping paragraph"
            );
            continue;
        }
        if start > cursor {
            fill_paragraphs(&mut repaired, &breaks, cursor, start);
        }
        paragraph.runs = normalize_runs(std::mem::take(&mut paragraph.runs), start, end);
        paragraph.start = start;
        paragraph.end = end;
        repaired.push(paragraph);
        cursor = end;
    }
    if cursor < len {
        fill_paragraphs(&mut repaired, &breaks, cursor, len);
    }
    repaired
}

/// Cover `[start, end)` with default paragraphs ending after each line break.
fn fill_paragraphs(out: &mut Vec<Paragraph>, breaks: &[usize], start: usize, end: usize) {
    let mut cursor = start;
    for &offset in breaks.iter().filter(|&&offset| offset >= start && offset < end) {
        out.push(Paragraph::plain(cursor, offset + 1));
        cursor = offset + 1;
    }
    if cursor < end {
        out.push(Paragraph::plain(cursor, end));
    }
}

fn normalize_runs(mut runs: Vec<Run>, start: usize, end: usize) -> Vec<Run> {
    runs.sort_by_key(|run| run.start);
    let mut repaired = Vec::with_capacity(runs.len());
    let mut cursor = start;
    for mut run in runs {
        let run_start = run.start.max(cursor);
        let run_end = run.end.min(end);
        if run_end <= run_start {
            debug!(start = run.start, end = run.end, "dropped empty or overlapping run");
            continue;
        }
        if run_start > cursor {
            repaired.push(Run::plain(cursor, run_start));
        }
        run.start = run_start;
        run.end = run_end;
        repaired.push(run);
        cursor = run_end;
    }
    if cursor < end {
        repaired.push(Run::plain(cursor, end));
    }
    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::AttributeBag;

    fn slice(text: &str, start: usize, end: usize) -> &str {
        CharOffsets::new(text).slice(text, start, end)
    }

    #[test]
    fn slices_count_characters() {
        assert_eq!(slice("h\u{e9}llo", 1, 3), "\u{e9}l");
        assert_eq!(slice("abc", 2, 10), "c");
        assert_eq!(slice("abc", 5, 7), "");
        assert_eq!(slice("", 0, 1), "");
        assert_eq!(slice("\u{fffc}x\u{1f600}", 2, 3), "\u{1f600}");
    }

    #[test]
    fn offsets_track_multibyte_characters() {
        let offsets = CharOffsets::new("a\u{e9}\u{fffc}b");
        assert_eq!(offsets.0, vec![0, 1, 3, 6, 7]);
        assert_eq!(offsets.len_chars(), 4);
        assert_eq!(CharOffsets::new("").len_chars(), 0);
    }

    #[test]
    fn gaps_between_runs_get_default_runs() {
        let bold = AttributeBag::new().with_bold(true);
        let runs = vec![Run::new(2, 4, bold.clone())];
        let repaired = normalize_runs(runs, 0, 6);
        assert_eq!(
            repaired,
            vec![Run::plain(0, 2), Run::new(2, 4, bold), Run::plain(4, 6)]
        );
    }

    #[test]
    fn overlapping_runs_are_clipped() {
        let runs = vec![Run::plain(0, 4), Run::plain(2, 6), Run::plain(3, 4)];
        let repaired = normalize_runs(runs, 0, 6);
        let spans: Vec<_> = repaired.iter().map(|r| (r.start, r.end)).collect();
        assert_eq!(spans, vec![(0, 4), (4, 6)]);
    }

    #[test]
    fn missing_paragraphs_follow_line_breaks() {
        let text = "ab\ncd\nef";
        let repaired = normalize(text, 8, Vec::new());
        let spans: Vec<_> = repaired.iter().map(|p| (p.start, p.end)).collect();
        assert_eq!(spans, vec![(0, 3), (3, 6), (6, 8)]);
    }

    #[test]
    fn spans_past_the_buffer_are_clamped() {
        let paragraph = Paragraph {
            runs: vec![Run::plain(0, 40)],
            ..Paragraph::plain(0, 40)
        };
        let repaired = normalize("four", 4, vec![paragraph]);
        assert_eq!(repaired.len(), 1);
        assert_eq!((repaired[0].start, repaired[0].end), (0, 4));
        assert_eq!((repaired[0].runs[0].start, repaired[0].runs[0].end), (0, 4));
    }
}
