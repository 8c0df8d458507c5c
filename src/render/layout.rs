//! Text budgeting.
//!
//! Rows are built from colored [`Segment`]s. A segment is the unit of
//! truncation: it is either placed whole, cut short within its own color,
//! or dropped. Two segments never share a cut.

use super::palette::Rgb;

/// A run of text in one color.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub text: String,
    pub color: Rgb,
}

impl Segment {
    pub fn new(text: impl Into<String>, color: Rgb) -> Self {
        Self {
            text: text.into(),
            color,
        }
    }

    pub fn width(&self) -> usize {
        self.text.chars().count()
    }
}

/// A row of segments separated by single spaces.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextRow {
    pub segments: Vec<Segment>,
}

impl TextRow {
    pub fn single(segment: Segment) -> Self {
        if segment.text.is_empty() {
            return Self::default();
        }
        Self {
            segments: vec![segment],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Width in characters, separators included.
    pub fn width(&self) -> usize {
        let chars: usize = self.segments.iter().map(Segment::width).sum();
        chars + self.segments.len().saturating_sub(1)
    }

    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Each drawn character with its color, separators in black.
    pub fn cells(&self) -> Vec<(char, Rgb)> {
        let mut cells = Vec::with_capacity(self.width());
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                cells.push((' ', Rgb::BLACK));
            }
            cells.extend(segment.text.chars().map(|c| (c, segment.color)));
        }
        cells
    }
}

/// Cut `text` to at most `budget` characters. No ellipsis.
pub fn truncate(text: &str, budget: usize) -> String {
    text.chars().take(budget).collect()
}

/// A one-segment row cut to the budget.
pub fn fit_row(text: &str, color: Rgb, budget: usize) -> TextRow {
    TextRow::single(Segment::new(truncate(text.trim(), budget), color))
}

/// Flow whole fields onto at most `max_rows` rows of `budget` characters.
///
/// Fields are placed in order. A field that does not fit on the current row
/// starts the next one; once rows run out, that field and every later one is
/// dropped. A field wider than a whole row is cut within its own color and
/// gets a row to itself.
pub fn flow_fields(fields: Vec<Segment>, budget: usize, max_rows: usize) -> Vec<TextRow> {
    let mut rows: Vec<TextRow> = Vec::new();
    if budget == 0 || max_rows == 0 {
        return rows;
    }

    for mut field in fields {
        let needs_new_row = match rows.last() {
            None => true,
            Some(row) => row.width() + 1 + field.width() > budget,
        };
        if needs_new_row {
            if rows.len() == max_rows {
                break;
            }
            rows.push(TextRow::default());
        }

        if field.width() > budget {
            field.text = truncate(&field.text, budget);
        }
        if let Some(row) = rows.last_mut() {
            row.segments.push(field);
        }
    }
    rows
}
