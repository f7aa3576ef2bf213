//! Key/value table detection from text positions.
//!
//! Presentation sheets lay their facts out as a label column followed by one
//! or more value columns, with no ruling lines. Tables are found by grouping
//! spans into rows by baseline and looking for left edges that line up
//! across rows.

use std::collections::{HashMap, HashSet};

use super::spans::TextSpan;

/// Width of the buckets left edges are snapped to (points).
const EDGE_BUCKET: f32 = 5.0;

/// How far a span may sit from a column edge and still count as aligned.
const ALIGN_TOLERANCE: f32 = 5.0;

/// One label/value region of a page.
#[derive(Debug, Clone)]
pub struct DetectedTable {
    /// Baseline of the first row (PDF coordinates, so the largest Y)
    pub top_y: f32,
    /// Baseline of the last row
    pub bottom_y: f32,
    /// Right-most text edge
    pub right_x: f32,
    /// Column left edges, ascending
    pub columns: Vec<f32>,
    /// Rows top to bottom
    pub rows: Vec<TableRowData>,
}

/// Spans sharing a baseline.
#[derive(Debug, Clone)]
pub struct TableRowData {
    /// Mean baseline of the row's spans
    pub y: f32,
    /// Left to right
    pub spans: Vec<TextSpan>,
}

/// Thresholds for [`TableDetector`].
#[derive(Debug, Clone, PartialEq)]
pub struct TableDetectorConfig {
    /// Fewer aligned rows than this is not a table
    pub min_rows: usize,
    /// A label column plus at least one value column
    pub min_columns: usize,
    /// More columns than this usually means justified prose split per word
    pub max_columns: usize,
    /// Baseline distance, as a fraction of the font size, still counted as one row
    pub y_tolerance_factor: f32,
    /// Share of rows that must hit a column edge, and of spans in a row that must sit on one
    pub min_alignment_ratio: f32,
    /// Column edges closer than this (points) are merged
    pub min_column_gap: f32,
}

impl Default for TableDetectorConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            y_tolerance_factor: 0.4,
            min_alignment_ratio: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Detects key/value tables in a page's text spans.
#[derive(Debug, Clone, Default)]
pub struct TableDetector {
    config: TableDetectorConfig,
}

impl TableDetector {
    /// Create a detector with default thresholds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a detector with custom thresholds.
    pub fn with_config(config: TableDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect tables in the given spans, top to bottom.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<DetectedTable> {
        let min_spans = self.config.min_rows * self.config.min_columns;
        if spans.len() < min_spans {
            log::debug!(
                "TableDetector: not enough spans ({} < {})",
                spans.len(),
                min_spans
            );
            return Vec::new();
        }

        let rows = self.group_into_rows(spans);
        if rows.len() < self.config.min_rows {
            log::debug!(
                "TableDetector: not enough rows ({} < {})",
                rows.len(),
                self.config.min_rows
            );
            return Vec::new();
        }

        let columns = self.detect_columns(&rows);
        log::debug!(
            "TableDetector: {} rows, column edges {:?}",
            rows.len(),
            columns
        );
        if columns.len() < self.config.min_columns {
            return Vec::new();
        }

        let mut tables = Vec::new();
        for (start, end) in self.find_table_regions(&rows, &columns) {
            let table_rows = rows[start..=end].to_vec();

            // Columns of this region alone; a page may hold tables with
            // different layouts.
            let table_columns = self.detect_columns(&table_rows);
            if table_columns.len() < self.config.min_columns {
                continue;
            }
            if table_columns.len() > self.config.max_columns {
                log::debug!(
                    "TableDetector: skipping region, too many columns ({} > {})",
                    table_columns.len(),
                    self.config.max_columns
                );
                continue;
            }
            if self.is_list_pattern(&table_rows, &table_columns) {
                log::debug!("TableDetector: skipping region, looks like a list");
                continue;
            }

            let right_x = table_rows
                .iter()
                .flat_map(|r| r.spans.iter())
                .map(TextSpan::right)
                .fold(f32::MIN, f32::max);

            tables.push(DetectedTable {
                top_y: table_rows[0].y,
                bottom_y: table_rows[table_rows.len() - 1].y,
                right_x,
                columns: table_columns,
                rows: table_rows,
            });
        }

        log::debug!("TableDetector: {} table(s) detected", tables.len());
        tables
    }

    /// Group spans into rows by baseline, top to bottom, each sorted by X.
    fn group_into_rows(&self, spans: &[TextSpan]) -> Vec<TableRowData> {
        let mut sorted = spans.to_vec();
        sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then(a.x.total_cmp(&b.x)));

        let mut rows: Vec<TableRowData> = Vec::new();
        let mut current: Vec<TextSpan> = Vec::new();
        let mut current_y: Option<f32> = None;

        for span in sorted {
            let tolerance = span.font_size * self.config.y_tolerance_factor;
            match current_y {
                Some(y) if (span.y - y).abs() <= tolerance => current.push(span),
                _ => {
                    if !current.is_empty() {
                        rows.push(finish_row(std::mem::take(&mut current)));
                    }
                    current_y = Some(span.y);
                    current.push(span);
                }
            }
        }
        if !current.is_empty() {
            rows.push(finish_row(current));
        }

        rows
    }

    /// Detect column left edges that recur across rows.
    ///
    /// Rows with two or more spans are the evidence when there are enough of
    /// them; otherwise every span votes.
    fn detect_columns(&self, rows: &[TableRowData]) -> Vec<f32> {
        let multi_span: Vec<&TableRowData> = rows.iter().filter(|r| r.spans.len() >= 2).collect();

        let mut edge_counts: HashMap<i32, usize> = HashMap::new();
        let voters = if multi_span.len() >= self.config.min_rows {
            for row in &multi_span {
                // Each bucket counts once per row.
                let buckets: HashSet<i32> = row.spans.iter().map(|s| bucket(s.x)).collect();
                for b in buckets {
                    *edge_counts.entry(b).or_insert(0) += 1;
                }
            }
            multi_span.len()
        } else {
            for span in rows.iter().flat_map(|r| r.spans.iter()) {
                *edge_counts.entry(bucket(span.x)).or_insert(0) += 1;
            }
            rows.len()
        };

        let min_occurrences = ((voters as f32 * self.config.min_alignment_ratio) as usize).max(2);

        let mut edges: Vec<f32> = edge_counts
            .into_iter()
            .filter(|(_, count)| *count >= min_occurrences)
            .map(|(b, _)| b as f32 * EDGE_BUCKET)
            .collect();
        edges.sort_by(f32::total_cmp);

        let mut merged: Vec<f32> = Vec::with_capacity(edges.len());
        for edge in edges {
            match merged.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => merged.push(edge),
            }
        }
        merged
    }

    /// Find contiguous row runs that align with the columns.
    fn find_table_regions(&self, rows: &[TableRowData], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if alignment_score(row, columns) >= self.config.min_alignment_ratio {
                start.get_or_insert(i);
            } else if let Some(s) = start.take() {
                if i - s >= self.config.min_rows {
                    regions.push((s, i - 1));
                }
            }
        }
        if let Some(s) = start {
            if rows.len() - s >= self.config.min_rows {
                regions.push((s, rows.len() - 1));
            }
        }

        regions
    }

    /// Numbered or bulleted lists split into marker and text spans look like
    /// two-column tables.
    fn is_list_pattern(&self, rows: &[TableRowData], columns: &[f32]) -> bool {
        if columns.len() < 2 || rows.is_empty() {
            return false;
        }

        let (mut bullets, mut numbers) = (0usize, 0usize);
        for row in rows {
            let Some(first) = row.spans.first() else {
                continue;
            };
            let text = first.text.trim();
            if is_bullet_marker(text) {
                bullets += 1;
            } else if is_number_marker(text) {
                numbers += 1;
            }
        }

        let total = rows.len() as f32;
        bullets as f32 / total >= 0.5 || (columns.len() == 2 && (bullets + numbers) as f32 / total >= 0.5)
    }
}

impl DetectedTable {
    /// Read the table as label/value pairs.
    ///
    /// The first column holds the label and the remaining columns, joined by
    /// a space, the value. A row without a label continues the previous
    /// row's value. Rows without a value are dropped.
    pub fn key_values(&self) -> Vec<(String, String)> {
        let mut pairs: Vec<(String, String)> = Vec::new();

        for row in &self.rows {
            let mut cells: Vec<Vec<&str>> = vec![Vec::new(); self.columns.len()];
            for span in &row.spans {
                let col = column_for_span(span.x, &self.columns, self.right_x);
                cells[col].push(span.text.trim());
            }

            let key = cells[0].join(" ");
            let value = cells[1..]
                .iter()
                .map(|c| c.join(" "))
                .filter(|c| !c.trim().is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            if value.trim().is_empty() {
                continue;
            }
            if key.trim().is_empty() {
                if let Some((_, previous)) = pairs.last_mut() {
                    previous.push(' ');
                    previous.push_str(&value);
                }
                continue;
            }
            pairs.push((key, value));
        }

        pairs
    }
}

fn bucket(x: f32) -> i32 {
    (x / EDGE_BUCKET).round() as i32
}

fn finish_row(spans: Vec<TextSpan>) -> TableRowData {
    let y = spans.iter().map(|s| s.y).sum::<f32>() / spans.len() as f32;
    TableRowData { y, spans }
}

/// Share of a row's spans that start on a column edge.
fn alignment_score(row: &TableRowData, columns: &[f32]) -> f32 {
    if row.spans.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .spans
        .iter()
        .filter(|span| columns.iter().any(|col| (span.x - col).abs() <= ALIGN_TOLERANCE))
        .count();
    aligned as f32 / row.spans.len() as f32
}

/// Column a span belongs to: the one whose [start, next start) range holds
/// its left edge, with 10pt of slack, else the nearest edge.
fn column_for_span(x: f32, columns: &[f32], right_x: f32) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(right_x + 100.0);
        if x >= start - 10.0 && x < end - 10.0 {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (x - **a).abs().total_cmp(&(x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

fn is_bullet_marker(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "►" | "■" | "●" | "□" | "◆" | "▶" | "➤"
    )
}

/// "1.", "12)", "3", "a.", "B)".
fn is_number_marker(text: &str) -> bool {
    let cleaned: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return false;
    }

    let digits = cleaned.chars().take_while(char::is_ascii_digit).count();
    let rest = &cleaned[digits..];
    if digits > 0 && (rest.is_empty() || rest == "." || rest == ")") {
        return true;
    }

    let mut chars = cleaned.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.' | ')'), None) if c.is_alphabetic()
    )
}
