//! Fixed-width text tables for record previews.
//!
//! Cells wider than the column limit are truncated with an ellipsis so that
//! long review bodies do not wrap the terminal.

use console::{measure_text_width, pad_str, truncate_str, Alignment};

const COLUMN_GAP: &str = "  ";

/// Render `rows` under `headers`, clamping every column to `max_width` characters.
pub fn render_table<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>], max_width: usize) -> String {
  let max_width = max_width.max(4);
  let mut widths: Vec<usize> = headers.iter().map(|h| measure_text_width(h).min(max_width)).collect();

  for row in rows {
    for (i, cell) in row.iter().enumerate().take(widths.len()) {
      let width = measure_text_width(&flatten(cell.as_ref())).min(max_width);
      widths[i] = widths[i].max(width);
    }
  }

  let mut out = String::new();
  out.push_str(&render_line(headers.iter().copied(), &widths));
  out.push('\n');
  out.push_str(&render_line(widths.iter().map(|w| "-".repeat(*w)), &widths));

  for row in rows {
    out.push('\n');
    out.push_str(&render_line(row.iter().map(|c| flatten(c.as_ref())), &widths));
  }

  out
}

/// Render and print a table to stderr
pub fn table<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>], max_width: usize) {
  crate::log(&render_table(headers, rows, max_width));
}

fn render_line<I, T>(cells: I, widths: &[usize]) -> String
where
  I: IntoIterator<Item = T>,
  T: AsRef<str>,
{
  let cells: Vec<String> = cells
    .into_iter()
    .zip(widths.iter())
    .map(|(cell, width)| {
      let cut = truncate_str(cell.as_ref(), *width, "…");
      pad_str(&cut, *width, Alignment::Left, None).into_owned()
    })
    .collect();

  cells.join(COLUMN_GAP).trim_end().to_string()
}

// Table cells are single-line
fn flatten(cell: &str) -> String {
  cell.split_whitespace().collect::<Vec<_>>().join(" ")
}
