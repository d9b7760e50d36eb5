//! Column-aligned text tables for terminal output.
//!
//! Cells may contain ANSI color escapes and embedded newlines. Colors do not
//! count towards column widths, and a multi-line cell makes its whole row
//! as tall as its line count.

use std::io::{self, Write};

use crate::terminal;
use crate::text_processing::visible_width;

const COLUMN_GAP: &str = "   ";

/// A text table rendered with space padding.
#[derive(Debug, Clone, Default)]
pub struct TextTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    show_headers: bool,
}

impl TextTable {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
            show_headers: true,
        }
    }

    /// Omit the header row, for output consumed by scripts.
    pub fn hide_headers(&mut self) {
        self.show_headers = false;
    }

    /// Append a row. Missing trailing cells render empty, extra cells are dropped.
    pub fn add_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).take(self.headers.len()).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths = vec![0; self.headers.len()];
        if self.show_headers {
            for (width, header) in widths.iter_mut().zip(&self.headers) {
                *width = visible_width(header);
            }
        }
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                let widest_line = cell.lines().map(visible_width).max().unwrap_or(0);
                *width = (*width).max(widest_line);
            }
        }
        widths
    }

    /// Write the table, one line per physical row, to `out`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let widths = self.column_widths();

        if self.show_headers {
            let styled: Vec<String> = self.headers.iter().map(|header| terminal::header(header)).collect();
            let plain: Vec<&str> = self.headers.iter().map(String::as_str).collect();
            write_line(out, &styled, &plain, &widths)?;
        }

        for row in &self.rows {
            let cell_lines: Vec<Vec<&str>> = row.iter().map(|cell| cell.lines().collect()).collect();
            let height = cell_lines.iter().map(Vec::len).max().unwrap_or(0).max(1);
            for line_index in 0..height {
                let parts: Vec<&str> = cell_lines
                    .iter()
                    .map(|lines| lines.get(line_index).copied().unwrap_or(""))
                    .collect();
                write_line(out, &parts, &parts, &widths)?;
            }
        }
        Ok(())
    }

    /// Render the table into a string.
    pub fn render(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Pads each cell to its column width; `measured` supplies the text whose
/// width counts, which differs from `cells` only for styled headers.
fn write_line<W: Write, S: AsRef<str>>(
    out: &mut W,
    cells: &[S],
    measured: &[&str],
    widths: &[usize],
) -> io::Result<()> {
    let mut line = String::new();
    for (index, cell) in cells.iter().enumerate() {
        if index > 0 {
            line.push_str(COLUMN_GAP);
        }
        line.push_str(cell.as_ref());
        let used = visible_width(measured[index]);
        let width = widths.get(index).copied().unwrap_or(used);
        line.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    }
    writeln!(out, "{}", line.trim_end())
}
