//! Terminal output: ANSI styling, notes, and table rendering for results.

use textlift_core::{RenderedResult, Row, TableView, ViewBody};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

/// Check if the terminal supports color output.
pub fn supports_color() -> bool {
    std::env::var("NO_COLOR").is_err()
        && (std::env::var("COLORTERM").is_ok()
            || std::env::var("TERM")
                .map(|t| t != "dumb")
                .unwrap_or(false))
}

/// Strip ANSI escape codes from a string.
pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }
    result
}

fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

fn styled(s: &str, style: &str, color: bool) -> String {
    if color {
        format!("{style}{s}{RESET}")
    } else {
        s.to_string()
    }
}

pub fn note_info(msg: &str) {
    if supports_color() {
        println!("{CYAN}{BOLD}i{RESET} {msg}");
    } else {
        println!("INFO: {msg}");
    }
}

pub fn note_warn(msg: &str) {
    if supports_color() {
        eprintln!("{YELLOW}{BOLD}!{RESET} {msg}");
    } else {
        eprintln!("WARN: {msg}");
    }
}

pub fn note_error(msg: &str) {
    if supports_color() {
        eprintln!("{RED}{BOLD}x{RESET} {msg}");
    } else {
        eprintln!("ERROR: {msg}");
    }
}

pub fn note_success(msg: &str) {
    if supports_color() {
        println!("{GREEN}{BOLD}ok{RESET} {msg}");
    } else {
        println!("OK: {msg}");
    }
}

/// Render rows under `header` as aligned columns. Short rows are padded.
pub fn render_table(header: &[String], rows: &[Row], color: bool) -> String {
    let num_cols = rows
        .iter()
        .map(Vec::len)
        .chain(std::iter::once(header.len()))
        .max()
        .unwrap_or(0);
    if num_cols == 0 {
        return String::new();
    }

    let cell = |row: &[String], i: usize| row.get(i).map(String::as_str).unwrap_or("").to_string();

    let mut widths = vec![0usize; num_cols];
    for row in std::iter::once(header).chain(rows.iter().map(Vec::as_slice)) {
        for (i, width) in widths.iter_mut().enumerate() {
            *width = (*width).max(visible_width(&cell(row, i)));
        }
    }

    let line = |row: &[String]| {
        let cells: Vec<String> = (0..num_cols)
            .map(|i| {
                let text = cell(row, i);
                let pad = widths[i].saturating_sub(visible_width(&text));
                format!("{text}{}", " ".repeat(pad))
            })
            .collect();
        format!("  {}", cells.join("  ")).trim_end().to_string()
    };

    let mut out = String::new();
    if !header.is_empty() {
        out.push_str(&styled(&line(header), BOLD, color));
        out.push('\n');
        let sep: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        out.push_str(&format!("  {}\n", sep.join("  ")));
    }
    for row in rows {
        out.push_str(&line(row));
        out.push('\n');
    }
    out
}

fn render_extracted_table(table: &TableView, color: bool) -> String {
    let header = table.header.clone().unwrap_or_default();
    render_table(&header, &table.rows, color)
}

/// Terminal rendition of a result view.
pub fn render_result(view: &RenderedResult, color: bool) -> String {
    let mut out = String::new();

    if let Some(summary) = &view.summary {
        out.push_str(&styled("AI Summary", BOLD, color));
        out.push('\n');
        out.push_str(&format!("  {summary}\n\n"));
    }

    match &view.body {
        ViewBody::Error(message) => {
            out.push_str(&styled("Extraction Error", RED, color));
            out.push('\n');
            out.push_str(&format!("  {message}\n"));
        }
        ViewBody::Text(text) => {
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
        }
        ViewBody::Fields(fields) => {
            let rows: Vec<Row> = fields
                .iter()
                .map(|f| vec![f.key.clone(), f.value.clone()])
                .collect();
            out.push_str(&render_table(&["Key".into(), "Value".into()], &rows, color));
        }
        ViewBody::Tables(tables) => {
            for (i, table) in tables.iter().enumerate() {
                if i > 0 {
                    out.push('\n');
                }
                out.push_str(&styled(&format!("Table {}", i + 1), DIM, color));
                out.push('\n');
                out.push_str(&render_extracted_table(table, color));
            }
        }
        body => {
            if let Some(text) = body.placeholder() {
                out.push_str(&styled(text, DIM, color));
                out.push('\n');
            }
        }
    }

    out
}
