//! HTML fragments for the result panel.
//!
//! Every piece of model or user text goes through `escape_html`.

use std::fmt::Write;

use textlift_core::{RenderedResult, TableView, ViewBody};

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn summary_callout(out: &mut String, summary: Option<&str>) {
    if let Some(summary) = summary {
        let _ = write!(
            out,
            r#"<div class="summary"><h4>AI Summary</h4><p>{}</p></div>"#,
            escape_html(summary)
        );
    }
}

fn placeholder(out: &mut String, text: &str) {
    let _ = write!(out, r#"<p class="placeholder">{}</p>"#, escape_html(text));
}

fn table_html(out: &mut String, table: &TableView) {
    out.push_str(r#"<table class="extracted">"#);
    if let Some(header) = &table.header {
        out.push_str("<thead><tr>");
        for cell in header {
            let _ = write!(out, "<th>{}</th>", escape_html(cell));
        }
        out.push_str("</tr></thead>");
    }
    out.push_str("<tbody>");
    for row in &table.rows {
        out.push_str("<tr>");
        for cell in row {
            let _ = write!(out, "<td>{}</td>", escape_html(cell));
        }
        out.push_str("</tr>");
    }
    out.push_str("</tbody></table>");
}

/// The visual tab.
pub fn render_visual(view: &RenderedResult) -> String {
    let mut out = String::new();
    summary_callout(&mut out, view.summary.as_deref());

    match &view.body {
        ViewBody::Error(message) => {
            let _ = write!(
                out,
                r#"<div class="error"><h4>Extraction Error</h4><p>{}</p></div>"#,
                escape_html(message)
            );
        }
        ViewBody::Text(text) => {
            let _ = write!(out, r#"<pre class="raw-text">{}</pre>"#, escape_html(text));
        }
        ViewBody::Fields(fields) => {
            out.push_str(r#"<dl class="fields">"#);
            for field in fields {
                let _ = write!(
                    out,
                    "<div><dt>{}</dt><dd>{}</dd></div>",
                    escape_html(&field.key),
                    escape_html(&field.value)
                );
            }
            out.push_str("</dl>");
        }
        ViewBody::Tables(tables) => {
            for (i, table) in tables.iter().enumerate() {
                let _ = write!(out, r#"<section class="table"><h5>Table {}</h5>"#, i + 1);
                table_html(&mut out, table);
                out.push_str("</section>");
            }
        }
        body @ (ViewBody::NoText | ViewBody::NoFields | ViewBody::NoTables) => {
            if let Some(text) = body.placeholder() {
                placeholder(&mut out, text);
            }
        }
    }
    out
}

/// The JSON tab: the pretty-printed payload, with the summary callout on top.
pub fn render_json(summary: Option<&str>, raw_json: &str) -> String {
    let mut out = String::new();
    summary_callout(&mut out, summary);
    let _ = write!(out, r#"<pre class="json">{}</pre>"#, escape_html(raw_json));
    out
}
