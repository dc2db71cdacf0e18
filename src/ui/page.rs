//! HTML rendering for the form page.
//!
//! One page, one form per tab. Every piece of user or stored text goes
//! through [`escape`].

use crate::models::{FileSummary, Record, ScoredRecord};
use std::fmt::Write as _;

/// Page tabs, one per form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    /// Insert one chunk.
    #[default]
    Insert,
    /// Delete by condition.
    Delete,
    /// Dense vector search.
    Search,
    /// Full-text search.
    TextSearch,
    /// List rows or per-file summaries.
    List,
    /// Drop the table.
    DropTable,
    /// Drop the workspace.
    DropWorkspace,
}

impl Tab {
    /// Every tab in display order.
    pub const ALL: [Self; 7] = [
        Self::Insert,
        Self::Delete,
        Self::Search,
        Self::TextSearch,
        Self::List,
        Self::DropTable,
        Self::DropWorkspace,
    ];

    /// Identifier used in `?tab=` and element ids.
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Delete => "delete",
            Self::Search => "search",
            Self::TextSearch => "text-search",
            Self::List => "list",
            Self::DropTable => "drop-table",
            Self::DropWorkspace => "drop-workspace",
        }
    }

    /// Tab caption.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Insert => "Insert data",
            Self::Delete => "Delete data",
            Self::Search => "Vector search",
            Self::TextSearch => "Full-text search",
            Self::List => "List data",
            Self::DropTable => "Drop table",
            Self::DropWorkspace => "Drop workspace",
        }
    }

    /// Looks a tab up by its id; unknown ids fall back to the default tab.
    #[must_use]
    pub fn from_id(id: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|tab| tab.id() == id)
            .unwrap_or_default()
    }
}

/// What the last action produced.
#[derive(Debug, Clone, Default)]
pub enum Outcome {
    /// Nothing yet.
    #[default]
    Empty,
    /// A success message.
    Message(String),
    /// An error message.
    Error(String),
    /// Plain rows.
    Records {
        /// Column order.
        columns: Vec<String>,
        /// Rows.
        rows: Vec<Record>,
    },
    /// Ranked rows with their score.
    Scored {
        /// Column order.
        columns: Vec<String>,
        /// Header of the score column.
        score_label: &'static str,
        /// Rows, best first.
        hits: Vec<ScoredRecord>,
    },
    /// Per-file summaries.
    Files(Vec<FileSummary>),
}

/// Escapes text for HTML element content and attribute values.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

const STYLE: &str = "
body { font-family: sans-serif; margin: 2rem; max-width: 70rem; }
nav a { margin-right: 1rem; }
nav a.active { font-weight: bold; }
label { display: block; margin-top: 0.75rem; }
input, textarea, select { width: 100%; box-sizing: border-box; }
table { border-collapse: collapse; margin-top: 1rem; width: 100%; }
th, td { border: 1px solid #ccc; padding: 0.25rem 0.5rem; text-align: left; vertical-align: top; }
.message { color: #1b5e20; }
.error { color: #b71c1c; }
";

/// Renders the whole page with `active` selected and `outcome` below its form.
#[must_use]
pub fn render(title: &str, active: Tab, outcome: &Outcome) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title>\
         <style>{STYLE}</style></head><body><h1>{title}</h1><nav>",
        title = escape(title)
    );
    for tab in Tab::ALL {
        let class = if tab == active { " class=\"active\"" } else { "" };
        let _ = write!(html, "<a href=\"/?tab={}\"{class}>{}</a>", tab.id(), tab.title());
    }
    html.push_str("</nav><main>");
    let _ = write!(html, "<h2>{}</h2>", active.title());
    html.push_str(form(active));
    render_outcome(&mut html, outcome);
    html.push_str("</main></body></html>");
    html
}

fn form(tab: Tab) -> &'static str {
    match tab {
        Tab::Insert => {
            "<form method=\"post\" action=\"/insert\">\
             <label>File uuid <input name=\"file_uuid\"></label>\
             <label>Filename <input name=\"filename\"></label>\
             <label>Chunk text <textarea name=\"chunk_text\" rows=\"4\"></textarea></label>\
             <label>Vector (comma-separated numbers) <input name=\"vector\" required></label>\
             <button type=\"submit\">Insert</button></form>"
        },
        Tab::Delete => {
            "<form method=\"post\" action=\"/delete\">\
             <label>Condition <input name=\"condition\" placeholder=\"filename = 'test1.txt'\" required></label>\
             <button type=\"submit\">Delete</button></form>"
        },
        Tab::Search => {
            "<form method=\"post\" action=\"/search\">\
             <label>Vector (comma-separated numbers) <input name=\"vector\" required></label>\
             <label>Filename <input name=\"filename\"></label>\
             <label>Top k <input name=\"top_k\" type=\"number\" min=\"1\" value=\"3\"></label>\
             <label>Metric <select name=\"metric\">\
             <option value=\"l2\">l2</option><option value=\"cosine\">cosine</option>\
             <option value=\"ip\">ip</option></select></label>\
             <button type=\"submit\">Search</button></form>"
        },
        Tab::TextSearch => {
            "<form method=\"post\" action=\"/search/text\">\
             <label>Query <input name=\"query\" required></label>\
             <label>Top k <input name=\"top_k\" type=\"number\" min=\"1\" value=\"10\"></label>\
             <button type=\"submit\">Search</button></form>"
        },
        Tab::List => {
            "<form method=\"post\" action=\"/list\"><button type=\"submit\">List all</button></form>\
             <form method=\"post\" action=\"/list/files\"><button type=\"submit\">List by filename</button></form>"
        },
        Tab::DropTable => {
            "<form method=\"post\" action=\"/drop-table\"><button type=\"submit\">Drop table</button></form>\
             <form method=\"post\" action=\"/recreate\"><button type=\"submit\">Recreate table</button></form>"
        },
        Tab::DropWorkspace => {
            "<form method=\"post\" action=\"/drop-workspace\"><button type=\"submit\">Drop workspace</button></form>\
             <form method=\"post\" action=\"/recreate\"><button type=\"submit\">Recreate table</button></form>"
        },
    }
}

fn render_outcome(html: &mut String, outcome: &Outcome) {
    match outcome {
        Outcome::Empty => {},
        Outcome::Message(message) => {
            let _ = write!(html, "<p class=\"message\">{}</p>", escape(message));
        },
        Outcome::Error(message) => {
            let _ = write!(html, "<p class=\"error\">Error: {}</p>", escape(message));
        },
        Outcome::Records { columns, rows } => {
            let _ = write!(html, "<p>{} row(s)</p>", rows.len());
            table_head(html, columns, None);
            for row in rows {
                html.push_str("<tr>");
                cells(html, columns, row);
                html.push_str("</tr>");
            }
            html.push_str("</table>");
        },
        Outcome::Scored {
            columns,
            score_label,
            hits,
        } => {
            let _ = write!(html, "<p>{} hit(s)</p>", hits.len());
            table_head(html, columns, Some(score_label));
            for hit in hits {
                html.push_str("<tr>");
                cells(html, columns, &hit.record);
                let _ = write!(html, "<td>{:.4}</td></tr>", hit.score);
            }
            html.push_str("</table>");
        },
        Outcome::Files(files) => {
            let _ = write!(html, "<p>{} file(s)</p>", files.len());
            html.push_str(
                "<table><tr><th>filename</th><th>file_uuid</th><th>chunk_num</th><th>char_num</th></tr>",
            );
            for file in files {
                let _ = write!(
                    html,
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    escape(&file.filename),
                    escape(&file.file_uuid),
                    file.chunk_count,
                    file.char_count
                );
            }
            html.push_str("</table>");
        },
    }
}

fn table_head(html: &mut String, columns: &[String], score_label: Option<&str>) {
    html.push_str("<table><tr>");
    for column in columns {
        let _ = write!(html, "<th>{}</th>", escape(column));
    }
    if let Some(label) = score_label {
        let _ = write!(html, "<th>{label}</th>");
    }
    html.push_str("</tr>");
}

fn cells(html: &mut String, columns: &[String], record: &Record) {
    for column in columns {
        let value = record.get(column).map(ToString::to_string).unwrap_or_default();
        let _ = write!(html, "<td>{}</td>", escape(&value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape() {
        assert_eq!(
            escape("<script>alert('x') & \"y\"</script>"),
            "&lt;script&gt;alert(&#39;x&#39;) &amp; &quot;y&quot;&lt;/script&gt;"
        );
    }

    #[test]
    fn test_tab_ids_round_trip() {
        for tab in Tab::ALL {
            assert_eq!(Tab::from_id(tab.id()), tab);
        }
        assert_eq!(Tab::from_id("nope"), Tab::Insert);
    }

    #[test]
    fn test_render_marks_active_tab_and_escapes_rows() {
        let outcome = Outcome::Records {
            columns: vec!["chunk_text".to_string()],
            rows: vec![Record::new().with("chunk_text", "<b>bold</b>")],
        };
        let html = render("chunkbase", Tab::List, &outcome);
        assert!(html.contains("<a href=\"/?tab=list\" class=\"active\">"));
        assert!(html.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!html.contains("<b>bold</b>"));
    }

    #[test]
    fn test_render_error() {
        let html = render("chunkbase", Tab::Insert, &Outcome::Error("bad <vector>".into()));
        assert!(html.contains("<p class=\"error\">Error: bad &lt;vector&gt;</p>"));
    }
}
