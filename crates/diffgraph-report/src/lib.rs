//! HTML report for a DiffGraph run
//!
//! The page template is embedded at compile time. The Mermaid text and the
//! markdown summary are both HTML-escaped, so the page reads them back with
//! `textContent` exactly as they were produced.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use diffgraph_core::escape_label;
use rust_embed::RustEmbed;
use tracing::{debug, info};

/// Embed the report assets at compile time
#[derive(RustEmbed)]
#[folder = "assets"]
struct ReportAssets;

const TEMPLATE: &str = "report.html";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("embedded template {0} is missing")]
    MissingTemplate(&'static str),

    #[error("embedded template is not UTF-8: {0}")]
    InvalidTemplate(#[from] std::str::Utf8Error),

    #[error("failed to write report to {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Fill the template with a diagram, a summary and a timestamp.
pub fn render_report(diagram: &str, summary: &str, generated_at: DateTime<Local>) -> Result<String, ReportError> {
    let asset = ReportAssets::get(TEMPLATE).ok_or(ReportError::MissingTemplate(TEMPLATE))?;
    let template = std::str::from_utf8(&asset.data)?;

    let timestamp = generated_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let diagram = escape_label(diagram);
    let summary = escape_label(summary);
    Ok(fill(
        template,
        &[
            ("DIAGRAM", diagram.as_str()),
            ("SUMMARY", summary.as_str()),
            ("GENERATED_AT", timestamp.as_str()),
        ],
    ))
}

/// Replace `{{NAME}}` placeholders in one pass, so substituted text is
/// never scanned again. Unknown placeholders are left as they are.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match values.iter().find(|(key, _)| *key == name) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

/// Write the report and return its absolute path.
pub fn write_report(path: &Path, diagram: &str, summary: &str) -> Result<PathBuf, ReportError> {
    let html = render_report(diagram, summary, Local::now())?;
    let write_error = |source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_error)?;
    }
    fs::write(path, html).map_err(write_error)?;
    let absolute = fs::canonicalize(path).map_err(write_error)?;
    info!("Report written to {}", absolute.display());
    Ok(absolute)
}

/// Open the report in the default browser.
pub fn open_report(path: &Path) -> Result<(), ReportError> {
    debug!("Opening {}", path.display());
    open::that(path).map_err(|source| ReportError::Open {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap()
    }

    #[test]
    fn test_fill_single_pass() {
        let out = fill(
            "a {{X}} b {{Y}} c {{Z}} {{",
            &[("X", "{{Y}}"), ("Y", "y")],
        );
        assert_eq!(out, "a {{Y}} b y c {{Z}} {{");
    }

    /// What the browser's `textContent` gives back for escaped text.
    fn decode_entities(text: &str) -> String {
        text.replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&amp;", "&")
    }

    fn between<'a>(html: &'a str, start: &str, end: &str) -> &'a str {
        let from = html.find(start).unwrap() + start.len();
        let to = from + html[from..].find(end).unwrap();
        &html[from..to]
    }

    #[test]
    fn test_render_report() {
        let diagram = "graph TD\n    a[\"a&lt;b\"] --> b";
        let summary = "## a.py (added)\n\nAdds <script>alert(1)</script> & more";
        let html = render_report(diagram, summary, fixed_time()).unwrap();

        assert!(html.contains("a[&quot;a&amp;lt;b&quot;] --&gt; b"));
        assert!(html.contains("Adds &lt;script&gt;alert(1)&lt;/script&gt; &amp; more"));
        assert!(!html.contains("<script>alert(1)"));
        assert!(html.contains("Generated 2024-05-17 09:30:00"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_page_text_decodes_to_the_inputs() {
        let diagram = "graph TD\n    subgraph file_src__gen__py[\"src/&lt;gen&gt;.py\"]\n    end\n    x[\"&lt;img src=x onerror=alert(1)&gt;\"]\n";
        let summary = "## src/<gen>.py (added)\n\nIt's <b>bold</b> & \"quoted\"";
        let html = render_report(diagram, summary, fixed_time()).unwrap();

        let pre = between(&html, "<pre class=\"mermaid\" id=\"diagram\">\n", "\n        </pre>");
        assert_eq!(decode_entities(pre), diagram);
        assert!(!pre.contains('<'));

        let div = between(&html, "<div id=\"summary\">", "</div>");
        assert_eq!(decode_entities(div), summary);
        assert!(!div.contains('<'));
    }

    #[test]
    fn test_write_report() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out/report.html");
        let written = write_report(&path, "graph TD", "nothing").unwrap();

        assert!(written.is_absolute());
        let html = fs::read_to_string(&written).unwrap();
        assert!(html.contains("graph TD"));
    }
}
