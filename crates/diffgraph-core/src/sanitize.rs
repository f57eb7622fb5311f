//! Identifier and label sanitizing for Mermaid output
//!
//! Node ids may only contain ASCII alphanumerics and `_`. Labels and
//! tooltips are HTML-escaped so paths like `a<b>.py` or summaries with
//! quotes cannot break out of the diagram syntax.

/// Replace every character that is not ASCII alphanumeric or `_` with `_`.
///
/// Distinct inputs may map to the same id (`a.py` and `a_py`); callers
/// accept that.
pub fn sanitize_id(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// HTML-escape a display label.
pub fn escape_label(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

/// Make free text safe for a click tooltip: backticks and backslashes are
/// dropped, runs of whitespace (newlines and tabs included) become a single
/// space, and the result is HTML-escaped.
pub fn sanitize_tooltip(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| *c != '`' && *c != '\\').collect();
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    escape_label(&collapsed)
}

/// Id of the subgraph holding a file.
pub fn file_node_id(path: &str) -> String {
    format!("file_{}", sanitize_id(path))
}

/// Id of a component node or container subgraph.
pub fn component_node_id(key: &str) -> String {
    sanitize_id(key)
}
