//! Decoding of model output into a [`FileAnalysis`]

use diffgraph_core::ComponentRecord;
use serde_json::Value;
use tracing::warn;

use crate::bridge::FileAnalysis;
use crate::error::AnalysisError;

/// Locate the outermost JSON object in free text (prose and code fences
/// around it are ignored).
pub fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Parse a model response for `file_path`.
///
/// The envelope must be a JSON object; each component is decoded on its own
/// and malformed ones are skipped.
pub fn parse_analysis(file_path: &str, text: &str, tokens_used: u32) -> Result<FileAnalysis, AnalysisError> {
    let json = extract_json(text)
        .ok_or_else(|| AnalysisError::MalformedResponse(format!("no JSON object in response for {}", file_path)))?;
    let value: Value = serde_json::from_str(json)
        .map_err(|e| AnalysisError::MalformedResponse(format!("invalid JSON for {}: {}", file_path, e)))?;
    let Value::Object(mut envelope) = value else {
        return Err(AnalysisError::MalformedResponse(format!(
            "expected a JSON object for {}",
            file_path
        )));
    };

    let summary = match envelope.remove("summary") {
        Some(Value::String(s)) => s.trim().to_string(),
        _ => String::new(),
    };

    let raw_components = match envelope.remove("components") {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!("Ignoring non-array components for {}: {}", file_path, other);
            Vec::new()
        }
    };

    let mut components = Vec::with_capacity(raw_components.len());
    for (index, raw) in raw_components.into_iter().enumerate() {
        match serde_json::from_value::<ComponentRecord>(raw) {
            Ok(record) if record.name.trim().is_empty() => {
                warn!("Skipping component #{} in {}: empty name", index, file_path);
            }
            Ok(mut record) => {
                record.name = record.name.trim().to_string();
                components.push(record);
            }
            Err(e) => {
                warn!("Skipping malformed component #{} in {}: {}", index, file_path, e);
            }
        }
    }

    Ok(FileAnalysis {
        summary,
        components,
        tokens_used,
    })
}
