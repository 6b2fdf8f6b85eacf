//! Display helpers layered on top of client results. Nothing here changes the
//! data returned by the service.

use std::borrow::Cow;

use serde_json::Value;

use crate::{
    health::{HealthDetail, HealthStatus},
    response::FileContentResult,
    types::SelectionBatch,
};

/// Characters of file content shown before truncating
pub const DISPLAY_LIMIT: usize = 1000;
/// Appended to truncated content
pub const TRUNCATION_MARKER: &str = "\n... (content truncated for display)";

/// Keep at most `limit` characters of `text`, marking the cut
pub fn truncate_for_display(text: &str, limit: usize) -> Cow<'_, str> {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => Cow::Owned(format!("{}{}", &text[..cut], TRUNCATION_MARKER)),
        None => Cow::Borrowed(text),
    }
}

/// Copy of the body with `file.content` truncated for display
pub fn display_file_content(result: &FileContentResult) -> Value {
    let mut view = result.body.clone();
    if let Some(content) = view.pointer_mut("/file/content") {
        let truncated = match content.as_str().map(|text| truncate_for_display(text, DISPLAY_LIMIT)) {
            Some(Cow::Owned(truncated)) => Some(truncated),
            _ => None,
        };
        if let Some(truncated) = truncated {
            *content = Value::String(truncated);
        }
    }
    view
}

/// Size in megabytes with two decimals
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / (1024.0 * 1024.0))
}

/// Multi-line summary of a selection
pub fn selection_summary(batch: &SelectionBatch) -> String {
    let types = batch
        .extension_counts
        .iter()
        .map(|(ext, count)| format!("{} ({})", ext, count))
        .collect::<Vec<_>>()
        .join(", ");

    let mut summary = format!(
        "Selected: {} files ({})\nTotal Size: {} MB\nFile Types: {}",
        batch.len(),
        batch.mode,
        format_megabytes(batch.total_size_bytes),
        types
    );
    if let Some(root) = &batch.root_directory_name {
        summary.push_str(&format!("\nRoot Directory: {}", root));
    }
    summary
}

/// One-line description of a health check
pub fn health_summary(status: &HealthStatus) -> String {
    match (&status.detail, status.online) {
        (Some(HealthDetail::Body(body)), _) => format!("Server is healthy: {}", body),
        (Some(HealthDetail::Failure(e)), _) => format!("Server offline: {}", e),
        (None, true) => "Server Online".to_string(),
        (None, false) => "Server Offline".to_string(),
    }
}
