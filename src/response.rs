//! Structured bodies returned by the codebase service.
//!
//! Every result keeps the raw JSON body next to the typed view decoded from it.
//! Typed views are lenient: unknown fields are ignored and missing ones default.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::types::DirectoryId;

/// How a response without an explicit `success` field is classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuccessPolicy {
    /// Only `success: true` counts (upload, file content)
    RequireExplicit,
    /// Anything but `success: false` counts (list, details)
    AssumeOnAbsent,
}

impl SuccessPolicy {
    pub fn classify(self, body: &Value) -> bool {
        match (self, body.get("success").and_then(Value::as_bool)) {
            (_, Some(flag)) => flag,
            (SuccessPolicy::RequireExplicit, None) => false,
            (SuccessPolicy::AssumeOnAbsent, None) => true,
        }
    }
}

/// `error` or `message` field of a structured body
pub fn error_message(body: &Value) -> Option<String> {
    ["error", "message"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(String::from)
}

fn decode_field<T: for<'de> Deserialize<'de> + Default>(body: &Value, field: &str) -> T {
    match body.get(field) {
        None | Some(Value::Null) => T::default(),
        Some(value) => T::deserialize(value).unwrap_or_else(|e| {
            warn!(field, error = %e, "Ignoring malformed response field");
            T::default()
        }),
    }
}

/// Outcome of one upload attempt
#[derive(Debug, Clone)]
pub struct UploadResult {
    pub success: bool,
    pub directory_id: Option<DirectoryId>,
    pub raw_body: Option<Value>,
    pub error_message: Option<String>,
}

/// Wire shape of the upload response
///
/// Older servers answer with `uuid`, newer ones with `directory_id`; some send both.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UploadResponse {
    success: Option<bool>,
    uuid: Option<String>,
    directory_id: Option<String>,
}

impl UploadResponse {
    /// Prefer `uuid`, fall back to `directory_id`
    fn reconciled_id(&self) -> Option<DirectoryId> {
        self.uuid
            .as_deref()
            .and_then(|id| DirectoryId::parse(id).ok())
            .or_else(|| {
                self.directory_id
                    .as_deref()
                    .and_then(|id| DirectoryId::parse(id).ok())
            })
    }
}

impl UploadResult {
    pub(crate) fn from_body(body: Value) -> Self {
        let response = UploadResponse::deserialize(&body).unwrap_or_default();
        let success = response.success == Some(true);

        Self {
            success,
            directory_id: if success { response.reconciled_id() } else { None },
            error_message: if success {
                None
            } else {
                Some(error_message(&body).unwrap_or_else(|| "upload failed".to_string()))
            },
            raw_body: Some(body),
        }
    }

    pub(crate) fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            directory_id: None,
            raw_body: None,
            error_message: Some(message.into()),
        }
    }
}

/// One codebase as reported by the list endpoint
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CodebaseSummary {
    #[serde(rename = "directory_id", alias = "uuid", alias = "id")]
    pub directory_id: String,
    pub name: Option<String>,
    pub created_at: Option<String>,
    pub file_count: Option<u64>,
}

/// File metadata as stored remotely
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteFile {
    pub path: String,
    pub name: String,
    pub size: u64,
}

/// File metadata plus its text content
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RemoteFileContent {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub content: Option<String>,
}

/// Result of listing every codebase
#[derive(Debug, Clone)]
pub struct CollectionResult {
    pub body: Value,
    pub codebases: Vec<CodebaseSummary>,
}

impl CollectionResult {
    pub(crate) fn from_body(body: Value) -> Self {
        let codebases = decode_field(&body, "codebases");
        Self { body, codebases }
    }

    pub fn is_success(&self) -> bool {
        SuccessPolicy::AssumeOnAbsent.classify(&self.body)
    }
}

/// Result of fetching one codebase
#[derive(Debug, Clone)]
pub struct CodebaseResult {
    pub body: Value,
    pub files: Vec<RemoteFile>,
}

impl CodebaseResult {
    pub(crate) fn from_body(body: Value) -> Self {
        let files = decode_field(&body, "files");
        Self { body, files }
    }

    pub fn is_success(&self) -> bool {
        SuccessPolicy::AssumeOnAbsent.classify(&self.body)
    }
}

/// Result of reading one file's metadata and content
#[derive(Debug, Clone)]
pub struct FileContentResult {
    pub body: Value,
    pub file: Option<RemoteFileContent>,
}

impl FileContentResult {
    pub(crate) fn from_body(body: Value) -> Self {
        let file = decode_field(&body, "file");
        Self { body, file }
    }

    pub fn is_success(&self) -> bool {
        SuccessPolicy::RequireExplicit.classify(&self.body)
    }

    pub fn content(&self) -> Option<&str> {
        self.file.as_ref().and_then(|f| f.content.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_policies() {
        let absent = json!({"codebases": []});
        assert!(SuccessPolicy::AssumeOnAbsent.classify(&absent));
        assert!(!SuccessPolicy::RequireExplicit.classify(&absent));

        let failed = json!({"success": false});
        assert!(!SuccessPolicy::AssumeOnAbsent.classify(&failed));
    }

    #[test]
    fn test_upload_prefers_uuid() {
        let result = UploadResult::from_body(json!({
            "success": true,
            "uuid": "from-uuid",
            "directory_id": "from-directory-id",
        }));
        assert_eq!(result.directory_id.unwrap().as_str(), "from-uuid");
    }

    #[test]
    fn test_upload_falls_back_to_directory_id() {
        let result = UploadResult::from_body(json!({
            "success": true,
            "uuid": "",
            "directory_id": "abc-123",
        }));
        assert!(result.success);
        assert_eq!(result.directory_id.unwrap().as_str(), "abc-123");
    }

    #[test]
    fn test_upload_requires_explicit_success() {
        let result = UploadResult::from_body(json!({"uuid": "abc-123"}));
        assert!(!result.success);
        assert!(result.directory_id.is_none());

        let result = UploadResult::from_body(json!({"success": false, "error": "No files uploaded"}));
        assert_eq!(result.error_message.as_deref(), Some("No files uploaded"));
        assert!(result.raw_body.is_some());
    }

    #[test]
    fn test_collection_accepts_both_id_names() {
        let result = CollectionResult::from_body(json!({
            "success": true,
            "codebases": [
                {"directory_id": "a", "file_count": 3, "created_at": "2024-01-01T00:00:00Z"},
                {"uuid": "b", "name": "UploadedCodebase"},
            ]
        }));
        assert_eq!(result.codebases.len(), 2);
        assert_eq!(result.codebases[0].file_count, Some(3));
        assert_eq!(result.codebases[1].directory_id, "b");
    }

    #[test]
    fn test_malformed_field_keeps_raw_body() {
        let result = CodebaseResult::from_body(json!({"files": "nope"}));
        assert!(result.files.is_empty());
        assert_eq!(result.body["files"], "nope");
    }
}
