use std::collections::BTreeMap;
use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, Result};

/// A single file picked by the user, ready to be uploaded
#[derive(Debug, Clone)]
pub struct FileEntry {
    /// File name without any directory component
    pub name: String,
    /// Size of the file in bytes
    pub size: u64,
    /// Path relative to the selected directory, including its name (`root/sub/file.rs`)
    pub relative_path: Option<String>,
    /// The raw bytes of the file
    pub content: Bytes,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, content: impl Into<Bytes>) -> Self {
        let content = content.into();
        Self {
            name: name.into(),
            size: content.len() as u64,
            relative_path: None,
            content,
        }
    }

    pub fn with_relative_path(mut self, path: impl Into<String>) -> Self {
        self.relative_path = Some(path.into());
        self
    }

    /// Lowercased extension after the last `.`, empty when there is none
    pub fn extension(&self) -> String {
        match self.name.rsplit_once('.') {
            Some((_, ext)) => ext.to_lowercase(),
            None => String::new(),
        }
    }

    /// Name sent as the multipart filename
    pub fn upload_name(&self) -> &str {
        self.relative_path.as_deref().unwrap_or(&self.name)
    }
}

/// How the selection was made
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    Files,
    Directory,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectionMode::Files => f.write_str("files"),
            SelectionMode::Directory => f.write_str("directory"),
        }
    }
}

/// Normalized view of the current selection
#[derive(Debug, Clone)]
pub struct SelectionBatch {
    pub entries: Vec<FileEntry>,
    pub mode: SelectionMode,
    pub total_size_bytes: u64,
    /// Lowercase extension to number of files; `""` collects files without one
    pub extension_counts: BTreeMap<String, usize>,
    pub root_directory_name: Option<String>,
}

impl SelectionBatch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Opaque identifier of an uploaded codebase
///
/// Never parsed; the only check is that it is not blank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DirectoryId(String);

impl DirectoryId {
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ClientError::validation("directory id is required"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DirectoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Kind of read issued against the service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOperation {
    List,
    Details,
    Content,
    Download,
    Zip,
}

/// A single read against the codebase store
#[derive(Debug, Clone)]
pub struct ReadRequest {
    pub directory_id: Option<DirectoryId>,
    pub operation: ReadOperation,
    pub file_path: Option<String>,
}

impl ReadRequest {
    pub fn list() -> Self {
        Self {
            directory_id: None,
            operation: ReadOperation::List,
            file_path: None,
        }
    }

    pub fn details(directory_id: &str) -> Result<Self> {
        Ok(Self {
            directory_id: Some(DirectoryId::parse(directory_id)?),
            operation: ReadOperation::Details,
            file_path: None,
        })
    }

    pub fn content(directory_id: &str, file_path: &str) -> Result<Self> {
        Self::with_file(ReadOperation::Content, directory_id, file_path)
    }

    pub fn download(directory_id: &str, file_path: &str) -> Result<Self> {
        Self::with_file(ReadOperation::Download, directory_id, file_path)
    }

    pub fn zip(directory_id: &str) -> Result<Self> {
        Ok(Self {
            directory_id: Some(DirectoryId::parse(directory_id)?),
            operation: ReadOperation::Zip,
            file_path: None,
        })
    }

    fn with_file(operation: ReadOperation, directory_id: &str, file_path: &str) -> Result<Self> {
        let directory_id = DirectoryId::parse(directory_id)?;
        let file_path = file_path.trim();
        if file_path.is_empty() {
            return Err(ClientError::validation("file path is required"));
        }
        Ok(Self {
            directory_id: Some(directory_id),
            operation,
            file_path: Some(file_path.to_string()),
        })
    }

    /// Request target (path and query) relative to the service base URL
    pub fn target(&self) -> String {
        let id = self
            .directory_id
            .as_ref()
            .map(DirectoryId::as_str)
            .unwrap_or_default();
        let file = self
            .file_path
            .as_deref()
            .map(urlencoding::encode)
            .unwrap_or_default();

        match self.operation {
            ReadOperation::List => "/codebases".to_string(),
            ReadOperation::Details => format!("/codebases/{}", id),
            ReadOperation::Content => format!("/codebases/{}/content?file={}", id, file),
            ReadOperation::Download => format!("/codebases/{}/download?file={}", id, file),
            ReadOperation::Zip => format!("/codebases/{}/zip", id),
        }
    }
}
