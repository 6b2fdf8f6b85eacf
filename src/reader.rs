use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::fs;
use tracing::{debug, info};

use crate::{
    error::{ClientError, Result},
    response::{CodebaseResult, CollectionResult, FileContentResult},
    transport::{RawResponse, Transport},
    types::{ReadOperation, ReadRequest},
};

/// Filename used when a download path has no last segment
pub const FALLBACK_FILENAME: &str = "downloaded_file";

/// Bytes downloaded from the service with the name they should be saved under
#[derive(Debug, Clone)]
pub struct BinaryDownload {
    pub suggested_filename: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl BinaryDownload {
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the bytes to `dir/<suggested filename>`
    pub async fn save_to(&self, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).await?;
        let path = dir.join(&self.suggested_filename);
        fs::write(&path, &self.bytes).await?;
        info!(path = %path.display(), bytes = self.len(), "Saved download");
        Ok(path)
    }
}

/// Last `/` segment of `file_path`, or [`FALLBACK_FILENAME`] when it is empty or a dot segment
pub fn suggested_filename(file_path: &str) -> String {
    match file_path.rsplit('/').next() {
        Some(name) if !matches!(name, "" | "." | "..") => name.to_string(),
        _ => FALLBACK_FILENAME.to_string(),
    }
}

/// Filename of a codebase archive
pub fn zip_filename(directory_id: &str) -> String {
    format!("codebase-{}.zip", directory_id)
}

/// Read-only access to uploaded codebases
///
/// Blank identifiers and paths are rejected before any request is sent. Any non-2xx
/// status is returned as `ClientError::Remote` without looking at the body.
pub struct CodebaseReader {
    transport: Arc<dyn Transport>,
}

impl CodebaseReader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// List every known codebase
    pub async fn list(&self) -> Result<CollectionResult> {
        let response = self.send(&ReadRequest::list()).await?;
        Ok(CollectionResult::from_body(response.json()?))
    }

    /// Fetch the file listing of one codebase
    ///
    /// Returns `ClientError::NotFound` if the service does not know the id
    pub async fn details(&self, directory_id: &str) -> Result<CodebaseResult> {
        let request = ReadRequest::details(directory_id)?;
        let response = self.send(&request).await?;
        Ok(CodebaseResult::from_body(response.json()?))
    }

    /// Fetch one file's metadata and text content
    pub async fn read_file_metadata(
        &self,
        directory_id: &str,
        file_path: &str,
    ) -> Result<FileContentResult> {
        let request = ReadRequest::content(directory_id, file_path)?;
        let response = self.send(&request).await?;
        Ok(FileContentResult::from_body(response.json()?))
    }

    /// Download the raw bytes of one file
    pub async fn download_file(&self, directory_id: &str, file_path: &str) -> Result<BinaryDownload> {
        let request = ReadRequest::download(directory_id, file_path)?;
        let response = self.send(&request).await?;
        let name = suggested_filename(request.file_path.as_deref().unwrap_or_default());
        Ok(Self::into_download(response, name))
    }

    /// Download the whole codebase as a zip archive
    pub async fn download_zip(&self, directory_id: &str) -> Result<BinaryDownload> {
        let request = ReadRequest::zip(directory_id)?;
        let response = self.send(&request).await?;
        let id = request.directory_id.as_ref().map(|id| id.as_str()).unwrap_or_default();
        Ok(Self::into_download(response, zip_filename(id)))
    }

    async fn send(&self, request: &ReadRequest) -> Result<RawResponse> {
        let target = request.target();
        debug!(transport = %self.transport.identifier(), %target, "Read request");

        let response = self.transport.get(&target).await?;
        if response.status == 404 && request.operation == ReadOperation::Details {
            return Err(ClientError::NotFound {
                directory_id: request
                    .directory_id
                    .as_ref()
                    .map(ToString::to_string)
                    .unwrap_or_default(),
            });
        }
        response.error_for_status()
    }

    fn into_download(response: RawResponse, suggested_filename: String) -> BinaryDownload {
        debug!(file = %suggested_filename, bytes = response.body.len(), "Downloaded");
        BinaryDownload {
            suggested_filename,
            content_type: response.content_type,
            bytes: response.body,
        }
    }
}
