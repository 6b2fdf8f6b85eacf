use std::sync::Arc;

use crate::{
    config::ClientConfig,
    error::{ClientError, Result},
    health::{HealthProbe, HealthStatus},
    http::HttpTransport,
    progress::ProgressObserver,
    reader::{BinaryDownload, CodebaseReader},
    response::{CodebaseResult, CollectionResult, FileContentResult, UploadResult},
    transport::Transport,
    types::{DirectoryId, SelectionBatch},
    upload::Uploader,
};

/// One user's session against the codebase service
///
/// Remembers the directory id of the last successful upload so reads can omit it.
/// Later uploads overwrite it.
pub struct CodebaseClient {
    uploader: Uploader,
    reader: CodebaseReader,
    probe: HealthProbe,
    last_directory_id: Option<DirectoryId>,
}

impl CodebaseClient {
    /// Create a client talking HTTP to `config.base_url`
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self {
            uploader: Uploader::new(transport.clone()),
            reader: CodebaseReader::new(transport.clone()),
            probe: HealthProbe::new(transport),
            last_directory_id: None,
        }
    }

    pub fn last_directory_id(&self) -> Option<&DirectoryId> {
        self.last_directory_id.as_ref()
    }

    /// `explicit` when given and not blank, otherwise the last uploaded id
    pub fn resolve_directory_id(&self, explicit: Option<&str>) -> Result<DirectoryId> {
        match explicit {
            Some(raw) if !raw.trim().is_empty() => DirectoryId::parse(raw),
            _ => self
                .last_directory_id
                .clone()
                .ok_or_else(|| ClientError::validation("directory id is required")),
        }
    }

    pub async fn check_health(&self, verbose: bool) -> HealthStatus {
        self.probe.check(verbose).await
    }

    pub async fn upload(
        &mut self,
        batch: &SelectionBatch,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<UploadResult> {
        let result = self.uploader.upload(batch, observer).await?;
        if let Some(id) = result.directory_id.as_ref().filter(|_| result.success) {
            self.last_directory_id = Some(id.clone());
        }
        Ok(result)
    }

    pub async fn list(&self) -> Result<CollectionResult> {
        self.reader.list().await
    }

    pub async fn details(&self, directory_id: Option<&str>) -> Result<CodebaseResult> {
        let id = self.resolve_directory_id(directory_id)?;
        self.reader.details(id.as_str()).await
    }

    pub async fn read_file_metadata(
        &self,
        directory_id: Option<&str>,
        file_path: &str,
    ) -> Result<FileContentResult> {
        let id = self.resolve_directory_id(directory_id)?;
        self.reader.read_file_metadata(id.as_str(), file_path).await
    }

    pub async fn download_file(&self, directory_id: Option<&str>, file_path: &str) -> Result<BinaryDownload> {
        let id = self.resolve_directory_id(directory_id)?;
        self.reader.download_file(id.as_str(), file_path).await
    }

    pub async fn download_zip(&self, directory_id: Option<&str>) -> Result<BinaryDownload> {
        let id = self.resolve_directory_id(directory_id)?;
        self.reader.download_zip(id.as_str()).await
    }
}
