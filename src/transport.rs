use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;

use crate::{
    error::{ClientError, Result},
    progress::ProgressTracker,
    types::FileEntry,
};

/// A fully read HTTP response
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: Bytes,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into `ClientError::Remote`, leaving the body unread
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ClientError::Remote {
                status: self.status,
                status_text: self.status_text,
            })
        }
    }

    /// Decode the body as JSON
    pub fn json(&self) -> Result<Value> {
        Ok(serde_json::from_slice(&self.body)?)
    }
}

/// Core abstraction over the remote codebase service
///
/// Targets are a path plus optional query, relative to the service base URL.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue a GET and read the whole response
    ///
    /// Only transport failures are errors; any HTTP status is returned as-is.
    async fn get(&self, target: &str) -> Result<RawResponse>;

    /// POST `entries` as a multipart body, one part per entry under `field`
    ///
    /// Bytes handed to the connection are reported through `tracker`.
    async fn post_files(
        &self,
        target: &str,
        field: &str,
        entries: &[FileEntry],
        tracker: Arc<ProgressTracker>,
    ) -> Result<RawResponse>;

    /// Human-readable identifier for this transport (for logging/debugging)
    fn identifier(&self) -> String;
}
