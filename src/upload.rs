use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    error::{ClientError, Result},
    progress::{ProgressObserver, ProgressTracker},
    response::{error_message, UploadResult},
    transport::Transport,
    types::SelectionBatch,
};

/// Multipart field every file part is sent under
pub const UPLOAD_FIELD: &str = "files";
/// Message reported when the request never completed
pub const NETWORK_ERROR_MESSAGE: &str = "network error";

/// Sends a selection batch to the codebase service
pub struct Uploader {
    transport: Arc<dyn Transport>,
}

impl Uploader {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Upload every entry of `batch` in one multipart request
    ///
    /// Only an empty batch is an error; every other failure is reported inside the
    /// returned `UploadResult`. Nothing is retried.
    pub async fn upload(
        &self,
        batch: &SelectionBatch,
        observer: Arc<dyn ProgressObserver>,
    ) -> Result<UploadResult> {
        if batch.is_empty() {
            return Err(ClientError::validation("no files selected"));
        }

        let tracker = Arc::new(ProgressTracker::new(batch.total_size_bytes, observer));
        tracker.assembled();

        let response = match self
            .transport
            .post_files("/upload", UPLOAD_FIELD, &batch.entries, tracker.clone())
            .await
        {
            Ok(response) => response,
            Err(ClientError::Network(e)) => {
                warn!(transport = %self.transport.identifier(), error = %e, "Upload did not complete");
                return Ok(UploadResult::failure(NETWORK_ERROR_MESSAGE));
            }
            Err(e) => {
                warn!(error = %e, "Upload failed");
                return Ok(UploadResult::failure(e.to_string()));
            }
        };
        tracker.complete();

        let body = match response.json() {
            Ok(body) => body,
            Err(e) => {
                warn!(status = response.status, error = %e, "Upload response is not JSON");
                return Ok(UploadResult::failure(e.to_string()));
            }
        };

        let mut result = UploadResult::from_body(body);
        if !response.is_success() {
            result.success = false;
            result.directory_id = None;
            result.error_message = Some(
                result
                    .raw_body
                    .as_ref()
                    .and_then(error_message)
                    .unwrap_or_else(|| format!("HTTP {}: {}", response.status, response.status_text)),
            );
        }

        match &result.directory_id {
            Some(id) if result.success => info!(
                directory_id = %id,
                files = batch.len(),
                bytes = batch.total_size_bytes,
                "Upload complete"
            ),
            _ => warn!(error = ?result.error_message, "Upload rejected"),
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{NoProgress, ProgressRecorder};
    use crate::selection::normalize;
    use crate::transport::RawResponse;
    use crate::types::{FileEntry, SelectionMode};
    use async_trait::async_trait;
    use bytes::Bytes;
    use parking_lot::Mutex;

    /// Transport that answers every upload with a canned response
    struct CannedTransport {
        status: u16,
        body: &'static str,
        seen: Mutex<Vec<(String, Vec<String>)>>,
    }

    impl CannedTransport {
        fn new(status: u16, body: &'static str) -> Self {
            Self {
                status,
                body,
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for CannedTransport {
        async fn get(&self, _target: &str) -> Result<RawResponse> {
            unreachable!("uploads never GET")
        }

        async fn post_files(
            &self,
            _target: &str,
            field: &str,
            entries: &[FileEntry],
            tracker: Arc<ProgressTracker>,
        ) -> Result<RawResponse> {
            let names = entries.iter().map(|e| e.upload_name().to_string()).collect();
            self.seen.lock().push((field.to_string(), names));
            for entry in entries {
                tracker.advance(entry.size);
            }
            Ok(RawResponse {
                status: self.status,
                status_text: String::new(),
                content_type: Some("application/json".to_string()),
                body: Bytes::from_static(self.body.as_bytes()),
            })
        }

        fn identifier(&self) -> String {
            "canned".to_string()
        }
    }

    fn two_files() -> SelectionBatch {
        normalize(
            vec![
                FileEntry::new("a.py", vec![b'a'; 10]),
                FileEntry::new("b.py", vec![b'b'; 20]),
            ],
            SelectionMode::Files,
        )
    }

    #[tokio::test]
    async fn test_parts_keep_order_and_field() {
        let transport = Arc::new(CannedTransport::new(200, r#"{"success":true,"uuid":"abc-123"}"#));
        let uploader = Uploader::new(transport.clone());

        let result = uploader
            .upload(&two_files(), Arc::new(NoProgress))
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.directory_id.unwrap().as_str(), "abc-123");
        let seen = transport.seen.lock();
        assert_eq!(seen[0].0, "files");
        assert_eq!(seen[0].1, vec!["a.py", "b.py"]);
    }

    #[tokio::test]
    async fn test_progress_ends_at_one() {
        let transport = Arc::new(CannedTransport::new(200, r#"{"success":true,"uuid":"x"}"#));
        let recorder = Arc::new(ProgressRecorder::new());

        Uploader::new(transport)
            .upload(&two_files(), recorder.clone())
            .await
            .unwrap();

        let values = recorder.values();
        assert_eq!(values[0], 0.25);
        assert!(values.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(recorder.last(), Some(1.0));
    }

    #[tokio::test]
    async fn test_unparseable_body() {
        let transport = Arc::new(CannedTransport::new(200, "<html>oops</html>"));
        let result = Uploader::new(transport)
            .upload(&two_files(), Arc::new(NoProgress))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.raw_body.is_none());
        assert_ne!(result.error_message.as_deref(), Some(NETWORK_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_error_status_uses_body_message() {
        let transport = Arc::new(CannedTransport::new(
            400,
            r#"{"success":false,"error":"No files uploaded"}"#,
        ));
        let result = Uploader::new(transport)
            .upload(&two_files(), Arc::new(NoProgress))
            .await
            .unwrap();

        assert!(!result.success);
        assert_eq!(result.error_message.as_deref(), Some("No files uploaded"));
    }

    #[tokio::test]
    async fn test_success_without_explicit_flag_is_failure() {
        let transport = Arc::new(CannedTransport::new(200, r#"{"uuid":"abc-123"}"#));
        let result = Uploader::new(transport)
            .upload(&two_files(), Arc::new(NoProgress))
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.directory_id.is_none());
    }
}
