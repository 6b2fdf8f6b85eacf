use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, Stream, StreamExt};
use reqwest::{
    header::CONTENT_TYPE,
    multipart::{Form, Part},
    Body, Client, Response,
};
use tracing::debug;

use crate::{
    config::ClientConfig,
    error::Result,
    progress::ProgressTracker,
    transport::{RawResponse, Transport},
    types::FileEntry,
};

/// Size of the slices file content is streamed in
const CHUNK_SIZE: usize = 64 * 1024;

/// reqwest-backed transport for the codebase service
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport from a validated configuration
    ///
    /// Without `timeout_secs` the reqwest defaults apply.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.as_str());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, target: &str) -> String {
        format!("{}/{}", self.base_url, target.trim_start_matches('/'))
    }

    async fn read_response(response: Response) -> Result<RawResponse> {
        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(String::from);

        let body = response.bytes().await?;

        Ok(RawResponse {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or_default().to_string(),
            content_type,
            body,
        })
    }
}

/// Stream `content` in slices, counting each slice as it is pulled by the connection
fn counted_chunks(
    content: Bytes,
    tracker: Arc<ProgressTracker>,
) -> impl Stream<Item = std::io::Result<Bytes>> + Send + Sync + 'static {
    let chunks: Vec<Bytes> = (0..content.len())
        .step_by(CHUNK_SIZE)
        .map(|start| content.slice(start..(start + CHUNK_SIZE).min(content.len())))
        .collect();

    stream::iter(chunks).map(move |chunk| {
        tracker.advance(chunk.len() as u64);
        Ok(chunk)
    })
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, target: &str) -> Result<RawResponse> {
        let url = self.url(target);
        debug!(%url, "GET");

        let response = self.client.get(&url).send().await?;
        Self::read_response(response).await
    }

    async fn post_files(
        &self,
        target: &str,
        field: &str,
        entries: &[FileEntry],
        tracker: Arc<ProgressTracker>,
    ) -> Result<RawResponse> {
        let url = self.url(target);

        // Filenames go out verbatim, so relative paths keep their `/`
        let mut form = Form::new().percent_encode_noop();
        for entry in entries {
            let length = entry.content.len() as u64;
            let body = Body::wrap_stream(counted_chunks(entry.content.clone(), tracker.clone()));
            let part = Part::stream_with_length(body, length).file_name(entry.upload_name().to_string());
            form = form.part(field.to_string(), part);
        }

        debug!(%url, parts = entries.len(), bytes = tracker.total_bytes(), "POST multipart");

        let response = self.client.post(&url).multipart(form).send().await?;
        Self::read_response(response).await
    }

    fn identifier(&self) -> String {
        format!("http:{}", self.base_url)
    }
}
