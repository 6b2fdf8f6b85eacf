pub mod client;
pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod present;
pub mod progress;
pub mod reader;
pub mod response;
pub mod selection;
pub mod transport;
pub mod types;
pub mod upload;

pub use client::CodebaseClient;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
pub use health::{HealthDetail, HealthProbe, HealthStatus};
pub use http::HttpTransport;
pub use progress::{NoProgress, ProgressObserver, ProgressRecorder, ProgressTracker};
pub use reader::{BinaryDownload, CodebaseReader};
pub use response::{
    CodebaseResult, CodebaseSummary, CollectionResult, FileContentResult, RemoteFile,
    RemoteFileContent, SuccessPolicy, UploadResult,
};
pub use selection::normalize;
pub use transport::{RawResponse, Transport};
pub use types::{DirectoryId, FileEntry, ReadOperation, ReadRequest, SelectionBatch, SelectionMode};
pub use upload::Uploader;
