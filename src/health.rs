use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::{error::ClientError, transport::Transport};

/// What a verbose health check found
#[derive(Debug)]
pub enum HealthDetail {
    /// Body returned by a healthy service
    Body(Value),
    /// Why the service is considered offline
    Failure(ClientError),
}

/// Result of one liveness check
#[derive(Debug)]
pub struct HealthStatus {
    pub online: bool,
    /// Only filled in for verbose checks
    pub detail: Option<HealthDetail>,
}

impl HealthStatus {
    pub fn error(&self) -> Option<&ClientError> {
        match &self.detail {
            Some(HealthDetail::Failure(e)) => Some(e),
            _ => None,
        }
    }
}

/// Queries `/health`; never fails
pub struct HealthProbe {
    transport: Arc<dyn Transport>,
}

impl HealthProbe {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// Check liveness; `verbose` keeps the body or the failure in `detail`
    pub async fn check(&self, verbose: bool) -> HealthStatus {
        let outcome = match self.transport.get("/health").await {
            Ok(response) => response.error_for_status().and_then(|r| r.json()),
            Err(e) => Err(e),
        };

        let (online, detail) = match outcome {
            Ok(body) => {
                debug!(transport = %self.transport.identifier(), "Service online");
                (true, HealthDetail::Body(body))
            }
            Err(e) => {
                warn!(transport = %self.transport.identifier(), error = %e, "Service offline");
                (false, HealthDetail::Failure(e))
            }
        };

        HealthStatus {
            online,
            detail: verbose.then_some(detail),
        }
    }
}
