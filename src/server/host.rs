//! Server host holding the state shared by every exposure
//!
//! The host owns the configuration and the submission pipeline. Exposures
//! consume an `Arc<ServerHost>` and build their routers from it.

use crate::config::IntakeConfig;
use crate::core::service::ServiceConnector;
use crate::intake::handlers::AppState;
use crate::intake::pipeline::{Clock, SubmissionPipeline};
use std::sync::Arc;

/// Multipart framing and text fields on top of the proof itself
const BODY_SLACK_BYTES: usize = 64 * 1024;

/// Host context containing all intake state
pub struct ServerHost {
    pub config: Arc<IntakeConfig>,
    pub pipeline: Arc<SubmissionPipeline>,
}

impl ServerHost {
    pub fn new(
        config: IntakeConfig,
        connector: Arc<dyn ServiceConnector>,
        clock: Option<Arc<dyn Clock>>,
    ) -> Self {
        let mut pipeline = SubmissionPipeline::new(&config, connector);
        if let Some(clock) = clock {
            pipeline = pipeline.with_clock(clock);
        }

        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }

    /// Largest request body accepted by `POST /orders`
    pub fn body_limit(&self) -> usize {
        self.config.catalog.max_proof_bytes + BODY_SLACK_BYTES
    }

    /// Handler state for the order routes
    pub fn app_state(&self) -> AppState {
        AppState {
            pipeline: self.pipeline.clone(),
            body_limit: self.body_limit(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryBackend;

    #[test]
    fn test_body_limit_leaves_room_for_fields() {
        let host = ServerHost::new(
            IntakeConfig::default_config(),
            Arc::new(InMemoryBackend::default()),
            None,
        );
        assert!(host.body_limit() > host.config.catalog.max_proof_bytes);
        assert_eq!(host.app_state().body_limit, host.body_limit());
    }
}
