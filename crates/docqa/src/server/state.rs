//! Application state for the HTTP server

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::DocQaConfig;
use crate::error::Result;
use crate::pipeline::RetrievalPipeline;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    pipeline: Arc<RetrievalPipeline>,
    config: DocQaConfig,
    started_at: DateTime<Utc>,
}

impl AppState {
    /// Create state around an existing pipeline
    pub fn new(pipeline: Arc<RetrievalPipeline>, config: DocQaConfig) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                pipeline,
                config,
                started_at: Utc::now(),
            }),
        }
    }

    /// Create state and the configured pipeline
    pub fn from_config(config: DocQaConfig) -> Result<Self> {
        let pipeline = Arc::new(RetrievalPipeline::from_config(&config)?);
        Ok(Self::new(pipeline, config))
    }

    pub fn pipeline(&self) -> &Arc<RetrievalPipeline> {
        &self.inner.pipeline
    }

    pub fn config(&self) -> &DocQaConfig {
        &self.inner.config
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.inner.started_at
    }

    /// Whether questions can be answered
    pub fn is_ready(&self) -> bool {
        self.inner.pipeline.current_index().is_some()
    }
}
