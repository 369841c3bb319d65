//! Document source trait: where the pipeline gets its pages from

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::types::LoadedCorpus;

/// Trait for loading the page corpus an index is built from
///
/// Implementations:
/// - `PdfDirectoryLoader`: a directory of PDF files
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Load every page, in deterministic order
    async fn load(&self) -> Result<LoadedCorpus>;

    /// Location the pages are read from (for diagnostics)
    fn location(&self) -> &Path;

    /// Get source name for logging
    fn name(&self) -> &str;
}
