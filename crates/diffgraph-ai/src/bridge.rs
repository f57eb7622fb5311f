//! The per-file analysis contract

use diffgraph_core::{ChangeKind, ComponentRecord};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// A component already in the graph for the file being analysed, passed
/// along so the analysis can stay consistent with earlier reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnownComponent {
    pub name: String,
    pub summary: Option<String>,
}

/// Request for the analysis of one changed file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileAnalysisRequest {
    /// Path relative to the repository root
    pub file_path: String,
    pub change_kind: ChangeKind,
    /// Full text for added and deleted files, a unified diff for modified ones
    pub content: String,
    pub known_components: Vec<KnownComponent>,
}

/// Result of analysing one file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileAnalysis {
    /// Natural language summary of the change
    pub summary: String,
    /// Components that changed, in reported order
    pub components: Vec<ComponentRecord>,
    /// Tokens used for this analysis
    pub tokens_used: u32,
}

/// Analysis backend trait
#[async_trait::async_trait]
pub trait AnalysisProvider: Send + Sync {
    /// Name the components a file change touches and how they depend on
    /// each other.
    async fn analyze_file(&self, request: &FileAnalysisRequest) -> Result<FileAnalysis, AnalysisError>;

    /// Get provider name
    fn name(&self) -> &str;
}

#[async_trait::async_trait]
impl AnalysisProvider for Box<dyn AnalysisProvider> {
    async fn analyze_file(&self, request: &FileAnalysisRequest) -> Result<FileAnalysis, AnalysisError> {
        (**self).analyze_file(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
