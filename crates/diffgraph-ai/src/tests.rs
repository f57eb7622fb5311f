//! Unit tests for diffgraph-ai

use crate::bridge::{AnalysisProvider, FileAnalysis, FileAnalysisRequest, KnownComponent};
use crate::budget::{Budget, BudgetWarning};
use crate::error::AnalysisError;
use crate::prompt::file_analysis_prompt;
use crate::providers::{ProviderOptions, create_provider};
use crate::retry::{RetryPolicy, RetryingProvider};
use diffgraph_core::{ChangeKind, ComponentType};
use std::sync::atomic::{AtomicUsize, Ordering};

fn request(path: &str, kind: ChangeKind, content: &str) -> FileAnalysisRequest {
    FileAnalysisRequest {
        file_path: path.to_string(),
        change_kind: kind,
        content: content.to_string(),
        known_components: Vec::new(),
    }
}

/// Fails with the scripted errors first, then succeeds.
struct ScriptedProvider {
    calls: AtomicUsize,
    rate_limited_calls: usize,
    fail_with_api_error: bool,
}

impl ScriptedProvider {
    fn rate_limited(times: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            rate_limited_calls: times,
            fail_with_api_error: false,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AnalysisProvider for ScriptedProvider {
    async fn analyze_file(&self, request: &FileAnalysisRequest) -> Result<FileAnalysis, AnalysisError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_with_api_error {
            return Err(AnalysisError::Api {
                status: 500,
                message: "server error".to_string(),
            });
        }
        if call < self.rate_limited_calls {
            return Err(AnalysisError::RateLimited {
                retry_after: Some("0".to_string()),
                message: format!("slow down ({})", call),
            });
        }
        Ok(FileAnalysis {
            summary: format!("analysed {}", request.file_path),
            ..FileAnalysis::default()
        })
    }

    fn name(&self) -> &str {
        "Scripted"
    }
}

#[test]
fn test_provider_creation() {
    let options = ProviderOptions::default();

    // OpenAI needs a key
    assert!(create_provider("openai", &options).is_err());
    let with_key = ProviderOptions {
        api_key: Some("sk-test".to_string()),
        ..ProviderOptions::default()
    };
    assert_eq!(create_provider("OpenAI", &with_key).unwrap().name(), "OpenAI");

    let local = create_provider("local", &options);
    assert!(local.is_ok());

    // Test unknown provider
    let unknown = create_provider("unknown", &options);
    assert!(unknown.is_err());
}

#[tokio::test]
async fn test_local_provider_analysis() {
    let provider = create_provider("local", &ProviderOptions::default()).unwrap();
    let analysis = provider
        .analyze_file(&request(
            "b.py",
            ChangeKind::Added,
            "def bar():\n    return Foo()\n",
        ))
        .await
        .unwrap();

    assert_eq!(analysis.summary, "Added b.py: touches bar.");
    assert_eq!(analysis.tokens_used, 0);
    assert_eq!(analysis.components.len(), 1);
    let bar = &analysis.components[0];
    assert_eq!(bar.component_type, ComponentType::Function);
    assert_eq!(bar.change_kind, ChangeKind::Added);
    assert_eq!(bar.dependencies, vec!["Foo"]);
}

#[tokio::test]
async fn test_retry_recovers_from_rate_limits() {
    let provider = RetryingProvider::new(ScriptedProvider::rate_limited(4), RetryPolicy::immediate(5));
    let analysis = provider
        .analyze_file(&request("a.py", ChangeKind::Modified, ""))
        .await
        .unwrap();

    assert_eq!(analysis.summary, "analysed a.py");
    assert_eq!(provider.name(), "Scripted");
}

#[tokio::test]
async fn test_retry_exhaustion_returns_last_rate_limit() {
    let inner = ScriptedProvider::rate_limited(usize::MAX);
    let req = request("c.py", ChangeKind::Deleted, "");
    let policy = RetryPolicy::immediate(5);
    let err = policy
        .with_retry(|| inner.analyze_file(&req))
        .await
        .unwrap_err();

    assert_eq!(inner.calls(), 5);
    match err {
        AnalysisError::RateLimited { message, .. } => assert_eq!(message, "slow down (4)"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_other_errors_are_not_retried() {
    let inner = ScriptedProvider {
        fail_with_api_error: true,
        ..ScriptedProvider::rate_limited(0)
    };
    let req = request("a.py", ChangeKind::Modified, "");
    let policy = RetryPolicy::immediate(5);
    let err = policy
        .with_retry(|| inner.analyze_file(&req))
        .await
        .unwrap_err();

    assert!(matches!(err, AnalysisError::Api { status: 500, .. }));
    assert_eq!(inner.calls(), 1);
}

#[test]
fn test_prompt_lists_known_components() {
    let mut req = request("src/app.py", ChangeKind::Modified, "@@ -1 +1 @@\n-a\n+b\n");
    req.known_components = vec![
        KnownComponent {
            name: "App".to_string(),
            summary: Some("Entry point".to_string()),
        },
        KnownComponent {
            name: "helper".to_string(),
            summary: None,
        },
    ];
    let prompt = file_analysis_prompt(&req);

    assert!(prompt.starts_with("File: src/app.py\nStatus: modified\n"));
    assert!(prompt.contains("- App: Entry point\n- helper\n"));
    assert!(prompt.contains("Diff against the last commit:\n```\n@@ -1 +1 @@\n-a\n+b\n```"));
}

#[test]
fn test_budget_tracking() {
    let mut budget = Budget::new(1000);
    budget.use_tokens(600);
    assert_eq!(budget.remaining(), Some(400));
    assert_eq!(budget.warning_level(), BudgetWarning::Warning);
    assert!(!budget.is_exhausted());
    budget.use_tokens(400);
    assert!(budget.is_exhausted());
    assert_eq!(budget.warning_level(), BudgetWarning::Exhausted);

    let mut unlimited = Budget::unlimited();
    unlimited.use_tokens(u64::MAX);
    assert!(!unlimited.is_exhausted());
    assert_eq!(unlimited.remaining(), None);
    assert_eq!(unlimited.warning_level(), BudgetWarning::Healthy);
}
