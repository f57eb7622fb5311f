//! The analysis pipeline

use std::collections::HashMap;

use diffgraph_ai::{AnalysisError, AnalysisProvider, Budget, BudgetWarning, FileAnalysisRequest, KnownComponent, RetryPolicy, RetryingProvider};
use diffgraph_core::{
    ComponentKey, ComponentRecord, DependencyMatcher, Direction, GraphStore, MatchStrategy, MermaidRenderer, NewComponent,
    StoreStats, resolve_reference, run_summary,
};
use diffgraph_git::FileChange;
use tracing::{debug, error, info, warn};

/// Options for one run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub matching: MatchStrategy,
    pub direction: Direction,
    /// Re-resolve every stored reference once all files are analysed
    pub link_pass: bool,
    pub retry: RetryPolicy,
    /// Token cap for the run; `None` means unlimited
    pub max_tokens: Option<u64>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            matching: MatchStrategy::default(),
            direction: Direction::default(),
            link_pass: true,
            retry: RetryPolicy::default(),
            max_tokens: None,
        }
    }
}

/// Result of a run
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Mermaid flowchart text
    pub diagram: String,
    /// Markdown summary, one section per file
    pub summary: String,
    pub stats: StoreStats,
    pub tokens_used: u64,
    /// The token budget ran out before the worklist was empty
    pub stopped_early: bool,
}

/// Sequential analysis of changed files into a [`GraphStore`]
pub struct AnalysisPipeline {
    provider: RetryingProvider<Box<dyn AnalysisProvider>>,
    matcher: Box<dyn DependencyMatcher>,
    options: PipelineOptions,
    store: GraphStore,
    contents: HashMap<String, Option<String>>,
    budget: Budget,
}

impl AnalysisPipeline {
    pub fn new(provider: Box<dyn AnalysisProvider>, options: PipelineOptions) -> Self {
        let budget = match options.max_tokens {
            Some(total) => Budget::new(total),
            None => Budget::unlimited(),
        };
        Self {
            provider: RetryingProvider::new(provider, options.retry),
            matcher: options.matching.matcher(),
            options,
            store: GraphStore::new(),
            contents: HashMap::new(),
            budget,
        }
    }

    /// Register changed files. Paths already seen are ignored.
    pub fn enqueue(&mut self, changes: impl IntoIterator<Item = FileChange>) {
        for change in changes {
            if self.store.add_file(change.path.clone(), change.change_kind) {
                debug!("Queued {} ({})", change.path, change.change_kind);
                self.contents.insert(change.path, change.content);
            }
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    /// Analyse every queued file, then render.
    pub async fn run(&mut self) -> RunOutcome {
        info!(
            "Analysing {} file(s) with {}",
            self.store.queued(),
            self.provider.name()
        );

        let mut stopped_early = false;
        while let Some(path) = self.store.get_next_file() {
            // The dequeued file stays pending.
            if self.budget.is_exhausted() {
                warn!(
                    "Token budget exhausted after {} tokens, {} file(s) left unanalysed",
                    self.budget.tokens_used,
                    self.store.queued() + 1
                );
                stopped_early = true;
                break;
            }
            self.process_file(&path).await;
        }

        if self.options.link_pass {
            let added = self.link_all();
            debug!("Final link pass added {} edge(s)", added);
        }

        let stats = self.store.stats();
        info!(
            "Run complete: {} processed, {} failed, {} components, {} edges",
            stats.processed, stats.errored, stats.components, stats.component_edges
        );

        RunOutcome {
            diagram: MermaidRenderer::new()
                .with_direction(self.options.direction)
                .render(&self.store),
            summary: run_summary(&self.store),
            stats,
            tokens_used: self.budget.tokens_used,
            stopped_early,
        }
    }

    async fn process_file(&mut self, path: &str) {
        info!("Analysing {}", path);
        if let Err(e) = self.store.mark_processing(path) {
            warn!("Skipping {}: {}", path, e);
            return;
        }

        let result = match self.build_request(path) {
            Some(request) => self.provider.analyze_file(&request).await,
            None => Err(AnalysisError::ContentNotFound(path.to_string())),
        };

        match result {
            Ok(analysis) => {
                self.record_tokens(u64::from(analysis.tokens_used));
                let (components, edges) = self.apply_components(path, &analysis.components);
                if let Err(e) = self.store.mark_processed(path, analysis.summary, analysis.components) {
                    warn!("Could not mark {} processed: {}", path, e);
                }
                info!("Finished {}: {} component(s), {} new edge(s)", path, components, edges);
            }
            Err(e) => {
                error!("Analysis failed for {}: {}", path, e);
                if let Err(mark_err) = self.store.mark_error(path, e.to_string()) {
                    warn!("Could not mark {} failed: {}", path, mark_err);
                }
            }
        }
    }

    fn record_tokens(&mut self, tokens: u64) {
        let before = self.budget.warning_level();
        self.budget.use_tokens(tokens);
        let after = self.budget.warning_level();
        if after == before {
            return;
        }
        let remaining = self.budget.remaining().unwrap_or(0);
        let percentage = self.budget.usage_percentage();
        match after {
            BudgetWarning::Healthy => {}
            BudgetWarning::Warning => {
                info!("Token budget {:.0}% used, {} tokens left", percentage, remaining);
            }
            BudgetWarning::Critical | BudgetWarning::Exhausted => {
                warn!("Token budget {:.0}% used, {} tokens left", percentage, remaining);
            }
        }
    }

    fn build_request(&self, path: &str) -> Option<FileAnalysisRequest> {
        let content = self.contents.get(path).cloned().flatten()?;
        let file = self.store.file(path)?;
        let known_components = self
            .store
            .components_in_file(path)
            .map(|c| KnownComponent {
                name: c.name.clone(),
                summary: c.summary.clone(),
            })
            .collect();
        Some(FileAnalysisRequest {
            file_path: path.to_string(),
            change_kind: file.change_kind,
            content,
            known_components,
        })
    }

    /// Add the reported components, then link their references. Returns
    /// (components applied, edges added).
    fn apply_components(&mut self, path: &str, records: &[ComponentRecord]) -> (usize, usize) {
        let keys: Vec<ComponentKey> = records
            .iter()
            .map(|record| self.store.add_component(NewComponent::from_record(path, record)))
            .collect();

        let mut edges = 0;
        for (key, record) in keys.iter().zip(records) {
            edges += self.link(key, &record.dependencies, &record.dependents);
        }
        (keys.len(), edges)
    }

    /// `dependencies` give `key -> target`, `dependents` give `source -> key`.
    fn link<S: AsRef<str>>(&mut self, key: &ComponentKey, dependencies: &[S], dependents: &[S]) -> usize {
        let mut added = 0;
        for reference in dependencies {
            for target in resolve_reference(&self.store, reference.as_ref(), self.matcher.as_ref()) {
                if self.store.add_component_dependency(key.as_str(), target.as_str()) {
                    added += 1;
                }
            }
        }
        for reference in dependents {
            for source in resolve_reference(&self.store, reference.as_ref(), self.matcher.as_ref()) {
                if self.store.add_component_dependency(source.as_str(), key.as_str()) {
                    added += 1;
                }
            }
        }
        added
    }

    /// Resolve every stored reference again, so names of components that
    /// appeared after the referring file was analysed become edges too.
    fn link_all(&mut self) -> usize {
        let pending: Vec<(ComponentKey, Vec<String>, Vec<String>)> = self
            .store
            .components()
            .map(|c| {
                (
                    c.key.clone(),
                    c.dependencies.iter().cloned().collect(),
                    c.dependents.iter().cloned().collect(),
                )
            })
            .collect();

        pending
            .into_iter()
            .map(|(key, dependencies, dependents)| self.link(&key, &dependencies, &dependents))
            .sum()
    }
}
