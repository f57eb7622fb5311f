//! Run settings
//!
//! Layered lowest to highest: built-in defaults, `.diffgraph.toml` at the
//! repository root, the environment (after loading a `.env` file), then
//! command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use diffgraph_ai::{ProviderOptions, RetryPolicy};
use diffgraph_core::{Direction, MatchStrategy};
use diffgraph_pipeline::PipelineOptions;
use serde::Deserialize;

pub const CONFIG_FILE: &str = ".diffgraph.toml";
pub const DEFAULT_OUTPUT: &str = "diffgraph.html";

/// Fully resolved settings for one `analyze` run
#[derive(Debug, Clone)]
pub struct Settings {
    pub provider: String,
    /// `None` uses the provider's default model
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// Token cap for the run; `None` means unlimited
    pub max_tokens: Option<u64>,
    pub retry: RetryPolicy,
    pub matching: MatchStrategy,
    pub direction: Direction,
    pub link_pass: bool,
    pub output: PathBuf,
    pub open: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: None,
            api_key: None,
            base_url: None,
            max_tokens: None,
            retry: RetryPolicy::default(),
            matching: MatchStrategy::default(),
            direction: Direction::default(),
            link_pass: true,
            output: PathBuf::from(DEFAULT_OUTPUT),
            open: true,
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub provider: Option<String>,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub matching: Option<MatchStrategy>,
    pub direction: Option<Direction>,
    pub max_tokens: Option<u64>,
    pub output: Option<PathBuf>,
    pub no_open: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    ai: AiSection,
    retry: RetrySection,
    graph: GraphSection,
    report: ReportSection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct AiSection {
    provider: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    max_tokens: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RetrySection {
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
    max_jitter_ms: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct GraphSection {
    matching: Option<MatchStrategy>,
    direction: Option<Direction>,
    link_pass: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ReportSection {
    output: Option<PathBuf>,
    open: Option<bool>,
}

impl Settings {
    /// Defaults, then `.diffgraph.toml` under `root`, then the process
    /// environment.
    pub fn load(root: &Path) -> Result<Self> {
        let mut settings = Self::default();

        let path = root.join(CONFIG_FILE);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            settings
                .apply_file(&contents)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            tracing::debug!("Loaded settings from {}", path.display());
        }

        load_dotenv();
        settings.apply_env(|name| std::env::var(name).ok());
        Ok(settings)
    }

    fn apply_file(&mut self, contents: &str) -> Result<()> {
        let file: FileConfig = toml::from_str(contents)?;

        let ai = file.ai;
        if let Some(provider) = ai.provider {
            self.provider = provider;
        }
        self.model = ai.model.or(self.model.take());
        self.api_key = ai.api_key.or(self.api_key.take());
        self.base_url = ai.base_url.or(self.base_url.take());
        self.max_tokens = ai.max_tokens.or(self.max_tokens);

        let retry = file.retry;
        if let Some(attempts) = retry.max_attempts {
            self.retry.max_attempts = attempts.max(1);
        }
        if let Some(ms) = retry.base_delay_ms {
            self.retry.base_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = retry.max_delay_ms {
            self.retry.max_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = retry.max_jitter_ms {
            self.retry.max_jitter = Duration::from_millis(ms);
        }

        let graph = file.graph;
        self.matching = graph.matching.unwrap_or(self.matching);
        self.direction = graph.direction.unwrap_or(self.direction);
        self.link_pass = graph.link_pass.unwrap_or(self.link_pass);

        let report = file.report;
        if let Some(output) = report.output {
            self.output = output;
        }
        self.open = report.open.unwrap_or(self.open);
        Ok(())
    }

    /// Apply environment variables read through `var`. Blank values are
    /// treated as unset.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let var = |name: &str| var(name).filter(|value| !value.trim().is_empty());

        if let Some(key) = var("OPENAI_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(provider) = var("DIFFGRAPH_PROVIDER") {
            self.provider = provider;
        }
        if let Some(model) = var("DIFFGRAPH_MODEL") {
            self.model = Some(model);
        }
        if let Some(base_url) = var("OPENAI_BASE_URL") {
            self.base_url = Some(base_url);
        }
    }

    pub fn apply_overrides(&mut self, overrides: Overrides) {
        if let Some(provider) = overrides.provider {
            self.provider = provider;
        }
        self.model = overrides.model.or(self.model.take());
        self.api_key = overrides.api_key.or(self.api_key.take());
        self.matching = overrides.matching.unwrap_or(self.matching);
        self.direction = overrides.direction.unwrap_or(self.direction);
        self.max_tokens = overrides.max_tokens.or(self.max_tokens);
        if let Some(output) = overrides.output {
            self.output = output;
        }
        if overrides.no_open {
            self.open = false;
        }
    }

    pub fn provider_options(&self) -> ProviderOptions {
        ProviderOptions {
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            base_url: self.base_url.clone(),
        }
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            matching: self.matching,
            direction: self.direction,
            link_pass: self.link_pass,
            retry: self.retry,
            max_tokens: self.max_tokens,
        }
    }
}

/// Where a `.env` file is looked for, in order.
pub fn env_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(".env")];
    if let Some(dir) = std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf)) {
        candidates.push(dir.join(".env"));
    }
    candidates
}

/// Load the first existing `.env` candidate. Returns the file used.
pub fn load_dotenv() -> Option<PathBuf> {
    let path = env_candidates().into_iter().find(|path| path.is_file())?;
    match dotenvy::from_path(&path) {
        Ok(()) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) => {
            tracing::warn!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}

/// Show enough of a key to tell keys apart.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..6].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
