//! Analysis provider implementations

pub mod local;
pub mod openai;

use super::bridge::AnalysisProvider;
use anyhow::Result;

/// Settings a provider may need at construction
#[derive(Debug, Clone, Default)]
pub struct ProviderOptions {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

/// Factory function to create analysis providers
pub fn create_provider(provider_name: &str, options: &ProviderOptions) -> Result<Box<dyn AnalysisProvider>> {
    match provider_name.trim().to_ascii_lowercase().as_str() {
        "openai" => {
            let api_key = options
                .api_key
                .clone()
                .filter(|k| !k.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("OpenAI API key is required. Set OPENAI_API_KEY or pass --api-key"))?;
            let mut provider = openai::OpenAIProvider::new(api_key);
            if let Some(model) = &options.model {
                provider = provider.with_model(model.clone());
            }
            if let Some(base_url) = &options.base_url {
                provider = provider.with_base_url(base_url.clone());
            }
            Ok(Box::new(provider))
        }
        "local" => Ok(Box::new(local::LocalProvider::new()?)),
        _ => anyhow::bail!("Unknown analysis provider: {}", provider_name),
    }
}
