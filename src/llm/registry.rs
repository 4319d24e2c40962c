//! Provider selection for the shared language-model client

use super::gemini::{GeminiService, DEFAULT_GEMINI_MODEL};
use super::openai::{ChatHost, OpenAIService, DEFAULT_GROQ_MODEL};
use super::{LlmError, LlmService, LoggingService};
use std::str::FromStr;
use std::sync::Arc;

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// LLM provider enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Groq,
}

impl Provider {
    pub fn display_name(self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Groq => "Groq",
        }
    }

    pub fn api_key_env_var(self) -> &'static str {
        match self {
            Provider::Gemini => "GEMINI_API_KEY",
            Provider::Groq => "GROQ_API_KEY",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            Provider::Gemini => DEFAULT_GEMINI_MODEL,
            Provider::Groq => DEFAULT_GROQ_MODEL,
        }
    }
}

impl FromStr for Provider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "groq" => Ok(Provider::Groq),
            other => Err(format!("unknown LLM provider '{other}'")),
        }
    }
}

/// Configuration for LLM providers
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub provider: Option<Provider>,
    pub gemini_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    /// Override for the provider's default model
    pub model: Option<String>,
    pub temperature: f32,
    /// Optional gateway base URL; the gateway handles authentication
    pub gateway: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: None,
            gemini_api_key: None,
            groq_api_key: None,
            model: None,
            temperature: DEFAULT_TEMPERATURE,
            gateway: None,
        }
    }
}

impl LlmConfig {
    pub fn from_env() -> Self {
        let provider = std::env::var("LLM_PROVIDER").ok().and_then(|raw| {
            raw.parse()
                .map_err(|e: String| tracing::warn!(error = %e, "Ignoring LLM_PROVIDER"))
                .ok()
        });

        Self {
            provider,
            gemini_api_key: non_empty_var("GEMINI_API_KEY"),
            groq_api_key: non_empty_var("GROQ_API_KEY"),
            model: non_empty_var("LLM_MODEL"),
            temperature: std::env::var("LLM_TEMPERATURE")
                .ok()
                .and_then(|t| t.parse().ok())
                .unwrap_or(DEFAULT_TEMPERATURE),
            gateway: non_empty_var("LLM_GATEWAY"),
        }
    }

    /// The provider to use: the explicit choice, else whichever key is set (Gemini first)
    pub fn resolved_provider(&self) -> Option<Provider> {
        self.provider.or_else(|| {
            if self.gemini_api_key.is_some() {
                Some(Provider::Gemini)
            } else if self.groq_api_key.is_some() || self.gateway.is_some() {
                Some(Provider::Groq)
            } else {
                None
            }
        })
    }

    fn api_key(&self, provider: Provider) -> Option<String> {
        // In gateway mode the gateway injects credentials
        if self.gateway.is_some() {
            return Some("implicit".to_string());
        }
        match provider {
            Provider::Gemini => self.gemini_api_key.clone(),
            Provider::Groq => self.groq_api_key.clone(),
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Build the process-wide model client described by `config`, wrapped with logging
pub fn connect(config: &LlmConfig) -> Result<Arc<dyn LlmService>, LlmError> {
    let provider = config.resolved_provider().ok_or_else(|| {
        LlmError::auth("No LLM API key configured. Set GEMINI_API_KEY or GROQ_API_KEY.")
    })?;

    let api_key = config.api_key(provider).ok_or_else(|| {
        LlmError::auth(format!(
            "{} environment variable not set",
            provider.api_key_env_var()
        ))
    })?;

    let model = config
        .model
        .clone()
        .unwrap_or_else(|| provider.default_model().to_string());
    let gateway = config.gateway.as_deref();

    let service: Arc<dyn LlmService> = match provider {
        Provider::Gemini => Arc::new(GeminiService::new(api_key, &model, gateway)?),
        Provider::Groq => Arc::new(OpenAIService::new(api_key, ChatHost::Groq, &model, gateway)?),
    };

    tracing::info!(
        provider = provider.display_name(),
        model = %model,
        gateway = gateway.is_some(),
        "LLM client initialized"
    );

    Ok(Arc::new(LoggingService::new(service)))
}
