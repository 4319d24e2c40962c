//! Process configuration, read once from the environment at startup

use crate::llm::LlmConfig;
use crate::notify::NotifierConfig;
use crate::runtime::Timeouts;
use crate::state_machine::{ExitMatch, ExitPolicy};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_PORT: u16 = 8000;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
    #[error("no LLM API key configured; set GEMINI_API_KEY or GROQ_API_KEY")]
    MissingLlmKey,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub db_path: PathBuf,
    pub llm: LlmConfig,
    pub exit: ExitPolicy,
    pub timeouts: Timeouts,
    pub notifier: NotifierConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let var = |name: &str| std::env::var(name).ok();

        let llm = LlmConfig::from_env();
        if llm.resolved_provider().is_none() {
            return Err(ConfigError::MissingLlmKey);
        }

        let defaults = Timeouts::default();
        Ok(Self {
            port: parse_or("CHECKUP_PORT", var("CHECKUP_PORT"), DEFAULT_PORT)?,
            db_path: var("CHECKUP_DB_PATH")
                .filter(|p| !p.trim().is_empty())
                .map_or_else(|| default_db_path(var("HOME")), PathBuf::from),
            llm,
            exit: exit_policy(var("CHECKUP_EXIT_TOKEN"), var("CHECKUP_MODEL_EXIT_MATCH"))?,
            timeouts: Timeouts {
                responder: secs_or(
                    "CHECKUP_RESPONDER_TIMEOUT_SECS",
                    var("CHECKUP_RESPONDER_TIMEOUT_SECS"),
                    defaults.responder,
                )?,
                summarizer: secs_or(
                    "CHECKUP_SUMMARIZER_TIMEOUT_SECS",
                    var("CHECKUP_SUMMARIZER_TIMEOUT_SECS"),
                    defaults.summarizer,
                )?,
                notifier: secs_or(
                    "CHECKUP_NOTIFIER_TIMEOUT_SECS",
                    var("CHECKUP_NOTIFIER_TIMEOUT_SECS"),
                    defaults.notifier,
                )?,
            },
            notifier: NotifierConfig::from_env(),
        })
    }
}

fn default_db_path(home: Option<String>) -> PathBuf {
    let home = home.unwrap_or_else(|| "/tmp".to_string());
    PathBuf::from(home).join(".checkup-bot").join("summaries.db")
}

fn exit_policy(token: Option<String>, model_match: Option<String>) -> Result<ExitPolicy, ConfigError> {
    let model_match = match model_match.filter(|m| !m.trim().is_empty()) {
        Some(raw) => raw.parse::<ExitMatch>().map_err(|_| ConfigError::Invalid {
            name: "CHECKUP_MODEL_EXIT_MATCH",
            value: raw,
        })?,
        None => ExitMatch::default(),
    };
    Ok(ExitPolicy::new(token.as_deref().unwrap_or("EXIT"), model_match))
}

fn parse_or<T: std::str::FromStr>(
    name: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw.filter(|v| !v.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

fn secs_or(name: &'static str, raw: Option<String>, default: Duration) -> Result<Duration, ConfigError> {
    let secs: u64 = parse_or(name, raw, default.as_secs())?;
    if secs == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: "0".to_string(),
        });
    }
    Ok(Duration::from_secs(secs))
}
