//! Loading service configuration (upstream API, scoring, optional local game bank) from TOML.
//!
//! See `QuizConfig` for the expected schema. Environment variables win over the file.

use serde::Deserialize;
use tracing::{error, info};

#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub upstream: UpstreamCfg,
  #[serde(default)]
  pub quiz: ScoringCfg,
  /// Games served without the upstream. Same raw shape as the upstream `data`
  /// payload, so field aliases apply here too.
  #[serde(default)]
  pub games: Vec<serde_json::Value>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct UpstreamCfg {
  /// e.g. "https://api.vietvibe.example". Empty disables the upstream.
  pub base_url: String,
  pub timeout_secs: u64,
  pub user_agent: String,
}

impl Default for UpstreamCfg {
  fn default() -> Self {
    Self {
      base_url: String::new(),
      timeout_secs: 15,
      user_agent: "vietvibe-quiz/0.1".into(),
    }
  }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ScoringCfg {
  pub points_per_correct: u32,
  /// Shuffle the fragment pool of sentence-order questions.
  pub shuffle_fragments: bool,
  /// HTTP sessions untouched for this long are evicted. 0 disables the sweep.
  pub session_ttl_secs: u64,
}

impl Default for ScoringCfg {
  fn default() -> Self {
    Self { points_per_correct: 10, shuffle_fragments: true, session_ttl_secs: 1800 }
  }
}

impl QuizConfig {
  /// File from QUIZ_CONFIG_PATH (if any), then env overrides.
  pub fn from_env() -> Self {
    let mut cfg = load_quiz_config_from_env().unwrap_or_default();
    cfg.apply_env_overrides();
    cfg
  }

  pub fn from_toml_str(s: &str) -> Result<Self, toml::de::Error> {
    toml::from_str::<QuizConfig>(s)
  }

  fn apply_env_overrides(&mut self) {
    if let Ok(url) = std::env::var("VIETVIBE_API_BASE_URL") {
      self.upstream.base_url = url;
    }
    if let Some(secs) = std::env::var("VIETVIBE_API_TIMEOUT_SECS").ok().and_then(|s| s.parse::<u64>().ok()) {
      self.upstream.timeout_secs = secs;
    }
  }
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
fn load_quiz_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match QuizConfig::from_toml_str(&s) {
      Ok(cfg) => {
        info!(target: "vietvibe_quiz", %path, games = cfg.games.len(), "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "vietvibe_quiz", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "vietvibe_quiz", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
