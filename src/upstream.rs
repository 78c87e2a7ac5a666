//! Minimal VietVibe REST client for our use-cases.
//!
//! Three calls: game detail, start-play telemetry, and point submission. Every
//! response comes wrapped in the `{statusCode, message, data, error}` envelope.
//! Calls are instrumented and log ids, status codes and latencies (never tokens).

use std::time::{Duration, Instant};

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};

use crate::config::UpstreamCfg;
use crate::domain::PointRecord;
use crate::error::{QuizError, QuizResult};
use crate::util::trunc_for_log;

#[derive(Clone)]
pub struct VietVibeApi {
  pub client: reqwest::Client,
  pub base_url: String,
  pub user_agent: String,
}

#[derive(Deserialize)]
struct Envelope {
  #[serde(default, rename = "statusCode")]
  status_code: Option<Value>,
  #[serde(default)]
  message: Option<String>,
  #[serde(default)]
  error: Option<Value>,
  #[serde(default)]
  data: Option<Value>,
}

impl Envelope {
  /// `statusCode` is a number on most endpoints and a string on some.
  fn status(&self) -> Option<u16> {
    match self.status_code.as_ref()? {
      Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
      Value::String(s) => s.trim().parse().ok(),
      _ => None,
    }
  }

  fn describe(&self) -> String {
    let err = match &self.error {
      Some(Value::String(s)) => s.clone(),
      Some(Value::Array(items)) => items.iter().filter_map(|v| v.as_str()).collect::<Vec<_>>().join("; "),
      _ => String::new(),
    };
    match (&self.message, err.is_empty()) {
      (Some(m), true) => m.clone(),
      (Some(m), false) => format!("{} ({})", m, err),
      (None, _) => err,
    }
  }
}

impl VietVibeApi {
  /// Construct the client if an upstream base URL is configured; otherwise return None.
  pub fn from_config(cfg: &UpstreamCfg) -> Option<Self> {
    let base_url = cfg.base_url.trim().trim_end_matches('/').to_string();
    if base_url.is_empty() {
      return None;
    }
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(cfg.timeout_secs))
      .build()
      .ok()?;
    Some(Self { client, base_url, user_agent: cfg.user_agent.clone() })
  }

  /// `GET /api/v1/games/{id}`. Returns the envelope `data`, still in raw form.
  #[instrument(level = "info", skip(self, auth), fields(%game_id))]
  pub async fn fetch_game(&self, game_id: &str, auth: Option<&str>) -> QuizResult<Value> {
    let url = self.url(&["api", "v1", "games", game_id]).map_err(QuizError::LoadFailed)?;
    let started = Instant::now();
    let res = self
      .with_headers(self.client.get(url), auth)
      .send()
      .await
      .map_err(|e| QuizError::LoadFailed(e.to_string()))?;

    let status = res.status();
    info!(%status, elapsed_ms = started.elapsed().as_millis() as u64, "VietVibe game detail");
    if status == StatusCode::NOT_FOUND {
      return Err(QuizError::NotFound(format!("game {} not found", game_id)));
    }
    if !status.is_success() {
      let body = res.text().await.unwrap_or_default();
      let msg = serde_json::from_str::<Envelope>(&body)
        .map(|e| e.describe())
        .unwrap_or_else(|_| trunc_for_log(&body, 200));
      return Err(QuizError::LoadFailed(format!("VietVibe HTTP {}: {}", status, msg)));
    }

    let env: Envelope = res.json().await.map_err(|e| QuizError::LoadFailed(e.to_string()))?;
    match env.status() {
      Some(404) => return Err(QuizError::NotFound(format!("game {} not found: {}", game_id, env.describe()))),
      Some(code) if code >= 400 => {
        return Err(QuizError::LoadFailed(format!("VietVibe status {}: {}", code, env.describe())));
      }
      _ => {}
    }
    match env.data {
      Some(data) if !data.is_null() => Ok(data),
      _ => Err(QuizError::NotFound(format!("game {} not found (empty data)", game_id))),
    }
  }

  /// `POST /api/v1/games/{id}/play`. Play-count telemetry only.
  #[instrument(level = "debug", skip(self, auth), fields(%game_id))]
  pub async fn start_play(&self, game_id: &str, auth: Option<&str>) -> Result<(), String> {
    let url = self.url(&["api", "v1", "games", game_id, "play"])?;
    let res = self.with_headers(self.client.post(url), auth).send().await.map_err(|e| e.to_string())?;
    ensure_ok(res).await?;
    debug!("Start-play acknowledged");
    Ok(())
  }

  /// `POST /api/v1/points/add`.
  #[instrument(level = "info", skip(self, record, auth), fields(user_id = %record.user_id, score = record.score))]
  pub async fn create_point(&self, record: &PointRecord, auth: Option<&str>) -> Result<(), String> {
    let url = self.url(&["api", "v1", "points", "add"])?;
    let res = self
      .with_headers(self.client.post(url), auth)
      .header(CONTENT_TYPE, "application/json")
      .json(record)
      .send()
      .await
      .map_err(|e| e.to_string())?;
    ensure_ok(res).await
  }

  fn url(&self, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(&self.base_url).map_err(|e| format!("bad upstream base url: {}", e))?;
    url
      .path_segments_mut()
      .map_err(|_| "upstream base url cannot be a base".to_string())?
      .pop_if_empty()
      .extend(segments);
    Ok(url)
  }

  fn with_headers(&self, req: reqwest::RequestBuilder, auth: Option<&str>) -> reqwest::RequestBuilder {
    let req = req.header(USER_AGENT, self.user_agent.as_str());
    match auth {
      Some(token) => req.header(AUTHORIZATION, token),
      None => req,
    }
  }
}

/// Fail on HTTP errors and on envelopes reporting an error status.
async fn ensure_ok(res: reqwest::Response) -> Result<(), String> {
  let status = res.status();
  let body = res.text().await.unwrap_or_default();
  let env = serde_json::from_str::<Envelope>(&body).ok();
  if !status.is_success() {
    let msg = env.map(|e| e.describe()).unwrap_or_else(|| trunc_for_log(&body, 200));
    return Err(format!("VietVibe HTTP {}: {}", status, msg));
  }
  if let Some(env) = env {
    if let Some(code) = env.status().filter(|c| *c >= 400) {
      return Err(format!("VietVibe status {}: {}", code, env.describe()));
    }
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::spawn_mock_upstream;
  use serde_json::json;

  #[tokio::test]
  async fn fetch_game_returns_envelope_data_and_forwards_auth() {
    let mock = spawn_mock_upstream().await;
    let data = mock.api().fetch_game("1", Some("Bearer t0k")).await.unwrap();
    assert_eq!(data["name"], "Flashcard Challenge");
    assert_eq!(mock.auth_headers().await, vec!["Bearer t0k".to_string()]);
  }

  #[tokio::test]
  async fn fetch_game_maps_not_found() {
    let mock = spawn_mock_upstream().await;
    // plain HTTP 404
    assert!(matches!(mock.api().fetch_game("404", None).await, Err(QuizError::NotFound(_))));
    // 200 with statusCode 404 in the envelope
    assert!(matches!(mock.api().fetch_game("enveloped-404", None).await, Err(QuizError::NotFound(_))));
    // 200 with null data
    assert!(matches!(mock.api().fetch_game("null-data", None).await, Err(QuizError::NotFound(_))));
  }

  #[tokio::test]
  async fn fetch_game_maps_transport_and_server_errors() {
    let mock = spawn_mock_upstream().await;
    let err = mock.api().fetch_game("boom", None).await.unwrap_err();
    match err {
      QuizError::LoadFailed(msg) => assert!(msg.contains("500"), "{}", msg),
      other => panic!("unexpected {:?}", other),
    }

    let cfg = UpstreamCfg { base_url: "http://127.0.0.1:1".into(), timeout_secs: 2, ..UpstreamCfg::default() };
    let dead = VietVibeApi::from_config(&cfg).unwrap();
    assert!(matches!(dead.fetch_game("1", None).await, Err(QuizError::LoadFailed(_))));
  }

  #[tokio::test]
  async fn create_point_posts_record() {
    let mock = spawn_mock_upstream().await;
    let rec = PointRecord::new("user-7", "1", 30, 3, 5);
    mock.api().create_point(&rec, None).await.unwrap();
    assert_eq!(
      mock.points().await,
      vec![json!({ "userId": "user-7", "gameId": 1, "score": 30, "correctAnswers": 3, "totalQuestions": 5 })]
    );
  }

  #[tokio::test]
  async fn start_play_hits_play_endpoint() {
    let mock = spawn_mock_upstream().await;
    mock.api().start_play("1", None).await.unwrap();
    assert_eq!(mock.plays().await, vec!["1".to_string()]);
  }

  #[test]
  fn no_base_url_means_no_client() {
    assert!(VietVibeApi::from_config(&UpstreamCfg::default()).is_none());
  }
}
