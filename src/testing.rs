//! Throwaway VietVibe API for tests: a real axum server on an ephemeral port.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::{HeaderMap, StatusCode},
  routing::{get, post},
  Json, Router,
};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::Mutex};

use crate::config::UpstreamCfg;
use crate::upstream::VietVibeApi;

#[derive(Clone, Default)]
struct Recorded {
  auth: Arc<Mutex<Vec<String>>>,
  plays: Arc<Mutex<Vec<String>>>,
  points: Arc<Mutex<Vec<Value>>>,
}

pub struct MockUpstream {
  pub base_url: String,
  recorded: Recorded,
}

impl MockUpstream {
  pub fn config(&self) -> UpstreamCfg {
    UpstreamCfg { base_url: self.base_url.clone(), timeout_secs: 5, ..UpstreamCfg::default() }
  }

  pub fn api(&self) -> VietVibeApi {
    VietVibeApi::from_config(&self.config()).expect("mock base url")
  }

  pub async fn auth_headers(&self) -> Vec<String> { self.recorded.auth.lock().await.clone() }
  pub async fn plays(&self) -> Vec<String> { self.recorded.plays.lock().await.clone() }
  pub async fn points(&self) -> Vec<Value> { self.recorded.points.lock().await.clone() }
}

pub async fn spawn_mock_upstream() -> MockUpstream {
  let recorded = Recorded::default();
  let app = Router::new()
    .route("/api/v1/games/:id", get(game_detail))
    .route("/api/v1/games/:id/play", post(start_play))
    .route("/api/v1/points/add", post(add_point))
    .with_state(recorded.clone());

  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind mock upstream");
  let addr = listener.local_addr().expect("mock addr");
  tokio::spawn(async move {
    let _ = axum::serve(listener, app).await;
  });
  MockUpstream { base_url: format!("http://{}", addr), recorded }
}

/// Game fixtures keyed by id. Ids starting with a status-ish name trigger failures.
pub fn mock_game(id: &str) -> Option<Value> {
  match id {
    "1" => Some(json!({
      "_id": 1,
      "name": "Flashcard Challenge",
      "description": "Match Vietnamese words with their English translations",
      "type": "MULTIPLE_CHOICE",
      "questions": [
        { "_id": 11, "content": "What does 'Xin chào' mean?", "answers": [
          { "_id": 111, "content": "Goodbye", "isCorrect": false },
          { "_id": 112, "content": "Hello", "isCorrect": true }
        ]},
        { "_id": 12, "content": "How do you say 'Thank you'?", "answers": [
          { "_id": 121, "content": "Cảm ơn", "isCorrect": true },
          { "_id": 122, "content": "Xin lỗi", "isCorrect": false }
        ]}
      ]
    })),
    "2" => Some(json!({
      "_id": 2,
      "name": "Sắp xếp câu",
      "type": "SENTENCE_ORDER",
      "questionList": [
        { "_id": 21, "text": "I am a student", "answerList": [
          { "_id": "x", "text": "là", "order": 1 },
          { "_id": "y", "text": "Tôi", "order": 0 },
          { "_id": "z", "text": "sinh viên", "order": 2 }
        ]}
      ]
    })),
    "empty" => Some(json!({ "_id": "empty", "name": "Empty", "type": "MULTIPLE_CHOICE", "questions": [] })),
    _ => None,
  }
}

async fn game_detail(
  State(rec): State<Recorded>,
  Path(id): Path<String>,
  headers: HeaderMap,
) -> (StatusCode, Json<Value>) {
  if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
    rec.auth.lock().await.push(auth.to_string());
  }
  match id.as_str() {
    "404" => (StatusCode::NOT_FOUND, Json(json!({ "statusCode": 404, "message": "Game not existed" }))),
    "enveloped-404" => (StatusCode::OK, Json(json!({ "statusCode": "404", "message": "Game not existed", "data": null }))),
    "null-data" => (StatusCode::OK, Json(json!({ "statusCode": 200, "message": "ok", "data": null }))),
    "boom" => (
      StatusCode::INTERNAL_SERVER_ERROR,
      Json(json!({ "statusCode": 500, "message": "Internal error", "error": ["db down"] })),
    ),
    other => match mock_game(other) {
      Some(game) => (StatusCode::OK, Json(json!({ "statusCode": 200, "message": "ok", "data": game }))),
      None => (StatusCode::NOT_FOUND, Json(json!({ "statusCode": 404, "message": "Game not existed" }))),
    },
  }
}

async fn start_play(State(rec): State<Recorded>, Path(id): Path<String>) -> Json<Value> {
  rec.plays.lock().await.push(id);
  Json(json!({ "statusCode": 200, "message": "ok" }))
}

async fn add_point(State(rec): State<Recorded>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
  if body["userId"] == "reject-me" {
    return (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "statusCode": 500, "message": "User not found" })));
  }
  rec.points.lock().await.push(body);
  (StatusCode::CREATED, Json(json!({ "statusCode": 201, "message": "created", "data": { "id": 1 } })))
}
