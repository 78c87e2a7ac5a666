//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs ids and basic result info.

use std::sync::Arc;
use axum::{
  extract::{Path, State},
  http::{header::AUTHORIZATION, HeaderMap, StatusCode},
  response::{IntoResponse, Response},
  Json,
};
use tracing::{info, instrument, warn};

use crate::error::QuizError;
use crate::logic::{apply, finish, open_session, with_summary, Action, Reply};
use crate::protocol::*;
use crate::state::AppState;

impl IntoResponse for QuizError {
  fn into_response(self) -> Response {
    let status = match &self {
      QuizError::NotFound(_) | QuizError::SessionNotFound(_) => StatusCode::NOT_FOUND,
      QuizError::LoadFailed(_) => StatusCode::BAD_GATEWAY,
      QuizError::InvalidState(_) => StatusCode::CONFLICT,
      QuizError::NoSelection | QuizError::UnknownAnswer(_) => StatusCode::BAD_REQUEST,
    };
    if let QuizError::InvalidState(msg) = &self {
      // Correct UI wiring never gets here.
      warn!(target: "quiz", %msg, "Invalid session state requested over HTTP");
    }
    (status, Json(ErrorOut { error: self.code().into(), message: self.to_string() })).into_response()
  }
}

impl IntoResponse for Reply {
  fn into_response(self) -> Response {
    match self {
      Reply::Session(s) => Json(s).into_response(),
      Reply::Answer(a) => Json(a).into_response(),
    }
  }
}

fn bearer(headers: &HeaderMap) -> Option<String> {
  headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string)
}

/// Apply an action under the store lock, then finalize outside it if the action completed the session.
async fn run(state: &AppState, id: &str, action: Action) -> Result<Reply, QuizError> {
  let points = state.scoring.points_per_correct;
  let step = state.with_session(id, |s| apply(s, action, points)).await?;
  match step.tally {
    Some(tally) => {
      let summary = finish(state, tally).await;
      state.attach_summary(id, summary.clone()).await;
      Ok(with_summary(step.reply, &summary))
    }
    None => Ok(step.reply),
  }
}

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  Json(HealthOut { ok: true, upstream: state.upstream.is_some() })
}

#[instrument(level = "info", skip(state, headers), fields(game_id = %body.game_id, user_id = %body.user_id))]
pub async fn http_start_session(
  State(state): State<Arc<AppState>>,
  headers: HeaderMap,
  Json(body): Json<StartSessionIn>,
) -> Result<impl IntoResponse, QuizError> {
  let session = open_session(&state, &body.game_id, &body.user_id, bearer(&headers)).await?;
  let out = to_out(&session, state.scoring.points_per_correct);
  state.insert_session(session).await;
  info!(target: "quiz", session_id = %out.session_id, "HTTP session created");
  Ok((StatusCode::CREATED, Json(out)))
}

#[instrument(level = "debug", skip(state))]
pub async fn http_get_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<SessionOut>, QuizError> {
  let points = state.scoring.points_per_correct;
  let out = state.with_session(&id, |s| Ok(to_out(s, points))).await?;
  Ok(Json(out))
}

#[instrument(level = "info", skip(state))]
pub async fn http_delete_session(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<StatusCode, QuizError> {
  if state.remove_session(&id).await {
    info!(target: "quiz", session_id = %id, "HTTP session abandoned");
    Ok(StatusCode::NO_CONTENT)
  } else {
    Err(QuizError::SessionNotFound(id))
  }
}

#[instrument(level = "info", skip(state, body), fields(answer_id = %body.answer_id))]
pub async fn http_select(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<AnswerIdIn>,
) -> Result<Reply, QuizError> {
  run(&state, &id, Action::Select(body.answer_id)).await
}

#[instrument(level = "info", skip(state, body), fields(answer_id = %body.answer_id))]
pub async fn http_place(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<AnswerIdIn>,
) -> Result<Reply, QuizError> {
  run(&state, &id, Action::Place(body.answer_id)).await
}

#[instrument(level = "info", skip(state, body), fields(answer_id = %body.answer_id))]
pub async fn http_retract(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<AnswerIdIn>,
) -> Result<Reply, QuizError> {
  run(&state, &id, Action::Retract(body.answer_id)).await
}

#[instrument(level = "info", skip(state))]
pub async fn http_submit(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Reply, QuizError> {
  run(&state, &id, Action::Submit).await
}

#[instrument(level = "info", skip(state))]
pub async fn http_advance(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Reply, QuizError> {
  run(&state, &id, Action::Advance).await
}

#[instrument(level = "info", skip(state))]
pub async fn http_restart(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Result<Reply, QuizError> {
  run(&state, &id, Action::Restart).await
}
