//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Opening a session (load game, start session, start-play telemetry)
//!   - Applying player actions to a session
//!   - Finishing a completed session (scoring + point submission)
//!
//! `apply` is synchronous so HTTP can run it under the store lock; the
//! finalizer's network write happens afterwards in `finish`.

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::QuizResult;
use crate::finalizer::{finalize, SessionSummary};
use crate::protocol::{result_out, to_out, AnswerResultOut, SessionOut};
use crate::session::{FinalTally, Session};
use crate::state::AppState;

#[derive(Debug)]
pub enum Action {
  Select(String),
  Place(String),
  Retract(String),
  Submit,
  Advance,
  Restart,
}

#[derive(Debug)]
pub enum Reply {
  Session(SessionOut),
  Answer(AnswerResultOut),
}

/// Result of one action. `tally` is set on the advance that completes the session.
pub struct Step {
  pub reply: Reply,
  pub tally: Option<FinalTally>,
}

/// Load the game and start a session for it. Nothing is created on failure.
#[instrument(level = "info", skip(state, auth), fields(%game_id, %user_id))]
pub async fn open_session(state: &AppState, game_id: &str, user_id: &str, auth: Option<String>) -> QuizResult<Session> {
  let game = state.load_game(game_id, auth.as_deref()).await?;
  let session = Session::start(
    Uuid::new_v4().to_string(),
    game.clone(),
    user_id.to_string(),
    auth.clone(),
    state.scoring.shuffle_fragments,
  )?;
  info!(target: "quiz", session_id = %session.id, game_id = %game.id, kind = ?game.kind, questions = game.questions.len(), "Session opened");

  // Play-count telemetry: fire-and-forget.
  if let (Some(api), crate::domain::GameSource::Upstream) = (state.upstream.clone(), game.source) {
    let id = game.id.clone();
    tokio::spawn(async move {
      if let Err(e) = api.start_play(&id, auth.as_deref()).await {
        warn!(target: "quiz", game_id = %id, error = %e, "Start-play notification failed");
      }
    });
  }
  Ok(session)
}

pub fn apply(session: &mut Session, action: Action, points_per_correct: u32) -> QuizResult<Step> {
  let mut tally = None;
  let reply = match action {
    Action::Select(id) => {
      session.select(&id)?;
      Reply::Session(to_out(session, points_per_correct))
    }
    Action::Place(id) => {
      session.place(&id)?;
      Reply::Session(to_out(session, points_per_correct))
    }
    Action::Retract(id) => {
      session.retract(&id)?;
      Reply::Session(to_out(session, points_per_correct))
    }
    Action::Submit => {
      let evaluation = session.submit()?;
      info!(target: "quiz", session_id = %session.id, question = session.pointer() + 1, correct = evaluation.correct, "Answer evaluated");
      Reply::Answer(result_out(&evaluation, session, points_per_correct))
    }
    Action::Advance => {
      if session.advance()? {
        tally = session.claim_finalization();
      }
      Reply::Session(to_out(session, points_per_correct))
    }
    Action::Restart => {
      session.restart();
      Reply::Session(to_out(session, points_per_correct))
    }
  };
  Ok(Step { reply, tally })
}

/// Score and submit. Never fails: submission problems only show as `submitted = false`.
pub async fn finish(state: &AppState, tally: FinalTally) -> SessionSummary {
  finalize(state.upstream.as_ref(), tally, state.scoring.points_per_correct).await
}

/// Put a freshly computed summary into a session reply.
pub fn with_summary(reply: Reply, summary: &SessionSummary) -> Reply {
  match reply {
    Reply::Session(mut out) => {
      out.summary = Some(summary.clone());
      Reply::Session(out)
    }
    other => other,
  }
}
