//! WebSocket upgrade + message loop. One connection is one quiz view: it owns at
//! most one session, locally, and the session dies with the socket. Each client
//! message is parsed as JSON and answered with a single JSON message.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  http::{header::AUTHORIZATION, HeaderMap},
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::error::QuizError;
use crate::logic::{apply, finish, open_session, with_summary, Action, Reply};
use crate::protocol::{to_out, ClientWsMessage, ServerWsMessage};
use crate::session::Session;
use crate::state::AppState;

#[instrument(level = "info", skip(ws, state, headers))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
  info!(target: "vietvibe_quiz", "WebSocket upgrade requested");
  let auth = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()).map(str::to_string);
  ws.on_upgrade(move |socket| handle_ws(socket, state, auth))
}

#[instrument(level = "info", skip(socket, state, auth))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>, auth: Option<String>) {
  info!(target: "vietvibe_quiz", "WebSocket connected");
  let mut view = QuizView { session: None, auth };

  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => {
            debug!(target: "vietvibe_quiz", "WS received: {:?}", &incoming);
            view.handle(incoming, &state).await
          }
          Err(e) => ServerWsMessage::Error { error: "bad_request".into(), message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "error": "internal", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "vietvibe_quiz", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  if let Some(s) = view.session.take() {
    debug!(target: "quiz", session_id = %s.id, phase = ?s.phase(), "Dropping session with its view");
  }
  info!(target: "vietvibe_quiz", "WebSocket disconnected");
}

/// Per-connection state.
struct QuizView {
  session: Option<Session>,
  auth: Option<String>,
}

impl QuizView {
  async fn handle(&mut self, msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
    let points = state.scoring.points_per_correct;
    let action = match msg {
      ClientWsMessage::Ping => return ServerWsMessage::Pong,
      ClientWsMessage::Quit => {
        self.session = None;
        return ServerWsMessage::Closed;
      }
      ClientWsMessage::StartGame { game_id, user_id, token } => {
        let auth = token.map(|t| if t.starts_with("Bearer ") { t } else { format!("Bearer {}", t) });
        let auth = auth.or_else(|| self.auth.clone());
        // A failed start leaves the view without a session, even if one was running.
        self.session = None;
        return match open_session(state, &game_id, &user_id, auth).await {
          Ok(s) => {
            let out = to_out(&s, points);
            self.session = Some(s);
            ServerWsMessage::Session { session: out }
          }
          Err(e) => (&e).into(),
        };
      }
      ClientWsMessage::Select { answer_id } => Action::Select(answer_id),
      ClientWsMessage::Place { answer_id } => Action::Place(answer_id),
      ClientWsMessage::Retract { answer_id } => Action::Retract(answer_id),
      ClientWsMessage::Submit => Action::Submit,
      ClientWsMessage::Advance => Action::Advance,
      ClientWsMessage::Restart => Action::Restart,
    };

    let session = match self.session.as_mut() {
      Some(s) => s,
      None => return (&QuizError::InvalidState("no game started on this connection".into())).into(),
    };
    let step = match apply(session, action, points) {
      Ok(step) => step,
      Err(e) => return (&e).into(),
    };
    let reply = match step.tally {
      Some(tally) => {
        let summary = finish(state, tally).await;
        session.attach_summary(summary.clone());
        with_summary(step.reply, &summary)
      }
      None => step.reply,
    };
    match reply {
      Reply::Session(session) => ServerWsMessage::Session { session },
      Reply::Answer(result) => ServerWsMessage::AnswerResult { result },
    }
  }
}
