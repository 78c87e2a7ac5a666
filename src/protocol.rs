//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.
//!
//! Answer keys (`isCorrect`, `orderIndex`) never leave the service before the
//! question is answered; only the post-answer result reveals them.

use serde::{Deserialize, Serialize};

use crate::domain::{GameKind, Question};
use crate::error::QuizError;
use crate::evaluator::{Evaluation, Expected};
use crate::finalizer::{score_for, SessionSummary};
use crate::session::{Phase, Session};

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    StartGame {
        #[serde(rename = "gameId")]
        game_id: String,
        #[serde(rename = "userId")]
        user_id: String,
        /// Bearer token; browsers cannot set headers on the WS handshake.
        #[serde(default)]
        token: Option<String>,
    },
    Select {
        #[serde(rename = "answerId")]
        answer_id: String,
    },
    Place {
        #[serde(rename = "answerId")]
        answer_id: String,
    },
    Retract {
        #[serde(rename = "answerId")]
        answer_id: String,
    },
    Submit,
    Advance,
    Restart,
    Quit,
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Session { session: SessionOut },
    AnswerResult { result: AnswerResultOut },
    Closed,
    Error { error: String, message: String },
}

impl From<&QuizError> for ServerWsMessage {
    fn from(e: &QuizError) -> Self {
        ServerWsMessage::Error { error: e.code().into(), message: e.to_string() }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerOptionOut {
    pub id: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionOut {
    pub id: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
    /// Choice games only; sentence-order fragments live in `available`/`arranged`.
    pub answers: Vec<AnswerOptionOut>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResultOut {
    pub correct: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_answer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_order: Option<Vec<String>>,
    pub correct_answers: u32,
    pub score: u32,
}

/// Session snapshot for the UI.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionOut {
    pub session_id: String,
    pub game_id: String,
    pub game_name: String,
    pub game_description: String,
    pub game_type: GameKind,
    pub phase: Phase,
    pub question_number: usize,
    pub total_questions: usize,
    pub progress: u32,
    pub correct_answers: u32,
    pub score: u32,
    pub outcomes: Vec<bool>,
    pub question: Option<QuestionOut>,
    pub selection: Option<String>,
    pub available: Vec<AnswerOptionOut>,
    pub arranged: Vec<AnswerOptionOut>,
    pub last_result: Option<AnswerResultOut>,
    pub summary: Option<SessionSummary>,
}

/// Convert a `Session` (internal) to the public DTO.
pub fn to_out(s: &Session, points_per_correct: u32) -> SessionOut {
    let game = s.game();
    let question = s.current_question();
    let fragments = |ids: &[String]| -> Vec<AnswerOptionOut> {
        ids.iter()
            .map(|id| AnswerOptionOut {
                id: id.clone(),
                content: question
                    .and_then(|q| q.answer(id))
                    .map(|a| a.content.clone())
                    .unwrap_or_default(),
            })
            .collect()
    };

    SessionOut {
        session_id: s.id.clone(),
        game_id: game.id.clone(),
        game_name: game.name.clone(),
        game_description: game.description.clone(),
        game_type: game.kind,
        phase: s.phase(),
        question_number: (s.pointer() + 1).min(s.total()),
        total_questions: s.total(),
        progress: s.progress_percent(),
        correct_answers: s.correct_count(),
        score: score_for(s.outcomes(), points_per_correct),
        outcomes: s.outcomes().to_vec(),
        question: question.map(|q| question_out(q, game.kind)),
        selection: s.selection().map(str::to_string),
        available: fragments(&s.arrangement().available),
        arranged: fragments(&s.arrangement().arranged),
        last_result: s.last_evaluation().map(|e| result_out(e, s, points_per_correct)),
        summary: s.summary().cloned(),
    }
}

fn question_out(q: &Question, kind: GameKind) -> QuestionOut {
    let non_empty = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };
    QuestionOut {
        id: q.id.clone(),
        content: q.content.clone(),
        image_url: non_empty(&q.image_url),
        audio_url: non_empty(&q.audio_url),
        answers: if kind.is_choice() {
            q.answers
                .iter()
                .map(|a| AnswerOptionOut { id: a.id.clone(), content: a.content.clone() })
                .collect()
        } else {
            Vec::new()
        },
    }
}

pub fn result_out(e: &Evaluation, s: &Session, points_per_correct: u32) -> AnswerResultOut {
    let (correct_answer_id, correct_order) = match &e.expected {
        Expected::Answer(id) => (id.clone(), None),
        Expected::Order(order) => (None, Some(order.clone())),
    };
    AnswerResultOut {
        correct: e.correct,
        correct_answer_id,
        correct_order,
        correct_answers: s.correct_count(),
        score: score_for(s.outcomes(), points_per_correct),
    }
}

//
// HTTP request/response DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionIn {
    pub game_id: String,
    pub user_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerIdIn {
    pub answer_id: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub upstream: bool,
}
