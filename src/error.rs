//! Error taxonomy for the quiz core.
//!
//! Point submission failures never show up here: the finalizer swallows them
//! into `submitted = false` after logging.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuizError {
  /// Game missing upstream, or a game with no questions.
  #[error("game unavailable: {0}")]
  NotFound(String),

  /// Transport, HTTP or decode failure while fetching a game.
  #[error("failed to load game: {0}")]
  LoadFailed(String),

  /// Double answer, advance before answer, or mutation after completion.
  #[error("invalid session state: {0}")]
  InvalidState(String),

  #[error("no answer selected")]
  NoSelection,

  #[error("unknown answer id '{0}' for the current question")]
  UnknownAnswer(String),

  #[error("unknown session '{0}'")]
  SessionNotFound(String),
}

impl QuizError {
  /// Stable machine-readable code used in HTTP and WS error bodies.
  pub fn code(&self) -> &'static str {
    match self {
      QuizError::NotFound(_) => "not_found",
      QuizError::LoadFailed(_) => "load_failed",
      QuizError::InvalidState(_) => "invalid_state",
      QuizError::NoSelection => "no_selection",
      QuizError::UnknownAnswer(_) => "unknown_answer",
      QuizError::SessionNotFound(_) => "session_not_found",
    }
  }
}

pub type QuizResult<T> = Result<T, QuizError>;
