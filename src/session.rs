//! One play-through of one game.
//!
//! `NotStarted` has no value of its own: a session only exists once `start`
//! succeeded. From there the phases go
//! `Answering -> Answered -> (Answering | Complete)`, and only `Answering`
//! accepts selection changes.

use std::sync::Arc;

use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::debug;

use crate::domain::{Game, GameSource, Question};
use crate::error::{QuizError, QuizResult};
use crate::evaluator::{evaluate, Evaluation, Response};
use crate::finalizer::SessionSummary;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
  Answering,
  Answered,
  Complete,
}

/// Sentence-order fragments split into the pool and the sequence built so far.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Arrangement {
  pub available: Vec<String>,
  pub arranged: Vec<String>,
}

/// Everything the finalizer needs, detached from the session so it can be
/// submitted without holding the session store lock.
#[derive(Clone, Debug)]
pub struct FinalTally {
  pub session_id: String,
  pub user_id: String,
  pub auth: Option<String>,
  pub game_id: String,
  pub source: GameSource,
  pub correct: u32,
  pub total: u32,
  pub outcomes: Vec<bool>,
}

#[derive(Clone, Debug)]
pub struct Session {
  pub id: String,
  pub user_id: String,
  /// Bearer token forwarded on upstream calls made for this session.
  pub auth: Option<String>,
  game: Arc<Game>,
  shuffle: bool,
  pointer: usize,
  correct: u32,
  outcomes: Vec<bool>,
  phase: Phase,
  selection: Option<String>,
  arrangement: Arrangement,
  last_evaluation: Option<Evaluation>,
  finalized: bool,
  summary: Option<SessionSummary>,
}

impl Session {
  /// Create a session positioned on the first question.
  pub fn start(id: String, game: Arc<Game>, user_id: String, auth: Option<String>, shuffle: bool) -> QuizResult<Self> {
    if game.questions.is_empty() {
      return Err(QuizError::NotFound(format!("game {} has no questions", game.id)));
    }
    let mut s = Self {
      id,
      user_id,
      auth,
      game,
      shuffle,
      pointer: 0,
      correct: 0,
      outcomes: Vec::new(),
      phase: Phase::Answering,
      selection: None,
      arrangement: Arrangement::default(),
      last_evaluation: None,
      finalized: false,
      summary: None,
    };
    s.reset_question_state();
    debug!(target: "quiz", session_id = %s.id, game_id = %s.game.id, total = s.total(), "Session started");
    Ok(s)
  }

  /// Back to the first question with a clean log. The replay is a new
  /// play-through, so it is finalized again when it completes.
  pub fn restart(&mut self) {
    self.pointer = 0;
    self.correct = 0;
    self.outcomes.clear();
    self.phase = Phase::Answering;
    self.finalized = false;
    self.summary = None;
    self.reset_question_state();
    debug!(target: "quiz", session_id = %self.id, "Session restarted");
  }

  pub fn game(&self) -> &Game { &self.game }
  pub fn phase(&self) -> Phase { self.phase }
  pub fn pointer(&self) -> usize { self.pointer }
  pub fn total(&self) -> usize { self.game.questions.len() }
  pub fn correct_count(&self) -> u32 { self.correct }
  pub fn outcomes(&self) -> &[bool] { &self.outcomes }
  pub fn selection(&self) -> Option<&str> { self.selection.as_deref() }
  pub fn arrangement(&self) -> &Arrangement { &self.arrangement }
  pub fn last_evaluation(&self) -> Option<&Evaluation> { self.last_evaluation.as_ref() }
  pub fn summary(&self) -> Option<&SessionSummary> { self.summary.as_ref() }

  /// Store the finalizer's result. Ignored unless this play-through was finalized.
  pub fn attach_summary(&mut self, summary: SessionSummary) {
    if self.finalized && self.is_complete() {
      self.summary = Some(summary);
    }
  }

  /// `None` once the session is complete.
  pub fn current_question(&self) -> Option<&Question> {
    if self.phase == Phase::Complete { None } else { self.game.questions.get(self.pointer) }
  }

  pub fn is_complete(&self) -> bool {
    self.phase == Phase::Complete && self.pointer >= self.total() && self.outcomes.len() == self.total()
  }

  /// Percent of the way through, counting the question on screen.
  pub fn progress_percent(&self) -> u32 {
    let total = self.total().max(1);
    (((self.pointer + 1).min(total) * 100) / total) as u32
  }

  // -------- Per-question input --------

  /// Pick an answer (choice games). Replaces any previous pick.
  pub fn select(&mut self, answer_id: &str) -> QuizResult<()> {
    self.ensure_answering("select")?;
    if !self.game.kind.is_choice() {
      return Err(QuizError::InvalidState("select is only valid for choice games".into()));
    }
    self.ensure_known(answer_id)?;
    self.selection = Some(answer_id.to_string());
    Ok(())
  }

  /// Move a fragment from the pool to the end of the arrangement.
  pub fn place(&mut self, fragment_id: &str) -> QuizResult<()> {
    self.ensure_ordering("place")?;
    let pos = self.arrangement.available.iter().position(|f| f == fragment_id);
    match pos {
      Some(i) => {
        let f = self.arrangement.available.remove(i);
        self.arrangement.arranged.push(f);
        Ok(())
      }
      None => Err(self.misplaced(fragment_id, "available")),
    }
  }

  /// Move a fragment from the arrangement back to the end of the pool.
  pub fn retract(&mut self, fragment_id: &str) -> QuizResult<()> {
    self.ensure_ordering("retract")?;
    let pos = self.arrangement.arranged.iter().position(|f| f == fragment_id);
    match pos {
      Some(i) => {
        let f = self.arrangement.arranged.remove(i);
        self.arrangement.available.push(f);
        Ok(())
      }
      None => Err(self.misplaced(fragment_id, "arranged")),
    }
  }

  // -------- Evaluation + progression --------

  /// Evaluate the current selection/arrangement and record the outcome.
  pub fn submit(&mut self) -> QuizResult<Evaluation> {
    self.ensure_answering("submit")?;
    let question = &self.game.questions[self.pointer];
    let response = if self.game.kind.is_choice() {
      Response::Choice(self.selection.as_deref().ok_or(QuizError::NoSelection)?)
    } else {
      Response::Arrangement(&self.arrangement.arranged)
    };
    let evaluation = evaluate(question, self.game.kind, response)?;
    self.record_outcome(evaluation.correct)?;
    self.last_evaluation = Some(evaluation.clone());
    Ok(evaluation)
  }

  /// Append to the outcome log. Once per question.
  pub fn record_outcome(&mut self, is_correct: bool) -> QuizResult<()> {
    match self.phase {
      Phase::Answering => {}
      Phase::Answered => {
        return Err(QuizError::InvalidState(format!("question {} already answered", self.pointer + 1)));
      }
      Phase::Complete => return Err(QuizError::InvalidState("session is complete".into())),
    }
    self.outcomes.push(is_correct);
    if is_correct {
      self.correct += 1;
    }
    self.phase = Phase::Answered;
    debug!(target: "quiz", session_id = %self.id, question = self.pointer + 1, correct = is_correct, score = self.correct, "Outcome recorded");
    Ok(())
  }

  /// Move past an answered question. Returns true only on the call that
  /// completes the session; calls after completion change nothing.
  pub fn advance(&mut self) -> QuizResult<bool> {
    match self.phase {
      Phase::Complete => Ok(false),
      Phase::Answering => Err(QuizError::InvalidState(format!(
        "question {} has not been answered",
        self.pointer + 1
      ))),
      Phase::Answered => {
        self.pointer += 1;
        if self.pointer >= self.total() {
          self.phase = Phase::Complete;
          self.selection = None;
          self.arrangement = Arrangement::default();
          debug!(target: "quiz", session_id = %self.id, correct = self.correct, total = self.total(), "Session complete");
          Ok(true)
        } else {
          self.phase = Phase::Answering;
          self.reset_question_state();
          Ok(false)
        }
      }
    }
  }

  /// Hand out the tally exactly once per completed play-through.
  pub fn claim_finalization(&mut self) -> Option<FinalTally> {
    if !self.is_complete() || self.finalized {
      return None;
    }
    self.finalized = true;
    Some(FinalTally {
      session_id: self.id.clone(),
      user_id: self.user_id.clone(),
      auth: self.auth.clone(),
      game_id: self.game.id.clone(),
      source: self.game.source,
      correct: self.correct,
      total: self.total() as u32,
      outcomes: self.outcomes.clone(),
    })
  }

  // -------- Internals --------

  fn reset_question_state(&mut self) {
    self.selection = None;
    self.last_evaluation = None;
    self.arrangement = Arrangement::default();
    if self.game.kind.is_choice() {
      return;
    }
    if let Some(q) = self.game.questions.get(self.pointer) {
      let mut pool: Vec<String> = q.answers.iter().map(|a| a.id.clone()).collect();
      if self.shuffle {
        pool.shuffle(&mut rand::thread_rng());
      }
      self.arrangement.available = pool;
    }
  }

  fn ensure_answering(&self, op: &str) -> QuizResult<()> {
    match self.phase {
      Phase::Answering => Ok(()),
      Phase::Answered => Err(QuizError::InvalidState(format!("{}: question already answered, advance first", op))),
      Phase::Complete => Err(QuizError::InvalidState(format!("{}: session is complete", op))),
    }
  }

  fn ensure_ordering(&self, op: &str) -> QuizResult<()> {
    self.ensure_answering(op)?;
    if self.game.kind.is_choice() {
      return Err(QuizError::InvalidState(format!("{} is only valid for sentence-order games", op)));
    }
    Ok(())
  }

  fn ensure_known(&self, answer_id: &str) -> QuizResult<()> {
    match self.current_question() {
      Some(q) if q.answer(answer_id).is_some() => Ok(()),
      _ => Err(QuizError::UnknownAnswer(answer_id.to_string())),
    }
  }

  /// Fragment belongs to the question but sits on the other side, or is unknown.
  fn misplaced(&self, fragment_id: &str, side: &str) -> QuizError {
    match self.ensure_known(fragment_id) {
      Ok(()) => QuizError::InvalidState(format!("fragment {} is not {}", fragment_id, side)),
      Err(e) => e,
    }
  }
}
