//! Domain models: games, questions, answers, and the point record submitted at the end.

use serde::{Deserialize, Serialize};

/// Game format. Fixes which key every answer of the game carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameKind {
  MultipleChoice,
  SentenceOrder,
  ListeningChoice,
}

impl GameKind {
  /// Parse the upstream `type` string (e.g. "SENTENCE_ORDER").
  pub fn parse(s: &str) -> Option<Self> {
    match s.trim().to_ascii_uppercase().as_str() {
      "MULTIPLE_CHOICE" => Some(GameKind::MultipleChoice),
      "SENTENCE_ORDER" => Some(GameKind::SentenceOrder),
      "LISTENING_CHOICE" => Some(GameKind::ListeningChoice),
      _ => None,
    }
  }

  /// Choice games are answered by picking one answer; ordering games by arranging fragments.
  pub fn is_choice(self) -> bool {
    matches!(self, GameKind::MultipleChoice | GameKind::ListeningChoice)
  }
}

/// Where did the game definition come from?
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GameSource {
  Upstream,  // VietVibe REST API
  LocalBank, // TOML config or built-in demo
}

/// Per-answer key. The variant is decided by the parent game's kind, so a
/// question can never mix the two.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnswerKey {
  Correct(bool),
  Order(u32),
}

#[derive(Clone, Debug)]
pub struct Answer {
  pub id: String,
  pub content: String,
  pub key: AnswerKey,
}

impl Answer {
  pub fn is_correct(&self) -> bool {
    matches!(self.key, AnswerKey::Correct(true))
  }

  pub fn order_index(&self) -> Option<u32> {
    match self.key {
      AnswerKey::Order(i) => Some(i),
      AnswerKey::Correct(_) => None,
    }
  }
}

#[derive(Clone, Debug)]
pub struct Question {
  pub id: String,
  pub content: String,
  pub image_url: String, // empty when absent
  pub audio_url: String, // empty when absent
  pub answers: Vec<Answer>,
}

impl Question {
  pub fn answer(&self, id: &str) -> Option<&Answer> {
    self.answers.iter().find(|a| a.id == id)
  }
}

/// A loaded game. Immutable for the lifetime of a session.
#[derive(Clone, Debug)]
pub struct Game {
  pub id: String,
  pub name: String,
  pub description: String,
  pub kind: GameKind,
  pub source: GameSource,
  pub questions: Vec<Question>,
}

/// Body of `POST /api/v1/points/add` on the VietVibe API.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PointRecord {
  pub user_id: String,
  pub game_id: serde_json::Value, // number when the id is numeric
  pub score: u32,
  pub correct_answers: u32,
  pub total_questions: u32,
}

impl PointRecord {
  pub fn new(user_id: &str, game_id: &str, score: u32, correct_answers: u32, total_questions: u32) -> Self {
    let game_id = match game_id.parse::<i64>() {
      Ok(n) => serde_json::Value::from(n),
      Err(_) => serde_json::Value::from(game_id),
    };
    Self { user_id: user_id.to_string(), game_id, score, correct_answers, total_questions }
  }
}
