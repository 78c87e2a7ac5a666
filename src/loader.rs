//! Normalization boundary for game payloads.
//!
//! The VietVibe API has shipped the same concepts under different field names
//! across versions (`questions` / `questionList` / `gameQuestions`, `content` /
//! `text` / `answerContent`, ...). Everything past this module only sees the
//! canonical `Game` from `domain.rs`.

use serde_json::Value;
use tracing::warn;

use crate::domain::{Answer, AnswerKey, Game, GameKind, GameSource, Question};
use crate::error::{QuizError, QuizResult};

const QUESTION_LIST_KEYS: &[&str] = &["questions", "questionList", "gameQuestions"];
const ANSWER_LIST_KEYS: &[&str] = &["answers", "answerList", "answerDTOs"];
const ANSWER_CONTENT_KEYS: &[&str] = &["content", "text", "answerContent"];
const QUESTION_CONTENT_KEYS: &[&str] = &["content", "text"];
const ORDER_KEYS: &[&str] = &["orderIndex", "order", "index"];
const CORRECT_KEYS: &[&str] = &["isCorrect", "correct"];
const ID_KEYS: &[&str] = &["_id", "id"];

/// Turn a raw game object (the `data` of the upstream envelope, or a `[[games]]`
/// entry from config) into a `Game`.
pub fn normalize_game(raw: &Value, source: GameSource) -> QuizResult<Game> {
  if !raw.is_object() {
    return Err(QuizError::LoadFailed("game payload is not an object".into()));
  }

  let id = id_of(raw).ok_or_else(|| QuizError::LoadFailed("game payload has no id".into()))?;
  let type_str = str_of(raw, &["type", "gameType"]);
  let kind = GameKind::parse(&type_str)
    .ok_or_else(|| QuizError::LoadFailed(format!("game {}: unknown type '{}'", id, type_str)))?;

  let questions = list_of(raw, QUESTION_LIST_KEYS)
    .iter()
    .enumerate()
    .map(|(qi, q)| normalize_question(q, qi, kind, &id))
    .collect::<QuizResult<Vec<_>>>()?;

  let game = Game {
    name: str_of(raw, &["name", "title"]),
    description: str_of(raw, &["description"]),
    id,
    kind,
    source,
    questions,
  };
  report_suspect_data(&game);
  Ok(game)
}

fn normalize_question(raw: &Value, position: usize, kind: GameKind, game_id: &str) -> QuizResult<Question> {
  let id = id_of(raw).unwrap_or_else(|| format!("q{}", position));

  let answers = list_of(raw, ANSWER_LIST_KEYS)
    .iter()
    .enumerate()
    .map(|(ai, a)| {
      let answer_id = id_of(a).unwrap_or_else(|| format!("{}-a{}", id, ai));
      let key = if kind.is_choice() {
        AnswerKey::Correct(first_present(a, CORRECT_KEYS).map(truthy).unwrap_or(false))
      } else {
        let order = first_present(a, ORDER_KEYS).and_then(as_index).ok_or_else(|| {
          QuizError::LoadFailed(format!(
            "game {}: answer {} of question {} has no usable order index",
            game_id, answer_id, id
          ))
        })?;
        AnswerKey::Order(order)
      };
      Ok(Answer { id: answer_id, content: str_of(a, ANSWER_CONTENT_KEYS), key })
    })
    .collect::<QuizResult<Vec<_>>>()?;
  if answers.is_empty() {
    return Err(QuizError::LoadFailed(format!("game {}: question {} has no answers", game_id, id)));
  }

  Ok(Question {
    content: str_of(raw, QUESTION_CONTENT_KEYS),
    image_url: str_of(raw, &["imageUrl"]),
    audio_url: str_of(raw, &["audioUrl"]),
    id,
    answers,
  })
}

/// Upstream data that is playable but probably wrong. Logged, never rejected.
fn report_suspect_data(game: &Game) {
  for q in &game.questions {
    match game.kind {
      GameKind::MultipleChoice | GameKind::ListeningChoice => {
        let n = q.answers.iter().filter(|a| a.is_correct()).count();
        if n != 1 {
          warn!(target: "quiz", game_id = %game.id, question_id = %q.id, correct_answers = n,
            "Choice question should have exactly one correct answer; first flagged answer wins");
        }
        if game.kind == GameKind::ListeningChoice && q.audio_url.is_empty() {
          warn!(target: "quiz", game_id = %game.id, question_id = %q.id, "Listening question has no audio");
        }
      }
      GameKind::SentenceOrder => {
        let mut idx: Vec<u32> = q.answers.iter().filter_map(|a| a.order_index()).collect();
        idx.sort_unstable();
        let contiguous = idx.iter().enumerate().all(|(i, v)| *v as usize == i);
        if !contiguous {
          warn!(target: "quiz", game_id = %game.id, question_id = %q.id, ?idx,
            "Order indices are not a contiguous 0-based permutation");
        }
      }
    }
  }
}

// -------- Alias helpers --------

/// First key holding a non-null value.
fn first_present<'a>(obj: &'a Value, keys: &[&str]) -> Option<&'a Value> {
  keys.iter().filter_map(|k| obj.get(*k)).find(|v| !v.is_null())
}

fn list_of<'a>(obj: &'a Value, keys: &[&str]) -> &'a [Value] {
  first_present(obj, keys)
    .and_then(|v| v.as_array())
    .map(|v| v.as_slice())
    .unwrap_or(&[])
}

fn str_of(obj: &Value, keys: &[&str]) -> String {
  match first_present(obj, keys) {
    Some(Value::String(s)) => s.clone(),
    Some(Value::Number(n)) => n.to_string(),
    _ => String::new(),
  }
}

fn id_of(obj: &Value) -> Option<String> {
  let s = str_of(obj, ID_KEYS);
  if s.is_empty() { None } else { Some(s) }
}

fn truthy(v: &Value) -> bool {
  match v {
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
    Value::String(s) => {
      let s = s.trim();
      !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
    }
    Value::Null => false,
    _ => true,
  }
}

fn as_index(v: &Value) -> Option<u32> {
  match v {
    Value::Number(n) => n
      .as_u64()
      .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64))
      .and_then(|i| u32::try_from(i).ok()),
    Value::String(s) => s.trim().parse::<u32>().ok(),
    _ => None,
  }
}
