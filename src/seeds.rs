//! Built-in demo games, so the service is playable without an upstream.
//!
//! Kept in the raw upstream shape and normalized by the loader like any other payload.

use serde_json::{json, Value};

pub fn seed_games() -> Vec<Value> {
  vec![
    json!({
      "_id": "demo-flashcards",
      "name": "Flashcard Challenge",
      "description": "Match Vietnamese words with their English translations",
      "type": "MULTIPLE_CHOICE",
      "questions": [
        choice("1", "What does 'Xin chào' mean in English?", &["Goodbye", "Hello", "Thank you", "Please"], 1),
        choice("2", "How do you say 'Thank you' in Vietnamese?", &["Xin lỗi", "Tạm biệt", "Cảm ơn", "Xin chào"], 2),
        choice("3", "What is the meaning of 'Tôi'?", &["You", "I/Me", "We", "They"], 1),
        choice("4", "Translate 'Goodbye' to Vietnamese:", &["Chào", "Tạm biệt", "Cảm ơn", "Xin lỗi"], 1),
        choice("5", "What does 'Bạn' mean?", &["Me", "He/She", "You/Friend", "They"], 2),
      ]
    }),
    json!({
      "_id": "demo-sentences",
      "name": "Sắp xếp câu",
      "description": "Put the words in the right order",
      "type": "SENTENCE_ORDER",
      "questions": [
        ordering("1", "I am a student", &["Tôi", "là", "sinh viên"]),
        ordering("2", "I want to drink coffee", &["Tôi", "muốn", "uống", "cà phê"]),
      ]
    }),
  ]
}

fn choice(id: &str, content: &str, options: &[&str], correct: usize) -> Value {
  let answers: Vec<Value> = options
    .iter()
    .enumerate()
    .map(|(i, o)| json!({ "_id": format!("{}-{}", id, i), "content": o, "isCorrect": i == correct }))
    .collect();
  json!({ "_id": id, "content": content, "answers": answers })
}

/// Fragments listed in sentence order; the index doubles as `orderIndex`.
fn ordering(id: &str, content: &str, words: &[&str]) -> Value {
  let answers: Vec<Value> = words
    .iter()
    .enumerate()
    .map(|(i, w)| json!({ "_id": format!("{}-{}", id, i), "content": w, "orderIndex": i }))
    .collect();
  json!({ "_id": id, "content": content, "answers": answers })
}
