//! Per-type correctness rules. Pure: no session access, no I/O.

use crate::domain::{GameKind, Question};
use crate::error::{QuizError, QuizResult};

/// What the player handed in for the current question.
#[derive(Clone, Copy, Debug)]
pub enum Response<'a> {
  /// Id of the single selected answer (choice games).
  Choice(&'a str),
  /// Fragment ids in the order they were placed (ordering games).
  Arrangement(&'a [String]),
}

/// The right answer, returned so the UI can highlight it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expected {
  /// `None` when the question has no answer flagged correct.
  Answer(Option<String>),
  Order(Vec<String>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Evaluation {
  pub correct: bool,
  pub expected: Expected,
}

pub fn evaluate(question: &Question, kind: GameKind, response: Response<'_>) -> QuizResult<Evaluation> {
  match (kind.is_choice(), response) {
    (true, Response::Choice(selected)) => {
      if question.answer(selected).is_none() {
        return Err(QuizError::UnknownAnswer(selected.to_string()));
      }
      let expected = correct_answer_id(question);
      Ok(Evaluation {
        correct: expected == Some(selected),
        expected: Expected::Answer(expected.map(str::to_string)),
      })
    }
    (false, Response::Arrangement(arranged)) => {
      if arranged.is_empty() {
        return Err(QuizError::NoSelection);
      }
      let expected = correct_order(question);
      Ok(Evaluation {
        correct: arranged.len() == expected.len() && arranged.iter().zip(&expected).all(|(a, b)| a == b),
        expected: Expected::Order(expected),
      })
    }
    (_, r) => Err(QuizError::InvalidState(format!("{:?} response does not fit a {:?} game", r, kind))),
  }
}

/// First answer flagged correct, in list order.
pub fn correct_answer_id(question: &Question) -> Option<&str> {
  question.answers.iter().find(|a| a.is_correct()).map(|a| a.id.as_str())
}

/// Answer ids sorted ascending by order index. Stable, so duplicate indices keep list order.
pub fn correct_order(question: &Question) -> Vec<String> {
  let mut answers: Vec<_> = question.answers.iter().collect();
  answers.sort_by_key(|a| a.order_index().unwrap_or(u32::MAX));
  answers.into_iter().map(|a| a.id.clone()).collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{Answer, AnswerKey};

  fn choice_question(answers: &[(&str, bool)]) -> Question {
    Question {
      id: "q".into(),
      content: "What does 'Xin chào' mean?".into(),
      image_url: String::new(),
      audio_url: String::new(),
      answers: answers
        .iter()
        .map(|(id, ok)| Answer { id: id.to_string(), content: id.to_string(), key: AnswerKey::Correct(*ok) })
        .collect(),
    }
  }

  fn order_question(answers: &[(&str, u32)]) -> Question {
    Question {
      id: "q".into(),
      content: "Sắp xếp".into(),
      image_url: String::new(),
      audio_url: String::new(),
      answers: answers
        .iter()
        .map(|(id, i)| Answer { id: id.to_string(), content: id.to_string(), key: AnswerKey::Order(*i) })
        .collect(),
    }
  }

  fn ids(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn choice_correct_only_for_flagged_answer() {
    let q = choice_question(&[("a", false), ("b", true), ("c", false)]);
    for kind in [GameKind::MultipleChoice, GameKind::ListeningChoice] {
      let ev = evaluate(&q, kind, Response::Choice("b")).unwrap();
      assert!(ev.correct);
      assert_eq!(ev.expected, Expected::Answer(Some("b".into())));
      assert!(!evaluate(&q, kind, Response::Choice("a")).unwrap().correct);
      assert!(!evaluate(&q, kind, Response::Choice("c")).unwrap().correct);
    }
  }

  #[test]
  fn choice_tie_break_uses_first_flagged() {
    let q = choice_question(&[("a", false), ("b", true), ("c", true)]);
    assert!(evaluate(&q, GameKind::MultipleChoice, Response::Choice("b")).unwrap().correct);
    assert!(!evaluate(&q, GameKind::MultipleChoice, Response::Choice("c")).unwrap().correct);

    let none = choice_question(&[("a", false), ("b", false)]);
    let ev = evaluate(&none, GameKind::MultipleChoice, Response::Choice("a")).unwrap();
    assert!(!ev.correct);
    assert_eq!(ev.expected, Expected::Answer(None));
  }

  #[test]
  fn choice_unknown_answer_is_rejected() {
    let q = choice_question(&[("a", true)]);
    assert!(matches!(
      evaluate(&q, GameKind::MultipleChoice, Response::Choice("zzz")),
      Err(QuizError::UnknownAnswer(id)) if id == "zzz"
    ));
  }

  #[test]
  fn ordering_matches_ascending_order_index() {
    let q = order_question(&[("x", 1), ("y", 0), ("z", 2)]);
    let ev = evaluate(&q, GameKind::SentenceOrder, Response::Arrangement(&ids(&["y", "x", "z"]))).unwrap();
    assert!(ev.correct);
    assert_eq!(ev.expected, Expected::Order(ids(&["y", "x", "z"])));

    let ev = evaluate(&q, GameKind::SentenceOrder, Response::Arrangement(&ids(&["x", "y", "z"]))).unwrap();
    assert!(!ev.correct);
  }

  #[test]
  fn ordering_any_adjacent_transposition_is_wrong() {
    let q = order_question(&[("d", 3), ("a", 0), ("c", 2), ("b", 1)]);
    let right = ids(&["a", "b", "c", "d"]);
    assert!(evaluate(&q, GameKind::SentenceOrder, Response::Arrangement(&right)).unwrap().correct);
    for i in 0..right.len() - 1 {
      let mut swapped = right.clone();
      swapped.swap(i, i + 1);
      assert!(!evaluate(&q, GameKind::SentenceOrder, Response::Arrangement(&swapped)).unwrap().correct);
    }
  }

  #[test]
  fn ordering_partial_arrangement_gets_no_credit() {
    let q = order_question(&[("a", 0), ("b", 1), ("c", 2)]);
    assert!(!evaluate(&q, GameKind::SentenceOrder, Response::Arrangement(&ids(&["a", "b"]))).unwrap().correct);
    assert!(matches!(
      evaluate(&q, GameKind::SentenceOrder, Response::Arrangement(&[])),
      Err(QuizError::NoSelection)
    ));
  }

  #[test]
  fn response_must_match_game_kind() {
    let q = choice_question(&[("a", true)]);
    assert!(matches!(
      evaluate(&q, GameKind::SentenceOrder, Response::Choice("a")),
      Err(QuizError::InvalidState(_))
    ));
  }
}
