//! End-of-session scoring and point submission.
//!
//! The submission is best-effort: the summary is returned whatever the
//! upstream says, and a failed write only flips `submitted` to false.

use serde::Serialize;
use tracing::{info, instrument, warn};

use crate::domain::{GameSource, PointRecord};
use crate::session::FinalTally;
use crate::upstream::VietVibeApi;

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
  pub score: u32,
  pub correct_answers: u32,
  pub total_questions: u32,
  /// Rounded percent of correct answers.
  pub accuracy: u32,
  pub outcomes: Vec<bool>,
  pub submitted: bool,
}

/// Reference scoring: a flat amount per correct answer.
pub fn score_for(outcomes: &[bool], points_per_correct: u32) -> u32 {
  outcomes.iter().filter(|ok| **ok).count() as u32 * points_per_correct
}

pub fn summarize(tally: &FinalTally, points_per_correct: u32) -> SessionSummary {
  let accuracy = if tally.total == 0 {
    0
  } else {
    ((tally.correct as f64 / tally.total as f64) * 100.0).round() as u32
  };
  SessionSummary {
    score: score_for(&tally.outcomes, points_per_correct),
    correct_answers: tally.correct,
    total_questions: tally.total,
    accuracy,
    outcomes: tally.outcomes.clone(),
    submitted: false,
  }
}

/// Score the tally and submit the point record once.
#[instrument(level = "info", skip(api, tally), fields(session_id = %tally.session_id, game_id = %tally.game_id))]
pub async fn finalize(api: Option<&VietVibeApi>, tally: FinalTally, points_per_correct: u32) -> SessionSummary {
  let mut summary = summarize(&tally, points_per_correct);

  let api = match (api, tally.source) {
    (Some(api), GameSource::Upstream) => api,
    (_, source) => {
      info!(target: "quiz", ?source, score = summary.score, "No upstream for this game; point record not submitted");
      return summary;
    }
  };

  let record = PointRecord::new(&tally.user_id, &tally.game_id, summary.score, summary.correct_answers, summary.total_questions);
  match api.create_point(&record, tally.auth.as_deref()).await {
    Ok(()) => {
      summary.submitted = true;
      info!(target: "quiz", user_id = %tally.user_id, score = summary.score, correct = summary.correct_answers, total = summary.total_questions, "Point record submitted");
    }
    Err(e) => {
      warn!(target: "quiz", user_id = %tally.user_id, score = summary.score, error = %e, "Point submission failed; result kept locally");
    }
  }
  summary
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::spawn_mock_upstream;
  use serde_json::json;

  fn tally(user: &str, source: GameSource, outcomes: &[bool]) -> FinalTally {
    FinalTally {
      session_id: "s1".into(),
      user_id: user.into(),
      auth: None,
      game_id: "1".into(),
      source,
      correct: outcomes.iter().filter(|o| **o).count() as u32,
      total: outcomes.len() as u32,
      outcomes: outcomes.to_vec(),
    }
  }

  #[test]
  fn score_is_ten_per_correct_answer() {
    assert_eq!(score_for(&[], 10), 0);
    assert_eq!(score_for(&[true, false, true, true], 10), 30);
    assert_eq!(score_for(&[false, false], 10), 0);
  }

  #[test]
  fn summary_reports_accuracy() {
    let s = summarize(&tally("u", GameSource::Upstream, &[true, false, false]), 10);
    assert_eq!((s.score, s.correct_answers, s.total_questions, s.accuracy), (10, 1, 3, 33));
    assert!(!s.submitted);
  }

  #[tokio::test]
  async fn mixed_outcomes_submit_point_record() {
    let mock = spawn_mock_upstream().await;
    let api = mock.api();
    let s = finalize(Some(&api), tally("user-1", GameSource::Upstream, &[true, false]), 10).await;
    assert_eq!(s.score, 10);
    assert_eq!(s.outcomes, vec![true, false]);
    assert!(s.submitted);
    assert_eq!(
      mock.points().await,
      vec![json!({ "userId": "user-1", "gameId": 1, "score": 10, "correctAnswers": 1, "totalQuestions": 2 })]
    );
  }

  #[tokio::test]
  async fn failed_submission_still_returns_summary() {
    let mock = spawn_mock_upstream().await;
    let api = mock.api();
    let s = finalize(Some(&api), tally("reject-me", GameSource::Upstream, &[true]), 10).await;
    assert_eq!(s.score, 10);
    assert!(!s.submitted);
    assert!(mock.points().await.is_empty());
  }

  #[tokio::test]
  async fn local_games_are_not_submitted() {
    let mock = spawn_mock_upstream().await;
    let api = mock.api();
    let s = finalize(Some(&api), tally("user-1", GameSource::LocalBank, &[true, true]), 10).await;
    assert_eq!(s.score, 20);
    assert!(!s.submitted);
    assert!(mock.points().await.is_empty());

    let s = finalize(None, tally("user-1", GameSource::Upstream, &[true]), 10).await;
    assert!(!s.submitted);
  }
}
