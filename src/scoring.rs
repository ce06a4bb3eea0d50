// src/scoring.rs

use std::collections::HashMap;

use serde::Serialize;

/// Outcome of grading one set of answers against an exam's answer key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreSummary {
    /// Number of correct answers. This is the exam score.
    pub score: i64,
    pub total_questions: i64,
}

impl ScoreSummary {
    /// Score on the ten-point scale used for THPT exams, two decimals.
    pub fn grade_10(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        let raw = self.score as f64 / self.total_questions as f64 * 10.0;
        (raw * 100.0).round() / 100.0
    }
}

/// Grades `user_answers` against `answer_key` (question id -> correct option).
///
/// Unanswered questions count as wrong; answers to questions outside the key
/// are ignored.
pub fn calculate_score(
    user_answers: &HashMap<i64, String>,
    answer_key: &HashMap<i64, String>,
) -> ScoreSummary {
    let score = answer_key
        .iter()
        .filter(|(q_id, correct)| {
            user_answers
                .get(q_id)
                .is_some_and(|given| given.trim() == correct.trim())
        })
        .count() as i64;

    ScoreSummary {
        score,
        total_questions: answer_key.len() as i64,
    }
}
