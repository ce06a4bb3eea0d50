// src/session/answers.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Selected option per question for one exam session.
///
/// Key: Question ID. Value: the option text the candidate picked last.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(HashMap<i64, String>);

impl AnswerMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `option` for `question_id`, replacing any earlier choice.
    pub fn set(&mut self, question_id: i64, option: impl Into<String>) {
        self.0.insert(question_id, option.into());
    }

    pub fn get(&self, question_id: i64) -> Option<&str> {
        self.0.get(&question_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &HashMap<i64, String> {
        &self.0
    }
}

impl From<HashMap<i64, String>> for AnswerMap {
    fn from(map: HashMap<i64, String>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_entry_per_distinct_question() {
        let mut answers = AnswerMap::new();
        answers.set(1, "A");
        answers.set(2, "B");
        answers.set(3, "C");

        assert_eq!(answers.len(), 3);
        assert_eq!(answers.get(2), Some("B"));
    }

    #[test]
    fn last_write_wins() {
        let mut answers = AnswerMap::new();
        for option in ["A", "C", "B", "D"] {
            answers.set(7, option);
        }

        assert_eq!(answers.len(), 1);
        assert_eq!(answers.get(7), Some("D"));
    }

    #[test]
    fn serializes_as_plain_object() {
        let mut answers = AnswerMap::new();
        answers.set(1, "4");

        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(json, serde_json::json!({ "1": "4" }));
    }
}
