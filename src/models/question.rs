// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    pub exam_id: i64,

    /// The text content of the question.
    pub content: String,

    /// Ordered list of options (e.g., ["2", "3", "4", "5"]).
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// The correct option, verbatim.
    pub answer: String,

    /// Explanation of the correct answer.
    pub analysis: Option<String>,

    /// Display order inside the exam.
    pub position: i64,
}

/// DTO for sending question to client (excludes answer and analysis).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub content: String,
    pub options: Vec<String>,
}

impl From<Question> for PublicQuestion {
    fn from(q: Question) -> Self {
        Self {
            id: q.id,
            content: q.content,
            options: q.options.0,
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    pub exam_id: i64,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    #[validate(length(min = 1, max = 500))]
    pub answer: String,
    #[validate(length(max = 4000))]
    pub analysis: Option<String>,
}

impl CreateQuestionRequest {
    /// The correct answer must be one of the offered options.
    pub fn answer_is_an_option(&self) -> bool {
        self.options.iter().any(|o| o == &self.answer)
    }
}

fn validate_options(options: &[String]) -> Result<(), validator::ValidationError> {
    if options.len() < 2 {
        return Err(validator::ValidationError::new("at_least_two_options"));
    }
    for opt in options {
        if opt.is_empty() || opt.len() > 500 {
            return Err(validator::ValidationError::new("invalid_option_length"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(options: &[&str], answer: &str) -> CreateQuestionRequest {
        CreateQuestionRequest {
            exam_id: 1,
            content: "2 + 2 = ?".to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            answer: answer.to_string(),
            analysis: None,
        }
    }

    #[test]
    fn needs_two_options() {
        assert!(request(&["4"], "4").validate().is_err());
        assert!(request(&["3", "4"], "4").validate().is_ok());
    }

    #[test]
    fn answer_must_be_offered() {
        assert!(request(&["3", "4"], "4").answer_is_an_option());
        assert!(!request(&["3", "4"], "5").answer_is_an_option());
    }

    #[test]
    fn public_view_hides_answer() {
        let q = Question {
            id: 1,
            exam_id: 1,
            content: "2 + 2 = ?".to_string(),
            options: Json(vec!["3".to_string(), "4".to_string()]),
            answer: "4".to_string(),
            analysis: Some("basic arithmetic".to_string()),
            position: 0,
        };
        let json = serde_json::to_value(PublicQuestion::from(q)).unwrap();
        assert!(json.get("answer").is_none());
        assert!(json.get("analysis").is_none());
        assert_eq!(json["options"], serde_json::json!(["3", "4"]));
    }
}
