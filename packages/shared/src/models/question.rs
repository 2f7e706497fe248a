use serde::{Deserialize, Serialize};

/// Question text the backend uses to signal that a battle has run out of
/// questions. It never reaches the battle flow as a `Question`; the message
/// decoder turns it into `ServerMessage::QuestionsExhausted`.
pub const END_OF_QUESTIONS: &str = "No more questions";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub question: String,
    #[serde(default)]
    pub answers: Vec<String>,
    #[serde(rename = "correctAnswer", alias = "correct_answer", default)]
    pub correct_answer: String,
    #[serde(default)]
    pub difficulty: Difficulty,
}

impl Question {
    pub fn is_end_marker(&self) -> bool {
        self.question.trim() == END_OF_QUESTIONS
    }

    /// Case-insensitive, whitespace-trimmed comparison. An empty answer is
    /// never correct.
    pub fn is_correct(&self, answer: &str) -> bool {
        let answer = answer.trim();
        !answer.is_empty() && answer.eq_ignore_ascii_case(self.correct_answer.trim())
    }
}
