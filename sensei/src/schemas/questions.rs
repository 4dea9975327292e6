use poem_openapi::{Enum, Object};
use serde::{Deserialize, Serialize};

/// A prepared quiz question. Stored on the lesson and graded server-side.
#[derive(Debug, Clone, PartialEq, Eq, Object, Serialize, Deserialize)]
pub struct QuizQuestion {
    /// The question text.
    pub question: String,
    /// The possible answers. Always exactly four.
    #[oai(validator(min_items = 4, max_items = 4))]
    pub options: Vec<String>,
    /// Index of the correct answer.
    #[oai(validator(maximum(value = "3")))]
    pub correct_answer_index: u8,
}

/// A quiz question as shown to students: the solution stays on the server.
#[derive(Debug, Clone, Object)]
pub struct PublicQuizQuestion {
    /// The question text.
    pub question: String,
    /// The possible answers.
    pub options: Vec<String>,
}

impl From<QuizQuestion> for PublicQuizQuestion {
    fn from(question: QuizQuestion) -> Self {
        Self {
            question: question.question,
            options: question.options,
        }
    }
}

/// A final test question. Same shape as [`QuizQuestion`] plus an explanation
/// of the correct answer.
#[derive(Debug, Clone, PartialEq, Eq, Object, Serialize, Deserialize)]
pub struct TestQuestion {
    /// The question text.
    pub question: String,
    /// The possible answers. Always exactly four.
    #[oai(validator(min_items = 4, max_items = 4))]
    pub options: Vec<String>,
    /// Index of the correct answer.
    #[oai(validator(maximum(value = "3")))]
    pub correct_answer_index: u8,
    /// A short explanation of the correct answer.
    pub explanation: String,
}

/// The kind of questions a final test is generated with. Declared per
/// generation request, not per question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Enum, Serialize, Deserialize)]
#[oai(rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum TestType {
    MultipleChoice,
    TrueFalse,
}

impl TestType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultipleChoice => "multiple-choice",
            Self::TrueFalse => "true-false",
        }
    }
}

/// One slide of a generated presentation outline.
#[derive(Debug, Clone, PartialEq, Eq, Object, Serialize, Deserialize)]
pub struct Slide {
    /// The slide title.
    pub title: String,
    /// Up to four short bullet points.
    #[oai(validator(max_items = 4))]
    pub content: Vec<String>,
}
