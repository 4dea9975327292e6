use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use entity::{
    sea_orm_active_enums::SenseiMessageSender, sensei_chat_messages, sensei_chat_sessions,
    sensei_quiz_results,
};
use poem_openapi::Object;
use uuid::Uuid;

use super::questions::QuizQuestion;

#[derive(Debug, Clone, Object)]
pub struct ChatMessage {
    /// The unique identifier of the message.
    pub id: Uuid,
    /// The message text.
    pub text: String,
    /// Who sent the message.
    pub sender: SenseiMessageSender,
    /// The server-assigned timestamp. Consumers must order by this value,
    /// not by insertion order.
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Object)]
pub struct SendMessageRequest {
    /// The message text.
    #[oai(validator(min_length = 1, max_length = 4096))]
    pub text: String,
}

/// A per-student, per-lesson transcript with its quiz results.
#[derive(Debug, Clone, Object)]
pub struct ChatSession {
    pub lesson_id: Uuid,
    pub student_id: String,
    pub student_email: Option<String>,
    pub student_name: Option<String>,
    /// Messages ordered by timestamp.
    pub messages: Vec<ChatMessage>,
    /// Quiz results ordered by submission time.
    pub quizzes: Vec<QuizResult>,
}

#[derive(Debug, Clone, Object)]
pub struct ChatSessionSummary {
    pub lesson_id: Uuid,
    pub student_id: String,
    pub student_email: Option<String>,
    pub student_name: Option<String>,
    pub creation_timestamp: DateTime<Utc>,
}

/// A submitted quiz attempt, graded once at submission and stored immutably.
#[derive(Debug, Clone, Object)]
pub struct QuizResult {
    /// The unique identifier of the attempt.
    pub id: Uuid,
    /// The quiz questions at the time of the attempt.
    pub quiz_data: Vec<QuizQuestion>,
    /// Chosen option index per question index.
    pub answers: BTreeMap<String, u8>,
    /// Number of correctly answered questions.
    pub score: u64,
    /// When the attempt was submitted.
    pub submitted_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Object)]
pub struct SubmitQuizRequest {
    /// Chosen option index per question index. Every question must be
    /// answered.
    pub answers: BTreeMap<String, u8>,
}

impl From<sensei_chat_messages::Model> for ChatMessage {
    fn from(message: sensei_chat_messages::Model) -> Self {
        Self {
            id: message.id,
            text: message.text,
            sender: message.sender,
            timestamp: message.timestamp.and_utc(),
        }
    }
}

impl From<sensei_chat_sessions::Model> for ChatSessionSummary {
    fn from(session: sensei_chat_sessions::Model) -> Self {
        Self {
            lesson_id: session.lesson_id,
            student_id: session.student_id,
            student_email: session.student_email,
            student_name: session.student_name,
            creation_timestamp: session.creation_timestamp.and_utc(),
        }
    }
}

impl QuizResult {
    pub fn from_model(result: sensei_quiz_results::Model) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: result.id,
            quiz_data: serde_json::from_value(result.quiz_data)?,
            answers: serde_json::from_value(result.answers)?,
            score: result.score.max(0) as _,
            submitted_timestamp: result.submitted_timestamp.and_utc(),
        })
    }
}

impl ChatSession {
    pub fn from_models(
        session: sensei_chat_sessions::Model,
        messages: Vec<sensei_chat_messages::Model>,
        quizzes: Vec<sensei_quiz_results::Model>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            lesson_id: session.lesson_id,
            student_id: session.student_id,
            student_email: session.student_email,
            student_name: session.student_name,
            messages: messages.into_iter().map(Into::into).collect(),
            quizzes: quizzes
                .into_iter()
                .map(QuizResult::from_model)
                .collect::<Result<_, _>>()?,
        })
    }
}
