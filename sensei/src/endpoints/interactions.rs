use std::sync::Arc;

use lib::{auth::ProfessorAuth, SharedState};
use poem::web::Data;
use poem_ext::{db::DbTxn, response};
use poem_openapi::{param::Path, payload::Json, OpenApi};
use uuid::Uuid;

use super::{lessons::get_lesson, Tags};
use crate::{
    schemas::{
        analysis::ProgressAnalysis,
        chat::{ChatMessage, ChatSession, ChatSessionSummary, SendMessageRequest},
    },
    services::chat::{self, ChatError},
};

pub struct Interactions {
    pub state: Arc<SharedState>,
}

#[OpenApi(tag = "Tags::Interactions")]
impl Interactions {
    /// List the chat sessions of a lesson.
    #[oai(path = "/lessons/:lesson_id/chats", method = "get")]
    async fn list_sessions(
        &self,
        lesson_id: Path<Uuid>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> ListSessions::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return ListSessions::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return ListSessions::forbidden();
        }
        ListSessions::ok(
            chat::list_sessions(&db, lesson_id.0)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
        )
    }

    /// Get one student's chat session with transcript and quiz results.
    #[oai(path = "/lessons/:lesson_id/chats/:student_id", method = "get")]
    async fn get_session(
        &self,
        lesson_id: Path<Uuid>,
        student_id: Path<String>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> GetSession::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return GetSession::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return GetSession::forbidden();
        }
        let Some(session) = chat::get_session(&db, lesson_id.0, &student_id.0).await? else {
            return GetSession::session_not_found();
        };

        let messages = chat::list_messages(&db, lesson_id.0, &student_id.0).await?;
        let quizzes = chat::list_quiz_results(&db, lesson_id.0, &student_id.0).await?;
        GetSession::ok(ChatSession::from_models(session, messages, quizzes)?)
    }

    /// Send a message to a student.
    ///
    /// The message is appended to the student's transcript and relayed to
    /// their linked Telegram chat so it reaches them outside the web app.
    #[oai(path = "/lessons/:lesson_id/chats/:student_id/messages", method = "post")]
    async fn send_message(
        &self,
        lesson_id: Path<Uuid>,
        student_id: Path<String>,
        data: Json<SendMessageRequest>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> SendProfessorMessage::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return SendProfessorMessage::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return SendProfessorMessage::forbidden();
        }
        if chat::get_session(&db, lesson_id.0, &student_id.0)
            .await?
            .is_none()
        {
            return SendProfessorMessage::session_not_found();
        }

        match chat::professor_reply(
            &self.state.services,
            &db,
            &lesson,
            &student_id.0,
            data.0.text,
        )
        .await
        {
            Ok(message) => SendProfessorMessage::ok(message.into()),
            Err(ChatError::StudentNotLinked) => SendProfessorMessage::student_not_linked(),
            Err(ChatError::Bridge(_)) => SendProfessorMessage::delivery_failed(),
            Err(err) => Err(err)?,
        }
    }

    /// Generate a pedagogical analysis of one student's work.
    ///
    /// The model receives the study text, the chat transcript and the quiz
    /// scores and returns structured findings and recommendations.
    #[oai(path = "/lessons/:lesson_id/chats/:student_id/analysis", method = "post")]
    async fn analyze_student(
        &self,
        lesson_id: Path<Uuid>,
        student_id: Path<String>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> AnalyzeStudent::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return AnalyzeStudent::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return AnalyzeStudent::forbidden();
        }
        if chat::get_session(&db, lesson_id.0, &student_id.0)
            .await?
            .is_none()
        {
            return AnalyzeStudent::session_not_found();
        }

        match chat::generate_progress_analysis(&self.state.services, &db, &lesson, &student_id.0)
            .await
        {
            Ok(analysis) => AnalyzeStudent::ok(analysis),
            Err(ChatError::Bridge(_)) => AnalyzeStudent::generation_failed(),
            Err(ChatError::Malformed(_)) => AnalyzeStudent::generation_malformed(),
            Err(err) => Err(err)?,
        }
    }
}

response!(ListSessions = {
    Ok(200) => Vec<ChatSessionSummary>,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
});

response!(GetSession = {
    Ok(200) => ChatSession,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The student has no chat session in this lesson.
    SessionNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
});

response!(SendProfessorMessage = {
    Ok(201) => ChatMessage,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The student has no chat session in this lesson.
    SessionNotFound(404, error),
    /// The student has no linked external chat.
    StudentNotLinked(404, error),
    /// The message could not be relayed to the student's chat.
    DeliveryFailed(502, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
});

response!(AnalyzeStudent = {
    Ok(200) => ProgressAnalysis,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The student has no chat session in this lesson.
    SessionNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
    /// The upstream model call failed.
    GenerationFailed(502, error),
    /// The model output did not match the requested shape.
    GenerationMalformed(502, error),
});
