use std::sync::Arc;

use lib::{auth::VerifiedUserAuth, SharedState};
use poem::web::Data;
use poem_ext::{db::DbTxn, response};
use poem_openapi::{param::Path, payload::Json, OpenApi};
use uuid::Uuid;

use super::{lessons::get_lesson, Tags};
use crate::{
    schemas::{
        chat::{ChatMessage, ChatSession, QuizResult, SendMessageRequest, SubmitQuizRequest},
        questions::PublicQuizQuestion,
    },
    services::chat::{self, ChatError},
};

pub struct Chat {
    pub state: Arc<SharedState>,
}

#[OpenApi(tag = "Tags::Chat")]
impl Chat {
    /// Get the authenticated student's chat session for a lesson.
    ///
    /// The session is created lazily by the first message, so this returns
    /// an empty transcript until then. Messages are ordered by their
    /// server-assigned timestamps.
    #[oai(path = "/lessons/:lesson_id/chat", method = "get")]
    async fn get_chat(
        &self,
        lesson_id: Path<Uuid>,
        db: Data<&DbTxn>,
        auth: VerifiedUserAuth,
    ) -> GetChat::Response<VerifiedUserAuth> {
        if get_lesson(&db, lesson_id.0).await?.is_none() {
            return GetChat::lesson_not_found();
        }

        let session = match chat::get_session(&db, lesson_id.0, &auth.0.id).await? {
            Some(session) => {
                let messages = chat::list_messages(&db, lesson_id.0, &auth.0.id).await?;
                let quizzes = chat::list_quiz_results(&db, lesson_id.0, &auth.0.id).await?;
                ChatSession::from_models(session, messages, quizzes)?
            }
            None => ChatSession {
                lesson_id: lesson_id.0,
                student_id: auth.0.id.clone(),
                student_email: auth.0.email.clone(),
                student_name: None,
                messages: Vec::new(),
                quizzes: Vec::new(),
            },
        };
        GetChat::ok(session)
    }

    /// Send a message to the lesson's chat assistant.
    ///
    /// The message is appended to the transcript, the assistant's reply is
    /// generated grounded in the lesson's study text and appended as well.
    /// The reply is returned; if generation fails a fixed apology is
    /// appended instead, so there is always a response.
    #[oai(path = "/lessons/:lesson_id/chat/messages", method = "post")]
    async fn send_message(
        &self,
        lesson_id: Path<Uuid>,
        data: Json<SendMessageRequest>,
        db: Data<&DbTxn>,
        auth: VerifiedUserAuth,
    ) -> SendMessage::Response<VerifiedUserAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return SendMessage::lesson_not_found();
        };

        let reply = chat::handle_student_message(
            &self.state.services,
            &db,
            &lesson,
            &auth.0.id,
            auth.0.email.clone(),
            None,
            data.0.text,
        )
        .await?;
        SendMessage::ok(reply.into())
    }

    /// Get the prepared quiz of a lesson, without solutions.
    ///
    /// Backs the in-chat quiz module; grading happens on submission.
    #[oai(path = "/lessons/:lesson_id/chat/quiz", method = "get")]
    async fn get_quiz(
        &self,
        lesson_id: Path<Uuid>,
        db: Data<&DbTxn>,
        _auth: VerifiedUserAuth,
    ) -> GetQuiz::Response<VerifiedUserAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return GetQuiz::lesson_not_found();
        };
        match chat::prepared_quiz(&lesson)? {
            Some(quiz) => GetQuiz::ok(quiz.into_iter().map(Into::into).collect()),
            None => GetQuiz::quiz_not_prepared(),
        }
    }

    /// Submit answers to the prepared quiz.
    ///
    /// The attempt is graded once at submission and stored immutably in the
    /// student's session, next to the transcript.
    #[oai(path = "/lessons/:lesson_id/chat/quizzes", method = "post")]
    async fn submit_quiz(
        &self,
        lesson_id: Path<Uuid>,
        data: Json<SubmitQuizRequest>,
        db: Data<&DbTxn>,
        auth: VerifiedUserAuth,
    ) -> SubmitQuiz::Response<VerifiedUserAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return SubmitQuiz::lesson_not_found();
        };

        match chat::submit_quiz(
            &db,
            &lesson,
            &auth.0.id,
            auth.0.email.clone(),
            None,
            data.0.answers,
        )
        .await
        {
            Ok(result) => SubmitQuiz::ok(QuizResult::from_model(result)?),
            Err(ChatError::QuizNotPrepared) => SubmitQuiz::quiz_not_prepared(),
            Err(ChatError::AnswersMismatch) => SubmitQuiz::answers_mismatch(),
            Err(err) => Err(err)?,
        }
    }

    /// Ask a human professor for help.
    ///
    /// Packages the transcript into a digest and sends it to the
    /// operational alert channel. The transcript itself is not changed;
    /// delivery success or failure is reported back.
    #[oai(path = "/lessons/:lesson_id/chat/escalation", method = "post")]
    async fn escalate(
        &self,
        lesson_id: Path<Uuid>,
        db: Data<&DbTxn>,
        auth: VerifiedUserAuth,
    ) -> Escalate::Response<VerifiedUserAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return Escalate::lesson_not_found();
        };

        let student = auth.0.email.clone().unwrap_or_else(|| auth.0.id.clone());
        match chat::escalate(&self.state.services, &db, &lesson, &auth.0.id, &student).await {
            Ok(()) => Escalate::ok(),
            Err(ChatError::Bridge(_)) => Escalate::delivery_failed(),
            Err(err) => Err(err)?,
        }
    }
}

response!(GetChat = {
    Ok(200) => ChatSession,
    /// Lesson does not exist.
    LessonNotFound(404, error),
});

response!(SendMessage = {
    Ok(201) => ChatMessage,
    /// Lesson does not exist.
    LessonNotFound(404, error),
});

response!(GetQuiz = {
    Ok(200) => Vec<PublicQuizQuestion>,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// No quiz has been prepared for this lesson.
    QuizNotPrepared(404, error),
});

response!(SubmitQuiz = {
    Ok(201) => QuizResult,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// No quiz has been prepared for this lesson.
    QuizNotPrepared(404, error),
    /// The answers do not cover every question with a valid option index.
    AnswersMismatch(400, error),
});

response!(Escalate = {
    Ok(200),
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The digest could not be delivered to the operational channel.
    DeliveryFailed(502, error),
});
