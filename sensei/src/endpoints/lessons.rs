use std::sync::Arc;

use chrono::Utc;
use entity::sensei_lessons;
use lib::{
    auth::{ProfessorAuth, VerifiedUserAuth},
    SharedState,
};
use poem::web::Data;
use poem_ext::{db::DbTxn, response, responses::ErrorResponse};
use poem_openapi::{
    param::{Path, Query},
    payload::Json,
    OpenApi,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, Unchanged,
};
use uuid::Uuid;

use super::Tags;
use crate::schemas::lessons::{CreateLessonRequest, Lesson, LessonSummary, UpdateLessonRequest};

pub struct Lessons {
    pub state: Arc<SharedState>,
}

#[OpenApi(tag = "Tags::Lessons")]
impl Lessons {
    /// List all lessons.
    #[oai(path = "/lessons", method = "get")]
    async fn list_lessons(
        &self,
        /// Whether to return only lessons owned by the authenticated user.
        own: Query<Option<bool>>,
        db: Data<&DbTxn>,
        auth: VerifiedUserAuth,
    ) -> ListLessons::Response<VerifiedUserAuth> {
        let mut query = sensei_lessons::Entity::find()
            .order_by_asc(sensei_lessons::Column::CreationTimestamp);
        if own.0.unwrap_or(false) {
            query = query.filter(sensei_lessons::Column::OwnerId.eq(auth.0.id));
        }
        ListLessons::ok(
            query
                .all(&***db)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
        )
    }

    /// Get a lesson by id.
    ///
    /// Solutions (prepared quiz, final test) are only included for the
    /// owning professor.
    #[oai(path = "/lessons/:lesson_id", method = "get")]
    async fn get_lesson(
        &self,
        lesson_id: Path<Uuid>,
        db: Data<&DbTxn>,
        auth: VerifiedUserAuth,
    ) -> GetLesson::Response<VerifiedUserAuth> {
        match get_lesson(&db, lesson_id.0).await? {
            Some(lesson) if lesson.owner_id == auth.0.id => {
                GetLesson::ok(Lesson::from_model(lesson)?)
            }
            Some(lesson) => GetLesson::ok(Lesson::from_model_redacted(lesson)?),
            None => GetLesson::lesson_not_found(),
        }
    }

    /// Create a new lesson.
    #[oai(path = "/lessons", method = "post")]
    async fn create_lesson(
        &self,
        data: Json<CreateLessonRequest>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> CreateLesson::Response<ProfessorAuth> {
        let lesson = sensei_lessons::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(data.0.title),
            subtitle: Set(data.0.subtitle),
            owner_id: Set(auth.0.id),
            student_text: Set(String::new()),
            video_url: Set(None),
            chatbot_persona: Set(None),
            prepared_quiz: Set(None),
            final_test: Set(None),
            presentation: Set(None),
            creation_timestamp: Set(Utc::now().naive_utc()),
        }
        .insert(&***db)
        .await?;
        CreateLesson::ok(Lesson::from_model(lesson)?)
    }

    /// Update a lesson.
    ///
    /// This is the professor's direct edit path; the generation endpoints
    /// additionally overwrite `student_text` and the artifact fields.
    #[oai(path = "/lessons/:lesson_id", method = "patch")]
    async fn update_lesson(
        &self,
        lesson_id: Path<Uuid>,
        data: Json<UpdateLessonRequest>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> UpdateLesson::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return UpdateLesson::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return UpdateLesson::forbidden();
        }

        let lesson = sensei_lessons::ActiveModel {
            id: Unchanged(lesson.id),
            title: data.0.title.update(lesson.title),
            subtitle: data.0.subtitle.update(lesson.subtitle),
            owner_id: Unchanged(lesson.owner_id),
            student_text: data.0.student_text.update(lesson.student_text),
            video_url: data.0.video_url.update(lesson.video_url),
            chatbot_persona: data.0.chatbot_persona.update(lesson.chatbot_persona),
            prepared_quiz: Unchanged(lesson.prepared_quiz),
            final_test: Unchanged(lesson.final_test),
            presentation: Unchanged(lesson.presentation),
            creation_timestamp: Unchanged(lesson.creation_timestamp),
        }
        .update(&***db)
        .await?;
        UpdateLesson::ok(Lesson::from_model(lesson)?)
    }

    /// Delete a lesson.
    ///
    /// This also deletes all chat sessions and removes the stored source
    /// files of the lesson.
    #[oai(path = "/lessons/:lesson_id", method = "delete")]
    async fn delete_lesson(
        &self,
        lesson_id: Path<Uuid>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> DeleteLesson::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return DeleteLesson::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return DeleteLesson::forbidden();
        }

        lesson.delete(&***db).await?;
        self.state.storage.delete_lesson_files(lesson_id.0).await?;
        DeleteLesson::ok()
    }
}

response!(ListLessons = {
    Ok(200) => Vec<LessonSummary>,
});

response!(GetLesson = {
    Ok(200) => Lesson,
    /// Lesson does not exist.
    LessonNotFound(404, error),
});

response!(CreateLesson = {
    Ok(201) => Lesson,
});

response!(UpdateLesson = {
    Ok(200) => Lesson,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
});

response!(DeleteLesson = {
    Ok(200),
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
});

pub(super) async fn get_lesson(
    db: &DatabaseTransaction,
    lesson_id: Uuid,
) -> Result<Option<sensei_lessons::Model>, ErrorResponse> {
    Ok(sensei_lessons::Entity::find_by_id(lesson_id).one(db).await?)
}
