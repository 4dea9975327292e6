use std::sync::Arc;

use lib::{auth::ProfessorAuth, SharedState};
use poem::web::Data;
use poem_ext::{db::DbTxn, response};
use poem_openapi::{param::Path, payload::Json, OpenApi};
use uuid::Uuid;

use super::{lessons::get_lesson, Tags};
use crate::{
    schemas::{
        authoring::{
            GenerateFinalTestRequest, GeneratePresentationRequest, GenerateQuizRequest,
            Presentation, RefineStudyTextRequest, StudyText,
        },
        questions::{QuizQuestion, TestQuestion},
    },
    services::authoring::{self, AuthoringError},
};

pub struct Authoring {
    pub state: Arc<SharedState>,
}

#[OpenApi(tag = "Tags::Authoring")]
impl Authoring {
    /// Generate the study text of a lesson from its source files.
    ///
    /// All supported source files are extracted and merged by the model into
    /// one coherent study document. On failure the previous study text is
    /// left untouched; the action is not retried automatically.
    #[oai(path = "/lessons/:lesson_id/study_text", method = "post")]
    async fn generate_study_text(
        &self,
        lesson_id: Path<Uuid>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> GenerateStudyText::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return GenerateStudyText::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return GenerateStudyText::forbidden();
        }

        match authoring::generate_study_text(
            &self.state.services,
            &self.state.storage,
            &db,
            lesson,
        )
        .await
        {
            Ok(lesson) => GenerateStudyText::ok(StudyText {
                text: lesson.student_text,
            }),
            Err(AuthoringError::NoSupportedSources) => GenerateStudyText::no_supported_sources(),
            Err(AuthoringError::Extraction(_)) => GenerateStudyText::extraction_failed(),
            Err(AuthoringError::Generation(_)) => GenerateStudyText::generation_failed(),
            Err(err) => Err(err)?,
        }
    }

    /// Refine the study text with an editing instruction.
    ///
    /// An explicit user-in-the-loop edit step; the text is only replaced
    /// when the model call succeeds.
    #[oai(path = "/lessons/:lesson_id/study_text/refinement", method = "post")]
    async fn refine_study_text(
        &self,
        lesson_id: Path<Uuid>,
        data: Json<RefineStudyTextRequest>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> RefineStudyText::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return RefineStudyText::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return RefineStudyText::forbidden();
        }
        if lesson.student_text.trim().is_empty() {
            return RefineStudyText::no_study_text();
        }

        match authoring::refine_study_text(&self.state.services, &db, lesson, &data.0.instruction)
            .await
        {
            Ok(lesson) => RefineStudyText::ok(StudyText {
                text: lesson.student_text,
            }),
            Err(AuthoringError::Generation(_)) => RefineStudyText::generation_failed(),
            Err(err) => Err(err)?,
        }
    }

    /// Generate the prepared quiz of a lesson.
    ///
    /// Overwrites any previously prepared quiz; last write wins.
    #[oai(path = "/lessons/:lesson_id/quiz", method = "post")]
    async fn generate_quiz(
        &self,
        lesson_id: Path<Uuid>,
        data: Json<GenerateQuizRequest>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> GenerateQuiz::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return GenerateQuiz::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return GenerateQuiz::forbidden();
        }
        if lesson.student_text.trim().is_empty() {
            return GenerateQuiz::no_study_text();
        }

        match authoring::generate_quiz(
            &self.state.services,
            &db,
            lesson,
            data.0.count as _,
            data.0.instructions.as_deref(),
        )
        .await
        {
            Ok(quiz) => GenerateQuiz::ok(quiz),
            Err(AuthoringError::Generation(_)) => GenerateQuiz::generation_failed(),
            Err(AuthoringError::Malformed(_) | AuthoringError::Invalid(_)) => {
                GenerateQuiz::generation_malformed()
            }
            Err(err) => Err(err)?,
        }
    }

    /// Generate the final test of a lesson.
    #[oai(path = "/lessons/:lesson_id/final_test", method = "post")]
    async fn generate_final_test(
        &self,
        lesson_id: Path<Uuid>,
        data: Json<GenerateFinalTestRequest>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> GenerateFinalTest::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return GenerateFinalTest::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return GenerateFinalTest::forbidden();
        }
        if lesson.student_text.trim().is_empty() {
            return GenerateFinalTest::no_study_text();
        }

        match authoring::generate_final_test(
            &self.state.services,
            &db,
            lesson,
            data.0.count as _,
            data.0.ty,
            &data.0.difficulty,
        )
        .await
        {
            Ok(test) => GenerateFinalTest::ok(test),
            Err(AuthoringError::Generation(_)) => GenerateFinalTest::generation_failed(),
            Err(AuthoringError::Malformed(_) | AuthoringError::Invalid(_)) => {
                GenerateFinalTest::generation_malformed()
            }
            Err(err) => Err(err)?,
        }
    }

    /// Generate a presentation outline for a lesson.
    ///
    /// The slides are persisted on the lesson and returned together with the
    /// theme color; the paginated document itself is rendered client-side,
    /// one page per slide.
    #[oai(path = "/lessons/:lesson_id/presentation", method = "post")]
    async fn generate_presentation(
        &self,
        lesson_id: Path<Uuid>,
        data: Json<GeneratePresentationRequest>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> GeneratePresentation::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return GeneratePresentation::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return GeneratePresentation::forbidden();
        }
        if lesson.student_text.trim().is_empty() {
            return GeneratePresentation::no_study_text();
        }

        match authoring::generate_presentation(
            &self.state.services,
            &db,
            lesson,
            data.0.slide_count as _,
        )
        .await
        {
            Ok(slides) => GeneratePresentation::ok(Presentation {
                slides,
                theme_color: data.0.theme_color,
            }),
            Err(AuthoringError::Generation(_)) => GeneratePresentation::generation_failed(),
            Err(AuthoringError::Malformed(_) | AuthoringError::Invalid(_)) => {
                GeneratePresentation::generation_malformed()
            }
            Err(err) => Err(err)?,
        }
    }
}

response!(GenerateStudyText = {
    Ok(200) => StudyText,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
    /// The lesson has no source files with a supported format.
    NoSupportedSources(412, error),
    /// A source file could not be extracted.
    ExtractionFailed(400, error),
    /// The upstream model call failed; the previous study text is untouched.
    GenerationFailed(502, error),
});

response!(RefineStudyText = {
    Ok(200) => StudyText,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
    /// The lesson has no study text to refine.
    NoStudyText(412, error),
    /// The upstream model call failed; the previous study text is untouched.
    GenerationFailed(502, error),
});

response!(GenerateQuiz = {
    Ok(201) => Vec<QuizQuestion>,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
    /// The lesson has no study text to generate from.
    NoStudyText(412, error),
    /// The upstream model call failed.
    GenerationFailed(502, error),
    /// The model output did not match the requested shape. Nothing was
    /// persisted; re-invoke the generation.
    GenerationMalformed(502, error),
});

response!(GenerateFinalTest = {
    Ok(201) => Vec<TestQuestion>,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
    /// The lesson has no study text to generate from.
    NoStudyText(412, error),
    /// The upstream model call failed.
    GenerationFailed(502, error),
    /// The model output did not match the requested shape. Nothing was
    /// persisted; re-invoke the generation.
    GenerationMalformed(502, error),
});

response!(GeneratePresentation = {
    Ok(201) => Presentation,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
    /// The lesson has no study text to generate from.
    NoStudyText(412, error),
    /// The upstream model call failed.
    GenerationFailed(502, error),
    /// The model output did not match the requested shape. Nothing was
    /// persisted; re-invoke the generation.
    GenerationMalformed(502, error),
});
