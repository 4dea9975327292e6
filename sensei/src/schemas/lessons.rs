use chrono::{DateTime, Utc};
use entity::sensei_lessons;
use poem_ext::patch_value::PatchValue;
use poem_openapi::Object;
use uuid::Uuid;

use super::questions::{QuizQuestion, Slide, TestQuestion};

#[derive(Debug, Clone, Object)]
pub struct Lesson {
    /// The unique identifier of the lesson.
    pub id: Uuid,
    /// The lesson title.
    pub title: String,
    /// The lesson subtitle.
    pub subtitle: String,
    /// The professor who owns this lesson.
    pub owner_id: String,
    /// The study text shown to students. Empty until generated or edited.
    pub student_text: String,
    /// Optional video url shown to students.
    pub video_url: Option<String>,
    /// Prompt fragment describing the chat assistant's persona.
    pub chatbot_persona: Option<String>,
    /// Whether a quiz has been prepared for the in-chat quiz module.
    pub has_prepared_quiz: bool,
    /// The prepared quiz. Only available to the owning professor.
    pub prepared_quiz: Option<Vec<QuizQuestion>>,
    /// The generated final test. Only available to the owning professor.
    pub final_test: Option<Vec<TestQuestion>>,
    /// The generated presentation outline, if any.
    pub presentation: Option<Vec<Slide>>,
    /// The creation timestamp of the lesson.
    pub creation_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Object)]
pub struct LessonSummary {
    /// The unique identifier of the lesson.
    pub id: Uuid,
    /// The lesson title.
    pub title: String,
    /// The lesson subtitle.
    pub subtitle: String,
    /// The professor who owns this lesson.
    pub owner_id: String,
    /// The creation timestamp of the lesson.
    pub creation_timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Object)]
pub struct CreateLessonRequest {
    /// The lesson title.
    #[oai(validator(max_length = 256))]
    pub title: String,
    /// The lesson subtitle.
    #[oai(validator(max_length = 1024))]
    pub subtitle: String,
}

#[derive(Debug, Clone, Object)]
pub struct UpdateLessonRequest {
    /// The lesson title.
    #[oai(validator(max_length = 256))]
    pub title: PatchValue<String>,
    /// The lesson subtitle.
    #[oai(validator(max_length = 1024))]
    pub subtitle: PatchValue<String>,
    /// The study text shown to students. This is the professor's direct edit
    /// path; the generation endpoints overwrite it as well.
    pub student_text: PatchValue<String>,
    /// Optional video url shown to students.
    pub video_url: PatchValue<Option<String>>,
    /// Prompt fragment describing the chat assistant's persona.
    #[oai(validator(max_length = 4096))]
    pub chatbot_persona: PatchValue<Option<String>>,
}

impl Lesson {
    /// Build the owner's view of a lesson, including generated artifacts.
    ///
    /// Stored artifact documents are parsed and validated here; a malformed
    /// document is rejected instead of being passed on.
    pub fn from_model(lesson: sensei_lessons::Model) -> Result<Self, serde_json::Error> {
        let prepared_quiz: Option<Vec<QuizQuestion>> = lesson
            .prepared_quiz
            .map(serde_json::from_value)
            .transpose()?;
        Ok(Self {
            id: lesson.id,
            title: lesson.title,
            subtitle: lesson.subtitle,
            owner_id: lesson.owner_id,
            student_text: lesson.student_text,
            video_url: lesson.video_url,
            chatbot_persona: lesson.chatbot_persona,
            has_prepared_quiz: prepared_quiz.as_ref().is_some_and(|quiz| !quiz.is_empty()),
            prepared_quiz,
            final_test: lesson.final_test.map(serde_json::from_value).transpose()?,
            presentation: lesson.presentation.map(serde_json::from_value).transpose()?,
            creation_timestamp: lesson.creation_timestamp.and_utc(),
        })
    }

    /// Build the student's view of a lesson: solutions and the final test
    /// stay on the server.
    pub fn from_model_redacted(lesson: sensei_lessons::Model) -> Result<Self, serde_json::Error> {
        Ok(Self {
            prepared_quiz: None,
            final_test: None,
            ..Self::from_model(lesson)?
        })
    }
}

impl From<sensei_lessons::Model> for LessonSummary {
    fn from(lesson: sensei_lessons::Model) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title,
            subtitle: lesson.subtitle,
            owner_id: lesson.owner_id,
            creation_timestamp: lesson.creation_timestamp.and_utc(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use serde_json::json;

    use super::*;

    fn lesson_model(prepared_quiz: Option<serde_json::Value>) -> sensei_lessons::Model {
        sensei_lessons::Model {
            id: Uuid::nil(),
            title: "Fotosyntéza".into(),
            subtitle: String::new(),
            owner_id: "prof".into(),
            student_text: "text".into(),
            video_url: None,
            chatbot_persona: None,
            prepared_quiz,
            final_test: None,
            presentation: None,
            creation_timestamp: DateTime::from_timestamp_millis(0).unwrap().naive_utc(),
        }
    }

    #[test]
    fn test_stored_quiz_roundtrip() {
        let quiz = vec![QuizQuestion {
            question: "Q".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer_index: 2,
        }];
        let model = lesson_model(Some(serde_json::to_value(&quiz).unwrap()));

        let lesson = Lesson::from_model(model.clone()).unwrap();
        assert!(lesson.has_prepared_quiz);
        assert_eq!(lesson.prepared_quiz.as_deref(), Some(&quiz[..]));

        // students never see the solutions
        let redacted = Lesson::from_model_redacted(model).unwrap();
        assert!(redacted.has_prepared_quiz);
        assert!(redacted.prepared_quiz.is_none());
    }

    #[test]
    fn test_malformed_stored_artifact_is_rejected() {
        let model = lesson_model(Some(json!({"not": "a quiz"})));
        assert!(Lesson::from_model(model).is_err());
    }

    #[test]
    fn test_empty_quiz_does_not_offer_the_quiz_module() {
        let lesson = Lesson::from_model(lesson_model(Some(json!([])))).unwrap();
        assert!(!lesson.has_prepared_quiz);
    }
}
