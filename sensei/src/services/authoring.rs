use entity::sensei_lessons;
use lib::{
    services::{ServiceError, Services},
    storage::{BlobStorage, StorageError},
};
use sea_orm::{ActiveModelTrait, DatabaseTransaction, DbErr, Set, Unchanged};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

use crate::schemas::questions::{QuizQuestion, Slide, TestQuestion, TestType};

use super::extraction::{self, ExtractError};

/// Separator placed between extracted source documents before synthesis; the
/// prompt tells the model what it means.
const SOURCE_SEPARATOR: &str = "\n\n---\n\n";

/// Generate the study text of a lesson from its uploaded source files.
///
/// Every supported source is downloaded and extracted in parallel, the
/// extracted texts are merged by the model into one coherent document, and
/// the result replaces `student_text`. On any failure the lesson keeps its
/// previous text.
pub async fn generate_study_text(
    services: &Services,
    storage: &BlobStorage,
    db: &DatabaseTransaction,
    lesson: sensei_lessons::Model,
) -> Result<sensei_lessons::Model, AuthoringError> {
    let files = storage.list_lesson_files(lesson.id).await?;
    let supported = files
        .into_iter()
        .filter(|file| extraction::is_supported(&file.name))
        .collect::<Vec<_>>();
    if supported.is_empty() {
        return Err(AuthoringError::NoSupportedSources);
    }

    let sources = futures::future::try_join_all(
        supported
            .iter()
            .map(|file| load_source_text(storage, lesson.id, &file.name)),
    )
    .await?;
    let mut texts = Vec::with_capacity(sources.len());
    for source in sources {
        texts.push(source?);
    }

    let text = services
        .gemini
        .generate(&study_text_prompt(&texts), None, None)
        .await?;

    Ok(sensei_lessons::ActiveModel {
        id: Unchanged(lesson.id),
        student_text: Set(text),
        ..Default::default()
    }
    .update(db)
    .await?)
}

async fn load_source_text(
    storage: &BlobStorage,
    lesson_id: Uuid,
    name: &str,
) -> Result<Result<String, ExtractError>, StorageError> {
    let bytes = storage.get_lesson_file(lesson_id, name).await?;
    Ok(extraction::extract(name, &bytes))
}

/// Apply a professor's editing instruction to the current study text. The
/// text is only replaced when the model call succeeds.
pub async fn refine_study_text(
    services: &Services,
    db: &DatabaseTransaction,
    lesson: sensei_lessons::Model,
    instruction: &str,
) -> Result<sensei_lessons::Model, AuthoringError> {
    let text = services
        .gemini
        .generate(&refine_prompt(instruction, &lesson.student_text), None, None)
        .await?;

    Ok(sensei_lessons::ActiveModel {
        id: Unchanged(lesson.id),
        student_text: Set(text),
        ..Default::default()
    }
    .update(db)
    .await?)
}

/// Generate and persist the prepared in-chat quiz. Overwrites any previous
/// quiz, last write wins.
pub async fn generate_quiz(
    services: &Services,
    db: &DatabaseTransaction,
    lesson: sensei_lessons::Model,
    count: usize,
    instructions: Option<&str>,
) -> Result<Vec<QuizQuestion>, AuthoringError> {
    let raw = services
        .gemini
        .generate(
            &quiz_prompt(count, instructions, &lesson.student_text),
            Some(quiz_schema()),
            None,
        )
        .await?;
    let quiz = parse_quiz(&raw, count)?;

    sensei_lessons::ActiveModel {
        id: Unchanged(lesson.id),
        prepared_quiz: Set(Some(serde_json::to_value(&quiz).expect("quiz is serializable"))),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(quiz)
}

/// Generate and persist the final test.
pub async fn generate_final_test(
    services: &Services,
    db: &DatabaseTransaction,
    lesson: sensei_lessons::Model,
    count: usize,
    ty: TestType,
    difficulty: &str,
) -> Result<Vec<TestQuestion>, AuthoringError> {
    let raw = services
        .gemini
        .generate(
            &final_test_prompt(count, ty, difficulty, &lesson.student_text),
            Some(final_test_schema()),
            None,
        )
        .await?;
    let test = parse_final_test(&raw, count)?;

    sensei_lessons::ActiveModel {
        id: Unchanged(lesson.id),
        final_test: Set(Some(serde_json::to_value(&test).expect("test is serializable"))),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(test)
}

/// Generate and persist a presentation outline. The paginated document is
/// rendered client-side from the returned slides.
pub async fn generate_presentation(
    services: &Services,
    db: &DatabaseTransaction,
    lesson: sensei_lessons::Model,
    slide_count: usize,
) -> Result<Vec<Slide>, AuthoringError> {
    let raw = services
        .gemini
        .generate(
            &presentation_prompt(slide_count, &lesson.student_text),
            Some(presentation_schema()),
            None,
        )
        .await?;
    let slides = parse_slides(&raw, slide_count)?;

    sensei_lessons::ActiveModel {
        id: Unchanged(lesson.id),
        presentation: Set(Some(
            serde_json::to_value(&slides).expect("slides are serializable"),
        )),
        ..Default::default()
    }
    .update(db)
    .await?;
    Ok(slides)
}

/// Extract a single source file and ask the model for a structured summary
/// of its key points.
pub async fn analyze_source_file(
    services: &Services,
    storage: &BlobStorage,
    lesson_id: Uuid,
    file_name: &str,
) -> Result<String, AuthoringError> {
    let bytes = storage.get_lesson_file(lesson_id, file_name).await?;
    let text = extraction::extract(file_name, &bytes)?;
    Ok(services
        .gemini
        .generate(&source_analysis_prompt(&text), None, None)
        .await?)
}

pub fn study_text_prompt(sources: &[String]) -> String {
    format!(
        "Jste expert na vzdělávání. Na základě VŠECH NÁSLEDUJÍCÍCH MATERIÁLŮ (oddělených '---') \
         vytvořte jeden souvislý a srozumitelný studijní text pro studenta. Syntetizujte \
         informace ze všech zdrojů. Použijte nadpisy a odrážky. Materiály:\n\n{}",
        sources.join(SOURCE_SEPARATOR)
    )
}

pub fn refine_prompt(instruction: &str, text: &str) -> String {
    format!(
        "Jako expert na vzdělávání, uprav následující text na základě tohoto požadavku: \
         \"{instruction}\". Text k úpravě:\n\n{text}"
    )
}

pub fn quiz_prompt(count: usize, instructions: Option<&str>, text: &str) -> String {
    let extra = instructions
        .filter(|instructions| !instructions.trim().is_empty())
        .map(|instructions| format!("\n4. Zaměř se na tyto specifické pokyny: {instructions}"))
        .unwrap_or_default();
    format!(
        "Jsi učitel. Na základě následujícího studijního textu vytvoř kvíz. Dodržuj tyto \
         instrukce:\n\
         1. Vytvoř přesně {count} otázek.\n\
         2. Každá otázka musí mít 4 možné odpovědi.\n\
         3. Jasně označ index správné odpovědi (0-3).{extra}\n\n\
         Studijní text:\n---\n{text}\n---"
    )
}

pub fn final_test_prompt(count: usize, ty: TestType, difficulty: &str, text: &str) -> String {
    format!(
        "Jsi expert na tvorbu testů. Na základě studijního textu vytvoř finální test.\n\
         Studijní text: \"\"\"{text}\"\"\"\n\
         Požadavky:\n\
         - Vytvoř přesně {count} otázek.\n\
         - Typ otázek: {}.\n\
         - Obtížnost: {difficulty}.\n\
         - Každá otázka musí mít 'question' (otázka), 'options' (pole 4 možností) a \
         'correct_answer_index' (index správné odpovědi 0-3).\n\
         - Přidej i 'explanation' (krátké vysvětlení správné odpovědi).\n\
         Odpověz POUZE ve formátu JSON.",
        ty.as_str()
    )
}

pub fn presentation_prompt(slide_count: usize, text: &str) -> String {
    format!(
        "Jsi expert na tvorbu prezentací. Z následujícího textu vytvoř obsah pro prezentaci o \
         {slide_count} slidech. Každý slide musí mít krátký 'title' a 'content' jako pole s \
         maximálně 4 stručnými odrážkami. Odpověz POUZE ve formátu JSON. Text:\n\n{text}"
    )
}

pub fn source_analysis_prompt(text: &str) -> String {
    format!(
        "Proveď analýzu následujícího textu z edukativního materiálu a vytvoř strukturované \
         shrnutí klíčových bodů:\n\n{text}"
    )
}

fn question_properties() -> Value {
    json!({
        "question": {"type": "STRING"},
        "options": {"type": "ARRAY", "items": {"type": "STRING"}},
        "correct_answer_index": {"type": "INTEGER"}
    })
}

pub fn quiz_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": question_properties(),
            "required": ["question", "options", "correct_answer_index"]
        }
    })
}

pub fn final_test_schema() -> Value {
    let mut properties = question_properties();
    properties["explanation"] = json!({"type": "STRING"});
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": properties,
            "required": ["question", "options", "correct_answer_index", "explanation"]
        }
    })
}

pub fn presentation_schema() -> Value {
    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": {
                "title": {"type": "STRING"},
                "content": {"type": "ARRAY", "items": {"type": "STRING"}}
            },
            "required": ["title", "content"]
        }
    })
}

pub fn parse_quiz(raw: &str, expected_count: usize) -> Result<Vec<QuizQuestion>, AuthoringError> {
    let quiz: Vec<QuizQuestion> = serde_json::from_str(raw).map_err(AuthoringError::Malformed)?;
    if quiz.len() != expected_count {
        return Err(AuthoringError::Invalid("wrong number of questions"));
    }
    for question in &quiz {
        check_question(&question.options, question.correct_answer_index)?;
    }
    Ok(quiz)
}

pub fn parse_final_test(
    raw: &str,
    expected_count: usize,
) -> Result<Vec<TestQuestion>, AuthoringError> {
    let test: Vec<TestQuestion> = serde_json::from_str(raw).map_err(AuthoringError::Malformed)?;
    if test.len() != expected_count {
        return Err(AuthoringError::Invalid("wrong number of questions"));
    }
    for question in &test {
        check_question(&question.options, question.correct_answer_index)?;
    }
    Ok(test)
}

pub fn parse_slides(raw: &str, expected_count: usize) -> Result<Vec<Slide>, AuthoringError> {
    let slides: Vec<Slide> = serde_json::from_str(raw).map_err(AuthoringError::Malformed)?;
    if slides.len() != expected_count {
        return Err(AuthoringError::Invalid("wrong number of slides"));
    }
    Ok(slides)
}

fn check_question(options: &[String], correct_answer_index: u8) -> Result<(), AuthoringError> {
    if options.len() != 4 {
        return Err(AuthoringError::Invalid(
            "question does not have exactly 4 options",
        ));
    }
    if correct_answer_index > 3 {
        return Err(AuthoringError::Invalid("correct answer index out of range"));
    }
    Ok(())
}

#[derive(Debug, Error)]
pub enum AuthoringError {
    #[error("no supported source files")]
    NoSupportedSources,
    #[error("extraction failed: {0}")]
    Extraction(#[from] ExtractError),
    #[error("generation failed: {0}")]
    Generation(#[from] ServiceError),
    #[error("model returned malformed json: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("model returned an invalid artifact: {0}")]
    Invalid(&'static str),
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("database error: {0}")]
    Db(#[from] DbErr),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_study_text_prompt_joins_sources() {
        let prompt = study_text_prompt(&["first".into(), "second".into()]);
        assert!(prompt.contains("first\n\n---\n\nsecond"));
        assert!(prompt.contains("studijní text"));
    }

    #[test]
    fn test_refine_prompt_embeds_instruction_and_text() {
        let prompt = refine_prompt("make it longer", "A");
        assert!(prompt.contains("\"make it longer\""));
        assert!(prompt.ends_with("A"));
    }

    #[test]
    fn test_quiz_prompt_instructions_are_optional() {
        let prompt = quiz_prompt(5, None, "text");
        assert!(prompt.contains("přesně 5 otázek"));
        assert!(!prompt.contains("specifické pokyny"));

        let prompt = quiz_prompt(3, Some("focus on definitions"), "text");
        assert!(prompt.contains("přesně 3 otázek"));
        assert!(prompt.contains("focus on definitions"));

        // whitespace-only instructions are treated as absent
        let prompt = quiz_prompt(3, Some("  "), "text");
        assert!(!prompt.contains("specifické pokyny"));
    }

    #[test]
    fn test_final_test_prompt_embeds_config() {
        let prompt = final_test_prompt(10, TestType::TrueFalse, "lehká", "text");
        assert!(prompt.contains("přesně 10 otázek"));
        assert!(prompt.contains("Typ otázek: true-false"));
        assert!(prompt.contains("Obtížnost: lehká"));
    }

    #[test]
    fn test_parse_quiz_accepts_schema_compliant_output() {
        let raw = r#"[
            {"question": "Q1", "options": ["a", "b", "c", "d"], "correct_answer_index": 2},
            {"question": "Q2", "options": ["a", "b", "c", "d"], "correct_answer_index": 0}
        ]"#;
        let quiz = parse_quiz(raw, 2).unwrap();
        assert_eq!(quiz.len(), 2);
        assert_eq!(quiz[0].correct_answer_index, 2);
        assert_eq!(quiz[1].options.len(), 4);
    }

    #[test]
    fn test_parse_quiz_rejects_wrong_count() {
        let raw = r#"[{"question": "Q", "options": ["a", "b", "c", "d"], "correct_answer_index": 1}]"#;
        assert!(matches!(
            parse_quiz(raw, 5),
            Err(AuthoringError::Invalid("wrong number of questions"))
        ));
    }

    #[test]
    fn test_parse_quiz_rejects_wrong_shape() {
        assert!(matches!(
            parse_quiz("{\"not\": \"an array\"}", 1),
            Err(AuthoringError::Malformed(_))
        ));
        let three_options =
            r#"[{"question": "Q", "options": ["a", "b", "c"], "correct_answer_index": 1}]"#;
        assert!(matches!(
            parse_quiz(three_options, 1),
            Err(AuthoringError::Invalid(_))
        ));
    }

    #[test]
    fn test_parse_final_test_requires_explanation() {
        let raw = r#"[{
            "question": "Co produkuje fotosyntéza?",
            "options": ["kyslík", "dusík", "helium", "metan"],
            "correct_answer_index": 0,
            "explanation": "Fotosyntéza přeměňuje světlo na chemickou energii a uvolňuje kyslík."
        }]"#;
        let test = parse_final_test(raw, 1).unwrap();
        assert_eq!(test.len(), 1);
        assert!(!test[0].explanation.is_empty());

        let missing = r#"[{"question": "Q", "options": ["a", "b", "c", "d"], "correct_answer_index": 0}]"#;
        assert!(matches!(
            parse_final_test(missing, 1),
            Err(AuthoringError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_slides() {
        let raw = r#"[
            {"title": "Úvod", "content": ["bod 1", "bod 2"]},
            {"title": "Závěr", "content": []}
        ]"#;
        let slides = parse_slides(raw, 2).unwrap();
        assert_eq!(slides[0].title, "Úvod");
        assert!(matches!(
            parse_slides(raw, 3),
            Err(AuthoringError::Invalid("wrong number of slides"))
        ));
    }

    #[test]
    fn test_schemas_require_question_fields() {
        let schema = quiz_schema();
        assert_eq!(schema["type"], "ARRAY");
        assert!(schema["items"]["required"]
            .as_array()
            .unwrap()
            .iter()
            .any(|field| field == "correct_answer_index"));
        let schema = final_test_schema();
        assert!(schema["items"]["required"]
            .as_array()
            .unwrap()
            .iter()
            .any(|field| field == "explanation"));
    }
}
