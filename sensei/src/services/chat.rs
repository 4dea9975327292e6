use std::collections::BTreeMap;

use chrono::Utc;
use entity::{
    sea_orm_active_enums::SenseiMessageSender, sensei_chat_messages, sensei_chat_sessions,
    sensei_lessons, sensei_quiz_results, sensei_students,
};
use itertools::Itertools;
use lib::services::{ServiceError, Services};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::schemas::{analysis::ProgressAnalysis, questions::QuizQuestion};

/// Reply appended in place of the model's answer when the generation call
/// fails; the student must always see a response to their message.
pub const FALLBACK_REPLY: &str = "Omlouvám se, došlo k chybě.";

/// Append one message to a chat session.
///
/// Messages are rows, so concurrent appenders (web client, Telegram webhook,
/// professor console) can never clobber each other; ordering is established
/// by sorting on the server-assigned timestamp at read time, not by
/// insertion order.
pub async fn append_message(
    db: &DatabaseTransaction,
    lesson_id: Uuid,
    student_id: &str,
    sender: SenseiMessageSender,
    text: String,
) -> Result<sensei_chat_messages::Model, DbErr> {
    sensei_chat_messages::ActiveModel {
        id: Set(Uuid::new_v4()),
        lesson_id: Set(lesson_id),
        student_id: Set(student_id.to_owned()),
        text: Set(text),
        sender: Set(sender),
        timestamp: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
}

/// Fetch an existing session or create it lazily with the student's
/// identity metadata.
pub async fn ensure_session(
    db: &DatabaseTransaction,
    lesson_id: Uuid,
    student_id: &str,
    student_email: Option<String>,
    student_name: Option<String>,
) -> Result<sensei_chat_sessions::Model, DbErr> {
    if let Some(session) =
        sensei_chat_sessions::Entity::find_by_id((lesson_id, student_id.to_owned()))
            .one(db)
            .await?
    {
        return Ok(session);
    }
    sensei_chat_sessions::ActiveModel {
        lesson_id: Set(lesson_id),
        student_id: Set(student_id.to_owned()),
        student_email: Set(student_email),
        student_name: Set(student_name),
        creation_timestamp: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await
}

pub async fn get_session(
    db: &DatabaseTransaction,
    lesson_id: Uuid,
    student_id: &str,
) -> Result<Option<sensei_chat_sessions::Model>, DbErr> {
    sensei_chat_sessions::Entity::find_by_id((lesson_id, student_id.to_owned()))
        .one(db)
        .await
}

pub async fn list_sessions(
    db: &DatabaseTransaction,
    lesson_id: Uuid,
) -> Result<Vec<sensei_chat_sessions::Model>, DbErr> {
    sensei_chat_sessions::Entity::find()
        .filter(sensei_chat_sessions::Column::LessonId.eq(lesson_id))
        .order_by_asc(sensei_chat_sessions::Column::CreationTimestamp)
        .all(db)
        .await
}

pub async fn list_messages(
    db: &DatabaseTransaction,
    lesson_id: Uuid,
    student_id: &str,
) -> Result<Vec<sensei_chat_messages::Model>, DbErr> {
    let mut messages = sensei_chat_messages::Entity::find()
        .filter(sensei_chat_messages::Column::LessonId.eq(lesson_id))
        .filter(sensei_chat_messages::Column::StudentId.eq(student_id))
        .all(db)
        .await?;
    sort_messages(&mut messages);
    Ok(messages)
}

/// Establish the display order of a transcript. Two messages appended in the
/// same millisecond get a stable order via the id tiebreak.
pub fn sort_messages(messages: &mut [sensei_chat_messages::Model]) {
    messages.sort_by(|a, b| {
        a.timestamp
            .cmp(&b.timestamp)
            .then_with(|| a.id.cmp(&b.id))
    });
}

pub async fn list_quiz_results(
    db: &DatabaseTransaction,
    lesson_id: Uuid,
    student_id: &str,
) -> Result<Vec<sensei_quiz_results::Model>, DbErr> {
    sensei_quiz_results::Entity::find()
        .filter(sensei_quiz_results::Column::LessonId.eq(lesson_id))
        .filter(sensei_quiz_results::Column::StudentId.eq(student_id))
        .order_by_asc(sensei_quiz_results::Column::SubmittedTimestamp)
        .all(db)
        .await
}

/// Handle one student message: persist it, ask the model for a grounded
/// reply and persist that too. A failed model call turns into the fixed
/// apology reply instead of a dropped turn.
pub async fn handle_student_message(
    services: &Services,
    db: &DatabaseTransaction,
    lesson: &sensei_lessons::Model,
    student_id: &str,
    student_email: Option<String>,
    student_name: Option<String>,
    text: String,
) -> Result<sensei_chat_messages::Model, ChatError> {
    ensure_session(db, lesson.id, student_id, student_email, student_name).await?;
    append_message(
        db,
        lesson.id,
        student_id,
        SenseiMessageSender::Student,
        text.clone(),
    )
    .await?;

    let system_instruction = system_instruction(lesson);
    let reply = match services
        .gemini
        .generate(&text, None, Some(&system_instruction))
        .await
    {
        Ok(reply) => reply,
        Err(err) => {
            error!("chat reply generation failed for lesson {}: {err}", lesson.id);
            FALLBACK_REPLY.to_owned()
        }
    };

    Ok(append_message(db, lesson.id, student_id, SenseiMessageSender::Ai, reply).await?)
}

/// System instruction grounding the assistant in the lesson's study text,
/// optionally flavored with the professor's persona fragment.
pub fn system_instruction(lesson: &sensei_lessons::Model) -> String {
    let persona = lesson
        .chatbot_persona
        .as_deref()
        .map(|persona| format!("{persona} "))
        .unwrap_or_default();
    format!(
        "Jste expert a asistent. Odpovídejte pouze na základě poskytnutého kontextu. {persona}\
         Kontext:\n\n{}",
        lesson.student_text
    )
}

/// Append a professor-authored message and relay it to the student's linked
/// Telegram chat.
pub async fn professor_reply(
    services: &Services,
    db: &DatabaseTransaction,
    lesson: &sensei_lessons::Model,
    student_id: &str,
    text: String,
) -> Result<sensei_chat_messages::Model, ChatError> {
    let message = append_message(
        db,
        lesson.id,
        student_id,
        SenseiMessageSender::Professor,
        text.clone(),
    )
    .await?;

    let student = sensei_students::Entity::find()
        .filter(sensei_students::Column::UserId.eq(student_id))
        .one(db)
        .await?
        .ok_or(ChatError::StudentNotLinked)?;
    services.telegram.send_message(student.chat_id, &text).await?;

    Ok(message)
}

/// Package the visible transcript into a digest and hand it to a human via
/// the operational alert channel. The transcript itself is not mutated.
pub async fn escalate(
    services: &Services,
    db: &DatabaseTransaction,
    lesson: &sensei_lessons::Model,
    student_id: &str,
    student: &str,
) -> Result<(), ChatError> {
    let messages = list_messages(db, lesson.id, student_id).await?;
    let digest = escalation_digest(&lesson.title, student, &messages);
    services.telegram.notify_operations(&digest).await?;
    Ok(())
}

pub fn escalation_digest(
    lesson_title: &str,
    student: &str,
    messages: &[sensei_chat_messages::Model],
) -> String {
    let transcript = messages
        .iter()
        .map(|message| {
            let prefix = match message.sender {
                SenseiMessageSender::Student => "Student",
                SenseiMessageSender::Ai => "AI",
                SenseiMessageSender::Professor => "Profesor",
            };
            format!("{prefix}: {}", message.text)
        })
        .join("\n");
    format!(
        "*Nová žádost o pomoc od studenta!*\n\n*Lekce:* {lesson_title}\n*Student:* {student}\n\n\
         *Průběh konverzace:*\n```\n{transcript}\n```"
    )
}

/// The prepared quiz of a lesson, parsed and validated at the store
/// boundary. `None` when no (or an empty) quiz has been prepared.
pub fn prepared_quiz(
    lesson: &sensei_lessons::Model,
) -> Result<Option<Vec<QuizQuestion>>, ChatError> {
    let Some(value) = &lesson.prepared_quiz else {
        return Ok(None);
    };
    let quiz: Vec<QuizQuestion> =
        serde_json::from_value(value.clone()).map_err(ChatError::Corrupt)?;
    Ok((!quiz.is_empty()).then_some(quiz))
}

/// Grade and persist one quiz attempt. The score is computed once here and
/// stored immutably together with the quiz snapshot.
pub async fn submit_quiz(
    db: &DatabaseTransaction,
    lesson: &sensei_lessons::Model,
    student_id: &str,
    student_email: Option<String>,
    student_name: Option<String>,
    answers: BTreeMap<String, u8>,
) -> Result<sensei_quiz_results::Model, ChatError> {
    let quiz = prepared_quiz(lesson)?.ok_or(ChatError::QuizNotPrepared)?;
    if !answers_match(&quiz, &answers) {
        return Err(ChatError::AnswersMismatch);
    }
    let score = score_quiz(&quiz, &answers);

    ensure_session(db, lesson.id, student_id, student_email, student_name).await?;
    Ok(sensei_quiz_results::ActiveModel {
        id: Set(Uuid::new_v4()),
        lesson_id: Set(lesson.id),
        student_id: Set(student_id.to_owned()),
        quiz_data: Set(serde_json::to_value(&quiz).expect("quiz is serializable")),
        answers: Set(serde_json::to_value(&answers).expect("answers are serializable")),
        score: Set(score as i64),
        submitted_timestamp: Set(Utc::now().naive_utc()),
    }
    .insert(db)
    .await?)
}

/// Every question must be answered with a valid option index.
pub fn answers_match(quiz: &[QuizQuestion], answers: &BTreeMap<String, u8>) -> bool {
    answers.len() == quiz.len()
        && answers.iter().all(|(index, answer)| {
            index
                .parse::<usize>()
                .is_ok_and(|index| index < quiz.len())
                && *answer <= 3
        })
}

/// Number of questions whose chosen option is the correct one. Pure; grading
/// the same attempt twice always yields the same score.
pub fn score_quiz(quiz: &[QuizQuestion], answers: &BTreeMap<String, u8>) -> u64 {
    quiz.iter()
        .enumerate()
        .filter(|(index, question)| {
            answers.get(&index.to_string()) == Some(&question.correct_answer_index)
        })
        .count() as u64
}

/// Generate the structured overall analysis of one student's work from the
/// transcript, the quiz scores and the study text.
pub async fn generate_progress_analysis(
    services: &Services,
    db: &DatabaseTransaction,
    lesson: &sensei_lessons::Model,
    student_id: &str,
) -> Result<ProgressAnalysis, ChatError> {
    let messages = list_messages(db, lesson.id, student_id).await?;
    let quizzes = list_quiz_results(db, lesson.id, student_id).await?;

    let transcript = messages
        .iter()
        .map(|message| {
            let sender = match message.sender {
                SenseiMessageSender::Student => "student",
                SenseiMessageSender::Ai => "ai",
                SenseiMessageSender::Professor => "professor",
            };
            format!("{sender}: {}", message.text)
        })
        .join("\n");
    let quiz_summary = quizzes
        .iter()
        .enumerate()
        .map(|(index, quiz)| {
            let total = quiz
                .quiz_data
                .as_array()
                .map(Vec::len)
                .unwrap_or_default();
            format!("Kvíz {}: Skóre {}/{}", index + 1, quiz.score, total)
        })
        .join("\n");

    let raw = services
        .gemini
        .generate(
            &analysis_prompt(&lesson.student_text, &transcript, &quiz_summary),
            Some(analysis_schema()),
            None,
        )
        .await?;
    serde_json::from_str(&raw).map_err(ChatError::Malformed)
}

pub fn analysis_prompt(study_text: &str, transcript: &str, quiz_summary: &str) -> String {
    format!(
        "Jsi expertní pedagogický poradce. Na základě celé historie interakcí a všech výsledků \
         kvízů studenta v této lekci, vytvoř strukturovanou analýzu a doporučení.\n\n\
         Studijní text lekce:\n---\n{study_text}\n---\n\n\
         Historie konverzace studenta s AI:\n---\n{transcript}\n---\n\n\
         Souhrn výsledků kvízů:\n---\n{quiz_summary}\n---\n\n\
         Odpověz POUZE ve formátu JSON podle zadaného schématu. Neuváděj žádný další text mimo \
         JSON."
    )
}

pub fn analysis_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "strong_points": {
                "type": "ARRAY",
                "description": "Pozitivní zjištění, co student zvládl.",
                "items": {"type": "STRING"}
            },
            "areas_for_improvement": {
                "type": "ARRAY",
                "description": "Konkrétní oblasti, kde má student mezery.",
                "items": {"type": "STRING"}
            },
            "recommendations_for_student": {
                "type": "ARRAY",
                "description": "Akční kroky pro studenta.",
                "items": {"type": "STRING"}
            },
            "recommendations_for_professor": {
                "type": "ARRAY",
                "description": "Návrhy, jak může profesor pomoci.",
                "items": {"type": "STRING"}
            }
        },
        "required": [
            "strong_points",
            "areas_for_improvement",
            "recommendations_for_student",
            "recommendations_for_professor"
        ]
    })
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("messaging bridge error: {0}")]
    Bridge(#[from] ServiceError),
    #[error("student has no linked telegram chat")]
    StudentNotLinked,
    #[error("lesson has no prepared quiz")]
    QuizNotPrepared,
    #[error("answers do not match the prepared quiz")]
    AnswersMismatch,
    #[error("stored artifact is malformed: {0}")]
    Corrupt(#[source] serde_json::Error),
    #[error("model returned malformed json: {0}")]
    Malformed(#[source] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, NaiveDateTime};

    use super::*;

    fn question(correct_answer_index: u8) -> QuizQuestion {
        QuizQuestion {
            question: "Q".into(),
            options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            correct_answer_index,
        }
    }

    fn answers(pairs: &[(usize, u8)]) -> BTreeMap<String, u8> {
        pairs
            .iter()
            .map(|(index, answer)| (index.to_string(), *answer))
            .collect()
    }

    fn timestamp_millis(millis: i64) -> NaiveDateTime {
        DateTime::from_timestamp_millis(millis).unwrap().naive_utc()
    }

    fn message(
        millis: i64,
        id: Uuid,
        sender: SenseiMessageSender,
        text: &str,
    ) -> sensei_chat_messages::Model {
        sensei_chat_messages::Model {
            id,
            lesson_id: Uuid::nil(),
            student_id: "student".into(),
            text: text.into(),
            sender,
            timestamp: timestamp_millis(millis),
        }
    }

    #[test]
    fn test_score_quiz() {
        let quiz = vec![question(2)];
        assert_eq!(score_quiz(&quiz, &answers(&[(0, 2)])), 1);
        assert_eq!(score_quiz(&quiz, &answers(&[(0, 1)])), 0);
        // recomputing from the same inputs always yields the same score
        assert_eq!(score_quiz(&quiz, &answers(&[(0, 2)])), 1);

        let quiz = vec![question(0), question(3), question(1)];
        assert_eq!(score_quiz(&quiz, &answers(&[(0, 0), (1, 3), (2, 2)])), 2);
    }

    #[test]
    fn test_answers_must_cover_every_question() {
        let quiz = vec![question(0), question(1)];
        assert!(answers_match(&quiz, &answers(&[(0, 0), (1, 1)])));
        assert!(!answers_match(&quiz, &answers(&[(0, 0)])));
        assert!(!answers_match(&quiz, &answers(&[(0, 0), (2, 1)])));
        assert!(!answers_match(&quiz, &answers(&[(0, 0), (1, 4)])));
        let mut extra = answers(&[(0, 0), (1, 1)]);
        extra.insert("x".into(), 0);
        assert!(!answers_match(&quiz, &extra));
    }

    #[test]
    fn test_concurrent_appends_sort_into_a_total_order() {
        // two senders landing within the same millisecond: both survive and
        // the (timestamp, id) order is total and stable
        let id_a = Uuid::from_u128(1);
        let id_b = Uuid::from_u128(2);
        let mut transcript = vec![
            message(2000, Uuid::from_u128(7), SenseiMessageSender::Ai, "late"),
            message(1000, id_b, SenseiMessageSender::Student, "web"),
            message(1000, id_a, SenseiMessageSender::Student, "telegram"),
            message(500, Uuid::from_u128(9), SenseiMessageSender::Student, "early"),
        ];
        sort_messages(&mut transcript);
        let texts: Vec<_> = transcript.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["early", "telegram", "web", "late"]);
        assert_eq!(transcript.len(), 4);
    }

    #[test]
    fn test_system_instruction_embeds_study_text_and_persona() {
        let mut lesson = sensei_lessons::Model {
            id: Uuid::nil(),
            title: "Fotosyntéza".into(),
            subtitle: String::new(),
            owner_id: "prof".into(),
            student_text: "Rostliny přeměňují světlo.".into(),
            video_url: None,
            chatbot_persona: None,
            prepared_quiz: None,
            final_test: None,
            presentation: None,
            creation_timestamp: timestamp_millis(0),
        };
        let instruction = system_instruction(&lesson);
        assert!(instruction.contains("Rostliny přeměňují světlo."));
        assert!(instruction.contains("pouze na základě poskytnutého kontextu"));

        lesson.chatbot_persona = Some("Mluv jako pirát.".into());
        assert!(system_instruction(&lesson).contains("Mluv jako pirát."));
    }

    #[test]
    fn test_escalation_digest_format() {
        let transcript = [
            message(1, Uuid::from_u128(1), SenseiMessageSender::Student, "Nerozumím."),
            message(2, Uuid::from_u128(2), SenseiMessageSender::Ai, "Zkusím to vysvětlit."),
            message(3, Uuid::from_u128(3), SenseiMessageSender::Professor, "Ozvu se."),
        ];
        let digest = escalation_digest("Fotosyntéza", "student@example.com", &transcript);
        assert!(digest.starts_with("*Nová žádost o pomoc od studenta!*"));
        assert!(digest.contains("*Lekce:* Fotosyntéza"));
        assert!(digest.contains("*Student:* student@example.com"));
        assert!(digest.contains("Student: Nerozumím."));
        assert!(digest.contains("AI: Zkusím to vysvětlit."));
        assert!(digest.contains("Profesor: Ozvu se."));
    }

    #[test]
    fn test_analysis_prompt_embeds_all_sections() {
        let prompt = analysis_prompt("text", "student: ahoj", "Kvíz 1: Skóre 2/5");
        assert!(prompt.contains("text"));
        assert!(prompt.contains("student: ahoj"));
        assert!(prompt.contains("Kvíz 1: Skóre 2/5"));
    }
}
