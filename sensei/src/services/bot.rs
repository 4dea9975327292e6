use entity::{sea_orm_active_enums::SenseiMessageSender, sensei_lessons, sensei_students};
use lib::services::{ServiceError, Services};
use sea_orm::{
    ActiveModelTrait, DatabaseTransaction, DbErr, EntityTrait, Set, Unchanged,
};
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use super::chat;

/// An inbound update as posted by the Telegram Bot API. Everything beyond
/// plain text messages is ignored.
#[derive(Debug, Deserialize)]
pub struct TelegramUpdate {
    pub message: Option<TelegramMessage>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    pub from: TelegramUser,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
}

impl TelegramUser {
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last_name) => format!("{} {last_name}", self.first_name),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum BotCommand<'a> {
    /// `/start <lessonId>`; the argument may be missing.
    Start(Option<&'a str>),
    /// Any other text, delivered into the bound lesson's chat.
    Text(&'a str),
}

pub fn parse_command(text: &str) -> BotCommand<'_> {
    match text.strip_prefix("/start") {
        Some(rest) => BotCommand::Start(Some(rest.trim()).filter(|arg| !arg.is_empty())),
        None => BotCommand::Text(text),
    }
}

/// Process one webhook update. Replies go back through the bot; failures are
/// the caller's to log, the webhook answers 200 regardless.
pub async fn process_update(
    services: &Services,
    db: &DatabaseTransaction,
    update: TelegramUpdate,
) -> Result<(), BotError> {
    let Some(message) = update.message else {
        return Ok(());
    };
    let Some(text) = message.text.clone() else {
        return Ok(());
    };

    match parse_command(&text) {
        BotCommand::Start(lesson_id) => handle_start(services, db, &message, lesson_id).await,
        BotCommand::Text(text) => handle_text(services, db, &message, text).await,
    }
}

/// Bind the sender to a lesson. A new `/start` overwrites the previous
/// binding; an unknown lesson id leaves no link record behind.
async fn handle_start(
    services: &Services,
    db: &DatabaseTransaction,
    message: &TelegramMessage,
    lesson_id: Option<&str>,
) -> Result<(), BotError> {
    let chat_id = message.chat.id;
    let Some(lesson_id) = lesson_id else {
        services
            .telegram
            .send_message(chat_id, "Prosím, zadejte příkaz ve formátu /start <ID lekce>")
            .await?;
        return Ok(());
    };

    let lesson = match lesson_id.parse::<Uuid>() {
        Ok(lesson_id) => sensei_lessons::Entity::find_by_id(lesson_id).one(db).await?,
        Err(_) => None,
    };
    let Some(lesson) = lesson else {
        services
            .telegram
            .send_message(chat_id, "Lekce s tímto ID nebyla nalezena.")
            .await?;
        return Ok(());
    };

    link_student(db, message, lesson.id).await?;
    services
        .telegram
        .send_message(
            chat_id,
            &format!("Vítejte v lekci \"{}\"! Můžete začít chatovat.", lesson.title),
        )
        .await?;
    Ok(())
}

async fn link_student(
    db: &DatabaseTransaction,
    message: &TelegramMessage,
    lesson_id: Uuid,
) -> Result<sensei_students::Model, DbErr> {
    let values = sensei_students::ActiveModel {
        telegram_id: Set(message.from.id),
        chat_id: Set(message.chat.id),
        user_id: Set(format!("tg:{}", message.from.id)),
        active_lesson: Set(lesson_id),
        display_name: Set(message.from.display_name()),
    };
    if let Some(student) = sensei_students::Entity::find_by_id(message.from.id)
        .one(db)
        .await?
    {
        sensei_students::ActiveModel {
            telegram_id: Unchanged(student.telegram_id),
            ..values
        }
        .update(db)
        .await
    } else {
        values.insert(db).await
    }
}

/// Deliver a free-text message into the bound lesson's chat session. No
/// AI or professor reply is generated on this path; delivery to storage
/// only.
async fn handle_text(
    services: &Services,
    db: &DatabaseTransaction,
    message: &TelegramMessage,
    text: &str,
) -> Result<(), BotError> {
    let start_notice = "Nejprve prosím spusťte lekci příkazem /start <ID lekce>";
    let Some(student) = sensei_students::Entity::find_by_id(message.from.id)
        .one(db)
        .await?
    else {
        services
            .telegram
            .send_message(message.chat.id, start_notice)
            .await?;
        return Ok(());
    };
    let Some(lesson) = sensei_lessons::Entity::find_by_id(student.active_lesson)
        .one(db)
        .await?
    else {
        // bound lesson has been deleted in the meantime
        services
            .telegram
            .send_message(message.chat.id, start_notice)
            .await?;
        return Ok(());
    };

    chat::ensure_session(
        db,
        lesson.id,
        &student.user_id,
        None,
        Some(student.display_name.clone()),
    )
    .await?;
    chat::append_message(
        db,
        lesson.id,
        &student.user_id,
        SenseiMessageSender::Student,
        text.to_owned(),
    )
    .await?;
    Ok(())
}

#[derive(Debug, Error)]
pub enum BotError {
    #[error("database error: {0}")]
    Db(#[from] DbErr),
    #[error("messaging bridge error: {0}")]
    Bridge(#[from] ServiceError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/start abc"), BotCommand::Start(Some("abc")));
        assert_eq!(parse_command("/start   abc  "), BotCommand::Start(Some("abc")));
        assert_eq!(parse_command("/start"), BotCommand::Start(None));
        assert_eq!(parse_command("/start "), BotCommand::Start(None));
        assert_eq!(parse_command("ahoj"), BotCommand::Text("ahoj"));
    }

    #[test]
    fn test_display_name() {
        let user = TelegramUser {
            id: 1,
            first_name: "Jan".into(),
            last_name: Some("Novák".into()),
        };
        assert_eq!(user.display_name(), "Jan Novák");
        let user = TelegramUser {
            id: 1,
            first_name: "Jan".into(),
            last_name: None,
        };
        assert_eq!(user.display_name(), "Jan");
    }

    #[test]
    fn test_update_deserialization() {
        let update: TelegramUpdate = serde_json::from_str(
            r#"{
                "update_id": 10,
                "message": {
                    "message_id": 1,
                    "chat": {"id": 42, "type": "private"},
                    "from": {"id": 7, "is_bot": false, "first_name": "Jan"},
                    "text": "/start abc"
                }
            }"#,
        )
        .unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.chat.id, 42);
        assert_eq!(message.from.id, 7);
        assert_eq!(message.text.as_deref(), Some("/start abc"));

        // edited messages, stickers etc. carry no `message`/`text`
        let update: TelegramUpdate = serde_json::from_str(r#"{"update_id": 11}"#).unwrap();
        assert!(update.message.is_none());
    }
}
