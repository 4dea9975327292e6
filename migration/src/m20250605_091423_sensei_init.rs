use sea_orm_migration::{prelude::*, sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Lesson::Table)
                    .col(ColumnDef::new(Lesson::Id).uuid().primary_key())
                    .col(ColumnDef::new(Lesson::Title).text().not_null())
                    .col(ColumnDef::new(Lesson::Subtitle).text().not_null())
                    .col(ColumnDef::new(Lesson::OwnerId).text().not_null())
                    .col(ColumnDef::new(Lesson::StudentText).text().not_null())
                    .col(ColumnDef::new(Lesson::VideoUrl).text())
                    .col(ColumnDef::new(Lesson::ChatbotPersona).text())
                    .col(ColumnDef::new(Lesson::PreparedQuiz).json())
                    .col(ColumnDef::new(Lesson::FinalTest).json())
                    .col(
                        ColumnDef::new(Lesson::CreationTimestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(MessageSender::Type)
                    .values([
                        MessageSender::Student,
                        MessageSender::Ai,
                        MessageSender::Professor,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChatSession::Table)
                    .col(ColumnDef::new(ChatSession::LessonId).uuid().not_null())
                    .col(ColumnDef::new(ChatSession::StudentId).text().not_null())
                    .col(ColumnDef::new(ChatSession::StudentEmail).text())
                    .col(ColumnDef::new(ChatSession::StudentName).text())
                    .col(
                        ColumnDef::new(ChatSession::CreationTimestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(ChatSession::LessonId)
                            .col(ChatSession::StudentId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ChatSession::Table, ChatSession::LessonId)
                            .to(Lesson::Table, Lesson::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ChatMessage::Table)
                    .col(ColumnDef::new(ChatMessage::Id).uuid().primary_key())
                    .col(ColumnDef::new(ChatMessage::LessonId).uuid().not_null())
                    .col(ColumnDef::new(ChatMessage::StudentId).text().not_null())
                    .col(ColumnDef::new(ChatMessage::Text).text().not_null())
                    .col(
                        ColumnDef::new(ChatMessage::Sender)
                            .custom(MessageSender::Type)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ChatMessage::Timestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ChatMessage::Table, ChatMessage::LessonId)
                            .to(Lesson::Table, Lesson::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Student::Table)
                    .col(
                        ColumnDef::new(Student::TelegramId)
                            .big_integer()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Student::ChatId).big_integer().not_null())
                    .col(ColumnDef::new(Student::UserId).text().not_null())
                    .col(ColumnDef::new(Student::ActiveLesson).uuid().not_null())
                    .col(ColumnDef::new(Student::DisplayName).text().not_null())
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Student::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChatMessage::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(ChatSession::Table).to_owned())
            .await?;
        manager
            .drop_type(Type::drop().name(MessageSender::Type).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Lesson::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden, Clone, Copy)]
pub enum Lesson {
    #[iden = "sensei_lessons"]
    Table,
    Id,
    Title,
    Subtitle,
    OwnerId,
    StudentText,
    VideoUrl,
    ChatbotPersona,
    PreparedQuiz,
    FinalTest,
    CreationTimestamp,
}

#[derive(Iden, Clone, Copy)]
pub enum ChatSession {
    #[iden = "sensei_chat_sessions"]
    Table,
    LessonId,
    StudentId,
    StudentEmail,
    StudentName,
    CreationTimestamp,
}

#[derive(Iden, Clone, Copy)]
pub enum ChatMessage {
    #[iden = "sensei_chat_messages"]
    Table,
    Id,
    LessonId,
    StudentId,
    Text,
    Sender,
    Timestamp,
}

#[derive(Iden, Clone, Copy)]
pub enum Student {
    #[iden = "sensei_students"]
    Table,
    TelegramId,
    ChatId,
    UserId,
    ActiveLesson,
    DisplayName,
}

#[derive(Iden)]
enum MessageSender {
    #[iden = "sensei_message_sender"]
    Type,
    Student,
    Ai,
    Professor,
}
