use sea_orm_migration::prelude::*;

use crate::m20250605_091423_sensei_init::Lesson;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(QuizResult::Table)
                    .col(ColumnDef::new(QuizResult::Id).uuid().primary_key())
                    .col(ColumnDef::new(QuizResult::LessonId).uuid().not_null())
                    .col(ColumnDef::new(QuizResult::StudentId).text().not_null())
                    .col(ColumnDef::new(QuizResult::QuizData).json().not_null())
                    .col(ColumnDef::new(QuizResult::Answers).json().not_null())
                    .col(ColumnDef::new(QuizResult::Score).big_integer().not_null())
                    .col(
                        ColumnDef::new(QuizResult::SubmittedTimestamp)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(QuizResult::Table, QuizResult::LessonId)
                            .to(Lesson::Table, Lesson::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(QuizResult::Table).to_owned())
            .await
    }
}

#[derive(Iden, Clone, Copy)]
pub enum QuizResult {
    #[iden = "sensei_quiz_results"]
    Table,
    Id,
    LessonId,
    StudentId,
    QuizData,
    Answers,
    Score,
    SubmittedTimestamp,
}
