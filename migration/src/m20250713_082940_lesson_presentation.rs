use sea_orm_migration::prelude::*;

use crate::m20250605_091423_sensei_init::Lesson;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Lesson::Table)
                    .add_column(ColumnDef::new(Presentation::Presentation).json())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Lesson::Table)
                    .drop_column(Presentation::Presentation)
                    .to_owned(),
            )
            .await
    }
}

#[derive(Iden)]
enum Presentation {
    Presentation,
}
