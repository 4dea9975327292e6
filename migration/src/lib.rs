#![forbid(unsafe_code)]
#![warn(clippy::dbg_macro, clippy::use_debug)]

pub use sea_orm_migration::prelude::*;

pub struct Migrator;

mod m20250605_091423_sensei_init;
mod m20250627_114508_quiz_results;
mod m20250713_082940_lesson_presentation;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250605_091423_sensei_init::Migration),
            Box::new(m20250627_114508_quiz_results::Migration),
            Box::new(m20250713_082940_lesson_presentation::Migration),
        ]
    }
}
