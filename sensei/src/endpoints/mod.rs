use std::sync::Arc;

use lib::SharedState;
use poem_openapi::OpenApi;

use self::{
    authoring::Authoring, chat::Chat, interactions::Interactions, lessons::Lessons,
    source_files::SourceFiles,
};

mod authoring;
mod chat;
mod interactions;
mod lessons;
mod source_files;
pub mod webhook;

#[derive(poem_openapi::Tags)]
pub enum Tags {
    /// Endpoints for creating and editing lessons
    Lessons,
    /// Endpoints for lesson source files
    SourceFiles,
    /// Endpoints for generating study texts and derived artifacts
    Authoring,
    /// Endpoints for the student-facing lesson chat
    Chat,
    /// Endpoints for the professor's view of student interactions
    Interactions,
}

pub fn get_api(state: Arc<SharedState>) -> impl OpenApi {
    (
        Lessons {
            state: state.clone(),
        },
        SourceFiles {
            state: state.clone(),
        },
        Authoring {
            state: state.clone(),
        },
        Chat {
            state: state.clone(),
        },
        Interactions { state },
    )
}
