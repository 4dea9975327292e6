pub mod analysis;
pub mod authoring;
pub mod chat;
pub mod lessons;
pub mod questions;
pub mod source_files;
