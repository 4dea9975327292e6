use std::sync::Arc;

use lib::{
    auth::{ProfessorAuth, VerifiedUserAuth},
    storage::StorageError,
    SharedState,
};
use poem::web::Data;
use poem_ext::{db::DbTxn, response};
use poem_openapi::{param::Path, payload::Binary, OpenApi};
use uuid::Uuid;

use super::{lessons::get_lesson, Tags};
use crate::{
    schemas::source_files::{FileAnalysis, FileContent, SourceFile},
    services::{
        authoring::{self, AuthoringError},
        extraction::{self, ExtractError},
    },
};

pub struct SourceFiles {
    pub state: Arc<SharedState>,
}

#[OpenApi(tag = "Tags::SourceFiles")]
impl SourceFiles {
    /// List the source files of a lesson.
    #[oai(path = "/lessons/:lesson_id/files", method = "get")]
    async fn list_files(
        &self,
        lesson_id: Path<Uuid>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> ListFiles::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return ListFiles::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return ListFiles::forbidden();
        }
        ListFiles::ok(
            self.state
                .storage
                .list_lesson_files(lesson_id.0)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
        )
    }

    /// Upload a source file.
    ///
    /// Re-uploading an existing name overwrites the previous file. Files
    /// with unsupported extensions are accepted but excluded from
    /// generation; the response flags them as `supported: false`.
    #[oai(path = "/lessons/:lesson_id/files/:file_name", method = "put")]
    async fn upload_file(
        &self,
        lesson_id: Path<Uuid>,
        file_name: Path<String>,
        data: Binary<Vec<u8>>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> UploadFile::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return UploadFile::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return UploadFile::forbidden();
        }

        match self
            .state
            .storage
            .put_lesson_file(lesson_id.0, &file_name.0, &data.0)
            .await
        {
            Ok(()) => UploadFile::ok(SourceFile {
                supported: extraction::is_supported(&file_name.0),
                size: data.0.len() as _,
                name: file_name.0,
            }),
            Err(StorageError::InvalidName(_)) => UploadFile::invalid_name(),
            Err(err) => Err(err)?,
        }
    }

    /// Delete a source file.
    #[oai(path = "/lessons/:lesson_id/files/:file_name", method = "delete")]
    async fn delete_file(
        &self,
        lesson_id: Path<Uuid>,
        file_name: Path<String>,
        db: Data<&DbTxn>,
        auth: ProfessorAuth,
    ) -> DeleteFile::Response<ProfessorAuth> {
        let Some(lesson) = get_lesson(&db, lesson_id.0).await? else {
            return DeleteFile::lesson_not_found();
        };
        if lesson.owner_id != auth.0.id {
            return DeleteFile::forbidden();
        }

        match self
            .state
            .storage
            .delete_lesson_file(lesson_id.0, &file_name.0)
            .await
        {
            Ok(()) => DeleteFile::ok(),
            Err(StorageError::NotFound(_) | StorageError::InvalidName(_)) => {
                DeleteFile::file_not_found()
            }
            Err(err) => Err(err)?,
        }
    }

    /// Extract the plain text of a source file.
    #[oai(path = "/lessons/:lesson_id/files/:file_name/content", method = "get")]
    async fn get_file_content(
        &self,
        lesson_id: Path<Uuid>,
        file_name: Path<String>,
        db: Data<&DbTxn>,
        _auth: VerifiedUserAuth,
    ) -> GetFileContent::Response<VerifiedUserAuth> {
        if get_lesson(&db, lesson_id.0).await?.is_none() {
            return GetFileContent::lesson_not_found();
        }
        let bytes = match self
            .state
            .storage
            .get_lesson_file(lesson_id.0, &file_name.0)
            .await
        {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_) | StorageError::InvalidName(_)) => {
                return GetFileContent::file_not_found()
            }
            Err(err) => Err(err)?,
        };
        match extraction::extract(&file_name.0, &bytes) {
            Ok(text) => GetFileContent::ok(FileContent { text }),
            Err(ExtractError::UnsupportedFormat(_)) => GetFileContent::unsupported_format(),
            Err(ExtractError::Empty) => GetFileContent::no_text(),
            Err(err) => Err(err)?,
        }
    }

    /// Analyze a source file.
    ///
    /// Extracts the file's text and asks the model for a structured summary
    /// of its key points.
    #[oai(path = "/lessons/:lesson_id/files/:file_name/analysis", method = "post")]
    async fn analyze_file(
        &self,
        lesson_id: Path<Uuid>,
        file_name: Path<String>,
        db: Data<&DbTxn>,
        _auth: VerifiedUserAuth,
    ) -> AnalyzeFile::Response<VerifiedUserAuth> {
        if get_lesson(&db, lesson_id.0).await?.is_none() {
            return AnalyzeFile::lesson_not_found();
        }
        match authoring::analyze_source_file(
            &self.state.services,
            &self.state.storage,
            lesson_id.0,
            &file_name.0,
        )
        .await
        {
            Ok(analysis) => AnalyzeFile::ok(FileAnalysis { analysis }),
            Err(AuthoringError::Storage(
                StorageError::NotFound(_) | StorageError::InvalidName(_),
            )) => AnalyzeFile::file_not_found(),
            Err(AuthoringError::Extraction(ExtractError::UnsupportedFormat(_))) => {
                AnalyzeFile::unsupported_format()
            }
            Err(AuthoringError::Extraction(ExtractError::Empty)) => AnalyzeFile::no_text(),
            Err(AuthoringError::Generation(_)) => AnalyzeFile::generation_failed(),
            Err(err) => Err(err)?,
        }
    }

    /// List the professor's global files.
    #[oai(path = "/files", method = "get")]
    async fn list_global_files(
        &self,
        auth: ProfessorAuth,
    ) -> ListGlobalFiles::Response<ProfessorAuth> {
        ListGlobalFiles::ok(
            self.state
                .storage
                .list_professor_files(&auth.0.id)
                .await?
                .into_iter()
                .map(Into::into)
                .collect(),
        )
    }

    /// Upload a global file.
    #[oai(path = "/files/:file_name", method = "put")]
    async fn upload_global_file(
        &self,
        file_name: Path<String>,
        data: Binary<Vec<u8>>,
        auth: ProfessorAuth,
    ) -> UploadGlobalFile::Response<ProfessorAuth> {
        match self
            .state
            .storage
            .put_professor_file(&auth.0.id, &file_name.0, &data.0)
            .await
        {
            Ok(()) => UploadGlobalFile::ok(SourceFile {
                supported: extraction::is_supported(&file_name.0),
                size: data.0.len() as _,
                name: file_name.0,
            }),
            Err(StorageError::InvalidName(_)) => UploadGlobalFile::invalid_name(),
            Err(err) => Err(err)?,
        }
    }

    /// Delete a global file.
    #[oai(path = "/files/:file_name", method = "delete")]
    async fn delete_global_file(
        &self,
        file_name: Path<String>,
        auth: ProfessorAuth,
    ) -> DeleteGlobalFile::Response<ProfessorAuth> {
        match self
            .state
            .storage
            .delete_professor_file(&auth.0.id, &file_name.0)
            .await
        {
            Ok(()) => DeleteGlobalFile::ok(),
            Err(StorageError::NotFound(_) | StorageError::InvalidName(_)) => {
                DeleteGlobalFile::file_not_found()
            }
            Err(err) => Err(err)?,
        }
    }

    /// Extract the plain text of a global file.
    #[oai(path = "/files/:file_name/content", method = "get")]
    async fn get_global_file_content(
        &self,
        file_name: Path<String>,
        auth: ProfessorAuth,
    ) -> GetGlobalFileContent::Response<ProfessorAuth> {
        let bytes = match self
            .state
            .storage
            .get_professor_file(&auth.0.id, &file_name.0)
            .await
        {
            Ok(bytes) => bytes,
            Err(StorageError::NotFound(_) | StorageError::InvalidName(_)) => {
                return GetGlobalFileContent::file_not_found()
            }
            Err(err) => Err(err)?,
        };
        match extraction::extract(&file_name.0, &bytes) {
            Ok(text) => GetGlobalFileContent::ok(FileContent { text }),
            Err(ExtractError::UnsupportedFormat(_)) => GetGlobalFileContent::unsupported_format(),
            Err(ExtractError::Empty) => GetGlobalFileContent::no_text(),
            Err(err) => Err(err)?,
        }
    }
}

response!(ListFiles = {
    Ok(200) => Vec<SourceFile>,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
});

response!(UploadFile = {
    Ok(201) => SourceFile,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
    /// The file name is not a valid single path component.
    InvalidName(400, error),
});

response!(DeleteFile = {
    Ok(200),
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// File does not exist.
    FileNotFound(404, error),
    /// The user does not own this lesson.
    Forbidden(403, error),
});

response!(GetFileContent = {
    Ok(200) => FileContent,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// File does not exist.
    FileNotFound(404, error),
    /// The file format is not supported for extraction.
    UnsupportedFormat(400, error),
    /// No text could be extracted from the file.
    NoText(404, error),
});

response!(AnalyzeFile = {
    Ok(200) => FileAnalysis,
    /// Lesson does not exist.
    LessonNotFound(404, error),
    /// File does not exist.
    FileNotFound(404, error),
    /// The file format is not supported for extraction.
    UnsupportedFormat(400, error),
    /// No text could be extracted from the file.
    NoText(404, error),
    /// The upstream model call failed.
    GenerationFailed(502, error),
});

response!(ListGlobalFiles = {
    Ok(200) => Vec<SourceFile>,
});

response!(UploadGlobalFile = {
    Ok(201) => SourceFile,
    /// The file name is not a valid single path component.
    InvalidName(400, error),
});

response!(DeleteGlobalFile = {
    Ok(200),
    /// File does not exist.
    FileNotFound(404, error),
});

response!(GetGlobalFileContent = {
    Ok(200) => FileContent,
    /// File does not exist.
    FileNotFound(404, error),
    /// The file format is not supported for extraction.
    UnsupportedFormat(400, error),
    /// No text could be extracted from the file.
    NoText(404, error),
});
