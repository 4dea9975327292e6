use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

/// Filesystem-backed blob store for uploaded source files.
///
/// Layout: lesson sources live under `sources/<lesson_id>/<file_name>`,
/// professor-global files under `global/<professor_id>/<file_name>`. A file's
/// identity is its name within the prefix; re-uploading the same name
/// overwrites the previous blob.
#[derive(Debug, Clone)]
pub struct BlobStorage {
    root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub name: String,
    pub size: u64,
}

impl BlobStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn put_lesson_file(
        &self,
        lesson_id: Uuid,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        self.put(self.lesson_prefix(lesson_id), name, bytes).await
    }

    pub async fn get_lesson_file(
        &self,
        lesson_id: Uuid,
        name: &str,
    ) -> Result<Vec<u8>, StorageError> {
        self.get(self.lesson_prefix(lesson_id), name).await
    }

    pub async fn list_lesson_files(&self, lesson_id: Uuid) -> Result<Vec<StoredFile>, StorageError> {
        self.list(self.lesson_prefix(lesson_id)).await
    }

    pub async fn delete_lesson_file(&self, lesson_id: Uuid, name: &str) -> Result<(), StorageError> {
        self.delete(self.lesson_prefix(lesson_id), name).await
    }

    /// Remove all source files of a lesson. Used when the lesson itself is
    /// deleted; missing prefixes are fine.
    pub async fn delete_lesson_files(&self, lesson_id: Uuid) -> Result<(), StorageError> {
        match fs::remove_dir_all(self.lesson_prefix(lesson_id)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn put_professor_file(
        &self,
        professor_id: &str,
        name: &str,
        bytes: &[u8],
    ) -> Result<(), StorageError> {
        self.put(self.professor_prefix(professor_id)?, name, bytes)
            .await
    }

    pub async fn get_professor_file(
        &self,
        professor_id: &str,
        name: &str,
    ) -> Result<Vec<u8>, StorageError> {
        self.get(self.professor_prefix(professor_id)?, name).await
    }

    pub async fn list_professor_files(
        &self,
        professor_id: &str,
    ) -> Result<Vec<StoredFile>, StorageError> {
        self.list(self.professor_prefix(professor_id)?).await
    }

    pub async fn delete_professor_file(
        &self,
        professor_id: &str,
        name: &str,
    ) -> Result<(), StorageError> {
        self.delete(self.professor_prefix(professor_id)?, name).await
    }

    fn lesson_prefix(&self, lesson_id: Uuid) -> PathBuf {
        self.root.join("sources").join(lesson_id.to_string())
    }

    fn professor_prefix(&self, professor_id: &str) -> Result<PathBuf, StorageError> {
        check_name(professor_id)?;
        Ok(self.root.join("global").join(professor_id))
    }

    async fn put(&self, prefix: PathBuf, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        check_name(name)?;
        fs::create_dir_all(&prefix).await?;
        fs::write(prefix.join(name), bytes).await?;
        Ok(())
    }

    async fn get(&self, prefix: PathBuf, name: &str) -> Result<Vec<u8>, StorageError> {
        check_name(name)?;
        match fs::read(prefix.join(name)).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.into()))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn list(&self, prefix: PathBuf) -> Result<Vec<StoredFile>, StorageError> {
        let mut entries = match fs::read_dir(&prefix).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut out = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            out.push(StoredFile {
                name,
                size: metadata.len(),
            });
        }
        out.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(out)
    }

    async fn delete(&self, prefix: PathBuf, name: &str) -> Result<(), StorageError> {
        check_name(name)?;
        match fs::remove_file(prefix.join(name)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.into()))
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// A blob name must be a single path component; anything else could escape
/// the storage prefix.
fn check_name(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
        && Path::new(name).components().count() == 1;
    match valid {
        true => Ok(()),
        false => Err(StorageError::InvalidName(name.into())),
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid file name: {0:?}")]
    InvalidName(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage() -> BlobStorage {
        BlobStorage::new(std::env::temp_dir().join(format!("sensei-storage-{}", Uuid::new_v4())))
    }

    #[tokio::test]
    async fn test_lesson_file_roundtrip() {
        let storage = test_storage();
        let lesson_id = Uuid::new_v4();

        storage
            .put_lesson_file(lesson_id, "notes.txt", b"hello")
            .await
            .unwrap();
        assert_eq!(
            storage.get_lesson_file(lesson_id, "notes.txt").await.unwrap(),
            b"hello"
        );

        // re-upload of the same name overwrites
        storage
            .put_lesson_file(lesson_id, "notes.txt", b"world")
            .await
            .unwrap();
        assert_eq!(
            storage.get_lesson_file(lesson_id, "notes.txt").await.unwrap(),
            b"world"
        );

        let files = storage.list_lesson_files(lesson_id).await.unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].name, "notes.txt");
        assert_eq!(files[0].size, 5);

        storage
            .delete_lesson_file(lesson_id, "notes.txt")
            .await
            .unwrap();
        assert!(storage.list_lesson_files(lesson_id).await.unwrap().is_empty());
        assert!(matches!(
            storage.get_lesson_file(lesson_id, "notes.txt").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_listing_unknown_prefix_is_empty() {
        let storage = test_storage();
        assert!(storage
            .list_lesson_files(Uuid::new_v4())
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_path_escapes_are_rejected() {
        let storage = test_storage();
        let lesson_id = Uuid::new_v4();
        for name in ["", ".", "..", "../pwned", "a/b", "a\\b", "a\0b"] {
            assert!(
                matches!(
                    storage.put_lesson_file(lesson_id, name, b"x").await,
                    Err(StorageError::InvalidName(_))
                ),
                "{name:?} should be rejected"
            );
        }
    }
}
