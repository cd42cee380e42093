use crate::domain::ports::SessionStore;
use crate::domain::session::Session;
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    refresh_token: Option<String>,
}

/// A session store persisted as a small JSON document.
///
/// The file holds the `access_token` and `refresh_token` keys. Writes go to a
/// temporary file in the same directory which is then renamed over the
/// original, so a crash never leaves a half-written session behind. A missing
/// file reads as an empty session.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<SessionFile> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) if bytes.is_empty() => Ok(SessionFile::default()),
            Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
                ClientError::StoreError(format!(
                    "corrupt session file {}: {}",
                    self.path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(SessionFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, contents: SessionFile) -> Result<()> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&path, &contents))
            .await
            .map_err(|e| ClientError::StoreError(format!("session writer panicked: {}", e)))?
    }
}

fn write_atomically(path: &Path, contents: &SessionFile) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir)?;

    let bytes = serde_json::to_vec_pretty(contents)
        .map_err(|e| ClientError::StoreError(format!("Serialization error: {}", e)))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
    tmp.write_all(&bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| ClientError::IoError(e.error))?;
    Ok(())
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn access_token(&self) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.access_token)
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.refresh_token)
    }

    async fn set(&self, session: Session) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.save(SessionFile {
            access_token: Some(session.access_token),
            refresh_token: Some(session.refresh_token),
        })
        .await
    }

    async fn clear(&self) -> Result<()> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join("session.json"));
        assert!(store.access_token().await.unwrap().is_none());
        assert!(store.refresh_token().await.unwrap().is_none());
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_session_survives_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileSessionStore::new(&path)
            .set(Session::new("access-1", "refresh-1"))
            .await
            .unwrap();

        let reopened = FileSessionStore::new(&path);
        assert_eq!(reopened.access_token().await.unwrap().as_deref(), Some("access-1"));
        assert_eq!(reopened.refresh_token().await.unwrap().as_deref(), Some("refresh-1"));

        reopened.clear().await.unwrap();
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_store_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not json").unwrap();

        let store = FileSessionStore::new(&path);
        assert!(matches!(
            store.access_token().await,
            Err(ClientError::StoreError(_))
        ));
    }
}
