use crate::domain::ports::SessionStore;
use crate::domain::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, Session};
use crate::error::{ClientError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, Options, WriteBatch};
use std::path::Path;
use std::sync::Arc;

/// Column Family holding the session tokens.
pub const CF_SESSION: &str = "session";

/// A persistent session store backed by RocksDB.
///
/// Tokens live under their fixed key names in the `session` column family.
/// Both tokens are written and removed in a single batch so readers never
/// observe half of a pair.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBSessionStore {
    db: Arc<DB>,
}

impl RocksDBSessionStore {
    /// Opens or creates a RocksDB instance at the specified path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_session = ColumnFamilyDescriptor::new(CF_SESSION, Options::default());
        let db = DB::open_cf_descriptors(&opts, path, vec![cf_session])?;

        Ok(Self { db: Arc::new(db) })
    }

    fn read(&self, key: &str) -> Result<Option<String>> {
        let cf = self
            .db
            .cf_handle(CF_SESSION)
            .ok_or_else(|| ClientError::StoreError("Session column family not found".into()))?;

        match self.db.get_cf(&cf, key.as_bytes())? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|e| ClientError::StoreError(format!("invalid token bytes: {}", e))),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SessionStore for RocksDBSessionStore {
    async fn access_token(&self) -> Result<Option<String>> {
        self.read(ACCESS_TOKEN_KEY)
    }

    async fn refresh_token(&self) -> Result<Option<String>> {
        self.read(REFRESH_TOKEN_KEY)
    }

    async fn set(&self, session: Session) -> Result<()> {
        let cf = self
            .db
            .cf_handle(CF_SESSION)
            .ok_or_else(|| ClientError::StoreError("Session column family not found".into()))?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf, ACCESS_TOKEN_KEY, session.access_token.as_bytes());
        batch.put_cf(&cf, REFRESH_TOKEN_KEY, session.refresh_token.as_bytes());
        self.db.write(batch)?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let cf = self
            .db
            .cf_handle(CF_SESSION)
            .ok_or_else(|| ClientError::StoreError("Session column family not found".into()))?;

        let mut batch = WriteBatch::default();
        batch.delete_cf(&cf, ACCESS_TOKEN_KEY);
        batch.delete_cf(&cf, REFRESH_TOKEN_KEY);
        self.db.write(batch)?;
        Ok(())
    }
}
