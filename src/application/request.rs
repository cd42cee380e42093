use crate::domain::processing::{FileUpload, UploadProgress};
use crate::error::{ClientError, Result};
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
pub enum MultipartField {
    Text { name: String, value: String },
    File { name: String, file: FileUpload },
}

impl MultipartField {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        MultipartField::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(name: impl Into<String>, file: FileUpload) -> Self {
        MultipartField::File {
            name: name.into(),
            file,
        }
    }
}

/// Request payload. Kept as owned data so the request can be sent again
/// after a token refresh.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<MultipartField>),
}

/// One outbound call, captured so it can be resent once after a refresh.
#[derive(Clone)]
pub struct PendingRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: RequestBody,
    pub timeout: Option<Duration>,
    pub(crate) progress: Option<ProgressCallback>,
    pub(crate) cancel: Option<CancellationToken>,
    pub(crate) anonymous: bool,
    pub(crate) retried: bool,
}

impl fmt::Debug for PendingRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("query", &self.query)
            .field("body", &self.body)
            .field("timeout", &self.timeout)
            .field("anonymous", &self.anonymous)
            .field("retried", &self.retried)
            .finish_non_exhaustive()
    }
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
            timeout: None,
            progress: None,
            cancel: None,
            anonymous: false,
            retried: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)
            .map_err(|e| ClientError::ValidationError(format!("unserializable body: {}", e)))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, fields: Vec<MultipartField>) -> Self {
        self.body = RequestBody::Multipart(fields);
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Result<Self> {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ClientError::ValidationError(format!("invalid header name {name}: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| ClientError::ValidationError(format!("invalid header {name}: {e}")))?;
        self.headers.insert(header, value);
        Ok(self)
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Reports upload progress of multipart file fields after every chunk.
    pub fn on_upload_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        self.progress = Some(Arc::new(callback));
        self
    }

    /// Aborts the request, including a pending refresh and resend, once
    /// `token` is cancelled.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Sends without a bearer token. A 401 is then an ordinary failure
    /// (bad credentials) rather than an expired session.
    pub fn anonymous(mut self) -> Self {
        self.anonymous = true;
        self
    }

    pub fn is_retried(&self) -> bool {
        self.retried
    }

    pub(crate) fn build_form(&self, fields: &[MultipartField]) -> Form {
        let total: u64 = fields
            .iter()
            .map(|field| match field {
                MultipartField::File { file, .. } => file.bytes.len() as u64,
                MultipartField::Text { .. } => 0,
            })
            .sum();
        let loaded = Arc::new(AtomicU64::new(0));

        let mut form = Form::new();
        for field in fields {
            form = match field {
                MultipartField::Text { name, value } => form.text(name.clone(), value.clone()),
                MultipartField::File { name, file } => {
                    let part = match &self.progress {
                        Some(callback) => progress_part(file, total, loaded.clone(), callback.clone()),
                        None => Part::bytes(file.bytes.clone()),
                    };
                    form.part(name.clone(), part.file_name(file.file_name.clone()))
                }
            };
        }
        form
    }
}

fn progress_part(
    file: &FileUpload,
    total: u64,
    loaded: Arc<AtomicU64>,
    callback: ProgressCallback,
) -> Part {
    let chunks: Vec<Vec<u8>> = file
        .bytes
        .chunks(UPLOAD_CHUNK_SIZE)
        .map(<[u8]>::to_vec)
        .collect();
    let stream = futures_util::stream::iter(chunks).map(move |chunk| {
        let sent = loaded.fetch_add(chunk.len() as u64, Ordering::SeqCst) + chunk.len() as u64;
        callback(UploadProgress {
            loaded: sent,
            total,
        });
        Ok::<_, std::io::Error>(chunk)
    });
    Part::stream_with_length(Body::wrap_stream(stream), file.bytes.len() as u64)
}
