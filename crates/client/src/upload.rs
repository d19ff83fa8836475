//! Multipart upload payloads and progress reporting.

use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use reqwest::multipart::{Form, Part};

use crate::error::{Error, ErrorKind, Result};

/// Field name a single uploaded file is sent under.
pub const UPLOAD_FIELD_NAME: &str = "file";

/// Size of the chunks file bodies are streamed in.
const CHUNK_SIZE: usize = 64 * 1024;

/// A file held in memory, ready to be sent as a multipart part.
#[derive(Debug, Clone)]
pub struct UploadFile {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

impl UploadFile {
    /// Create a file part from its name and contents.
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, naming the part after the file.
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| UPLOAD_FIELD_NAME.to_string());
        Ok(Self::new(file_name, bytes))
    }

    /// Set the part's MIME type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    fn into_part(self, tracker: Option<&ProgressTracker>) -> Result<Part> {
        let len = self.bytes.len() as u64;
        let body = match tracker {
            Some(tracker) => tracker.body(self.bytes),
            None => reqwest::Body::from(self.bytes),
        };

        let part = Part::stream_with_length(body, len).file_name(self.file_name);
        match self.content_type {
            Some(content_type) => part.mime_str(&content_type).map_err(|e| {
                Error::with_source(
                    ErrorKind::Config(format!("invalid content type {content_type:?}")),
                    e,
                )
            }),
            None => Ok(part),
        }
    }
}

#[derive(Debug, Clone)]
enum FormPart {
    Text(String),
    File(UploadFile),
}

/// A multipart container that can be rebuilt for every attempt.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    parts: Vec<(String, FormPart)>,
}

impl MultipartForm {
    /// An empty form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text field.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push((name.into(), FormPart::Text(value.into())));
        self
    }

    /// Append a file field.
    pub fn file(mut self, name: impl Into<String>, file: UploadFile) -> Self {
        self.parts.push((name.into(), FormPart::File(file)));
        self
    }

    /// Field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.parts.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Total size of all file parts.
    pub fn total_file_bytes(&self) -> u64 {
        self.parts
            .iter()
            .map(|(_, part)| match part {
                FormPart::File(file) => file.len() as u64,
                FormPart::Text(_) => 0,
            })
            .sum()
    }

    pub(crate) fn into_reqwest(self, on_progress: Option<&ProgressCallback>) -> Result<Form> {
        let tracker = on_progress.map(|cb| ProgressTracker::new(self.total_file_bytes(), cb.clone()));

        let mut form = Form::new();
        for (name, part) in self.parts {
            form = match part {
                FormPart::Text(value) => form.text(name, value),
                FormPart::File(file) => form.part(name, file.into_part(tracker.as_ref())?),
            };
        }
        Ok(form)
    }
}

/// What to upload: a single file, or a form built by the caller.
#[derive(Debug, Clone)]
pub enum UploadSource {
    /// Sent under [`UPLOAD_FIELD_NAME`].
    File(UploadFile),
    /// Sent as-is.
    Form(MultipartForm),
}

impl UploadSource {
    /// The multipart container that will be transmitted.
    pub fn into_form(self) -> MultipartForm {
        match self {
            UploadSource::File(file) => MultipartForm::new().file(UPLOAD_FIELD_NAME, file),
            UploadSource::Form(form) => form,
        }
    }
}

impl From<UploadFile> for UploadSource {
    fn from(file: UploadFile) -> Self {
        UploadSource::File(file)
    }
}

impl From<MultipartForm> for UploadSource {
    fn from(form: MultipartForm) -> Self {
        UploadSource::Form(form)
    }
}

/// Bytes of file content handed to the transport so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Rounded percentage, 100 when there is nothing to send.
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        ((self.loaded as f64 * 100.0) / self.total as f64).round() as u32
    }
}

/// Advisory upload progress listener.
#[derive(Clone)]
pub struct ProgressCallback(Arc<dyn Fn(UploadProgress) + Send + Sync>);

impl ProgressCallback {
    pub fn new(f: impl Fn(UploadProgress) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    fn call(&self, progress: UploadProgress) {
        (self.0)(progress)
    }
}

impl fmt::Debug for ProgressCallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressCallback")
    }
}

/// Shared counter across every file part of one attempt.
#[derive(Debug, Clone)]
struct ProgressTracker {
    loaded: Arc<AtomicU64>,
    total: u64,
    callback: ProgressCallback,
}

impl ProgressTracker {
    fn new(total: u64, callback: ProgressCallback) -> Self {
        Self {
            loaded: Arc::new(AtomicU64::new(0)),
            total,
            callback,
        }
    }

    fn advance(&self, n: u64) {
        let loaded = self.loaded.fetch_add(n, Ordering::SeqCst) + n;
        self.callback.call(UploadProgress {
            loaded,
            total: self.total,
        });
    }

    /// Stream `bytes` in chunks, reporting each chunk as it is pulled.
    fn body(&self, bytes: Bytes) -> reqwest::Body {
        let tracker = self.clone();
        let len = bytes.len();
        let chunks = (0..len).step_by(CHUNK_SIZE).map(move |start| {
            let chunk = bytes.slice(start..std::cmp::min(start + CHUNK_SIZE, len));
            tracker.advance(chunk.len() as u64);
            Ok::<Bytes, std::io::Error>(chunk)
        });
        reqwest::Body::wrap_stream(futures::stream::iter(chunks))
    }
}
