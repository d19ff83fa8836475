//! Binary downloads.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tracing::debug;

use crate::error::Result;
use crate::response::Response;

/// File name used when neither the caller nor the server names the file.
pub const DEFAULT_FILE_NAME: &str = "download";

/// A downloaded file held in memory.
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl Download {
    /// Build from a response, preferring the caller's name, then the
    /// `Content-Disposition` file name, then [`DEFAULT_FILE_NAME`].
    pub(crate) fn from_response(response: Response, file_name: Option<&str>) -> Self {
        let file_name = file_name
            .map(str::to_string)
            .or_else(|| {
                response
                    .header("content-disposition")
                    .and_then(disposition_file_name)
            })
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());
        let content_type = response.content_type().map(str::to_string);

        Self {
            file_name,
            content_type,
            bytes: response.into_bytes(),
        }
    }

    /// Write the file into `dir`, creating it if needed, and return the path.
    ///
    /// Directory components in the file name are dropped.
    pub async fn save(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        tokio::fs::create_dir_all(dir).await?;

        let name = Path::new(&self.file_name)
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| DEFAULT_FILE_NAME.into());
        let path = dir.join(name);

        tokio::fs::write(&path, &self.bytes).await?;
        debug!(path = %path.display(), bytes = self.bytes.len(), "Download saved");
        Ok(path)
    }
}

fn disposition_file_name(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}
