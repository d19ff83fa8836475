use serde::de::IgnoredAny;
use tracing::instrument;

use portico_client::{MultipartForm, ProgressCallback, UploadFile};

use super::segment;
use crate::error::{Error, ErrorKind, Result};
use crate::types::UploadedFile;

/// Field name used for batch uploads.
const BATCH_FIELD_NAME: &str = "files";

impl super::InternalApi {
    /// Upload one file under the `file` field.
    #[instrument(skip(self, file, on_progress), fields(file_name = file.file_name(), bytes = file.len()))]
    pub async fn upload_file(
        &self,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
    ) -> Result<UploadedFile> {
        Ok(self
            .client
            .upload("/upload/file", file, None, on_progress)
            .await?)
    }

    /// Upload several files in one request, each under the `files` field.
    #[instrument(skip(self, files, on_progress), fields(count = files.len()))]
    pub async fn upload_files(
        &self,
        files: Vec<UploadFile>,
        on_progress: Option<ProgressCallback>,
    ) -> Result<Vec<UploadedFile>> {
        if files.is_empty() {
            return Err(Error::new(ErrorKind::InvalidInput(
                "no files to upload".to_string(),
            )));
        }

        let form = files
            .into_iter()
            .fold(MultipartForm::new(), |form, file| {
                form.file(BATCH_FIELD_NAME, file)
            });
        Ok(self
            .client
            .upload("/upload/files", form, None, on_progress)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_file(&self, file_id: &str) -> Result<()> {
        let path = format!("/upload/file/{}", segment("file id", file_id)?);
        let _: IgnoredAny = self.client.delete(&path, None).await?;
        Ok(())
    }
}
