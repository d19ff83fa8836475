use serde::de::IgnoredAny;
use serde_json::{Map, Value};
use tracing::instrument;

use super::segment;
use crate::error::Result;
use crate::types::{DictItem, SendCodeRequest, VerifyCodeRequest, VerifyCodeType};

impl super::InternalApi {
    /// System-wide configuration as a JSON object.
    #[instrument(skip(self))]
    pub async fn system_config(&self) -> Result<Map<String, Value>> {
        Ok(self.client.get("/system/config", None, None).await?)
    }

    /// Entries of a named dictionary.
    #[instrument(skip(self))]
    pub async fn dict(&self, dict_type: &str) -> Result<Vec<DictItem>> {
        let path = format!("/system/dict/{}", segment("dictionary type", dict_type)?);
        Ok(self.client.get(&path, None, None).await?)
    }

    #[instrument(skip(self))]
    pub async fn send_verify_code(&self, email: &str, kind: VerifyCodeType) -> Result<()> {
        let body = SendCodeRequest { email, kind };
        let _: IgnoredAny = self
            .client
            .post("/common/send-code", Some(&body), None)
            .await?;
        Ok(())
    }

    /// Returns whether `code` is valid for `email`.
    #[instrument(skip(self, code))]
    pub async fn verify_code(&self, email: &str, code: &str, kind: VerifyCodeType) -> Result<bool> {
        let body = VerifyCodeRequest { email, code, kind };
        Ok(self
            .client
            .post("/common/verify-code", Some(&body), None)
            .await?)
    }
}
