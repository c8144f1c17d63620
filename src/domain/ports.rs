use crate::domain::model::{RawExtraction, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn output_file(&self) -> &str;
    fn api_base(&self) -> &str;
    fn api_key(&self) -> Option<&str>;
    fn model(&self) -> &str;
    fn fallback_model(&self) -> Option<&str>;
    fn request_timeout(&self) -> Duration;

    /// 額外的欄位提示 (path, hint)，附加在內建提示之後
    fn extra_hints(&self) -> Vec<(String, String)> {
        Vec::new()
    }
}

/// Turns raw document bytes into plain text.
pub trait DocumentReader: Send + Sync {
    fn extract_text(&self, data: &[u8]) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct LlmResponse {
    pub model: String,
    pub text: String,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Sends one prompt and asks for a JSON-typed response body.
    async fn generate_json(&self, prompt: &str) -> Result<LlmResponse>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<RawExtraction>;
    async fn transform(&self, raw: RawExtraction) -> Result<TransformResult>;
    async fn load(&self, result: TransformResult) -> Result<String>;
}
