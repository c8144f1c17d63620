use crate::adapters::pdf::PdfTextReader;
use crate::core::normalize::parse_work_order;
use crate::core::prompt::build_prompt_with_hints;
use crate::core::{
    ConfigProvider, DocumentReader, LlmClient, Pipeline, RawExtraction, Storage, TransformResult,
};
use crate::utils::error::Result;
use std::path::Path;

pub struct WorkOrderPipeline<S: Storage, C: ConfigProvider, L: LlmClient> {
    storage: S,
    config: C,
    llm: L,
    reader: Box<dyn DocumentReader>,
}

impl<S: Storage, C: ConfigProvider, L: LlmClient> WorkOrderPipeline<S, C, L> {
    pub fn new(storage: S, config: C, llm: L) -> Self {
        Self {
            storage,
            config,
            llm,
            reader: Box::new(PdfTextReader),
        }
    }

    pub fn with_reader(mut self, reader: impl DocumentReader + 'static) -> Self {
        self.reader = Box::new(reader);
        self
    }

    /// 讀取輸入文件並組出 prompt（dry run 也會用到）
    pub async fn build_prompt(&self) -> Result<String> {
        let input = self.config.input_path();
        tracing::debug!("Reading input document: {}", input);
        let data = self.storage.read_file(input).await?;
        let text = self.reader.extract_text(&data)?;
        tracing::info!("📄 {} - {} chars of text", input, text.len());

        Ok(build_prompt_with_hints(&text, &self.config.extra_hints()))
    }

    fn output_file_path(&self) -> String {
        Path::new(self.config.output_path())
            .join(self.config.output_file())
            .to_string_lossy()
            .into_owned()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, L: LlmClient> Pipeline for WorkOrderPipeline<S, C, L> {
    async fn extract(&self) -> Result<RawExtraction> {
        let prompt = self.build_prompt().await?;

        tracing::info!("🚀 Sending prompt to Gemini ({} chars)", prompt.len());
        let response = self.llm.generate_json(&prompt).await?;

        Ok(RawExtraction {
            source_path: self.config.input_path().to_string(),
            model: response.model,
            raw_output: response.text,
        })
    }

    async fn transform(&self, raw: RawExtraction) -> Result<TransformResult> {
        let document = parse_work_order(&raw.raw_output)?;
        let json_output = serde_json::to_string_pretty(&document)?;

        Ok(TransformResult {
            document,
            json_output,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_path = self.output_file_path();

        tracing::debug!(
            "Writing {} bytes of JSON to {}",
            result.json_output.len(),
            output_path
        );
        self.storage
            .write_file(&output_path, result.json_output.as_bytes())
            .await?;

        Ok(output_path)
    }
}
