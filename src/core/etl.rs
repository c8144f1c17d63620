use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::PhaseMonitor;

#[derive(Debug, Clone)]
pub struct EtlOutput {
    pub output_path: String,
    pub json_output: String,
}

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: PhaseMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: PhaseMonitor::new(monitor_enabled),
        }
    }

    /// 執行 extract → transform → load，回傳輸出檔路徑與 JSON 內容
    pub async fn run(&self) -> Result<EtlOutput> {
        tracing::info!("🚀 Starting work-order extraction");
        self.monitor.log_phase("Start");

        let raw = self.pipeline.extract().await?;
        tracing::info!(
            "📥 Extracted {} chars of model output from {} via {}",
            raw.raw_output.len(),
            raw.source_path,
            raw.model
        );
        self.monitor.log_phase("Extract");

        let result = self.pipeline.transform(raw).await?;
        tracing::info!(
            "🔄 Validated {} extraction item(s) with {} line item(s)",
            result.document.extraction.len(),
            result.document.line_item_count()
        );
        self.monitor.log_phase("Transform");

        let json_output = result.json_output.clone();
        let output_path = self.pipeline.load(result).await?;
        tracing::info!("💾 Saved to {}", output_path);
        self.monitor.log_phase("Load");
        self.monitor.log_final();

        Ok(EtlOutput {
            output_path,
            json_output,
        })
    }
}
