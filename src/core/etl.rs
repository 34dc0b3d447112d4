use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting heatmap pipeline...");
        self.monitor.log_stats("Start");

        // Extract
        tracing::info!("Extracting records...");
        let raw_data = self.pipeline.extract().await?;
        tracing::info!("Extracted {} records", raw_data.len());
        self.monitor.log_stats("Extract");

        // Transform
        tracing::info!("Transforming records...");
        let transformed = self.pipeline.transform(raw_data).await?;
        tracing::info!(
            "Kept {} facilities ({} dropped), {} markers ({} skipped)",
            transformed.facilities.len(),
            transformed.dropped_records,
            transformed.markers.len(),
            transformed.skipped_markers
        );
        self.monitor.log_stats("Transform");

        // Load
        tracing::info!("Rendering map document...");
        let output_path = self.pipeline.load(transformed).await?;
        tracing::info!("Map saved to: {}", output_path);
        self.monitor.log_stats("Load");

        self.monitor.log_final_stats();
        Ok(output_path)
    }
}
