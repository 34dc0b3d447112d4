use crate::core::cleaning::clean_records;
use crate::core::layers::{build_heat_points, build_markers};
use crate::core::reader::read_records;
use crate::core::render::render_document;
use crate::core::{ConfigProvider, Pipeline, Record, Storage, TransformResult};
use crate::utils::error::Result;
use std::path::Path;

pub struct HeatmapPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
}

impl<S: Storage, C: ConfigProvider> HeatmapPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        Self { storage, config }
    }

    /// 輸出文件的完整路徑
    pub fn output_location(&self) -> String {
        Path::new(self.config.output_path())
            .join(self.config.output_file())
            .to_string_lossy()
            .into_owned()
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for HeatmapPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<Record>> {
        let input_path = self.config.input_path();
        tracing::debug!("Reading input file: {}", input_path);

        let bytes = self.storage.read_file(input_path).await?;
        tracing::debug!("Read {} bytes from {}", bytes.len(), input_path);

        read_records(input_path, bytes, self.config.sheet_name())
    }

    async fn transform(&self, data: Vec<Record>) -> Result<TransformResult> {
        let options = self.config.map_options();
        let (facilities, dropped_records) = clean_records(&data, self.config.columns());

        let heat_points = build_heat_points(&facilities);
        let (markers, skipped_markers) = build_markers(&facilities, &options.markers);

        tracing::debug!(
            "Built {} heat points and {} markers ({} skipped)",
            heat_points.len(),
            markers.len(),
            skipped_markers
        );

        Ok(TransformResult {
            facilities,
            heat_points,
            markers,
            dropped_records,
            skipped_markers,
        })
    }

    async fn load(&self, result: TransformResult) -> Result<String> {
        let output_path = self.output_location();

        if result.heat_points.is_empty() {
            tracing::warn!("⚠️ No records with valid coordinates, writing base map only");
        }

        let html = render_document(&result, &self.config.map_options())?;

        tracing::debug!("Writing map document ({} bytes) to storage", html.len());
        self.storage.write_file(&output_path, html.as_bytes()).await?;

        tracing::debug!("Map document saved successfully");
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{ColumnMapping, MapOptions};
    use crate::utils::error::EtlError;
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn put_file(&self, path: &str, data: &[u8]) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                EtlError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    struct MockConfig {
        input_path: String,
        output_path: String,
        columns: ColumnMapping,
    }

    impl MockConfig {
        fn new(input_path: &str) -> Self {
            Self {
                input_path: input_path.to_string(),
                output_path: "test_output".to_string(),
                columns: ColumnMapping::default(),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn input_path(&self) -> &str {
            &self.input_path
        }

        fn sheet_name(&self) -> Option<&str> {
            None
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn output_file(&self) -> &str {
            "index.html"
        }

        fn columns(&self) -> &ColumnMapping {
            &self.columns
        }

        fn map_options(&self) -> MapOptions {
            MapOptions::default()
        }
    }

    const FACILITIES_CSV: &str = "机构名称,地址,机构性质,联系电话,床位数,GCJ02纬度,GCJ02经度\n\
        静安区养老院,静安区康定路1号,公办,021-62000000,250,31.23,121.45\n\
        无坐标护理院,黄浦区,民办,,80,,121.48\n\
        闵行敬老院,闵行区,民办,,不详,31.11,121.38\n\
        超大规模养老社区,浦东新区,民办,,inf,31.20,121.60\n";

    fn pipeline_with_csv() -> (HeatmapPipeline<MockStorage, MockConfig>, MockStorage) {
        let storage = MockStorage::new();
        let pipeline = HeatmapPipeline::new(storage.clone(), MockConfig::new("facilities.csv"));
        (pipeline, storage)
    }

    #[tokio::test]
    async fn test_extract_reads_csv_from_storage() {
        let (pipeline, storage) = pipeline_with_csv();
        storage.put_file("facilities.csv", FACILITIES_CSV.as_bytes()).await;

        let records = pipeline.extract().await.unwrap();
        assert_eq!(records.len(), 4);
        assert_eq!(
            records[0].data.get("机构名称").unwrap().as_str().unwrap(),
            "静安区养老院"
        );
    }

    #[tokio::test]
    async fn test_extract_missing_input_fails() {
        let (pipeline, _storage) = pipeline_with_csv();
        let result = pipeline.extract().await;
        assert!(matches!(result, Err(EtlError::IoError(_))));
    }

    #[tokio::test]
    async fn test_transform_filters_and_encodes() {
        let (pipeline, storage) = pipeline_with_csv();
        storage.put_file("facilities.csv", FACILITIES_CSV.as_bytes()).await;

        let records = pipeline.extract().await.unwrap();
        let result = pipeline.transform(records).await.unwrap();

        assert_eq!(result.dropped_records, 1);
        assert_eq!(result.facilities.len(), 3);

        let weights: Vec<f64> = result.heat_points.iter().map(|p| p.weight).collect();
        assert_eq!(weights, vec![0.5, 0.1, 1.0]);

        // 床位數為 inf 的記錄仍在熱力圖中，但標記建立失敗
        assert_eq!(result.skipped_markers, 1);
        assert_eq!(result.markers.len(), 2);
        assert!(result.markers[0].popup_html.contains("静安区康定路1号"));
        assert_eq!(result.markers[1].radius, 3.0);
        assert!(result.markers[1].popup_html.contains(">0<"));
    }

    #[tokio::test]
    async fn test_load_writes_document() {
        let (pipeline, storage) = pipeline_with_csv();
        storage.put_file("facilities.csv", FACILITIES_CSV.as_bytes()).await;

        let records = pipeline.extract().await.unwrap();
        let result = pipeline.transform(records).await.unwrap();
        let output_path = pipeline.load(result).await.unwrap();

        assert_eq!(output_path, pipeline.output_location());
        assert!(output_path.ends_with("index.html"));

        let html = String::from_utf8(storage.get_file(&output_path).await.unwrap()).unwrap();
        assert!(html.contains("L.heatLayer"));
        assert!(html.contains("闵行敬老院"));
        assert!(!html.contains("无坐标护理院"));
    }

    #[tokio::test]
    async fn test_load_empty_result_writes_base_map() {
        let (pipeline, storage) = pipeline_with_csv();

        let output_path = pipeline.load(TransformResult::default()).await.unwrap();
        let html = String::from_utf8(storage.get_file(&output_path).await.unwrap()).unwrap();

        assert!(html.contains("L.tileLayer"));
        assert!(!html.contains("L.heatLayer"));
    }
}
