use crate::core::ConfigProvider;
use crate::domain::model::{ColumnMapping, HeatmapOptions, MapOptions, MarkerStyle, TileLayer};
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{
    self, validate_non_empty_string, validate_positive_number, validate_range, Validate,
    INPUT_EXTENSIONS,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub input: InputConfig,
    #[serde(default)]
    pub columns: ColumnMapping,
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub heatmap: HeatmapOptions,
    #[serde(default)]
    pub markers: MarkerStyle,
    #[serde(default)]
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub path: String,
    pub sheet: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub title: String,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: u8,
    /// 預設圖磚名稱，設定 `custom_tiles` 時忽略
    pub tiles: String,
    pub custom_tiles: Option<TileLayer>,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            title: MapOptions::DEFAULT_TITLE.to_string(),
            center_lat: MapOptions::SHANGHAI_CENTER.0,
            center_lon: MapOptions::SHANGHAI_CENTER.1,
            zoom: MapOptions::DEFAULT_ZOOM,
            tiles: "cartodb-positron".to_string(),
            custom_tiles: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: String,
    pub filename: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: ".".to_string(),
            filename: "index.html".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// `compact`（預設）或 `json`
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DATA_DIR})，未定義的變數保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 解析圖磚來源：自訂來源優先，否則使用預設名稱
    pub fn tile_layer(&self) -> Option<TileLayer> {
        match &self.map.custom_tiles {
            Some(custom) => Some(custom.clone()),
            None => TileLayer::from_preset(&self.map.tiles),
        }
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        // 驗證輸入與輸出路徑
        validation::validate_path("input.path", &self.input.path)?;
        validation::validate_file_extensions(
            "input.path",
            std::slice::from_ref(&self.input.path),
            INPUT_EXTENSIONS,
        )?;
        validation::validate_path("output.path", &self.output.path)?;
        validate_non_empty_string("output.filename", &self.output.filename)?;

        // 驗證欄位名稱
        let columns = [
            ("columns.longitude", &self.columns.longitude),
            ("columns.latitude", &self.columns.latitude),
            ("columns.capacity", &self.columns.capacity),
            ("columns.name", &self.columns.name),
            ("columns.address", &self.columns.address),
            ("columns.category", &self.columns.category),
            ("columns.phone", &self.columns.phone),
        ];
        for (field, value) in columns {
            validate_non_empty_string(field, value)?;
        }

        // 驗證地圖設定
        validate_range("map.center_lat", self.map.center_lat, -90.0, 90.0)?;
        validate_range("map.center_lon", self.map.center_lon, -180.0, 180.0)?;
        validate_range("map.zoom", self.map.zoom, 0, 20)?;
        match &self.map.custom_tiles {
            Some(custom) => {
                validate_non_empty_string("map.custom_tiles.name", &custom.name)?;
                validation::validate_tile_url("map.custom_tiles.url", &custom.url)?;
            }
            None => {
                if TileLayer::from_preset(&self.map.tiles).is_none() {
                    return Err(EtlError::InvalidConfigValueError {
                        field: "map.tiles".to_string(),
                        value: self.map.tiles.clone(),
                        reason: format!(
                            "Unknown tile preset. Available: {}",
                            TileLayer::PRESETS.join(", ")
                        ),
                    });
                }
            }
        }

        // 驗證熱力圖設定
        validate_positive_number("heatmap.radius", self.heatmap.radius as usize, 1)?;
        validate_range("heatmap.min_opacity", self.heatmap.min_opacity, 0.0, 1.0)?;
        validate_range("heatmap.max_value", self.heatmap.max_value, f64::MIN_POSITIVE, f64::MAX)?;
        if self.heatmap.gradient.is_empty() {
            return Err(EtlError::MissingConfigError {
                field: "heatmap.gradient".to_string(),
            });
        }
        for stop in &self.heatmap.gradient {
            validate_range("heatmap.gradient.stop", stop.stop, 0.0, 1.0)?;
            validate_non_empty_string("heatmap.gradient.color", &stop.color)?;
        }

        // 驗證標記設定
        validate_non_empty_string("markers.color", &self.markers.color)?;
        validate_range("markers.fill_opacity", self.markers.fill_opacity, 0.0, 1.0)?;
        validate_positive_number("markers.popup_width", self.markers.popup_width as usize, 1)?;
        validate_positive_number(
            "markers.popup_max_width",
            self.markers.popup_max_width as usize,
            1,
        )?;

        if let Some(format) = self.monitoring.as_ref().and_then(|m| m.log_format.as_deref()) {
            if !["compact", "json"].contains(&format) {
                return Err(EtlError::InvalidConfigValueError {
                    field: "monitoring.log_format".to_string(),
                    value: format.to_string(),
                    reason: "Supported formats: compact, json".to_string(),
                });
            }
        }

        Ok(())
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .is_some_and(|f| f == "json")
    }
}

impl ConfigProvider for TomlConfig {
    fn input_path(&self) -> &str {
        &self.input.path
    }

    fn sheet_name(&self) -> Option<&str> {
        self.input.sheet.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn output_file(&self) -> &str {
        &self.output.filename
    }

    fn columns(&self) -> &ColumnMapping {
        &self.columns
    }

    fn map_options(&self) -> MapOptions {
        MapOptions {
            title: self.map.title.clone(),
            center: (self.map.center_lat, self.map.center_lon),
            zoom: self.map.zoom,
            tiles: self.tile_layer().unwrap_or_default(),
            heatmap: self.heatmap.clone(),
            markers: self.markers.clone(),
        }
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = r#"
[pipeline]
name = "shanghai"
description = "上海市养老机构"
version = "1.0.0"

[input]
path = "上海市.xlsx"
"#;

    #[test]
    fn test_parse_minimal_config_uses_defaults() {
        let config = TomlConfig::from_toml_str(MINIMAL).unwrap();

        assert_eq!(config.pipeline.name, "shanghai");
        assert_eq!(config.input_path(), "上海市.xlsx");
        assert_eq!(config.output_file(), "index.html");
        assert_eq!(config.columns, ColumnMapping::default());
        assert_eq!(config.map_options(), MapOptions::default());
        assert!(!config.monitoring_enabled());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let toml_content = r##"
[pipeline]
name = "beijing"
description = "北京市养老机构"
version = "2.0"

[input]
path = "data/北京市.csv"
sheet = "机构"

[columns]
latitude = "lat"
longitude = "lng"

[map]
title = "北京养老机构"
center_lat = 39.9042
center_lon = 116.4074
zoom = 10

[map.custom_tiles]
name = "Gaode"
url = "https://webrd0{s}.is.autonavi.com/appmaptile?style=8&x={x}&y={y}&z={z}"
attribution = "&copy; AutoNavi"
subdomains = "1234"

[heatmap]
radius = 30
gradient = [{ stop = 0.2, color = "#00f" }, { stop = 1.0, color = "#f00" }]

[markers]
color = "#e74c3c"
fill_opacity = 0.5

[output]
path = "./maps"
filename = "beijing.html"

[monitoring]
enabled = true
log_format = "json"
"##;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert!(config.validate().is_ok());

        let options = config.map_options();
        assert_eq!(options.center, (39.9042, 116.4074));
        assert_eq!(options.tiles.name, "Gaode");
        assert_eq!(options.tiles.max_zoom, 18);
        assert_eq!(options.heatmap.radius, 30);
        assert_eq!(options.heatmap.blur, 15);
        assert_eq!(options.heatmap.gradient.len(), 2);
        assert_eq!(options.markers.color, "#e74c3c");
        assert_eq!(options.markers.popup_max_width, 350);
        assert_eq!(config.columns.latitude, "lat");
        assert_eq!(config.columns.capacity, "床位数");
        assert_eq!(config.sheet_name(), Some("机构"));
        assert!(config.monitoring_enabled());
        assert!(config.json_logs());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("HEATMAP_TEST_DATA_DIR", "/srv/data");

        let toml_content = r#"
[pipeline]
name = "test"
description = "test"
version = "1.0"

[input]
path = "${HEATMAP_TEST_DATA_DIR}/上海市.xlsx"

[output]
path = "${HEATMAP_TEST_UNSET_VAR}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.input.path, "/srv/data/上海市.xlsx");
        assert_eq!(config.output.path, "${HEATMAP_TEST_UNSET_VAR}");

        std::env::remove_var("HEATMAP_TEST_DATA_DIR");
    }

    #[test]
    fn test_config_validation() {
        let bad_extension = MINIMAL.replace("上海市.xlsx", "上海市.txt");
        let config = TomlConfig::from_toml_str(&bad_extension).unwrap();
        assert!(config.validate().is_err());

        let bad_zoom = format!("{}\n[map]\nzoom = 30\n", MINIMAL);
        let config = TomlConfig::from_toml_str(&bad_zoom).unwrap();
        assert!(config.validate().is_err());

        let bad_tiles = format!("{}\n[map]\ntiles = \"watercolor\"\n", MINIMAL);
        let config = TomlConfig::from_toml_str(&bad_tiles).unwrap();
        assert!(config.validate().is_err());

        let bad_gradient = format!(
            "{}\n[heatmap]\ngradient = [{{ stop = 1.5, color = \"red\" }}]\n",
            MINIMAL
        );
        let config = TomlConfig::from_toml_str(&bad_gradient).unwrap();
        assert!(config.validate().is_err());

        let bad_log_format = format!(
            "{}\n[monitoring]\nenabled = false\nlog_format = \"xml\"\n",
            MINIMAL
        );
        let config = TomlConfig::from_toml_str(&bad_log_format).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_input_section_is_parse_error() {
        let toml_content = r#"
[pipeline]
name = "test"
description = "test"
version = "1.0"
"#;
        let err = TomlConfig::from_toml_str(toml_content).unwrap_err();
        assert!(matches!(err, EtlError::ConfigValidationError { .. }));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.pipeline.name, "shanghai");
    }
}
