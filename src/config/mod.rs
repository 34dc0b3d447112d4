pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::domain::model::{ColumnMapping, MapOptions, TileLayer};
#[cfg(feature = "cli")]
use crate::utils::error::{EtlError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{
    validate_file_extensions, validate_non_empty_string, validate_path, validate_range, Validate,
    INPUT_EXTENSIONS,
};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "eldercare-heatmap")]
#[command(about = "Render an eldercare facility heatmap from a spreadsheet")]
pub struct CliConfig {
    #[arg(long, default_value = "上海市.xlsx", help = "Input spreadsheet (.xlsx/.xls/.ods) or CSV file")]
    pub input: String,

    #[arg(long, help = "Worksheet name, defaults to the first sheet")]
    pub sheet: Option<String>,

    #[arg(long, default_value = ".")]
    pub output_path: String,

    #[arg(long, default_value = "index.html")]
    pub output_file: String,

    #[arg(long, default_value_t = MapOptions::SHANGHAI_CENTER.0, allow_negative_numbers = true)]
    pub center_lat: f64,

    #[arg(long, default_value_t = MapOptions::SHANGHAI_CENTER.1, allow_negative_numbers = true)]
    pub center_lon: f64,

    #[arg(long, default_value_t = MapOptions::DEFAULT_ZOOM)]
    pub zoom: u8,

    #[arg(long, default_value = "cartodb-positron", help = "Tile preset: cartodb-positron, openstreetmap")]
    pub tiles: String,

    #[arg(long, default_value = MapOptions::DEFAULT_TITLE)]
    pub title: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,

    #[arg(skip)]
    #[serde(default)]
    pub columns: ColumnMapping,
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_path(&self) -> &str {
        &self.input
    }

    fn sheet_name(&self) -> Option<&str> {
        self.sheet.as_deref()
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn output_file(&self) -> &str {
        &self.output_file
    }

    fn columns(&self) -> &ColumnMapping {
        &self.columns
    }

    fn map_options(&self) -> MapOptions {
        MapOptions {
            title: self.title.clone(),
            center: (self.center_lat, self.center_lon),
            zoom: self.zoom,
            tiles: TileLayer::from_preset(&self.tiles).unwrap_or_default(),
            ..MapOptions::default()
        }
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_path("input", &self.input)?;
        validate_file_extensions("input", std::slice::from_ref(&self.input), INPUT_EXTENSIONS)?;
        validate_path("output_path", &self.output_path)?;
        validate_non_empty_string("output_file", &self.output_file)?;
        validate_range("center_lat", self.center_lat, -90.0, 90.0)?;
        validate_range("center_lon", self.center_lon, -180.0, 180.0)?;
        validate_range("zoom", self.zoom, 0, 20)?;

        if TileLayer::from_preset(&self.tiles).is_none() {
            return Err(EtlError::InvalidConfigValueError {
                field: "tiles".to_string(),
                value: self.tiles.clone(),
                reason: format!("Unknown tile preset. Available: {}", TileLayer::PRESETS.join(", ")),
            });
        }

        Ok(())
    }
}
