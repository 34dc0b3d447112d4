use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 輸入表格中的一列原始資料，欄位名稱對應儲存格值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Record {
    pub data: HashMap<String, serde_json::Value>,
}

/// 清理後的養老機構資料
#[derive(Debug, Clone, PartialEq)]
pub struct Facility {
    pub name: Option<String>,
    pub address: Option<String>,
    pub category: Option<String>,
    pub phone: Option<String>,
    /// 床位數，缺失或非數值時為 0
    pub capacity: f64,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub weight: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircleMarker {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lon")]
    pub longitude: f64,
    pub radius: f64,
    #[serde(rename = "popup")]
    pub popup_html: String,
}

#[derive(Debug, Clone, Default)]
pub struct TransformResult {
    pub facilities: Vec<Facility>,
    pub heat_points: Vec<HeatPoint>,
    pub markers: Vec<CircleMarker>,
    /// 因缺少經緯度而被排除的記錄數
    pub dropped_records: usize,
    /// 建立失敗而略過的標記數
    pub skipped_markers: usize,
}

/// 各欄位在輸入表格中的標題名稱
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMapping {
    pub longitude: String,
    pub latitude: String,
    pub capacity: String,
    pub name: String,
    pub address: String,
    pub category: String,
    pub phone: String,
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self {
            longitude: "GCJ02经度".to_string(),
            latitude: "GCJ02纬度".to_string(),
            capacity: "床位数".to_string(),
            name: "机构名称".to_string(),
            address: "地址".to_string(),
            category: "机构性质".to_string(),
            phone: "联系电话".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileLayer {
    pub name: String,
    pub url: String,
    pub attribution: String,
    #[serde(default = "TileLayer::default_max_zoom")]
    pub max_zoom: u8,
    #[serde(default)]
    pub subdomains: Option<String>,
}

impl TileLayer {
    pub const PRESETS: &'static [&'static str] = &["cartodb-positron", "openstreetmap"];

    fn default_max_zoom() -> u8 {
        18
    }

    pub fn cartodb_positron() -> Self {
        Self {
            name: "CartoDB positron".to_string(),
            url: "https://{s}.basemaps.cartocdn.com/light_all/{z}/{x}/{y}{r}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors &copy; <a href=\"https://carto.com/attributions\">CARTO</a>".to_string(),
            max_zoom: 20,
            subdomains: Some("abcd".to_string()),
        }
    }

    pub fn openstreetmap() -> Self {
        Self {
            name: "OpenStreetMap".to_string(),
            url: "https://tile.openstreetmap.org/{z}/{x}/{y}.png".to_string(),
            attribution: "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors".to_string(),
            max_zoom: 19,
            subdomains: None,
        }
    }

    /// 依預設名稱取得圖磚來源，名稱不分大小寫
    pub fn from_preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().replace([' ', '_'], "-").as_str() {
            "cartodb-positron" | "cartodbpositron" => Some(Self::cartodb_positron()),
            "openstreetmap" | "osm" => Some(Self::openstreetmap()),
            _ => None,
        }
    }
}

impl Default for TileLayer {
    fn default() -> Self {
        Self::cartodb_positron()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientStop {
    pub stop: f64,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapOptions {
    pub layer_name: String,
    pub radius: u32,
    pub blur: u32,
    pub min_opacity: f64,
    pub max_value: f64,
    pub gradient: Vec<GradientStop>,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        Self {
            layer_name: "HeatMap".to_string(),
            radius: 25,
            blur: 15,
            min_opacity: 0.5,
            max_value: 1.0,
            gradient: vec![
                GradientStop { stop: 0.1, color: "blue".to_string() },
                GradientStop { stop: 0.5, color: "lime".to_string() },
                GradientStop { stop: 0.9, color: "red".to_string() },
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyle {
    pub layer_name: String,
    pub color: String,
    pub fill: bool,
    pub fill_opacity: f64,
    pub weight: u32,
    pub popup_width: u32,
    pub popup_max_width: u32,
}

impl Default for MarkerStyle {
    fn default() -> Self {
        Self {
            layer_name: "养老机构".to_string(),
            color: "#3186cc".to_string(),
            fill: true,
            fill_opacity: 0.7,
            weight: 1,
            popup_width: 300,
            popup_max_width: 350,
        }
    }
}

/// 地圖文件的呈現設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapOptions {
    pub title: String,
    pub center: (f64, f64),
    pub zoom: u8,
    pub tiles: TileLayer,
    pub heatmap: HeatmapOptions,
    pub markers: MarkerStyle,
}

impl MapOptions {
    pub const DEFAULT_TITLE: &'static str = "养老机构地区热力图";
    pub const SHANGHAI_CENTER: (f64, f64) = (31.2304, 121.4737);
    pub const DEFAULT_ZOOM: u8 = 11;
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            title: Self::DEFAULT_TITLE.to_string(),
            center: Self::SHANGHAI_CENTER,
            zoom: Self::DEFAULT_ZOOM,
            tiles: TileLayer::default(),
            heatmap: HeatmapOptions::default(),
            markers: MarkerStyle::default(),
        }
    }
}
