//! Leaflet 地圖文件產生
//!
//! 產生單一 HTML 文件：底圖、熱力圖層（有資料時）、養老機構標記群組與圖層控制。
//! Leaflet 與 Leaflet.heat 由 CDN 載入，本程式不發出任何網路請求。

use crate::domain::model::{MapOptions, TransformResult};
use crate::utils::error::Result;
use serde::Serialize;
use serde_json::json;

const LEAFLET_CSS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.css";
const LEAFLET_JS: &str = "https://unpkg.com/leaflet@1.9.4/dist/leaflet.js";
const LEAFLET_HEAT_JS: &str = "https://unpkg.com/leaflet.heat@0.2.0/dist/leaflet-heat.js";

/// 嵌入 `<script>` 的 JSON，`</` 需轉義以免提前結束標籤
fn script_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?.replace("</", "<\\/"))
}

pub fn render_document(result: &TransformResult, options: &MapOptions) -> Result<String> {
    let has_heat = !result.heat_points.is_empty();
    let has_markers = !result.markers.is_empty();

    let mut script = String::new();
    script.push_str(&map_script(options)?);
    if has_heat {
        script.push_str(&heat_layer_script(result, options)?);
    }
    if has_markers {
        script.push_str(&marker_layer_script(result, options)?);
    }
    script.push_str(&format!(
        "const baseLayers = {{}};\nbaseLayers[{}] = baseLayer;\nL.control.layers(baseLayers, overlays).addTo(map);\n",
        script_json(&options.tiles.name)?
    ));

    let heat_plugin = if has_heat {
        format!("\n    <script src=\"{}\"></script>", LEAFLET_HEAT_JS)
    } else {
        String::new()
    };

    Ok(format!(
        r#"<!DOCTYPE html>
<!-- Generated by eldercare-heatmap at {generated_at}: {heat_count} heat points, {marker_count} markers -->
<html lang="zh-CN">
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1.0" />
    <title>{title}</title>
    <link rel="stylesheet" href="{leaflet_css}" />
    <script src="{leaflet_js}"></script>{heat_plugin}
    <style>
        html, body {{ width: 100%; height: 100%; margin: 0; padding: 0; }}
        #map {{ position: absolute; top: 0; bottom: 0; left: 0; right: 0; }}
    </style>
</head>
<body>
    <div id="map"></div>
    <script>
{script}    </script>
</body>
</html>
"#,
        generated_at = chrono::Utc::now().to_rfc3339(),
        heat_count = result.heat_points.len(),
        marker_count = result.markers.len(),
        title = html_escape::encode_text(&options.title),
        leaflet_css = LEAFLET_CSS,
        leaflet_js = LEAFLET_JS,
        heat_plugin = heat_plugin,
        script = script,
    ))
}

fn map_script(options: &MapOptions) -> Result<String> {
    let (lat, lon) = options.center;
    let map_options = json!({ "center": [lat, lon], "zoom": options.zoom });

    let tiles = &options.tiles;
    let mut tile_options = json!({
        "attribution": tiles.attribution,
        "maxZoom": tiles.max_zoom,
    });
    if let Some(subdomains) = &tiles.subdomains {
        tile_options["subdomains"] = json!(subdomains);
    }

    Ok(format!(
        "const map = L.map(\"map\", {});\nconst baseLayer = L.tileLayer({}, {}).addTo(map);\nconst overlays = {{}};\n",
        script_json(&map_options)?,
        script_json(&tiles.url)?,
        script_json(&tile_options)?,
    ))
}

fn heat_layer_script(result: &TransformResult, options: &MapOptions) -> Result<String> {
    let heat = &options.heatmap;
    let data: Vec<[f64; 3]> = result
        .heat_points
        .iter()
        .map(|p| [p.latitude, p.longitude, p.weight])
        .collect();

    let gradient: serde_json::Map<String, serde_json::Value> = heat
        .gradient
        .iter()
        .map(|g| (g.stop.to_string(), json!(g.color)))
        .collect();

    let heat_options = json!({
        "radius": heat.radius,
        "blur": heat.blur,
        "minOpacity": heat.min_opacity,
        "max": heat.max_value,
        "gradient": gradient,
    });

    Ok(format!(
        "const heatLayer = L.heatLayer({}, {}).addTo(map);\noverlays[{}] = heatLayer;\n",
        script_json(&data)?,
        script_json(&heat_options)?,
        script_json(&heat.layer_name)?,
    ))
}

fn marker_layer_script(result: &TransformResult, options: &MapOptions) -> Result<String> {
    let style = &options.markers;
    let marker_style = json!({
        "color": style.color,
        "fill": style.fill,
        "fillOpacity": style.fill_opacity,
        "weight": style.weight,
    });
    let popup_options = json!({ "maxWidth": style.popup_max_width });

    Ok(format!(
        r#"const facilities = {facilities};
const markerStyle = {marker_style};
const popupOptions = {popup_options};
const markerLayer = L.featureGroup();
facilities.forEach(function (f) {{
    L.circleMarker([f.lat, f.lon], Object.assign({{ radius: f.radius }}, markerStyle))
        .bindPopup(f.popup, popupOptions)
        .addTo(markerLayer);
}});
markerLayer.addTo(map);
overlays[{layer_name}] = markerLayer;
"#,
        facilities = script_json(&result.markers)?,
        marker_style = script_json(&marker_style)?,
        popup_options = script_json(&popup_options)?,
        layer_name = script_json(&style.layer_name)?,
    ))
}
