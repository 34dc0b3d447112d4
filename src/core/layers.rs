use crate::core::encoding::{heat_weight, marker_radius};
use crate::domain::model::{CircleMarker, Facility, HeatPoint, MarkerStyle};
use thiserror::Error;

const UNKNOWN_FACILITY: &str = "未知机构";
const UNKNOWN: &str = "未知";

#[derive(Error, Debug, PartialEq)]
pub enum MarkerError {
    #[error("capacity {0} cannot be shown as a bed count")]
    NonFiniteCapacity(f64),
}

pub fn build_heat_points(facilities: &[Facility]) -> Vec<HeatPoint> {
    facilities
        .iter()
        .map(|f| HeatPoint {
            latitude: f.latitude,
            longitude: f.longitude,
            weight: heat_weight(f.capacity),
        })
        .collect()
}

pub fn build_marker(facility: &Facility, style: &MarkerStyle) -> Result<CircleMarker, MarkerError> {
    Ok(CircleMarker {
        latitude: facility.latitude,
        longitude: facility.longitude,
        radius: marker_radius(facility.capacity),
        popup_html: render_popup(facility, style)?,
    })
}

/// 逐筆建立標記；失敗的記錄記錄警告後略過，回傳標記與略過數量
pub fn build_markers(facilities: &[Facility], style: &MarkerStyle) -> (Vec<CircleMarker>, usize) {
    let mut markers = Vec::with_capacity(facilities.len());
    let mut skipped = 0;

    for facility in facilities {
        match build_marker(facility, style) {
            Ok(marker) => markers.push(marker),
            Err(e) => {
                skipped += 1;
                tracing::warn!(
                    "⚠️ Unable to add marker for '{}': {}",
                    facility.name.as_deref().unwrap_or(UNKNOWN_FACILITY),
                    e
                );
            }
        }
    }

    (markers, skipped)
}

pub fn render_popup(facility: &Facility, style: &MarkerStyle) -> Result<String, MarkerError> {
    if !facility.capacity.is_finite() {
        return Err(MarkerError::NonFiniteCapacity(facility.capacity));
    }
    // 與表格顯示一致，床位數取整數部分
    let beds = facility.capacity.trunc() as i64;

    let text = |value: &Option<String>, fallback: &str| {
        html_escape::encode_text(value.as_deref().unwrap_or(fallback)).into_owned()
    };

    Ok(format!(
        r#"<div style="width: {width}px; font-family: Arial, sans-serif; font-size: 12px; line-height: 1.4;">
    <h3 style="margin: 0 0 8px 0; padding: 0; font-size: 14px; color: #2c3e50;">{name}</h3>
    <table style="width: 100%; border-collapse: collapse;">
        <tr>
            <td style="padding: 3px; border-bottom: 1px solid #eee; font-weight: bold; width: 25%;">地址</td>
            <td style="padding: 3px; border-bottom: 1px solid #eee;">{address}</td>
        </tr>
        <tr>
            <td style="padding: 3px; border-bottom: 1px solid #eee; font-weight: bold;">性质</td>
            <td style="padding: 3px; border-bottom: 1px solid #eee;">{category}</td>
        </tr>
        <tr>
            <td style="padding: 3px; border-bottom: 1px solid #eee; font-weight: bold;">床位数</td>
            <td style="padding: 3px; border-bottom: 1px solid #eee;">{beds}</td>
        </tr>
        <tr>
            <td style="padding: 3px; font-weight: bold;">联系电话</td>
            <td style="padding: 3px;">{phone}</td>
        </tr>
    </table>
</div>"#,
        width = style.popup_width,
        name = text(&facility.name, UNKNOWN_FACILITY),
        address = text(&facility.address, UNKNOWN),
        category = text(&facility.category, UNKNOWN),
        beds = beds,
        phone = text(&facility.phone, UNKNOWN),
    ))
}
