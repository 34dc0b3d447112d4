use crate::domain::model::{ColumnMapping, Facility, Record};
use serde_json::Value;

/// 將儲存格值轉為數值，無法轉換時回傳 None
pub fn coerce_number(value: Option<&Value>) -> Option<f64> {
    let number = match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;
    (!number.is_nan()).then_some(number)
}

/// 將儲存格值轉為文字，空白視為缺失
pub fn coerce_text(value: Option<&Value>) -> Option<String> {
    let text = match value? {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => i.to_string(),
            // 以數值儲存的電話號碼不應帶小數點
            (None, Some(f)) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", f as i64),
            _ => n.to_string(),
        },
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

fn coerce_coordinate(value: Option<&Value>) -> Option<f64> {
    coerce_number(value).filter(|v| v.is_finite())
}

/// 缺少經緯度的記錄回傳 None；床位數缺失時為 0
pub fn facility_from_record(record: &Record, columns: &ColumnMapping) -> Option<Facility> {
    let latitude = coerce_coordinate(record.data.get(&columns.latitude))?;
    let longitude = coerce_coordinate(record.data.get(&columns.longitude))?;

    Some(Facility {
        name: coerce_text(record.data.get(&columns.name)),
        address: coerce_text(record.data.get(&columns.address)),
        category: coerce_text(record.data.get(&columns.category)),
        phone: coerce_text(record.data.get(&columns.phone)),
        capacity: coerce_number(record.data.get(&columns.capacity)).unwrap_or(0.0),
        latitude,
        longitude,
    })
}

/// 清理所有記錄，回傳保留的機構與被排除的記錄數
pub fn clean_records(records: &[Record], columns: &ColumnMapping) -> (Vec<Facility>, usize) {
    if !records.is_empty() {
        for column in [&columns.latitude, &columns.longitude] {
            if !records.iter().any(|r| r.data.contains_key(column)) {
                tracing::warn!(
                    "⚠️ Coordinate column '{}' not found in input, every record will be dropped",
                    column
                );
            }
        }
        if !records.iter().any(|r| r.data.contains_key(&columns.capacity)) {
            tracing::warn!(
                "⚠️ Capacity column '{}' not found in input, capacities default to 0",
                columns.capacity
            );
        }
    }

    let facilities: Vec<Facility> = records
        .iter()
        .filter_map(|record| facility_from_record(record, columns))
        .collect();
    let dropped = records.len() - facilities.len();

    if dropped > 0 {
        tracing::info!("Dropped {} records without usable coordinates", dropped);
    }

    (facilities, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Record {
        serde_json::from_value(json!({ "data": value })).unwrap()
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(coerce_number(Some(&json!(120))), Some(120.0));
        assert_eq!(coerce_number(Some(&json!(" 31.5 "))), Some(31.5));
        assert_eq!(coerce_number(Some(&json!("約100張"))), None);
        assert_eq!(coerce_number(Some(&json!(""))), None);
        assert_eq!(coerce_number(Some(&json!("NaN"))), None);
        assert_eq!(coerce_number(Some(&json!(true))), Some(1.0));
        assert_eq!(coerce_number(Some(&Value::Null)), None);
        assert_eq!(coerce_number(None), None);
    }

    #[test]
    fn test_coerce_text() {
        assert_eq!(coerce_text(Some(&json!("  公办  "))), Some("公办".to_string()));
        assert_eq!(coerce_text(Some(&json!("   "))), None);
        assert_eq!(coerce_text(Some(&json!(2154321234_i64))), Some("2154321234".to_string()));
        assert_eq!(coerce_text(Some(&json!(2154321234.0))), Some("2154321234".to_string()));
        assert_eq!(coerce_text(Some(&json!(12.5))), Some("12.5".to_string()));
        assert_eq!(coerce_text(Some(&Value::Null)), None);
    }

    #[test]
    fn test_facility_from_record_defaults_capacity() {
        let columns = ColumnMapping::default();
        let facility = facility_from_record(
            &record(json!({
                "机构名称": "虹口区第一福利院",
                "GCJ02纬度": "31.26",
                "GCJ02经度": 121.5,
                "床位数": "unknown",
            })),
            &columns,
        )
        .unwrap();

        assert_eq!(facility.name.as_deref(), Some("虹口区第一福利院"));
        assert_eq!(facility.capacity, 0.0);
        assert_eq!(facility.latitude, 31.26);
        assert_eq!(facility.longitude, 121.5);
        assert!(facility.address.is_none());
    }

    #[test]
    fn test_records_without_coordinates_are_dropped() {
        let columns = ColumnMapping::default();
        let records = vec![
            record(json!({"GCJ02纬度": 31.2, "GCJ02经度": 121.4, "床位数": 50})),
            record(json!({"GCJ02纬度": null, "GCJ02经度": 121.4})),
            record(json!({"GCJ02纬度": 31.2, "GCJ02经度": "东经121度"})),
            record(json!({"GCJ02经度": 121.4})),
            record(json!({"GCJ02纬度": "inf", "GCJ02经度": 121.4})),
        ];

        let (facilities, dropped) = clean_records(&records, &columns);
        assert_eq!(facilities.len(), 1);
        assert_eq!(dropped, 4);
        assert_eq!(facilities[0].capacity, 50.0);
    }

    #[test]
    fn test_custom_column_mapping() {
        let columns = ColumnMapping {
            latitude: "lat".to_string(),
            longitude: "lng".to_string(),
            capacity: "beds".to_string(),
            ..ColumnMapping::default()
        };
        let records = vec![record(json!({"lat": 31.0, "lng": 121.0, "beds": 250}))];

        let (facilities, dropped) = clean_records(&records, &columns);
        assert_eq!(dropped, 0);
        assert_eq!(facilities[0].capacity, 250.0);
    }

    #[test]
    fn test_missing_capacity_column_defaults_to_zero() {
        let columns = ColumnMapping::default();
        let records = vec![
            record(json!({"机构名称": "虹口区养老院", "GCJ02纬度": 31.26, "GCJ02经度": 121.5})),
            record(json!({"机构名称": "杨浦区养老院", "GCJ02纬度": 31.27, "GCJ02经度": 121.52})),
        ];

        let (facilities, dropped) = clean_records(&records, &columns);
        assert_eq!(dropped, 0);
        assert_eq!(facilities.len(), 2);
        assert!(facilities.iter().all(|f| f.capacity == 0.0));
    }
}
