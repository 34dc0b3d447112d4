//! 由床位數推導的兩種視覺編碼：熱力權重與標記半徑。

/// 床位數達到此值時熱力權重為 1.0
pub const FULL_WEIGHT_CAPACITY: f64 = 500.0;
pub const MIN_HEAT_WEIGHT: f64 = 0.1;
pub const MAX_HEAT_WEIGHT: f64 = 1.0;

/// 每 30 張床位對應 1 像素半徑
pub const BEDS_PER_PIXEL: f64 = 30.0;
pub const MIN_MARKER_RADIUS: f64 = 3.0;
pub const MAX_MARKER_RADIUS: f64 = 20.0;

/// 熱力權重：`clamp(capacity / 500, 0.1, 1.0)`，床位數非正時為 0.1
pub fn heat_weight(capacity: f64) -> f64 {
    if capacity > 0.0 {
        (capacity / FULL_WEIGHT_CAPACITY).clamp(MIN_HEAT_WEIGHT, MAX_HEAT_WEIGHT)
    } else {
        MIN_HEAT_WEIGHT
    }
}

/// 標記半徑：`clamp(capacity_or_1 / 30, 3, 20)`
pub fn marker_radius(capacity: f64) -> f64 {
    let beds = if capacity > 0.0 { capacity } else { 1.0 };
    (beds / BEDS_PER_PIXEL).clamp(MIN_MARKER_RADIUS, MAX_MARKER_RADIUS)
}
