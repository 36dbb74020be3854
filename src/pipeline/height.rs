use serde_json::{Map, Value};

use crate::domain::{BuildingFeature, fields};
use crate::error::{Error, Result};

/// Read an elevation attribute as a finite float. Numeric strings count.
pub fn parse_elevation(properties: &Map<String, Value>, field: &str) -> Result<f64> {
    let parsed = match properties.get(field) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::Parse {
            field: field.to_string(),
        })
}

/// Round to `decimals` places on the exact decimal value of `value`, ties to
/// even. `1101.875 - 1045.25` is exactly 56.625 and rounds to 56.62.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{value:.decimals$}").parse().unwrap_or(value)
}

/// Rooftop elevation minus the highest ground elevation, to two decimals.
///
/// `None` whenever either input is missing or not numeric.
pub fn compute_height(building: &BuildingFeature) -> Option<f64> {
    let top = parse_elevation(&building.properties, fields::BUILDING_TOP_Z);
    let ground = parse_elevation(&building.properties, fields::GROUND_MAX_Z);

    match (top, ground) {
        (Ok(top), Ok(ground)) => Some(round_to(top - ground, 2)).filter(|h| h.is_finite()),
        (Err(e), _) | (_, Err(e)) => {
            tracing::debug!(id = ?building.id, "No height: {}", e);
            None
        }
    }
}

/// Fill in `height` on every building; returns how many stayed null.
pub fn apply_heights(buildings: &mut [BuildingFeature]) -> usize {
    let mut missing = 0;
    for building in buildings.iter_mut() {
        building.height = compute_height(building);
        if building.height.is_none() {
            missing += 1;
        }
    }
    missing
}
