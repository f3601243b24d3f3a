use crate::{db::FeatureRow, AppError};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};

/// Wraps result rows into a `FeatureCollection`, keeping row order. The
/// geometry travels separately from the attributes, so it can never show
/// up among a feature's properties.
pub fn assemble(rows: Vec<FeatureRow>) -> Result<FeatureCollection, AppError> {
    let features = rows
        .into_iter()
        .map(to_feature)
        .collect::<Result<Vec<Feature>, AppError>>()?;

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

fn to_feature(row: FeatureRow) -> Result<Feature, AppError> {
    let geometry = match row.geometry {
        Some(raw) => Some(serde_json::from_str::<Geometry>(&raw)?),
        None => None,
    };

    let properties: JsonObject = row
        .properties
        .into_iter()
        .map(|(column, value)| (column.name().to_string(), value))
        .collect();

    Ok(Feature {
        bbox: None,
        geometry,
        id: None,
        properties: Some(properties),
        foreign_members: None,
    })
}
