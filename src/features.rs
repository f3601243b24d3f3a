pub mod query;
use axum::{
    extract::{Path, RawQuery, State},
    Json,
};
use axum_macros::debug_handler;
use geojson::FeatureCollection;
use query::FeatureQuery;
use tracing::debug;

use crate::{transformations::geojson::assemble, AppError, AppState};

/// Query string of a feature request. `properties` may repeat, so the raw
/// query is parsed here instead of through `serde_urlencoded`.
#[derive(Debug, Default, PartialEq)]
pub struct FeatureParams {
    pub bbox: Option<String>,
    pub limit: Option<i64>,
    pub properties: Vec<String>,
}

impl FeatureParams {
    pub fn from_query(raw: Option<&str>) -> Result<FeatureParams, AppError> {
        let mut params = FeatureParams::default();

        for pair in raw.unwrap_or_default().split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            let value = decode_component(value)?;

            match decode_component(key)?.as_str() {
                "bbox" if !value.is_empty() => params.bbox = Some(value),
                "limit" => {
                    let limit = value.parse::<i64>().map_err(|_| {
                        AppError::OutOfRange(format!("limit `{}` is not an integer", value))
                    })?;
                    params.limit = Some(limit);
                }
                "properties" if !value.is_empty() => params.properties.push(value),
                _ => {}
            }
        }

        Ok(params)
    }
}

fn decode_component(raw: &str) -> Result<String, AppError> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .map_err(|e| AppError::OutOfRange(format!("Malformed query string: {}", e)))
}

#[debug_handler]
/**
Handles a GET request for a GeoJSON extract of one railway table.

# Arguments

* `State(state)`: The state of the application, which holds the indexed store.
* `Path(table_name)`: One of `pp`, `edge` or `node`.
* `RawQuery(raw)`: `bbox=minx,miny,maxx,maxy` (longitude/latitude), `limit` (1..=10000, default 1000)
  and any number of `properties=<column>`.

# Returns

A `FeatureCollection` with geometries in longitude/latitude. An empty result
is still a `200` with no features. Unknown tables or columns, malformed boxes
and out-of-range limits are rejected before the store is queried.

# Example

```text
GET /features/node?bbox=7.43,46.94,7.46,46.96&limit=5
GET /features/pp?properties=token&properties=zoom
```
*/
pub async fn get_features(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    RawQuery(raw): RawQuery,
) -> Result<Json<FeatureCollection>, AppError> {
    let params = FeatureParams::from_query(raw.as_deref())?;
    let feature_query = FeatureQuery::new(
        &table_name,
        params.bbox.as_deref(),
        params.limit,
        &params.properties,
    )?;

    let rows = state.store.fetch_features(&feature_query).await?;
    debug!(
        table = feature_query.table().name(),
        limit = feature_query.limit(),
        rows = rows.len(),
        "fetched features"
    );

    Ok(Json(assemble(rows)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_query() {
        assert_eq!(FeatureParams::default(), FeatureParams::from_query(None).unwrap());
        assert_eq!(FeatureParams::default(), FeatureParams::from_query(Some("")).unwrap());
    }

    #[test]
    fn test_full_query() {
        let params = FeatureParams::from_query(Some(
            "bbox=7.43%2C46.94%2C7.46%2C46.96&limit=5&properties=token&properties=zoom",
        ))
        .unwrap();

        assert_eq!(
            FeatureParams {
                bbox: Some("7.43,46.94,7.46,46.96".to_string()),
                limit: Some(5),
                properties: vec!["token".to_string(), "zoom".to_string()],
            },
            params
        );
    }

    #[test]
    fn test_blank_values_ignored() {
        let params = FeatureParams::from_query(Some("bbox=&properties=&layer=x&flag")).unwrap();
        assert_eq!(FeatureParams::default(), params);
    }

    #[test]
    fn test_invalid_limit() {
        let result = FeatureParams::from_query(Some("limit=lots"));
        assert!(matches!(result, Err(AppError::OutOfRange(_))));
    }

    #[test]
    fn test_plus_decodes_to_space() {
        let params = FeatureParams::from_query(Some("bbox=1,+2,3,4")).unwrap();
        assert_eq!(Some("1, 2,3,4".to_string()), params.bbox);
    }
}
