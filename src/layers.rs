pub mod vector_tile;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use vector_tile::{get_mvt, TileOutcome};

use axum_macros::debug_handler;

use crate::{structs::Tile, AppError, AppState};

#[derive(Debug, Default, Deserialize)]
pub struct LayerParams {
    /// Accepted for client compatibility; tiles always carry the single
    /// position point layer.
    pub layer: Option<String>,
}

#[debug_handler]
/**
Handles a GET request for a position point vector tile.

# Arguments

* `State(state)`: The state of the application, which holds the indexed store.
* `Path((z, x, y_ext))`: The zoom level, tile column and `{row}.{extension}` segment of the request URL.
* `Query(params)`: The optional `layer` query parameter.

# Returns

A `TileOutcome` that renders as `200` with the encoded tile, or `204` when the
zoom level carries no content or nothing intersects the tile. Malformed
coordinates or an extension other than `mvt` yield an `AppError`.

# Example

```text
GET /tiles/10/0/0.mvt          -> 204 No Content
GET /tiles/16/34140/23040.mvt  -> 200 application/vnd.mapbox-vector-tile
GET /tiles/16/0/0.png          -> 400 Bad Request
```
*/
pub async fn get_layer(
    State(state): State<AppState>,
    Path((z, x, y_ext)): Path<(u32, u32, String)>,
    Query(params): Query<LayerParams>,
) -> Result<TileOutcome, AppError> {
    let (y, ext) = parse_y_ext(&y_ext)?;

    match ext {
        "mvt" => get_mvt(Tile::new(x, y, z), params.layer.as_deref(), state.store.as_ref()).await,
        _ => Err(AppError::OutOfRange(format!(
            "Specified file extension `{}` not supported",
            ext
        ))),
    }
}

fn parse_y_ext(y_ext: &str) -> Result<(u32, &str), AppError> {
    match y_ext.split('.').collect::<Vec<&str>>().as_slice() {
        [y_str, ext] => match y_str.parse::<u32>() {
            Ok(y) => Ok((y, *ext)),
            Err(_) => Err(AppError::OutOfRange(format!(
                "Failed to parse tile row `{}`",
                y_str
            ))),
        },
        _ => Err(AppError::OutOfRange(format!(
            "Invalid y_ext format: {}",
            y_ext
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_y_ext() {
        assert_eq!((23_040, "mvt"), parse_y_ext("23040.mvt").unwrap());
        assert_eq!((0, "pbf"), parse_y_ext("0.pbf").unwrap());
    }

    #[rstest]
    #[case("23040")]
    #[case("23040.mvt.gz")]
    #[case("-1.mvt")]
    #[case("abc.mvt")]
    #[case(".mvt")]
    fn test_parse_y_ext_rejects(#[case] raw: &str) {
        assert!(matches!(parse_y_ext(raw), Err(AppError::OutOfRange(_))));
    }
}
