use crate::{
    db::{IndexedStore, TableName},
    structs::Tile,
    transformations::{GEOMETRY_PRECISION, STORAGE_SRID},
    zoom::{resolve, ZoomDecision},
    AppError,
};
use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use geo_types::Rect;
use lazy_static::lazy_static;
use sqlx::{postgres::PgArguments, query::Query, Postgres};
use tracing::debug;

pub const EXTENT: i32 = 4096;
pub const BUFFER: i32 = 256;
pub const LAYER_NAME: &str = "features";
pub const MVT_CONTENT_TYPE: &str = "application/vnd.mapbox-vector-tile";

lazy_static! {
    /// Parameters: `$1..$4` envelope (minx, miny, maxx, maxy), `$5` snap
    /// grid size, `$6` highest zoom band to include.
    pub static ref TILE_SQL: String = make_tile_data_query(TableName::PositionPoint);
}

fn make_tile_data_query(table: TableName) -> String {
    let attr_columns = table
        .columns()
        .iter()
        .map(|c| format!("t.{}", c.name()))
        .collect::<Vec<String>>()
        .join(", ");

    format!(
        "with bounds as (
            select ST_MakeEnvelope($1, $2, $3, $4, {srid}) as geom
        ),
        mvtgeom as (
            select
                ST_AsMVTGeom(
                    ST_ReducePrecision(t.geometry, $5),
                    bounds.geom::box2d,
                    {extent},
                    {buffer},
                    true
                ) as geom,
                {attr_columns}
            from
                {table} t, bounds
            where
                ST_Intersects(t.geometry, bounds.geom)
                and t.zoom <= $6
        )
        select
            ST_AsMVT(mvtgeom.*, '{layer}', {extent}, 'geom')
        from
            mvtgeom",
        srid = STORAGE_SRID,
        extent = EXTENT,
        buffer = BUFFER,
        attr_columns = attr_columns,
        table = table.name(),
        layer = LAYER_NAME,
    )
}

/// A validated request for one position point tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileQuery {
    tile: Tile,
    envelope: Rect<f64>,
    max_band: i32,
}

impl TileQuery {
    /// Returns `None` when the zoom level never carries content. That check
    /// comes before coordinate validation, so low zooms short-circuit for any
    /// x and y.
    pub fn build(tile: Tile, layer: Option<&str>) -> Result<Option<TileQuery>, AppError> {
        let max_band = match resolve(tile.z) {
            ZoomDecision::NoContent => {
                debug!(z = tile.z, x = tile.x, y = tile.y, "zoom below content range");
                return Ok(None);
            }
            ZoomDecision::Bands(band) => band,
        };

        tile.validate()?;

        if let Some(layer) = layer {
            debug!(layer, "layer parameter ignored, tiles carry a single layer");
        }

        Ok(Some(TileQuery {
            tile,
            envelope: tile.envelope(),
            max_band,
        }))
    }

    pub fn tile(&self) -> Tile {
        self.tile
    }

    pub fn envelope(&self) -> Rect<f64> {
        self.envelope
    }

    pub fn max_band(&self) -> i32 {
        self.max_band
    }

    /// Values for `$1..$5` of `TILE_SQL`, in placeholder order. `$6` is
    /// `max_band`.
    pub fn float_params(&self) -> [f64; 5] {
        [
            self.envelope.min().x,
            self.envelope.min().y,
            self.envelope.max().x,
            self.envelope.max().y,
            GEOMETRY_PRECISION,
        ]
    }

    pub fn bind_to<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Query<'q, Postgres, PgArguments> {
        self.float_params()
            .into_iter()
            .fold(query, |query, value| query.bind(value))
            .bind(self.max_band)
    }
}

#[derive(Debug, PartialEq)]
pub enum TileOutcome {
    Empty,
    Encoded(Vec<u8>),
}

impl IntoResponse for TileOutcome {
    fn into_response(self) -> Response {
        match self {
            TileOutcome::Empty => StatusCode::NO_CONTENT.into_response(),
            TileOutcome::Encoded(bytes) => {
                ([(header::CONTENT_TYPE, MVT_CONTENT_TYPE)], bytes).into_response()
            }
        }
    }
}

pub async fn get_mvt(
    tile: Tile,
    layer: Option<&str>,
    store: &dyn IndexedStore,
) -> Result<TileOutcome, AppError> {
    let Some(tile_query) = TileQuery::build(tile, layer)? else {
        return Ok(TileOutcome::Empty);
    };

    let mvt_bytes = store.render_tile(&tile_query).await?;
    debug!(
        z = tile.z,
        x = tile.x,
        y = tile.y,
        band = tile_query.max_band(),
        bytes = mvt_bytes.len(),
        "rendered tile"
    );

    if mvt_bytes.is_empty() {
        Ok(TileOutcome::Empty)
    } else {
        Ok(TileOutcome::Encoded(mvt_bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, 0)]
    #[case(10, 0, 0)]
    #[case(14, 8_529, 5_765)]
    #[case(14, 999_999, 999_999)]
    fn test_low_zoom_short_circuits(#[case] z: u32, #[case] x: u32, #[case] y: u32) {
        assert_eq!(None, TileQuery::build(Tile::new(x, y, z), None).unwrap());
    }

    #[rstest]
    #[case(15, 1)]
    #[case(17, 1)]
    #[case(18, 2)]
    #[case(20, 2)]
    #[case(21, 3)]
    fn test_band_follows_zoom(#[case] z: u32, #[case] band: i32) {
        let tile_query = TileQuery::build(Tile::new(0, 0, z), None).unwrap().unwrap();
        assert_eq!(band, tile_query.max_band());
        assert_eq!(Tile::new(0, 0, z).envelope(), tile_query.envelope());
    }

    #[test]
    fn test_out_of_grid_tile_rejected() {
        let result = TileQuery::build(Tile::new(32_768, 0, 15), None);
        assert!(matches!(result, Err(AppError::OutOfRange(_))));
    }

    #[test]
    fn test_layer_does_not_change_query() {
        let tile = Tile::new(17_070, 11_520, 15);
        assert_eq!(
            TileQuery::build(tile, None).unwrap(),
            TileQuery::build(tile, Some("edges")).unwrap()
        );
    }

    #[test]
    fn test_tile_sql_is_parameterised() {
        let sql = TILE_SQL.as_str();
        for placeholder in ["$1", "$2", "$3", "$4", "$5", "$6"] {
            assert!(sql.contains(placeholder), "missing {}", placeholder);
        }
        assert!(sql.contains("pp t, bounds"));
        assert!(sql.contains("ST_MakeEnvelope($1, $2, $3, $4, 3857)"));
        assert!(sql.contains("ST_ReducePrecision(t.geometry, $5)"));
        assert!(sql.contains("t.zoom <= $6"));
        assert!(sql.contains("ST_AsMVT(mvtgeom.*, 'features', 4096, 'geom')"));
        for column in TableName::PositionPoint.columns() {
            assert!(sql.contains(&format!("t.{}", column.name())));
        }
    }

    #[test]
    fn test_params_follow_placeholder_order() {
        let tile = Tile::new(136_563, 92_160, 18);
        let tile_query = TileQuery::build(tile, None).unwrap().unwrap();
        let envelope = tile.envelope();
        assert_eq!(
            [
                envelope.min().x,
                envelope.min().y,
                envelope.max().x,
                envelope.max().y,
                GEOMETRY_PRECISION,
            ],
            tile_query.float_params()
        );
        assert_eq!(2, tile_query.max_band());
    }

    #[test]
    fn test_empty_tile_response() {
        let response = TileOutcome::Empty.into_response();
        assert_eq!(StatusCode::NO_CONTENT, response.status());
    }

    #[test]
    fn test_encoded_tile_response() {
        let response = TileOutcome::Encoded(vec![0x1a, 0x02]).into_response();
        assert_eq!(StatusCode::OK, response.status());
        assert_eq!(MVT_CONTENT_TYPE, response.headers()[header::CONTENT_TYPE]);
    }
}
