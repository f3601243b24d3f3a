use crate::{
    db::{Column, TableName},
    structs::BBox,
    transformations::{CLIENT_SRID, GEOMETRY_PRECISION, STORAGE_SRID},
    AppError,
};
use geo_types::Rect;
use sqlx::{Postgres, QueryBuilder};

pub const DEFAULT_LIMIT: i64 = 1000;
pub const MAX_LIMIT: i64 = 10_000;

/// A validated feature extract request. Table and column identifiers can
/// only come from the `TableName` allow-list; everything request-derived
/// that reaches SQL is a bind parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureQuery {
    table: TableName,
    columns: Vec<Column>,
    envelope: Option<Rect<f64>>,
    limit: i64,
}

impl FeatureQuery {
    pub fn new(
        table_name: &str,
        bbox: Option<&str>,
        limit: Option<i64>,
        properties: &[String],
    ) -> Result<FeatureQuery, AppError> {
        let table: TableName = table_name.parse()?;

        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::OutOfRange(format!(
                "limit {} outside 1..={}",
                limit, MAX_LIMIT
            )));
        }

        let envelope = match bbox {
            Some(raw) => Some(raw.parse::<BBox>()?.to_storage()),
            None => None,
        };

        let columns = select_columns(table, properties)?;

        Ok(FeatureQuery {
            table,
            columns,
            envelope,
            limit,
        })
    }

    pub fn table(&self) -> TableName {
        self.table
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Spatial filter in storage units, if any.
    pub fn envelope(&self) -> Option<Rect<f64>> {
        self.envelope
    }

    pub fn limit(&self) -> i64 {
        self.limit
    }

    pub fn to_query_builder(&self) -> QueryBuilder<'static, Postgres> {
        let mut builder = QueryBuilder::new("select ");
        for column in &self.columns {
            builder.push(column.select_expr());
            builder.push(", ");
        }

        builder.push("ST_AsGeoJSON(ST_Transform(ST_ReducePrecision(ST_Force2D(t.geometry), ");
        builder.push_bind(GEOMETRY_PRECISION);
        builder.push(format!(
            "), {})) as geometry from {} t",
            CLIENT_SRID,
            self.table.name()
        ));

        if let Some(envelope) = self.envelope {
            builder.push(" where ST_Intersects(t.geometry, ST_MakeEnvelope(");
            let mut corners = builder.separated(", ");
            corners.push_bind(envelope.min().x);
            corners.push_bind(envelope.min().y);
            corners.push_bind(envelope.max().x);
            corners.push_bind(envelope.max().y);
            corners.push(STORAGE_SRID.to_string());
            builder.push("))");
        }

        builder.push(" limit ");
        builder.push_bind(self.limit);
        builder
    }
}

/// Resolves requested property names against the table. An empty request
/// selects every attribute column; repeats collapse onto their first
/// occurrence.
fn select_columns(table: TableName, properties: &[String]) -> Result<Vec<Column>, AppError> {
    if properties.is_empty() {
        return Ok(table.columns().to_vec());
    }

    let mut columns = Vec::with_capacity(properties.len());
    for name in properties {
        let column = table.column(name).ok_or_else(|| AppError::UnknownColumn {
            table: table.name(),
            column: name.clone(),
        })?;
        if !columns.contains(&column) {
            columns.push(column);
        }
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transformations::lonlat_to_mercator;
    use assert_approx_eq::assert_approx_eq;
    use geo_types::coord;
    use rstest::rstest;

    fn props(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let query = FeatureQuery::new("node", None, None, &[]).unwrap();
        assert_eq!(TableName::Node, query.table());
        assert_eq!(DEFAULT_LIMIT, query.limit());
        assert_eq!(None, query.envelope());
        assert_eq!(TableName::Node.columns(), query.columns());
    }

    #[test]
    fn test_unknown_table() {
        let result = FeatureQuery::new("ghost", Some("0,0,1,1"), None, &[]);
        assert!(matches!(result, Err(AppError::UnknownTable(name)) if name == "ghost"));
    }

    #[rstest]
    #[case(0)]
    #[case(-5)]
    #[case(10_001)]
    fn test_limit_out_of_range(#[case] limit: i64) {
        let result = FeatureQuery::new("pp", None, Some(limit), &[]);
        assert!(matches!(result, Err(AppError::OutOfRange(_))));
    }

    #[rstest]
    #[case(1)]
    #[case(10_000)]
    fn test_limit_bounds_inclusive(#[case] limit: i64) {
        assert_eq!(limit, FeatureQuery::new("pp", None, Some(limit), &[]).unwrap().limit());
    }

    #[test]
    fn test_bbox_reprojected_to_storage() {
        let query = FeatureQuery::new("edge", Some("7.4,46.9,7.5,47.0"), None, &[]).unwrap();
        let envelope = query.envelope().unwrap();
        let min = lonlat_to_mercator(coord! { x: 7.4, y: 46.9 });
        let max = lonlat_to_mercator(coord! { x: 7.5, y: 47.0 });
        assert_approx_eq!(min.x, envelope.min().x);
        assert_approx_eq!(min.y, envelope.min().y);
        assert_approx_eq!(max.x, envelope.max().x);
        assert_approx_eq!(max.y, envelope.max().y);
    }

    #[rstest]
    #[case("-180,-90,180,90")]
    #[case("7.4,46.9,7.5,90")]
    fn test_bbox_past_the_poles_accepted(#[case] bbox: &str) {
        let query = FeatureQuery::new("node", Some(bbox), None, &[]).unwrap();
        let envelope = query.envelope().unwrap();
        assert!(envelope.max().y.is_finite());
        assert!(envelope.min().y < envelope.max().y);
    }

    #[test]
    fn test_malformed_bbox() {
        let result = FeatureQuery::new("edge", Some("7.4,46.9,7.5"), None, &[]);
        assert!(matches!(result, Err(AppError::OutOfRange(_))));
    }

    #[test]
    fn test_requested_columns_deduplicated_in_order() {
        let query =
            FeatureQuery::new("pp", None, None, &props(&["token", "zoom", "token"])).unwrap();
        assert_eq!(&[Column::Token, Column::Zoom], query.columns());
    }

    #[rstest]
    #[case("pp", "tags")]
    #[case("edge", "geometry")]
    #[case("node", "uuid_node; drop table node")]
    fn test_unknown_column(#[case] table: &str, #[case] column: &str) {
        let result = FeatureQuery::new(table, None, None, &props(&[column]));
        match result {
            Err(AppError::UnknownColumn { table: t, column: c }) => {
                assert_eq!(table, t);
                assert_eq!(column, c);
            }
            other => panic!("expected UnknownColumn, got {:?}", other),
        }
    }

    #[test]
    fn test_sql_without_bbox() {
        let query = FeatureQuery::new("edge", None, Some(5), &props(&["uuid_edge", "tags"])).unwrap();
        let builder = query.to_query_builder();
        assert_eq!(
            "select t.uuid_edge::text as uuid_edge, array_to_string(t.tags, ',') as tags, \
             ST_AsGeoJSON(ST_Transform(ST_ReducePrecision(ST_Force2D(t.geometry), $1), 4326)) \
             as geometry from edge t limit $2",
            builder.sql()
        );
    }

    #[test]
    fn test_sql_with_bbox() {
        let query = FeatureQuery::new("node", Some("7.4,46.9,7.5,47.0"), None, &props(&["arity"]))
            .unwrap();
        let builder = query.to_query_builder();
        assert_eq!(
            "select t.arity::int4 as arity, \
             ST_AsGeoJSON(ST_Transform(ST_ReducePrecision(ST_Force2D(t.geometry), $1), 4326)) \
             as geometry from node t \
             where ST_Intersects(t.geometry, ST_MakeEnvelope($2, $3, $4, $5, 3857)) limit $6",
            builder.sql()
        );
    }
}
