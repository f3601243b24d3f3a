use crate::AppError;
use serde_json::Value;
use sqlx::{postgres::PgRow, Row};
use std::str::FromStr;

/// The railway tables produced by ingestion. Nothing outside this list is
/// ever named in a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableName {
    PositionPoint,
    Edge,
    Node,
}

impl TableName {
    pub const ALL: [TableName; 3] = [TableName::PositionPoint, TableName::Edge, TableName::Node];

    pub fn name(&self) -> &'static str {
        match self {
            TableName::PositionPoint => "pp",
            TableName::Edge => "edge",
            TableName::Node => "node",
        }
    }

    /// Attribute columns in default selection order. `geometry` is handled
    /// separately and is never an attribute.
    pub fn columns(&self) -> &'static [Column] {
        match self {
            TableName::PositionPoint => &[
                Column::IdPositionPoint,
                Column::Token,
                Column::Zoom,
                Column::UuidEdge,
                Column::Position,
                Column::Direction,
                Column::Radius,
                Column::Grade,
                Column::Azimuth,
            ],
            TableName::Edge => &[
                Column::UuidEdge,
                Column::UuidNodeFrom,
                Column::UuidNodeTo,
                Column::Tags,
            ],
            TableName::Node => &[
                Column::UuidNode,
                Column::Arity,
                Column::SwitchType,
                Column::SwitchSubtype,
                Column::SwitchRadius,
                Column::UuidEdgeMain,
                Column::Tags,
            ],
        }
    }

    pub fn column(&self, name: &str) -> Option<Column> {
        self.columns().iter().copied().find(|c| c.name() == name)
    }
}

impl FromStr for TableName {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TableName::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| AppError::UnknownTable(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    BigInt,
    Float,
    Text,
    /// A `text[]` column, served as one comma-joined string.
    Tags,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    IdPositionPoint,
    Token,
    Zoom,
    UuidEdge,
    Position,
    Direction,
    Radius,
    Grade,
    Azimuth,
    UuidNodeFrom,
    UuidNodeTo,
    Tags,
    UuidNode,
    Arity,
    SwitchType,
    SwitchSubtype,
    SwitchRadius,
    UuidEdgeMain,
}

impl Column {
    pub fn name(&self) -> &'static str {
        match self {
            Column::IdPositionPoint => "id_positionpoint",
            Column::Token => "token",
            Column::Zoom => "zoom",
            Column::UuidEdge => "uuid_edge",
            Column::Position => "position",
            Column::Direction => "direction",
            Column::Radius => "radius",
            Column::Grade => "grade",
            Column::Azimuth => "azimuth",
            Column::UuidNodeFrom => "uuid_node_from",
            Column::UuidNodeTo => "uuid_node_to",
            Column::Tags => "tags",
            Column::UuidNode => "uuid_node",
            Column::Arity => "arity",
            Column::SwitchType => "switch_type",
            Column::SwitchSubtype => "switch_subtype",
            Column::SwitchRadius => "switch_radius",
            Column::UuidEdgeMain => "uuid_edge_main",
        }
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Zoom | Column::Direction | Column::Arity => ColumnKind::Int,
            Column::IdPositionPoint => ColumnKind::BigInt,
            Column::Position
            | Column::Radius
            | Column::Grade
            | Column::Azimuth
            | Column::SwitchRadius => ColumnKind::Float,
            Column::Tags => ColumnKind::Tags,
            Column::Token
            | Column::UuidEdge
            | Column::UuidNodeFrom
            | Column::UuidNodeTo
            | Column::UuidNode
            | Column::SwitchType
            | Column::SwitchSubtype
            | Column::UuidEdgeMain => ColumnKind::Text,
        }
    }

    /// Select-list entry for the column of table alias `t`, cast to the type
    /// `decode` expects.
    pub fn select_expr(&self) -> String {
        let name = self.name();
        match self.kind() {
            ColumnKind::Int => format!("t.{0}::int4 as {0}", name),
            ColumnKind::BigInt => format!("t.{0}::int8 as {0}", name),
            ColumnKind::Float => format!("t.{0}::float8 as {0}", name),
            ColumnKind::Text => format!("t.{0}::text as {0}", name),
            ColumnKind::Tags => format!("array_to_string(t.{0}, ',') as {0}", name),
        }
    }

    pub fn decode(&self, row: &PgRow) -> Result<Value, sqlx::Error> {
        let name = self.name();
        let value = match self.kind() {
            ColumnKind::Int => row.try_get::<Option<i32>, _>(name)?.map(Value::from),
            ColumnKind::BigInt => row.try_get::<Option<i64>, _>(name)?.map(Value::from),
            ColumnKind::Float => row.try_get::<Option<f64>, _>(name)?.map(Value::from),
            ColumnKind::Text | ColumnKind::Tags => {
                row.try_get::<Option<String>, _>(name)?.map(Value::from)
            }
        };
        Ok(value.unwrap_or(Value::Null))
    }
}

/// One result row of a feature query: GeoJSON geometry text in client
/// coordinates plus the selected attribute columns in selection order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRow {
    pub geometry: Option<String>,
    pub properties: Vec<(Column, Value)>,
}

impl FeatureRow {
    pub fn from_pg_row(row: &PgRow, columns: &[Column]) -> Result<FeatureRow, sqlx::Error> {
        let geometry: Option<String> = row.try_get("geometry")?;
        let properties = columns
            .iter()
            .map(|column| Ok((*column, column.decode(row)?)))
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok(FeatureRow {
            geometry,
            properties,
        })
    }
}
