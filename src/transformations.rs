use geo_types::{coord, Coord};
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

pub mod geojson;

/// SRID every stored geometry is kept in (spherical web mercator).
pub const STORAGE_SRID: i32 = 3857;
/// SRID of bounding boxes received from, and geometries returned to, feature clients.
pub const CLIENT_SRID: i32 = 4326;
/// Grid size, in storage units, geometries are snapped to before encoding.
pub const GEOMETRY_PRECISION: f64 = 0.001;

pub const EARTH_RADIUS: f64 = 6378137.0;
pub const WORLD_MERC_MAX: f64 = EARTH_RADIUS * std::f64::consts::PI;
pub const WORLD_MERC_MIN: f64 = WORLD_MERC_MAX * -1_f64;
/// Latitude at which web mercator reaches `WORLD_MERC_MAX`.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

pub fn lonlat_to_mercator(c: Coord<f64>) -> Coord<f64> {
    coord! {
        x: EARTH_RADIUS * c.x.to_radians(),
        y: EARTH_RADIUS * (FRAC_PI_4 + c.y.to_radians() / 2.0).tan().ln(),
    }
}

pub fn mercator_to_lonlat(c: Coord<f64>) -> Coord<f64> {
    coord! {
        x: (c.x / EARTH_RADIUS).to_degrees(),
        y: (2.0 * (c.y / EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees(),
    }
}
