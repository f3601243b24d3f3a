use crate::transformations::{
    lonlat_to_mercator, MAX_LATITUDE, WORLD_MERC_MAX, WORLD_MERC_MIN,
};
use crate::AppError;
use geo_types::{coord, Coord, Rect};
use std::str::FromStr;

/// Deepest zoom level whose tile grid still fits the `u32` column/row range.
pub const MAX_TILE_ZOOM: u32 = 30;

/// A slippy map tile in XYZ addressing (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tile {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl Tile {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Tile { x, y, z }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.z > MAX_TILE_ZOOM {
            return Err(AppError::OutOfRange(format!(
                "Zoom level {} exceeds maximum of {}",
                self.z, MAX_TILE_ZOOM
            )));
        }

        let tile_count = 2_u64.pow(self.z);
        if (u64::from(self.x) >= tile_count) | (u64::from(self.y) >= tile_count) {
            return Err(AppError::OutOfRange(format!(
                "Invalid tile coordinates {}/{}/{}",
                self.z, self.x, self.y
            )));
        }

        Ok(())
    }

    /// Bounds of the tile in storage (web mercator) units.
    ///
    /// Neighbouring tiles compute their shared edge from the same integer
    /// offset, so they meet exactly with neither gap nor overlap.
    pub fn envelope(&self) -> Rect<f64> {
        let tile_size = (WORLD_MERC_MAX - WORLD_MERC_MIN) / 2_f64.powi(self.z as i32);
        let x = f64::from(self.x);
        let y = f64::from(self.y);

        Rect::new(
            coord! {
                x: WORLD_MERC_MIN + x * tile_size,
                y: WORLD_MERC_MAX - (y + 1.0) * tile_size,
            },
            coord! {
                x: WORLD_MERC_MIN + (x + 1.0) * tile_size,
                y: WORLD_MERC_MAX - y * tile_size,
            },
        )
    }
}

/// A `minx,miny,maxx,maxy` box in client (longitude/latitude) coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox(Rect<f64>);

impl BBox {
    pub fn rect(&self) -> Rect<f64> {
        self.0
    }

    /// Reprojects the box into storage units. Corners are first clamped to the
    /// projectable world, so a whole-world box maps onto the full mercator
    /// square. Mercator is separable per axis and monotonic, so projecting the
    /// two corners is exact.
    pub fn to_storage(&self) -> Rect<f64> {
        Rect::new(
            lonlat_to_mercator(clamp_to_world(self.0.min())),
            lonlat_to_mercator(clamp_to_world(self.0.max())),
        )
    }
}

fn clamp_to_world(c: Coord<f64>) -> Coord<f64> {
    coord! {
        x: c.x.clamp(-180.0, 180.0),
        y: c.y.clamp(-MAX_LATITUDE, MAX_LATITUDE),
    }
}

impl FromStr for BBox {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|part| part.trim().parse::<f64>())
            .collect::<Result<Vec<f64>, _>>()
            .map_err(|_| AppError::OutOfRange(format!("Malformed bbox `{}`", s)))?;

        let [minx, miny, maxx, maxy] = match values.as_slice() {
            [minx, miny, maxx, maxy] => [*minx, *miny, *maxx, *maxy],
            _ => {
                return Err(AppError::OutOfRange(format!(
                    "bbox must have exactly four values, got `{}`",
                    s
                )))
            }
        };

        if [minx, miny, maxx, maxy].iter().any(|v| !v.is_finite()) {
            return Err(AppError::OutOfRange(format!("Malformed bbox `{}`", s)));
        }
        if (minx > maxx) | (miny > maxy) {
            return Err(AppError::OutOfRange(format!(
                "bbox minimum corner must not exceed maximum corner: `{}`",
                s
            )));
        }

        Ok(BBox(Rect::new(
            coord! { x: minx, y: miny },
            coord! { x: maxx, y: maxy },
        )))
    }
}
