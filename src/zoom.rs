//! Level-of-detail policy for position point tiles.
//!
//! Points carry a small `zoom` band (0 = always important). The map zoom of
//! the requested tile selects how many bands are drawn. The breakpoints are
//! fixed steps rather than a function of tile pixel density.

/// Highest map zoom at which tiles are always empty.
pub const EMPTY_MAX_ZOOM: u32 = 14;
/// Highest map zoom that renders bands `0..=NEAR_BAND`.
pub const BAND_1_MAX_ZOOM: u32 = 17;
/// Highest map zoom that renders bands `0..=MID_BAND`.
pub const BAND_2_MAX_ZOOM: u32 = 20;
/// Band limit up to `BAND_1_MAX_ZOOM`.
pub const NEAR_BAND: i32 = 1;
/// Band limit up to `BAND_2_MAX_ZOOM`.
pub const MID_BAND: i32 = 2;
/// Band limit applied beyond `BAND_2_MAX_ZOOM`.
pub const DEEPEST_BAND: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDecision {
    /// The tile is empty whatever it covers; no query should be issued.
    NoContent,
    /// Render points whose band is at most the contained value.
    Bands(i32),
}

pub fn resolve(z: u32) -> ZoomDecision {
    if z <= EMPTY_MAX_ZOOM {
        ZoomDecision::NoContent
    } else if z <= BAND_1_MAX_ZOOM {
        ZoomDecision::Bands(NEAR_BAND)
    } else if z <= BAND_2_MAX_ZOOM {
        ZoomDecision::Bands(MID_BAND)
    } else {
        ZoomDecision::Bands(DEEPEST_BAND)
    }
}
