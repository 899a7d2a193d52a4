//! Geographic minimum bounding rectangle.

use crate::geo::{LAT_PER_METER, LNG_PER_METER, SPoint};

/// An axis-aligned rectangle in WGS-84 degree space.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mbr {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl Mbr {
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self {
            min_lat,
            min_lng,
            max_lat,
            max_lng,
        }
    }

    /// The tight bounding rectangle of a point sequence.
    ///
    /// The iterator must yield at least one point; an empty input produces an
    /// inverted (infinite) rectangle that contains nothing.
    pub fn of_points<I>(points: I) -> Mbr
    where
        I: IntoIterator<Item = SPoint>,
    {
        let mut mbr = Mbr::new(f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in points {
            mbr.min_lat = mbr.min_lat.min(p.lat);
            mbr.min_lng = mbr.min_lng.min(p.lng);
            mbr.max_lat = mbr.max_lat.max(p.lat);
            mbr.max_lng = mbr.max_lng.max(p.lng);
        }
        mbr
    }

    /// A rectangle centered on `center` with half-extents of `radius_m`
    /// meters, converted to degrees.  This is the query box used for
    /// candidate-edge lookup.
    pub fn around(center: SPoint, radius_m: f64) -> Mbr {
        Mbr::new(
            center.lat - radius_m * LAT_PER_METER,
            center.lng - radius_m * LNG_PER_METER,
            center.lat + radius_m * LAT_PER_METER,
            center.lng + radius_m * LNG_PER_METER,
        )
    }

    /// Half-open containment check: `min <= x < max` on both axes, so
    /// adjacent rectangles tile without double-counting boundary points.
    #[inline]
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        self.min_lat <= lat && lat < self.max_lat && self.min_lng <= lng && lng < self.max_lng
    }

    pub fn center(&self) -> SPoint {
        SPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// North-south extent in meters.
    pub fn height_m(&self) -> f64 {
        SPoint::new(self.min_lat, self.min_lng).distance_m(SPoint::new(self.max_lat, self.min_lng))
    }

    /// East-west extent in meters, measured along the southern boundary.
    pub fn width_m(&self) -> f64 {
        SPoint::new(self.min_lat, self.min_lng).distance_m(SPoint::new(self.min_lat, self.max_lng))
    }
}

impl std::fmt::Display for Mbr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}x{:.0}m2", self.height_m(), self.width_m())
    }
}
