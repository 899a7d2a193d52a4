//! Geographic coordinate type and spherical-earth geometry.
//!
//! All horizontal distances use the haversine formula on a sphere of radius
//! [`EARTH_MEAN_RADIUS_M`].  Coordinates are WGS-84 decimal degrees stored as
//! `f64`; map matching compares projection errors of a few meters, which is
//! well below `f32` resolution at city longitudes.

/// Mean earth radius in meters (IUGG mean radius R1).
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.7714;

/// Degrees of latitude per meter on the mean-radius sphere.
pub const LAT_PER_METER: f64 = 8.993203677616966e-6;

/// Degrees of longitude per meter at the reference latitude of the supported
/// networks.  Rectangular query boxes built from this constant are slightly
/// loose elsewhere, which only widens the candidate search.
pub const LNG_PER_METER: f64 = 1.1700193970443768e-5;

/// A WGS-84 geographic coordinate in decimal degrees.
///
/// Equality is structural and exact — loaders must not re-round coordinates,
/// since vertex identity in the road network is keyed on these floats.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SPoint {
    pub lat: f64,
    pub lng: f64,
}

impl SPoint {
    #[inline]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Haversine great-circle distance in meters.
    pub fn distance_m(self, other: SPoint) -> f64 {
        // Identical coordinates short-circuit to exactly 0.0 so repeated
        // points never accumulate rounding noise into lengths.
        if self == other {
            return 0.0;
        }
        let d_lat = (other.lat - self.lat).to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let h = (d_lat / 2.0).sin().powi(2)
            + self.lat.to_radians().cos() * other.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
        let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
        EARTH_MEAN_RADIUS_M * c
    }

    /// Initial great-circle bearing from `self` to `other`, in degrees
    /// normalized to `[0, 360)`.
    pub fn bearing_to(self, other: SPoint) -> f64 {
        let lat_a = self.lat.to_radians();
        let lat_b = other.lat.to_radians();
        let d_lng = (other.lng - self.lng).to_radians();
        let y = d_lng.sin() * lat_b.cos();
        let x = lat_a.cos() * lat_b.sin() - lat_a.sin() * lat_b.cos() * d_lng.cos();
        (y.atan2(x).to_degrees() + 360.0) % 360.0
    }
}

impl std::fmt::Display for SPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.lat, self.lng)
    }
}

// ── Segment projection ────────────────────────────────────────────────────────

/// Result of projecting a point onto a segment or line.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Projection {
    /// The projected point.
    pub point: SPoint,
    /// Along-segment fraction.  Clamped to `[0, 1]` by
    /// [`project_to_segment`]; unconstrained for [`project_to_line`].
    pub rate: f64,
    /// Haversine distance in meters from the input point to `point`.
    pub dist_m: f64,
}

/// Project `t` onto the segment `a..b`, clamping to the segment.
///
/// The along-track distance is computed from the bearing difference between
/// `a→b` and `a→t` (valid for the short segments of road polylines).
/// Clamping: unconstrained rate ≥ 1 yields `b`, ≤ 0 yields `a`, and a
/// zero-length segment yields `a` with rate 0.
pub fn project_to_segment(a: SPoint, b: SPoint, t: SPoint) -> Projection {
    let rate = along_rate(a, b, t);
    let (point, rate) = if rate >= 1.0 {
        (b, 1.0)
    } else if rate <= 0.0 {
        (a, 0.0)
    } else {
        (point_along_segment(a, b, rate), rate)
    };
    Projection {
        point,
        rate,
        dist_m: t.distance_m(point),
    }
}

/// Project `t` onto the infinite line through `a` and `b` — the projection
/// may fall outside the segment (used by Douglas–Peucker simplification).
pub fn project_to_line(a: SPoint, b: SPoint, t: SPoint) -> Projection {
    let rate = along_rate(a, b, t);
    let point = point_along_segment(a, b, rate);
    Projection {
        point,
        rate,
        dist_m: t.distance_m(point),
    }
}

/// Linear interpolation along `a..b` in degree space — acceptable for the
/// short segments typical of road polylines.
#[inline]
pub fn point_along_segment(a: SPoint, b: SPoint, rate: f64) -> SPoint {
    SPoint::new(a.lat + rate * (b.lat - a.lat), a.lng + rate * (b.lng - a.lng))
}

/// Unclamped along-segment fraction of `t` w.r.t. `a..b`.
fn along_rate(a: SPoint, b: SPoint, t: SPoint) -> f64 {
    let ab_length = a.distance_m(b);
    if ab_length == 0.0 {
        return 0.0;
    }
    let delta_angle = a.bearing_to(t) - a.bearing_to(b);
    let meters_along = a.distance_m(t) * delta_angle.to_radians().cos();
    meters_along / ab_length
}
